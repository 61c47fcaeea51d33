//! 主机服务：交互式添加主机

use std::path::Path;
use tracing::info;

use crate::{
    error::{AppError, Result},
    models::host::{parse_port, Credential, HostIdentity, OsClass},
    repository::HostRepository,
};

/// 认证方式选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Password,
    PrivateKey,
}

/// 凭据输入来源（终端提示或测试脚本）
pub trait CredentialPrompt {
    fn username(&mut self) -> Result<String>;
    fn auth_method(&mut self) -> Result<AuthMethod>;
    fn password(&mut self) -> Result<String>;
    fn key_path(&mut self) -> Result<String>;
    /// 提示信息
    fn notice(&mut self, message: &str);
}

/// 新增主机请求（来自命令行参数）
#[derive(Debug, Clone)]
pub struct NewHost {
    pub os: OsClass,
    pub ip: String,
    pub port: String,
    pub name: String,
}

pub struct HostService {
    repo: HostRepository,
}

impl HostService {
    pub fn new(repo: HostRepository) -> Self {
        Self { repo }
    }

    pub fn find(&self, name: &str) -> Result<HostIdentity> {
        self.repo.find(name)
    }

    /// 添加主机
    pub fn add_host(
        &self,
        req: NewHost,
        prompt: &mut dyn CredentialPrompt,
    ) -> Result<HostIdentity> {
        let port = parse_port(&req.port)?;

        if req.name.trim().is_empty() {
            return Err(AppError::validation("server name cannot be empty"));
        }
        if self.repo.exists(&req.name)? {
            return Err(AppError::DuplicateName(req.name));
        }

        let username = prompt.username()?.trim().to_string();
        if username.is_empty() {
            return Err(AppError::validation("username cannot be empty"));
        }

        let method = prompt.auth_method()?;

        if req.os == OsClass::Windows {
            prompt.notice("Note: Windows server must have OpenSSH Server installed and enabled.");
            if port != 22 {
                prompt.notice(&format!(
                    "Note: Port {} is not the standard SSH port (22).",
                    port
                ));
            }
        }

        let credential = match method {
            AuthMethod::Password => Credential::password(prompt.password()?),
            AuthMethod::PrivateKey => {
                let key_path = prompt.key_path()?.trim().to_string();
                if key_path.is_empty() {
                    return Err(AppError::validation("key path cannot be empty"));
                }
                if !Path::new(&key_path).exists() {
                    return Err(AppError::validation(format!(
                        "private key file does not exist: {}",
                        key_path
                    )));
                }
                Credential::private_key(key_path)
            }
        };

        let host = HostIdentity {
            name: req.name,
            host: req.ip,
            port,
            os: req.os,
            username,
            credential,
        };

        self.repo.add(&host)?;
        info!(name = %host.name, address = %host.address(), os = %host.os, "Server added");

        Ok(host)
    }
}
