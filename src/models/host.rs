//! 主机模型
//!
//! `HostIdentity` 是核心执行链路消费的已解析主机描述；
//! `HostRecord` 是它在配置文件中的持久化形态（与旧版 YAML 格式保持兼容）

use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AppError;

/// 远程主机的操作系统类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsClass {
    Linux,
    Windows,
}

impl OsClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            OsClass::Linux => "linux",
            OsClass::Windows => "windows",
        }
    }
}

impl fmt::Display for OsClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsClass {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "windows" => Ok(Self::Windows),
            other => Err(AppError::validation(format!(
                "unsupported OS type: {} (supported: linux, windows)",
                other
            ))),
        }
    }
}

/// 认证凭据
#[derive(Debug, Clone)]
pub enum Credential {
    /// 密码认证（使用 Secret 包装，防止日志泄露）
    Password(Secret<String>),
    /// 私钥认证
    PrivateKey { key_path: PathBuf },
}

impl Credential {
    pub fn password(password: impl Into<String>) -> Self {
        Credential::Password(Secret::new(password.into()))
    }

    pub fn private_key(key_path: impl Into<PathBuf>) -> Self {
        Credential::PrivateKey {
            key_path: key_path.into(),
        }
    }

    /// 配置文件中的 auth_type 取值
    pub fn auth_type(&self) -> &'static str {
        match self {
            Credential::Password(_) => "password",
            Credential::PrivateKey { .. } => "key",
        }
    }
}

/// 已解析的主机身份
#[derive(Debug, Clone)]
pub struct HostIdentity {
    /// 主机名称（用户自定义，唯一）
    pub name: String,
    /// IP 或域名
    pub host: String,
    /// SSH 端口
    pub port: u16,
    pub os: OsClass,
    pub username: String,
    pub credential: Credential,
}

impl HostIdentity {
    /// host:port，IPv6 字面量加方括号
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// user@host:port，用于日志与错误上下文
    pub fn target(&self) -> String {
        format!("{}@{}", self.username, self.address())
    }
}

/// 配置文件中的主机记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub name: String,
    pub ip: String,
    pub port: String,
    pub os: String,
    /// "password" 或 "key"
    pub auth_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_path: Option<String>,
    pub username: String,
}

/// 解析端口号
pub fn parse_port(port: &str) -> Result<u16, AppError> {
    port.trim()
        .parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| AppError::validation(format!("invalid port number: {}", port)))
}

impl TryFrom<HostRecord> for HostIdentity {
    type Error = AppError;

    fn try_from(record: HostRecord) -> Result<Self, Self::Error> {
        let port = parse_port(&record.port)?;
        let os = record.os.parse::<OsClass>()?;

        let credential = match record.auth_type.as_str() {
            "password" => Credential::password(record.password.unwrap_or_default()),
            "key" => {
                let key_path = record.key_path.filter(|p| !p.trim().is_empty()).ok_or_else(|| {
                    AppError::validation(format!("server '{}' has no key_path", record.name))
                })?;
                Credential::private_key(key_path)
            }
            other => {
                return Err(AppError::validation(format!(
                    "unsupported auth type: {}",
                    other
                )))
            }
        };

        Ok(HostIdentity {
            name: record.name,
            host: record.ip,
            port,
            os,
            username: record.username,
            credential,
        })
    }
}

impl From<&HostIdentity> for HostRecord {
    fn from(host: &HostIdentity) -> Self {
        let (password, key_path) = match &host.credential {
            Credential::Password(secret) => (Some(secret.expose_secret().clone()), None),
            Credential::PrivateKey { key_path } => {
                (None, Some(key_path.to_string_lossy().into_owned()))
            }
        };

        HostRecord {
            name: host.name.clone(),
            ip: host.host.clone(),
            port: host.port.to_string(),
            os: host.os.to_string(),
            auth_type: host.credential.auth_type().to_string(),
            password,
            key_path,
            username: host.username.clone(),
        }
    }
}
