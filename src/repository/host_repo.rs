//! Host repository (主机配置存取)
//!
//! 主机列表保存在 YAML 文件中，文件不存在时视为空列表

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::host::{HostIdentity, HostRecord};

/// 配置文件顶层结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostFile {
    #[serde(default)]
    pub servers: Vec<HostRecord>,
}

pub struct HostRepository {
    path: PathBuf,
}

impl HostRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// ~/.rexec/config.yaml
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AppError::Store("failed to get user home directory".to_string()))?;
        Ok(home.join(".rexec").join("config.yaml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 加载配置文件
    pub fn load(&self) -> Result<HostFile> {
        if !self.path.exists() {
            return Ok(HostFile::default());
        }

        let data = std::fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(HostFile::default());
        }
        Ok(serde_yaml::from_str(&data)?)
    }

    /// 保存配置文件（Unix 下权限 0600）
    fn save(&self, file: &HostFile) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let data = serde_yaml::to_string(file)?;
        std::fs::write(&self.path, data)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        debug!(path = %self.path.display(), servers = file.servers.len(), "Host file saved");
        Ok(())
    }

    /// 根据名称查找主机
    pub fn find(&self, name: &str) -> Result<HostIdentity> {
        let file = self.load()?;
        let record = file
            .servers
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| AppError::NotFound(name.to_string()))?;
        HostIdentity::try_from(record)
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.load()?.servers.iter().any(|s| s.name == name))
    }

    /// 添加主机，名称重复时报错
    pub fn add(&self, host: &HostIdentity) -> Result<()> {
        let mut file = self.load()?;
        if file.servers.iter().any(|s| s.name == host.name) {
            return Err(AppError::DuplicateName(host.name.clone()));
        }

        file.servers.push(HostRecord::from(host));
        self.save(&file)
    }
}
