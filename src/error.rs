//! 统一错误模型
//! 定义远程执行链路上的所有错误类型
//!
//! 每个错误都携带足够的上下文（目标地址、主机名、命令），调用方无需再次包装即可展示

use std::path::PathBuf;

/// 应用错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("SSH authentication failed for {target}: {reason}")]
    Auth { target: String, reason: String },

    #[error("failed to read private key file {}: {source}", .path.display())]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse private key {}: {reason}", .path.display())]
    KeyParse { path: PathBuf, reason: String },

    #[error("failed to connect to {address}: {reason}")]
    Network { address: String, reason: String },

    #[error("failed to create session on {target}: {reason}")]
    Session { target: String, reason: String },

    #[error("command execution failed on {target}: {reason}")]
    Exec { target: String, reason: String },

    #[error("server '{0}' not found")]
    NotFound(String),

    #[error("server '{0}' already exists")]
    DuplicateName(String),

    #[error("{0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("host store error: {0}")]
    Store(String),

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    // 便捷方法
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn exec(target: &str, reason: impl Into<String>) -> Self {
        AppError::Exec {
            target: target.to_string(),
            reason: reason.into(),
        }
    }

    pub fn session(target: &str, reason: impl Into<String>) -> Self {
        AppError::Session {
            target: target.to_string(),
            reason: reason.into(),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(e: serde_yaml::Error) -> Self {
        AppError::Store(e.to_string())
    }
}

impl From<dialoguer::Error> for AppError {
    fn from(e: dialoguer::Error) -> Self {
        AppError::Prompt(e.to_string())
    }
}
