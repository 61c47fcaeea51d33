//! 配置系统
//! 从环境变量加载运行参数（前缀 REXEC_，层级分隔符 __）

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::host::OsClass;
use crate::ssh::escape::EscapeStyle;

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty, compact
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SshSettings {
    /// 连接超时（秒）
    pub connect_timeout_secs: u64,
    /// 命令执行超时（秒），未设置时一直等待
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,
}

impl SshSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecSettings {
    /// Windows 远端参数拼接方式: verbatim, posix
    pub windows_escaping: String,
}

impl ExecSettings {
    /// 按目标 OS 选择参数转义方式
    pub fn escape_style(&self, os: OsClass) -> EscapeStyle {
        match os {
            OsClass::Windows if self.windows_escaping.eq_ignore_ascii_case("posix") => {
                EscapeStyle::Posix
            }
            _ => EscapeStyle::for_os(os),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSettings {
    /// 主机配置文件路径，默认 ~/.rexec/config.yaml
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub ssh: SshSettings,
    pub exec: ExecSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("logging.level", "warn")?
            .set_default("logging.format", "compact")?
            .set_default("ssh.connect_timeout_secs", 30)?
            .set_default("exec.windows_escaping", "verbatim")?;

        // 从环境变量加载配置（前缀为 REXEC_）
        settings = settings.add_source(
            Environment::with_prefix("REXEC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    fn validate(&self) -> Result<(), ConfigError> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" | "compact" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty, compact",
                    self.logging.format
                )))
            }
        }

        if self.ssh.connect_timeout_secs == 0 || self.ssh.connect_timeout_secs > 600 {
            return Err(ConfigError::Message(
                "ssh.connect_timeout_secs must be between 1 and 600".to_string(),
            ));
        }

        if self.ssh.command_timeout_secs == Some(0) {
            return Err(ConfigError::Message(
                "ssh.command_timeout_secs must be greater than 0 when set".to_string(),
            ));
        }

        match self.exec.windows_escaping.to_lowercase().as_str() {
            "verbatim" | "posix" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid windows_escaping: {}. Must be one of: verbatim, posix",
                    self.exec.windows_escaping
                )))
            }
        }

        Ok(())
    }
}
