//! 日志与追踪系统
//! 日志统一写到 stderr，stdout 只留给远端命令输出

use std::io::IsTerminal;

use crate::config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// 初始化日志；RUST_LOG 优先于配置中的级别
pub fn init_telemetry(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    // stderr 被重定向时关闭颜色
    let ansi = std::io::stderr().is_terminal();
    let base = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let log_layer = match config.format.to_lowercase().as_str() {
        "json" => base.json().boxed(),
        "pretty" => base.pretty().with_ansi(ansi).boxed(),
        _ => base.compact().with_ansi(ansi).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(log_layer)
        .init();

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        level = %config.level,
        format = %config.format,
        "Telemetry initialized"
    );
}
