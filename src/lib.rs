//! 远程执行工具库
//! 主机注册、SSH 命令执行（批处理/交互式）与系统信息探测

pub mod config;
pub mod error;
pub mod models;
pub mod probe;
pub mod prompt;
pub mod repository;
pub mod services;
pub mod ssh;
pub mod telemetry;
