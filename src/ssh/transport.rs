//! 远程会话传输抽象
//!
//! 执行器只依赖这里的 trait，具体实现见 [`crate::ssh::client`]（russh）。
//! 测试中可以替换为脚本化的模拟实现。

use async_trait::async_trait;
use std::fmt;
use std::pin::Pin;
use tokio::io::AsyncWrite;

use crate::error::Result;
use crate::models::host::HostIdentity;

/// 远端标准输入写入端，可独立移动到其他任务
pub type RemoteStdin = Pin<Box<dyn AsyncWrite + Send>>;

/// 远端进程退出状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    Code(u32),
    Signal { name: String, message: String },
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Code(0))
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Code(code) => write!(f, "process exited with status {}", code),
            ExitStatus::Signal { name, message } if message.is_empty() => {
                write!(f, "process killed by signal {}", name)
            }
            ExitStatus::Signal { name, message } => {
                write!(f, "process killed by signal {}: {}", name, message)
            }
        }
    }
}

/// 会话上报的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Stdout(Vec<u8>),
    Stderr(Vec<u8>),
    Exit(ExitStatus),
}

/// 单条命令的执行上下文
#[async_trait]
pub trait RemoteSession: Send {
    /// 启动远端命令，不等待其结束
    async fn start(&mut self, command: &str) -> Result<()>;

    fn stdin(&self) -> RemoteStdin;

    /// 下一个事件；通道关闭后返回 None
    async fn next_event(&mut self) -> Option<SessionEvent>;

    /// 关闭会话（幂等）
    async fn close(&mut self);
}

/// 已认证的连接
#[async_trait]
pub trait RemoteConnection: Send {
    type Session: RemoteSession + 'static;

    /// user@host:port
    fn target(&self) -> &str;

    async fn open_session(&mut self) -> Result<Self::Session>;

    /// 关闭连接（幂等）
    async fn close(&mut self);
}

/// 建立连接的入口
#[async_trait]
pub trait Transport: Send + Sync {
    type Connection: RemoteConnection;

    async fn open(&self, host: &HostIdentity) -> Result<Self::Connection>;
}
