//! SSH执行模块
//! 连接管理、命令构建与命令执行

pub mod client;
pub mod escape;
pub mod executor;
pub mod transport;

pub use client::{SshConnection, SshSession, SshTransport};
pub use escape::{build_command, escape, EscapeStyle};
pub use executor::{capture_output, run_batch, run_interactive, ExecOptions, Terminal};
pub use transport::{
    ExitStatus, RemoteConnection, RemoteSession, RemoteStdin, SessionEvent, Transport,
};
