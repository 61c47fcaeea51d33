//! 远程执行服务：建立连接 -> 执行/探测 -> 关闭连接
//!
//! 每次调用重新认证，连接在所有返回路径上关闭且只关闭一次

use tracing::info;

use crate::{
    config::AppConfig,
    error::Result,
    models::host::HostIdentity,
    probe::{collect, ProbeResult},
    ssh::{
        executor::{run_batch, run_interactive, ExecOptions, Terminal},
        transport::{RemoteConnection, Transport},
    },
};

/// 命令执行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecMode {
    #[default]
    Batch,
    Interactive,
}

pub struct RemoteService<T: Transport> {
    transport: T,
    config: AppConfig,
}

impl<T: Transport> RemoteService<T> {
    pub fn new(transport: T, config: AppConfig) -> Self {
        Self { transport, config }
    }

    fn exec_options(&self, host: &HostIdentity) -> ExecOptions {
        ExecOptions::new(self.config.exec.escape_style(host.os))
            .with_command_timeout(self.config.ssh.command_timeout())
    }

    /// 在远程主机上执行命令
    pub async fn execute(
        &self,
        host: &HostIdentity,
        command: &str,
        args: &[String],
        mode: ExecMode,
        mut terminal: Terminal,
    ) -> Result<()> {
        let options = self.exec_options(host);

        info!(
            name = %host.name,
            address = %host.address(),
            command = %command,
            args = args.len(),
            mode = ?mode,
            "Executing remote command"
        );

        let mut connection = self.transport.open(host).await?;
        let result = match mode {
            ExecMode::Batch => {
                run_batch(&mut connection, command, args, options, &mut terminal).await
            }
            ExecMode::Interactive => {
                run_interactive(&mut connection, command, args, options, terminal).await
            }
        };
        connection.close().await;

        result
    }

    /// 测试连接并采集系统信息
    ///
    /// `on_connected` 在认证成功后、开始探测前调用一次
    pub async fn test_connection<F>(
        &self,
        host: &HostIdentity,
        on_connected: F,
    ) -> Result<ProbeResult>
    where
        F: FnOnce(),
    {
        let mut connection = self.transport.open(host).await?;
        info!(name = %host.name, address = %host.address(), "Connection successful");
        on_connected();

        let probes = collect(&mut connection, host.os, self.config.ssh.command_timeout()).await;
        connection.close().await;

        Ok(probes)
    }
}
