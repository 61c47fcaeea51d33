//! SSH执行器模块
//! 在已认证的连接上执行命令：批处理、交互式、输出捕获三种模式
//!
//! 每次调用只开一个会话，并保证在所有返回路径上关闭它

use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, DuplexStream};
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::ssh::escape::{build_command, EscapeStyle};
use crate::ssh::transport::{ExitStatus, RemoteConnection, RemoteSession, SessionEvent};

/// 交互模式下 stdout/stderr 管道的缓冲大小
const PIPE_CAPACITY: usize = 64 * 1024;

/// 调用方的终端流
pub struct Terminal {
    pub stdin: Box<dyn AsyncRead + Send + Unpin>,
    pub stdout: Box<dyn AsyncWrite + Send + Unpin>,
    pub stderr: Box<dyn AsyncWrite + Send + Unpin>,
}

impl Terminal {
    /// 当前进程的标准输入输出
    pub fn stdio() -> Self {
        Self {
            stdin: Box::new(tokio::io::stdin()),
            stdout: Box::new(tokio::io::stdout()),
            stderr: Box::new(tokio::io::stderr()),
        }
    }
}

/// 执行选项
#[derive(Debug, Clone, Copy)]
pub struct ExecOptions {
    pub escape: EscapeStyle,
    /// 命令执行超时，None 表示一直等待
    pub command_timeout: Option<Duration>,
}

impl ExecOptions {
    pub fn new(escape: EscapeStyle) -> Self {
        Self {
            escape,
            command_timeout: None,
        }
    }

    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }
}

/// 批处理模式：输出实时写到终端，阻塞直到远端进程退出
pub async fn run_batch<C: RemoteConnection>(
    connection: &mut C,
    command: &str,
    args: &[String],
    options: ExecOptions,
    terminal: &mut Terminal,
) -> Result<()> {
    let full_command = build_command(command, args, options.escape);
    let target = connection.target().to_string();

    let mut session = connection.open_session().await?;
    let outcome = with_deadline(
        options.command_timeout,
        &target,
        drive_batch(&mut session, &full_command, terminal),
    )
    .await;
    session.close().await;

    let status = outcome?;
    check_exit(&target, &full_command, status)
}

async fn drive_batch<S: RemoteSession>(
    session: &mut S,
    command: &str,
    terminal: &mut Terminal,
) -> Result<Option<ExitStatus>> {
    let mut remote_stdin = session.stdin();
    session.start(command).await?;

    let Terminal {
        stdin: local_stdin,
        stdout,
        stderr,
    } = terminal;

    // stdin 转发作为独立分支轮询，远端不读输入时也不会阻塞事件接收
    let forward = async move {
        if let Err(e) = tokio::io::copy(local_stdin, &mut remote_stdin).await {
            debug!(error = %e, "stdin forwarding stopped");
        }
        let _ = remote_stdin.shutdown().await;
    };
    tokio::pin!(forward);

    let mut forwarding = true;
    let mut exit = None;

    loop {
        tokio::select! {
            event = session.next_event() => match event {
                Some(SessionEvent::Stdout(data)) => write_live(&mut **stdout, &data).await?,
                Some(SessionEvent::Stderr(data)) => write_live(&mut **stderr, &data).await?,
                Some(SessionEvent::Exit(status)) => exit = Some(status),
                None => break,
            },
            _ = &mut forward, if forwarding => forwarding = false,
        }
    }

    Ok(exit)
}

/// 交互模式：stdout、stderr、stdin 三路独立并发转发
///
/// 返回前保证远端输出已全部写到本地；stdin 转发不等待排空。
pub async fn run_interactive<C: RemoteConnection>(
    connection: &mut C,
    command: &str,
    args: &[String],
    options: ExecOptions,
    terminal: Terminal,
) -> Result<()> {
    let full_command = build_command(command, args, options.escape);
    let target = connection.target().to_string();

    let mut session = connection.open_session().await?;
    let outcome = drive_interactive(&mut session, &full_command, &target, options, terminal).await;
    session.close().await;

    let status = outcome?;
    check_exit(&target, &full_command, status)
}

async fn drive_interactive<S: RemoteSession>(
    session: &mut S,
    command: &str,
    target: &str,
    options: ExecOptions,
    terminal: Terminal,
) -> Result<Option<ExitStatus>> {
    let (mut stdout_pipe, stdout_reader) = tokio::io::duplex(PIPE_CAPACITY);
    let (mut stderr_pipe, stderr_reader) = tokio::io::duplex(PIPE_CAPACITY);
    let mut remote_stdin = session.stdin();

    session.start(command).await?;

    let Terminal {
        stdin: mut local_stdin,
        stdout: local_stdout,
        stderr: local_stderr,
    } = terminal;

    let stdout_relay = tokio::spawn(relay(stdout_reader, local_stdout, "stdout"));
    let stderr_relay = tokio::spawn(relay(stderr_reader, local_stderr, "stderr"));
    let stdin_relay = tokio::spawn(async move {
        if let Err(e) = tokio::io::copy(&mut local_stdin, &mut remote_stdin).await {
            debug!(error = %e, "stdin relay stopped");
        }
        let _ = remote_stdin.shutdown().await;
    });

    let outcome = with_deadline(
        options.command_timeout,
        target,
        demultiplex(session, &mut stdout_pipe, &mut stderr_pipe),
    )
    .await;

    // 关闭管道写端，输出转发读到 EOF 后结束
    drop(stdout_pipe);
    drop(stderr_pipe);
    let _ = stdout_relay.await;
    let _ = stderr_relay.await;
    stdin_relay.abort();

    outcome
}

/// 将会话事件分发到 stdout/stderr 管道，直到通道关闭
async fn demultiplex<S: RemoteSession>(
    session: &mut S,
    stdout_pipe: &mut DuplexStream,
    stderr_pipe: &mut DuplexStream,
) -> Result<Option<ExitStatus>> {
    let mut exit = None;
    while let Some(event) = session.next_event().await {
        match event {
            // 转发任务已退出时写入会失败，忽略并继续等待退出
            SessionEvent::Stdout(data) => {
                let _ = stdout_pipe.write_all(&data).await;
            }
            SessionEvent::Stderr(data) => {
                let _ = stderr_pipe.write_all(&data).await;
            }
            SessionEvent::Exit(status) => exit = Some(status),
        }
    }
    Ok(exit)
}

async fn relay<W>(mut source: DuplexStream, mut sink: W, stream: &'static str)
where
    W: AsyncWrite + Send + Unpin,
{
    if let Err(e) = tokio::io::copy(&mut source, &mut sink).await {
        warn!(stream = stream, error = %e, "Output relay stopped");
    }
    let _ = sink.flush().await;
}

/// 执行命令并捕获合并后的 stdout/stderr
pub async fn capture_output<C: RemoteConnection>(
    connection: &mut C,
    command: &str,
    command_timeout: Option<Duration>,
) -> Result<String> {
    let target = connection.target().to_string();

    let mut session = connection.open_session().await?;
    let outcome = with_deadline(command_timeout, &target, drive_capture(&mut session, command)).await;
    session.close().await;

    let (output, status) = outcome?;
    check_exit(&target, command, status)?;
    Ok(String::from_utf8_lossy(&output).into_owned())
}

async fn drive_capture<S: RemoteSession>(
    session: &mut S,
    command: &str,
) -> Result<(Vec<u8>, Option<ExitStatus>)> {
    let mut remote_stdin = session.stdin();
    session.start(command).await?;
    let _ = remote_stdin.shutdown().await;

    let mut output = Vec::new();
    let mut exit = None;
    while let Some(event) = session.next_event().await {
        match event {
            SessionEvent::Stdout(data) | SessionEvent::Stderr(data) => {
                output.extend_from_slice(&data)
            }
            SessionEvent::Exit(status) => exit = Some(status),
        }
    }
    Ok((output, exit))
}

async fn write_live(sink: &mut (dyn AsyncWrite + Send + Unpin), data: &[u8]) -> Result<()> {
    sink.write_all(data).await?;
    sink.flush().await?;
    Ok(())
}

async fn with_deadline<T, F>(limit: Option<Duration>, target: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        None => fut.await,
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(remote = %target, timeout_secs = limit.as_secs(), "Command timed out");
                Err(AppError::exec(
                    target,
                    format!("command timed out after {}s", limit.as_secs()),
                ))
            }
        },
    }
}

fn check_exit(target: &str, command: &str, status: Option<ExitStatus>) -> Result<()> {
    match status {
        Some(status) if status.success() => {
            info!(remote = %target, command = %command, "Command completed");
            Ok(())
        }
        Some(status) => {
            info!(remote = %target, command = %command, exit_status = %status, "Command failed");
            Err(AppError::exec(target, status.to_string()))
        }
        None => Err(AppError::exec(
            target,
            "channel closed before the remote command reported an exit status",
        )),
    }
}
