//! 测试公共模块
//! 脚本化的模拟传输层、输出缓冲与测试配置

#![allow(dead_code)]

use async_trait::async_trait;
use rexec::{
    config::{AppConfig, ExecSettings, LoggingConfig, SshSettings, StoreSettings},
    error::{AppError, Result},
    models::host::{Credential, HostIdentity, OsClass},
    ssh::{
        ExitStatus, RemoteConnection, RemoteSession, RemoteStdin, SessionEvent, Terminal,
        Transport,
    },
};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWrite, DuplexStream};
use tokio::time::Instant;

/// 创建测试配置
pub fn create_test_config() -> AppConfig {
    AppConfig {
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "compact".to_string(),
        },
        ssh: SshSettings {
            connect_timeout_secs: 5,
            command_timeout_secs: None,
        },
        exec: ExecSettings {
            windows_escaping: "verbatim".to_string(),
        },
        store: StoreSettings::default(),
    }
}

pub fn linux_host() -> HostIdentity {
    HostIdentity {
        name: "web-01".to_string(),
        host: "10.0.0.5".to_string(),
        port: 22,
        os: OsClass::Linux,
        username: "root".to_string(),
        credential: Credential::password("secret"),
    }
}

pub fn windows_host() -> HostIdentity {
    HostIdentity {
        name: "win-01".to_string(),
        host: "10.0.0.9".to_string(),
        port: 2222,
        os: OsClass::Windows,
        username: "Administrator".to_string(),
        credential: Credential::password("secret"),
    }
}

/// 可共享的输出缓冲，用作本地 stdout/stderr
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl AsyncWrite for SharedBuffer {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// 测试终端：输入来自给定字节，输出写入共享缓冲
pub struct TestTerminal {
    pub stdout: SharedBuffer,
    pub stderr: SharedBuffer,
}

impl TestTerminal {
    pub fn new() -> Self {
        Self {
            stdout: SharedBuffer::default(),
            stderr: SharedBuffer::default(),
        }
    }

    pub fn terminal(&self, input: &[u8]) -> Terminal {
        Terminal {
            stdin: Box::new(io::Cursor::new(input.to_vec())),
            stdout: Box::new(self.stdout.clone()),
            stderr: Box::new(self.stderr.clone()),
        }
    }
}

/// 单条命令的脚本化响应
#[derive(Debug, Clone)]
pub struct MockResponse {
    events: Vec<SessionEvent>,
    echo_stdin: bool,
    hang: bool,
    delay: Option<Duration>,
}

impl MockResponse {
    /// 无输出，退出码 0
    pub fn ok() -> Self {
        Self {
            events: Vec::new(),
            echo_stdin: false,
            hang: false,
            delay: None,
        }
        .exit(0)
    }

    /// 不上报退出状态
    pub fn no_exit() -> Self {
        Self {
            events: Vec::new(),
            echo_stdin: false,
            hang: false,
            delay: None,
        }
    }

    /// 永不结束
    pub fn hang() -> Self {
        Self {
            events: Vec::new(),
            echo_stdin: false,
            hang: true,
            delay: None,
        }
    }

    pub fn stdout(mut self, data: &str) -> Self {
        self.insert_before_exit(SessionEvent::Stdout(data.as_bytes().to_vec()));
        self
    }

    pub fn stderr(mut self, data: &str) -> Self {
        self.insert_before_exit(SessionEvent::Stderr(data.as_bytes().to_vec()));
        self
    }

    pub fn exit(mut self, code: u32) -> Self {
        self.events.retain(|e| !matches!(e, SessionEvent::Exit(_)));
        self.events.push(SessionEvent::Exit(ExitStatus::Code(code)));
        self
    }

    /// 先把收到的 stdin 原样回显到 stdout，直到 stdin 关闭
    pub fn echo_stdin(mut self) -> Self {
        self.echo_stdin = true;
        self
    }

    /// 启动后延迟一段时间再上报事件（期间不读取 stdin）
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn insert_before_exit(&mut self, event: SessionEvent) {
        let at = self
            .events
            .iter()
            .position(|e| matches!(e, SessionEvent::Exit(_)))
            .unwrap_or(self.events.len());
        self.events.insert(at, event);
    }
}

/// 故障注入点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Open,
    OpenSession,
    Start,
}

/// 模拟传输层的共享状态
#[derive(Debug, Default)]
pub struct MockState {
    responses: Mutex<HashMap<String, MockResponse>>,
    failure: Mutex<Option<Failure>>,
    commands: Mutex<Vec<String>>,
    pub opens: AtomicUsize,
    pub connection_closes: AtomicUsize,
    pub sessions_opened: AtomicUsize,
    pub session_closes: AtomicUsize,
}

impl MockState {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn connection_closes(&self) -> usize {
        self.connection_closes.load(Ordering::SeqCst)
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn session_closes(&self) -> usize {
        self.session_closes.load(Ordering::SeqCst)
    }

    /// 已启动的远程命令行
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    fn failure(&self) -> Option<Failure> {
        *self.failure.lock().unwrap()
    }

    fn response_for(&self, command: &str) -> MockResponse {
        self.responses
            .lock()
            .unwrap()
            .get(command)
            .cloned()
            .unwrap_or_else(MockResponse::ok)
    }
}

/// 模拟传输层，按命令行返回脚本化响应
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    pub state: Arc<MockState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, command: &str, response: MockResponse) -> Self {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(command.to_string(), response);
        self
    }

    pub fn fail_at(self, failure: Failure) -> Self {
        *self.state.failure.lock().unwrap() = Some(failure);
        self
    }

    /// 直接获取一个已“认证”的连接
    pub fn connect(&self, host: &HostIdentity) -> MockConnection {
        MockConnection {
            state: self.state.clone(),
            target: host.target(),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Connection = MockConnection;

    async fn open(&self, host: &HostIdentity) -> Result<MockConnection> {
        self.state.opens.fetch_add(1, Ordering::SeqCst);
        if self.state.failure() == Some(Failure::Open) {
            return Err(AppError::Network {
                address: host.address(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(self.connect(host))
    }
}

pub struct MockConnection {
    state: Arc<MockState>,
    target: String,
}

#[async_trait]
impl RemoteConnection for MockConnection {
    type Session = MockSession;

    fn target(&self) -> &str {
        &self.target
    }

    async fn open_session(&mut self) -> Result<MockSession> {
        if self.state.failure() == Some(Failure::OpenSession) {
            return Err(AppError::session(&self.target, "channel open refused"));
        }
        self.state.sessions_opened.fetch_add(1, Ordering::SeqCst);

        let (writer, reader) = tokio::io::duplex(64 * 1024);
        Ok(MockSession {
            state: self.state.clone(),
            target: self.target.clone(),
            stdin_writer: Mutex::new(Some(writer)),
            stdin_reader: reader,
            response: None,
        })
    }

    async fn close(&mut self) {
        // 每次调用都计数，用于检查只关闭一次
        self.state.connection_closes.fetch_add(1, Ordering::SeqCst);
    }
}

struct Playback {
    events: VecDeque<SessionEvent>,
    echo_stdin: bool,
    hang: bool,
    ready_at: Option<Instant>,
}

pub struct MockSession {
    state: Arc<MockState>,
    target: String,
    stdin_writer: Mutex<Option<DuplexStream>>,
    stdin_reader: DuplexStream,
    response: Option<Playback>,
}

#[async_trait]
impl RemoteSession for MockSession {
    async fn start(&mut self, command: &str) -> Result<()> {
        if self.state.failure() == Some(Failure::Start) {
            return Err(AppError::exec(&self.target, "failed to start command"));
        }
        self.state.commands.lock().unwrap().push(command.to_string());

        let response = self.state.response_for(command);
        self.response = Some(Playback {
            events: response.events.into(),
            echo_stdin: response.echo_stdin,
            hang: response.hang,
            ready_at: response.delay.map(|d| Instant::now() + d),
        });
        Ok(())
    }

    fn stdin(&self) -> RemoteStdin {
        match self.stdin_writer.lock().unwrap().take() {
            Some(writer) => Box::pin(writer),
            None => Box::pin(tokio::io::sink()),
        }
    }

    async fn next_event(&mut self) -> Option<SessionEvent> {
        let playback = self.response.as_mut()?;

        if playback.hang {
            std::future::pending::<()>().await;
        }

        // sleep_until 可重复调用，被取消后再次轮询仍等待同一时刻
        if let Some(ready_at) = playback.ready_at {
            tokio::time::sleep_until(ready_at).await;
        }

        if playback.echo_stdin {
            let mut buf = vec![0u8; 1024];
            match self.stdin_reader.read(&mut buf).await {
                Ok(n) if n > 0 => return Some(SessionEvent::Stdout(buf[..n].to_vec())),
                _ => playback.echo_stdin = false,
            }
        }

        playback.events.pop_front()
    }

    async fn close(&mut self) {
        self.state.session_closes.fetch_add(1, Ordering::SeqCst);
    }
}
