//! SSH 客户端
//!
//! 使用 russh 实现 [`Transport`]：拨号、认证、开通道、收发数据

use async_trait::async_trait;
use russh::client::{self, Config, Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect, Sig};
use russh_keys::key::{KeyPair, PublicKey};
use russh_keys::PublicKeyBase64;
use secrecy::{ExposeSecret, Secret};
use sha2::Digest;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info};

use crate::error::{AppError, Result};
use crate::models::host::{Credential, HostIdentity};
use crate::ssh::transport::{
    ExitStatus, RemoteConnection, RemoteSession, RemoteStdin, SessionEvent, Transport,
};

/// SSH_EXTENDED_DATA_STDERR
const EXTENDED_DATA_STDERR: u32 = 1;

/// 默认连接超时（秒）
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// 基于 russh 的传输层
#[derive(Debug, Clone)]
pub struct SshTransport {
    connect_timeout: Duration,
}

impl SshTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for SshTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
    }
}

/// 拨号前解析好的认证方式
enum ResolvedAuth {
    Password(Secret<String>),
    Key(Arc<KeyPair>),
}

/// 读取并解析私钥文件
pub fn load_private_key(path: &Path) -> Result<KeyPair> {
    let data = std::fs::read(path).map_err(|source| AppError::KeyRead {
        path: path.to_path_buf(),
        source,
    })?;

    // 能读出但不是文本的文件同样属于无效私钥
    let text = String::from_utf8(data).map_err(|e| AppError::KeyParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    russh_keys::decode_secret_key(&text, None).map_err(|e| AppError::KeyParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// 信号名：自定义信号去掉 `Custom(..)` 包装
fn signal_name(signal: &Sig) -> String {
    match signal {
        Sig::Custom(name) => name.clone(),
        other => format!("{:?}", other),
    }
}

fn resolve_auth(credential: &Credential) -> Result<ResolvedAuth> {
    match credential {
        Credential::Password(secret) => Ok(ResolvedAuth::Password(secret.clone())),
        Credential::PrivateKey { key_path } => {
            let key = load_private_key(key_path).map_err(|e| {
                error!(key_path = %key_path.display(), error = %e, "Failed to load private key");
                e
            })?;
            Ok(ResolvedAuth::Key(Arc::new(key)))
        }
    }
}

#[async_trait]
impl Transport for SshTransport {
    type Connection = SshConnection;

    async fn open(&self, host: &HostIdentity) -> Result<SshConnection> {
        let auth = resolve_auth(&host.credential)?;
        let address = host.address();
        let target = host.target();

        debug!(
            host = %host.host,
            port = host.port,
            user = %host.username,
            "Connecting"
        );

        let config = Arc::new(Config::default());
        let handler = AcceptAnyHostKey {
            address: address.clone(),
        };

        let mut handle = timeout(
            self.connect_timeout,
            client::connect(config, (host.host.clone(), host.port), handler),
        )
        .await
        .map_err(|_| AppError::Network {
            address: address.clone(),
            reason: format!(
                "connection timed out after {}s",
                self.connect_timeout.as_secs()
            ),
        })?
        .map_err(|e| {
            error!(address = %address, error = %e, "SSH connect failed");
            AppError::Network {
                address: address.clone(),
                reason: e.to_string(),
            }
        })?;

        let authenticated = match auth {
            ResolvedAuth::Password(password) => {
                handle
                    .authenticate_password(host.username.clone(), password.expose_secret().as_str())
                    .await
            }
            ResolvedAuth::Key(key) => {
                handle
                    .authenticate_publickey(host.username.clone(), key)
                    .await
            }
        };

        let rejected = match authenticated {
            Ok(true) => None,
            Ok(false) => Some("server rejected the supplied credentials".to_string()),
            Err(e) => Some(e.to_string()),
        };

        if let Some(reason) = rejected {
            error!(remote = %target, reason = %reason, "SSH authentication failed");
            let _ = handle
                .disconnect(Disconnect::ByApplication, "", "")
                .await;
            return Err(AppError::Auth { target, reason });
        }

        info!(remote = %target, "SSH authenticated");

        Ok(SshConnection {
            handle,
            target,
            closed: false,
        })
    }
}

/// 主机密钥处理器：不校验，接受任意服务端密钥
struct AcceptAnyHostKey {
    address: String,
}

#[async_trait]
impl client::Handler for AcceptAnyHostKey {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let key_data = server_public_key.public_key_base64();
        let mut hasher = sha2::Sha256::new();
        hasher.update(key_data.as_bytes());
        let fingerprint = hex::encode(hasher.finalize());

        info!(
            address = %self.address,
            fingerprint = %fingerprint,
            "Host key verification disabled - accepting server key"
        );
        Ok(true)
    }
}

/// 已认证的 SSH 连接
pub struct SshConnection {
    handle: Handle<AcceptAnyHostKey>,
    target: String,
    closed: bool,
}

#[async_trait]
impl RemoteConnection for SshConnection {
    type Session = SshSession;

    fn target(&self) -> &str {
        &self.target
    }

    async fn open_session(&mut self) -> Result<SshSession> {
        if self.closed {
            return Err(AppError::session(&self.target, "connection is closed"));
        }

        let channel = self.handle.channel_open_session().await.map_err(|e| {
            error!(remote = %self.target, error = %e, "Failed to open SSH channel");
            AppError::session(&self.target, e.to_string())
        })?;

        debug!(remote = %self.target, "Session opened");

        Ok(SshSession {
            channel,
            target: self.target.clone(),
            closed: false,
        })
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "")
            .await
        {
            debug!(remote = %self.target, error = %e, "Disconnect failed");
        }
        debug!(remote = %self.target, "Connection closed");
    }
}

/// 单个 SSH 会话通道
pub struct SshSession {
    channel: Channel<Msg>,
    target: String,
    closed: bool,
}

#[async_trait]
impl RemoteSession for SshSession {
    async fn start(&mut self, command: &str) -> Result<()> {
        debug!(remote = %self.target, command = %command, "Starting remote command");

        self.channel.exec(true, command).await.map_err(|e| {
            error!(remote = %self.target, error = %e, "Failed to start command");
            AppError::exec(&self.target, format!("failed to start command: {}", e))
        })
    }

    fn stdin(&self) -> RemoteStdin {
        Box::pin(self.channel.make_writer())
    }

    async fn next_event(&mut self) -> Option<SessionEvent> {
        loop {
            match self.channel.wait().await? {
                ChannelMsg::Data { data } => return Some(SessionEvent::Stdout(data.to_vec())),
                ChannelMsg::ExtendedData { data, ext } if ext == EXTENDED_DATA_STDERR => {
                    return Some(SessionEvent::Stderr(data.to_vec()))
                }
                ChannelMsg::ExitStatus { exit_status } => {
                    return Some(SessionEvent::Exit(ExitStatus::Code(exit_status)))
                }
                ChannelMsg::ExitSignal {
                    signal_name: signal,
                    error_message,
                    ..
                } => {
                    return Some(SessionEvent::Exit(ExitStatus::Signal {
                        name: signal_name(&signal),
                        message: error_message,
                    }))
                }
                _ => {}
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self.channel.close().await;
    }
}
