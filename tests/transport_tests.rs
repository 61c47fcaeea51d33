//! SSH 传输层测试（不依赖真实 SSH 服务）

use rexec::{
    error::AppError,
    models::host::{Credential, HostIdentity, OsClass},
    ssh::{SshTransport, Transport},
};
use std::time::Duration;

fn local_host(port: u16, credential: Credential) -> HostIdentity {
    HostIdentity {
        name: "local".to_string(),
        host: "127.0.0.1".to_string(),
        port,
        os: OsClass::Linux,
        username: "ops".to_string(),
        credential,
    }
}

/// 绑定后立即释放的端口，连接会被拒绝
fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn test_refused_dial_is_network_error() {
    let transport = SshTransport::new(Duration::from_secs(5));
    let host = local_host(closed_port(), Credential::password("x"));

    let err = transport.open(&host).await.err().unwrap();

    match err {
        AppError::Network { address, .. } => assert_eq!(address, host.address()),
        other => panic!("expected network error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_key_fails_before_dialing() {
    let transport = SshTransport::new(Duration::from_secs(5));
    let host = local_host(
        closed_port(),
        Credential::private_key("/nonexistent/rexec/id_rsa"),
    );

    let err = transport.open(&host).await.err().unwrap();

    assert!(matches!(err, AppError::KeyRead { .. }));
    assert!(err.to_string().contains("/nonexistent/rexec/id_rsa"));
}

#[tokio::test]
async fn test_unparseable_key_is_key_parse_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let key = dir.path().join("id_rsa");
    std::fs::write(&key, "-----BEGIN NOTHING-----\ngarbage\n").unwrap();

    let transport = SshTransport::default();
    let host = local_host(closed_port(), Credential::private_key(&key));

    let err = transport.open(&host).await.err().unwrap();

    assert!(matches!(err, AppError::KeyParse { .. }));
}
