use sockprobe::config::{ProbeConfig, SocketConfig};
use sockprobe::mock::{MockHttpServer, MockResponse};
use sockprobe::probe::{ProbeEngine, ProbeError};

/// End-to-end probe runs against the in-process mock responder, never
/// against live infrastructure:
///  + a plain HTTP/1.0 200 answer passes and is reported
///  + an HTTP/1.1 answer passes with the default accepted versions
///  + an HTTP/1.1 answer fails when only HTTP/1.0 is accepted
///  + a non-HTTP banner fails with the invalid-status-line error
///  + a connection closed without a byte fails as unexpected EOF
///  + the request on the wire is exactly `GET <path> HTTP/1.0`

fn test_socket_config() -> SocketConfig {
    SocketConfig {
        connect_timeout_secs: 5,
        read_timeout_secs: 5,
    }
}

fn probe_config_for(server: &MockHttpServer) -> ProbeConfig {
    ProbeConfig {
        host: "127.0.0.1".to_string(),
        service: server.port().to_string(),
        ..ProbeConfig::default()
    }
}

#[tokio::test]
async fn probe_accepts_an_http_1_0_answer() {
    let server = MockHttpServer::spawn(MockResponse::ok())
        .await
        .expect("Error starting mock server.");

    let engine = ProbeEngine::new(probe_config_for(&server), test_socket_config());
    let report = engine.run().await.expect("Probe should succeed.");

    assert_eq!(report.status.version, "HTTP/1.0");
    assert_eq!(report.status.code, 200);
    assert_eq!(report.status.reason, "OK");
    assert_eq!(report.host, "127.0.0.1");
}

#[tokio::test]
async fn probe_accepts_http_1_1_with_default_config() {
    let server = MockHttpServer::spawn(MockResponse::with_status_line("HTTP/1.1 200 OK"))
        .await
        .expect("Error starting mock server.");

    let engine = ProbeEngine::new(probe_config_for(&server), test_socket_config());
    let report = engine.run().await.expect("Probe should succeed.");

    assert_eq!(report.status.version, "HTTP/1.1");
}

#[tokio::test]
async fn strict_config_rejects_an_http_1_1_answer() {
    let server = MockHttpServer::spawn(MockResponse::with_status_line("HTTP/1.1 200 OK"))
        .await
        .expect("Error starting mock server.");

    let mut probe_config = probe_config_for(&server);
    probe_config.accepted_versions = vec!["HTTP/1.0".to_string()];

    let engine = ProbeEngine::new(probe_config, test_socket_config());
    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, ProbeError::InvalidStatusLine(_)));
    assert!(err.to_string().starts_with("Invalid status line!"));
}

#[tokio::test]
async fn probe_rejects_a_non_http_banner() {
    let server = MockHttpServer::spawn(MockResponse::with_status_line("NOPE 500 nope"))
        .await
        .expect("Error starting mock server.");

    let engine = ProbeEngine::new(probe_config_for(&server), test_socket_config());
    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, ProbeError::InvalidStatusLine(_)));
}

#[tokio::test]
async fn probe_rejects_a_status_line_without_a_code() {
    // Passes the version prefix check, fails to parse as a status line.
    let server = MockHttpServer::spawn(MockResponse::with_status_line("HTTP/1.0 OK"))
        .await
        .expect("Error starting mock server.");

    let engine = ProbeEngine::new(probe_config_for(&server), test_socket_config());
    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, ProbeError::InvalidStatusLine(_)));
}

#[tokio::test]
async fn immediate_close_is_an_unexpected_eof() {
    let server = MockHttpServer::spawn(MockResponse::close_immediately())
        .await
        .expect("Error starting mock server.");

    let engine = ProbeEngine::new(probe_config_for(&server), test_socket_config());
    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, ProbeError::UnexpectedEof));
}

#[tokio::test]
async fn probe_sends_a_bare_http_1_0_get_for_the_configured_path() {
    let server = MockHttpServer::spawn(MockResponse::ok())
        .await
        .expect("Error starting mock server.");

    let mut probe_config = probe_config_for(&server);
    probe_config.request_path = "/health".to_string();

    let engine = ProbeEngine::new(probe_config, test_socket_config());
    engine.run().await.expect("Probe should succeed.");

    assert_eq!(server.requests(), vec!["GET /health HTTP/1.0".to_string()]);
}
