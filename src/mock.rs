//! Canned-response HTTP responder, so probes can run against a local
//! socket instead of live third-party infrastructure.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tokio::{select, signal};

use crate::config::SocketConfig;
use crate::transport::{LineListener, LineSocket, SocketError};

#[derive(Debug, Clone)]
pub struct MockResponse {
    /// First line to send back, without the trailing CRLF. `None` closes
    /// the connection without writing a byte.
    pub status_line: Option<String>,
    pub body: String,
}

impl MockResponse {
    pub fn ok() -> Self {
        MockResponse {
            status_line: Some("HTTP/1.0 200 OK".to_string()),
            body: "hello\n".to_string(),
        }
    }

    pub fn with_status_line(line: &str) -> Self {
        MockResponse {
            status_line: Some(line.to_string()),
            body: String::new(),
        }
    }

    pub fn close_immediately() -> Self {
        MockResponse {
            status_line: None,
            body: String::new(),
        }
    }
}

/// In-process responder bound to an ephemeral localhost port. Records the
/// request line of every connection it serves; the serving task is
/// aborted on drop.
pub struct MockHttpServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl MockHttpServer {
    pub async fn spawn(response: MockResponse) -> Result<Self, SocketError> {
        let listener = LineListener::bind("127.0.0.1", "0", &SocketConfig::default()).await?;
        let addr = listener.local_addr()?;
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        let task = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((sock, peer)) => {
                        log::debug!("[MOCK] Connection from {}", peer);
                        match serve_connection(sock, &response).await {
                            Ok(Some(request_line)) => {
                                seen.lock().unwrap().push(request_line);
                            }
                            Ok(None) => {}
                            Err(e) => log::warn!("[MOCK] Connection error: {}", e),
                        }
                    }
                    Err(e) => {
                        log::warn!("[MOCK] Accept failed: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(MockHttpServer {
            addr,
            requests,
            task,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Request lines seen so far, oldest first.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for MockHttpServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Accept loop for the `serve` subcommand. Runs until Ctrl+C.
pub async fn run_foreground(ip: &str, service: &str, response: MockResponse) -> Result<()> {
    let listener = LineListener::bind(ip, service, &SocketConfig::default())
        .await
        .context("Failed to bind mock responder")?;
    log::info!(
        "[MOCK] Serving canned responses on {}",
        listener.local_addr().context("Listener has no local address")?
    );

    loop {
        select! {
            accepted = listener.accept() => {
                let (sock, peer) = accepted.context("Accept failed")?;
                log::info!("[MOCK] Connection from {}", peer);
                let response = response.clone();
                tokio::spawn(async move {
                    match serve_connection(sock, &response).await {
                        Ok(Some(request_line)) => {
                            log::info!("[MOCK] Served {:?}", request_line);
                        }
                        Ok(None) => {}
                        Err(e) => log::error!("[MOCK] Connection error: {}", e),
                    }
                });
            }
            _ = signal::ctrl_c() => {
                log::info!("[MOCK] Ctrl+C detected! Shutting down gracefully...");
                break;
            }
        }
    }
    Ok(())
}

/// Read the request head up to its blank line, send the canned response
/// and close. Returns the request line, if one arrived.
async fn serve_connection(
    mut sock: LineSocket,
    response: &MockResponse,
) -> Result<Option<String>, SocketError> {
    let mut request_line = None;
    loop {
        let line = sock.read_line().await?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            break;
        }
        if request_line.is_none() {
            request_line = Some(line.to_string());
        }
    }

    let status_line = match &response.status_line {
        Some(line) => line,
        None => {
            sock.close()?;
            return Ok(request_line);
        }
    };

    sock.write(&format!("{}\r\n", status_line)).await?;
    sock.write("Connection: close\r\n\r\n").await?;
    if !response.body.is_empty() {
        sock.write(&response.body).await?;
    }
    sock.flush().await?;
    sock.shutdown().await?;
    sock.close()?;
    Ok(request_line)
}
