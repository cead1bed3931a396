use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::SocketConfig;
use crate::transport::error::SocketError;
use crate::transport::socket::{resolve_service, LineSocket};

/// Accepting side of [`LineSocket`]. Service `"0"` binds an ephemeral port.
pub struct LineListener {
    listener: TcpListener,
    socket_config: SocketConfig,
}

impl LineListener {
    pub async fn bind(ip: &str, service: &str, config: &SocketConfig) -> Result<Self, SocketError> {
        let port = resolve_service(service)?;
        let listener = TcpListener::bind((ip, port))
            .await
            .map_err(SocketError::Bind)?;
        log::debug!(
            "[SOCKET] Listening on {}",
            listener.local_addr().map_err(SocketError::Io)?
        );
        Ok(LineListener {
            listener,
            socket_config: config.clone(),
        })
    }

    pub async fn accept(&self) -> Result<(LineSocket, SocketAddr), SocketError> {
        let (stream, peer) = self.listener.accept().await.map_err(SocketError::Io)?;
        Ok((LineSocket::from_stream(stream, &self.socket_config), peer))
    }

    pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        self.listener.local_addr().map_err(SocketError::Io)
    }
}
