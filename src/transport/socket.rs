//! Line-oriented TCP client socket.
//!
//! [`LineSocket`] wraps a buffered `tokio::net::TcpStream` and exposes the
//! small stream surface the probe needs: connect by host and service name,
//! raw and line-delimited reads/writes, half-close and close. Protocol
//! knowledge lives in `crate::probe`; this module owns only byte I/O.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use once_cell::sync::Lazy;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{lookup_host, TcpStream};
use tokio::time;

use crate::config::SocketConfig;
use crate::transport::error::SocketError;

/// Bytes returned by [`LineSocket::read`] when no size is given.
pub const DEFAULT_READ_SIZE: usize = 1024;

/// Service names accepted by [`resolve_service`] in addition to numeric
/// port strings.
static WELL_KNOWN_SERVICES: Lazy<HashMap<&'static str, u16>> = Lazy::new(|| {
    HashMap::from([
        ("echo", 7),
        ("ftp", 21),
        ("ssh", 22),
        ("telnet", 23),
        ("smtp", 25),
        ("domain", 53),
        ("http", 80),
        ("pop3", 110),
        ("imap", 143),
        ("https", 443),
    ])
});

/// Translate a service name or numeric port string into a port number.
pub fn resolve_service(service: &str) -> Result<u16, SocketError> {
    if let Some(port) = WELL_KNOWN_SERVICES.get(service) {
        return Ok(*port);
    }
    service
        .parse::<u16>()
        .map_err(|_| SocketError::UnknownService(service.to_string()))
}

async fn with_timeout<T, F>(secs: u64, what: &'static str, fut: F) -> Result<T, SocketError>
where
    F: Future<Output = Result<T, SocketError>>,
{
    if secs == 0 {
        return fut.await;
    }
    match time::timeout(Duration::from_secs(secs), fut).await {
        Ok(result) => result,
        Err(_) => Err(SocketError::Timeout(what)),
    }
}

#[derive(Debug)]
pub struct LineSocket {
    // None once close() has been called.
    stream: Option<BufReader<TcpStream>>,
    read_timeout_secs: u64,
}

impl LineSocket {
    /// Resolve `host`/`service` and connect, trying each resolved address
    /// in order until one accepts.
    pub async fn connect(
        host: &str,
        service: &str,
        config: &SocketConfig,
    ) -> Result<Self, SocketError> {
        let port = resolve_service(service)?;
        let stream = with_timeout(config.connect_timeout_secs, "connect", async {
            let addrs: Vec<SocketAddr> = lookup_host((host, port))
                .await
                .map_err(|e| SocketError::Resolve(host.to_string(), e))?
                .collect();

            let mut last_err = None;
            for addr in addrs {
                match TcpStream::connect(addr).await {
                    Ok(stream) => return Ok(stream),
                    Err(e) => last_err = Some(e),
                }
            }
            Err(match last_err {
                Some(e) => SocketError::Connect(e),
                None => SocketError::Resolve(
                    host.to_string(),
                    io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
                ),
            })
        })
        .await?;

        log::debug!("[SOCKET] Connected to {}:{}", host, port);
        Ok(LineSocket {
            stream: Some(BufReader::new(stream)),
            read_timeout_secs: config.read_timeout_secs,
        })
    }

    /// Wrap an already-accepted stream (see `LineListener::accept`).
    pub(crate) fn from_stream(stream: TcpStream, config: &SocketConfig) -> Self {
        LineSocket {
            stream: Some(BufReader::new(stream)),
            read_timeout_secs: config.read_timeout_secs,
        }
    }

    fn stream_mut(&mut self) -> Result<&mut BufReader<TcpStream>, SocketError> {
        self.stream.as_mut().ok_or(SocketError::NotConnected)
    }

    fn stream_ref(&self) -> Result<&BufReader<TcpStream>, SocketError> {
        self.stream.as_ref().ok_or(SocketError::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        self.stream_ref()?.get_ref().local_addr().map_err(SocketError::Io)
    }

    pub fn peer_addr(&self) -> Result<SocketAddr, SocketError> {
        self.stream_ref()?.get_ref().peer_addr().map_err(SocketError::Io)
    }

    /// Write the whole string, returning the number of bytes sent.
    pub async fn write(&mut self, data: &str) -> Result<usize, SocketError> {
        let stream = self.stream_mut()?;
        stream.write_all(data.as_bytes()).await?;
        Ok(data.len())
    }

    /// Write the string followed by a single `\n`.
    pub async fn write_line(&mut self, line: &str) -> Result<usize, SocketError> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        self.write(&buf).await
    }

    /// Read at most `max` bytes (0 means [`DEFAULT_READ_SIZE`]) and return
    /// them as text. An empty string means EOF.
    pub async fn read(&mut self, max: usize) -> Result<String, SocketError> {
        let secs = self.read_timeout_secs;
        let stream = self.stream_mut()?;
        let mut buf = vec![0u8; if max == 0 { DEFAULT_READ_SIZE } else { max }];
        let n = with_timeout(secs, "read", async { Ok(stream.read(&mut buf).await?) }).await?;
        buf.truncate(n);
        String::from_utf8(buf).map_err(|_| SocketError::InvalidText)
    }

    /// Read up to and excluding the next `\n`. A `\r` before the `\n` is
    /// kept. EOF before any byte yields an empty string.
    pub async fn read_line(&mut self) -> Result<String, SocketError> {
        let secs = self.read_timeout_secs;
        let stream = self.stream_mut()?;
        let mut buf = Vec::new();
        with_timeout(secs, "read line", async {
            stream.read_until(b'\n', &mut buf).await?;
            Ok(())
        })
        .await?;
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        String::from_utf8(buf).map_err(|_| SocketError::InvalidText)
    }

    pub async fn flush(&mut self) -> Result<(), SocketError> {
        self.stream_mut()?.flush().await?;
        Ok(())
    }

    /// Half-close the write side, signalling EOF to the peer.
    pub async fn shutdown(&mut self) -> Result<(), SocketError> {
        self.stream_mut()?.shutdown().await?;
        Ok(())
    }

    /// Release the connection. Closing twice is an error; any I/O after
    /// close fails with `NotConnected`.
    pub fn close(&mut self) -> Result<(), SocketError> {
        match self.stream.take() {
            Some(_) => Ok(()),
            None => Err(SocketError::NotConnected),
        }
    }
}
