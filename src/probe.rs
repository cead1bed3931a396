use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::config::{ProbeConfig, SocketConfig};
use crate::transport::{LineSocket, SocketError};

/// First line of an HTTP response, split into its three fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub version: String,
    pub code: u16,
    pub reason: String,
}

impl StatusLine {
    /// Parse a raw response line. A trailing `\r` (preserved by
    /// `LineSocket::read_line`) is trimmed first.
    pub fn parse(line: &str) -> Result<Self, ProbeError> {
        let line = line.trim_end_matches('\r');
        let mut parts = line.splitn(3, ' ');

        let version = parts.next().unwrap_or("");
        if !version.starts_with("HTTP/") {
            return Err(ProbeError::InvalidStatusLine(line.to_string()));
        }
        let code = parts
            .next()
            .and_then(|c| c.parse::<u16>().ok())
            .ok_or_else(|| ProbeError::InvalidStatusLine(line.to_string()))?;
        let reason = parts.next().unwrap_or("").to_string();

        Ok(StatusLine {
            version: version.to_string(),
            code,
            reason,
        })
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.version, self.code, self.reason)
    }
}

#[derive(Debug)]
pub enum ProbeError {
    Socket(SocketError),
    UnexpectedEof,
    InvalidStatusLine(String),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Socket(e) => write!(f, "Socket error: {}", e),
            ProbeError::UnexpectedEof => {
                write!(f, "Connection closed before a status line arrived")
            }
            ProbeError::InvalidStatusLine(line) => {
                write!(f, "Invalid status line! Got {:?}", line)
            }
        }
    }
}

impl Error for ProbeError {}

impl From<SocketError> for ProbeError {
    fn from(e: SocketError) -> Self {
        ProbeError::Socket(e)
    }
}

/// Outcome of a successful probe.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub host: String,
    pub service: String,
    pub request_path: String,
    pub status: StatusLine,
    pub elapsed: Duration,
    pub finished_at: DateTime<Utc>,
}

pub struct ProbeEngine {
    probe: ProbeConfig,
    socket: SocketConfig,
}

impl ProbeEngine {
    pub fn new(probe: ProbeConfig, socket: SocketConfig) -> Self {
        ProbeEngine { probe, socket }
    }

    /// The request head sent on every probe. HTTP/1.0, no headers.
    pub fn request_head(&self) -> String {
        format!("GET {} HTTP/1.0\r\n\r\n", self.probe.request_path)
    }

    fn version_accepted(&self, line: &str) -> bool {
        self.probe
            .accepted_versions
            .iter()
            .any(|v| line.starts_with(v.as_str()))
    }

    /// Connect, send the request, read one response line, check its
    /// version token and close the connection.
    pub async fn run(&self) -> Result<ProbeReport, ProbeError> {
        let started = Instant::now();
        log::info!(
            "[PROBE] Connecting to {}:{}",
            self.probe.host,
            self.probe.service
        );
        let mut sock =
            LineSocket::connect(&self.probe.host, &self.probe.service, &self.socket).await?;

        sock.write(&self.request_head()).await?;
        sock.flush().await?;

        let line = sock.read_line().await?;
        if line.is_empty() {
            return Err(ProbeError::UnexpectedEof);
        }
        if !self.version_accepted(&line) {
            return Err(ProbeError::InvalidStatusLine(line));
        }
        let status = StatusLine::parse(&line)?;
        sock.close()?;

        log::info!("[PROBE] Got \"{}\" in {:?}", status, started.elapsed());
        Ok(ProbeReport {
            host: self.probe.host.clone(),
            service: self.probe.service.clone(),
            request_path: self.probe.request_path.clone(),
            status,
            elapsed: started.elapsed(),
            finished_at: Utc::now(),
        })
    }
}
