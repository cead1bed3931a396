use std::error::Error;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum SocketError {
    Resolve(String, io::Error),
    UnknownService(String),
    Connect(io::Error),
    Bind(io::Error),
    Io(io::Error),
    Timeout(&'static str),
    NotConnected,
    InvalidText,
}

impl fmt::Display for SocketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketError::Resolve(host, e) => write!(f, "Failed to resolve host {}: {}", host, e),
            SocketError::UnknownService(service) => write!(f, "Unknown service: {}", service),
            SocketError::Connect(e) => write!(f, "Connection failed: {}", e),
            SocketError::Bind(e) => write!(f, "Failed to bind socket: {}", e),
            SocketError::Io(e) => write!(f, "Socket I/O error: {}", e),
            SocketError::Timeout(op) => write!(f, "Timed out during {}", op),
            SocketError::NotConnected => write!(f, "Socket is not connected"),
            SocketError::InvalidText => write!(f, "Received bytes are not valid UTF-8"),
        }
    }
}

impl Error for SocketError {}

impl From<io::Error> for SocketError {
    fn from(e: io::Error) -> Self {
        SocketError::Io(e)
    }
}
