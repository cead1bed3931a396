pub mod config;
pub mod mock;
pub mod probe;
pub mod transport;

pub use probe::{ProbeEngine, ProbeError, ProbeReport};
pub use transport::{LineListener, LineSocket, SocketError};
