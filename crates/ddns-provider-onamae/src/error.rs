//! Error types for the onamae provider
//!
//! Three layers, matching the three layers of the provider:
//! - [`TransportError`]: the TLS byte stream
//! - [`ProtocolError`]: one command/response exchange
//! - [`SessionError`]: one full update session, naming the step that failed

use ddns_core::traits::UpdateTarget;
use thiserror::Error;

/// Error type for the session transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// TCP connect or TLS handshake failed
    #[error("Connection error: {0}")]
    Connect(#[source] std::io::Error),

    /// The registrar host is not a valid TLS server name
    #[error("Invalid server name: {0}")]
    InvalidServerName(String),

    /// The TLS client configuration could not be built
    #[error("TLS configuration error: {0}")]
    Tls(#[source] tokio_rustls::rustls::Error),

    /// Write failed
    #[error("Write error: {0}")]
    Write(#[source] std::io::Error),

    /// Fewer bytes were accepted than supplied
    #[error("Short write: {written} of {expected} bytes accepted")]
    ShortWrite {
        /// Bytes accepted
        written: usize,
        /// Bytes supplied
        expected: usize,
    },

    /// Read failed
    #[error("Read error: {0}")]
    Read(#[source] std::io::Error),

    /// Close failed
    #[error("Close error: {0}")]
    Close(#[source] std::io::Error),

    /// A single transport call exceeded its deadline
    #[error("{operation} timed out")]
    Timeout {
        /// Which call timed out
        operation: &'static str,
    },
}

/// Error type for one command/response exchange
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The exchange never completed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The reply was not the success literal
    #[error("bad response: {0:?}")]
    BadResponse(String),
}

/// Error type for one update session
///
/// Each variant names the step that aborted the session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The transport could not be opened
    #[error("failed to connect to registrar: {0}")]
    Connect(#[source] TransportError),

    /// The registrar did not greet with the success literal
    #[error("registrar greeting rejected: {0}")]
    Greeting(#[source] ProtocolError),

    /// The stored credentials could not be decoded
    #[error("invalid credentials: {0}")]
    Credentials(#[source] ddns_core::Error),

    /// LOGIN was rejected or failed
    #[error("login failed: {0}")]
    Auth(#[source] ProtocolError),

    /// MODIP was rejected or failed for one target
    #[error("MODIP failed for {target}: {source}")]
    Update {
        /// The target being updated
        target: UpdateTarget,
        /// Underlying failure
        #[source]
        source: ProtocolError,
    },

    /// LOGOUT was rejected or failed
    #[error("logout failed: {0}")]
    Logout(#[source] ProtocolError),
}

impl From<SessionError> for ddns_core::Error {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Credentials(inner) => inner,
            other => ddns_core::Error::provider("onamae", other.to_string()),
        }
    }
}
