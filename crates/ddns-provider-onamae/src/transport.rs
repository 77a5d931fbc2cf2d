//! Session transport
//!
//! An ordered, reliable, encrypted byte stream to the registrar with an
//! explicit open/close lifecycle. The protocol layer above never sees a
//! socket; it only sends opaque blocks and reads fixed-size replies.
//!
//! [`TlsConnector`] is the production implementation (TCP + rustls, Mozilla
//! roots). Tests substitute their own [`Connector`].

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

use crate::error::TransportError;

/// An open connection to the registrar
#[async_trait]
pub trait Transport: Send {
    /// Write `payload` in a single call
    ///
    /// Accepting fewer bytes than supplied is [`TransportError::ShortWrite`];
    /// the remainder is never resent.
    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    /// Read once into a `max_bytes` buffer and return what arrived
    ///
    /// No framing: the result may be shorter than `max_bytes`, and is empty
    /// on end of stream.
    async fn receive(&mut self, max_bytes: usize) -> Result<Vec<u8>, TransportError>;

    /// Release the connection
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Opens transports to one fixed endpoint
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establish a new connection
    async fn open(&self) -> Result<Box<dyn Transport>, TransportError>;

    /// `host:port` of the endpoint (for logging)
    fn endpoint(&self) -> String;
}

/// TLS connector for the registrar endpoint
///
/// Every call (connect + handshake, send, receive, close) is bounded by
/// `io_timeout`.
pub struct TlsConnector {
    host: String,
    port: u16,
    io_timeout: Duration,
    tls: tokio_rustls::TlsConnector,
}

impl TlsConnector {
    /// Create a connector for `host:port` trusting the Mozilla root set
    ///
    /// `host` doubles as the TLS server name.
    pub fn new(host: impl Into<String>, port: u16, io_timeout: Duration) -> Result<Self, TransportError> {
        let roots = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        Self::with_roots(host, port, io_timeout, roots)
    }

    /// Create a connector that trusts only `roots`
    pub fn with_roots(
        host: impl Into<String>,
        port: u16,
        io_timeout: Duration,
        roots: RootCertStore,
    ) -> Result<Self, TransportError> {
        let provider = Arc::new(tokio_rustls::rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(TransportError::Tls)?
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(Self {
            host: host.into(),
            port,
            io_timeout,
            tls: tokio_rustls::TlsConnector::from(Arc::new(config)),
        })
    }
}

impl std::fmt::Debug for TlsConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConnector")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("io_timeout", &self.io_timeout)
            .finish()
    }
}

#[async_trait]
impl Connector for TlsConnector {
    async fn open(&self) -> Result<Box<dyn Transport>, TransportError> {
        let server_name = ServerName::try_from(self.host.clone())
            .map_err(|_| TransportError::InvalidServerName(self.host.clone()))?;

        let stream = deadline(self.io_timeout, "connect", async {
            let tcp = TcpStream::connect((self.host.as_str(), self.port)).await?;
            self.tls.connect(server_name, tcp).await
        })
        .await?
        .map_err(TransportError::Connect)?;

        tracing::debug!("TLS session established with {}", self.endpoint());

        Ok(Box::new(TlsTransport {
            stream,
            io_timeout: self.io_timeout,
        }))
    }

    fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A TLS stream to the registrar
pub struct TlsTransport {
    stream: TlsStream<TcpStream>,
    io_timeout: Duration,
}

#[async_trait]
impl Transport for TlsTransport {
    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let stream = &mut self.stream;
        let written = deadline(self.io_timeout, "send", async {
            let written = stream.write(payload).await?;
            stream.flush().await?;
            Ok::<usize, std::io::Error>(written)
        })
        .await?
        .map_err(TransportError::Write)?;

        if written != payload.len() {
            return Err(TransportError::ShortWrite {
                written,
                expected: payload.len(),
            });
        }

        Ok(())
    }

    async fn receive(&mut self, max_bytes: usize) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; max_bytes];
        let read = deadline(self.io_timeout, "receive", self.stream.read(&mut buf))
            .await?
            .map_err(TransportError::Read)?;

        buf.truncate(read);
        Ok(buf)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        deadline(self.io_timeout, "close", self.stream.shutdown())
            .await?
            .map_err(TransportError::Close)
    }
}

/// Bound one transport call by `limit`
async fn deadline<T>(
    limit: Duration,
    operation: &'static str,
    fut: impl Future<Output = T>,
) -> Result<T, TransportError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| TransportError::Timeout { operation })
}
