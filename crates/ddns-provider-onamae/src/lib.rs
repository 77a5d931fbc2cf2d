// # onamae.com DNS Provider
//
// This crate provides the onamae.com ddnsclient provider for the DDNS system.
//
// ## Layers
//
// - `transport`: TLS byte stream to `ddnsclient.onamae.com:65010`
// - `protocol`: LOGIN / MODIP / LOGOUT commands and exact-match reply checks
// - `session`: one all-or-nothing update session over every target
//
// ## Trust Level: Untrusted (DNS Provider)
//
// - ✅ Opens one connection per engine decision, closes it before returning
// - ✅ Full error propagation to engine
// - ✅ Per-call I/O deadline (30 seconds by default)
// - ❌ NO retry logic (the next engine tick is the retry)
// - ❌ NO connection reuse between sessions
// - ❌ NO background tasks
//
// ## Security Requirements
//
// - Credentials NEVER appear in logs or Debug output
// - Credentials can be supplied via the `DDNS_AUTH` environment variable
//   instead of the configuration file (handled by `ddnsd`)
//
// ## Wire Reference
//
// ```text
// C: (connect)            S: 000 COMMAND SUCCESSFUL\n.\n
// C: LOGIN\nUSERID:u\nPASSWORD:p\n.\n
//                         S: 000 COMMAND SUCCESSFUL\n.\n
// C: MODIP\nHOSTNAME:www\nDOMNAME:example.com\nIPV4:192.0.2.1\n.\n
//                         S: 000 COMMAND SUCCESSFUL\n.\n
// C: LOGOUT\n.\n          S: 000 COMMAND SUCCESSFUL\n.\n
// ```

pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

use async_trait::async_trait;
use ddns_core::config::{DdnsConfig, ProviderConfig};
use ddns_core::traits::{DnsProvider, DnsProviderFactory, UpdateResult, UpdateTarget};
use ddns_core::{Error, Result};
use std::net::Ipv4Addr;
use std::time::Duration;

pub use error::{ProtocolError, SessionError, TransportError};
pub use protocol::ProtocolClient;
pub use session::run_session;
pub use transport::{Connector, TlsConnector, TlsTransport, Transport};

/// onamae.com DNS provider
///
/// Holds the still-encoded credentials and a connector; every
/// [`DnsProvider::update_records`] call runs one full session.
pub struct OnamaeProvider {
    /// Base64 `username:password`
    /// ⚠️ NEVER log this value
    auth: String,

    /// Opens the transport for each session
    connector: Box<dyn Connector>,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for OnamaeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnamaeProvider")
            .field("auth", &"<REDACTED>")
            .field("endpoint", &self.connector.endpoint())
            .finish()
    }
}

impl OnamaeProvider {
    /// Create a provider speaking TLS to `host:port`
    ///
    /// # Parameters
    ///
    /// - `auth`: Base64 `username:password`
    /// - `host`: Registrar host (also the TLS server name)
    /// - `port`: Registrar port
    /// - `io_timeout`: Deadline for each transport call
    pub fn new(
        auth: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        io_timeout: Duration,
    ) -> Result<Self> {
        let connector = TlsConnector::new(host, port, io_timeout)
            .map_err(|e| Error::provider("onamae", e.to_string()))?;
        Ok(Self::with_connector(auth, Box::new(connector)))
    }

    /// Create a provider over a custom connector
    pub fn with_connector(auth: impl Into<String>, connector: Box<dyn Connector>) -> Self {
        Self {
            auth: auth.into(),
            connector,
        }
    }

    /// `host:port` this provider talks to
    pub fn endpoint(&self) -> String {
        self.connector.endpoint()
    }
}

#[async_trait]
impl DnsProvider for OnamaeProvider {
    /// Run one registrar session covering every target
    ///
    /// Nothing is sent when `targets` is empty.
    async fn update_records(&self, targets: &[UpdateTarget], new_ip: Ipv4Addr) -> Result<UpdateResult> {
        if targets.is_empty() {
            tracing::debug!("No targets, skipping registrar session");
            return Ok(UpdateResult {
                new_ip,
                records_updated: 0,
            });
        }

        tracing::info!(
            "Opening registrar session to {} for {} target(s)",
            self.connector.endpoint(),
            targets.len()
        );

        let records_updated = run_session(self.connector.as_ref(), &self.auth, targets, new_ip).await?;

        Ok(UpdateResult {
            new_ip,
            records_updated,
        })
    }

    fn provider_name(&self) -> &'static str {
        "onamae"
    }
}

/// Factory for creating onamae providers
pub struct OnamaeFactory;

impl DnsProviderFactory for OnamaeFactory {
    fn create(&self, config: &DdnsConfig) -> Result<Box<dyn DnsProvider>> {
        match &config.provider {
            ProviderConfig::Onamae {
                host,
                port,
                io_timeout_secs,
            } => {
                if config.auth.is_empty() {
                    return Err(Error::config("onamae credentials (auth) are required"));
                }

                Ok(Box::new(OnamaeProvider::new(
                    config.auth.clone(),
                    host.clone(),
                    *port,
                    Duration::from_secs(*io_timeout_secs),
                )?))
            }
        }
    }
}

/// Register the onamae provider with a registry
///
/// # Example
///
/// ```rust
/// use ddns_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// ddns_provider_onamae::register(&registry);
/// assert!(registry.has_provider("onamae"));
/// ```
pub fn register(registry: &ddns_core::ProviderRegistry) {
    registry.register_provider("onamae", Box::new(OnamaeFactory));
}
