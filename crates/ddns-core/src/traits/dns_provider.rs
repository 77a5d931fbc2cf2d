// # DNS Provider Trait
//
// Defines the interface for pushing a new address to a registrar.
//
// ## Implementations
//
// - onamae.com ddnsclient protocol: `ddns-provider-onamae` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
// use ddns_core::traits::UpdateTarget;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     provider.update_records(
//         &[UpdateTarget::new("www", "example.com")],
//         std::net::Ipv4Addr::new(192, 168, 1, 1),
//     ).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::fmt;
use std::net::Ipv4Addr;

/// One `(host, domain)` pair to point at the new address
///
/// An empty `host` targets the domain apex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UpdateTarget {
    /// Host label, empty for the apex
    pub host: String,
    /// Domain name
    pub domain: String,
}

impl UpdateTarget {
    /// Create a new update target
    pub fn new(host: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            domain: domain.into(),
        }
    }

    /// Whether this target is the bare domain
    pub fn is_apex(&self) -> bool {
        self.host.is_empty()
    }
}

impl fmt::Display for UpdateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_apex() {
            write!(f, "{}", self.domain)
        } else {
            write!(f, "{}.{}", self.host, self.domain)
        }
    }
}

/// Result of a DNS update session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    /// The address that was pushed
    pub new_ip: Ipv4Addr,
    /// Number of targets the registrar acknowledged
    pub records_updated: usize,
}

/// Trait for DNS provider implementations
///
/// One call is one complete, all-or-nothing registrar session covering every
/// target. Implementations must stop at the first failing step and report it;
/// targets acknowledged before the failure stay updated (no rollback).
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Open one connection to the registrar per call
/// - ✅ Parse registrar responses
/// - ✅ Return success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Spawn tasks or threads
/// - ❌ Implement retry logic or backoff (the next engine tick is the retry)
/// - ❌ Decide whether an update is needed (owned by `DdnsEngine`)
/// - ❌ Keep a connection open between calls
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Point every target at `new_ip`
    ///
    /// # Parameters
    ///
    /// - `targets`: Targets in the order they must be updated
    /// - `new_ip`: The new IP address to set
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateResult)`: Every target was acknowledged
    /// - `Err(Error)`: The first failing step of the session
    async fn update_records(
        &self,
        targets: &[UpdateTarget],
        new_ip: Ipv4Addr,
    ) -> Result<UpdateResult, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    ///
    /// The whole configuration is passed because the credentials live at the
    /// top level, next to the domains they authorize.
    fn create(
        &self,
        config: &crate::config::DdnsConfig,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
