//! One complete registrar update session
//!
//! open → greeting → decode credentials → LOGIN → MODIP per target → LOGOUT → close
//!
//! The first failing step aborts the rest and becomes the session's error.
//! Targets acknowledged before the failure stay updated. Once the transport
//! is open it is closed exactly once, whatever happened in between.

use std::net::Ipv4Addr;
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::protocol::ProtocolClient;
use crate::transport::Connector;
use ddns_core::Credentials;
use ddns_core::traits::UpdateTarget;

/// Run one session that points every target at `ip`
///
/// # Parameters
///
/// - `connector`: Opens the transport
/// - `auth`: Base64 `username:password`, decoded after the greeting
/// - `targets`: Targets in update order
/// - `ip`: The new address
///
/// # Returns
///
/// - `Ok(usize)`: Number of targets acknowledged (all of them)
/// - `Err(SessionError)`: The step that failed
pub async fn run_session(
    connector: &dyn Connector,
    auth: &str,
    targets: &[UpdateTarget],
    ip: Ipv4Addr,
) -> Result<usize, SessionError> {
    let transport = connector.open().await.map_err(SessionError::Connect)?;
    let mut client = ProtocolClient::new(transport);

    let result = exchange(&mut client, auth, targets, ip).await;

    if let Err(e) = client.close().await {
        // Never masks the session result
        warn!("Failed to close registrar session: {}", e);
    }

    result
}

async fn exchange(
    client: &mut ProtocolClient,
    auth: &str,
    targets: &[UpdateTarget],
    ip: Ipv4Addr,
) -> Result<usize, SessionError> {
    client.greeting().await.map_err(SessionError::Greeting)?;

    let credentials = Credentials::decode(auth).map_err(SessionError::Credentials)?;
    client.login(&credentials.username, &credentials.password).await?;

    for target in targets {
        client.mod_ip(&target.host, &target.domain, ip).await?;
    }

    client.logout().await?;
    debug!("Session complete: {} target(s) updated", targets.len());

    Ok(targets.len())
}
