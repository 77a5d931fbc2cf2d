//! onamae.com ddnsclient command protocol
//!
//! Plain text over the TLS transport. A request is a verb line followed by
//! `KEY:VALUE` lines and a terminating `.` line:
//!
//! ```text
//! MODIP
//! HOSTNAME:www
//! DOMNAME:example.com
//! IPV4:192.0.2.1
//! .
//! ```
//!
//! Every accepted command (and the greeting sent on connect) is answered with
//! exactly [`RESPONSE_OK`]. Replies are read with one fixed-size read and
//! compared byte for byte; anything else, including a partial reply, is a
//! failure. The real endpoint depends on this behavior, so it must not be
//! turned into a framed reader.

use std::net::Ipv4Addr;
use tracing::debug;

use crate::error::{ProtocolError, SessionError, TransportError};
use crate::transport::Transport;
use ddns_core::traits::UpdateTarget;

/// The only reply that means success
pub const RESPONSE_OK: &str = "000 COMMAND SUCCESSFUL\n.\n";

/// Size of the single read used to collect a reply
pub const RESPONSE_BUFFER_SIZE: usize = 32;

/// LOGOUT request
pub const LOGOUT_REQUEST: &str = "LOGOUT\n.\n";

/// Build a LOGIN request
pub fn login_request(username: &str, password: &str) -> String {
    format!("LOGIN\nUSERID:{}\nPASSWORD:{}\n.\n", username, password)
}

/// Build a MODIP request
///
/// The `HOSTNAME` line is omitted when `host` is empty, which targets the
/// domain apex.
pub fn mod_ip_request(host: &str, domain: &str, ip: Ipv4Addr) -> String {
    let mut request = String::from("MODIP\n");
    if !host.is_empty() {
        request.push_str(&format!("HOSTNAME:{}\n", host));
    }
    request.push_str(&format!("DOMNAME:{}\nIPV4:{}\n.\n", domain, ip));
    request
}

/// Client side of one registrar connection
///
/// The client owns the transport; [`ProtocolClient::close`] consumes it, so a
/// connection cannot be closed twice.
pub struct ProtocolClient {
    transport: Box<dyn Transport>,
}

impl ProtocolClient {
    /// Wrap a freshly opened transport
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Verify the greeting the registrar sends on connect
    pub async fn greeting(&mut self) -> Result<(), ProtocolError> {
        self.verify_response().await
    }

    /// Authenticate
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), SessionError> {
        debug!("LOGIN as {}", username);
        self.command(&login_request(username, password))
            .await
            .map_err(SessionError::Auth)
    }

    /// Point `host.domain` (or the apex when `host` is empty) at `ip`
    pub async fn mod_ip(&mut self, host: &str, domain: &str, ip: Ipv4Addr) -> Result<(), SessionError> {
        let target = UpdateTarget::new(host, domain);
        debug!("MODIP {} -> {}", target, ip);
        self.command(&mod_ip_request(host, domain, ip))
            .await
            .map_err(|source| SessionError::Update { target, source })
    }

    /// End the authenticated session
    pub async fn logout(&mut self) -> Result<(), SessionError> {
        debug!("LOGOUT");
        self.command(LOGOUT_REQUEST)
            .await
            .map_err(SessionError::Logout)
    }

    /// Read one reply and require it to be exactly [`RESPONSE_OK`]
    pub async fn verify_response(&mut self) -> Result<(), ProtocolError> {
        let reply = self.transport.receive(RESPONSE_BUFFER_SIZE).await?;
        if reply != RESPONSE_OK.as_bytes() {
            return Err(ProtocolError::BadResponse(
                String::from_utf8_lossy(&reply).into_owned(),
            ));
        }
        Ok(())
    }

    /// Release the connection
    pub async fn close(mut self) -> Result<(), TransportError> {
        self.transport.close().await
    }

    async fn command(&mut self, request: &str) -> Result<(), ProtocolError> {
        self.transport.send(request.as_bytes()).await?;
        self.verify_response().await
    }
}
