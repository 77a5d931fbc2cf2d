//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Asking the IpSource for the current public address on every tick
//! - Remembering the last address it observed
//! - Driving one registrar session via DnsProvider when the address changed
//!
//! ## Architecture
//!
//! ```text
//!   interval tick
//!        │
//!        ▼
//! ┌──────────────┐   current()   ┌─────────────┐
//! │ DdnsEngine   │──────────────▶│  IpSource   │
//! │ (ObservedIp) │               └─────────────┘
//! └──────────────┘
//!        │ changed?
//!        ▼
//! ┌──────────────┐
//! │ DnsProvider  │── one session: login, MODIP × n, logout
//! └──────────────┘
//! ```
//!
//! ## Tick Flow
//!
//! 1. Fetch the current IP. On failure the tick fails and nothing else happens.
//! 2. Compare with the observed IP. Equal means nothing to do.
//! 3. Otherwise run one update session for every target.
//! 4. Record the new IP as observed, whether or not the session succeeded.
//!
//! Step 4 means a failed session is not retried until the address changes
//! again. The engine has no other retry mechanism.

use crate::config::DdnsConfig;
use crate::error::Result;
use crate::traits::{DnsProvider, IpSource, UpdateResult, UpdateTarget};
use std::future::Future;
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info, warn};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        records_count: usize,
        ip_source: &'static str,
        provider: &'static str,
    },

    /// Public IP lookup failed; observed IP left untouched
    IpFetchFailed {
        error: String,
    },

    /// Public IP matches the observed IP
    IpUnchanged {
        ip: Ipv4Addr,
    },

    /// Public IP differs from the observed IP
    IpChangeDetected {
        previous_ip: Option<Ipv4Addr>,
        new_ip: Ipv4Addr,
    },

    /// Registrar session succeeded
    UpdateSucceeded {
        new_ip: Ipv4Addr,
        previous_ip: Option<Ipv4Addr>,
        records_updated: usize,
    },

    /// Registrar session failed
    UpdateFailed {
        new_ip: Ipv4Addr,
        error: String,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// The last public IP the engine observed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ObservedIp {
    /// Nothing observed yet; never equal to any concrete address
    #[default]
    Unknown,
    /// Address seen on the last successful lookup
    Known(Ipv4Addr),
}

impl ObservedIp {
    /// The observed address, if any
    pub fn ip(&self) -> Option<Ipv4Addr> {
        match self {
            ObservedIp::Unknown => None,
            ObservedIp::Known(ip) => Some(*ip),
        }
    }

    /// Whether `ip` is the observed address
    pub fn is(&self, ip: Ipv4Addr) -> bool {
        self.ip() == Some(ip)
    }
}

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The address did not change; no session was opened
    Unchanged(Ipv4Addr),
    /// The address changed and the registrar accepted it
    Updated(UpdateResult),
}

/// Core DDNS engine
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Start with [`DdnsEngine::run()`] (or drive [`DdnsEngine::tick()`] yourself)
/// 3. Engine runs until a shutdown signal is received
///
/// ## Threading
///
/// Everything happens on the task that drives the engine. Ticks are awaited
/// one after the other, so a cycle never overlaps the previous one, and the
/// observed IP needs no lock.
pub struct DdnsEngine {
    /// IP source for public address lookups
    ip_source: Box<dyn IpSource>,

    /// DNS provider for registrar sessions
    provider: Box<dyn DnsProvider>,

    /// Targets to update, in configuration order
    targets: Vec<UpdateTarget>,

    /// Time between ticks
    check_interval: Duration,

    /// Last observed public IP
    observed: ObservedIp,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `config`: DDNS configuration (validated here)
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            ip_source,
            provider,
            targets: config.targets(),
            check_interval: Duration::from_secs(config.engine.check_interval_secs),
            observed: ObservedIp::Unknown,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// The last observed public IP
    pub fn observed_ip(&self) -> ObservedIp {
        self.observed
    }

    /// The targets every session updates
    pub fn targets(&self) -> &[UpdateTarget] {
        &self.targets
    }

    /// Run one change-detection cycle
    ///
    /// # Returns
    ///
    /// - `Ok(TickOutcome)`: Nothing to do, or the update succeeded
    /// - `Err(Error)`: The IP lookup failed (observed IP unchanged), or the
    ///   registrar session failed (observed IP already advanced)
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        let current_ip = match self.ip_source.current().await {
            Ok(ip) => ip,
            Err(e) => {
                self.emit_event(EngineEvent::IpFetchFailed {
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        if self.observed.is(current_ip) {
            debug!("IP unchanged: {}", current_ip);
            self.emit_event(EngineEvent::IpUnchanged { ip: current_ip });
            return Ok(TickOutcome::Unchanged(current_ip));
        }

        let previous_ip = self.observed.ip();
        info!(
            "IP changed: {} -> {} (via {})",
            previous_ip.map(|ip| ip.to_string()).unwrap_or_else(|| "unknown".to_string()),
            current_ip,
            self.ip_source.source_name()
        );
        self.emit_event(EngineEvent::IpChangeDetected {
            previous_ip,
            new_ip: current_ip,
        });

        let result = self.provider.update_records(&self.targets, current_ip).await;

        // Recorded even on failure: a failed session is not retried until the IP moves again.
        self.observed = ObservedIp::Known(current_ip);

        match result {
            Ok(result) => {
                info!(
                    "Updated {} record(s) via {} -> {}",
                    result.records_updated,
                    self.provider.provider_name(),
                    current_ip
                );
                self.emit_event(EngineEvent::UpdateSucceeded {
                    new_ip: current_ip,
                    previous_ip,
                    records_updated: result.records_updated,
                });
                Ok(TickOutcome::Updated(result))
            }
            Err(e) => {
                self.emit_event(EngineEvent::UpdateFailed {
                    new_ip: current_ip,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Run the engine
    ///
    /// Ticks immediately, then every `check_interval_secs`, until Ctrl-C.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
            }
        })
        .await
    }

    /// Run the engine until `shutdown_rx` fires (or its sender is dropped)
    ///
    /// The daemon uses this to route SIGTERM/SIGINT into the engine.
    pub async fn run_with_shutdown(&mut self, shutdown_rx: oneshot::Receiver<()>) -> Result<()> {
        self.run_until(async {
            let _ = shutdown_rx.await;
        })
        .await
    }

    /// Main loop
    ///
    /// A tick in progress always completes; shutdown is observed between ticks.
    async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.emit_event(EngineEvent::Started {
            records_count: self.targets.len(),
            ip_source: self.ip_source.source_name(),
            provider: self.provider.provider_name(),
        });
        info!(
            "Engine started: {} target(s) via {} -> {}, checking every {:?}",
            self.targets.len(),
            self.ip_source.source_name(),
            self.provider.provider_name(),
            self.check_interval
        );

        let mut interval = tokio::time::interval(self.check_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(interval);

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    self.emit_event(EngineEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    break;
                }

                Some(_) = ticks.next() => {
                    if let Err(e) = self.tick().await {
                        // A failed cycle never stops the loop
                        error!("Update cycle failed: {}", e);
                    }
                }
            }
        }

        info!("Engine stopped");
        Ok(())
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
