//! Test doubles and common utilities for engine contract tests
//!
//! These doubles script the public IP answers and record every provider
//! session, so the tests can assert on exactly when the engine decides to
//! talk to the registrar.

#![allow(dead_code)]

use ddns_core::config::{Credentials, DdnsConfig, DomainConfig};
use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, IpSource, UpdateResult, UpdateTarget};
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shorthand for test addresses
pub fn ip(a: u8, b: u8, c: u8, d: u8) -> Ipv4Addr {
    Ipv4Addr::new(a, b, c, d)
}

/// One scripted answer from the IP source
#[derive(Debug, Clone)]
pub enum Answer {
    Ip(Ipv4Addr),
    Fail(&'static str),
}

/// An IpSource that replays a script of answers
///
/// Once the script runs out the last answer is repeated.
#[derive(Clone)]
pub struct ScriptedIpSource {
    script: Arc<Mutex<VecDeque<Answer>>>,
    last: Arc<Mutex<Option<Answer>>>,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    pub fn new(script: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            last: Arc::new(Mutex::new(None)),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Script that only ever answers with addresses
    pub fn ips(ips: impl IntoIterator<Item = Ipv4Addr>) -> Self {
        Self::new(ips.into_iter().map(Answer::Ip))
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let next = self.script.lock().unwrap().pop_front();
        let answer = match next {
            Some(answer) => {
                *self.last.lock().unwrap() = Some(answer.clone());
                answer
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .expect("script must contain at least one answer"),
        };

        match answer {
            Answer::Ip(ip) => Ok(ip),
            Answer::Fail(msg) => Err(Error::ip_source(msg)),
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A DnsProvider that records every session
#[derive(Clone)]
pub struct RecordingProvider {
    sessions: Arc<Mutex<Vec<(Vec<UpdateTarget>, Ipv4Addr)>>>,
    failures_remaining: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(Vec::new())),
            failures_remaining: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    /// Fail the next `n` sessions
    pub fn failing(self, n: usize) -> Self {
        self.failures_remaining.store(n, Ordering::SeqCst);
        self
    }

    /// Make every session take `delay` (tokio time)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of sessions started
    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// Addresses pushed, in order
    pub fn pushed_ips(&self) -> Vec<Ipv4Addr> {
        self.sessions.lock().unwrap().iter().map(|(_, ip)| *ip).collect()
    }

    /// Targets of the n-th session
    pub fn targets_of(&self, n: usize) -> Vec<UpdateTarget> {
        self.sessions.lock().unwrap()[n].0.clone()
    }

    /// Highest number of sessions that ever ran at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DnsProvider for RecordingProvider {
    async fn update_records(
        &self,
        targets: &[UpdateTarget],
        new_ip: Ipv4Addr,
    ) -> Result<UpdateResult> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.sessions
            .lock()
            .unwrap()
            .push((targets.to_vec(), new_ip));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let fail = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(Error::provider("recording", "bad response"));
        }

        Ok(UpdateResult {
            new_ip,
            records_updated: targets.len(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config() -> DdnsConfig {
    let mut config = DdnsConfig::new(
        Credentials::encode("user", "pass"),
        vec![DomainConfig::new("example.com").with_host("www").with_apex()],
    );
    config.engine.check_interval_secs = 60;
    config
}
