//! Scripted registrar for session contract tests
//!
//! [`ScriptedConnector`] hands out in-memory transports that answer from a
//! reply queue and log every call into a shared [`WireEvent`] list, so tests
//! can assert on the exact wire sequence of a session.

#![allow(dead_code)]

use async_trait::async_trait;
use ddns_core::traits::UpdateTarget;
use ddns_provider_onamae::protocol::RESPONSE_OK;
use ddns_provider_onamae::{Connector, Transport, TransportError};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

/// One observable transport call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEvent {
    Open,
    Send(String),
    Receive,
    Close,
}

#[derive(Default)]
struct Script {
    log: Vec<WireEvent>,
    replies: VecDeque<Vec<u8>>,
    fail_open: bool,
    fail_send_prefix: Option<String>,
    fail_close: bool,
}

/// Connector over a scripted in-memory registrar
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    script: Arc<Mutex<Script>>,
}

impl ScriptedConnector {
    /// A registrar that accepts everything
    ///
    /// Every read that finds the reply queue empty gets [`RESPONSE_OK`].
    pub fn accepting() -> Self {
        Self::default()
    }

    /// Queue explicit replies, in order, ahead of the default
    pub fn with_replies(self, replies: impl IntoIterator<Item = &'static str>) -> Self {
        self.script
            .lock()
            .unwrap()
            .replies
            .extend(replies.into_iter().map(|r| r.as_bytes().to_vec()));
        self
    }

    /// Make `open` fail
    pub fn failing_open(self) -> Self {
        self.script.lock().unwrap().fail_open = true;
        self
    }

    /// Make any send whose payload starts with `prefix` fail
    pub fn failing_send(self, prefix: &str) -> Self {
        self.script.lock().unwrap().fail_send_prefix = Some(prefix.to_string());
        self
    }

    /// Make `close` fail
    pub fn failing_close(self) -> Self {
        self.script.lock().unwrap().fail_close = true;
        self
    }

    /// Everything that happened on the wire so far
    pub fn log(&self) -> Vec<WireEvent> {
        self.script.lock().unwrap().log.clone()
    }

    /// Only the payloads that were sent
    pub fn sent(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter_map(|e| match e {
                WireEvent::Send(payload) => Some(payload),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &WireEvent) -> usize {
        self.log().iter().filter(|e| *e == event).count()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn open(&self) -> Result<Box<dyn Transport>, TransportError> {
        let mut script = self.script.lock().unwrap();
        if script.fail_open {
            return Err(TransportError::Connect(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "scripted connect failure",
            )));
        }
        script.log.push(WireEvent::Open);

        Ok(Box::new(ScriptedTransport {
            script: Arc::clone(&self.script),
        }))
    }

    fn endpoint(&self) -> String {
        "registrar.test:65010".to_string()
    }
}

struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let payload = String::from_utf8(payload.to_vec()).unwrap();
        let mut script = self.script.lock().unwrap();

        if let Some(prefix) = &script.fail_send_prefix {
            if payload.starts_with(prefix.as_str()) {
                return Err(TransportError::Write(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "scripted write failure",
                )));
            }
        }

        script.log.push(WireEvent::Send(payload));
        Ok(())
    }

    async fn receive(&mut self, max_bytes: usize) -> Result<Vec<u8>, TransportError> {
        let mut script = self.script.lock().unwrap();
        script.log.push(WireEvent::Receive);

        let mut reply = script
            .replies
            .pop_front()
            .unwrap_or_else(|| RESPONSE_OK.as_bytes().to_vec());
        reply.truncate(max_bytes);
        Ok(reply)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let mut script = self.script.lock().unwrap();
        script.log.push(WireEvent::Close);

        if script.fail_close {
            return Err(TransportError::Close(io::Error::new(
                io::ErrorKind::Other,
                "scripted close failure",
            )));
        }
        Ok(())
    }
}

/// `example.com` with `www` and the apex, in that order
pub fn example_targets() -> Vec<UpdateTarget> {
    vec![
        UpdateTarget::new("www", "example.com"),
        UpdateTarget::new("", "example.com"),
    ]
}
