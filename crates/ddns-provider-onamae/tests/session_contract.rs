//! Contract tests for the registrar update session
//!
//! Every test drives [`run_session`] (or the provider built on it) against a
//! scripted registrar and asserts on the wire sequence it produced.
//!
//! The contract:
//! - Greeting is verified before anything is sent
//! - LOGIN, then one MODIP per target in order, then LOGOUT
//! - The first failing step aborts every later step
//! - An opened transport is closed exactly once; an unopened one never is

mod common;

use common::{example_targets, ScriptedConnector, WireEvent};
use ddns_core::traits::{DnsProvider, UpdateTarget};
use ddns_core::Credentials;
use ddns_provider_onamae::{run_session, OnamaeProvider, ProtocolError, SessionError, TransportError};
use std::net::Ipv4Addr;

const IP: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 7);

fn auth() -> String {
    Credentials::encode("user", "pass")
}

fn login() -> WireEvent {
    WireEvent::Send("LOGIN\nUSERID:user\nPASSWORD:pass\n.\n".to_string())
}

#[tokio::test]
async fn test_full_session_wire_sequence() {
    let connector = ScriptedConnector::accepting();

    let updated = run_session(&connector, &auth(), &example_targets(), IP)
        .await
        .unwrap();

    assert_eq!(updated, 2);
    assert_eq!(
        connector.log(),
        vec![
            WireEvent::Open,
            WireEvent::Receive,
            login(),
            WireEvent::Receive,
            WireEvent::Send(
                "MODIP\nHOSTNAME:www\nDOMNAME:example.com\nIPV4:203.0.113.7\n.\n".to_string()
            ),
            WireEvent::Receive,
            WireEvent::Send("MODIP\nDOMNAME:example.com\nIPV4:203.0.113.7\n.\n".to_string()),
            WireEvent::Receive,
            WireEvent::Send("LOGOUT\n.\n".to_string()),
            WireEvent::Receive,
            WireEvent::Close,
        ]
    );
}

#[tokio::test]
async fn test_open_failure_never_closes() {
    let connector = ScriptedConnector::accepting().failing_open();

    let err = run_session(&connector, &auth(), &example_targets(), IP)
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Connect(TransportError::Connect(_))));
    assert!(connector.log().is_empty());
}

#[tokio::test]
async fn test_bad_greeting_sends_nothing() {
    let connector = ScriptedConnector::accepting().with_replies(["999 GO AWAY\n.\n"]);

    let err = run_session(&connector, &auth(), &example_targets(), IP)
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Greeting(ProtocolError::BadResponse(_))));
    assert!(connector.sent().is_empty());
    assert_eq!(connector.count(&WireEvent::Close), 1);
}

#[tokio::test]
async fn test_login_send_failure_aborts_and_closes_once() {
    let connector = ScriptedConnector::accepting().failing_send("LOGIN");

    let err = run_session(&connector, &auth(), &example_targets(), IP)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SessionError::Auth(ProtocolError::Transport(TransportError::Write(_)))
    ));
    assert!(connector.sent().is_empty(), "no MODIP or LOGOUT after failed LOGIN");
    assert_eq!(connector.count(&WireEvent::Close), 1);
}

#[tokio::test]
async fn test_rejected_login_aborts() {
    let connector = ScriptedConnector::accepting()
        .with_replies(["000 COMMAND SUCCESSFUL\n.\n", "002 LOGIN ERROR\n.\n"]);

    let err = run_session(&connector, &auth(), &example_targets(), IP)
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Auth(ProtocolError::BadResponse(_))));
    assert_eq!(connector.sent(), vec!["LOGIN\nUSERID:user\nPASSWORD:pass\n.\n"]);
    assert_eq!(connector.count(&WireEvent::Close), 1);
}

#[tokio::test]
async fn test_bad_credentials_detected_after_open() {
    let connector = ScriptedConnector::accepting();

    // "nocolon" has no ':' separator
    let err = run_session(&connector, "bm9jb2xvbg==", &example_targets(), IP)
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Credentials(_)));
    assert!(connector.sent().is_empty());
    assert_eq!(connector.count(&WireEvent::Open), 1);
    assert_eq!(connector.count(&WireEvent::Close), 1);

    let core: ddns_core::Error = err.into();
    assert!(core.is_config());
}

#[tokio::test]
async fn test_mod_ip_failure_skips_remaining_targets() {
    // greeting, LOGIN, first MODIP rejected
    let connector = ScriptedConnector::accepting().with_replies([
        "000 COMMAND SUCCESSFUL\n.\n",
        "000 COMMAND SUCCESSFUL\n.\n",
        "003 MODIP ERROR\n.\n",
    ]);

    let err = run_session(&connector, &auth(), &example_targets(), IP)
        .await
        .unwrap_err();

    match err {
        SessionError::Update { target, .. } => {
            assert_eq!(target, UpdateTarget::new("www", "example.com"))
        }
        other => panic!("expected Update error, got {:?}", other),
    }

    let sent = connector.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[1].starts_with("MODIP\nHOSTNAME:www\n"));
    assert!(!sent.iter().any(|s| s.starts_with("LOGOUT")));
    assert_eq!(connector.count(&WireEvent::Close), 1);
}

#[tokio::test]
async fn test_partial_reply_is_failure() {
    let connector = ScriptedConnector::accepting()
        .with_replies(["000 COMMAND SUCCESSFUL\n.\n", "000 COMMAND SUCCESSFUL\n"]);

    let err = run_session(&connector, &auth(), &example_targets(), IP)
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Auth(ProtocolError::BadResponse(_))));
}

#[tokio::test]
async fn test_logout_failure_fails_session() {
    // greeting, LOGIN, two MODIPs accepted, LOGOUT rejected
    let ok = "000 COMMAND SUCCESSFUL\n.\n";
    let connector = ScriptedConnector::accepting().with_replies([ok, ok, ok, ok, "009 BYE\n.\n"]);

    let err = run_session(&connector, &auth(), &example_targets(), IP)
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Logout(_)));
    assert_eq!(connector.count(&WireEvent::Close), 1);
}

#[tokio::test]
async fn test_close_failure_does_not_fail_session() {
    let connector = ScriptedConnector::accepting().failing_close();

    let updated = run_session(&connector, &auth(), &example_targets(), IP)
        .await
        .unwrap();

    assert_eq!(updated, 2);
    assert_eq!(connector.count(&WireEvent::Close), 1);
}

#[tokio::test]
async fn test_close_failure_does_not_mask_session_error() {
    let connector = ScriptedConnector::accepting()
        .failing_send("LOGIN")
        .failing_close();

    let err = run_session(&connector, &auth(), &example_targets(), IP)
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Auth(_)));
}

#[tokio::test]
async fn test_provider_runs_one_session_per_call() {
    let connector = ScriptedConnector::accepting();
    let provider = OnamaeProvider::with_connector(auth(), Box::new(connector.clone()));

    let result = provider
        .update_records(&example_targets(), IP)
        .await
        .unwrap();
    assert_eq!(result.new_ip, IP);
    assert_eq!(result.records_updated, 2);

    provider
        .update_records(&example_targets(), Ipv4Addr::new(203, 0, 113, 8))
        .await
        .unwrap();

    assert_eq!(connector.count(&WireEvent::Open), 2);
    assert_eq!(connector.count(&WireEvent::Close), 2);
}

#[tokio::test]
async fn test_provider_without_targets_stays_offline() {
    let connector = ScriptedConnector::accepting();
    let provider = OnamaeProvider::with_connector(auth(), Box::new(connector.clone()));

    let result = provider.update_records(&[], IP).await.unwrap();

    assert_eq!(result.records_updated, 0);
    assert!(connector.log().is_empty());
}

#[tokio::test]
async fn test_provider_error_names_provider() {
    let connector = ScriptedConnector::accepting().failing_open();
    let provider = OnamaeProvider::with_connector(auth(), Box::new(connector));

    let err = provider
        .update_records(&example_targets(), IP)
        .await
        .unwrap_err();

    assert!(matches!(err, ddns_core::Error::Provider { ref provider, .. } if provider == "onamae"));
}
