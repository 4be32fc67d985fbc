use std::time::{Duration, Instant};

use axum::http::StatusCode;
use performer_core::{InterfaceDescriptor, TaskRequest, Value};
use performer_services::{ExecutionError, TaskError, ValidationError};

use crate::*;

const RPC_OK: &str = r#"{"jsonrpc":"2.0","id":1,"result":{"cert":"0xfeed"}}"#;
const RPC_ERR: &str = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"unknown tx"}}"#;

fn tx_hash() -> [u8; 32] {
    let mut h = [0u8; 32];
    for (i, b) in h.iter_mut().enumerate() {
        *b = i as u8;
    }
    h
}

fn payment_cert_payload(hash: [u8; 32]) -> Vec<u8> {
    InterfaceDescriptor::from_signature("core_issuePaymentCert(bytes32)")
        .unwrap()
        .encode_call(&[Value::bytes32(hash)])
        .unwrap()
}

/// The first argument goes out as 0x-hex in a JSON-RPC envelope and the
/// body comes back untouched.
#[test]
fn test_remote_forward_relays_body() {
    let mock = MockRpc::start(StatusCode::OK, RPC_OK).unwrap();
    let dispatcher = remote_dispatcher(&mock.url, 5).unwrap();
    assert_eq!(dispatcher.strategy_name(), "remote_forward");

    let request = TaskRequest::new(b"cert-1".to_vec(), payment_cert_payload(tx_hash()));
    let response = dispatcher.execute(&request).unwrap();

    assert_eq!(response.task_id, b"cert-1");
    assert_eq!(response.result, RPC_OK.as_bytes());

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(
        requests[0].body,
        serde_json::json!({
            "jsonrpc": "2.0",
            "method": "core_issuePaymentCert",
            "params": [format!("0x{}", hex::encode(tx_hash()))],
            "id": 1,
        })
    );
}

/// Error statuses and JSON-RPC error objects are relayed, not interpreted.
#[test]
fn test_remote_error_body_is_relayed_as_is() {
    let mock = MockRpc::start(StatusCode::INTERNAL_SERVER_ERROR, RPC_ERR).unwrap();
    let dispatcher = remote_dispatcher(&mock.url, 5).unwrap();

    let request = TaskRequest::new(b"cert-2".to_vec(), payment_cert_payload([0x11; 32]));
    let response = dispatcher.execute(&request).unwrap();
    assert_eq!(response.result, RPC_ERR.as_bytes());
}

#[test]
fn test_invalid_payload_never_reaches_remote() {
    let mock = MockRpc::start(StatusCode::OK, RPC_OK).unwrap();
    let dispatcher = remote_dispatcher(&mock.url, 5).unwrap();

    let mut payload = payment_cert_payload([0x22; 32]);
    payload.truncate(20);
    let err = dispatcher
        .execute(&TaskRequest::new(b"cert-3".to_vec(), payload))
        .unwrap_err();

    assert!(matches!(
        err,
        TaskError::Validation(ValidationError::LengthMismatch { observed: 16, expected: 32 })
    ));
    assert!(mock.requests().is_empty());
}

#[test]
fn test_unreachable_endpoint_is_reported() {
    // Nothing listens on port 1.
    let dispatcher = remote_dispatcher("http://127.0.0.1:1/", 2).unwrap();
    let request = TaskRequest::new(b"cert-4".to_vec(), payment_cert_payload([0x33; 32]));

    match dispatcher.execute(&request) {
        Err(TaskError::Execution(ExecutionError::RemoteUnavailable { url, .. })) => {
            assert_eq!(url, "http://127.0.0.1:1/");
        }
        other => panic!("expected RemoteUnavailable, got {other:?}"),
    }
}

/// Headers arrive but the body is cut short: the call reached the server,
/// so this is a response failure rather than an unavailable endpoint.
#[test]
fn test_truncated_body_is_reported() {
    let server = TruncatedRpc::start().unwrap();
    let dispatcher = remote_dispatcher(&server.url, 5).unwrap();
    let request = TaskRequest::new(b"cert-6".to_vec(), payment_cert_payload([0x55; 32]));

    match dispatcher.execute(&request) {
        Err(TaskError::Execution(ExecutionError::RemoteResponse { url, .. })) => {
            assert_eq!(url, server.url);
        }
        other => panic!("expected RemoteResponse, got {other:?}"),
    }
}

#[test]
fn test_slow_endpoint_times_out() {
    let mock = MockRpc::start_with_delay(StatusCode::OK, RPC_OK, Duration::from_secs(4)).unwrap();
    let dispatcher = remote_dispatcher(&mock.url, 1).unwrap();
    let request = TaskRequest::new(b"cert-5".to_vec(), payment_cert_payload([0x44; 32]));

    let started = Instant::now();
    let err = dispatcher.execute(&request).unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(matches!(
        err,
        TaskError::Execution(ExecutionError::RemoteUnavailable { .. })
    ));
}
