use std::sync::Arc;

use performer_core::{InterfaceDescriptor, TaskRequest, Value};
use performer_services::{TaskError, ValidationError, ValidationState};

use crate::*;

fn bytes32_payload(signature: &str, fill: u8) -> Vec<u8> {
    InterfaceDescriptor::from_signature(signature)
        .unwrap()
        .encode_call(&[Value::bytes32([fill; 32])])
        .unwrap()
}

/// A well-formed `dummy(bytes32)` call returns the hex SHA-256 of the whole
/// payload, selector included.
#[test]
fn test_local_compute_end_to_end() {
    let dispatcher = local_dispatcher("dummy(bytes32)").unwrap();
    let payload = bytes32_payload("dummy(bytes32)", 0x42);
    assert_eq!(payload.len(), 36);

    let request = TaskRequest::new(b"task-1".to_vec(), payload.clone());
    dispatcher.validate(&request).unwrap();
    let response = dispatcher.execute(&request).unwrap();

    assert_eq!(response.task_id, b"task-1");
    assert_eq!(String::from_utf8(response.result).unwrap(), expected_digest(&payload));
}

#[test]
fn test_three_byte_payload_is_rejected() {
    let dispatcher = local_dispatcher("dummy(bytes32)").unwrap();
    let request = TaskRequest::new(b"short".to_vec(), vec![0xa9, 0x05, 0x9c]);

    let err = dispatcher.validate(&request).unwrap_err();
    assert_eq!(err, ValidationError::ShortPayload { len: 3 });
    assert_eq!(err.state(), ValidationState::Received);
}

#[test]
fn test_extra_argument_is_rejected() {
    let dispatcher = local_dispatcher("dummy(bytes32)").unwrap();
    let mut payload = bytes32_payload("dummy(bytes32)", 0x01);
    payload.extend_from_slice(&[0x02; 32]);

    let request = TaskRequest::new(b"extra".to_vec(), payload);
    match dispatcher.execute(&request) {
        Err(TaskError::Validation(ValidationError::LengthMismatch { observed, expected })) => {
            assert_eq!(observed, 64);
            assert_eq!(expected, 32);
        }
        other => panic!("expected LengthMismatch, got {other:?}"),
    }
}

/// A payload built for `dummy(uint256)` carries a different selector than
/// `dummy(bytes32)`, so it never reaches type checking.
#[test]
fn test_wrong_argument_type_is_rejected_by_selector() {
    let dispatcher = local_dispatcher("dummy(bytes32)").unwrap();
    let payload = InterfaceDescriptor::from_signature("dummy(uint256)")
        .unwrap()
        .encode_call(&[Value::uint256(42)])
        .unwrap();

    let err = dispatcher
        .validate(&TaskRequest::new(b"wrong-type".to_vec(), payload))
        .unwrap_err();
    assert!(matches!(err, ValidationError::SelectorMismatch { .. }));
}

#[test]
fn test_dynamic_arguments_end_to_end() {
    let signature = "store(string,bytes,uint64)";
    let dispatcher = local_dispatcher(signature).unwrap();
    let payload = InterfaceDescriptor::from_signature(signature)
        .unwrap()
        .encode_call(&[
            Value::String("hello performer".to_string()),
            Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef]),
            Value::uint(64, 9),
        ])
        .unwrap();

    let request = TaskRequest::new(b"dyn".to_vec(), payload.clone());
    let response = dispatcher.execute(&request).unwrap();
    assert_eq!(String::from_utf8(response.result).unwrap(), expected_digest(&payload));

    // Appending a word past the encoded tails is not canonical.
    let mut padded = payload;
    padded.extend_from_slice(&[0u8; 32]);
    let err = dispatcher
        .validate(&TaskRequest::new(b"dyn".to_vec(), padded))
        .unwrap_err();
    assert!(matches!(err, ValidationError::LengthMismatch { .. }));
}

#[test]
fn test_repeated_execution_is_identical() {
    let dispatcher = local_dispatcher("dummy(bytes32)").unwrap();
    let request = TaskRequest::new(b"same".to_vec(), bytes32_payload("dummy(bytes32)", 0x07));

    let first = dispatcher.execute(&request).unwrap();
    let second = dispatcher.execute(&request).unwrap();
    assert_eq!(first, second);
}

/// One dispatcher shared by many threads gives each task its own result.
#[test]
fn test_concurrent_tasks_share_one_dispatcher() {
    let dispatcher = Arc::new(local_dispatcher("dummy(bytes32)").unwrap());

    std::thread::scope(|s| {
        let handles: Vec<_> = (0u8..16)
            .map(|i| {
                let dispatcher = Arc::clone(&dispatcher);
                s.spawn(move || {
                    let payload = bytes32_payload("dummy(bytes32)", i);
                    let request = TaskRequest::new(vec![i], payload.clone());
                    let response = dispatcher.execute(&request).unwrap();
                    (i, payload, response)
                })
            })
            .collect();

        for handle in handles {
            let (i, payload, response) = handle.join().unwrap();
            assert_eq!(response.task_id, vec![i]);
            assert_eq!(String::from_utf8(response.result).unwrap(), expected_digest(&payload));
        }
    });
}

#[test]
fn test_task_request_json_round_trip_through_dispatcher() {
    let dispatcher = local_dispatcher("dummy(bytes32)").unwrap();
    let payload = bytes32_payload("dummy(bytes32)", 0xaa);
    let json = serde_json::json!({
        "task_id": hex::encode(b"json-task"),
        "payload": hex::encode(&payload),
    });

    let request: TaskRequest = serde_json::from_value(json).unwrap();
    let response = dispatcher.execute(&request).unwrap();
    let rendered = serde_json::to_value(&response).unwrap();

    assert_eq!(rendered["task_id"], hex::encode(b"json-task"));
    assert_eq!(rendered["result"], hex::encode(expected_digest(&payload)));
}
