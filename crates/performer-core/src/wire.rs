//! Performer wire format: the types exchanged with the orchestration layer
//! and the remote JSON-RPC endpoint.
//!
//! A task payload is `selector (4 bytes) || argument encoding`. The argument
//! encoding is defined in `abi`; this module owns the framing around it.

use std::fmt;

use serde::{Deserialize, Serialize};
use static_assertions::assert_eq_size;

use crate::crypto;

// ── Selector ──────────────────────────────────────────────────────────────────

/// Width of the method selector at the front of every payload.
pub const SELECTOR_LEN: usize = 4;

/// Method fingerprint: the first four bytes of Keccak-256 over the
/// canonical signature, e.g. `dummy(bytes32)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selector(pub [u8; SELECTOR_LEN]);

// Compile-time size guard. The selector is a bare 4-byte value on the wire.
assert_eq_size!(Selector, [u8; SELECTOR_LEN]);

impl Selector {
    /// Derive the selector for a canonical signature string.
    /// The caller is responsible for canonicalizing the text first.
    pub fn from_signature(signature: &str) -> Self {
        let digest = crypto::keccak256(signature.as_bytes());
        let mut out = [0u8; SELECTOR_LEN];
        out.copy_from_slice(&digest[..SELECTOR_LEN]);
        Self(out)
    }

    /// Read the selector off the front of a payload.
    /// Returns `None` when the payload is shorter than the selector.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        let head = payload.get(..SELECTOR_LEN)?;
        let mut out = [0u8; SELECTOR_LEN];
        out.copy_from_slice(head);
        Some(Self(out))
    }

    pub fn as_bytes(&self) -> &[u8; SELECTOR_LEN] {
        &self.0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

// ── Task request / response ───────────────────────────────────────────────────

/// A task as delivered by the transport.
///
/// Only `payload` is interpreted by the performer. `task_id` is echoed back
/// in the response and `metadata` is carried but never read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    #[serde(with = "hex::serde")]
    pub task_id: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub payload: Vec<u8>,
    #[serde(with = "hex::serde", default)]
    pub metadata: Vec<u8>,
}

impl TaskRequest {
    pub fn new(task_id: impl Into<Vec<u8>>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            task_id: task_id.into(),
            payload: payload.into(),
            metadata: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: impl Into<Vec<u8>>) -> Self {
        self.metadata = metadata.into();
        self
    }

    /// Printable form of the task id for logs. Ids are opaque bytes, so
    /// anything that is not UTF-8 is shown as hex.
    pub fn task_id_display(&self) -> String {
        match std::str::from_utf8(&self.task_id) {
            Ok(s) => s.to_string(),
            Err(_) => hex::encode(&self.task_id),
        }
    }
}

/// The performer's answer to one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResponse {
    /// Copied verbatim from the request.
    #[serde(with = "hex::serde")]
    pub task_id: Vec<u8>,
    /// Strategy-defined bytes: a hex digest, or a relayed remote body.
    #[serde(with = "hex::serde")]
    pub result: Vec<u8>,
}

// ── JSON-RPC ──────────────────────────────────────────────────────────────────

/// JSON-RPC protocol version sent to the remote endpoint.
pub const JSON_RPC_VERSION: &str = "2.0";

/// Content type for remote calls.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Request id. The performer issues one call per task and never matches
/// responses by id, so it is constant.
pub const JSON_RPC_REQUEST_ID: u64 = 1;

/// Outbound JSON-RPC call envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<String>,
    pub id: u64,
}

impl JsonRpcRequest {
    pub fn new(method: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            jsonrpc: JSON_RPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: JSON_RPC_REQUEST_ID,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
