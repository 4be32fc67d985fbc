//! Local compute: digest the validated payload in-process.

use performer_core::crypto;

use crate::strategy::{ExecutionError, ExecutionStrategy, ValidatedCall};

/// Result is the lowercase hex SHA-256 of the full payload (selector
/// included), as UTF-8 bytes. Pure and infallible.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCompute;

impl ExecutionStrategy for LocalCompute {
    fn name(&self) -> &'static str {
        "local_compute"
    }

    fn execute(&self, call: &ValidatedCall<'_>) -> Result<Vec<u8>, ExecutionError> {
        let digest = crypto::sha256_hex(call.payload);
        tracing::debug!(digest = %digest, "local compute finished");
        Ok(digest.into_bytes())
    }
}
