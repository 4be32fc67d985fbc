//! Remote forward: relay the first argument to a JSON-RPC endpoint.
//!
//! The call is blocking and bounded by the configured timeout. There is no
//! retry: a failed call surfaces once and the caller decides what to do.
//! The response body is returned byte-for-byte; neither the status code nor
//! the JSON-RPC `id` is interpreted.

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use performer_core::config::RemoteSettings;
use performer_core::wire::{JsonRpcRequest, JSON_CONTENT_TYPE};

use crate::strategy::{ExecutionError, ExecutionStrategy, ValidatedCall};

pub struct RemoteForward {
    client: Client,
    endpoint: String,
    method: String,
}

impl RemoteForward {
    pub fn new(settings: &RemoteSettings) -> Result<Self, ExecutionError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(ExecutionError::Client)?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            method: settings.method.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The JSON-RPC envelope for a call. Split out so it can be inspected
    /// without a server.
    pub fn build_request(&self, call: &ValidatedCall<'_>) -> Result<JsonRpcRequest, ExecutionError> {
        let first = call
            .arguments
            .first()
            .ok_or_else(|| ExecutionError::MissingArgument(call.descriptor.name().to_string()))?;
        Ok(JsonRpcRequest::new(&self.method, vec![first.to_prefixed_hex()]))
    }
}

impl ExecutionStrategy for RemoteForward {
    fn name(&self) -> &'static str {
        "remote_forward"
    }

    fn execute(&self, call: &ValidatedCall<'_>) -> Result<Vec<u8>, ExecutionError> {
        let request = self.build_request(call)?;
        let body = serde_json::to_vec(&request)?;

        tracing::debug!(url = %self.endpoint, method = %self.method, "sending JSON-RPC request");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .send()
            .map_err(|source| {
                tracing::error!(url = %self.endpoint, error = %source, "HTTP request failed");
                ExecutionError::RemoteUnavailable {
                    url: self.endpoint.clone(),
                    source,
                }
            })?;

        let status = response.status();
        let bytes = response.bytes().map_err(|source| {
            tracing::error!(url = %self.endpoint, error = %source, "failed to read response body");
            ExecutionError::RemoteResponse {
                url: self.endpoint.clone(),
                source,
            }
        })?;

        if status.is_success() {
            tracing::info!(
                status_code = status.as_u16(),
                body_len = bytes.len(),
                "received response from RPC server"
            );
        } else {
            tracing::warn!(
                status_code = status.as_u16(),
                body = %String::from_utf8_lossy(&bytes),
                "RPC server returned non-success status, relaying body as-is"
            );
        }

        Ok(bytes.to_vec())
    }
}
