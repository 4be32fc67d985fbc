//! Execution strategy trait.
//!
//! The dispatcher validates and decodes a task, then hands the typed
//! arguments to exactly one strategy. This trait is the contract between
//! the two.

use std::sync::Arc;

use performer_core::config::{ExecutionConfig, StrategyKind};
use performer_core::{InterfaceDescriptor, Value};

use crate::local_compute::LocalCompute;
use crate::remote_forward::RemoteForward;

/// A task that passed every validation state.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedCall<'a> {
    pub task_id: &'a [u8],
    /// Full payload, selector included.
    pub payload: &'a [u8],
    pub descriptor: &'a InterfaceDescriptor,
    /// One value per declared argument, in declared order.
    pub arguments: &'a [Value],
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("remote endpoint {url} unavailable: {source}")]
    RemoteUnavailable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read response body from {url}: {source}")]
    RemoteResponse {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("method '{0}' has no argument to forward")]
    MissingArgument(String),

    #[error("failed to serialize JSON-RPC request: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Runs business logic on a validated call.
///
/// Implementations hold only fixed configuration. They are shared across
/// threads and called concurrently, so `execute` takes `&self` and must not
/// keep per-call state.
pub trait ExecutionStrategy: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Produce the result bytes for one call.
    fn execute(&self, call: &ValidatedCall<'_>) -> Result<Vec<u8>, ExecutionError>;
}

/// Build the strategy selected in config.
pub fn strategy_from_config(
    config: &ExecutionConfig,
) -> Result<Arc<dyn ExecutionStrategy>, ExecutionError> {
    Ok(match config.strategy {
        StrategyKind::Local => Arc::new(LocalCompute),
        StrategyKind::Remote => Arc::new(RemoteForward::new(&config.remote)?),
    })
}
