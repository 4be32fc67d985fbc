//! Task dispatcher: validates task payloads against the declared interface
//! and routes valid ones to the execution strategy.
//!
//! Validation is a fixed sequence of states:
//!
//!   Received → SelectorChecked → LengthChecked → Decoded → ArityChecked
//!            → TypeChecked → Valid
//!
//! Any state can reject. Every rejection is a `ValidationError` returned to
//! the caller; nothing here panics and nothing is retried.
//!
//! The dispatcher is immutable after construction and holds no per-call
//! state, so one instance can serve concurrent tasks without locking.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::Span;

use performer_core::abi::WORD;
use performer_core::config::PerformerConfig;
use performer_core::wire::SELECTOR_LEN;
use performer_core::{
    DecodeError, InterfaceDescriptor, Selector, TaskRequest, TaskResponse, TypeTag, Value,
};

use crate::strategy::{strategy_from_config, ExecutionError, ExecutionStrategy, ValidatedCall};

// ── States ────────────────────────────────────────────────────────────────────

/// Validation progress. A rejection reports the last state that passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationState {
    Received,
    SelectorChecked,
    LengthChecked,
    Decoded,
    ArityChecked,
    TypeChecked,
    Valid,
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("payload too short: expected at least {} bytes, got {len}", SELECTOR_LEN)]
    ShortPayload { len: usize },

    #[error("selector mismatch: expected {expected}, got {actual}")]
    SelectorMismatch { expected: Selector, actual: Selector },

    #[error("argument length mismatch: expected {expected} bytes, got {observed}")]
    LengthMismatch { observed: usize, expected: usize },

    #[error("failed to decode arguments: {0}")]
    DecodeFailed(#[from] DecodeError),

    #[error("unexpected number of arguments: expected {expected}, got {observed}")]
    ArityMismatch { expected: usize, observed: usize },

    #[error("argument {position}: expected {expected}, got {observed}")]
    TypeMismatch {
        position: usize,
        expected: TypeTag,
        observed: TypeTag,
    },
}

impl ValidationError {
    /// The last state the payload reached before being rejected.
    pub fn state(&self) -> ValidationState {
        match self {
            Self::ShortPayload { .. } | Self::SelectorMismatch { .. } => ValidationState::Received,
            Self::LengthMismatch { .. } => ValidationState::SelectorChecked,
            Self::DecodeFailed(_) => ValidationState::LengthChecked,
            Self::ArityMismatch { .. } => ValidationState::Decoded,
            Self::TypeMismatch { .. } => ValidationState::ArityChecked,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("execution failed: {0}")]
    Execution(#[from] ExecutionError),
}

// ── Checks ────────────────────────────────────────────────────────────────────

/// Decoded count must equal declared count exactly.
pub fn check_arity(descriptor: &InterfaceDescriptor, values: &[Value]) -> Result<(), ValidationError> {
    if values.len() != descriptor.arity() {
        return Err(ValidationError::ArityMismatch {
            expected: descriptor.arity(),
            observed: values.len(),
        });
    }
    Ok(())
}

/// Each value's runtime shape must equal its declared tag.
pub fn check_types(descriptor: &InterfaceDescriptor, values: &[Value]) -> Result<(), ValidationError> {
    for (position, (value, expected)) in values.iter().zip(descriptor.argument_types()).enumerate() {
        let observed = value.type_tag();
        if observed != *expected {
            return Err(ValidationError::TypeMismatch {
                position,
                expected: *expected,
                observed,
            });
        }
    }
    Ok(())
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// Default logging span for a dispatcher serving `descriptor`.
pub fn performer_span(descriptor: &InterfaceDescriptor) -> Span {
    tracing::info_span!(
        "performer",
        method = %descriptor.name(),
        selector = %descriptor.selector(),
    )
}

pub struct TaskDispatcher {
    descriptor: Arc<InterfaceDescriptor>,
    strategy: Arc<dyn ExecutionStrategy>,
    /// Every call is logged inside this span.
    span: Span,
    /// Cached length of the reference argument tuple.
    reference_len: usize,
}

impl TaskDispatcher {
    pub fn new(
        descriptor: Arc<InterfaceDescriptor>,
        strategy: Arc<dyn ExecutionStrategy>,
        span: Span,
    ) -> Self {
        let reference_len = descriptor.encoded_size_of(&descriptor.reference_arguments());
        Self {
            descriptor,
            strategy,
            span,
            reference_len,
        }
    }

    /// Build descriptor, strategy and span from config. A failure here is a
    /// startup failure.
    pub fn from_config(config: &PerformerConfig) -> Result<Self> {
        config.validate().context("invalid performer config")?;
        let descriptor = Arc::new(config.descriptor().context("invalid interface description")?);
        let strategy =
            strategy_from_config(&config.execution).context("failed to build execution strategy")?;
        let span = performer_span(&descriptor);
        Ok(Self::new(descriptor, strategy, span))
    }

    pub fn descriptor(&self) -> &InterfaceDescriptor {
        &self.descriptor
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Pre-flight check. Runs every validation state and discards the
    /// decoded values.
    pub fn validate(&self, request: &TaskRequest) -> Result<(), ValidationError> {
        let _enter = self.span.enter();
        let task_id = request.task_id_display();
        tracing::info!(task_id = %task_id, payload_len = request.payload.len(), "validating task");

        self.validated_arguments(&request.payload)
            .map(|_| ())
            .inspect_err(|e| log_rejection(&task_id, e))
    }

    /// Validate, then run the strategy. Validation is repeated even if the
    /// caller already called `validate`; it has no side effects.
    pub fn execute(&self, request: &TaskRequest) -> Result<TaskResponse, TaskError> {
        let _enter = self.span.enter();
        let task_id = request.task_id_display();
        tracing::info!(
            task_id = %task_id,
            payload_len = request.payload.len(),
            strategy = self.strategy.name(),
            "handling task"
        );

        let arguments = self
            .validated_arguments(&request.payload)
            .inspect_err(|e| log_rejection(&task_id, e))?;

        let call = ValidatedCall {
            task_id: &request.task_id,
            payload: &request.payload,
            descriptor: &self.descriptor,
            arguments: &arguments,
        };
        let result = self.strategy.execute(&call).inspect_err(|e| {
            tracing::error!(task_id = %task_id, error = %e, "task execution failed");
        })?;

        tracing::info!(task_id = %task_id, result_len = result.len(), "task completed");
        Ok(TaskResponse {
            task_id: request.task_id.clone(),
            result,
        })
    }

    /// The validation state machine. Returns the typed arguments on `Valid`.
    fn validated_arguments(&self, payload: &[u8]) -> Result<Vec<Value>, ValidationError> {
        let mut state = ValidationState::Received;
        tracing::trace!(?state);

        let actual =
            Selector::from_payload(payload).ok_or(ValidationError::ShortPayload { len: payload.len() })?;
        let expected = self.descriptor.selector();
        if actual != expected {
            return Err(ValidationError::SelectorMismatch { expected, actual });
        }
        state = ValidationState::SelectorChecked;
        tracing::trace!(?state);

        let args = &payload[SELECTOR_LEN..];
        self.check_length(args)?;
        state = ValidationState::LengthChecked;
        tracing::trace!(?state);

        let values = self.descriptor.decode_arguments(args)?;
        // Dynamic descriptors only got a lower bound above. Now that the
        // tail lengths are known, require the canonical size exactly.
        if !self.descriptor.is_static() {
            let expected = self.descriptor.encoded_size_of(&values);
            if args.len() != expected {
                return Err(ValidationError::LengthMismatch {
                    observed: args.len(),
                    expected,
                });
            }
        }
        state = ValidationState::Decoded;
        tracing::trace!(?state);

        check_arity(&self.descriptor, &values)?;
        state = ValidationState::ArityChecked;
        tracing::trace!(?state);

        check_types(&self.descriptor, &values)?;
        state = ValidationState::TypeChecked;
        tracing::trace!(?state);

        state = ValidationState::Valid;
        tracing::debug!(?state, arguments = values.len(), "payload valid");
        Ok(values)
    }

    /// Static descriptors: the argument region must be exactly as long as
    /// the reference tuple. Dynamic descriptors: whole words, at least the
    /// head.
    fn check_length(&self, args: &[u8]) -> Result<(), ValidationError> {
        let observed = args.len();
        if self.descriptor.is_static() {
            if observed != self.reference_len {
                return Err(ValidationError::LengthMismatch {
                    observed,
                    expected: self.reference_len,
                });
            }
        } else if observed < self.reference_len || observed % WORD != 0 {
            return Err(ValidationError::LengthMismatch {
                observed,
                expected: self.reference_len,
            });
        }
        Ok(())
    }
}

fn log_rejection(task_id: &str, error: &ValidationError) {
    tracing::warn!(
        task_id = %task_id,
        state = ?error.state(),
        error = %error,
        "task rejected"
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────
