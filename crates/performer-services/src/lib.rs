//! performer-services: task validation, dispatch and execution strategies.

pub mod dispatcher;
pub mod local_compute;
pub mod remote_forward;
pub mod strategy;

pub use dispatcher::{performer_span, TaskDispatcher, TaskError, ValidationError, ValidationState};
pub use local_compute::LocalCompute;
pub use remote_forward::RemoteForward;
pub use strategy::{strategy_from_config, ExecutionError, ExecutionStrategy, ValidatedCall};
