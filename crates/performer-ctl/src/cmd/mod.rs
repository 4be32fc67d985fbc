//! CLI command modules.

pub mod config;
pub mod interface;
pub mod task;

/// Flags shared by task commands.
pub struct Options {
    pub task_id: String,
    pub json: bool,
}
