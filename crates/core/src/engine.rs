#![forbid(unsafe_code)]

use crate::result::ExecutionResult;

/// Boundary to the embedded SQL backend. The session layer drives this trait
/// and never talks to a database crate directly.
pub trait SqlEngine {
    /// Run one statement against the current schema state.
    fn execute(&mut self, sql: &str) -> Result<ExecutionResult, EngineError>;

    /// Drop every user-created object, then replay `setup_sql` so the
    /// exercise starts from a known dataset.
    fn reset_schema(&mut self, setup_sql: &str) -> Result<(), EngineError>;
}

/// Failure reported by the SQL backend.
// Surfaced to the learner verbatim (reading real error output is part of the
// drill), so Display adds no prefix or rewording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineError {
    message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EngineError {}
