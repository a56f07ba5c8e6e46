#![forbid(unsafe_code)]

use crate::progress::ProgressRecord;

/// Boundary to durable progress storage.
// Best-effort from the session's point of view: a failure is stashed and
// surfaced as a warning, never allowed to interrupt a drill.
pub trait ProgressStore {
    fn load(&mut self) -> Result<ProgressRecord, StoreError>;
    fn save(&mut self, record: &ProgressRecord) -> Result<(), StoreError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// The backend failed (I/O, database, ...). Message is diagnostic text.
    Backend(String),
    /// The stored record exists but does not parse.
    Corrupt(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backend(message) => write!(f, "backend: {message}"),
            Self::Corrupt(message) => write!(f, "corrupt progress record: {message}"),
        }
    }
}

impl std::error::Error for StoreError {}
