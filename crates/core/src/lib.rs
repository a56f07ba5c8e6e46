#![forbid(unsafe_code)]

pub mod catalog;
pub mod compare;
pub mod engine;
pub mod progress;
pub mod store;
pub mod unlock;

pub use catalog::{Catalog, CatalogError};
pub use compare::{CompareMode, canonical_rows, results_match};
pub use engine::{EngineError, SqlEngine};
pub use exercise::{Exercise, ExerciseId};
pub use progress::ProgressRecord;
pub use result::ExecutionResult;
pub use store::{ProgressStore, StoreError};
pub use unlock::{ExerciseStatus, Navigation, frontier, resolve, statuses};
pub use value::SqlValue;

pub mod exercise {
    use serde::{Deserialize, Serialize};

    /// Stable exercise identity; presentation order lives in `Exercise::order`.
    #[derive(
        Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    )]
    #[serde(transparent)]
    pub struct ExerciseId(i64);

    impl ExerciseId {
        pub const fn new(value: i64) -> Self {
            Self(value)
        }

        pub const fn get(self) -> i64 {
            self.0
        }
    }

    impl std::fmt::Display for ExerciseId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    /// One drill: a schema script, a prompt, and the reference solution.
    // camelCase wire form matches catalogs exported from the web curriculum.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Exercise {
        pub id: ExerciseId,
        pub title: String,
        pub description: String,
        /// Statement batch that rebuilds the working schema from scratch.
        pub setup_sql: String,
        /// Reference query; its rows define the accepted answer.
        pub solution_sql: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub hint: Option<String>,
        /// Position key within the curriculum. Unique per catalog.
        pub order: i64,
        // Display hint only; never consulted during verification.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub expected_columns: Option<Vec<String>>,
    }
}

pub mod value {
    use serde::Serialize;

    /// A single cell as reported by the SQL backend.
    // The untagged JSON form is the canonical encoding answer comparison
    // relies on; variants must never gain serde tags.
    #[derive(Clone, Debug, PartialEq, Serialize)]
    #[serde(untagged)]
    pub enum SqlValue {
        Null,
        Integer(i64),
        Real(f64),
        Text(String),
        Blob(Vec<u8>),
    }

    impl SqlValue {
        pub fn is_null(&self) -> bool {
            matches!(self, Self::Null)
        }
    }

    impl std::fmt::Display for SqlValue {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Null => f.write_str("NULL"),
                Self::Integer(value) => write!(f, "{value}"),
                Self::Real(value) => write!(f, "{value}"),
                Self::Text(value) => f.write_str(value),
                Self::Blob(bytes) => {
                    f.write_str("x'")?;
                    for byte in bytes {
                        write!(f, "{byte:02X}")?;
                    }
                    f.write_str("'")
                }
            }
        }
    }
}

pub mod result {
    use crate::value::SqlValue;
    use serde::Serialize;

    /// Outcome of one successful statement execution. Row-returning statements
    /// fill `columns`/`rows`; everything else reports the affected row count.
    // Failures travel as EngineError, never embedded here.
    #[derive(Clone, Debug, Default, PartialEq, Serialize)]
    pub struct ExecutionResult {
        pub columns: Vec<String>,
        pub rows: Vec<Vec<SqlValue>>,
        pub affected_rows: Option<u64>,
    }

    impl ExecutionResult {
        pub fn is_row_set(&self) -> bool {
            !self.columns.is_empty()
        }
    }
}
