#![forbid(unsafe_code)]

use crate::result::ExecutionResult;
use crate::value::SqlValue;

/// How submitted rows are matched against the reference rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompareMode {
    /// Row sequences must match position by position. The default: ordering
    /// drills (`ORDER BY ... LIMIT`) only work under strict comparison.
    #[default]
    Strict,
    /// Multiset comparison for curricula that treat results as unordered.
    OrderInsensitive,
}

/// Canonical encoding of a row sequence: the JSON text of the row array.
/// Two results are the same answer exactly when their encodings are byte-equal.
// Column names stay out of the encoding; aliasing a column differently from
// the reference solution is not a wrong answer.
pub fn canonical_rows(rows: &[Vec<SqlValue>]) -> String {
    serde_json::to_string(rows).unwrap_or_else(|_| "[]".to_string())
}

fn canonical_row(row: &[SqlValue]) -> String {
    serde_json::to_string(row).unwrap_or_else(|_| "[]".to_string())
}

pub fn results_match(
    user: &ExecutionResult,
    solution: &ExecutionResult,
    mode: CompareMode,
) -> bool {
    match mode {
        CompareMode::Strict => canonical_rows(&user.rows) == canonical_rows(&solution.rows),
        CompareMode::OrderInsensitive => {
            if user.rows.len() != solution.rows.len() {
                return false;
            }
            let mut left: Vec<String> = user.rows.iter().map(|row| canonical_row(row)).collect();
            let mut right: Vec<String> =
                solution.rows.iter().map(|row| canonical_row(row)).collect();
            left.sort();
            right.sort();
            left == right
        }
    }
}
