#![forbid(unsafe_code)]
#![allow(dead_code)]

use sd_core::{
    EngineError, ExecutionResult, Exercise, ExerciseId, ProgressRecord, ProgressStore, SqlEngine,
    SqlValue, StoreError,
};
use std::collections::VecDeque;

/// Catalog of `count` exercises with ids and order keys 1..=count.
pub(crate) fn toy_catalog(count: i64) -> sd_core::Catalog {
    let exercises = (1..=count)
        .map(|id| Exercise {
            id: ExerciseId::new(id),
            title: format!("Exercise {id}"),
            description: format!("Drill number {id}"),
            setup_sql: format!("CREATE TABLE t{id}(x INTEGER);"),
            solution_sql: format!("SELECT x FROM t{id};"),
            hint: None,
            order: id,
            expected_columns: None,
        })
        .collect();
    sd_core::Catalog::new(exercises).expect("toy catalog is valid")
}

pub(crate) fn int_rows(values: &[i64]) -> ExecutionResult {
    ExecutionResult {
        columns: vec!["x".to_string()],
        rows: values
            .iter()
            .map(|value| vec![SqlValue::Integer(*value)])
            .collect(),
        affected_rows: None,
    }
}

/// Engine fake: hands out queued responses and records every call.
pub(crate) struct ScriptedEngine {
    responses: VecDeque<Result<ExecutionResult, EngineError>>,
    pub(crate) executed: Vec<String>,
    pub(crate) resets: Vec<String>,
}

impl ScriptedEngine {
    pub(crate) fn new() -> Self {
        Self {
            responses: VecDeque::new(),
            executed: Vec::new(),
            resets: Vec::new(),
        }
    }

    pub(crate) fn push_rows(&mut self, values: &[i64]) {
        self.responses.push_back(Ok(int_rows(values)));
    }

    pub(crate) fn push_error(&mut self, message: &str) {
        self.responses.push_back(Err(EngineError::new(message)));
    }
}

impl SqlEngine for ScriptedEngine {
    fn execute(&mut self, sql: &str) -> Result<ExecutionResult, EngineError> {
        self.executed.push(sql.to_string());
        self.responses
            .pop_front()
            .expect("scripted engine ran out of responses")
    }

    fn reset_schema(&mut self, setup_sql: &str) -> Result<(), EngineError> {
        self.resets.push(setup_sql.to_string());
        Ok(())
    }
}

/// Store fake: in-memory record, optional scripted failures, save log.
pub(crate) struct MemoryStore {
    pub(crate) record: ProgressRecord,
    pub(crate) load_failure: Option<StoreError>,
    pub(crate) fail_saves: bool,
    pub(crate) saves: Vec<ProgressRecord>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self {
            record: ProgressRecord::default(),
            load_failure: None,
            fail_saves: false,
            saves: Vec::new(),
        }
    }

    pub(crate) fn with_record(record: ProgressRecord) -> Self {
        Self {
            record,
            ..Self::new()
        }
    }
}

impl ProgressStore for MemoryStore {
    fn load(&mut self) -> Result<ProgressRecord, StoreError> {
        match self.load_failure.take() {
            Some(err) => Err(err),
            None => Ok(self.record.clone()),
        }
    }

    fn save(&mut self, record: &ProgressRecord) -> Result<(), StoreError> {
        if self.fail_saves {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        self.record = record.clone();
        self.saves.push(record.clone());
        Ok(())
    }
}
