#![forbid(unsafe_code)]

use crate::exercise::ExerciseId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Durable learner state. One record per installation.
// BTreeSet keeps the persisted form deterministic across saves. Completion
// only grows here; wiping the record is an outer-layer concern.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressRecord {
    pub completed_exercise_ids: BTreeSet<ExerciseId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active_exercise_id: Option<ExerciseId>,
}

impl ProgressRecord {
    pub fn is_completed(&self, id: ExerciseId) -> bool {
        self.completed_exercise_ids.contains(&id)
    }

    /// Returns `true` when the exercise was not completed before.
    pub fn mark_completed(&mut self, id: ExerciseId) -> bool {
        self.completed_exercise_ids.insert(id)
    }

    pub fn set_last_active(&mut self, id: ExerciseId) {
        self.last_active_exercise_id = Some(id);
    }

    pub fn completed_count(&self) -> usize {
        self.completed_exercise_ids.len()
    }
}
