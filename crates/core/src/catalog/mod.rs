#![forbid(unsafe_code)]

mod builtin;


use crate::exercise::{Exercise, ExerciseId};
use std::collections::HashSet;

/// Validated, order-sorted exercise curriculum.
// Construction enforces what every consumer leans on: at least one exercise,
// unique ids, unique order keys.
#[derive(Clone, Debug)]
pub struct Catalog {
    exercises: Vec<Exercise>,
}

#[derive(Debug)]
pub enum CatalogError {
    Empty,
    DuplicateId(ExerciseId),
    DuplicateOrder(i64),
    Parse(serde_json::Error),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "catalog has no exercises"),
            Self::DuplicateId(id) => write!(f, "duplicate exercise id: {id}"),
            Self::DuplicateOrder(order) => write!(f, "duplicate exercise order: {order}"),
            Self::Parse(err) => write!(f, "catalog parse: {err}"),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<serde_json::Error> for CatalogError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl Catalog {
    pub fn new(mut exercises: Vec<Exercise>) -> Result<Self, CatalogError> {
        if exercises.is_empty() {
            return Err(CatalogError::Empty);
        }
        exercises.sort_by_key(|exercise| exercise.order);
        for pair in exercises.windows(2) {
            if pair[0].order == pair[1].order {
                return Err(CatalogError::DuplicateOrder(pair[0].order));
            }
        }
        let mut seen = HashSet::new();
        for exercise in &exercises {
            if !seen.insert(exercise.id) {
                return Err(CatalogError::DuplicateId(exercise.id));
            }
        }
        Ok(Self { exercises })
    }

    /// Parse a JSON array of exercises (the export format of the companion
    /// web curriculum).
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let exercises: Vec<Exercise> = serde_json::from_str(raw)?;
        Self::new(exercises)
    }

    /// The built-in ten-exercise curriculum.
    pub fn builtin() -> Self {
        // The literal list is sorted and duplicate-free; the module tests
        // re-validate it through `Catalog::new`.
        Self {
            exercises: builtin::exercises(),
        }
    }

    /// Exercises in curriculum order.
    pub fn list_all(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    // Non-empty by construction.
    pub fn first(&self) -> &Exercise {
        &self.exercises[0]
    }

    pub fn get_by_id(&self, id: ExerciseId) -> Option<&Exercise> {
        self.exercises.iter().find(|exercise| exercise.id == id)
    }

    /// Zero-based position in curriculum order.
    pub fn position(&self, id: ExerciseId) -> Option<usize> {
        self.exercises.iter().position(|exercise| exercise.id == id)
    }

    /// The successor in curriculum order, `None` at the end.
    pub fn next_after(&self, id: ExerciseId) -> Option<&Exercise> {
        let index = self.position(id)?;
        self.exercises.get(index + 1)
    }
}
