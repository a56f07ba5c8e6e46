#![forbid(unsafe_code)]

use sd_core::{
    Catalog, CompareMode, EngineError, ExecutionResult, Exercise, ExerciseId, ExerciseStatus,
    Navigation, ProgressRecord, ProgressStore, SqlEngine, StoreError, results_match,
};

pub const DEFAULT_ADVANCE_DELAY_MS: i64 = 1400;

#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    /// Delay between a correct answer and the jump to the next exercise.
    pub advance_delay_ms: i64,
    pub compare_mode: CompareMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            advance_delay_ms: DEFAULT_ADVANCE_DELAY_MS,
            compare_mode: CompareMode::Strict,
        }
    }
}

/// A scheduled jump to the next exercise. Cancelled by any navigation before
/// `fire_at_ms`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingAdvance {
    pub target: ExerciseId,
    pub fire_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    Correct {
        result: ExecutionResult,
        /// False when the exercise had been completed in an earlier attempt.
        newly_completed: bool,
        advance: Option<PendingAdvance>,
    },
    /// Rows differ from the reference solution. Nothing was recorded.
    Incorrect { result: ExecutionResult },
    /// The submitted statement itself failed; message goes to the learner
    /// verbatim. Nothing was recorded.
    EngineError { error: EngineError },
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionError {
    NoActiveExercise,
    UnknownExercise(ExerciseId),
    /// The exercise setup script failed; a catalog defect, not a learner
    /// mistake.
    Setup(EngineError),
    /// Free-form execution failed.
    Query(EngineError),
    /// The reference solution failed; a catalog defect, not a learner
    /// mistake.
    Solution(EngineError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoActiveExercise => write!(f, "no active exercise"),
            Self::UnknownExercise(id) => write!(f, "unknown exercise: {id}"),
            Self::Setup(err) => write!(f, "exercise setup failed: {err}"),
            Self::Query(err) => write!(f, "{err}"),
            Self::Solution(err) => write!(f, "solution query failed: {err}"),
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Clone, Debug, PartialEq)]
pub struct EnterOutcome {
    pub exercise: Exercise,
    /// Set when the request was bounced off a locked or unknown exercise.
    pub redirected_from: Option<ExerciseId>,
}

/// One learner sitting in front of one catalog.
///
/// Owns the engine and the progress store behind their core traits and runs
/// the whole drill loop: navigation with unlock rules, answer verification,
/// and the delayed auto-advance. Single-threaded by design; timing comes in
/// through `now_ms` arguments so every transition is deterministic under test.
pub struct LabSession<E, S> {
    catalog: Catalog,
    engine: E,
    store: S,
    config: SessionConfig,
    progress: ProgressRecord,
    current: Option<ExerciseId>,
    pending: Option<PendingAdvance>,
    load_error: Option<StoreError>,
    last_save_error: Option<StoreError>,
}

impl<E: SqlEngine, S: ProgressStore> LabSession<E, S> {
    /// Load progress (best effort) and stand up an idle session. No exercise
    /// is entered yet; a failed load starts from an empty record and stashes
    /// the error for the caller to surface.
    pub fn start(catalog: Catalog, engine: E, mut store: S, config: SessionConfig) -> Self {
        let (progress, load_error) = match store.load() {
            Ok(record) => (record, None),
            Err(err) => (ProgressRecord::default(), Some(err)),
        };
        Self {
            catalog,
            engine,
            store,
            config,
            progress,
            current: None,
            pending: None,
            load_error,
            last_save_error: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn progress(&self) -> &ProgressRecord {
        &self.progress
    }

    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.current.and_then(|id| self.catalog.get_by_id(id))
    }

    pub fn statuses(&self) -> Vec<(ExerciseId, ExerciseStatus)> {
        sd_core::statuses(&self.catalog, &self.progress)
    }

    pub fn resolve(&self, requested: Option<ExerciseId>) -> Navigation {
        sd_core::resolve(&self.catalog, &self.progress, requested)
    }

    pub fn take_load_error(&mut self) -> Option<StoreError> {
        self.load_error.take()
    }

    pub fn take_save_error(&mut self) -> Option<StoreError> {
        self.last_save_error.take()
    }

    // The attempt journal lives on the concrete store; the session only owns
    // the handle.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Navigate into an exercise: resolve against the unlock rules, rebuild
    /// the schema sandbox, remember it as last active.
    ///
    /// Any navigation drops a pending auto-advance, including the redirect
    /// case.
    pub fn enter(&mut self, requested: Option<ExerciseId>) -> Result<EnterOutcome, SessionError> {
        self.pending = None;
        let nav = self.resolve(requested);
        let Some(exercise) = self.catalog.get_by_id(nav.target) else {
            return Err(SessionError::UnknownExercise(nav.target));
        };
        let exercise = exercise.clone();

        self.engine
            .reset_schema(&exercise.setup_sql)
            .map_err(SessionError::Setup)?;
        self.current = Some(exercise.id);
        self.progress.set_last_active(exercise.id);
        self.persist_progress();

        Ok(EnterOutcome {
            exercise,
            redirected_from: nav.redirected_from,
        })
    }

    /// Verify an answer against the current exercise.
    ///
    /// Runs on a freshly reset schema so earlier statements cannot leak into
    /// the result: user query first (its failure is a learner-facing outcome,
    /// not an error), then the reference solution, then the canonical row
    /// comparison. A correct answer marks completion (idempotently), persists
    /// it, and schedules the auto-advance when a successor exists.
    pub fn submit(&mut self, sql: &str, now_ms: i64) -> Result<SubmitOutcome, SessionError> {
        let current_id = self.current.ok_or(SessionError::NoActiveExercise)?;
        let Some(exercise) = self.catalog.get_by_id(current_id) else {
            return Err(SessionError::UnknownExercise(current_id));
        };
        let setup_sql = exercise.setup_sql.clone();
        let solution_sql = exercise.solution_sql.clone();

        self.engine
            .reset_schema(&setup_sql)
            .map_err(SessionError::Setup)?;

        let user_result = match self.engine.execute(sql) {
            Ok(result) => result,
            Err(error) => return Ok(SubmitOutcome::EngineError { error }),
        };

        let solution_result = self
            .engine
            .execute(&solution_sql)
            .map_err(SessionError::Solution)?;

        if !results_match(&user_result, &solution_result, self.config.compare_mode) {
            return Ok(SubmitOutcome::Incorrect {
                result: user_result,
            });
        }

        let newly_completed = self.progress.mark_completed(current_id);
        if newly_completed {
            self.persist_progress();
        }
        let advance = self.catalog.next_after(current_id).map(|next| PendingAdvance {
            target: next.id,
            fire_at_ms: now_ms.saturating_add(self.config.advance_delay_ms),
        });
        self.pending = advance;

        Ok(SubmitOutcome::Correct {
            result: user_result,
            newly_completed,
            advance,
        })
    }

    /// Free-form execution against the current exercise state. No reset, no
    /// comparison; this is the learner exploring.
    pub fn run(&mut self, sql: &str) -> Result<ExecutionResult, SessionError> {
        if self.current.is_none() {
            return Err(SessionError::NoActiveExercise);
        }
        self.engine.execute(sql).map_err(SessionError::Query)
    }

    pub fn pending_advance(&self) -> Option<PendingAdvance> {
        self.pending
    }

    /// Returns true when a scheduled advance was actually dropped.
    pub fn cancel_pending_advance(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Fire the scheduled advance once due. `None` while idle or before the
    /// deadline.
    pub fn poll_advance(&mut self, now_ms: i64) -> Option<Result<EnterOutcome, SessionError>> {
        let pending = self.pending?;
        if now_ms < pending.fire_at_ms {
            return None;
        }
        self.pending = None;
        Some(self.enter(Some(pending.target)))
    }

    // Persistence is best-effort: remember the failure, never interrupt the
    // drill.
    fn persist_progress(&mut self) {
        self.last_save_error = self.store.save(&self.progress).err();
    }
}
