#![forbid(unsafe_code)]

use crate::catalog::Catalog;
use crate::exercise::ExerciseId;
use crate::progress::ProgressRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExerciseStatus {
    /// Predecessor not completed yet; navigation bounces to the frontier.
    Locked,
    /// Reachable but not yet solved.
    Unlocked,
    Completed,
}

/// Outcome of resolving a navigation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Navigation {
    pub target: ExerciseId,
    /// Set when the request pointed at a locked or unknown exercise and was
    /// bounced to the frontier instead.
    pub redirected_from: Option<ExerciseId>,
}

/// Per-exercise status in catalog order.
pub fn statuses(catalog: &Catalog, progress: &ProgressRecord) -> Vec<(ExerciseId, ExerciseStatus)> {
    catalog
        .list_all()
        .iter()
        .enumerate()
        .map(|(index, exercise)| {
            let status = if progress.is_completed(exercise.id) {
                ExerciseStatus::Completed
            } else if is_accessible(catalog, progress, index) {
                ExerciseStatus::Unlocked
            } else {
                ExerciseStatus::Locked
            };
            (exercise.id, status)
        })
        .collect()
}

// Position 0 is always open; everything else requires the immediate
// predecessor to be completed.
fn is_accessible(catalog: &Catalog, progress: &ProgressRecord, index: usize) -> bool {
    if index == 0 {
        return true;
    }
    match catalog.list_all().get(index - 1) {
        Some(previous) => progress.is_completed(previous.id),
        None => false,
    }
}

/// First exercise past the completed prefix; the last exercise once the whole
/// catalog is done.
pub fn frontier(catalog: &Catalog, progress: &ProgressRecord) -> ExerciseId {
    let mut target = catalog.first().id;
    for pair in catalog.list_all().windows(2) {
        if progress.is_completed(pair[0].id) {
            target = pair[1].id;
        } else {
            break;
        }
    }
    target
}

/// Resolve a navigation request against the unlock rules. `None` means
/// resume: the last active exercise if there is one, otherwise the first.
// Locked or unknown requests land on the frontier, with `redirected_from`
// recording the bounce.
pub fn resolve(
    catalog: &Catalog,
    progress: &ProgressRecord,
    requested: Option<ExerciseId>,
) -> Navigation {
    let Some(candidate) = requested.or(progress.last_active_exercise_id) else {
        return Navigation {
            target: catalog.first().id,
            redirected_from: None,
        };
    };
    let accessible = catalog
        .position(candidate)
        .is_some_and(|index| is_accessible(catalog, progress, index));
    if accessible {
        Navigation {
            target: candidate,
            redirected_from: None,
        }
    } else {
        Navigation {
            target: frontier(catalog, progress),
            redirected_from: Some(candidate),
        }
    }
}
