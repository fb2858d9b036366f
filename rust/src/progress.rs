//! Progress and overdue summary over a computed timeline.

use chrono::NaiveDate;
#[cfg(feature = "python")]
use pyo3::prelude::*;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::models::{SubPhaseKind, WorkflowTimelinePhase};

/// Summary of how far a timeline has progressed on a given day.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TimelineProgress {
    pub completed_phases: usize,
    pub total_phases: usize,
    /// Completed share of all phases, rounded to the nearest whole percent.
    pub percent: u32,
    /// Phases not completed whose end date has passed.
    pub overdue_phases: Vec<String>,
    /// Dated sub-phases not completed whose date has passed.
    pub overdue_sub_phases: Vec<String>,
}

/// Merge externally tracked completion markers into a timeline.
///
/// `completed_keys` may hold phase keys and sub-phase keys. An item is overdue
/// when it is not completed and its date lies strictly before `today`;
/// undated items are never overdue.
pub fn timeline_progress(
    phases: &[WorkflowTimelinePhase],
    completed_keys: &FxHashSet<String>,
    today: NaiveDate,
) -> TimelineProgress {
    let total_phases = phases.len();
    let completed_phases = phases
        .iter()
        .filter(|p| completed_keys.contains(&p.key))
        .count();

    let percent = if total_phases == 0 {
        0
    } else {
        ((completed_phases as f64 / total_phases as f64) * 100.0).round() as u32
    };

    let mut overdue_phases = Vec::new();
    let mut overdue_sub_phases = Vec::new();

    for phase in phases {
        if completed_keys.contains(&phase.key) {
            continue;
        }

        if phase.end_date.or(phase.date).is_some_and(|end| end < today) {
            overdue_phases.push(phase.key.clone());
        }

        for sub in phase.sub_phases.iter().flatten() {
            if sub.kind == SubPhaseKind::Branch || completed_keys.contains(&sub.key) {
                continue;
            }
            if sub.date.is_some_and(|date| date < today) {
                overdue_sub_phases.push(sub.key.clone());
            }
        }
    }

    TimelineProgress {
        completed_phases,
        total_phases,
        percent,
        overdue_phases,
        overdue_sub_phases,
    }
}
