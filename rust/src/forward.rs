//! Forward scheduling from a known start date.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;

use crate::backward::ScheduleError;
use crate::calendar::advance;
use crate::config::TimelineConfig;
use crate::models::WorkflowTimelinePhase;
use crate::pipeline::Pipeline;
use crate::rules::{anchor_date, resolve_with_rules};
use crate::{log_changes, log_checks};

/// Project every phase of `pipeline` forward from `start`.
///
/// Phases are laid end to end: each phase starts where the previous one
/// ended. Open-ended phases get no dates and do not move the cursor.
/// Sub-phases are dated with the built-in offset rules, anchored at the
/// phase start or at the start of the phase's anchor phase.
///
/// # Errors
/// `ScheduleError::DateOutOfRange` when a phase window runs past the last
/// representable date.
pub fn forward_schedule(
    pipeline: &Pipeline,
    start: NaiveDate,
    config: &TimelineConfig,
) -> Result<Vec<WorkflowTimelinePhase>, ScheduleError> {
    let verbosity = config.verbosity;
    let mut cursor = start;
    let mut starts: FxHashMap<&str, NaiveDate> = FxHashMap::default();
    let mut result = Vec::with_capacity(pipeline.len());

    log_changes!(verbosity, "Forward schedule from {}", start);

    for phase in pipeline.phases() {
        if phase.open_ended {
            log_checks!(verbosity, "  {}: open-ended, not projected", phase.key);
            result.push(WorkflowTimelinePhase::undated(phase));
            continue;
        }

        let start_date = cursor;
        let end_date = advance(cursor, phase.duration, phase.duration_unit).ok_or_else(|| {
            ScheduleError::DateOutOfRange {
                phase: phase.key.to_string(),
            }
        })?;
        cursor = end_date;
        starts.insert(phase.key, start_date);

        let anchor = anchor_date(phase, start_date, &starts);
        log_changes!(
            verbosity,
            "  {}: {} -> {} (sub-phase anchor {})",
            phase.key,
            start_date,
            end_date,
            anchor
        );

        let sub_phases = resolve_with_rules(phase, anchor);
        result.push(WorkflowTimelinePhase::windowed(
            phase, start_date, end_date, sub_phases,
        ));
    }

    Ok(result)
}
