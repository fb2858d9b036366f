//! Per-phase sub-phase offset rules.
//!
//! Each rule maps a phase's anchor date and one of its dated sub-phases to
//! that sub-phase's timing. Phases without a rule leave their sub-phases
//! undated.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;

use crate::calendar::{add_business_days, add_calendar_days, add_months};
use crate::models::{DatedSubPhase, DurationUnit, PhaseDefinition, SubPhaseDefinition, WorkflowSubPhase};
use crate::pipeline::{self, sub_keys};

/// Resolved timing for a single dated sub-phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubPhaseTiming {
    pub date: Option<NaiveDate>,
    pub duration: u32,
    pub unit: DurationUnit,
}

impl SubPhaseTiming {
    /// A date that overflowed the calendar leaves the sub-phase undated.
    fn at(date: Option<NaiveDate>, sub: &DatedSubPhase) -> Self {
        Self {
            date,
            duration: sub.effective_duration(),
            unit: sub.effective_unit(),
        }
    }

    fn at_fixed(date: Option<NaiveDate>, duration: u32, unit: DurationUnit) -> Self {
        Self {
            date,
            duration,
            unit,
        }
    }

    /// Timing for a sub-phase of a phase with no rule.
    pub fn undated(sub: &DatedSubPhase) -> Self {
        Self {
            date: None,
            duration: sub.effective_duration(),
            unit: sub.effective_unit(),
        }
    }
}

pub type OffsetRule = fn(NaiveDate, &DatedSubPhase) -> SubPhaseTiming;

fn kickoff(anchor: NaiveDate, _sub: &DatedSubPhase) -> SubPhaseTiming {
    SubPhaseTiming::at_fixed(Some(anchor), 1, DurationUnit::BusinessDays)
}

fn initial_survey(anchor: NaiveDate, sub: &DatedSubPhase) -> SubPhaseTiming {
    let offset = if sub.key == sub_keys::INITIAL_PROPOSAL { 3 } else { 2 };
    SubPhaseTiming::at(add_business_days(anchor, offset), sub)
}

fn site_confirmation(anchor: NaiveDate, sub: &DatedSubPhase) -> SubPhaseTiming {
    SubPhaseTiming::at(add_business_days(anchor, 3), sub)
}

fn submission_decision(anchor: NaiveDate, _sub: &DatedSubPhase) -> SubPhaseTiming {
    SubPhaseTiming::at_fixed(Some(anchor), 1, DurationUnit::BusinessDays)
}

/// Shared by the contract phase and application filing, which borrows the
/// contract phase's anchor.
fn five_business_days(anchor: NaiveDate, sub: &DatedSubPhase) -> SubPhaseTiming {
    SubPhaseTiming::at(add_business_days(anchor, 5), sub)
}

fn waiting_period(anchor: NaiveDate, sub: &DatedSubPhase) -> SubPhaseTiming {
    match sub.key {
        sub_keys::GRID_CONSULTATION_REPLY => SubPhaseTiming::at(add_months(anchor, 1.0), sub),
        sub_keys::GRID_APPROVAL => SubPhaseTiming::at(add_months(anchor, 1.5), sub),
        _ => SubPhaseTiming::at_fixed(Some(anchor), 1, DurationUnit::CalendarDays),
    }
}

fn final_design(anchor: NaiveDate, sub: &DatedSubPhase) -> SubPhaseTiming {
    SubPhaseTiming::at(add_calendar_days(anchor, 3), sub)
}

fn final_settlement(anchor: NaiveDate, _sub: &DatedSubPhase) -> SubPhaseTiming {
    SubPhaseTiming::at_fixed(add_calendar_days(anchor, 5), 1, DurationUnit::CalendarDays)
}

const OFFSET_RULES: &[(&str, OffsetRule)] = &[
    (pipeline::KICKOFF, kickoff),
    (pipeline::INITIAL_SURVEY, initial_survey),
    (pipeline::SITE_CONFIRMATION, site_confirmation),
    (pipeline::SUBMISSION_DECISION, submission_decision),
    (pipeline::CONTRACT_DESIGN, five_business_days),
    (pipeline::APPLICATION_FILING, five_business_days),
    (pipeline::WAITING_PERIOD, waiting_period),
    (pipeline::FINAL_DESIGN, final_design),
    (pipeline::FINAL_SETTLEMENT, final_settlement),
];

/// Look up the offset rule for a phase key.
pub fn offset_rule(phase_key: &str) -> Option<OffsetRule> {
    OFFSET_RULES
        .iter()
        .find(|(key, _)| *key == phase_key)
        .map(|(_, rule)| *rule)
}

/// The date a phase's sub-phases are anchored to.
///
/// Phases with an anchor phase borrow its resolved start date; everything
/// else uses its own start.
pub(crate) fn anchor_date(
    phase: &PhaseDefinition,
    own_start: NaiveDate,
    resolved_starts: &FxHashMap<&str, NaiveDate>,
) -> NaiveDate {
    phase
        .anchor_phase_key
        .and_then(|key| resolved_starts.get(key).copied())
        .unwrap_or(own_start)
}

/// Resolve every sub-phase of `phase` against `anchor` with the built-in rules.
///
/// Branch sub-phases are emitted without a date.
pub fn resolve_with_rules(phase: &PhaseDefinition, anchor: NaiveDate) -> Vec<WorkflowSubPhase> {
    let rule = offset_rule(phase.key);
    phase
        .sub_phases
        .iter()
        .map(|sub| match sub {
            SubPhaseDefinition::Branch(branch) => WorkflowSubPhase::branch(branch),
            SubPhaseDefinition::Dated(dated) => {
                let timing = match rule {
                    Some(rule) => rule(anchor, dated),
                    None => SubPhaseTiming::undated(dated),
                };
                WorkflowSubPhase::dated(dated, timing.date, timing.duration, timing.unit)
            }
        })
        .collect()
}
