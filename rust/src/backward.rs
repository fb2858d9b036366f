//! Backward scheduling from a completion month.
//!
//! Pass 1 walks the pipeline in reverse from the completion anchor, giving
//! each phase its window. Pass 2 walks forward and dates the sub-phases of
//! each window, through the caller's override chain where one applies.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::calendar::retreat;
use crate::config::TimelineConfig;
use crate::models::{PhaseOverride, WorkflowTimelinePhase};
use crate::overrides::{resolve_override_chain, OverrideError};
use crate::pipeline::Pipeline;
use crate::rules::{anchor_date, resolve_with_rules};
use crate::{log_changes, log_checks};

/// Errors that reject a backward scheduling request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid completion month {0:?}: expected YYYY-MM")]
    InvalidCompletionMonth(String),
    #[error("Month out of range in completion month {0:?}")]
    MonthOutOfRange(String),
    #[error("Completion day {day} does not exist in {month}")]
    CompletionDayOutOfRange { month: CompletionMonth, day: u32 },
    #[error("Date out of range while scheduling phase {phase}")]
    DateOutOfRange { phase: String },
    #[error("Override for phase {phase}: {source}")]
    Override {
        phase: String,
        #[source]
        source: OverrideError,
    },
}

/// A validated `YYYY-MM` completion month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompletionMonth {
    pub year: i32,
    pub month: u32,
}

impl CompletionMonth {
    /// The anchor date on `day` of this month.
    pub fn anchor(&self, day: u32) -> Result<NaiveDate, ScheduleError> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
            .ok_or(ScheduleError::CompletionDayOutOfRange { month: *self, day })
    }
}

impl FromStr for CompletionMonth {
    type Err = ScheduleError;

    /// Parse `^\d{4}-\d{2}$` with a month of 1 to 12.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        let well_formed = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);
        if !well_formed {
            return Err(ScheduleError::InvalidCompletionMonth(s.to_string()));
        }

        let year: i32 = s[..4]
            .parse()
            .map_err(|_| ScheduleError::InvalidCompletionMonth(s.to_string()))?;
        let month: u32 = s[5..]
            .parse()
            .map_err(|_| ScheduleError::InvalidCompletionMonth(s.to_string()))?;
        if !(1..=12).contains(&month) {
            return Err(ScheduleError::MonthOutOfRange(s.to_string()));
        }

        Ok(Self { year, month })
    }
}

impl fmt::Display for CompletionMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Schedule `pipeline` backward so its final phase ends in `completion_month`.
///
/// # Arguments
/// * `pipeline` - Phases to schedule
/// * `completion_month` - `YYYY-MM`; the final phase ends on the configured day of it
/// * `overrides` - Optional per-phase override chains, keyed by phase key
/// * `config` - Completion day and logging verbosity
///
/// # Returns
/// * `Ok(phases)` in pipeline order with windows and sub-phase dates
/// * `Err(ScheduleError)` if the month is malformed, an override is invalid,
///   or a window or sub-phase date falls outside the representable range
pub fn backward_schedule(
    pipeline: &Pipeline,
    completion_month: &str,
    overrides: &HashMap<String, PhaseOverride>,
    config: &TimelineConfig,
) -> Result<Vec<WorkflowTimelinePhase>, ScheduleError> {
    let verbosity = config.verbosity;
    let month: CompletionMonth = completion_month.parse()?;
    let completion = month.anchor(config.completion_day)?;

    log_changes!(verbosity, "Backward schedule to {} (anchor {})", month, completion);

    for key in overrides.keys() {
        if pipeline.get(key).is_none() {
            log_checks!(verbosity, "  ignoring override for unknown phase {}", key);
        }
    }

    // Pass 1: reverse walk assigns each phase its window
    let mut cursor = completion;
    let mut windows: Vec<(NaiveDate, NaiveDate)> = Vec::with_capacity(pipeline.len());
    for phase in pipeline.phases().iter().rev() {
        let end_date = cursor;
        let start_date = retreat(end_date, phase.duration, phase.duration_unit).ok_or_else(|| {
            ScheduleError::DateOutOfRange {
                phase: phase.key.to_string(),
            }
        })?;
        windows.push((start_date, end_date));
        cursor = start_date;
    }
    windows.reverse();

    let starts: FxHashMap<&str, NaiveDate> = pipeline
        .phases()
        .iter()
        .zip(&windows)
        .map(|(phase, &(start, _))| (phase.key, start))
        .collect();

    // Pass 2: forward walk resolves sub-phases inside each window
    let mut result = Vec::with_capacity(pipeline.len());
    for (phase, &(start_date, end_date)) in pipeline.phases().iter().zip(&windows) {
        let anchor = anchor_date(phase, start_date, &starts);
        log_changes!(
            verbosity,
            "  {}: {} -> {} (sub-phase anchor {})",
            phase.key,
            start_date,
            end_date,
            anchor
        );

        let sub_phases = match overrides.get(phase.key) {
            Some(over) if !over.sub_phase_order.is_empty() => {
                log_checks!(verbosity, "  {}: using override chain", phase.key);
                let chain = resolve_override_chain(anchor, phase.sub_phases, over, verbosity)
                    .map_err(|source| ScheduleError::Override {
                        phase: phase.key.to_string(),
                        source,
                    })?;
                for key in &chain.dropped_keys {
                    log_checks!(
                        verbosity,
                        "  {}: dropped unknown sub-phase {} from override",
                        phase.key,
                        key
                    );
                }
                chain.sub_phases
            }
            _ => resolve_with_rules(phase, anchor),
        };

        result.push(WorkflowTimelinePhase::windowed(
            phase, start_date, end_date, sub_phases,
        ));
    }

    Ok(result)
}

/// Fail-soft variant of [`backward_schedule`]: any rejection yields an empty list.
pub fn backward_schedule_or_empty(
    pipeline: &Pipeline,
    completion_month: &str,
    overrides: &HashMap<String, PhaseOverride>,
    config: &TimelineConfig,
) -> Vec<WorkflowTimelinePhase> {
    match backward_schedule(pipeline, completion_month, overrides, config) {
        Ok(phases) => phases,
        Err(e) => {
            log_changes!(config.verbosity, "Backward schedule rejected: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::add_business_days;
    use crate::pipeline::{self, STANDARD_PHASES};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn schedule(month: &str) -> Result<Vec<WorkflowTimelinePhase>, ScheduleError> {
        backward_schedule(
            &Pipeline::standard(),
            month,
            &HashMap::new(),
            &TimelineConfig::default(),
        )
    }

    fn phase<'a>(phases: &'a [WorkflowTimelinePhase], key: &str) -> &'a WorkflowTimelinePhase {
        phases.iter().find(|p| p.key == key).unwrap()
    }

    #[test]
    fn test_parse_completion_month() {
        assert_eq!(
            "2026-06".parse::<CompletionMonth>(),
            Ok(CompletionMonth {
                year: 2026,
                month: 6
            })
        );
        assert_eq!(CompletionMonth { year: 2026, month: 6 }.to_string(), "2026-06");
    }

    #[test]
    fn test_parse_rejects_malformed_months() {
        for bad in ["2026-6", "26-06", "2026/06", "2026-06-01", "", "abcd-ef", " 2026-06"] {
            assert_eq!(
                bad.parse::<CompletionMonth>(),
                Err(ScheduleError::InvalidCompletionMonth(bad.to_string())),
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn test_parse_rejects_out_of_range_month() {
        assert_eq!(
            "2026-13".parse::<CompletionMonth>(),
            Err(ScheduleError::MonthOutOfRange("2026-13".to_string()))
        );
        assert_eq!(
            "2026-00".parse::<CompletionMonth>(),
            Err(ScheduleError::MonthOutOfRange("2026-00".to_string()))
        );
    }

    #[test]
    fn test_construction_ends_on_fifteenth() {
        let phases = schedule("2026-06").unwrap();
        let construction = phase(&phases, pipeline::CONSTRUCTION);
        assert_eq!(construction.end_date, Some(d(2026, 6, 15)));
        // 90 calendar days earlier
        assert_eq!(construction.start_date, Some(d(2026, 3, 17)));
    }

    #[test]
    fn test_full_backward_windows() {
        let phases = schedule("2026-06").unwrap();
        let windows: Vec<(Option<NaiveDate>, Option<NaiveDate>)> =
            phases.iter().map(|p| (p.start_date, p.end_date)).collect();
        assert_eq!(
            windows,
            vec![
                (Some(d(2025, 12, 9)), Some(d(2025, 12, 9))),
                (Some(d(2025, 12, 9)), Some(d(2025, 12, 16))),
                (Some(d(2025, 12, 16)), Some(d(2025, 12, 19))),
                (Some(d(2025, 12, 19)), Some(d(2025, 12, 22))),
                (Some(d(2025, 12, 22)), Some(d(2026, 1, 4))),
                (Some(d(2026, 1, 4)), Some(d(2026, 1, 4))),
                (Some(d(2026, 1, 4)), Some(d(2026, 3, 5))),
                (Some(d(2026, 3, 5)), Some(d(2026, 3, 10))),
                (Some(d(2026, 3, 10)), Some(d(2026, 3, 17))),
                (Some(d(2026, 3, 17)), Some(d(2026, 6, 15))),
            ]
        );
    }

    #[test]
    fn test_backward_cursor_handoff() {
        for month in ["2026-01", "2026-06", "2027-02", "2030-12"] {
            let phases = schedule(month).unwrap();
            assert_eq!(phases.len(), 10);
            for pair in phases.windows(2) {
                assert_eq!(pair[0].end_date, pair[1].start_date, "{} {}", month, pair[0].key);
            }
            for p in &phases {
                if p.date.is_some() {
                    assert_eq!(p.start_date, p.end_date);
                }
            }
        }
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(matches!(
            schedule("2026-13"),
            Err(ScheduleError::MonthOutOfRange(_))
        ));
        assert!(matches!(
            schedule("June 2026"),
            Err(ScheduleError::InvalidCompletionMonth(_))
        ));
    }

    #[test]
    fn test_or_empty_preserves_fail_soft_contract() {
        let pipeline = Pipeline::standard();
        let config = TimelineConfig::default();
        let empty = backward_schedule_or_empty(&pipeline, "2026-13", &HashMap::new(), &config);
        assert!(empty.is_empty());

        let full = backward_schedule_or_empty(&pipeline, "2026-06", &HashMap::new(), &config);
        assert_eq!(full.len(), 10);
    }

    #[test]
    fn test_completion_day_out_of_range() {
        let config = TimelineConfig {
            completion_day: 31,
            ..TimelineConfig::default()
        };
        let result = backward_schedule(&Pipeline::standard(), "2026-06", &HashMap::new(), &config);
        assert_eq!(
            result,
            Err(ScheduleError::CompletionDayOutOfRange {
                month: CompletionMonth { year: 2026, month: 6 },
                day: 31,
            })
        );
    }

    #[test]
    fn test_application_filing_follows_contract_start() {
        let phases = schedule("2026-06").unwrap();
        let filing = phase(&phases, pipeline::APPLICATION_FILING);
        for sub in filing.sub_phases.as_ref().unwrap() {
            assert_eq!(sub.date, Some(d(2025, 12, 29)));
        }
    }

    #[test]
    fn test_contract_duration_shifts_application_filing() {
        let mut phases = STANDARD_PHASES.to_vec();
        let contract = phases
            .iter_mut()
            .find(|p| p.key == pipeline::CONTRACT_DESIGN)
            .unwrap();
        contract.duration = 15;
        let longer = Pipeline::new(phases).unwrap();

        let result = backward_schedule(&longer, "2026-06", &HashMap::new(), &TimelineConfig::default())
            .unwrap();
        let contract_start = phase(&result, pipeline::CONTRACT_DESIGN).start_date.unwrap();
        assert_eq!(contract_start, d(2025, 12, 15));

        let filing = phase(&result, pipeline::APPLICATION_FILING);
        // Filing itself has not moved, its tasks have
        assert_eq!(filing.date, Some(d(2026, 1, 4)));
        for sub in filing.sub_phases.as_ref().unwrap() {
            assert_eq!(sub.date, add_business_days(contract_start, 5));
            assert_eq!(sub.date, Some(d(2025, 12, 22)));
        }
    }

    #[test]
    fn test_override_replaces_rules_for_that_phase_only() {
        let mut overrides = HashMap::new();
        let mut over = PhaseOverride::with_order(["structural_check", "contract_signing", "ghost"]);
        over.skipped_sub_phases.insert("detailed_design".to_string());
        overrides.insert(pipeline::CONTRACT_DESIGN.to_string(), over);

        let phases = backward_schedule(
            &Pipeline::standard(),
            "2026-06",
            &overrides,
            &TimelineConfig::default(),
        )
        .unwrap();

        let contract = phase(&phases, pipeline::CONTRACT_DESIGN);
        let subs: Vec<(&str, Option<NaiveDate>)> = contract
            .sub_phases
            .as_ref()
            .unwrap()
            .iter()
            .map(|s| (s.key.as_str(), s.date))
            .collect();
        assert_eq!(
            subs,
            vec![
                ("structural_check", Some(d(2025, 12, 22))),
                ("contract_signing", Some(d(2025, 12, 25))),
            ]
        );

        // Other phases still use the built-in rules
        let filing = phase(&phases, pipeline::APPLICATION_FILING);
        assert_eq!(filing.sub_phases.as_ref().unwrap()[0].date, Some(d(2025, 12, 29)));
    }

    #[test]
    fn test_empty_override_order_falls_back_to_rules() {
        let mut overrides = HashMap::new();
        let mut over = PhaseOverride::default();
        over.custom_durations.insert("contract_signing".to_string(), 9);
        overrides.insert(pipeline::CONTRACT_DESIGN.to_string(), over);

        let with = backward_schedule(&Pipeline::standard(), "2026-06", &overrides, &TimelineConfig::default())
            .unwrap();
        assert_eq!(with, schedule("2026-06").unwrap());
    }

    #[test]
    fn test_unknown_phase_override_ignored() {
        let mut overrides = HashMap::new();
        overrides.insert("roof_repair".to_string(), PhaseOverride::with_order(["a"]));

        let with = backward_schedule(&Pipeline::standard(), "2026-06", &overrides, &TimelineConfig::default())
            .unwrap();
        assert_eq!(with, schedule("2026-06").unwrap());
    }

    #[test]
    fn test_duplicate_override_key_rejected() {
        let mut overrides = HashMap::new();
        overrides.insert(
            pipeline::KICKOFF.to_string(),
            PhaseOverride::with_order(["customer_hearing", "customer_hearing"]),
        );

        let result = backward_schedule(&Pipeline::standard(), "2026-06", &overrides, &TimelineConfig::default());
        assert_eq!(
            result,
            Err(ScheduleError::Override {
                phase: pipeline::KICKOFF.to_string(),
                source: OverrideError::DuplicateSubPhase("customer_hearing".to_string()),
            })
        );
    }

    #[test]
    fn test_override_deserialized_from_json() {
        let json = r#"{
            "contract_design": {
                "sub_phase_order": ["contract_signing", "detailed_design", "structural_check"],
                "fixed_dates": {"detailed_design": "2026-02-01"}
            }
        }"#;
        let overrides: HashMap<String, PhaseOverride> = serde_json::from_str(json).unwrap();

        let phases = backward_schedule(&Pipeline::standard(), "2026-06", &overrides, &TimelineConfig::default())
            .unwrap();
        let subs = phase(&phases, pipeline::CONTRACT_DESIGN).sub_phases.clone().unwrap();
        assert_eq!(subs[0].date, Some(d(2025, 12, 22)));
        assert_eq!(subs[1].date, Some(d(2026, 2, 1)));
        // Feb 1 (Sunday) + 5 business days
        assert_eq!(subs[2].date, Some(d(2026, 2, 6)));
    }

    #[test]
    fn test_oversized_custom_duration_is_an_error() {
        // One calendar-day and one business-day sub-phase
        for (phase_key, sub_key) in [
            (pipeline::WAITING_PERIOD, "equipment_order"),
            (pipeline::CONTRACT_DESIGN, "detailed_design"),
        ] {
            let mut over = PhaseOverride::with_order([sub_key]);
            over.custom_durations.insert(sub_key.to_string(), u32::MAX);
            let mut overrides = HashMap::new();
            overrides.insert(phase_key.to_string(), over);

            let result = backward_schedule(
                &Pipeline::standard(),
                "2026-06",
                &overrides,
                &TimelineConfig::default(),
            );
            assert_eq!(
                result,
                Err(ScheduleError::Override {
                    phase: phase_key.to_string(),
                    source: OverrideError::DateOutOfRange {
                        key: sub_key.to_string()
                    },
                })
            );

            let empty = backward_schedule_or_empty(
                &Pipeline::standard(),
                "2026-06",
                &overrides,
                &TimelineConfig::default(),
            );
            assert!(empty.is_empty());
        }
    }

    #[test]
    fn test_oversized_phase_duration_is_an_error() {
        let mut phases = STANDARD_PHASES.to_vec();
        phases[0].duration = u32::MAX;
        let huge = Pipeline::new(phases).unwrap();

        let result = backward_schedule(&huge, "2026-06", &HashMap::new(), &TimelineConfig::default());
        assert_eq!(
            result,
            Err(ScheduleError::DateOutOfRange {
                phase: pipeline::KICKOFF.to_string()
            })
        );
    }
}
