//! Core data types for the workflow timeline.
//!
//! Definitions are static and carry no dates; only the schedulers produce
//! dates, and they do so into the owned result types below.

use chrono::NaiveDate;
#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// Note: We use std HashMap here for PyO3 interface compatibility

/// Unit in which a duration is counted.
#[cfg_attr(feature = "python", pyclass(eq, eq_int))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    #[default]
    BusinessDays,
    CalendarDays,
}

/// One named outcome of a branch sub-phase.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BranchOutcome {
    pub name: String,
    pub condition: String,
}

/// Static form of [`BranchOutcome`] used in pipeline definitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BranchOutcomeDef {
    pub name: &'static str,
    pub condition: &'static str,
}

/// A task within a phase that receives a computed date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DatedSubPhase {
    pub key: &'static str,
    pub title: &'static str,
    /// Illustrative default duration; schedulers fall back to 1 when unset.
    pub default_duration: Option<u32>,
    pub unit: Option<DurationUnit>,
    /// Responsible-role tags (e.g. "sales", "design").
    pub roles: &'static [&'static str],
}

impl DatedSubPhase {
    pub fn effective_duration(&self) -> u32 {
        self.default_duration.unwrap_or(1)
    }

    pub fn effective_unit(&self) -> DurationUnit {
        self.unit.unwrap_or_default()
    }
}

/// A conditional decision point. Never dated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BranchSubPhase {
    pub key: &'static str,
    pub title: &'static str,
    pub outcomes: &'static [BranchOutcomeDef],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubPhaseDefinition {
    Dated(DatedSubPhase),
    Branch(BranchSubPhase),
}

impl SubPhaseDefinition {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Dated(sub) => sub.key,
            Self::Branch(sub) => sub.key,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Dated(sub) => sub.title,
            Self::Branch(sub) => sub.title,
        }
    }
}

/// One of the top-level stages of the project pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseDefinition {
    pub key: &'static str,
    pub title: &'static str,
    pub duration: u32,
    pub duration_unit: DurationUnit,
    /// Display grouping, e.g. "Stage 1".
    pub group_label: &'static str,
    pub sub_phases: &'static [SubPhaseDefinition],
    /// Earlier phase whose start date anchors this phase's sub-phases.
    pub anchor_phase_key: Option<&'static str>,
    /// Forward scheduling does not project dates for open-ended phases.
    pub open_ended: bool,
}

/// Whether a resolved sub-phase is a dated task or a branch node.
#[cfg_attr(feature = "python", pyclass(eq, eq_int))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubPhaseKind {
    Dated,
    Branch,
}

/// A sub-phase with its resolved date.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorkflowSubPhase {
    pub key: String,
    pub title: String,
    pub kind: SubPhaseKind,
    pub date: Option<NaiveDate>,
    pub duration: Option<u32>,
    pub unit: Option<DurationUnit>,
    pub branches: Vec<BranchOutcome>,
}

impl WorkflowSubPhase {
    pub(crate) fn dated(
        sub: &DatedSubPhase,
        date: Option<NaiveDate>,
        duration: u32,
        unit: DurationUnit,
    ) -> Self {
        Self {
            key: sub.key.to_string(),
            title: sub.title.to_string(),
            kind: SubPhaseKind::Dated,
            date,
            duration: Some(duration),
            unit: Some(unit),
            branches: Vec::new(),
        }
    }

    pub(crate) fn branch(sub: &BranchSubPhase) -> Self {
        Self {
            key: sub.key.to_string(),
            title: sub.title.to_string(),
            kind: SubPhaseKind::Branch,
            date: None,
            duration: None,
            unit: None,
            branches: sub
                .outcomes
                .iter()
                .map(|o| BranchOutcome {
                    name: o.name.to_string(),
                    condition: o.condition.to_string(),
                })
                .collect(),
        }
    }
}

/// A phase with its computed window.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorkflowTimelinePhase {
    pub key: String,
    pub title: String,
    pub group_label: String,
    /// Set only for zero-duration phases, equal to both window ends.
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sub_phases: Option<Vec<WorkflowSubPhase>>,
}

impl WorkflowTimelinePhase {
    /// A phase result with no dates at all.
    pub(crate) fn undated(phase: &PhaseDefinition) -> Self {
        Self {
            key: phase.key.to_string(),
            title: phase.title.to_string(),
            group_label: phase.group_label.to_string(),
            date: None,
            start_date: None,
            end_date: None,
            sub_phases: None,
        }
    }

    pub(crate) fn windowed(
        phase: &PhaseDefinition,
        start_date: NaiveDate,
        end_date: NaiveDate,
        sub_phases: Vec<WorkflowSubPhase>,
    ) -> Self {
        Self {
            date: (phase.duration == 0).then_some(start_date),
            start_date: Some(start_date),
            end_date: Some(end_date),
            sub_phases: (!phase.sub_phases.is_empty()).then_some(sub_phases),
            ..Self::undated(phase)
        }
    }
}

/// Caller customization of one phase's sub-phase chain.
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseOverride {
    /// Sub-phase keys to include, in order. Empty means "use the built-in rules".
    pub sub_phase_order: Vec<String>,
    pub skipped_sub_phases: HashSet<String>,
    pub custom_durations: HashMap<String, u32>,
    /// Absolute dates that reset the running cursor.
    pub fixed_dates: HashMap<String, NaiveDate>,
}

impl PhaseOverride {
    /// Override that only reorders.
    pub fn with_order<I, S>(order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sub_phase_order: order.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}
