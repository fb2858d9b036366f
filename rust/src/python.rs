//! PyO3 bindings for the timeline schedulers.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use chrono::NaiveDate;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use rustc_hash::FxHashSet;
use std::collections::{HashMap, HashSet};

use crate::backward::backward_schedule;
use crate::config::{TimelineConfig, DEFAULT_COMPLETION_DAY};
use crate::format::format_date_jp;
use crate::forward::forward_schedule;
use crate::models::{
    BranchOutcome, DurationUnit, PhaseOverride, SubPhaseKind, WorkflowSubPhase,
    WorkflowTimelinePhase,
};
use crate::pipeline::Pipeline;
use crate::progress::{timeline_progress, TimelineProgress};

#[pymethods]
impl TimelineConfig {
    #[new]
    #[pyo3(signature = (verbosity=0, completion_day=DEFAULT_COMPLETION_DAY))]
    fn py_new(verbosity: u8, completion_day: u32) -> Self {
        Self {
            verbosity,
            completion_day,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "TimelineConfig(verbosity={}, completion_day={})",
            self.verbosity, self.completion_day
        )
    }
}

#[pymethods]
impl PhaseOverride {
    #[new]
    #[pyo3(signature = (
        sub_phase_order=None,
        skipped_sub_phases=None,
        custom_durations=None,
        fixed_dates=None
    ))]
    fn py_new(
        sub_phase_order: Option<Vec<String>>,
        skipped_sub_phases: Option<HashSet<String>>,
        custom_durations: Option<HashMap<String, u32>>,
        fixed_dates: Option<HashMap<String, NaiveDate>>,
    ) -> Self {
        Self {
            sub_phase_order: sub_phase_order.unwrap_or_default(),
            skipped_sub_phases: skipped_sub_phases.unwrap_or_default(),
            custom_durations: custom_durations.unwrap_or_default(),
            fixed_dates: fixed_dates.unwrap_or_default(),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "PhaseOverride(order={:?}, skipped={}, durations={}, fixed={})",
            self.sub_phase_order,
            self.skipped_sub_phases.len(),
            self.custom_durations.len(),
            self.fixed_dates.len()
        )
    }
}

#[pymethods]
impl WorkflowTimelinePhase {
    fn __repr__(&self) -> String {
        format!(
            "WorkflowTimelinePhase(key={:?}, start={:?}, end={:?}, sub_phases={})",
            self.key,
            self.start_date,
            self.end_date,
            self.sub_phases.as_ref().map_or(0, Vec::len)
        )
    }
}

#[pymethods]
impl WorkflowSubPhase {
    fn __repr__(&self) -> String {
        format!(
            "WorkflowSubPhase(key={:?}, kind={:?}, date={:?})",
            self.key, self.kind, self.date
        )
    }
}

#[pymethods]
impl TimelineProgress {
    fn __repr__(&self) -> String {
        format!(
            "TimelineProgress(percent={}, overdue_phases={})",
            self.percent,
            self.overdue_phases.len()
        )
    }
}

/// Project the standard pipeline forward from a start date.
///
/// # Raises
/// * ValueError if a phase window runs past the supported date range
#[pyfunction(name = "forward_schedule")]
#[pyo3(signature = (start, config=None))]
fn py_forward_schedule(
    start: NaiveDate,
    config: Option<TimelineConfig>,
) -> PyResult<Vec<WorkflowTimelinePhase>> {
    forward_schedule(&Pipeline::standard(), start, &config.unwrap_or_default())
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Schedule the standard pipeline backward from a `YYYY-MM` completion month.
///
/// # Raises
/// * ValueError if the month is malformed, an override lists a sub-phase twice,
///   or a date falls outside the supported range
#[pyfunction(name = "backward_schedule")]
#[pyo3(signature = (completion_month, overrides=None, config=None))]
fn py_backward_schedule(
    completion_month: &str,
    overrides: Option<HashMap<String, PhaseOverride>>,
    config: Option<TimelineConfig>,
) -> PyResult<Vec<WorkflowTimelinePhase>> {
    backward_schedule(
        &Pipeline::standard(),
        completion_month,
        &overrides.unwrap_or_default(),
        &config.unwrap_or_default(),
    )
    .map_err(|e| PyValueError::new_err(e.to_string()))
}

#[pyfunction(name = "format_date_jp")]
fn py_format_date_jp(date: NaiveDate) -> String {
    format_date_jp(date)
}

/// Summarize progress and overdue items given completed phase/sub-phase keys.
#[pyfunction(name = "timeline_progress")]
fn py_timeline_progress(
    phases: Vec<WorkflowTimelinePhase>,
    completed_keys: HashSet<String>,
    today: NaiveDate,
) -> TimelineProgress {
    let completed: FxHashSet<String> = completed_keys.into_iter().collect();
    timeline_progress(&phases, &completed, today)
}

/// The solar_timeline.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Core data types
    m.add_class::<DurationUnit>()?;
    m.add_class::<SubPhaseKind>()?;
    m.add_class::<BranchOutcome>()?;
    m.add_class::<WorkflowSubPhase>()?;
    m.add_class::<WorkflowTimelinePhase>()?;
    m.add_class::<PhaseOverride>()?;
    m.add_class::<TimelineProgress>()?;

    // Config types
    m.add_class::<TimelineConfig>()?;

    // Algorithms
    m.add_function(wrap_pyfunction!(py_forward_schedule, m)?)?;
    m.add_function(wrap_pyfunction!(py_backward_schedule, m)?)?;
    m.add_function(wrap_pyfunction!(py_format_date_jp, m)?)?;
    m.add_function(wrap_pyfunction!(py_timeline_progress, m)?)?;

    Ok(())
}
