//! Workflow timeline scheduling for solar-power construction projects.
//!
//! Projects a fixed 10-phase pipeline either forward from a start date or
//! backward from a completion month, resolving per-task (sub-phase) dates
//! with built-in offset rules or caller-supplied override chains.
//!
//! Everything here is pure computation: no I/O, no shared mutable state.

pub mod backward;
pub mod calendar;
mod config;
pub mod format;
pub mod forward;
pub mod logging;
mod models;
pub mod overrides;
pub mod pipeline;
pub mod progress;
#[cfg(feature = "python")]
mod python;
pub mod rules;

pub use backward::{backward_schedule, backward_schedule_or_empty, CompletionMonth, ScheduleError};
pub use config::{TimelineConfig, DEFAULT_COMPLETION_DAY};
pub use format::format_date_jp;
pub use forward::forward_schedule;
pub use models::{
    BranchOutcome, BranchOutcomeDef, BranchSubPhase, DatedSubPhase, DurationUnit,
    PhaseDefinition, PhaseOverride, SubPhaseDefinition, SubPhaseKind, WorkflowSubPhase,
    WorkflowTimelinePhase,
};
pub use overrides::{resolve_override_chain, OverrideError, ResolvedChain};
pub use pipeline::{Pipeline, PipelineError, STANDARD_PHASES};
pub use progress::{timeline_progress, TimelineProgress};
