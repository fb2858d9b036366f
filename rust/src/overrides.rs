//! Override chain resolution.
//!
//! Replaces a phase's built-in offset rules with a caller-supplied chain:
//! sub-phases are laid out one after another from the phase anchor, each
//! advancing a running cursor by its (possibly overridden) duration. Fixed
//! dates reset the cursor.

use chrono::NaiveDate;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::calendar::advance;
use crate::log_debug;
use crate::models::{PhaseOverride, SubPhaseDefinition, WorkflowSubPhase};

/// Errors that reject an override outright.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OverrideError {
    #[error("Sub-phase {0} appears more than once in the override order")]
    DuplicateSubPhase(String),
    #[error("Date out of range while scheduling sub-phase {key}")]
    DateOutOfRange { key: String },
}

/// Result of resolving an override chain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedChain {
    /// Resolved sub-phases in the caller's order, skipped keys removed.
    pub sub_phases: Vec<WorkflowSubPhase>,
    /// Keys in the order that name no sub-phase of this phase.
    pub dropped_keys: Vec<String>,
}

/// Resolve a phase's sub-phases through a caller override.
///
/// # Arguments
/// * `anchor` - Phase anchor date; the cursor starts here
/// * `definitions` - The phase's sub-phase definitions
/// * `phase_override` - Caller order, skips, duration overrides and fixed dates
/// * `verbosity` - Logging verbosity level
///
/// # Returns
/// * `Ok(ResolvedChain)` with the dated sub-phases and any unknown keys
/// * `Err(OverrideError::DuplicateSubPhase)` if a key is listed twice
/// * `Err(OverrideError::DateOutOfRange)` if a duration pushes the cursor past
///   the representable date range
pub fn resolve_override_chain(
    anchor: NaiveDate,
    definitions: &[SubPhaseDefinition],
    phase_override: &PhaseOverride,
    verbosity: u8,
) -> Result<ResolvedChain, OverrideError> {
    let by_key: FxHashMap<&str, &SubPhaseDefinition> =
        definitions.iter().map(|sub| (sub.key(), sub)).collect();

    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut ordered: Vec<&SubPhaseDefinition> = Vec::with_capacity(phase_override.sub_phase_order.len());
    let mut dropped_keys = Vec::new();

    for key in &phase_override.sub_phase_order {
        if !seen.insert(key.as_str()) {
            return Err(OverrideError::DuplicateSubPhase(key.clone()));
        }
        if phase_override.skipped_sub_phases.contains(key) {
            continue;
        }
        match by_key.get(key.as_str()) {
            Some(&sub) => ordered.push(sub),
            None => dropped_keys.push(key.clone()),
        }
    }

    let mut cursor = anchor;
    let mut sub_phases = Vec::with_capacity(ordered.len());

    for sub in ordered {
        let dated = match sub {
            SubPhaseDefinition::Branch(branch) => {
                sub_phases.push(WorkflowSubPhase::branch(branch));
                continue;
            }
            SubPhaseDefinition::Dated(dated) => dated,
        };

        if let Some(&fixed) = phase_override.fixed_dates.get(dated.key) {
            cursor = fixed;
        }

        let duration = phase_override
            .custom_durations
            .get(dated.key)
            .copied()
            .unwrap_or_else(|| dated.effective_duration());
        let unit = dated.effective_unit();

        sub_phases.push(WorkflowSubPhase::dated(dated, Some(cursor), duration, unit));

        let next = advance(cursor, duration, unit).ok_or_else(|| OverrideError::DateOutOfRange {
            key: dated.key.to_string(),
        })?;
        log_debug!(
            verbosity,
            "  override chain: {} at {} (+{} {:?}) -> cursor {}",
            dated.key,
            cursor,
            duration,
            unit,
            next
        );
        cursor = next;
    }

    Ok(ResolvedChain {
        sub_phases,
        dropped_keys,
    })
}
