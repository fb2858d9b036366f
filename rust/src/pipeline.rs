//! The fixed 10-phase solar construction pipeline.

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::models::{
    BranchOutcomeDef, BranchSubPhase, DatedSubPhase, DurationUnit, PhaseDefinition,
    SubPhaseDefinition,
};

pub const KICKOFF: &str = "kickoff";
pub const INITIAL_SURVEY: &str = "initial_survey";
pub const SITE_CONFIRMATION: &str = "site_confirmation";
pub const SUBMISSION_DECISION: &str = "submission_decision";
pub const CONTRACT_DESIGN: &str = "contract_design";
pub const APPLICATION_FILING: &str = "application_filing";
pub const WAITING_PERIOD: &str = "waiting_period";
pub const FINAL_DESIGN: &str = "final_design";
pub const FINAL_SETTLEMENT: &str = "final_settlement";
pub const CONSTRUCTION: &str = "construction";

/// Sub-phase keys the offset rules treat specially.
pub mod sub_keys {
    pub const INITIAL_PROPOSAL: &str = "initial_proposal";
    pub const GRID_CONSULTATION_REPLY: &str = "grid_consultation_reply";
    pub const GRID_APPROVAL: &str = "grid_approval";
}

const fn dated(
    key: &'static str,
    title: &'static str,
    duration: u32,
    unit: DurationUnit,
    roles: &'static [&'static str],
) -> SubPhaseDefinition {
    SubPhaseDefinition::Dated(DatedSubPhase {
        key,
        title,
        default_duration: Some(duration),
        unit: Some(unit),
        roles,
    })
}

const BD: DurationUnit = DurationUnit::BusinessDays;
const CD: DurationUnit = DurationUnit::CalendarDays;

const KICKOFF_SUBS: &[SubPhaseDefinition] = &[
    dated("customer_hearing", "Customer Hearing", 1, BD, &["sales"]),
    dated("kickoff_meeting", "Kickoff Meeting", 1, BD, &["sales", "design"]),
];

const INITIAL_SURVEY_SUBS: &[SubPhaseDefinition] = &[
    dated("site_survey", "Site Survey", 2, BD, &["survey"]),
    dated("shading_analysis", "Shading Analysis", 1, BD, &["design"]),
    dated("preliminary_layout", "Preliminary Panel Layout", 2, BD, &["design"]),
    dated(
        sub_keys::INITIAL_PROPOSAL,
        "Initial Proposal",
        1,
        BD,
        &["sales"],
    ),
];

const SITE_CONFIRMATION_SUBS: &[SubPhaseDefinition] = &[dated(
    "site_confirmation_visit",
    "Site Confirmation Visit",
    1,
    BD,
    &["survey", "sales"],
)];

const SUBMISSION_DECISION_SUBS: &[SubPhaseDefinition] = &[
    dated("submission_review", "Submission Review", 1, BD, &["sales"]),
    SubPhaseDefinition::Branch(BranchSubPhase {
        key: "submission_outcome",
        title: "Submission Outcome",
        outcomes: &[
            BranchOutcomeDef {
                name: "proceed",
                condition: "customer approves the proposal",
            },
            BranchOutcomeDef {
                name: "revise",
                condition: "customer requests layout changes",
            },
            BranchOutcomeDef {
                name: "cancel",
                condition: "customer declines",
            },
        ],
    }),
];

const CONTRACT_DESIGN_SUBS: &[SubPhaseDefinition] = &[
    dated("contract_signing", "Contract Signing", 1, BD, &["sales"]),
    dated("detailed_design", "Detailed Design", 5, BD, &["design"]),
    dated("structural_check", "Structural Check", 3, BD, &["design"]),
];

const APPLICATION_FILING_SUBS: &[SubPhaseDefinition] = &[
    dated("grid_application", "Grid Connection Application", 1, BD, &["admin"]),
    dated("subsidy_application", "Subsidy Application", 1, BD, &["admin"]),
];

const WAITING_PERIOD_SUBS: &[SubPhaseDefinition] = &[
    dated(
        sub_keys::GRID_CONSULTATION_REPLY,
        "Grid Consultation Reply",
        1,
        CD,
        &["admin"],
    ),
    dated(sub_keys::GRID_APPROVAL, "Grid Approval", 1, CD, &["admin"]),
    dated("equipment_order", "Equipment Order", 1, CD, &["procurement"]),
];

const FINAL_DESIGN_SUBS: &[SubPhaseDefinition] = &[dated(
    "final_layout_review",
    "Final Layout Review",
    1,
    CD,
    &["design"],
)];

const FINAL_SETTLEMENT_SUBS: &[SubPhaseDefinition] =
    &[dated("final_invoice", "Final Invoice", 1, CD, &["accounting"])];

const CONSTRUCTION_SUBS: &[SubPhaseDefinition] = &[
    dated("mounting", "Mounting Installation", 10, BD, &["construction"]),
    dated("electrical_work", "Electrical Work", 5, BD, &["construction"]),
    dated("grid_connection", "Grid Connection", 1, BD, &["construction", "admin"]),
];

const fn phase(
    key: &'static str,
    title: &'static str,
    duration: u32,
    duration_unit: DurationUnit,
    group_label: &'static str,
    sub_phases: &'static [SubPhaseDefinition],
) -> PhaseDefinition {
    PhaseDefinition {
        key,
        title,
        duration,
        duration_unit,
        group_label,
        sub_phases,
        anchor_phase_key: None,
        open_ended: false,
    }
}

/// The standard pipeline, in order.
pub const STANDARD_PHASES: [PhaseDefinition; 10] = [
    phase(KICKOFF, "Project Kickoff", 0, BD, "Stage 1", KICKOFF_SUBS),
    phase(
        INITIAL_SURVEY,
        "Initial Survey & Design",
        5,
        BD,
        "Stage 1",
        INITIAL_SURVEY_SUBS,
    ),
    phase(
        SITE_CONFIRMATION,
        "Site Confirmation",
        3,
        BD,
        "Stage 2",
        SITE_CONFIRMATION_SUBS,
    ),
    phase(
        SUBMISSION_DECISION,
        "Submission Decision",
        1,
        BD,
        "Stage 2",
        SUBMISSION_DECISION_SUBS,
    ),
    phase(
        CONTRACT_DESIGN,
        "Contract & Detailed Design",
        10,
        BD,
        "Stage 3",
        CONTRACT_DESIGN_SUBS,
    ),
    PhaseDefinition {
        anchor_phase_key: Some(CONTRACT_DESIGN),
        ..phase(
            APPLICATION_FILING,
            "Application Filing",
            0,
            BD,
            "Stage 3",
            APPLICATION_FILING_SUBS,
        )
    },
    phase(
        WAITING_PERIOD,
        "Waiting Period",
        60,
        CD,
        "Stage 4",
        WAITING_PERIOD_SUBS,
    ),
    phase(
        FINAL_DESIGN,
        "Final Design Adjustment",
        5,
        CD,
        "Stage 4",
        FINAL_DESIGN_SUBS,
    ),
    phase(
        FINAL_SETTLEMENT,
        "Final Settlement",
        7,
        CD,
        "Stage 5",
        FINAL_SETTLEMENT_SUBS,
    ),
    PhaseDefinition {
        open_ended: true,
        ..phase(
            CONSTRUCTION,
            "Construction",
            90,
            CD,
            "Stage 5",
            CONSTRUCTION_SUBS,
        )
    },
];

/// Errors from validating a custom pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Pipeline has no phases")]
    Empty,
    #[error("Duplicate phase key: {0}")]
    DuplicatePhaseKey(String),
    #[error("Duplicate sub-phase key {sub_phase} in phase {phase}")]
    DuplicateSubPhaseKey { phase: String, sub_phase: String },
    #[error("Phase {phase} anchors to unknown phase {anchor}")]
    UnknownAnchorPhase { phase: String, anchor: String },
    #[error("Phase {phase} anchors to {anchor}, which does not precede it")]
    AnchorNotEarlier { phase: String, anchor: String },
}

/// An ordered, validated list of phase definitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pipeline {
    phases: Vec<PhaseDefinition>,
}

impl Pipeline {
    /// Validate and wrap a custom phase list.
    ///
    /// Anchor phases must appear earlier in the list so that forward
    /// scheduling has already resolved their start date.
    pub fn new(phases: Vec<PhaseDefinition>) -> Result<Self, PipelineError> {
        if phases.is_empty() {
            return Err(PipelineError::Empty);
        }

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for phase in &phases {
            if !seen.insert(phase.key) {
                return Err(PipelineError::DuplicatePhaseKey(phase.key.to_string()));
            }

            let mut sub_seen: FxHashSet<&str> = FxHashSet::default();
            for sub in phase.sub_phases {
                if !sub_seen.insert(sub.key()) {
                    return Err(PipelineError::DuplicateSubPhaseKey {
                        phase: phase.key.to_string(),
                        sub_phase: sub.key().to_string(),
                    });
                }
            }

            if let Some(anchor) = phase.anchor_phase_key {
                if !seen.contains(anchor) || anchor == phase.key {
                    let known = phases.iter().any(|p| p.key == anchor);
                    return Err(if known {
                        PipelineError::AnchorNotEarlier {
                            phase: phase.key.to_string(),
                            anchor: anchor.to_string(),
                        }
                    } else {
                        PipelineError::UnknownAnchorPhase {
                            phase: phase.key.to_string(),
                            anchor: anchor.to_string(),
                        }
                    });
                }
            }
        }

        Ok(Self { phases })
    }

    /// The standard 10-phase solar construction pipeline.
    pub fn standard() -> Self {
        Self {
            phases: STANDARD_PHASES.to_vec(),
        }
    }

    pub fn phases(&self) -> &[PhaseDefinition] {
        &self.phases
    }

    pub fn get(&self, key: &str) -> Option<&PhaseDefinition> {
        self.phases.iter().find(|p| p.key == key)
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}
