use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    deserialize_codes, Factor, FactorCode, FactorWrite, FrictionBand, Intent, NextActionKind,
    RiskBand, UncertaintyBand,
};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Everything one triage pass reads. Borrowed: the caller owns the thread.
#[derive(Debug, Clone, Copy)]
pub struct TriageInput<'a> {
    /// Free text of this turn. Context only, never re-parsed.
    pub input_text: &'a str,
    /// Accumulated factors for the thread, oldest first.
    pub factors: &'a [Factor],
    /// Primary symptom identified by the extractor, if any.
    pub symptom_key: Option<&'a str>,
    /// Follow-ups already asked in this thread.
    pub follow_up_count: u32,
}

impl<'a> TriageInput<'a> {
    pub fn new(input_text: &'a str, factors: &'a [Factor]) -> Self {
        Self {
            input_text,
            factors,
            symptom_key: None,
            follow_up_count: 0,
        }
    }

    pub fn with_symptom_key(mut self, key: Option<&'a str>) -> Self {
        self.symptom_key = key;
        self
    }

    pub fn with_follow_up_count(mut self, count: u32) -> Self {
        self.follow_up_count = count;
        self
    }
}

// ---------------------------------------------------------------------------
// Follow-up plans
// ---------------------------------------------------------------------------

/// Which missing category a follow-up question probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpKind {
    Duration,
    Severity,
    /// Severity asked as "can you keep fluids down" for nausea/vomiting.
    FluidIntake,
    Progression,
    SymptomClarify,
    ContextTrigger,
}

impl FollowUpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duration => "duration",
            Self::Severity => "severity",
            Self::FluidIntake => "fluid_intake",
            Self::Progression => "progression",
            Self::SymptomClarify => "symptom_clarify",
            Self::ContextTrigger => "context_trigger",
        }
    }
}

/// One chip under a follow-up question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpChoice {
    pub label: String,
    /// Empty for "Skip", "Not sure" and "No clear trigger".
    pub writes_factors: Vec<FactorWrite>,
}

impl FollowUpChoice {
    pub fn new(label: &str, writes: Vec<FactorWrite>) -> Self {
        Self {
            label: label.to_string(),
            writes_factors: writes,
        }
    }

    pub fn writes_nothing(&self) -> bool {
        self.writes_factors.is_empty()
    }
}

/// A proposed clarifying question and its choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpPlan {
    pub kind: FollowUpKind,
    pub question_text: String,
    pub choices: Vec<FollowUpChoice>,
}

// ---------------------------------------------------------------------------
// Snapshot + routing
// ---------------------------------------------------------------------------

/// Immutable result of one triage pass. A new one is built every turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub event_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub intent: Intent,
    pub risk_band: RiskBand,
    pub friction_band: FrictionBand,
    pub uncertainty_band: UncertaintyBand,
    pub next_action: NextActionKind,
    /// Patient-facing explanation of what drove the decision.
    pub what_matters: Vec<String>,
    /// Set when `next_action` is `AskFollowup`.
    pub follow_up: Option<FollowUpKind>,
    /// Set when `next_action` is `SafetyNotice`.
    pub safety_copy: Option<String>,
    /// Codes that influenced the decision, first influence first.
    #[serde(deserialize_with = "deserialize_codes")]
    pub used_factors: Vec<FactorCode>,
}

/// How the response should be shaped for this pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingDecision {
    pub mode: NextActionKind,
    /// Red-flag rule that forced a safety notice.
    pub red_flag_rule: Option<&'static str>,
    /// Plan proposed by the question framework for this pass.
    pub follow_up_plan: Option<FollowUpPlan>,
}

/// Snapshot plus routing, as returned by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriageOutcome {
    pub snapshot: StateSnapshot,
    pub routing: RoutingDecision,
}
