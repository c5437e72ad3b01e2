use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use uuid::Uuid;

use crate::models::{
    ComplexityDomain, Factor, FactorCode, FrictionBand, Intent, NextActionKind, RiskBand,
    UncertaintyBand,
};

use super::followup::choose_next_follow_up;
use super::rules::{assess_friction, assess_risk, check_red_flags, RedFlagHit};
use super::types::{RoutingDecision, StateSnapshot, TriageInput, TriageOutcome};
use super::vocabulary::{effective_symptom_key, has_domain, missing_categories, Category};

/// Question openers (compiled once via LazyLock).
static RE_QUESTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(what|how|why|when|where|which|who|should|could|can|is|are|do|does|will|would)\b",
    )
    .unwrap()
});

const FRICTION_NOTE: &str = "A lot is on your plate right now, so I've kept this small";
const PARTIAL_NOTE: &str = "Some details are still unknown, so this guidance is general";

/// Run one triage pass with a fresh event id and the current time.
pub fn assess(input: &TriageInput<'_>) -> TriageOutcome {
    assess_at(input, Uuid::new_v4(), Utc::now())
}

/// Run one triage pass. Total: every factor list yields exactly one outcome.
pub fn assess_at(
    input: &TriageInput<'_>,
    event_id: Uuid,
    created_at: DateTime<Utc>,
) -> TriageOutcome {
    let factors = input.factors;
    let intent = detect_intent(input.input_text, factors);
    let missing = missing_categories(factors, input.symptom_key);
    let uncertainty = uncertainty_band(missing.len());
    let friction = assess_friction(factors);

    let outcome = match check_red_flags(factors) {
        Some(hit) => urgent_outcome(hit, event_id, created_at, intent, friction.band, uncertainty),
        None => {
            let risk = assess_risk(factors);
            let plan = choose_next_follow_up(
                input.input_text,
                factors,
                input.symptom_key,
                input.follow_up_count,
                risk.band,
            );

            let has_signal =
                !factors.is_empty() || effective_symptom_key(factors, input.symptom_key).is_some();
            let next_action = if plan.is_some() {
                NextActionKind::AskFollowup
            } else if has_signal {
                NextActionKind::GiveGuidance
            } else {
                NextActionKind::None
            };

            let mut what_matters: Vec<String> =
                risk.reasons.iter().map(|r| r.to_string()).collect();
            if friction.band == FrictionBand::High {
                what_matters.push(FRICTION_NOTE.to_string());
            }
            if next_action == NextActionKind::GiveGuidance && !missing.is_empty() {
                what_matters.push(PARTIAL_NOTE.to_string());
            }

            let used_factors = if next_action == NextActionKind::None {
                Vec::new()
            } else {
                let mut used = Vec::new();
                extend_unique(&mut used, risk.codes);
                for category in Category::REQUIRED {
                    extend_unique(&mut used, category.filling_codes(factors));
                }
                extend_unique(&mut used, friction.codes);
                used
            };

            TriageOutcome {
                snapshot: StateSnapshot {
                    event_id,
                    created_at,
                    intent,
                    risk_band: risk.band,
                    friction_band: friction.band,
                    uncertainty_band: uncertainty,
                    next_action,
                    what_matters,
                    follow_up: plan.as_ref().map(|p| p.kind),
                    safety_copy: None,
                    used_factors,
                },
                routing: RoutingDecision {
                    mode: next_action,
                    red_flag_rule: None,
                    follow_up_plan: plan,
                },
            }
        }
    };

    let snapshot = &outcome.snapshot;
    tracing::info!(
        event_id = %snapshot.event_id,
        intent = %snapshot.intent,
        risk = %snapshot.risk_band,
        friction = %snapshot.friction_band,
        uncertainty = %snapshot.uncertainty_band,
        next_action = %snapshot.next_action,
        factor_count = factors.len(),
        used = snapshot.used_factors.len(),
        "Triage pass complete"
    );

    outcome
}

fn urgent_outcome(
    hit: RedFlagHit,
    event_id: Uuid,
    created_at: DateTime<Utc>,
    intent: Intent,
    friction: FrictionBand,
    uncertainty: UncertaintyBand,
) -> TriageOutcome {
    TriageOutcome {
        snapshot: StateSnapshot {
            event_id,
            created_at,
            intent,
            risk_band: RiskBand::Urgent,
            friction_band: friction,
            uncertainty_band: uncertainty,
            next_action: NextActionKind::SafetyNotice,
            what_matters: vec![hit.reason(), hit.headline.to_string()],
            follow_up: None,
            safety_copy: Some(hit.message.to_string()),
            used_factors: hit.matched.clone(),
        },
        routing: RoutingDecision {
            mode: NextActionKind::SafetyNotice,
            red_flag_rule: Some(hit.rule_id),
            follow_up_plan: None,
        },
    }
}

/// `Ask` for questions or any reported symptom, otherwise `Journal`.
pub fn detect_intent(input_text: &str, factors: &[Factor]) -> Intent {
    let text = input_text.trim();
    if text.ends_with('?')
        || RE_QUESTION.is_match(text)
        || has_domain(factors, ComplexityDomain::SymptomsBodySignals)
        || has_domain(factors, ComplexityDomain::RedFlag)
    {
        Intent::Ask
    } else {
        Intent::Journal
    }
}

/// 0 missing → Low, 1–2 → Medium, 3 or more → High.
///
/// Graded rather than `High` for any gap, so the band falls as answers arrive.
pub fn uncertainty_band(missing: usize) -> UncertaintyBand {
    match missing {
        0 => UncertaintyBand::Low,
        1 | 2 => UncertaintyBand::Medium,
        _ => UncertaintyBand::High,
    }
}

fn extend_unique(target: &mut Vec<FactorCode>, codes: Vec<FactorCode>) {
    for code in codes {
        if !target.contains(&code) {
            target.push(code);
        }
    }
}
