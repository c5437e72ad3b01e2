//! Question framework: picks at most one clarifying question per turn.
//!
//! Gates run in order and the first one that applies ends the decision.
//! The probe table then walks the required categories in fixed priority
//! (duration → severity → progression → symptom → context) and returns the
//! plan for the first one still missing.

use crate::config::{confidence, MAX_FOLLOWUPS_PER_THREAD};
use crate::models::{ComplexityDomain, Factor, FactorCode, FactorWrite, RiskBand};

use super::types::{FollowUpChoice, FollowUpKind, FollowUpPlan};
use super::vocabulary::{effective_symptom_key, has_domain, Category};

pub const DURATION_QUESTION: &str = "How long has this been happening?";
pub const SEVERITY_QUESTION: &str = "How much is it affecting you right now?";
pub const FLUID_QUESTION: &str = "Have you been able to keep fluids down?";
pub const PROGRESSION_QUESTION: &str = "Is it getting better, worse, or staying about the same?";
pub const SYMPTOM_QUESTION: &str = "Where are you noticing it most?";
pub const CONTEXT_QUESTION: &str = "Did anything seem to set this off?";

/// Symptom keys whose severity is asked as fluid intake.
// TODO: decide whether diarrhoea should also get the fluid-intake framing.
const FLUID_FRAMED_KEYS: &[&str] = &["vomiting", "nausea"];

/// One row of the probe table.
struct Probe {
    category: Category,
    build: fn(Option<&str>) -> FollowUpPlan,
}

const PROBES: [Probe; 5] = [
    Probe {
        category: Category::Duration,
        build: duration_plan,
    },
    Probe {
        category: Category::Severity,
        build: severity_plan,
    },
    Probe {
        category: Category::Progression,
        build: progression_plan,
    },
    Probe {
        category: Category::SymptomIdentity,
        build: symptom_plan,
    },
    Probe {
        category: Category::Context,
        build: context_plan,
    },
];

/// Decide the single next follow-up question, or `None`.
///
/// Pure: identical inputs give identical plans. Choices are only applied
/// by the caller once the user actually picks one.
pub fn choose_next_follow_up(
    input_text: &str,
    factors: &[Factor],
    symptom_key: Option<&str>,
    follow_up_count: u32,
    risk_band: RiskBand,
) -> Option<FollowUpPlan> {
    // Urgent cases go straight to the safety response.
    if risk_band == RiskBand::Urgent {
        return None;
    }
    if follow_up_count >= MAX_FOLLOWUPS_PER_THREAD {
        return None;
    }
    // A second question needs a band above medium.
    if follow_up_count >= 1 && risk_band <= RiskBand::Medium {
        return None;
    }

    let key = effective_symptom_key(factors, symptom_key);
    if key.is_none() && !has_domain(factors, ComplexityDomain::SymptomsBodySignals) {
        return None;
    }

    let plan = PROBES
        .iter()
        .find(|p| !p.category.is_covered(factors, key.as_deref()))
        .map(|p| (p.build)(key.as_deref()));

    tracing::debug!(
        input_len = input_text.len(),
        follow_up_count,
        risk = %risk_band,
        plan = plan.as_ref().map(|p| p.kind.as_str()),
        "Follow-up decision"
    );

    plan
}

// ---------------------------------------------------------------------------
// Plan builders
// ---------------------------------------------------------------------------

fn write(code: FactorCode) -> Vec<FactorWrite> {
    vec![FactorWrite::new(code, confidence::CHOICE)]
}

fn skip() -> FollowUpChoice {
    FollowUpChoice::new("Skip", vec![])
}

fn duration_plan(_key: Option<&str>) -> FollowUpPlan {
    FollowUpPlan {
        kind: FollowUpKind::Duration,
        question_text: DURATION_QUESTION.into(),
        choices: vec![
            FollowUpChoice::new("Today", write(FactorCode::DurationToday)),
            FollowUpChoice::new("A few days", write(FactorCode::DurationFewDays)),
            FollowUpChoice::new("A week or more", write(FactorCode::DurationWeekPlus)),
            FollowUpChoice::new("Not sure", vec![]),
            skip(),
        ],
    }
}

fn severity_plan(key: Option<&str>) -> FollowUpPlan {
    if key.is_some_and(|k| FLUID_FRAMED_KEYS.contains(&k)) {
        return FollowUpPlan {
            kind: FollowUpKind::FluidIntake,
            question_text: FLUID_QUESTION.into(),
            choices: vec![
                FollowUpChoice::new("Yes, mostly", write(FactorCode::SeverityMild)),
                FollowUpChoice::new("Only small sips", write(FactorCode::SeverityModerate)),
                FollowUpChoice::new("No, nothing stays down", write(FactorCode::SeveritySevere)),
                skip(),
            ],
        };
    }

    FollowUpPlan {
        kind: FollowUpKind::Severity,
        question_text: SEVERITY_QUESTION.into(),
        choices: vec![
            FollowUpChoice::new("A little", write(FactorCode::SeverityMild)),
            FollowUpChoice::new("Quite a bit", write(FactorCode::SeverityModerate)),
            FollowUpChoice::new("A lot", write(FactorCode::SeveritySevere)),
            skip(),
        ],
    }
}

fn progression_plan(_key: Option<&str>) -> FollowUpPlan {
    FollowUpPlan {
        kind: FollowUpKind::Progression,
        question_text: PROGRESSION_QUESTION.into(),
        choices: vec![
            FollowUpChoice::new("Better", write(FactorCode::TrendImproving)),
            FollowUpChoice::new("Worse", write(FactorCode::TrendWorsening)),
            FollowUpChoice::new("About the same", write(FactorCode::TrendStable)),
            skip(),
        ],
    }
}

fn symptom_plan(_key: Option<&str>) -> FollowUpPlan {
    let region = |label: &str, code: FactorCode| {
        FollowUpChoice::new(label, vec![FactorWrite::new(code, confidence::LOCATION)])
    };
    FollowUpPlan {
        kind: FollowUpKind::SymptomClarify,
        question_text: SYMPTOM_QUESTION.into(),
        choices: vec![
            region("Head", FactorCode::SymptomHeadache),
            region("Chest", FactorCode::SymptomChestPain),
            region("Stomach", FactorCode::SymptomAbdominalPain),
            region("Back", FactorCode::SymptomBackPain),
            region("Joints or muscles", FactorCode::SymptomJointPain),
            region("Skin", FactorCode::SymptomRash),
            skip(),
        ],
    }
}

fn context_plan(_key: Option<&str>) -> FollowUpPlan {
    FollowUpPlan {
        kind: FollowUpKind::ContextTrigger,
        question_text: CONTEXT_QUESTION.into(),
        choices: vec![
            FollowUpChoice::new("Injury", write(FactorCode::TriggerInjury)),
            FollowUpChoice::new("New medication", write(FactorCode::TriggerNewMedication)),
            FollowUpChoice::new("Illness", write(FactorCode::TriggerIllness)),
            FollowUpChoice::new("No clear trigger", vec![]),
            skip(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeHorizon;

    fn factor(code: FactorCode) -> Factor {
        Factor::new(code, 0.9)
    }

    fn all_filled() -> Vec<Factor> {
        vec![
            factor(FactorCode::SymptomHeadache),
            factor(FactorCode::DurationFewDays),
            factor(FactorCode::SeverityModerate),
            factor(FactorCode::TrendStable),
            factor(FactorCode::TriggerIllness),
        ]
    }

    #[test]
    fn no_signal_returns_none() {
        assert!(choose_next_follow_up("", &[], None, 0, RiskBand::Low).is_none());
    }

    #[test]
    fn headache_asks_duration_first() {
        let factors = vec![factor(FactorCode::SymptomHeadache)];
        let plan = choose_next_follow_up("my head hurts", &factors, Some("headache"), 0, RiskBand::Low)
            .unwrap();
        assert_eq!(plan.kind, FollowUpKind::Duration);
        assert_eq!(plan.question_text, "How long has this been happening?");
        assert_eq!(plan.choices.len(), 5);
    }

    #[test]
    fn duration_choices_write_horizon_tagged_factors() {
        let plan = duration_plan(None);
        let labels: Vec<&str> = plan.choices.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Today", "A few days", "A week or more", "Not sure", "Skip"]);

        let today = &plan.choices[0].writes_factors[0];
        assert_eq!(today.code, FactorCode::DurationToday);
        assert_eq!(today.time_horizon, Some(TimeHorizon::Acute));
        assert!((today.confidence - 0.95).abs() < f32::EPSILON);

        let week = &plan.choices[2].writes_factors[0];
        assert_eq!(week.time_horizon, Some(TimeHorizon::Chronic));

        assert!(plan.choices[3].writes_nothing());
        assert!(plan.choices[4].writes_nothing());
    }

    #[test]
    fn vomiting_gets_fluid_framing_after_duration() {
        let mut factors = Vec::new();
        let first = choose_next_follow_up("", &factors, Some("vomiting"), 0, RiskBand::Low).unwrap();
        assert_eq!(first.kind, FollowUpKind::Duration);

        factors.push(first.choices[1].writes_factors[0].to_factor());
        let second = choose_next_follow_up("", &factors, Some("vomiting"), 0, RiskBand::Low).unwrap();
        assert_eq!(second.kind, FollowUpKind::FluidIntake);
        assert_eq!(second.question_text, "Have you been able to keep fluids down?");
        assert_eq!(second.choices.len(), 4);
        assert_eq!(second.choices[2].writes_factors[0].code, FactorCode::SeveritySevere);
        assert_eq!(second.choices[3].label, "Skip");
    }

    #[test]
    fn nausea_also_gets_fluid_framing() {
        let factors = vec![factor(FactorCode::SymptomNausea), factor(FactorCode::DurationToday)];
        let plan = choose_next_follow_up("", &factors, None, 0, RiskBand::Low).unwrap();
        assert_eq!(plan.kind, FollowUpKind::FluidIntake);
    }

    #[test]
    fn other_symptoms_get_generic_severity() {
        let factors = vec![factor(FactorCode::SymptomBackPain), factor(FactorCode::DurationToday)];
        let plan = choose_next_follow_up("", &factors, None, 0, RiskBand::Low).unwrap();
        assert_eq!(plan.kind, FollowUpKind::Severity);
        assert_eq!(plan.question_text, SEVERITY_QUESTION);
    }

    #[test]
    fn probes_follow_priority_order() {
        let mut factors = vec![
            factor(FactorCode::SymptomUnspecified),
            factor(FactorCode::DurationToday),
            factor(FactorCode::SeverityMild),
        ];
        let plan = choose_next_follow_up("", &factors, None, 0, RiskBand::Low).unwrap();
        assert_eq!(plan.kind, FollowUpKind::Progression);

        factors.push(factor(FactorCode::TrendStable));
        let plan = choose_next_follow_up("", &factors, None, 0, RiskBand::Low).unwrap();
        assert_eq!(plan.kind, FollowUpKind::SymptomClarify);
        assert!(plan
            .choices
            .iter()
            .filter(|c| !c.writes_nothing())
            .all(|c| (c.writes_factors[0].confidence - 0.9).abs() < f32::EPSILON));

        factors.push(factor(FactorCode::SymptomHeadache));
        let plan = choose_next_follow_up("", &factors, None, 0, RiskBand::Low).unwrap();
        assert_eq!(plan.kind, FollowUpKind::ContextTrigger);
        let no_trigger = plan.choices.iter().find(|c| c.label == "No clear trigger").unwrap();
        assert!(no_trigger.writes_nothing());
    }

    #[test]
    fn all_categories_filled_returns_none() {
        let factors = all_filled();
        assert!(choose_next_follow_up("", &factors, Some("headache"), 0, RiskBand::Low).is_none());
    }

    #[test]
    fn urgent_never_asks() {
        let factors = vec![factor(FactorCode::SymptomHeadache)];
        assert!(choose_next_follow_up("", &factors, Some("headache"), 0, RiskBand::Urgent).is_none());
    }

    #[test]
    fn cap_blocks_third_question() {
        let factors = vec![factor(FactorCode::SymptomHeadache)];
        for risk in RiskBand::ALL {
            assert!(choose_next_follow_up("", &factors, None, 2, *risk).is_none());
            assert!(choose_next_follow_up("", &factors, None, 3, *risk).is_none());
        }
    }

    #[test]
    fn second_question_only_for_high_risk() {
        let factors = vec![factor(FactorCode::SymptomChestPain)];
        assert!(choose_next_follow_up("", &factors, None, 1, RiskBand::Low).is_none());
        assert!(choose_next_follow_up("", &factors, None, 1, RiskBand::Medium).is_none());
        let plan = choose_next_follow_up("", &factors, None, 1, RiskBand::High).unwrap();
        assert_eq!(plan.kind, FollowUpKind::Duration);
    }

    #[test]
    fn symptom_key_alone_is_enough_signal() {
        let plan = choose_next_follow_up("", &[], Some("rash"), 0, RiskBand::Low).unwrap();
        assert_eq!(plan.kind, FollowUpKind::Duration);
    }

    #[test]
    fn non_symptom_factors_alone_do_not_prompt() {
        let factors = vec![factor(FactorCode::ConstraintTime), factor(FactorCode::DurationToday)];
        assert!(choose_next_follow_up("busy week", &factors, None, 0, RiskBand::Low).is_none());
    }

    #[test]
    fn identical_inputs_give_identical_plans() {
        let factors = vec![factor(FactorCode::SymptomFever)];
        let a = choose_next_follow_up("hot", &factors, None, 0, RiskBand::Medium);
        let b = choose_next_follow_up("hot", &factors, None, 0, RiskBand::Medium);
        assert_eq!(a, b);
    }

    #[test]
    fn every_writing_choice_uses_fixed_confidence() {
        for plan in [
            duration_plan(None),
            severity_plan(None),
            severity_plan(Some("vomiting")),
            progression_plan(None),
            context_plan(None),
        ] {
            for choice in plan.choices.iter().filter(|c| !c.writes_nothing()) {
                for w in &choice.writes_factors {
                    assert!((w.confidence - confidence::CHOICE).abs() < f32::EPSILON);
                }
            }
        }
    }
}
