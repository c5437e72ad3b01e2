//! Rule tables for risk and friction.
//!
//! Red-flag rules force the urgent band and a safety notice. They are
//! checked in table order and the first match wins. Risk rules below the
//! urgent band all run; the highest matching band is kept.

use serde::Serialize;

use crate::models::{ComplexityDomain, Factor, FactorCode, FrictionBand, RiskBand};

use super::vocabulary::{codes_in_domain, present_codes};

// ── Conditions ──────────────────────────────────────────────

/// When a rule fires, evaluated against the set of present codes.
#[derive(Debug, Clone, Copy)]
pub enum RuleCondition {
    /// Any one of the codes is present.
    AnyOf(&'static [FactorCode]),
    /// Every code is present.
    AllOf(&'static [FactorCode]),
}

impl RuleCondition {
    /// Codes that satisfied the condition, or `None` if it does not hold.
    pub fn matched(&self, factors: &[Factor]) -> Option<Vec<FactorCode>> {
        match self {
            Self::AnyOf(codes) => {
                let hit = present_codes(factors, codes);
                (!hit.is_empty()).then_some(hit)
            }
            Self::AllOf(codes) => {
                let hit = present_codes(factors, codes);
                (hit.len() == codes.len()).then(|| codes.to_vec())
            }
        }
    }
}

// ── Red flags ───────────────────────────────────────────────

/// What the safety notice tells the user to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    /// Call 000 now.
    Emergency,
    /// Crisis support line plus 000 if in danger.
    Crisis,
    /// Seek care today (GP, urgent care, healthdirect).
    UrgentCare,
}

impl SafetyLevel {
    /// Concrete actions listed under the safety notice.
    pub fn actions(&self) -> &'static [&'static str] {
        match self {
            Self::Emergency => &["Call 000 now", "Stay with someone if you can"],
            Self::Crisis => &[
                "Call Lifeline on 13 11 14 (24/7)",
                "Text Lifeline on 0477 13 11 14",
                "Call 000 if you are in immediate danger",
            ],
            Self::UrgentCare => &[
                "See a GP or urgent care clinic today",
                "Call healthdirect on 1800 022 222 for advice",
                "Call 000 if it gets worse quickly",
            ],
        }
    }
}

struct RedFlagRule {
    /// Unique identifier for audit trail.
    id: &'static str,
    condition: RuleCondition,
    level: SafetyLevel,
    headline: &'static str,
    message: &'static str,
}

/// Result of a fired red-flag rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedFlagHit {
    pub rule_id: &'static str,
    pub level: SafetyLevel,
    pub matched: Vec<FactorCode>,
    pub headline: &'static str,
    pub message: &'static str,
}

impl RedFlagHit {
    /// One-line reason for the snapshot's "what matters".
    pub fn reason(&self) -> String {
        let labels: Vec<&str> = self.matched.iter().map(|c| c.label()).collect();
        format!("You mentioned {}", join_labels(&labels))
    }
}

/// Emergency rules first, then crisis, then same-day care.
static RED_FLAG_RULES: &[RedFlagRule] = &[
    RedFlagRule {
        id: "RF-STROKE",
        condition: RuleCondition::AnyOf(&[FactorCode::RedFlagStrokeSigns]),
        level: SafetyLevel::Emergency,
        headline: "This needs emergency care now",
        message: "Face drooping, arm weakness or slurred speech can be signs of a stroke. \
                  Call 000 now and note the time the symptoms started.",
    },
    RedFlagRule {
        id: "RF-SEIZURE",
        condition: RuleCondition::AnyOf(&[FactorCode::RedFlagSeizure]),
        level: SafetyLevel::Emergency,
        headline: "This needs emergency care now",
        message: "A seizure needs urgent medical help. Call 000. Lay the person on their side \
                  and do not put anything in their mouth.",
    },
    RedFlagRule {
        id: "RF-FAINT",
        condition: RuleCondition::AnyOf(&[FactorCode::RedFlagFainting]),
        level: SafetyLevel::Emergency,
        headline: "This needs emergency care now",
        message: "Fainting or passing out should be checked straight away. \
                  If it happens again or you feel very unwell, call 000.",
    },
    RedFlagRule {
        id: "RF-CONFUSION",
        condition: RuleCondition::AnyOf(&[FactorCode::RedFlagConfusion]),
        level: SafetyLevel::Emergency,
        headline: "This needs emergency care now",
        message: "New confusion or trouble staying awake needs urgent medical help. Call 000.",
    },
    RedFlagRule {
        id: "RF-BLEED",
        condition: RuleCondition::AnyOf(&[FactorCode::RedFlagBleeding]),
        level: SafetyLevel::Emergency,
        headline: "This needs emergency care now",
        message: "Heavy bleeding, or vomiting or coughing up blood, needs urgent medical help. \
                  Call 000.",
    },
    RedFlagRule {
        id: "RF-CHEST-BREATH",
        condition: RuleCondition::AllOf(&[
            FactorCode::SymptomChestPain,
            FactorCode::SymptomBreathlessness,
        ]),
        level: SafetyLevel::Emergency,
        headline: "This needs emergency care now",
        message: "Chest pain with shortness of breath needs to be checked straight away. \
                  Call 000 now. Do not drive yourself.",
    },
    RedFlagRule {
        id: "RF-CHEST-SEVERE",
        condition: RuleCondition::AllOf(&[
            FactorCode::SymptomChestPain,
            FactorCode::SeveritySevere,
        ]),
        level: SafetyLevel::Emergency,
        headline: "This needs emergency care now",
        message: "Severe chest pain needs to be checked straight away. \
                  Call 000 now. Do not drive yourself.",
    },
    RedFlagRule {
        id: "RF-BREATH-SEVERE",
        condition: RuleCondition::AllOf(&[
            FactorCode::SymptomBreathlessness,
            FactorCode::SeveritySevere,
        ]),
        level: SafetyLevel::Emergency,
        headline: "This needs emergency care now",
        message: "Struggling to breathe needs immediate medical help. Call 000 now.",
    },
    RedFlagRule {
        id: "RF-SELF-HARM",
        condition: RuleCondition::AnyOf(&[FactorCode::RedFlagSelfHarm]),
        level: SafetyLevel::Crisis,
        headline: "You don't have to go through this alone",
        message: "Thank you for telling me. Please reach out now: call Lifeline on 13 11 14 \
                  (24/7). If you are in immediate danger, call 000.",
    },
    RedFlagRule {
        id: "RF-HEAD-FEVER",
        condition: RuleCondition::AllOf(&[
            FactorCode::SymptomHeadache,
            FactorCode::SymptomFever,
            FactorCode::SeveritySevere,
        ]),
        level: SafetyLevel::UrgentCare,
        headline: "Please get this checked today",
        message: "A severe headache with fever should be seen by a doctor today. \
                  If you also have a stiff neck, a rash or light hurts your eyes, call 000.",
    },
    RedFlagRule {
        id: "RF-FLUIDS",
        condition: RuleCondition::AllOf(&[
            FactorCode::SymptomVomiting,
            FactorCode::SeveritySevere,
            FactorCode::TrendWorsening,
        ]),
        level: SafetyLevel::UrgentCare,
        headline: "Please get this checked today",
        message: "Not keeping any fluids down while getting worse can lead to dehydration. \
                  See a GP or urgent care today, or call healthdirect on 1800 022 222.",
    },
    RedFlagRule {
        id: "RF-PREGNANCY-ABDO",
        condition: RuleCondition::AllOf(&[
            FactorCode::MedicalPregnancy,
            FactorCode::SymptomAbdominalPain,
            FactorCode::SeveritySevere,
        ]),
        level: SafetyLevel::UrgentCare,
        headline: "Please get this checked today",
        message: "Severe stomach pain during pregnancy should be checked today. \
                  Contact your maternity unit or GP now, or call 000 if there is bleeding.",
    },
];

/// Check red-flag rules in order. First match wins.
pub fn check_red_flags(factors: &[Factor]) -> Option<RedFlagHit> {
    for rule in RED_FLAG_RULES {
        if let Some(matched) = rule.condition.matched(factors) {
            tracing::warn!(
                rule_id = rule.id,
                level = ?rule.level,
                matched = ?matched,
                "Red-flag rule fired"
            );
            return Some(RedFlagHit {
                rule_id: rule.id,
                level: rule.level,
                matched,
                headline: rule.headline,
                message: rule.message,
            });
        }
    }
    None
}

/// Level and copy of a red-flag rule by id.
pub fn red_flag_copy(rule_id: &str) -> Option<(SafetyLevel, &'static str, &'static str)> {
    RED_FLAG_RULES
        .iter()
        .find(|r| r.id == rule_id)
        .map(|r| (r.level, r.headline, r.message))
}

/// Ids of every red-flag rule, in check order.
pub fn red_flag_rule_ids() -> Vec<&'static str> {
    RED_FLAG_RULES.iter().map(|r| r.id).collect()
}

// ── Risk below urgent ───────────────────────────────────────

struct RiskRule {
    id: &'static str,
    band: RiskBand,
    condition: RuleCondition,
    reason: &'static str,
}

static RISK_RULES: &[RiskRule] = &[
    RiskRule {
        id: "RISK-SEVERE",
        band: RiskBand::High,
        condition: RuleCondition::AnyOf(&[FactorCode::SeveritySevere]),
        reason: "It's affecting you a lot",
    },
    RiskRule {
        id: "RISK-WORSE-LONG",
        band: RiskBand::High,
        condition: RuleCondition::AllOf(&[FactorCode::TrendWorsening, FactorCode::DurationWeekPlus]),
        reason: "It's been getting worse for a week or more",
    },
    RiskRule {
        id: "RISK-CARDIO-RESP",
        band: RiskBand::High,
        condition: RuleCondition::AnyOf(&[
            FactorCode::SymptomChestPain,
            FactorCode::SymptomBreathlessness,
        ]),
        reason: "Chest and breathing symptoms are worth taking seriously",
    },
    RiskRule {
        id: "RISK-FEVER-LONG",
        band: RiskBand::High,
        condition: RuleCondition::AllOf(&[FactorCode::SymptomFever, FactorCode::DurationWeekPlus]),
        reason: "A fever lasting a week or more should be checked",
    },
    RiskRule {
        id: "RISK-MODERATE",
        band: RiskBand::Medium,
        condition: RuleCondition::AnyOf(&[FactorCode::SeverityModerate]),
        reason: "It's affecting you quite a bit",
    },
    RiskRule {
        id: "RISK-WORSENING",
        band: RiskBand::Medium,
        condition: RuleCondition::AnyOf(&[FactorCode::TrendWorsening]),
        reason: "It's getting worse",
    },
    RiskRule {
        id: "RISK-LONG",
        band: RiskBand::Medium,
        condition: RuleCondition::AnyOf(&[FactorCode::DurationWeekPlus]),
        reason: "It's been going on for a week or more",
    },
    RiskRule {
        id: "RISK-RECURRING",
        band: RiskBand::Medium,
        condition: RuleCondition::AnyOf(&[FactorCode::PatternRecurring]),
        reason: "It keeps coming back",
    },
    RiskRule {
        id: "RISK-MEDICAL",
        band: RiskBand::Medium,
        condition: RuleCondition::AnyOf(&[
            FactorCode::MedicalConditionMention,
            FactorCode::MedicalMedicationMention,
            FactorCode::MedicalPregnancy,
            FactorCode::TriggerNewMedication,
            FactorCode::TriggerInjury,
        ]),
        reason: "Your health background or a recent change may be involved",
    },
];

/// Outcome of the non-urgent risk rules.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub band: RiskBand,
    /// Ids of the rules at the winning band.
    pub rule_ids: Vec<&'static str>,
    /// Codes of the rules at the winning band.
    pub codes: Vec<FactorCode>,
    pub reasons: Vec<&'static str>,
}

/// Classify risk below the urgent band. `Low` when nothing matches.
pub fn assess_risk(factors: &[Factor]) -> RiskAssessment {
    let hits: Vec<(&RiskRule, Vec<FactorCode>)> = RISK_RULES
        .iter()
        .filter_map(|r| r.condition.matched(factors).map(|codes| (r, codes)))
        .collect();

    let band = hits.iter().map(|(r, _)| r.band).max().unwrap_or(RiskBand::Low);

    let mut assessment = RiskAssessment {
        band,
        rule_ids: Vec::new(),
        codes: Vec::new(),
        reasons: Vec::new(),
    };
    for (rule, codes) in hits.into_iter().filter(|(r, _)| r.band == band) {
        assessment.rule_ids.push(rule.id);
        assessment.reasons.push(rule.reason);
        for code in codes {
            if !assessment.codes.contains(&code) {
                assessment.codes.push(code);
            }
        }
    }
    assessment
}

// ── Friction ────────────────────────────────────────────────

const LOAD_CONTEXT_CODES: &[FactorCode] =
    &[FactorCode::ContextWorkStress, FactorCode::ContextCaringDuties];

/// Outcome of the friction rules.
#[derive(Debug, Clone, PartialEq)]
pub struct FrictionAssessment {
    pub band: FrictionBand,
    /// Load codes plus any strengths that offset them.
    pub codes: Vec<FactorCode>,
}

/// Load (constraints, behaviours, load contexts) minus strengths.
pub fn assess_friction(factors: &[Factor]) -> FrictionAssessment {
    let mut load = codes_in_domain(factors, ComplexityDomain::ResourceConstraints);
    load.extend(codes_in_domain(factors, ComplexityDomain::Behaviour));
    load.extend(present_codes(factors, LOAD_CONTEXT_CODES));

    if load.is_empty() {
        return FrictionAssessment {
            band: FrictionBand::Low,
            codes: Vec::new(),
        };
    }

    let strengths = codes_in_domain(factors, ComplexityDomain::Strength);
    let offset = strengths.len().min(load.len());
    let band = match load.len() - offset {
        0 => FrictionBand::Low,
        1 => FrictionBand::Medium,
        _ => FrictionBand::High,
    };

    let mut codes = load;
    codes.extend(strengths.into_iter().take(offset));
    FrictionAssessment { band, codes }
}

fn join_labels(labels: &[&str]) -> String {
    match labels {
        [] => String::new(),
        [one] => (*one).to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}
