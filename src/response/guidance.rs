//! General self-care guidance and implementation-intention phrasing.
//!
//! Steps are general wellbeing suggestions, never diagnoses or dosing
//! instructions. The last step always says when to check in or seek care.

use crate::models::{ComplexityLevel, FrictionBand, RiskBand};

use super::types::{GuidanceKind, GuidanceStep};

const DEFAULT_STEPS: &[&str] = &[
    "Rest where you can and keep up your fluids.",
    "Notice how you feel over the next day and jot down any changes.",
];

fn self_care_for(symptom_key: Option<&str>) -> &'static [&'static str] {
    match symptom_key {
        Some("headache") => &[
            "Drink a glass of water and rest somewhere quiet and dim for 20 minutes.",
            "Take a break from screens for a while.",
            "Loosen any tension in your neck and shoulders with a few slow rolls.",
        ],
        Some("nausea") | Some("vomiting") => &[
            "Take small, frequent sips of water or an oral rehydration drink.",
            "Once fluids stay down, try something bland like toast or crackers.",
            "Rest sitting up rather than lying flat.",
        ],
        Some("diarrhea") => &[
            "Keep sipping water or an oral rehydration drink through the day.",
            "Stick to plain, easy foods for now.",
            "Wash your hands well to avoid passing anything on.",
        ],
        Some("abdominal_pain") => &[
            "Rest and try a warm (not hot) pack on your stomach.",
            "Eat small, plain meals and skip anything greasy or spicy today.",
        ],
        Some("back_pain") | Some("joint_pain") => &[
            "Keep gently moving; short walks usually help more than bed rest.",
            "Try a warm pack for 15 to 20 minutes.",
            "Take breaks from sitting in one position.",
        ],
        Some("fever") => &[
            "Rest and keep up your fluids.",
            "Dress in light layers and keep the room comfortably cool.",
        ],
        Some("cough") | Some("sore_throat") => &[
            "Sip warm drinks; honey and lemon can soothe your throat.",
            "Rest your voice where you can.",
            "Stay home if you can to avoid passing it on.",
        ],
        Some("rash") => &[
            "Keep the area clean, dry and uncovered where possible.",
            "Try not to scratch; a cool compress can ease itching.",
            "Think back to anything new: soaps, foods, plants or medications.",
        ],
        Some("dizziness") => &[
            "Sit or lie down until it passes, and stand up slowly.",
            "Drink some water and have a small snack.",
        ],
        Some("fatigue") | Some("sleep_difficulty") => &[
            "Aim for a consistent bedtime tonight.",
            "Get some daylight and a short walk if you can.",
            "Keep caffeine to the morning.",
        ],
        Some("low_mood") | Some("anxiety") => &[
            "Try three slow breaths: in for four, out for six.",
            "Reach out to someone you trust today, even with a short message.",
            "Do one small thing you usually enjoy.",
        ],
        _ => DEFAULT_STEPS,
    }
}

fn closing_step(risk: RiskBand) -> GuidanceStep {
    let (text, kind) = match risk {
        RiskBand::Low => (
            "Check in with yourself again tomorrow and note any changes.",
            GuidanceKind::Monitor,
        ),
        RiskBand::Medium => (
            "If it isn't improving in the next 2 to 3 days, book in with your GP.",
            GuidanceKind::Monitor,
        ),
        RiskBand::High => (
            "Contact your GP today, or call healthdirect on 1800 022 222 for advice.",
            GuidanceKind::SeekCare,
        ),
        RiskBand::Urgent => ("Call 000 now.", GuidanceKind::SeekCare),
    };
    GuidanceStep {
        text: text.to_string(),
        kind,
    }
}

/// Number of self-care steps to show, before the closing step.
fn step_budget(friction: FrictionBand, level: Option<ComplexityLevel>) -> usize {
    let by_level = level.map_or(3, |l| l.max_steps());
    let by_friction = match friction {
        FrictionBand::Low => 3,
        FrictionBand::Medium => 2,
        FrictionBand::High => 1,
    };
    by_level.min(by_friction)
}

/// Ordered "what to do now" steps. Never empty.
pub fn guidance_steps(
    symptom_key: Option<&str>,
    risk: RiskBand,
    friction: FrictionBand,
    level: Option<ComplexityLevel>,
) -> Vec<GuidanceStep> {
    let budget = step_budget(friction, level);
    let mut steps: Vec<GuidanceStep> = self_care_for(symptom_key)
        .iter()
        .take(budget)
        .map(|text| GuidanceStep {
            text: match level {
                Some(l) => phrase_intention(text, l),
                None => (*text).to_string(),
            },
            kind: GuidanceKind::SelfCare,
        })
        .collect();
    steps.push(closing_step(risk));
    steps
}

/// Wrap a step as an implementation intention sized to the user's capacity.
pub fn phrase_intention(step: &str, level: ComplexityLevel) -> String {
    let step = lower_first(step.trim());
    match level {
        ComplexityLevel::Stable => format!("Pick a time today: {step}"),
        ComplexityLevel::Trying => format!("When you next get a quiet minute, {step}"),
        ComplexityLevel::Overloaded => format!("If you can, just this one: {step}"),
        ComplexityLevel::Survival => format!("Only if it feels possible: {step} Anything counts."),
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_end_with_closing_step() {
        let steps = guidance_steps(Some("headache"), RiskBand::Medium, FrictionBand::Low, None);
        assert_eq!(steps.len(), 4);
        let last = steps.last().unwrap();
        assert_eq!(last.kind, GuidanceKind::Monitor);
        assert!(last.text.contains("GP"));
    }

    #[test]
    fn high_risk_closes_with_seek_care() {
        let steps = guidance_steps(Some("fever"), RiskBand::High, FrictionBand::Low, None);
        assert_eq!(steps.last().unwrap().kind, GuidanceKind::SeekCare);
        assert!(steps.last().unwrap().text.contains("1800 022 222"));
    }

    #[test]
    fn unknown_symptom_uses_defaults() {
        let steps = guidance_steps(Some("toothache"), RiskBand::Low, FrictionBand::Low, None);
        assert_eq!(steps[0].text, DEFAULT_STEPS[0]);
        let none = guidance_steps(None, RiskBand::Low, FrictionBand::Low, None);
        assert_eq!(none.len(), DEFAULT_STEPS.len() + 1);
    }

    #[test]
    fn friction_and_level_shrink_the_list() {
        let high = guidance_steps(Some("headache"), RiskBand::Low, FrictionBand::High, None);
        assert_eq!(high.len(), 2);

        let survival = guidance_steps(
            Some("headache"),
            RiskBand::Low,
            FrictionBand::Low,
            Some(ComplexityLevel::Survival),
        );
        assert_eq!(survival.len(), 2);

        let overloaded = guidance_steps(
            Some("headache"),
            RiskBand::Low,
            FrictionBand::Medium,
            Some(ComplexityLevel::Overloaded),
        );
        assert_eq!(overloaded.len(), 3);
    }

    #[test]
    fn level_phrases_self_care_only() {
        let steps = guidance_steps(
            Some("dizziness"),
            RiskBand::Low,
            FrictionBand::Low,
            Some(ComplexityLevel::Trying),
        );
        assert!(steps[0].text.starts_with("When you next get a quiet minute, sit or lie down"));
        assert_eq!(
            steps.last().unwrap().text,
            "Check in with yourself again tomorrow and note any changes."
        );
    }

    #[test]
    fn phrase_intention_per_level() {
        let step = "Drink a glass of water.";
        assert_eq!(
            phrase_intention(step, ComplexityLevel::Stable),
            "Pick a time today: drink a glass of water."
        );
        assert_eq!(
            phrase_intention(step, ComplexityLevel::Overloaded),
            "If you can, just this one: drink a glass of water."
        );
        assert!(phrase_intention(step, ComplexityLevel::Survival).ends_with("Anything counts."));
    }

    #[test]
    fn lower_first_handles_empty() {
        assert_eq!(lower_first(""), "");
        assert_eq!(lower_first("Rest"), "rest");
    }
}
