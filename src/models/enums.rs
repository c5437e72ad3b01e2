use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a wire string falls outside a closed vocabulary.
///
/// Only `FromStr` returns this. Triage itself treats unknown codes as
/// absent and never surfaces the error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VocabularyError {
    #[error("Unknown factor code: {0}")]
    UnknownCode(String),

    #[error("Invalid {field} value: {value}")]
    InvalidEnum { field: String, value: String },
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = VocabularyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(VocabularyError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(ComplexityDomain {
    SymptomsBodySignals => "symptoms_body_signals",
    Duration => "duration",
    Severity => "severity",
    Trend => "trend",
    Context => "context",
    ResourceConstraints => "resource_constraints",
    Strength => "strength",
    Medical => "medical",
    Behaviour => "behaviour",
    Pattern => "pattern",
    RedFlag => "red_flag",
});

str_enum!(TimeHorizon {
    Acute => "acute",
    Chronic => "chronic",
});

// Band enums are declared low to high; derived `Ord` follows declaration order.

str_enum!(RiskBand {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

str_enum!(FrictionBand {
    Low => "low",
    Medium => "medium",
    High => "high",
});

str_enum!(UncertaintyBand {
    Low => "low",
    Medium => "medium",
    High => "high",
});

str_enum!(NextActionKind {
    AskFollowup => "ask_followup",
    GiveGuidance => "give_guidance",
    SafetyNotice => "safety_notice",
    None => "none",
});

str_enum!(Intent {
    Ask => "ask",
    Journal => "journal",
});

str_enum!(ComplexityLevel {
    Stable => "stable",
    Trying => "trying",
    Overloaded => "overloaded",
    Survival => "survival",
});

str_enum!(FactorCode {
    // Symptoms / body signals
    SymptomHeadache => "symptom_headache",
    SymptomChestPain => "symptom_chest_pain",
    SymptomAbdominalPain => "symptom_abdominal_pain",
    SymptomBackPain => "symptom_back_pain",
    SymptomJointPain => "symptom_joint_pain",
    SymptomNausea => "symptom_nausea",
    SymptomVomiting => "symptom_vomiting",
    SymptomDiarrhea => "symptom_diarrhea",
    SymptomFever => "symptom_fever",
    SymptomCough => "symptom_cough",
    SymptomSoreThroat => "symptom_sore_throat",
    SymptomBreathlessness => "symptom_breathlessness",
    SymptomDizziness => "symptom_dizziness",
    SymptomFatigue => "symptom_fatigue",
    SymptomRash => "symptom_rash",
    SymptomLowMood => "symptom_low_mood",
    SymptomAnxiety => "symptom_anxiety",
    SymptomSleepDifficulty => "symptom_sleep_difficulty",
    SymptomUnspecified => "symptom_unspecified",
    // Duration
    DurationToday => "duration_today",
    DurationFewDays => "duration_few_days",
    DurationWeekPlus => "duration_week_plus",
    // Severity
    SeverityMild => "severity_mild",
    SeverityModerate => "severity_moderate",
    SeveritySevere => "severity_severe",
    // Trend
    TrendImproving => "trend_improving",
    TrendWorsening => "trend_worsening",
    TrendStable => "trend_stable",
    // Context / triggers
    TriggerInjury => "trigger_injury",
    TriggerNewMedication => "trigger_new_medication",
    TriggerIllness => "trigger_illness",
    ContextWorkStress => "context_work_stress",
    ContextCaringDuties => "context_caring_duties",
    // Resource constraints
    ConstraintTime => "constraint_time",
    ConstraintMoney => "constraint_money",
    ConstraintEnergy => "constraint_energy",
    ConstraintAccess => "constraint_access",
    // Strengths
    StrengthSupportNetwork => "strength_support_network",
    StrengthRoutine => "strength_routine",
    StrengthMotivation => "strength_motivation",
    // Medical mentions
    MedicalConditionMention => "medical_condition_mention",
    MedicalMedicationMention => "medical_medication_mention",
    MedicalPregnancy => "medical_pregnancy",
    // Behaviours
    BehaviourPoorSleep => "behaviour_poor_sleep",
    BehaviourSkippedMeals => "behaviour_skipped_meals",
    BehaviourLowHydration => "behaviour_low_hydration",
    // Patterns
    PatternRecurring => "pattern_recurring",
    PatternTimeOfDay => "pattern_time_of_day",
    // Red flags
    RedFlagFainting => "red_flag_fainting",
    RedFlagConfusion => "red_flag_confusion",
    RedFlagSelfHarm => "red_flag_self_harm",
    RedFlagBleeding => "red_flag_bleeding",
    RedFlagSeizure => "red_flag_seizure",
    RedFlagStrokeSigns => "red_flag_stroke_signs",
});

impl FactorCode {
    /// Domain the code is grouped under. Fixed per code.
    pub fn domain(&self) -> ComplexityDomain {
        use FactorCode::*;
        match self {
            SymptomHeadache | SymptomChestPain | SymptomAbdominalPain | SymptomBackPain
            | SymptomJointPain | SymptomNausea | SymptomVomiting | SymptomDiarrhea
            | SymptomFever | SymptomCough | SymptomSoreThroat | SymptomBreathlessness
            | SymptomDizziness | SymptomFatigue | SymptomRash | SymptomLowMood
            | SymptomAnxiety | SymptomSleepDifficulty | SymptomUnspecified => {
                ComplexityDomain::SymptomsBodySignals
            }
            DurationToday | DurationFewDays | DurationWeekPlus => ComplexityDomain::Duration,
            SeverityMild | SeverityModerate | SeveritySevere => ComplexityDomain::Severity,
            TrendImproving | TrendWorsening | TrendStable => ComplexityDomain::Trend,
            TriggerInjury | TriggerNewMedication | TriggerIllness | ContextWorkStress
            | ContextCaringDuties => ComplexityDomain::Context,
            ConstraintTime | ConstraintMoney | ConstraintEnergy | ConstraintAccess => {
                ComplexityDomain::ResourceConstraints
            }
            StrengthSupportNetwork | StrengthRoutine | StrengthMotivation => {
                ComplexityDomain::Strength
            }
            MedicalConditionMention | MedicalMedicationMention | MedicalPregnancy => {
                ComplexityDomain::Medical
            }
            BehaviourPoorSleep | BehaviourSkippedMeals | BehaviourLowHydration => {
                ComplexityDomain::Behaviour
            }
            PatternRecurring | PatternTimeOfDay => ComplexityDomain::Pattern,
            RedFlagFainting | RedFlagConfusion | RedFlagSelfHarm | RedFlagBleeding
            | RedFlagSeizure | RedFlagStrokeSigns => ComplexityDomain::RedFlag,
        }
    }

    /// Acute/chronic tag carried by duration codes.
    pub fn time_horizon(&self) -> Option<TimeHorizon> {
        match self {
            Self::DurationToday | Self::DurationFewDays => Some(TimeHorizon::Acute),
            Self::DurationWeekPlus => Some(TimeHorizon::Chronic),
            _ => None,
        }
    }

    /// Primary symptom key for specific symptom codes.
    /// `SymptomUnspecified` has a body signal but no identity yet.
    pub fn symptom_key(&self) -> Option<&'static str> {
        use FactorCode::*;
        match self {
            SymptomHeadache => Some("headache"),
            SymptomChestPain => Some("chest_pain"),
            SymptomAbdominalPain => Some("abdominal_pain"),
            SymptomBackPain => Some("back_pain"),
            SymptomJointPain => Some("joint_pain"),
            SymptomNausea => Some("nausea"),
            SymptomVomiting => Some("vomiting"),
            SymptomDiarrhea => Some("diarrhea"),
            SymptomFever => Some("fever"),
            SymptomCough => Some("cough"),
            SymptomSoreThroat => Some("sore_throat"),
            SymptomBreathlessness => Some("breathlessness"),
            SymptomDizziness => Some("dizziness"),
            SymptomFatigue => Some("fatigue"),
            SymptomRash => Some("rash"),
            SymptomLowMood => Some("low_mood"),
            SymptomAnxiety => Some("anxiety"),
            SymptomSleepDifficulty => Some("sleep_difficulty"),
            _ => None,
        }
    }

    /// Patient-facing phrase used in "what matters" and transparency copy.
    pub fn label(&self) -> &'static str {
        use FactorCode::*;
        match self {
            SymptomHeadache => "headache",
            SymptomChestPain => "chest pain",
            SymptomAbdominalPain => "stomach pain",
            SymptomBackPain => "back pain",
            SymptomJointPain => "joint or muscle pain",
            SymptomNausea => "feeling sick",
            SymptomVomiting => "vomiting",
            SymptomDiarrhea => "diarrhoea",
            SymptomFever => "fever",
            SymptomCough => "cough",
            SymptomSoreThroat => "sore throat",
            SymptomBreathlessness => "shortness of breath",
            SymptomDizziness => "dizziness",
            SymptomFatigue => "tiredness",
            SymptomRash => "rash",
            SymptomLowMood => "low mood",
            SymptomAnxiety => "anxiety",
            SymptomSleepDifficulty => "trouble sleeping",
            SymptomUnspecified => "feeling unwell",
            DurationToday => "started today",
            DurationFewDays => "going on for a few days",
            DurationWeekPlus => "going on for a week or more",
            SeverityMild => "affecting you a little",
            SeverityModerate => "affecting you quite a bit",
            SeveritySevere => "affecting you a lot",
            TrendImproving => "getting better",
            TrendWorsening => "getting worse",
            TrendStable => "about the same",
            TriggerInjury => "after an injury",
            TriggerNewMedication => "after starting a new medication",
            TriggerIllness => "after being unwell",
            ContextWorkStress => "pressure at work",
            ContextCaringDuties => "caring for others",
            ConstraintTime => "short on time",
            ConstraintMoney => "cost is a concern",
            ConstraintEnergy => "low on energy",
            ConstraintAccess => "hard to get to a GP",
            StrengthSupportNetwork => "people around you",
            StrengthRoutine => "a routine that works",
            StrengthMotivation => "wanting to make a change",
            MedicalConditionMention => "an existing health condition",
            MedicalMedicationMention => "a medication you take",
            MedicalPregnancy => "pregnancy",
            BehaviourPoorSleep => "not much sleep",
            BehaviourSkippedMeals => "skipped meals",
            BehaviourLowHydration => "not drinking much",
            PatternRecurring => "it keeps coming back",
            PatternTimeOfDay => "it happens at a certain time of day",
            RedFlagFainting => "fainting",
            RedFlagConfusion => "confusion",
            RedFlagSelfHarm => "thoughts of harming yourself",
            RedFlagBleeding => "bleeding",
            RedFlagSeizure => "a seizure",
            RedFlagStrokeSigns => "signs of a stroke",
        }
    }

    /// All codes belonging to a domain, in vocabulary order.
    pub fn in_domain(domain: ComplexityDomain) -> impl Iterator<Item = FactorCode> {
        Self::ALL.iter().copied().filter(move |c| c.domain() == domain)
    }

    /// Parse a wire code, reporting unknown values as `UnknownCode`.
    pub fn parse_code(s: &str) -> Result<Self, VocabularyError> {
        s.trim()
            .parse::<Self>()
            .map_err(|_| VocabularyError::UnknownCode(s.to_string()))
    }
}

impl ComplexityLevel {
    /// Most self-care steps worth suggesting at this level.
    pub fn max_steps(&self) -> usize {
        match self {
            Self::Stable | Self::Trying => 3,
            Self::Overloaded => 2,
            Self::Survival => 1,
        }
    }
}
