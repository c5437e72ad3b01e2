use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ComplexityLevel, FactorCode, NextActionKind};
use crate::triage::rules::SafetyLevel;
use crate::triage::FollowUpPlan;

/// Role of a guidance step in the "what to do now" list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceKind {
    SelfCare,
    Monitor,
    SeekCare,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidanceStep {
    pub text: String,
    pub kind: GuidanceKind,
}

/// Safety copy shown instead of guidance when risk is urgent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyNet {
    pub rule_id: Option<String>,
    pub level: SafetyLevel,
    pub headline: String,
    pub message: String,
    pub actions: Vec<String>,
}

/// What informed the decision, disclosed to the user as "what I'm using".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransparencyInfo {
    /// Factors saved from earlier turns or sessions were part of the input.
    pub saved_context_used: bool,
    /// A complexity level for this session shaped the wording.
    pub session_profile_used: bool,
    pub profile_level: Option<ComplexityLevel>,
}

impl TransparencyInfo {
    pub fn with_profile(level: Option<ComplexityLevel>) -> Self {
        Self {
            saved_context_used: false,
            session_profile_used: level.is_some(),
            profile_level: level,
        }
    }

    pub fn with_saved_context(mut self, used: bool) -> Self {
        self.saved_context_used = used;
        self
    }

    /// Plain-language lines for the "what I'm using" panel.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec!["What you've told me in this conversation".to_string()];
        if self.saved_context_used {
            lines.push("Details you shared earlier".to_string());
        }
        if let (true, Some(level)) = (self.session_profile_used, self.profile_level) {
            lines.push(format!("How much you have on right now ({level})"));
        }
        lines
    }
}

/// The single payload a response carries. One variant per mode, so only
/// one payload can ever be populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "payload")]
pub enum ResponsePayload {
    #[serde(rename = "ask_followup")]
    FollowUp(FollowUpPlan),
    #[serde(rename = "give_guidance")]
    Guidance(Vec<GuidanceStep>),
    #[serde(rename = "safety_notice")]
    Safety(SafetyNet),
    #[serde(rename = "none")]
    Idle,
}

/// The decision object handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseModel {
    pub event_id: Uuid,
    #[serde(flatten)]
    pub payload: ResponsePayload,
    pub what_matters: Vec<String>,
    pub transparency: TransparencyInfo,
    pub used_factors: Vec<FactorCode>,
}

impl ResponseModel {
    pub fn mode(&self) -> NextActionKind {
        match self.payload {
            ResponsePayload::FollowUp(_) => NextActionKind::AskFollowup,
            ResponsePayload::Guidance(_) => NextActionKind::GiveGuidance,
            ResponsePayload::Safety(_) => NextActionKind::SafetyNotice,
            ResponsePayload::Idle => NextActionKind::None,
        }
    }

    pub fn follow_up_plan(&self) -> Option<&FollowUpPlan> {
        match &self.payload {
            ResponsePayload::FollowUp(plan) => Some(plan),
            _ => None,
        }
    }

    /// Empty unless the mode is `GiveGuidance`.
    pub fn what_to_do_now(&self) -> &[GuidanceStep] {
        match &self.payload {
            ResponsePayload::Guidance(steps) => steps,
            _ => &[],
        }
    }

    pub fn safety_net(&self) -> Option<&SafetyNet> {
        match &self.payload {
            ResponsePayload::Safety(net) => Some(net),
            _ => None,
        }
    }

    /// How many payload fields are populated.
    ///
    /// 1 for every mode except `None`, which is deliberately empty: it is
    /// only produced when there is nothing to respond to yet.
    pub fn populated_payloads(&self) -> usize {
        [
            self.follow_up_plan().is_some(),
            !self.what_to_do_now().is_empty(),
            self.safety_net().is_some(),
        ]
        .iter()
        .filter(|b| **b)
        .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(payload: ResponsePayload) -> ResponseModel {
        ResponseModel {
            event_id: Uuid::nil(),
            payload,
            what_matters: vec![],
            transparency: TransparencyInfo::default(),
            used_factors: vec![],
        }
    }

    #[test]
    fn guidance_payload_serializes_with_mode_tag() {
        let m = model(ResponsePayload::Guidance(vec![GuidanceStep {
            text: "Rest".into(),
            kind: GuidanceKind::SelfCare,
        }]));
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["mode"], "give_guidance");
        assert_eq!(json["payload"][0]["kind"], "self_care");
    }

    #[test]
    fn idle_has_no_payload() {
        let m = model(ResponsePayload::Idle);
        assert_eq!(m.mode(), NextActionKind::None);
        assert_eq!(m.populated_payloads(), 0);
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["mode"], "none");
    }

    #[test]
    fn transparency_lines_reflect_sources() {
        let info = TransparencyInfo::with_profile(Some(ComplexityLevel::Overloaded))
            .with_saved_context(true);
        let lines = info.lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("overloaded"));

        let bare = TransparencyInfo::default();
        assert_eq!(bare.lines().len(), 1);
    }
}
