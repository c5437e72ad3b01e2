use crate::models::{Factor, NextActionKind};
use crate::triage::rules::{red_flag_copy, SafetyLevel};
use crate::triage::vocabulary::effective_symptom_key;
use crate::triage::{FollowUpPlan, RoutingDecision, StateSnapshot};

use super::guidance::guidance_steps;
use super::types::{ResponseModel, ResponsePayload, SafetyNet, TransparencyInfo};

const FALLBACK_HEADLINE: &str = "Please get help now";
const FALLBACK_MESSAGE: &str = "Some of what you've described needs urgent care. Call 000.";

/// Optional inputs to [`build_response_model`].
#[derive(Debug, Clone, Default)]
pub struct ResponseOptions<'a> {
    /// Plan to show. Takes precedence over the plan on the routing decision.
    pub follow_up_plan: Option<FollowUpPlan>,
    /// Primary symptom from the extractor, used to pick guidance.
    pub symptom_key: Option<&'a str>,
}

impl<'a> ResponseOptions<'a> {
    pub fn with_plan(plan: FollowUpPlan) -> Self {
        Self {
            follow_up_plan: Some(plan),
            symptom_key: None,
        }
    }

    pub fn with_symptom_key(mut self, key: Option<&'a str>) -> Self {
        self.symptom_key = key;
        self
    }
}

/// Assemble the response for one triage pass.
///
/// Exactly one payload matching the snapshot's next action is populated.
/// A follow-up request with no plan available is downgraded to guidance
/// rather than shown as an empty question.
pub fn build_response_model(
    input_text: &str,
    snapshot: &StateSnapshot,
    routing: &RoutingDecision,
    transparency: TransparencyInfo,
    prior_factors: &[Factor],
    options: ResponseOptions<'_>,
) -> ResponseModel {
    if routing.mode != snapshot.next_action {
        tracing::warn!(
            event_id = %snapshot.event_id,
            snapshot = %snapshot.next_action,
            routing = %routing.mode,
            "Routing mode disagrees with snapshot, following snapshot"
        );
    }

    let level = transparency
        .session_profile_used
        .then_some(transparency.profile_level)
        .flatten();
    let guidance = || {
        let key = effective_symptom_key(prior_factors, options.symptom_key);
        ResponsePayload::Guidance(guidance_steps(
            key.as_deref(),
            snapshot.risk_band,
            snapshot.friction_band,
            level,
        ))
    };

    let payload = match snapshot.next_action {
        NextActionKind::SafetyNotice => ResponsePayload::Safety(safety_net(snapshot, routing)),
        NextActionKind::AskFollowup => {
            match options
                .follow_up_plan
                .clone()
                .or_else(|| routing.follow_up_plan.clone())
            {
                Some(plan) => ResponsePayload::FollowUp(plan),
                None => {
                    tracing::warn!(
                        event_id = %snapshot.event_id,
                        "Follow-up requested without a plan, giving guidance instead"
                    );
                    guidance()
                }
            }
        }
        NextActionKind::GiveGuidance => guidance(),
        NextActionKind::None => ResponsePayload::Idle,
    };

    let model = ResponseModel {
        event_id: snapshot.event_id,
        payload,
        what_matters: snapshot.what_matters.clone(),
        transparency,
        used_factors: snapshot.used_factors.clone(),
    };

    tracing::debug!(
        event_id = %model.event_id,
        mode = %model.mode(),
        input_len = input_text.len(),
        prior_factors = prior_factors.len(),
        "Response model built"
    );

    model
}

fn safety_net(snapshot: &StateSnapshot, routing: &RoutingDecision) -> SafetyNet {
    let copy = routing.red_flag_rule.and_then(red_flag_copy);
    let (level, headline, message) = match copy {
        Some((level, headline, message)) => (level, headline.to_string(), message.to_string()),
        None => (
            SafetyLevel::Emergency,
            FALLBACK_HEADLINE.to_string(),
            snapshot
                .safety_copy
                .clone()
                .unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
        ),
    };
    SafetyNet {
        rule_id: routing.red_flag_rule.map(str::to_string),
        level,
        headline,
        message,
        actions: level.actions().iter().map(|a| a.to_string()).collect(),
    }
}
