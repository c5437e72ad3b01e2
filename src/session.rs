//! Conversation layer around the triage core.
//!
//! A `TriageSession` owns one thread's accumulated factors, follow-up
//! counter and pending question. `SessionRegistry` hands out one mutex per
//! thread so two submissions for the same thread never interleave.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::models::{
    decode_factors, deserialize_lenient, ComplexityLevel, Factor, FactorCode, NextActionKind,
    RawFactor,
};
use crate::response::{build_response_model, ResponseModel, ResponseOptions, TransparencyInfo};
use crate::triage::vocabulary::normalize_symptom_key;
use crate::triage::{assess, FollowUpPlan, StateSnapshot, TriageInput};

// ═══════════════════════════════════════════════════════════
// Extraction boundary
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("Extractor unavailable: {0}")]
    Unavailable(String),
    #[error("Extractor returned malformed output: {0}")]
    Malformed(String),
}

/// Factors and primary symptom produced from one user turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub factors: Vec<Factor>,
    pub symptom_key: Option<String>,
}

impl Extraction {
    /// Chips picked straight from the vocabulary. The first specific
    /// symptom chip becomes the primary symptom.
    pub fn from_chips(codes: &[FactorCode]) -> Self {
        Self {
            factors: codes
                .iter()
                .map(|c| Factor::new(*c, config::confidence::CHIP))
                .collect(),
            symptom_key: codes
                .iter()
                .find_map(|c| c.symptom_key())
                .map(str::to_string),
        }
    }
}

/// Text-to-factor extraction, implemented outside this crate (on-device
/// model, remote service). Chip input bypasses it via [`Extraction::from_chips`].
pub trait FactorExtractor {
    fn extract(&self, input_text: &str) -> Result<Extraction, ExtractionError>;
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No follow-up question is pending")]
    NoPendingFollowUp,
    #[error("Choice {index} out of range ({available} choices)")]
    InvalidChoice { index: usize, available: usize },
    #[error("Session lock poisoned")]
    LockPoisoned,
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

// ═══════════════════════════════════════════════════════════
// TriageSession
// ═══════════════════════════════════════════════════════════

/// Serialisable session state for an external persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub thread_id: Uuid,
    pub factors: Vec<RawFactor>,
    #[serde(default)]
    pub symptom_key: Option<String>,
    #[serde(default)]
    pub follow_up_count: u32,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub profile: Option<ComplexityLevel>,
}

/// One conversation thread.
#[derive(Debug, Clone)]
pub struct TriageSession {
    thread_id: Uuid,
    factors: Vec<Factor>,
    symptom_key: Option<String>,
    follow_up_count: u32,
    pending_plan: Option<FollowUpPlan>,
    profile: Option<ComplexityLevel>,
    /// Factors were loaded from saved state rather than typed this session.
    restored: bool,
    last_snapshot: Option<StateSnapshot>,
}

impl TriageSession {
    pub fn new(thread_id: Uuid) -> Self {
        Self {
            thread_id,
            factors: Vec::new(),
            symptom_key: None,
            follow_up_count: 0,
            pending_plan: None,
            profile: None,
            restored: false,
            last_snapshot: None,
        }
    }

    /// Rebuild a session from saved state. Unknown factor codes are dropped.
    pub fn restore(state: SessionState) -> Self {
        let factors = decode_factors(state.factors);
        Self {
            thread_id: state.thread_id,
            restored: !factors.is_empty(),
            factors,
            symptom_key: state.symptom_key,
            follow_up_count: state.follow_up_count,
            pending_plan: None,
            profile: state.profile,
            last_snapshot: None,
        }
    }

    pub fn export_state(&self) -> SessionState {
        SessionState {
            thread_id: self.thread_id,
            factors: self.factors.iter().cloned().map(RawFactor::from).collect(),
            symptom_key: self.symptom_key.clone(),
            follow_up_count: self.follow_up_count,
            profile: self.profile,
        }
    }

    pub fn thread_id(&self) -> Uuid {
        self.thread_id
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    pub fn symptom_key(&self) -> Option<&str> {
        self.symptom_key.as_deref()
    }

    pub fn follow_up_count(&self) -> u32 {
        self.follow_up_count
    }

    pub fn pending_plan(&self) -> Option<&FollowUpPlan> {
        self.pending_plan.as_ref()
    }

    pub fn last_snapshot(&self) -> Option<&StateSnapshot> {
        self.last_snapshot.as_ref()
    }

    /// Complexity level used only for phrasing guidance.
    pub fn set_profile(&mut self, level: Option<ComplexityLevel>) {
        self.profile = level;
    }

    /// Start the thread over, keeping its id and profile.
    pub fn reset(&mut self) {
        self.factors.clear();
        self.symptom_key = None;
        self.follow_up_count = 0;
        self.pending_plan = None;
        self.restored = false;
        self.last_snapshot = None;
    }

    /// Append a new turn's factors and run a triage pass.
    ///
    /// A new submission supersedes any pending question.
    pub fn submit(&mut self, input_text: &str, extraction: Extraction) -> ResponseModel {
        self.factors.extend(extraction.factors);
        if let Some(key) = extraction.symptom_key.as_deref().and_then(normalize_symptom_key) {
            self.symptom_key = Some(key);
        }
        self.pending_plan = None;
        self.run(input_text)
    }

    /// Extract factors from free text, then submit them.
    pub fn submit_text(
        &mut self,
        extractor: &dyn FactorExtractor,
        input_text: &str,
    ) -> Result<ResponseModel, SessionError> {
        let extraction = extractor.extract(input_text)?;
        Ok(self.submit(input_text, extraction))
    }

    /// Apply the chosen answer to the pending question and run a new pass.
    pub fn select_choice(&mut self, index: usize) -> Result<ResponseModel, SessionError> {
        let plan = self
            .pending_plan
            .take()
            .ok_or(SessionError::NoPendingFollowUp)?;
        let Some(choice) = plan.choices.get(index) else {
            let available = plan.choices.len();
            self.pending_plan = Some(plan);
            return Err(SessionError::InvalidChoice { index, available });
        };

        self.factors
            .extend(choice.writes_factors.iter().map(|w| w.to_factor()));
        if self.symptom_key.is_none() {
            self.symptom_key = choice
                .writes_factors
                .iter()
                .find_map(|w| w.code.symptom_key())
                .map(str::to_string);
        }

        tracing::info!(
            thread_id = %self.thread_id,
            kind = plan.kind.as_str(),
            writes = choice.writes_factors.len(),
            "Follow-up answered"
        );

        let label = choice.label.clone();
        Ok(self.run(&label))
    }

    fn run(&mut self, input_text: &str) -> ResponseModel {
        let input = TriageInput::new(input_text, &self.factors)
            .with_symptom_key(self.symptom_key.as_deref())
            .with_follow_up_count(self.follow_up_count);
        let outcome = assess(&input);

        let transparency =
            TransparencyInfo::with_profile(self.profile).with_saved_context(self.restored);
        let options = ResponseOptions::default().with_symptom_key(self.symptom_key.as_deref());
        let model = build_response_model(
            input_text,
            &outcome.snapshot,
            &outcome.routing,
            transparency,
            &self.factors,
            options,
        );

        if model.mode() == NextActionKind::AskFollowup {
            self.follow_up_count += 1;
            self.pending_plan = model.follow_up_plan().cloned();
        }
        self.last_snapshot = Some(outcome.snapshot);
        model
    }
}

// ═══════════════════════════════════════════════════════════
// SessionRegistry
// ═══════════════════════════════════════════════════════════

/// Sessions keyed by thread id, one lock per thread.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, Arc<Mutex<TriageSession>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Arc<Mutex<TriageSession>>>>, SessionError> {
        self.sessions.lock().map_err(|_| SessionError::LockPoisoned)
    }

    /// The session for `thread_id`, created empty on first use.
    pub fn session(&self, thread_id: Uuid) -> Result<Arc<Mutex<TriageSession>>, SessionError> {
        let mut map = self.map()?;
        Ok(map
            .entry(thread_id)
            .or_insert_with(|| Arc::new(Mutex::new(TriageSession::new(thread_id))))
            .clone())
    }

    /// Run `f` with exclusive access to one thread's session.
    pub fn with_session<R>(
        &self,
        thread_id: Uuid,
        f: impl FnOnce(&mut TriageSession) -> R,
    ) -> Result<R, SessionError> {
        let session = self.session(thread_id)?;
        let mut guard = session.lock().map_err(|_| SessionError::LockPoisoned)?;
        Ok(f(&mut guard))
    }

    /// Load saved state, replacing any live session for the same thread.
    pub fn restore(&self, state: SessionState) -> Result<(), SessionError> {
        let thread_id = state.thread_id;
        let session = TriageSession::restore(state);
        self.map()?
            .insert(thread_id, Arc::new(Mutex::new(session)));
        Ok(())
    }

    /// Drop a session, returning its final state for persistence.
    pub fn remove(&self, thread_id: Uuid) -> Result<Option<SessionState>, SessionError> {
        let Some(session) = self.map()?.remove(&thread_id) else {
            return Ok(None);
        };
        let guard = session.lock().map_err(|_| SessionError::LockPoisoned)?;
        Ok(Some(guard.export_state()))
    }

    pub fn len(&self) -> Result<usize, SessionError> {
        Ok(self.map()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, SessionError> {
        Ok(self.map()?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FrictionBand, RiskBand};
    use crate::triage::FollowUpKind;

    struct FixedExtractor(Result<Extraction, ExtractionError>);

    impl FactorExtractor for FixedExtractor {
        fn extract(&self, _input_text: &str) -> Result<Extraction, ExtractionError> {
            self.0.clone()
        }
    }

    fn choice_index(plan: &FollowUpPlan, label: &str) -> usize {
        plan.choices
            .iter()
            .position(|c| c.label == label)
            .expect("choice label should exist")
    }

    #[test]
    fn from_chips_sets_symptom_and_confidence() {
        let ex = Extraction::from_chips(&[FactorCode::ConstraintTime, FactorCode::SymptomCough]);
        assert_eq!(ex.factors.len(), 2);
        assert!(ex.factors.iter().all(|f| f.confidence() == 1.0));
        assert_eq!(ex.symptom_key.as_deref(), Some("cough"));

        let none = Extraction::from_chips(&[FactorCode::SymptomUnspecified]);
        assert!(none.symptom_key.is_none());
    }

    #[test]
    fn ask_then_select_then_guidance() {
        let mut session = TriageSession::new(Uuid::new_v4());
        let first = session.submit(
            "my head hurts",
            Extraction::from_chips(&[FactorCode::SymptomHeadache]),
        );
        assert_eq!(first.mode(), NextActionKind::AskFollowup);
        assert_eq!(session.follow_up_count(), 1);
        let plan = session.pending_plan().unwrap().clone();
        assert_eq!(plan.kind, FollowUpKind::Duration);

        let second = session.select_choice(choice_index(&plan, "Today")).unwrap();
        // Low risk after one question: no second question.
        assert_eq!(second.mode(), NextActionKind::GiveGuidance);
        assert!(session.pending_plan().is_none());
        assert_eq!(session.follow_up_count(), 1);
        assert!(session
            .factors()
            .iter()
            .any(|f| f.code() == FactorCode::DurationToday));
        assert!(!second.what_to_do_now().is_empty());
    }

    #[test]
    fn high_risk_thread_asks_at_most_two() {
        let mut session = TriageSession::new(Uuid::new_v4());
        let first = session.submit("", Extraction::from_chips(&[FactorCode::SymptomChestPain]));
        assert_eq!(first.mode(), NextActionKind::AskFollowup);
        let plan = session.pending_plan().unwrap().clone();

        let second = session.select_choice(choice_index(&plan, "Today")).unwrap();
        assert_eq!(second.mode(), NextActionKind::AskFollowup);
        assert_eq!(session.follow_up_count(), 2);
        let plan = session.pending_plan().unwrap().clone();
        assert_eq!(plan.kind, FollowUpKind::Severity);

        let third = session.select_choice(choice_index(&plan, "Skip")).unwrap();
        assert_eq!(third.mode(), NextActionKind::GiveGuidance);
        assert_eq!(session.follow_up_count(), 2);
        assert_eq!(session.last_snapshot().unwrap().risk_band, RiskBand::High);
    }

    #[test]
    fn red_flag_mid_thread_forces_safety() {
        let mut session = TriageSession::new(Uuid::new_v4());
        session.submit("", Extraction::from_chips(&[FactorCode::SymptomHeadache]));
        assert!(session.pending_plan().is_some());

        let model = session.submit("I fainted", Extraction::from_chips(&[FactorCode::RedFlagFainting]));
        assert_eq!(model.mode(), NextActionKind::SafetyNotice);
        assert!(session.pending_plan().is_none());
        assert!(matches!(
            session.select_choice(0),
            Err(SessionError::NoPendingFollowUp)
        ));
    }

    #[test]
    fn invalid_choice_keeps_pending_plan() {
        let mut session = TriageSession::new(Uuid::new_v4());
        session.submit("", Extraction::from_chips(&[FactorCode::SymptomRash]));
        let err = session.select_choice(99).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidChoice { index: 99, available: 5 }
        ));
        assert!(session.pending_plan().is_some());
    }

    #[test]
    fn symptom_clarify_choice_sets_symptom_key() {
        let mut session = TriageSession::new(Uuid::new_v4());
        session.submit(
            "",
            Extraction::from_chips(&[
                FactorCode::SymptomUnspecified,
                FactorCode::DurationFewDays,
                FactorCode::SeverityMild,
                FactorCode::TrendStable,
            ]),
        );
        let plan = session.pending_plan().unwrap().clone();
        assert_eq!(plan.kind, FollowUpKind::SymptomClarify);

        let index = plan
            .choices
            .iter()
            .position(|c| !c.writes_nothing())
            .unwrap();
        session.select_choice(index).unwrap();
        assert!(session.symptom_key().is_some());
    }

    #[test]
    fn submit_text_propagates_extractor_errors() {
        let mut session = TriageSession::new(Uuid::new_v4());
        let broken = FixedExtractor(Err(ExtractionError::Unavailable("model not loaded".into())));
        let err = session.submit_text(&broken, "hello").unwrap_err();
        assert!(matches!(err, SessionError::Extraction(ExtractionError::Unavailable(_))));
        assert!(session.factors().is_empty());

        let working = FixedExtractor(Ok(Extraction {
            factors: vec![Factor::new(FactorCode::SymptomSoreThroat, 0.8)],
            symptom_key: Some("Sore Throat".into()),
        }));
        let model = session.submit_text(&working, "scratchy throat").unwrap();
        assert_eq!(model.mode(), NextActionKind::AskFollowup);
        assert_eq!(session.symptom_key(), Some("sore_throat"));
    }

    #[test]
    fn export_and_restore_round_trip_through_json() {
        let mut session = TriageSession::new(Uuid::new_v4());
        session.set_profile(Some(ComplexityLevel::Overloaded));
        session.submit(
            "",
            Extraction::from_chips(&[FactorCode::SymptomHeadache, FactorCode::ConstraintEnergy]),
        );
        let json = serde_json::to_string(&session.export_state()).unwrap();
        let restored = TriageSession::restore(serde_json::from_str(&json).unwrap());
        assert_eq!(restored.thread_id(), session.thread_id());
        assert_eq!(restored.factors(), session.factors());
        assert_eq!(restored.follow_up_count(), 1);
        assert!(restored.pending_plan().is_none());
    }

    #[test]
    fn restore_ignores_unknown_codes_and_discloses_saved_context() {
        let json = r#"{
            "thread_id": "4f1c2d3e-0000-4000-8000-000000000001",
            "factors": [
                {"code": "symptom_headache", "confidence": 0.9},
                {"code": "symptom_from_a_newer_app", "confidence": 0.9},
                {"code": "duration_few_days", "confidence": 0.95}
            ]
        }"#;
        let state: SessionState = serde_json::from_str(json).unwrap();
        let mut session = TriageSession::restore(state);
        assert_eq!(session.factors().len(), 2);

        let model = session.submit("", Extraction::default());
        assert!(model.transparency.saved_context_used);
        assert_eq!(model.mode(), NextActionKind::AskFollowup);
    }

    #[test]
    fn unknown_profile_keeps_the_rest_of_the_state() {
        let json = r#"{
            "thread_id": "4f1c2d3e-0000-4000-8000-000000000002",
            "factors": [{"code": "symptom_headache", "confidence": 0.9}],
            "symptom_key": "headache",
            "follow_up_count": 1,
            "profile": "burnt_out"
        }"#;
        let state: SessionState = serde_json::from_str(json).unwrap();
        assert!(state.profile.is_none());
        assert_eq!(state.follow_up_count, 1);

        let session = TriageSession::restore(state);
        assert_eq!(session.factors().len(), 1);
        assert_eq!(session.symptom_key(), Some("headache"));
    }

    #[test]
    fn reset_clears_thread_but_keeps_profile() {
        let mut session = TriageSession::new(Uuid::new_v4());
        session.set_profile(Some(ComplexityLevel::Trying));
        session.submit("", Extraction::from_chips(&[FactorCode::SymptomCough]));
        session.reset();
        assert!(session.factors().is_empty());
        assert_eq!(session.follow_up_count(), 0);
        let model = session.submit("", Extraction::default());
        assert_eq!(model.mode(), NextActionKind::None);
        assert_eq!(model.transparency.profile_level, Some(ComplexityLevel::Trying));
    }

    #[test]
    fn friction_reaches_the_snapshot() {
        let mut session = TriageSession::new(Uuid::new_v4());
        session.submit(
            "exhausted",
            Extraction::from_chips(&[
                FactorCode::ConstraintTime,
                FactorCode::ContextCaringDuties,
            ]),
        );
        assert_eq!(
            session.last_snapshot().unwrap().friction_band,
            FrictionBand::High
        );
    }

    // ── Registry ───────────────────────────────────────────────

    #[test]
    fn registry_creates_and_removes_sessions() {
        let registry = SessionRegistry::new();
        let id = Uuid::new_v4();
        assert!(registry.is_empty().unwrap());

        let mode = registry
            .with_session(id, |s| {
                s.submit("", Extraction::from_chips(&[FactorCode::SymptomFever]))
                    .mode()
            })
            .unwrap();
        assert_eq!(mode, NextActionKind::AskFollowup);
        assert_eq!(registry.len().unwrap(), 1);

        let state = registry.remove(id).unwrap().unwrap();
        assert_eq!(state.follow_up_count, 1);
        assert!(registry.remove(id).unwrap().is_none());
    }

    #[test]
    fn registry_restore_replaces_session() {
        let registry = SessionRegistry::new();
        let id = Uuid::new_v4();
        registry
            .with_session(id, |s| {
                s.submit("", Extraction::from_chips(&[FactorCode::SymptomFever]));
            })
            .unwrap();
        registry
            .restore(SessionState {
                thread_id: id,
                factors: vec![],
                symptom_key: None,
                follow_up_count: 0,
                profile: None,
            })
            .unwrap();
        let count = registry.with_session(id, |s| s.factors().len()).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn concurrent_submissions_on_one_thread_are_serialised() {
        let registry = SessionRegistry::new();
        let id = Uuid::new_v4();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    registry
                        .with_session(id, |s| {
                            s.submit("", Extraction::from_chips(&[FactorCode::SymptomChestPain]));
                        })
                        .unwrap();
                });
            }
        });
        let (factors, asked) = registry
            .with_session(id, |s| (s.factors().len(), s.follow_up_count()))
            .unwrap();
        assert_eq!(factors, 8);
        assert!(asked <= config::MAX_FOLLOWUPS_PER_THREAD);
    }
}
