//! Stateful sessions around the pure reducers
//!
//! A session owns a model, the current state and a replay recorder. Every
//! input (live or replayed) goes through `dispatch`, so replay exercises the
//! same path as interaction.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use crate::core::confidence::LadderModel;
use crate::core::gesture_fsm::{self, GestureAction, GestureState};
use crate::core::ladder_fsm::{self, LadderAction, LadderState};
use crate::core::recorder::{EnvelopeView, ReplayRecorder};
use crate::core::scoring::GestureModel;
use crate::error::{Error, Result};
use crate::types::{
    GestureEnvelope, GestureExpectation, GesturePhase, LadderReplayPayload, ReasonCode, Sample,
};
use crate::LADDER_PAYLOAD_VERSION;

/// Outcome of one dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispatched {
    pub accepted: bool,
    pub reason: ReasonCode,
    /// Reason of an automatic follow-up action, if one ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<ReasonCode>,
}

// =============================================================================
// GESTURE SESSION
// =============================================================================

/// Gesture-scoring session
#[derive(Debug, Clone)]
pub struct GestureSession {
    model: GestureModel,
    state: GestureState,
    recorder: ReplayRecorder<GestureAction>,
    /// Accepted pointer samples since the last reset
    trace: Vec<Sample>,
}

impl GestureSession {
    pub fn new(model: GestureModel) -> Self {
        Self {
            model,
            state: GestureState::initial(),
            recorder: ReplayRecorder::new(),
            trace: Vec::new(),
        }
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn model(&self) -> &GestureModel {
        &self.model
    }

    pub fn recorder(&self) -> &ReplayRecorder<GestureAction> {
        &self.recorder
    }

    pub fn trace(&self) -> &[Sample] {
        &self.trace
    }

    /// Dispatch a pointer sample as the matching action
    pub fn dispatch_sample(&mut self, sample: Sample) -> Dispatched {
        let action = GestureAction::from_sample(sample.clone());
        let result = self.dispatch(action);
        if result.accepted {
            self.trace.push(sample);
        }
        result
    }

    /// Dispatch one action; an accepted commit is followed by `Resolve`
    pub fn dispatch(&mut self, action: GestureAction) -> Dispatched {
        let reason = self.apply(action.clone());
        let accepted = reason.is_accepted();

        if accepted && matches!(action, GestureAction::Reset) {
            self.trace.clear();
        }

        let follow_up = if accepted && self.state.phase == GesturePhase::Committed {
            let resolved = self.apply(GestureAction::Resolve);
            if let Some(score) = &self.state.score {
                info!(
                    "Gesture resolved: {} ({:.2} vs {:.2})",
                    score.winner, score.score_a, score.score_b
                );
            }
            Some(resolved)
        } else {
            None
        };

        Dispatched { accepted, reason, follow_up }
    }

    fn apply(&mut self, action: GestureAction) -> ReasonCode {
        let transition = gesture_fsm::reduce(&self.model, &self.state, &action);
        if !transition.accepted {
            debug!("gesture {} rejected: {}", action.name(), transition.reason);
            self.recorder.note_rejected(transition.reason);
            return transition.reason;
        }

        if action.is_capturable() {
            let before = self.state.envelope(true, self.state.last_reason);
            let after = transition.state.envelope(true, transition.reason);
            self.recorder.record(action, before, after);
        } else {
            self.recorder.note_uncaptured(transition.reason);
        }
        self.state = transition.state;
        transition.reason
    }

    /// Versioned envelope of the current trace
    ///
    /// The expectation is filled in once the gesture has resolved.
    pub fn export(&self, version: &str, source: &str) -> GestureEnvelope {
        let expect = match (&self.state.phase, &self.state.score) {
            (GesturePhase::Resolved, Some(score)) => Some(GestureExpectation {
                phase: GesturePhase::Resolved,
                winner: score.winner,
                score_a: score.score_a,
                score_b: score.score_b,
            }),
            _ => None,
        };
        GestureEnvelope {
            version: version.to_string(),
            source: source.to_string(),
            events: self.trace.clone(),
            expect,
        }
    }
}

// =============================================================================
// LADDER SESSION
// =============================================================================

/// Evidence-ladder session
#[derive(Debug, Clone)]
pub struct LadderSession {
    model: LadderModel,
    state: LadderState,
    recorder: ReplayRecorder<LadderAction>,
}

impl LadderSession {
    pub fn new(model: LadderModel, route_id: &str) -> Result<Self> {
        let state = LadderState::initial(&model, route_id)
            .ok_or_else(|| Error::InvalidInput(format!("unknown route '{}'", route_id)))?;
        info!("Ladder session opened on route {}", route_id);
        Ok(Self {
            model,
            state,
            recorder: ReplayRecorder::new(),
        })
    }

    pub fn state(&self) -> &LadderState {
        &self.state
    }

    pub fn model(&self) -> &LadderModel {
        &self.model
    }

    pub fn recorder(&self) -> &ReplayRecorder<LadderAction> {
        &self.recorder
    }

    pub fn dispatch(&mut self, action: LadderAction) -> Dispatched {
        let transition = ladder_fsm::reduce(&self.model, &self.state, &action);
        let reason = transition.reason;
        if !transition.accepted {
            debug!("ladder {} rejected: {}", action.name(), reason);
            self.recorder.note_rejected(reason);
            return Dispatched { accepted: false, reason, follow_up: None };
        }

        if action.is_capturable() {
            let before = self.state.envelope(true, self.state.last_reason);
            let after = transition.state.envelope(true, reason);
            self.recorder.record(action, before, after);
        } else {
            self.recorder.note_uncaptured(reason);
        }
        self.state = transition.state;

        match reason {
            ReasonCode::R014_STEP_REVEALED => info!(
                "Step revealed on {}: confidence {} uncertainty {}",
                self.state.route_id, self.state.confidence.confidence, self.state.confidence.uncertainty
            ),
            ReasonCode::R015_SESSION_SEALED => info!("Ladder sealed on {}", self.state.route_id),
            _ => {}
        }

        Dispatched { accepted: true, reason, follow_up: None }
    }

    /// Portable payload of everything captured so far
    pub fn build_payload(&self, created_at_iso: &str) -> LadderReplayPayload {
        let actions = self
            .recorder
            .entries()
            .iter()
            .filter_map(|entry| entry.action.to_replay(Some(&entry.after.reason)))
            .collect();
        LadderReplayPayload {
            version: LADDER_PAYLOAD_VERSION,
            created_at_iso: created_at_iso.to_string(),
            route_id: self.state.route_id.clone(),
            constraint_digest: self.model.constraint_digest(),
            actions,
            expected_final_stage: self.state.stage,
            expected_final_confidence: self.state.confidence.confidence,
            expected_final_uncertainty: self.state.confidence.uncertainty,
            expected_seal_level: self.state.confidence.seal,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LadderStage, PointerKind, Route};

    fn samples(points: &[(f64, f64)]) -> Vec<Sample> {
        let last = points.len() - 1;
        points
            .iter()
            .enumerate()
            .map(|(i, (x, y))| {
                let kind = match i {
                    0 => PointerKind::Down,
                    i if i == last => PointerKind::Up,
                    _ => PointerKind::Move,
                };
                Sample::new(kind, i as u64 + 1, *x, *y, 1, "stage")
            })
            .collect()
    }

    #[test]
    fn test_commit_auto_resolves() {
        let mut session = GestureSession::new(GestureModel::standard());
        let mut last = None;
        for sample in samples(&[(0.74, 0.62), (0.40, 0.40), (0.12, 0.20)]) {
            last = Some(session.dispatch_sample(sample));
        }
        let last = last.unwrap();
        assert_eq!(last.reason, ReasonCode::R004_GESTURE_COMMITTED);
        assert_eq!(last.follow_up, Some(ReasonCode::R007_OUTCOME_RESOLVED));
        assert_eq!(session.state().phase, GesturePhase::Resolved);
        assert_eq!(session.state().score.as_ref().unwrap().winner, Route::A);
        assert_eq!(session.trace().len(), 3);
        assert_eq!(session.recorder().entries().len(), 4);
    }

    #[test]
    fn test_rejected_sample_not_traced() {
        let mut session = GestureSession::new(GestureModel::standard());
        let stray = Sample::new(PointerKind::Move, 1, 0.5, 0.5, 1, "stage");
        let result = session.dispatch_sample(stray);
        assert!(!result.accepted);
        assert!(session.trace().is_empty());
        assert_eq!(session.recorder().rejected(), 1);
    }

    #[test]
    fn test_export_carries_expectation() {
        let mut session = GestureSession::new(GestureModel::standard());
        for sample in samples(&[(0.2, 0.2), (0.5, 0.5), (0.8, 0.8)]) {
            session.dispatch_sample(sample);
        }
        let envelope = session.export("decisim.trace.v1", "gesture-scorer");
        assert_eq!(envelope.events.len(), 3);
        assert!(envelope.expect.is_some());
    }

    #[test]
    fn test_ladder_payload_records_actions() {
        let mut session = LadderSession::new(LadderModel::standard(), "proof-first").unwrap();
        session.dispatch(LadderAction::PointerStart { pointer_id: 1 });
        session.dispatch(LadderAction::PointerFrame { pointer_id: 1, ratio: 1.0 });
        session.dispatch(LadderAction::PointerEnd { pointer_id: 1 });
        session.dispatch(LadderAction::ConfirmStep { step_id: "benchmark".into() });
        let rejected = session.dispatch(LadderAction::CommitSeal);
        assert!(!rejected.accepted);

        let payload = session.build_payload("2026-01-01T00:00:00Z");
        assert_eq!(payload.actions.len(), 4);
        assert_eq!(payload.expected_final_stage, LadderStage::Step1);
        assert_eq!(payload.actions[3].reason.as_deref(), Some("R014_STEP_REVEALED"));
    }

    #[test]
    fn test_unknown_route_rejected() {
        assert!(LadderSession::new(LadderModel::standard(), "guesswork").is_err());
    }
}
