//! View-model selectors
//!
//! Pure projections from session state to what the presentation layer draws.

use crate::core::confidence::LadderModel;
use crate::core::gesture_fsm::GestureState;
use crate::core::ladder_fsm::LadderState;
use crate::core::recorder::ReplayRecorder;
use crate::types::{
    CardState, CriterionRow, GestureView, LadderStage, LadderView, ReplayReadout, Route,
    ScoreBreakdown, ScoreSnapshot, SealLevel, StepCard,
};
use crate::{clamp01, round4, MOVE_THRESHOLD};

/// Rows closer than this are shown as neutral
const NEUTRAL_DELTA: f64 = 0.05;

pub fn score_breakdown(score: &ScoreSnapshot) -> ScoreBreakdown {
    let rows = score
        .contributions
        .iter()
        .map(|c| {
            let delta = c.delta();
            let favors = if delta > NEUTRAL_DELTA {
                Some(Route::A)
            } else if delta < -NEUTRAL_DELTA {
                Some(Route::B)
            } else {
                None
            };
            CriterionRow {
                id: c.criterion_id.clone(),
                label: c.label.clone(),
                weight: c.weight,
                emphasis: c.emphasis,
                to_a: c.to_a,
                to_b: c.to_b,
                favors,
            }
        })
        .collect();

    let total = score.score_a + score.score_b;
    let balance = if total > 0.0 { round4(score.score_a / total) } else { 0.5 };

    ScoreBreakdown {
        score_a: score.score_a,
        score_b: score.score_b,
        balance,
        winner: score.winner,
        winner_label: score.winner.label().to_string(),
        tie: score.tie,
        rows,
        reasons: score.reasons.clone(),
    }
}

pub fn gesture_view(state: &GestureState) -> GestureView {
    let certainty = state
        .score
        .as_ref()
        .map_or_else(|| state.metrics.certainty(), |s| s.certainty);
    GestureView {
        phase: state.phase,
        sample_count: state.samples.len(),
        transitions: state.transitions,
        last_reason: state.last_reason.code().to_string(),
        arming_ratio: round4(clamp01(state.metrics.travel / MOVE_THRESHOLD)),
        certainty,
        breakdown: state.score.as_ref().map(score_breakdown),
    }
}

/// One card per ladder step
pub fn step_cards(model: &LadderModel, state: &LadderState) -> Vec<StepCard> {
    let revealed = state.revealed.len();
    let sealed = state.stage == LadderStage::Sealed;

    model
        .steps()
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let effect = state.confidence.effects.get(index);
            let (card, progress) = if index < revealed {
                let card = if sealed { CardState::Locked } else { CardState::Revealed };
                (card, 1.0)
            } else if index == revealed {
                if state.armed {
                    (CardState::Armed, 1.0)
                } else if let Some(hold) = &state.hold {
                    (CardState::InProgress, hold.ratio)
                } else {
                    (CardState::Pending, 0.0)
                }
            } else {
                (CardState::Disabled, 0.0)
            };
            StepCard {
                step_id: step.id.clone(),
                label: step.label.clone(),
                state: card,
                progress,
                gain: effect.map(|e| e.gain),
                drop: effect.map(|e| e.drop),
            }
        })
        .collect()
}

pub fn ladder_view(model: &LadderModel, state: &LadderState) -> LadderView {
    let snapshot = &state.confidence;
    let total = model.steps().len().max(1);
    LadderView {
        route_id: state.route_id.clone(),
        route_label: model
            .route(&state.route_id)
            .map(|r| r.label.clone())
            .unwrap_or_else(|| state.route_id.clone()),
        stage: state.stage,
        confidence: snapshot.confidence,
        uncertainty: snapshot.uncertainty,
        band: snapshot.band,
        seal: snapshot.seal,
        grade: snapshot.grade,
        progress: round4(state.revealed.len() as f64 / total as f64),
        cards: step_cards(model, state),
        can_commit: state.stage == LadderStage::Step3 && snapshot.seal == SealLevel::Sealed,
        transitions: state.transitions,
        last_reason: state.last_reason.code().to_string(),
    }
}

pub fn replay_readout<A: Clone>(recorder: &ReplayRecorder<A>) -> ReplayReadout {
    recorder.readout()
}

// =============================================================================
// TESTS
// =============================================================================
