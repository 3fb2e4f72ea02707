//! Gesture FSM: pure reducer for the gesture-scoring variant
//!
//! State transitions:
//! - IDLE → AIMING: pointer down
//! - AIMING → WEIGHING: travel ≥ MOVE_THRESHOLD
//! - WEIGHING → COMMITTED: pointer up
//! - COMMITTED → RESOLVED: resolve
//! - RESOLVED → AIMING: pointer down (fresh trace)
//! - AIMING/WEIGHING → IDLE: cancel, or release before threshold

use serde::{Deserialize, Serialize};
use crate::core::metrics::compute_metrics;
use crate::core::scoring::GestureModel;
use crate::core::transition::Transition;
use crate::types::{GestureMetrics, GesturePhase, ReasonCode, Sample, ScoreSnapshot};
use crate::MOVE_THRESHOLD;

/// Complete gesture session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureState {
    pub phase: GesturePhase,
    /// Pointer that owns the open gesture
    pub active_pointer: Option<i64>,
    /// Trace of the current gesture
    pub samples: Vec<Sample>,
    pub metrics: GestureMetrics,
    pub score: Option<ScoreSnapshot>,
    /// Phase after every accepted transition
    pub history: Vec<GesturePhase>,
    /// Accepted transition count
    pub transitions: u64,
    pub last_reason: ReasonCode,
    /// Highest sequence number accepted since the last reset
    pub last_seq: Option<u64>,
}

impl GestureState {
    /// Canonical initial state
    pub fn initial() -> Self {
        Self {
            phase: GesturePhase::Idle,
            active_pointer: None,
            samples: Vec::new(),
            metrics: GestureMetrics::zero(),
            score: None,
            history: vec![GesturePhase::Idle],
            transitions: 0,
            last_reason: ReasonCode::R008_SESSION_RESET,
            last_seq: None,
        }
    }
}

impl Default for GestureState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Actions accepted by the gesture reducer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum GestureAction {
    PointerDown(Sample),
    PointerMove(Sample),
    PointerUp(Sample),
    PointerCancel { pointer_id: i64 },
    Resolve,
    Reset,
    /// Wholesale state replacement (system bookkeeping, never captured)
    Hydrate(Box<GestureState>),
}

impl GestureAction {
    /// Should this action be captured in the replay log?
    pub fn is_capturable(&self) -> bool {
        !matches!(self, GestureAction::Hydrate(_))
    }

    /// Action for a sample, by its pointer kind
    pub fn from_sample(sample: Sample) -> Self {
        use crate::types::PointerKind;
        match sample.kind() {
            PointerKind::Down => GestureAction::PointerDown(sample),
            PointerKind::Move => GestureAction::PointerMove(sample),
            PointerKind::Up => GestureAction::PointerUp(sample),
            PointerKind::Cancel => GestureAction::PointerCancel {
                pointer_id: sample.pointer_id(),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GestureAction::PointerDown(_) => "pointer_down",
            GestureAction::PointerMove(_) => "pointer_move",
            GestureAction::PointerUp(_) => "pointer_up",
            GestureAction::PointerCancel { .. } => "pointer_cancel",
            GestureAction::Resolve => "resolve",
            GestureAction::Reset => "reset",
            GestureAction::Hydrate(_) => "hydrate",
        }
    }
}

/// Apply one action. Total and deterministic.
pub fn reduce(
    model: &GestureModel,
    state: &GestureState,
    action: &GestureAction,
) -> Transition<GestureState> {
    match action {
        GestureAction::PointerDown(sample) => pointer_down(model, state, sample),
        GestureAction::PointerMove(sample) => pointer_move(model, state, sample),
        GestureAction::PointerUp(sample) => pointer_up(model, state, sample),
        GestureAction::PointerCancel { pointer_id } => pointer_cancel(state, *pointer_id),
        GestureAction::Resolve => resolve(state),
        GestureAction::Reset => {
            let mut next = GestureState::initial();
            next.history = state.history.clone();
            next.transitions = state.transitions;
            accept(next, ReasonCode::R008_SESSION_RESET)
        }
        GestureAction::Hydrate(replacement) => {
            let mut next = (**replacement).clone();
            next.last_reason = ReasonCode::R009_STATE_HYDRATED;
            Transition::accepted(next, ReasonCode::R009_STATE_HYDRATED)
        }
    }
}

fn pointer_down(model: &GestureModel, state: &GestureState, sample: &Sample) -> Transition<GestureState> {
    match state.phase {
        GesturePhase::Idle | GesturePhase::Resolved => {}
        GesturePhase::Aiming | GesturePhase::Weighing => {
            return Transition::rejected(state, ReasonCode::R102_GESTURE_ALREADY_ACTIVE);
        }
        GesturePhase::Committed => {
            return Transition::rejected(state, ReasonCode::R103_PHASE_REJECTS_ACTION);
        }
    }
    if is_stale(state, sample) {
        return Transition::rejected(state, ReasonCode::R105_STALE_SEQUENCE);
    }

    let mut next = state.clone();
    next.phase = GesturePhase::Aiming;
    next.active_pointer = Some(sample.pointer_id());
    next.samples = vec![sample.clone()];
    next.last_seq = Some(sample.seq());
    rescore(model, &mut next);
    accept(next, ReasonCode::R001_GESTURE_STARTED)
}

fn pointer_move(model: &GestureModel, state: &GestureState, sample: &Sample) -> Transition<GestureState> {
    if let Some(reason) = guard_open_gesture(state, sample.pointer_id()) {
        return Transition::rejected(state, reason);
    }
    if is_stale(state, sample) {
        return Transition::rejected(state, ReasonCode::R105_STALE_SEQUENCE);
    }

    let mut next = state.clone();
    next.samples.push(sample.clone());
    next.last_seq = Some(sample.seq());
    rescore(model, &mut next);

    let reason = if next.phase == GesturePhase::Aiming && next.metrics.travel >= MOVE_THRESHOLD {
        next.phase = GesturePhase::Weighing;
        ReasonCode::R003_WEIGHING_STARTED
    } else {
        ReasonCode::R002_SAMPLE_ACCEPTED
    };
    accept(next, reason)
}

fn pointer_up(model: &GestureModel, state: &GestureState, sample: &Sample) -> Transition<GestureState> {
    if let Some(reason) = guard_open_gesture(state, sample.pointer_id()) {
        return Transition::rejected(state, reason);
    }
    if is_stale(state, sample) {
        return Transition::rejected(state, ReasonCode::R105_STALE_SEQUENCE);
    }

    let mut next = state.clone();
    next.active_pointer = None;
    next.last_seq = Some(sample.seq());
    next.samples.push(sample.clone());
    rescore(model, &mut next);

    if next.metrics.travel < MOVE_THRESHOLD {
        // never crossed the threshold: a tap, not a decision
        next.phase = GesturePhase::Idle;
        next.samples.clear();
        next.metrics = GestureMetrics::zero();
        next.score = None;
        return accept(next, ReasonCode::R005_GESTURE_TAPPED);
    }

    next.phase = GesturePhase::Committed;
    accept(next, ReasonCode::R004_GESTURE_COMMITTED)
}

fn pointer_cancel(state: &GestureState, pointer_id: i64) -> Transition<GestureState> {
    if let Some(reason) = guard_open_gesture(state, pointer_id) {
        return Transition::rejected(state, reason);
    }

    let mut next = state.clone();
    next.phase = GesturePhase::Idle;
    next.active_pointer = None;
    next.samples.clear();
    next.metrics = GestureMetrics::zero();
    next.score = None;
    accept(next, ReasonCode::R006_GESTURE_CANCELLED)
}

fn resolve(state: &GestureState) -> Transition<GestureState> {
    if state.phase != GesturePhase::Committed {
        return Transition::rejected(state, ReasonCode::R103_PHASE_REJECTS_ACTION);
    }
    let mut next = state.clone();
    next.phase = GesturePhase::Resolved;
    accept(next, ReasonCode::R007_OUTCOME_RESOLVED)
}

/// Rejection reason for move/up/cancel, if any
fn guard_open_gesture(state: &GestureState, pointer_id: i64) -> Option<ReasonCode> {
    if !state.phase.is_open() {
        return Some(ReasonCode::R104_NO_ACTIVE_GESTURE);
    }
    if state.active_pointer != Some(pointer_id) {
        return Some(ReasonCode::R101_POINTER_MISMATCH);
    }
    None
}

fn is_stale(state: &GestureState, sample: &Sample) -> bool {
    state.last_seq.map_or(false, |last| sample.seq() <= last)
}

fn rescore(model: &GestureModel, state: &mut GestureState) {
    state.metrics = compute_metrics(&state.samples);
    state.score = Some(model.score(&state.metrics));
}

fn accept(mut next: GestureState, reason: ReasonCode) -> Transition<GestureState> {
    next.history.push(next.phase);
    next.transitions += 1;
    next.last_reason = reason;
    Transition::accepted(next, reason)
}

// =============================================================================
// TESTS
// =============================================================================
