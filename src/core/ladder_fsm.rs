//! Ladder FSM: pure reducer for the evidence-ladder variant
//!
//! Stage follows the number of revealed steps (IDLE → STEP_1 → STEP_2 → STEP_3)
//! and SEALED is entered only through an explicit commit. A press-and-hold on
//! the next card arms it; confirming reveals it.

use serde::{Deserialize, Serialize};
use crate::core::confidence::LadderModel;
use crate::core::transition::Transition;
use crate::error::ReplayLoadError;
use crate::types::{
    ConfidenceSnapshot, LadderStage, ReasonCode, ReplayAction, ReplayActionType, SealLevel,
};
use crate::{clamp01, round4, ARM_RATIO};

/// An in-flight press-and-hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldState {
    pub pointer_id: i64,
    pub ratio: f64,
}

/// Complete ladder session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LadderState {
    pub route_id: String,
    /// Revealed step ids, in ladder order
    pub revealed: Vec<String>,
    pub stage: LadderStage,
    pub hold: Option<HoldState>,
    /// Next step fully held and ready to confirm
    pub armed: bool,
    pub confidence: ConfidenceSnapshot,
    pub history: Vec<LadderStage>,
    pub transitions: u64,
    pub last_reason: ReasonCode,
}

impl LadderState {
    /// Canonical initial state for a route; None if the route is unknown
    pub fn initial(model: &LadderModel, route_id: &str) -> Option<Self> {
        let confidence = model.evaluate(route_id, 0)?;
        Some(Self {
            route_id: route_id.to_string(),
            revealed: Vec::new(),
            stage: LadderStage::Idle,
            hold: None,
            armed: false,
            confidence,
            history: vec![LadderStage::Idle],
            transitions: 0,
            last_reason: ReasonCode::R008_SESSION_RESET,
        })
    }

    pub fn seal(&self) -> SealLevel {
        self.confidence.seal
    }

    pub fn is_sealed(&self) -> bool {
        self.stage == LadderStage::Sealed
    }

    /// Current hold ratio, 0 when nothing is held
    pub fn hold_ratio(&self) -> f64 {
        if self.armed {
            return 1.0;
        }
        self.hold.as_ref().map_or(0.0, |h| h.ratio)
    }
}

/// Actions accepted by the ladder reducer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LadderAction {
    PointerStart { pointer_id: i64 },
    PointerFrame { pointer_id: i64, ratio: f64 },
    PointerEnd { pointer_id: i64 },
    PointerCancel { pointer_id: i64 },
    ConfirmStep { step_id: String },
    CommitSeal,
    ResetSession,
    /// Wholesale state replacement (system bookkeeping, never captured)
    Hydrate { state: Box<LadderState> },
}

impl LadderAction {
    pub fn is_capturable(&self) -> bool {
        !matches!(self, LadderAction::Hydrate { .. })
    }

    pub fn name(&self) -> &'static str {
        match self.action_type() {
            Some(kind) => kind.wire_name(),
            None => "HYDRATE",
        }
    }

    fn action_type(&self) -> Option<ReplayActionType> {
        let kind = match self {
            LadderAction::PointerStart { .. } => ReplayActionType::PointerStart,
            LadderAction::PointerFrame { .. } => ReplayActionType::PointerFrame,
            LadderAction::PointerEnd { .. } => ReplayActionType::PointerEnd,
            LadderAction::PointerCancel { .. } => ReplayActionType::PointerCancel,
            LadderAction::ConfirmStep { .. } => ReplayActionType::ConfirmStep,
            LadderAction::CommitSeal => ReplayActionType::CommitSeal,
            LadderAction::ResetSession => ReplayActionType::ResetSession,
            LadderAction::Hydrate { .. } => return None,
        };
        Some(kind)
    }

    /// Wire form; None for non-capturable actions
    pub fn to_replay(&self, reason: Option<&str>) -> Option<ReplayAction> {
        let action_type = self.action_type()?;
        let mut action = ReplayAction {
            action_type,
            step_id: None,
            pointer_id: None,
            ratio: None,
            reason: reason.map(str::to_string),
        };
        match self {
            LadderAction::PointerStart { pointer_id }
            | LadderAction::PointerEnd { pointer_id }
            | LadderAction::PointerCancel { pointer_id } => {
                action.pointer_id = Some(*pointer_id);
            }
            LadderAction::PointerFrame { pointer_id, ratio } => {
                action.pointer_id = Some(*pointer_id);
                action.ratio = Some(*ratio);
            }
            LadderAction::ConfirmStep { step_id } => action.step_id = Some(step_id.clone()),
            _ => {}
        }
        Some(action)
    }

    /// Decode a wire action, checking the fields its type requires
    pub fn from_replay(index: usize, action: &ReplayAction) -> Result<Self, ReplayLoadError> {
        let pointer = || {
            action
                .pointer_id
                .ok_or(ReplayLoadError::MissingField { index, field: "pointerId" })
        };
        let decoded = match action.action_type {
            ReplayActionType::PointerStart => LadderAction::PointerStart { pointer_id: pointer()? },
            ReplayActionType::PointerFrame => LadderAction::PointerFrame {
                pointer_id: pointer()?,
                ratio: action
                    .ratio
                    .ok_or(ReplayLoadError::MissingField { index, field: "ratio" })?,
            },
            ReplayActionType::PointerEnd => LadderAction::PointerEnd { pointer_id: pointer()? },
            ReplayActionType::PointerCancel => LadderAction::PointerCancel { pointer_id: pointer()? },
            ReplayActionType::ConfirmStep => LadderAction::ConfirmStep {
                step_id: action
                    .step_id
                    .clone()
                    .ok_or(ReplayLoadError::MissingField { index, field: "stepId" })?,
            },
            ReplayActionType::CommitSeal => LadderAction::CommitSeal,
            ReplayActionType::ResetSession => LadderAction::ResetSession,
        };
        Ok(decoded)
    }
}

/// Apply one action. Total and deterministic.
pub fn reduce(model: &LadderModel, state: &LadderState, action: &LadderAction) -> Transition<LadderState> {
    if let LadderAction::Hydrate { state: replacement } = action {
        let mut next = (**replacement).clone();
        next.last_reason = ReasonCode::R009_STATE_HYDRATED;
        return Transition::accepted(next, ReasonCode::R009_STATE_HYDRATED);
    }
    if let LadderAction::ResetSession = action {
        return reset(model, state);
    }
    if state.is_sealed() {
        return Transition::rejected(state, ReasonCode::R110_SESSION_SEALED);
    }

    match action {
        LadderAction::PointerStart { pointer_id } => pointer_start(model, state, *pointer_id),
        LadderAction::PointerFrame { pointer_id, ratio } => pointer_frame(state, *pointer_id, *ratio),
        LadderAction::PointerEnd { pointer_id } => pointer_end(state, *pointer_id),
        LadderAction::PointerCancel { pointer_id } => pointer_cancel(state, *pointer_id),
        LadderAction::ConfirmStep { step_id } => confirm_step(model, state, step_id),
        LadderAction::CommitSeal => commit_seal(state),
        LadderAction::ResetSession | LadderAction::Hydrate { .. } => {
            Transition::rejected(state, ReasonCode::R103_PHASE_REJECTS_ACTION)
        }
    }
}

fn reset(model: &LadderModel, state: &LadderState) -> Transition<LadderState> {
    match LadderState::initial(model, &state.route_id) {
        Some(mut next) => {
            next.history = state.history.clone();
            next.transitions = state.transitions;
            accept(next, ReasonCode::R008_SESSION_RESET)
        }
        None => Transition::rejected(state, ReasonCode::R108_UNKNOWN_STEP),
    }
}

fn pointer_start(model: &LadderModel, state: &LadderState, pointer_id: i64) -> Transition<LadderState> {
    if let Some(hold) = &state.hold {
        let reason = if hold.pointer_id == pointer_id {
            ReasonCode::R102_GESTURE_ALREADY_ACTIVE
        } else {
            ReasonCode::R101_POINTER_MISMATCH
        };
        return Transition::rejected(state, reason);
    }
    if state.revealed.len() >= model.steps().len() {
        // nothing left to arm
        return Transition::rejected(state, ReasonCode::R103_PHASE_REJECTS_ACTION);
    }

    let mut next = state.clone();
    next.hold = Some(HoldState { pointer_id, ratio: 0.0 });
    next.armed = false;
    accept(next, ReasonCode::R010_HOLD_STARTED)
}

fn pointer_frame(state: &LadderState, pointer_id: i64, ratio: f64) -> Transition<LadderState> {
    if let Some(reason) = guard_hold(state, pointer_id) {
        return Transition::rejected(state, reason);
    }
    let mut next = state.clone();
    next.hold = Some(HoldState {
        pointer_id,
        ratio: round4(clamp01(ratio)),
    });
    accept(next, ReasonCode::R011_HOLD_PROGRESS)
}

fn pointer_end(state: &LadderState, pointer_id: i64) -> Transition<LadderState> {
    if let Some(reason) = guard_hold(state, pointer_id) {
        return Transition::rejected(state, reason);
    }
    let ratio = state.hold_ratio();
    let mut next = state.clone();
    next.hold = None;
    if ratio >= ARM_RATIO {
        next.armed = true;
        accept(next, ReasonCode::R012_STEP_ARMED)
    } else {
        accept(next, ReasonCode::R013_HOLD_RELEASED)
    }
}

fn pointer_cancel(state: &LadderState, pointer_id: i64) -> Transition<LadderState> {
    if let Some(reason) = guard_hold(state, pointer_id) {
        return Transition::rejected(state, reason);
    }
    let mut next = state.clone();
    next.hold = None;
    accept(next, ReasonCode::R006_GESTURE_CANCELLED)
}

fn confirm_step(model: &LadderModel, state: &LadderState, step_id: &str) -> Transition<LadderState> {
    let position = match model.step_position(step_id) {
        Some(position) => position,
        None => return Transition::rejected(state, ReasonCode::R108_UNKNOWN_STEP),
    };
    if state.revealed.iter().any(|id| id == step_id) {
        return Transition::rejected(state, ReasonCode::R107_STEP_ALREADY_REVEALED);
    }
    if position != state.revealed.len() + 1 {
        return Transition::rejected(state, ReasonCode::R106_STEP_OUT_OF_ORDER);
    }

    let confidence = match model.evaluate(&state.route_id, position) {
        Some(snapshot) => snapshot,
        None => return Transition::rejected(state, ReasonCode::R103_PHASE_REJECTS_ACTION),
    };

    let mut next = state.clone();
    next.revealed.push(step_id.to_string());
    next.stage = LadderStage::from_revealed(next.revealed.len());
    next.hold = None;
    next.armed = false;
    next.confidence = confidence;
    accept(next, ReasonCode::R014_STEP_REVEALED)
}

fn commit_seal(state: &LadderState) -> Transition<LadderState> {
    if state.stage != LadderStage::Step3 || state.seal() != SealLevel::Sealed {
        return Transition::rejected(state, ReasonCode::R109_SEAL_NOT_READY);
    }
    let mut next = state.clone();
    next.stage = LadderStage::Sealed;
    next.hold = None;
    next.armed = false;
    accept(next, ReasonCode::R015_SESSION_SEALED)
}

fn guard_hold(state: &LadderState, pointer_id: i64) -> Option<ReasonCode> {
    match &state.hold {
        None => Some(ReasonCode::R104_NO_ACTIVE_GESTURE),
        Some(hold) if hold.pointer_id != pointer_id => Some(ReasonCode::R101_POINTER_MISMATCH),
        Some(_) => None,
    }
}

fn accept(mut next: LadderState, reason: ReasonCode) -> Transition<LadderState> {
    next.history.push(next.stage);
    next.transitions += 1;
    next.last_reason = reason;
    Transition::accepted(next, reason)
}

// =============================================================================
// TESTS
// =============================================================================
