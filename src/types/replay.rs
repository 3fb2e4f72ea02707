//! Replay envelopes, capture entries and replay reports

use serde::{Deserialize, Serialize};
use crate::types::{GesturePhase, LadderStage, Route, Sample, SealLevel};

// =============================================================================
// GESTURE ENVELOPE
// =============================================================================

/// Expected outcome recorded alongside a gesture trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureExpectation {
    pub phase: GesturePhase,
    pub winner: Route,
    pub score_a: f64,
    pub score_b: f64,
}

/// Versioned, source-tagged gesture trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureEnvelope {
    /// `<ns>.trace.v1`
    pub version: String,
    pub source: String,
    pub events: Vec<Sample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<GestureExpectation>,
}

// =============================================================================
// LADDER PAYLOAD
// =============================================================================

/// Supported ladder action types on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplayActionType {
    PointerStart,
    PointerFrame,
    PointerEnd,
    PointerCancel,
    ConfirmStep,
    CommitSeal,
    ResetSession,
}

impl ReplayActionType {
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::PointerStart => "POINTER_START",
            Self::PointerFrame => "POINTER_FRAME",
            Self::PointerEnd => "POINTER_END",
            Self::PointerCancel => "POINTER_CANCEL",
            Self::ConfirmStep => "CONFIRM_STEP",
            Self::CommitSeal => "COMMIT_SEAL",
            Self::ResetSession => "RESET_SESSION",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "POINTER_START" => Some(Self::PointerStart),
            "POINTER_FRAME" => Some(Self::PointerFrame),
            "POINTER_END" => Some(Self::PointerEnd),
            "POINTER_CANCEL" => Some(Self::PointerCancel),
            "CONFIRM_STEP" => Some(Self::ConfirmStep),
            "COMMIT_SEAL" => Some(Self::CommitSeal),
            "RESET_SESSION" => Some(Self::ResetSession),
            _ => None,
        }
    }
}

/// Wire form of one ladder action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayAction {
    #[serde(rename = "type")]
    pub action_type: ReplayActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Portable evidence-ladder replay payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LadderReplayPayload {
    pub version: u32,
    pub created_at_iso: String,
    pub route_id: String,
    pub constraint_digest: String,
    pub actions: Vec<ReplayAction>,
    pub expected_final_stage: LadderStage,
    pub expected_final_confidence: i32,
    pub expected_final_uncertainty: i32,
    pub expected_seal_level: SealLevel,
}

// =============================================================================
// CAPTURE
// =============================================================================

/// Outcome-relevant view of a state, before or after an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeState {
    pub phase: String,
    /// Winning score (gesture) or confidence (ladder)
    pub value: f64,
    /// Ladder uncertainty; 0 for gestures
    pub uncertainty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seal: Option<SealLevel>,
    pub accepted: bool,
    pub reason: String,
}

/// One captured, accepted action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayEntry<A> {
    pub index: usize,
    pub action: A,
    pub before: EnvelopeState,
    pub after: EnvelopeState,
}

// =============================================================================
// REPORTS
// =============================================================================

/// A divergence detected during replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mismatch {
    /// Action index, or the action count for final-state divergence
    pub index: usize,
    pub field: String,
    pub expected: String,
    pub actual: String,
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {}: expected {}, got {}",
            self.index, self.field, self.expected, self.actual
        )
    }
}

/// Result of re-driving a fresh reducer with a stored trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub total_actions: usize,
    pub applied: usize,
    pub rejected: usize,
    pub mismatches: Vec<Mismatch>,
    pub final_state: EnvelopeState,
    pub summary: String,
}

impl ReplayReport {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Typed outcome surfaced to callers (`ok: false` never panics or throws)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackResult {
    pub ok: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<ReplayReport>,
}

impl PlaybackResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            hash: None,
            report: None,
        }
    }

    pub fn from_report(hash: String, report: ReplayReport) -> Self {
        Self {
            ok: report.is_clean(),
            message: report.summary.clone(),
            hash: Some(hash),
            report: Some(report),
        }
    }
}
