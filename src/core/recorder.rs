//! Replay recorder
//!
//! Captures every accepted, capturable action with before/after snapshots and
//! counts dispatch outcomes.

use serde::Serialize;
use crate::core::gesture_fsm::GestureState;
use crate::core::ladder_fsm::LadderState;
use crate::types::{EnvelopeState, ReasonCode, ReplayEntry, ReplayReadout};

/// States that can be summarized into an envelope snapshot
pub trait EnvelopeView {
    fn envelope(&self, accepted: bool, reason: ReasonCode) -> EnvelopeState;
}

impl EnvelopeView for GestureState {
    fn envelope(&self, accepted: bool, reason: ReasonCode) -> EnvelopeState {
        EnvelopeState {
            phase: self.phase.as_str().to_string(),
            value: self.score.as_ref().map_or(0.0, |s| s.winning_score()),
            uncertainty: 0.0,
            seal: None,
            accepted,
            reason: reason.code().to_string(),
        }
    }
}

impl EnvelopeView for LadderState {
    fn envelope(&self, accepted: bool, reason: ReasonCode) -> EnvelopeState {
        EnvelopeState {
            phase: self.stage.as_str().to_string(),
            value: f64::from(self.confidence.confidence),
            uncertainty: f64::from(self.confidence.uncertainty),
            seal: Some(self.confidence.seal),
            accepted,
            reason: reason.code().to_string(),
        }
    }
}

/// Append-only capture of accepted actions
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayRecorder<A> {
    entries: Vec<ReplayEntry<A>>,
    accepted: u64,
    rejected: u64,
    last_status: String,
    last_message: String,
}

impl<A: Clone> Default for ReplayRecorder<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Clone> ReplayRecorder<A> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            accepted: 0,
            rejected: 0,
            last_status: "idle".to_string(),
            last_message: String::new(),
        }
    }

    /// Record an accepted action
    pub fn record(&mut self, action: A, before: EnvelopeState, after: EnvelopeState) {
        self.accepted += 1;
        self.last_status = "accepted".to_string();
        self.last_message = after.reason.clone();
        let index = self.entries.len();
        self.entries.push(ReplayEntry { index, action, before, after });
    }

    /// Count an accepted action that is not captured (hydration)
    pub fn note_uncaptured(&mut self, reason: ReasonCode) {
        self.accepted += 1;
        self.last_status = "accepted".to_string();
        self.last_message = reason.code().to_string();
    }

    pub fn note_rejected(&mut self, reason: ReasonCode) {
        self.rejected += 1;
        self.last_status = "rejected".to_string();
        self.last_message = reason.to_string();
        tracing::debug!("Rejected action: {}", reason);
    }

    pub fn entries(&self) -> &[ReplayEntry<A>] {
        &self.entries
    }

    /// Captured actions in order
    pub fn actions(&self) -> Vec<A> {
        self.entries.iter().map(|e| e.action.clone()).collect()
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    pub fn readout(&self) -> ReplayReadout {
        ReplayReadout {
            captured: self.entries.len(),
            accepted: self.accepted,
            rejected: self.rejected,
            last_status: self.last_status.clone(),
            last_message: self.last_message.clone(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

// =============================================================================
// TESTS
// =============================================================================
