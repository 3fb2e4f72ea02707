//! Reason codes for reducer decisions
//!
//! Every transition, accepted or rejected, carries one of these. The code
//! string is the machine-readable reason surfaced to callers and stored in
//! replay logs.

use serde::{Deserialize, Serialize};

/// Reason codes for all transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // R0xx: Accepted
    // =========================================================================
    /// Gesture started
    R001_GESTURE_STARTED,
    /// Sample appended, phase unchanged
    R002_SAMPLE_ACCEPTED,
    /// Movement crossed threshold
    R003_WEIGHING_STARTED,
    /// Pointer released after weighing
    R004_GESTURE_COMMITTED,
    /// Release before threshold, treated as a tap
    R005_GESTURE_TAPPED,
    /// Gesture cancelled
    R006_GESTURE_CANCELLED,
    /// Outcome resolved
    R007_OUTCOME_RESOLVED,
    /// Session reset
    R008_SESSION_RESET,
    /// Wholesale state replacement
    R009_STATE_HYDRATED,
    /// Hold started on next step card
    R010_HOLD_STARTED,
    /// Hold ratio updated
    R011_HOLD_PROGRESS,
    /// Hold completed, next step armed
    R012_STEP_ARMED,
    /// Hold released early
    R013_HOLD_RELEASED,
    /// Step revealed
    R014_STEP_REVEALED,
    /// Session sealed
    R015_SESSION_SEALED,

    // =========================================================================
    // R1xx: Rejected
    // =========================================================================
    /// Pointer id differs from the active one
    R101_POINTER_MISMATCH,
    /// A gesture is already in flight
    R102_GESTURE_ALREADY_ACTIVE,
    /// Current phase does not accept this action
    R103_PHASE_REJECTS_ACTION,
    /// Move/end/cancel without a start
    R104_NO_ACTIVE_GESTURE,
    /// Sequence number not increasing
    R105_STALE_SEQUENCE,
    /// Step requested before its prerequisites
    R106_STEP_OUT_OF_ORDER,
    /// Step already revealed
    R107_STEP_ALREADY_REVEALED,
    /// Step id not in the ladder
    R108_UNKNOWN_STEP,
    /// Commit attempted before seal
    R109_SEAL_NOT_READY,
    /// Session sealed, only reset accepted
    R110_SESSION_SEALED,
}

impl ReasonCode {
    /// Get the code string (for logging and replay logs)
    pub fn code(&self) -> &'static str {
        match self {
            Self::R001_GESTURE_STARTED => "R001_GESTURE_STARTED",
            Self::R002_SAMPLE_ACCEPTED => "R002_SAMPLE_ACCEPTED",
            Self::R003_WEIGHING_STARTED => "R003_WEIGHING_STARTED",
            Self::R004_GESTURE_COMMITTED => "R004_GESTURE_COMMITTED",
            Self::R005_GESTURE_TAPPED => "R005_GESTURE_TAPPED",
            Self::R006_GESTURE_CANCELLED => "R006_GESTURE_CANCELLED",
            Self::R007_OUTCOME_RESOLVED => "R007_OUTCOME_RESOLVED",
            Self::R008_SESSION_RESET => "R008_SESSION_RESET",
            Self::R009_STATE_HYDRATED => "R009_STATE_HYDRATED",
            Self::R010_HOLD_STARTED => "R010_HOLD_STARTED",
            Self::R011_HOLD_PROGRESS => "R011_HOLD_PROGRESS",
            Self::R012_STEP_ARMED => "R012_STEP_ARMED",
            Self::R013_HOLD_RELEASED => "R013_HOLD_RELEASED",
            Self::R014_STEP_REVEALED => "R014_STEP_REVEALED",
            Self::R015_SESSION_SEALED => "R015_SESSION_SEALED",
            Self::R101_POINTER_MISMATCH => "R101_POINTER_MISMATCH",
            Self::R102_GESTURE_ALREADY_ACTIVE => "R102_GESTURE_ALREADY_ACTIVE",
            Self::R103_PHASE_REJECTS_ACTION => "R103_PHASE_REJECTS_ACTION",
            Self::R104_NO_ACTIVE_GESTURE => "R104_NO_ACTIVE_GESTURE",
            Self::R105_STALE_SEQUENCE => "R105_STALE_SEQUENCE",
            Self::R106_STEP_OUT_OF_ORDER => "R106_STEP_OUT_OF_ORDER",
            Self::R107_STEP_ALREADY_REVEALED => "R107_STEP_ALREADY_REVEALED",
            Self::R108_UNKNOWN_STEP => "R108_UNKNOWN_STEP",
            Self::R109_SEAL_NOT_READY => "R109_SEAL_NOT_READY",
            Self::R110_SESSION_SEALED => "R110_SESSION_SEALED",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::R001_GESTURE_STARTED => "Gesture started",
            Self::R002_SAMPLE_ACCEPTED => "Sample accepted",
            Self::R003_WEIGHING_STARTED => "Movement threshold crossed",
            Self::R004_GESTURE_COMMITTED => "Gesture committed",
            Self::R005_GESTURE_TAPPED => "Released before threshold",
            Self::R006_GESTURE_CANCELLED => "Gesture cancelled",
            Self::R007_OUTCOME_RESOLVED => "Outcome resolved",
            Self::R008_SESSION_RESET => "Session reset",
            Self::R009_STATE_HYDRATED => "State replaced",
            Self::R010_HOLD_STARTED => "Hold started",
            Self::R011_HOLD_PROGRESS => "Hold progressing",
            Self::R012_STEP_ARMED => "Next step armed",
            Self::R013_HOLD_RELEASED => "Hold released early",
            Self::R014_STEP_REVEALED => "Step revealed",
            Self::R015_SESSION_SEALED => "Session sealed",
            Self::R101_POINTER_MISMATCH => "Pointer does not own the gesture",
            Self::R102_GESTURE_ALREADY_ACTIVE => "Gesture already active",
            Self::R103_PHASE_REJECTS_ACTION => "Phase does not accept action",
            Self::R104_NO_ACTIVE_GESTURE => "No active gesture",
            Self::R105_STALE_SEQUENCE => "Sequence number not increasing",
            Self::R106_STEP_OUT_OF_ORDER => "Prerequisite step not revealed",
            Self::R107_STEP_ALREADY_REVEALED => "Step already revealed",
            Self::R108_UNKNOWN_STEP => "Unknown step",
            Self::R109_SEAL_NOT_READY => "Seal level below sealed",
            Self::R110_SESSION_SEALED => "Session is sealed",
        }
    }

    /// Is this an acceptance code?
    pub fn is_accepted(&self) -> bool {
        !self.code().starts_with("R1")
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
