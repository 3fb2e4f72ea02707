//! decisim: deterministic decision simulations
//!
//! Gesture scoring, evidence ladders and guided tours, all driven by pure
//! reducers whose action streams can be captured and replayed byte-for-byte.

pub mod config;
pub mod core;
pub mod error;
pub mod types;

// =============================================================================
// GESTURE THRESHOLDS [C]
// =============================================================================

/// Travel (unit-square distance) needed to leave AIMING for WEIGHING
pub const MOVE_THRESHOLD: f64 = 0.04;

/// Scores closer than this are a tie
pub const TIE_EPSILON: f64 = 0.5;

/// Decimal digits kept on every derived float
pub const ROUND_DIGITS: i32 = 4;

// =============================================================================
// SCORING POLICY [C] - versioned, reproduced exactly
// =============================================================================

/// Bump whenever a coefficient below changes
pub const SCORING_POLICY_VERSION: u32 = 1;

/// Criterion weights (sum = 1.0)
pub const W_TIME_TO_VALUE: f64 = 0.24;
pub const W_GOVERNANCE: f64 = 0.22;
pub const W_REVERSIBILITY: f64 = 0.16;
pub const W_DEPTH: f64 = 0.22;
pub const W_COST_OF_DELAY: f64 = 0.16;

/// Tolerance for the weight-sum check
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

// =============================================================================
// EVIDENCE LADDER THRESHOLDS [C]
// =============================================================================

/// Hold ratio at which the next step card is armed
pub const ARM_RATIO: f64 = 0.98;

/// Confidence required to seal
pub const SEAL_CONFIDENCE: i32 = 85;

/// Band thresholds on confidence
pub const BAND_EMERGING: i32 = 50;
pub const BAND_CREDIBLE: i32 = 70;
pub const BAND_DOMINANT: i32 = 85;

/// DOMINANT also needs uncertainty at or below this
pub const BAND_DOMINANT_MAX_UNCERTAINTY: i32 = 25;

// =============================================================================
// WIRE FORMAT
// =============================================================================

/// Default trace namespace (`<ns>.trace.v1`)
pub const TRACE_NAMESPACE: &str = "decisim";

/// Default source tag for gesture envelopes
pub const GESTURE_SOURCE: &str = "gesture-scorer";

/// Ladder payload version
pub const LADDER_PAYLOAD_VERSION: u32 = 1;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";

/// Round to `ROUND_DIGITS` decimal places
pub fn round4(value: f64) -> f64 {
    let factor = 10f64.powi(ROUND_DIGITS);
    let rounded = (value * factor).round() / factor;
    // normalise -0.0 so encoded traces stay byte-identical
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Clamp into [0, 1]; NaN maps to 0
pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
