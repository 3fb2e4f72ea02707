//! Gesture metrics record

use serde::{Deserialize, Serialize};

/// Scalar features derived from a trace (always recomputed, never patched)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureMetrics {
    pub sample_count: usize,
    /// Sum of segment lengths
    pub travel: f64,
    pub travel_x: f64,
    pub travel_y: f64,
    pub mean_x: f64,
    pub mean_y: f64,
    /// RMS distance from the mean position
    pub spread: f64,
    /// Net displacement, normalized
    pub momentum: f64,
    /// Inverse of spread
    pub stability: f64,
    /// Straightness: net displacement over travel
    pub commitment: f64,
    /// Mean step length, normalized
    pub urgency: f64,
    /// -1 (speed, up-left) .. +1 (depth, down-right)
    pub bias: f64,
    pub deliberation: f64,
}

impl GestureMetrics {
    /// Metrics of an empty trace
    pub fn zero() -> Self {
        Self::default()
    }

    /// Composite shown as "gesture certainty", 0..=100
    pub fn certainty(&self) -> u32 {
        let raw = self.stability * 0.4 + self.commitment * 0.35 + self.momentum * 0.25;
        (crate::clamp01(raw) * 100.0).round() as u32
    }
}
