//! Gesture Metrics Aggregator
//!
//! Reduces a full trace into scalar features. Always recomputed from the
//! whole trace so that the same trace gives bit-identical metrics.

use crate::types::{GestureMetrics, Sample};
use crate::{clamp01, round4};

/// Net displacement that counts as full momentum
const MOMENTUM_SPAN: f64 = 0.75;

/// Spread at which stability reaches zero
const STABILITY_SPREAD: f64 = 0.35;

/// Mean step length that counts as full urgency
const URGENCY_STEP: f64 = 0.25;

/// Segment count that saturates the deliberation term
const DELIBERATION_SEGMENTS: f64 = 8.0;

/// Compute metrics over an ordered trace
pub fn compute_metrics(samples: &[Sample]) -> GestureMetrics {
    let n = samples.len();
    if n == 0 {
        return GestureMetrics::zero();
    }

    let segments = n.saturating_sub(1).max(1) as f64;

    let mut travel = 0.0;
    let mut travel_x = 0.0;
    let mut travel_y = 0.0;
    for pair in samples.windows(2) {
        travel += pair[0].distance_to(&pair[1]);
        travel_x += (pair[1].x() - pair[0].x()).abs();
        travel_y += (pair[1].y() - pair[0].y()).abs();
    }

    let count = n as f64;
    let mean_x = samples.iter().map(|s| s.x()).sum::<f64>() / count;
    let mean_y = samples.iter().map(|s| s.y()).sum::<f64>() / count;
    let variance = samples
        .iter()
        .map(|s| (s.x() - mean_x).powi(2) + (s.y() - mean_y).powi(2))
        .sum::<f64>()
        / count;
    let spread = variance.sqrt();

    let first = &samples[0];
    let last = &samples[n - 1];
    let net_dx = last.x() - first.x();
    let net_dy = last.y() - first.y();
    let net = net_dx.hypot(net_dy);

    let momentum = clamp01(net / MOMENTUM_SPAN);
    let stability = clamp01(1.0 - spread / STABILITY_SPREAD);
    let commitment = if travel > 0.0 { clamp01(net / travel) } else { 0.0 };
    let urgency = clamp01((travel / segments) / URGENCY_STEP);
    let bias = (net_dx * 0.8 + net_dy * 0.4).clamp(-1.0, 1.0);
    let deliberation =
        clamp01((segments / DELIBERATION_SEGMENTS) * 0.6 + (1.0 - urgency) * 0.4);

    GestureMetrics {
        sample_count: n,
        travel: round4(travel),
        travel_x: round4(travel_x),
        travel_y: round4(travel_y),
        mean_x: round4(mean_x),
        mean_y: round4(mean_y),
        spread: round4(spread),
        momentum: round4(momentum),
        stability: round4(stability),
        commitment: round4(commitment),
        urgency: round4(urgency),
        bias: round4(bias),
        deliberation: round4(deliberation),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PointerKind;

    fn trace(points: &[(f64, f64)]) -> Vec<Sample> {
        points
            .iter()
            .enumerate()
            .map(|(i, (x, y))| {
                let kind = if i == 0 { PointerKind::Down } else { PointerKind::Move };
                Sample::new(kind, i as u64 + 1, *x, *y, 1, "stage")
            })
            .collect()
    }

    #[test]
    fn test_empty_trace_is_zero() {
        assert_eq!(compute_metrics(&[]), GestureMetrics::zero());
    }

    #[test]
    fn test_single_sample() {
        let metrics = compute_metrics(&trace(&[(0.5, 0.5)]));
        assert_eq!(metrics.sample_count, 1);
        assert_eq!(metrics.travel, 0.0);
        assert_eq!(metrics.commitment, 0.0);
        assert_eq!(metrics.stability, 1.0);
        assert_eq!(metrics.mean_x, 0.5);
    }

    #[test]
    fn test_straight_line_is_fully_committed() {
        let metrics = compute_metrics(&trace(&[(0.1, 0.1), (0.2, 0.1), (0.3, 0.1)]));
        assert!((metrics.travel - 0.2).abs() < 1e-9);
        assert!((metrics.travel_x - 0.2).abs() < 1e-9);
        assert_eq!(metrics.travel_y, 0.0);
        assert_eq!(metrics.commitment, 1.0);
        assert!(metrics.bias > 0.0);
    }

    #[test]
    fn test_up_left_motion_has_negative_bias() {
        let metrics = compute_metrics(&trace(&[(0.74, 0.62), (0.12, 0.20)]));
        assert!(metrics.bias < -0.6);
        assert_eq!(metrics.urgency, 1.0);
    }

    #[test]
    fn test_recompute_is_identical() {
        let samples = trace(&[(0.22, 0.44), (0.32, 0.51), (0.46, 0.61)]);
        assert_eq!(compute_metrics(&samples), compute_metrics(&samples));
    }

    #[test]
    fn test_all_unit_features_in_range() {
        let samples = trace(&[(0.0, 0.0), (1.0, 1.0), (0.0, 1.0), (1.0, 0.0)]);
        let m = compute_metrics(&samples);
        for value in [m.momentum, m.stability, m.commitment, m.urgency, m.deliberation] {
            assert!((0.0..=1.0).contains(&value));
        }
        assert!((-1.0..=1.0).contains(&m.bias));
    }
}
