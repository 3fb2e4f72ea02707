//! Scoring Model: gesture metrics → weighted route scores
//!
//! Each criterion turns the metrics into an "emphasis" in [0,1]. A route's
//! contribution on that criterion is how close the emphasis sits to the
//! route's profile value, scaled by the criterion weight. Coefficients are a
//! fixed policy (`SCORING_POLICY_VERSION`), not tuning knobs.

use std::cmp::Ordering;
use std::collections::HashSet;
use crate::error::ScriptError;
use crate::types::{Contribution, Criterion, GestureMetrics, Route, ScoreSnapshot};
use crate::{
    clamp01, round4, TIE_EPSILON, WEIGHT_SUM_TOLERANCE, W_COST_OF_DELAY, W_DEPTH, W_GOVERNANCE,
    W_REVERSIBILITY, W_TIME_TO_VALUE,
};

/// Maps metrics to a criterion's emphasis (unclamped)
pub type EmphasisFn = fn(&GestureMetrics) -> f64;

/// A criterion together with its emphasis formula
#[derive(Debug, Clone)]
pub struct CriterionSpec {
    pub criterion: Criterion,
    pub emphasis: EmphasisFn,
}

impl CriterionSpec {
    pub fn new(
        id: &str,
        label: &str,
        weight: f64,
        profile_a: f64,
        profile_b: f64,
        emphasis: EmphasisFn,
    ) -> Self {
        Self {
            criterion: Criterion {
                id: id.to_string(),
                label: label.to_string(),
                weight,
                profile_a,
                profile_b,
            },
            emphasis,
        }
    }
}

fn emphasis_time_to_value(m: &GestureMetrics) -> f64 {
    0.25 + m.urgency * 0.5 + m.momentum * 0.2 - m.stability * 0.15
}

fn emphasis_governance(m: &GestureMetrics) -> f64 {
    0.45 + m.bias * 0.45 + m.stability * 0.1
}

fn emphasis_reversibility(m: &GestureMetrics) -> f64 {
    0.5 - m.bias * 0.35 + (1.0 - m.commitment) * 0.2
}

fn emphasis_depth(m: &GestureMetrics) -> f64 {
    0.2 + m.deliberation * 0.35 + m.mean_x * 0.25 + m.bias * 0.2
}

fn emphasis_cost_of_delay(m: &GestureMetrics) -> f64 {
    0.3 + (1.0 - m.mean_y) * 0.4 - m.bias * 0.2
}

/// Weighted two-route scoring model
#[derive(Debug, Clone)]
pub struct GestureModel {
    specs: Vec<CriterionSpec>,
    tie_winner: Route,
}

impl GestureModel {
    /// Build a model, checking weights sum to 1 and ids are unique
    pub fn new(specs: Vec<CriterionSpec>, tie_winner: Route) -> Result<Self, ScriptError> {
        let mut seen = HashSet::new();
        for spec in &specs {
            if !seen.insert(spec.criterion.id.clone()) {
                return Err(ScriptError::DuplicateCriterion(spec.criterion.id.clone()));
            }
        }

        let sum: f64 = specs.iter().map(|s| s.criterion.weight).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScriptError::WeightSum(sum));
        }

        Ok(Self { specs, tie_winner })
    }

    /// The shipped five-criterion policy; ties go to Route B
    pub fn standard() -> Self {
        Self {
            specs: vec![
                CriterionSpec::new("time_to_value", "Time to value", W_TIME_TO_VALUE, 0.90, 0.35, emphasis_time_to_value),
                CriterionSpec::new("governance", "Governance", W_GOVERNANCE, 0.25, 0.90, emphasis_governance),
                CriterionSpec::new("reversibility", "Reversibility", W_REVERSIBILITY, 0.80, 0.40, emphasis_reversibility),
                CriterionSpec::new("depth", "Depth of build", W_DEPTH, 0.30, 0.85, emphasis_depth),
                CriterionSpec::new("cost_of_delay", "Cost of delay", W_COST_OF_DELAY, 0.85, 0.30, emphasis_cost_of_delay),
            ],
            tie_winner: Route::B,
        }
    }

    pub fn criteria(&self) -> impl Iterator<Item = &Criterion> {
        self.specs.iter().map(|s| &s.criterion)
    }

    pub fn weight_sum(&self) -> f64 {
        self.specs.iter().map(|s| s.criterion.weight).sum()
    }

    pub fn tie_winner(&self) -> Route {
        self.tie_winner
    }

    /// Score a metrics record
    pub fn score(&self, metrics: &GestureMetrics) -> ScoreSnapshot {
        let contributions: Vec<Contribution> = self
            .specs
            .iter()
            .map(|spec| {
                let c = &spec.criterion;
                let emphasis = round4(clamp01((spec.emphasis)(metrics)));
                Contribution {
                    criterion_id: c.id.clone(),
                    label: c.label.clone(),
                    weight: c.weight,
                    emphasis,
                    to_a: round4(compatibility(emphasis, c.profile_a) * c.weight * 100.0),
                    to_b: round4(compatibility(emphasis, c.profile_b) * c.weight * 100.0),
                }
            })
            .collect();

        let score_a = round4(contributions.iter().map(|c| c.to_a).sum::<f64>());
        let score_b = round4(contributions.iter().map(|c| c.to_b).sum::<f64>());
        self.snapshot(score_a, score_b, contributions, metrics.certainty())
    }

    /// Assemble a snapshot from already-computed totals
    pub fn snapshot(
        &self,
        score_a: f64,
        score_b: f64,
        contributions: Vec<Contribution>,
        certainty: u32,
    ) -> ScoreSnapshot {
        let difference = round4(score_a - score_b);
        let (winner, tie) = resolve_winner(difference, self.tie_winner);
        let reasons = build_reasons(&contributions, certainty, winner, tie, difference);

        ScoreSnapshot {
            score_a,
            score_b,
            difference,
            winner,
            tie,
            contributions,
            reasons,
            certainty,
        }
    }
}

impl Default for GestureModel {
    fn default() -> Self {
        Self::standard()
    }
}

/// 1 when emphasis equals the profile, 0 at opposite ends
fn compatibility(emphasis: f64, profile: f64) -> f64 {
    clamp01(1.0 - (emphasis - profile).abs())
}

/// Winner for a score difference (a - b); ties go to the configured default
pub fn resolve_winner(difference: f64, tie_winner: Route) -> (Route, bool) {
    if difference.abs() < TIE_EPSILON {
        (tie_winner, true)
    } else if difference > 0.0 {
        (Route::A, false)
    } else {
        (Route::B, false)
    }
}

/// Top-3 criterion bullets, certainty line, summary line
fn build_reasons(
    contributions: &[Contribution],
    certainty: u32,
    winner: Route,
    tie: bool,
    difference: f64,
) -> Vec<String> {
    let mut ranked: Vec<(usize, &Contribution)> = contributions.iter().enumerate().collect();
    ranked.sort_by(|(i, a), (j, b)| {
        b.delta()
            .abs()
            .partial_cmp(&a.delta().abs())
            .unwrap_or(Ordering::Equal)
            .then(i.cmp(j))
    });

    let mut reasons: Vec<String> = ranked
        .iter()
        .take(3)
        .map(|(_, c)| {
            let delta = c.delta();
            if delta.abs() < 0.05 {
                format!("{} is neutral between routes", c.label)
            } else {
                let favored = if delta > 0.0 { Route::A } else { Route::B };
                format!("{} favors {} by {:.1} pts", c.label, favored, delta.abs())
            }
        })
        .collect();

    reasons.push(format!("Gesture certainty: {}%", certainty));

    if tie {
        reasons.push(format!(
            "Tie within {:.1} pts: defaulting to {} ({})",
            TIE_EPSILON,
            winner,
            winner.label()
        ));
    } else {
        reasons.push(format!(
            "{} ({}) leads by {:.1} pts",
            winner,
            winner.label(),
            difference.abs()
        ));
    }

    reasons
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::compute_metrics;
    use crate::types::{PointerKind, Sample};

    fn trace(points: &[(f64, f64)]) -> Vec<Sample> {
        points
            .iter()
            .enumerate()
            .map(|(i, (x, y))| Sample::new(PointerKind::Move, i as u64 + 1, *x, *y, 1, "stage"))
            .collect()
    }

    #[test]
    fn test_standard_weights_sum_to_one() {
        let model = GestureModel::standard();
        assert!((model.weight_sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_bad_weight_sum() {
        let specs = vec![
            CriterionSpec::new("a", "A", 0.5, 0.5, 0.5, emphasis_depth),
            CriterionSpec::new("b", "B", 0.4, 0.5, 0.5, emphasis_depth),
        ];
        assert!(matches!(GestureModel::new(specs, Route::A), Err(ScriptError::WeightSum(_))));
    }

    #[test]
    fn test_rejects_duplicate_criterion() {
        let specs = vec![
            CriterionSpec::new("a", "A", 0.5, 0.5, 0.5, emphasis_depth),
            CriterionSpec::new("a", "A", 0.5, 0.5, 0.5, emphasis_depth),
        ];
        assert_eq!(
            GestureModel::new(specs, Route::A).unwrap_err(),
            ScriptError::DuplicateCriterion("a".to_string())
        );
    }

    #[test]
    fn test_depth_trace_favors_route_b() {
        let model = GestureModel::standard();
        let metrics = compute_metrics(&trace(&[
            (0.22, 0.44),
            (0.32, 0.51),
            (0.46, 0.61),
            (0.62, 0.72),
            (0.82, 0.78),
        ]));
        let snapshot = model.score(&metrics);
        assert_eq!(snapshot.winner, Route::B);
        assert!(!snapshot.tie);
        assert!(snapshot.score_b > snapshot.score_a + 10.0);
    }

    #[test]
    fn test_speed_trace_favors_route_a() {
        let model = GestureModel::standard();
        let metrics = compute_metrics(&trace(&[(0.74, 0.62), (0.12, 0.20)]));
        let snapshot = model.score(&metrics);
        assert_eq!(snapshot.winner, Route::A);
        assert!(snapshot.score_a > 80.0);
    }

    #[test]
    fn test_scores_in_range() {
        let model = GestureModel::standard();
        for points in [
            vec![(0.0, 0.0), (1.0, 1.0)],
            vec![(1.0, 1.0), (0.0, 0.0)],
            vec![(0.5, 0.5)],
            vec![],
        ] {
            let snapshot = model.score(&compute_metrics(&trace(&points)));
            assert!((0.0..=100.0).contains(&snapshot.score_a));
            assert!((0.0..=100.0).contains(&snapshot.score_b));
        }
    }

    #[test]
    fn test_contributions_sum_to_scores() {
        let model = GestureModel::standard();
        let snapshot = model.score(&compute_metrics(&trace(&[(0.3, 0.3), (0.6, 0.4)])));
        let sum_a: f64 = snapshot.contributions.iter().map(|c| c.to_a).sum();
        assert!((sum_a - snapshot.score_a).abs() < 1e-3);
        assert_eq!(snapshot.contributions.len(), 5);
    }

    #[test]
    fn test_tie_goes_to_configured_winner() {
        let model = GestureModel::standard();
        let snapshot = model.snapshot(50.0, 49.7, Vec::new(), 40);
        assert!(snapshot.tie);
        assert_eq!(snapshot.winner, Route::B);

        let flipped = model.snapshot(49.7, 50.0, Vec::new(), 40);
        assert!(flipped.tie);
        assert_eq!(flipped.winner, Route::B);
    }

    #[test]
    fn test_tie_ignores_float_noise() {
        let (a, _) = resolve_winner(0.1 + 0.2 - 0.3, Route::A);
        let (b, _) = resolve_winner(-(0.1 + 0.2 - 0.3), Route::A);
        assert_eq!(a, Route::A);
        assert_eq!(b, Route::A);
    }

    #[test]
    fn test_reasons_shape() {
        let model = GestureModel::standard();
        let snapshot = model.score(&compute_metrics(&trace(&[(0.74, 0.62), (0.12, 0.20)])));
        assert_eq!(snapshot.reasons.len(), 5);
        assert!(snapshot.reasons[3].starts_with("Gesture certainty:"));
        assert!(snapshot.reasons[4].contains("Route A"));
    }

    #[test]
    fn test_reasons_ranked_by_delta() {
        let model = GestureModel::standard();
        let snapshot = model.score(&compute_metrics(&trace(&[(0.74, 0.62), (0.12, 0.20)])));
        let mut deltas: Vec<f64> = snapshot.contributions.iter().map(|c| c.delta().abs()).collect();
        deltas.sort_by(|a, b| b.partial_cmp(a).unwrap());
        let top = snapshot
            .contributions
            .iter()
            .find(|c| (c.delta().abs() - deltas[0]).abs() < 1e-12)
            .unwrap();
        assert!(snapshot.reasons[0].starts_with(&top.label));
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let model = GestureModel::standard();
        let metrics = compute_metrics(&trace(&[(0.2, 0.8), (0.4, 0.6), (0.9, 0.1)]));
        assert_eq!(model.score(&metrics), model.score(&metrics));
    }
}
