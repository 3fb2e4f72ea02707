//! Confidence Model: route profile + revealed evidence → confidence level
//!
//! Baseline from the route profile and constraint pressure, then each
//! revealed step adds a gain and removes uncertainty, scaled by how well the
//! step's influence lines up with the route's axes. Integers in [0,100].

use std::collections::HashSet;
use sha2::{Digest, Sha256};
use crate::error::ScriptError;
use crate::types::{
    Axes, Band, ConfidenceSnapshot, Constraint, EvidenceStep, Grade, RouteProfile, SealLevel,
    StepEffect,
};
use crate::{
    round4, BAND_CREDIBLE, BAND_DOMINANT, BAND_DOMINANT_MAX_UNCERTAINTY, BAND_EMERGING,
    SEAL_CONFIDENCE,
};

/// Ladder length
pub const LADDER_STEPS: usize = 3;

/// Evidence-ladder scoring model
#[derive(Debug, Clone, PartialEq)]
pub struct LadderModel {
    routes: Vec<RouteProfile>,
    constraints: Vec<Constraint>,
    steps: Vec<EvidenceStep>,
}

impl LadderModel {
    /// Build a model; exactly three steps with unique ids, unique routes
    pub fn new(
        routes: Vec<RouteProfile>,
        constraints: Vec<Constraint>,
        steps: Vec<EvidenceStep>,
    ) -> Result<Self, ScriptError> {
        if steps.len() != LADDER_STEPS {
            return Err(ScriptError::LadderSize(steps.len()));
        }
        let mut ids = HashSet::new();
        for step in &steps {
            if !ids.insert(step.id.as_str()) {
                return Err(ScriptError::DuplicateStep(step.id.clone()));
            }
        }
        let mut route_ids = HashSet::new();
        for route in &routes {
            if !route_ids.insert(route.id.as_str()) {
                return Err(ScriptError::DuplicateRoute(route.id.clone()));
            }
        }
        Ok(Self { routes, constraints, steps })
    }

    /// Shipped catalog: three routes, four constraints, three steps
    pub fn standard() -> Self {
        let route = |id: &str, label: &str, c: i32, u: i32, axes: Axes, strength: f64| RouteProfile {
            id: id.to_string(),
            label: label.to_string(),
            base_confidence: c,
            base_uncertainty: u,
            axis_weights: axes,
            strength,
        };
        let constraint = |id: &str, label: &str, severity: u32, by: &[&str]| Constraint {
            id: id.to_string(),
            label: label.to_string(),
            severity,
            satisfied_by: by.iter().map(|s| s.to_string()).collect(),
        };
        let step = |id: &str, label: &str, gain: f64, drop: f64, influence: Axes| EvidenceStep {
            id: id.to_string(),
            label: label.to_string(),
            base_gain: gain,
            base_drop: drop,
            influence,
        };

        Self {
            routes: vec![
                route("proof-first", "Proof First", 34, 62, Axes::new(0.9, 0.3, 0.7), 1.1),
                route("speed-first", "Speed First", 40, 55, Axes::new(0.3, 0.9, 0.4), 0.9),
                route("balanced", "Balanced", 38, 58, Axes::new(0.6, 0.6, 0.6), 1.0),
            ],
            constraints: vec![
                constraint("regulated-data", "Regulated data", 3, &["proof-first", "balanced"]),
                constraint("launch-window", "Launch window", 2, &["speed-first", "balanced"]),
                constraint("audit-trail", "Audit trail", 2, &["proof-first"]),
                constraint("budget-cap", "Budget cap", 1, &["speed-first", "balanced"]),
            ],
            steps: vec![
                step("benchmark", "Benchmark results", 20.0, 12.0, Axes::new(0.7, 0.1, 0.2)),
                step("pilot", "Pilot cohort", 16.0, 10.0, Axes::new(0.3, 0.4, 0.3)),
                step("audit", "External audit", 14.0, 12.0, Axes::new(0.5, 0.0, 0.5)),
            ],
        }
    }

    pub fn routes(&self) -> &[RouteProfile] {
        &self.routes
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn steps(&self) -> &[EvidenceStep] {
        &self.steps
    }

    pub fn route(&self, id: &str) -> Option<&RouteProfile> {
        self.routes.iter().find(|r| r.id == id)
    }

    /// 1-based ladder position of a step
    pub fn step_position(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id).map(|i| i + 1)
    }

    /// Severity-weighted ratio of constraints the route satisfies
    pub fn pressure(&self, route: &RouteProfile) -> f64 {
        let total: u32 = self.constraints.iter().map(|c| c.severity).sum();
        if total == 0 {
            return 0.0;
        }
        let satisfied: u32 = self
            .constraints
            .iter()
            .filter(|c| c.satisfied_by.iter().any(|r| r == &route.id))
            .map(|c| c.severity)
            .sum();
        round4(satisfied as f64 / total as f64)
    }

    /// Baseline (confidence, uncertainty) before any step
    pub fn baseline(&self, route: &RouteProfile) -> (i32, i32) {
        let p = self.pressure(route);
        let confidence = route.base_confidence as f64 + p * 12.0 - (1.0 - p) * 8.0;
        let uncertainty = route.base_uncertainty as f64 + (1.0 - p) * 10.0 - p * 6.0;
        (clamp_level(confidence.round() as i32), clamp_level(uncertainty.round() as i32))
    }

    /// Gain/drop of one step for one route
    pub fn step_effect(&self, route: &RouteProfile, step: &EvidenceStep) -> StepEffect {
        let influence_sum = step.influence.sum();
        let alignment = if influence_sum > 0.0 {
            step.influence.dot(&route.axis_weights) / influence_sum
        } else {
            0.0
        };
        let multiplier = 0.6 + alignment * 0.8;
        StepEffect {
            step_id: step.id.clone(),
            alignment: round4(alignment),
            multiplier: round4(multiplier),
            gain: (step.base_gain * multiplier * route.strength).round() as i32,
            drop: (step.base_drop * multiplier * route.strength).round() as i32,
        }
    }

    /// Confidence snapshot after the first `revealed` steps
    ///
    /// Returns None for an unknown route.
    pub fn evaluate(&self, route_id: &str, revealed: usize) -> Option<ConfidenceSnapshot> {
        let route = self.route(route_id)?;
        let revealed = revealed.min(self.steps.len());
        let pressure = self.pressure(route);
        let (baseline_confidence, baseline_uncertainty) = self.baseline(route);

        let mut confidence = baseline_confidence;
        let mut uncertainty = baseline_uncertainty;
        let mut effects = Vec::with_capacity(revealed);
        for step in self.steps.iter().take(revealed) {
            let effect = self.step_effect(route, step);
            confidence = clamp_level(confidence + effect.gain);
            uncertainty = clamp_level(uncertainty - effect.drop);
            effects.push(effect);
        }

        let all_revealed = revealed == self.steps.len();
        Some(ConfidenceSnapshot {
            route_id: route.id.clone(),
            pressure,
            baseline_confidence,
            baseline_uncertainty,
            confidence,
            uncertainty,
            revealed,
            effects,
            band: band_for(confidence, uncertainty),
            seal: seal_for(confidence, revealed, all_revealed),
            grade: grade_for(confidence, uncertainty, revealed, all_revealed),
        })
    }

    /// Short digest identifying the active constraint set
    pub fn constraint_digest(&self) -> String {
        let canonical = serde_json::to_vec(&self.constraints).unwrap_or_default();
        let digest = Sha256::digest(&canonical);
        digest.iter().take(8).map(|b| format!("{:02x}", b)).collect()
    }
}

impl Default for LadderModel {
    fn default() -> Self {
        Self::standard()
    }
}

fn clamp_level(value: i32) -> i32 {
    value.clamp(0, 100)
}

/// Qualitative band for a confidence/uncertainty pair
pub fn band_for(confidence: i32, uncertainty: i32) -> Band {
    if confidence >= BAND_DOMINANT && uncertainty <= BAND_DOMINANT_MAX_UNCERTAINTY {
        Band::Dominant
    } else if confidence >= BAND_CREDIBLE {
        Band::Credible
    } else if confidence >= BAND_EMERGING {
        Band::Emerging
    } else {
        Band::Fragile
    }
}

/// Seal level
pub fn seal_for(confidence: i32, revealed: usize, all_revealed: bool) -> SealLevel {
    if all_revealed && confidence >= SEAL_CONFIDENCE {
        SealLevel::Sealed
    } else if revealed > 0 {
        SealLevel::Forming
    } else {
        SealLevel::Open
    }
}

/// Letter grade; capped at D with nothing revealed and B while incomplete
pub fn grade_for(confidence: i32, uncertainty: i32, revealed: usize, all_revealed: bool) -> Grade {
    let margin = confidence - uncertainty;
    let grade = if margin >= 70 {
        Grade::A
    } else if margin >= 45 {
        Grade::B
    } else if margin >= 20 {
        Grade::C
    } else if margin >= 0 {
        Grade::D
    } else {
        Grade::F
    };

    let cap = if revealed == 0 {
        Grade::D
    } else if !all_revealed {
        Grade::B
    } else {
        Grade::A
    };
    // Grade orders A < F, so the cap is the max
    grade.max(cap)
}

// =============================================================================
// TESTS
// =============================================================================
