//! Scoring types: criteria, contributions and score snapshots

use serde::{Deserialize, Serialize};

/// Candidate outcome of the gesture model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Route {
    /// Speed-favoring
    A,
    /// Depth/governance-favoring
    B,
}

impl Route {
    pub fn label(&self) -> &'static str {
        match self {
            Route::A => "Ship Fast",
            Route::B => "Build Depth",
        }
    }

    pub fn other(&self) -> Route {
        match self {
            Route::A => Route::B,
            Route::B => Route::A,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::A => write!(f, "Route A"),
            Route::B => write!(f, "Route B"),
        }
    }
}

/// Named weighted dimension with a profile value per route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub id: String,
    pub label: String,
    pub weight: f64,
    pub profile_a: f64,
    pub profile_b: f64,
}

impl Criterion {
    pub fn profile(&self, route: Route) -> f64 {
        match route {
            Route::A => self.profile_a,
            Route::B => self.profile_b,
        }
    }
}

/// Per-criterion compatibility of the live emphasis with each route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub criterion_id: String,
    pub label: String,
    pub weight: f64,
    /// Emphasis derived from gesture metrics
    pub emphasis: f64,
    /// Weighted contribution to Route A (score points)
    pub to_a: f64,
    /// Weighted contribution to Route B (score points)
    pub to_b: f64,
}

impl Contribution {
    /// Signed delta, positive favors A
    pub fn delta(&self) -> f64 {
        self.to_a - self.to_b
    }
}

/// Deterministic score result for one trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSnapshot {
    pub score_a: f64,
    pub score_b: f64,
    /// score_a - score_b
    pub difference: f64,
    pub winner: Route,
    pub tie: bool,
    pub contributions: Vec<Contribution>,
    /// Top criteria bullets, certainty line, summary line
    pub reasons: Vec<String>,
    /// Gesture certainty composite, 0..=100
    pub certainty: u32,
}

impl ScoreSnapshot {
    pub fn score(&self, route: Route) -> f64 {
        match route {
            Route::A => self.score_a,
            Route::B => self.score_b,
        }
    }

    /// Winner's score (used as the scalar in replay envelopes)
    pub fn winning_score(&self) -> f64 {
        self.score(self.winner)
    }
}
