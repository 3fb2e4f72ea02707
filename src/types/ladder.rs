//! Evidence-ladder types: routes, constraints, steps and confidence levels

use serde::{Deserialize, Serialize};

/// Weights or influences over the three decision axes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Axes {
    pub rigor: f64,
    pub velocity: f64,
    pub resilience: f64,
}

impl Axes {
    pub fn new(rigor: f64, velocity: f64, resilience: f64) -> Self {
        Self { rigor, velocity, resilience }
    }

    pub fn dot(&self, other: &Axes) -> f64 {
        self.rigor * other.rigor + self.velocity * other.velocity + self.resilience * other.resilience
    }

    pub fn sum(&self) -> f64 {
        self.rigor + self.velocity + self.resilience
    }
}

/// Static profile of a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteProfile {
    pub id: String,
    pub label: String,
    pub base_confidence: i32,
    pub base_uncertainty: i32,
    pub axis_weights: Axes,
    /// Multiplier applied to every step's gain and drop
    pub strength: f64,
}

/// A decision constraint, satisfied by some routes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub id: String,
    pub label: String,
    /// 1 (soft) ..= 3 (hard)
    pub severity: u32,
    pub satisfied_by: Vec<String>,
}

/// One rung of the evidence ladder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceStep {
    pub id: String,
    pub label: String,
    pub base_gain: f64,
    pub base_drop: f64,
    pub influence: Axes,
}

/// Whether accumulated evidence meets the commit threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SealLevel {
    Open,
    Forming,
    Sealed,
}

impl SealLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Forming => "forming",
            Self::Sealed => "sealed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(Self::Open),
            "forming" => Some(Self::Forming),
            "sealed" => Some(Self::Sealed),
            _ => None,
        }
    }
}

impl std::fmt::Display for SealLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Qualitative confidence band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Fragile,
    Emerging,
    Credible,
    Dominant,
}

impl Band {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fragile => "fragile",
            Self::Emerging => "emerging",
            Self::Credible => "credible",
            Self::Dominant => "dominant",
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Letter grade over the confidence/uncertainty margin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        write!(f, "{}", letter)
    }
}

/// Gain/drop applied by a single revealed step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepEffect {
    pub step_id: String,
    pub alignment: f64,
    pub multiplier: f64,
    pub gain: i32,
    pub drop: i32,
}

/// Derived confidence state for a route and revealed set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceSnapshot {
    pub route_id: String,
    /// Severity-weighted satisfied ratio
    pub pressure: f64,
    pub baseline_confidence: i32,
    pub baseline_uncertainty: i32,
    pub confidence: i32,
    pub uncertainty: i32,
    pub revealed: usize,
    pub effects: Vec<StepEffect>,
    pub band: Band,
    pub seal: SealLevel,
    pub grade: Grade,
}

/// Presentation state of one step card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardState {
    /// Next step, not being held
    Pending,
    /// Next step, hold in progress
    InProgress,
    /// Next step, hold complete
    Armed,
    Revealed,
    /// Revealed and frozen by the seal
    Locked,
    /// Prerequisites not revealed
    Disabled,
}
