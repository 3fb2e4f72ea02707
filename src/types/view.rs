//! View-model snapshots handed to the presentation layer
//!
//! These are derived on demand and never stored as a source of truth.

use serde::{Deserialize, Serialize};
use crate::types::{Band, CardState, GesturePhase, Grade, LadderStage, Route, SealLevel};

/// One criterion row of a score breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionRow {
    pub id: String,
    pub label: String,
    pub weight: f64,
    pub emphasis: f64,
    pub to_a: f64,
    pub to_b: f64,
    pub favors: Option<Route>,
}

/// Per-route score breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub score_a: f64,
    pub score_b: f64,
    /// Route A share of the combined score, 0..=1
    pub balance: f64,
    pub winner: Route,
    pub winner_label: String,
    pub tie: bool,
    pub rows: Vec<CriterionRow>,
    pub reasons: Vec<String>,
}

/// Gesture session view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureView {
    pub phase: GesturePhase,
    pub sample_count: usize,
    pub transitions: u64,
    pub last_reason: String,
    /// Travel relative to the weighing threshold, 0..=1
    pub arming_ratio: f64,
    pub certainty: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
}

/// One evidence step card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepCard {
    pub step_id: String,
    pub label: String,
    pub state: CardState,
    /// Hold progress for the next step, else 0 or 1
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop: Option<i32>,
}

/// Evidence-ladder session view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LadderView {
    pub route_id: String,
    pub route_label: String,
    pub stage: LadderStage,
    pub confidence: i32,
    pub uncertainty: i32,
    pub band: Band,
    pub seal: SealLevel,
    pub grade: Grade,
    /// Revealed steps over total
    pub progress: f64,
    pub cards: Vec<StepCard>,
    pub can_commit: bool,
    pub transitions: u64,
    pub last_reason: String,
}

/// Replay readout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReadout {
    pub captured: usize,
    pub accepted: u64,
    pub rejected: u64,
    pub last_status: String,
    pub last_message: String,
}
