//! Guided tour script types

use serde::{Deserialize, Serialize};
use crate::types::{EvidenceItem, Rule};

/// Side action a step offers the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepAction {
    /// Click the element matching `selector`
    Click { selector: String },
    /// Emphasize an element without interaction
    Highlight { selector: String },
    /// Navigate to a slide
    GotoSlide { slide: String },
}

/// One step of a guided tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourStep {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide: Option<String>,
    pub rule: Rule,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<StepAction>,
}

impl TourStep {
    pub fn new(id: impl Into<String>, title: impl Into<String>, rule: Rule) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            slide: None,
            rule,
            actions: Vec::new(),
        }
    }

    pub fn on_slide(mut self, slide: impl Into<String>) -> Self {
        self.slide = Some(slide.into());
        self
    }

    pub fn with_action(mut self, action: StepAction) -> Self {
        self.actions.push(action);
        self
    }
}

/// Authoring form of a tour, before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TourDefinition {
    pub id: String,
    #[serde(default)]
    pub evidence: Vec<EvidenceItem>,
    pub steps: Vec<TourStep>,
}

/// Tour progress snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourProgress {
    pub started: bool,
    pub finished: bool,
    pub current_step: Option<String>,
    pub completed: Vec<String>,
    pub total: usize,
    pub ratio: f64,
    pub awaiting_manual: bool,
    pub missing_evidence: Vec<String>,
    pub unmet: Vec<String>,
}
