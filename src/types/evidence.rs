//! Evidence declarations, completion rules and evidence events

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

/// A primitive payload value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Primitive {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<&str> for Primitive {
    fn from(value: &str) -> Self {
        Primitive::Text(value.to_string())
    }
}

impl From<f64> for Primitive {
    fn from(value: f64) -> Self {
        Primitive::Number(value)
    }
}

impl From<bool> for Primitive {
    fn from(value: bool) -> Self {
        Primitive::Bool(value)
    }
}

/// Payload field: a primitive or an array of primitives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    List(Vec<Primitive>),
    Scalar(Primitive),
}

impl From<Primitive> for PayloadValue {
    fn from(value: Primitive) -> Self {
        PayloadValue::Scalar(value)
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        PayloadValue::Scalar(value.into())
    }
}

impl From<f64> for PayloadValue {
    fn from(value: f64) -> Self {
        PayloadValue::Scalar(value.into())
    }
}

impl From<bool> for PayloadValue {
    fn from(value: bool) -> Self {
        PayloadValue::Scalar(value.into())
    }
}

/// Exact-match filter over event payloads
pub type WhereFilter = BTreeMap<String, PayloadValue>;

/// An observed, named event (the engine only ever reads these)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceEvent {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub payload: BTreeMap<String, PayloadValue>,
    pub ts: f64,
}

impl EvidenceEvent {
    pub fn new(name: impl Into<String>, ts: f64) -> Self {
        Self {
            name: name.into(),
            payload: BTreeMap::new(),
            ts,
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn with_list(mut self, key: impl Into<String>, values: Vec<Primitive>) -> Self {
        self.payload.insert(key.into(), PayloadValue::List(values));
        self
    }
}

/// Selector evidence mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorMode {
    #[default]
    Present,
    Missing,
}

fn default_min_count() -> u32 {
    1
}

/// Closed set of evidence sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvidenceSource {
    /// Count of logged events with this name (optionally filtered) >= min_count
    Event {
        name: String,
        #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
        filter: Option<WhereFilter>,
        #[serde(default = "default_min_count")]
        min_count: u32,
    },
    /// Current slide/phase is one of these
    Slide { slides: Vec<String> },
    /// An element matching the selector exists (or, in missing mode, does not)
    Selector {
        selector: String,
        #[serde(default)]
        mode: SelectorMode,
    },
}

/// Declared atomic predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub id: String,
    pub source: EvidenceSource,
}

impl EvidenceItem {
    pub fn event(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: EvidenceSource::Event {
                name: name.into(),
                filter: None,
                min_count: 1,
            },
        }
    }

    pub fn slide(id: impl Into<String>, slides: &[&str]) -> Self {
        Self {
            id: id.into(),
            source: EvidenceSource::Slide {
                slides: slides.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    pub fn selector(id: impl Into<String>, selector: impl Into<String>, mode: SelectorMode) -> Self {
        Self {
            id: id.into(),
            source: EvidenceSource::Selector {
                selector: selector.into(),
                mode,
            },
        }
    }
}

/// Completion rule tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    /// Never auto-satisfied
    Manual,
    /// Delegates to a declared evidence item
    Evidence { id: String },
    Event {
        name: String,
        #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
        filter: Option<WhereFilter>,
        #[serde(default = "default_min_count")]
        min_count: u32,
    },
    Slide { slides: Vec<String> },
    All { rules: Vec<Rule> },
    Any { rules: Vec<Rule> },
}

impl Rule {
    pub fn evidence(id: impl Into<String>) -> Self {
        Rule::Evidence { id: id.into() }
    }

    pub fn event(name: impl Into<String>) -> Self {
        Rule::Event {
            name: name.into(),
            filter: None,
            min_count: 1,
        }
    }

    /// Does the tree contain a manual node?
    pub fn has_manual(&self) -> bool {
        match self {
            Rule::Manual => true,
            Rule::All { rules } | Rule::Any { rules } => rules.iter().any(Rule::has_manual),
            _ => false,
        }
    }
}

/// Result of evaluating a rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleOutcome {
    pub matched: bool,
    /// Evidence ids that did not match
    pub missing_evidence: Vec<String>,
    /// Human-readable summaries of unmet checks
    pub unmet: Vec<String>,
}

impl RuleOutcome {
    pub fn matched() -> Self {
        Self {
            matched: true,
            ..Default::default()
        }
    }

    pub fn unmet(summary: impl Into<String>) -> Self {
        Self {
            matched: false,
            missing_evidence: Vec::new(),
            unmet: vec![summary.into()],
        }
    }

    pub fn missing(id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            matched: false,
            missing_evidence: vec![id.into()],
            unmet: vec![summary.into()],
        }
    }

    /// Merge diagnostics of a failed child into this outcome
    pub fn absorb(&mut self, other: RuleOutcome) {
        for id in other.missing_evidence {
            if !self.missing_evidence.contains(&id) {
                self.missing_evidence.push(id);
            }
        }
        self.unmet.extend(other.unmet);
    }
}
