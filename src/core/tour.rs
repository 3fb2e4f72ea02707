//! Guided tour engine
//!
//! A validated script of steps, each gated by a completion rule. The engine
//! keeps only a cursor and the completed list; evidence comes in through an
//! `EvidenceContext` on every evaluation.

use std::collections::{BTreeMap, BTreeSet};
use crate::core::evidence::{evaluate_rule, evaluate_rule_with, EvidenceContext};
use crate::error::ScriptError;
use crate::types::{EvidenceItem, Rule, RuleOutcome, StepAction, TourDefinition, TourProgress, TourStep};

/// A tour definition that passed authoring-time validation
#[derive(Debug, Clone, PartialEq)]
pub struct TourScript {
    id: String,
    evidence: BTreeMap<String, EvidenceItem>,
    steps: Vec<TourStep>,
}

impl TourScript {
    /// Validate a definition
    pub fn new(definition: TourDefinition) -> Result<Self, ScriptError> {
        if definition.steps.is_empty() {
            return Err(ScriptError::EmptyScript);
        }

        let mut evidence = BTreeMap::new();
        for item in definition.evidence {
            if evidence.contains_key(&item.id) {
                return Err(ScriptError::DuplicateEvidence(item.id));
            }
            evidence.insert(item.id.clone(), item);
        }

        let mut seen = BTreeSet::new();
        for step in &definition.steps {
            if !seen.insert(step.id.as_str()) {
                return Err(ScriptError::DuplicateStep(step.id.clone()));
            }
            validate_rule(&step.id, &step.rule, &evidence)?;
            for action in &step.actions {
                if let StepAction::Click { selector } = action {
                    if selector.trim().is_empty() {
                        return Err(ScriptError::EmptySelector(step.id.clone()));
                    }
                }
            }
        }

        Ok(Self {
            id: definition.id,
            evidence,
            steps: definition.steps,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn steps(&self) -> &[TourStep] {
        &self.steps
    }

    pub fn evidence(&self) -> &BTreeMap<String, EvidenceItem> {
        &self.evidence
    }

    /// Evaluate a step's rule without touching any cursor
    pub fn evaluate_step(&self, index: usize, ctx: &EvidenceContext<'_>) -> Option<RuleOutcome> {
        self.steps
            .get(index)
            .map(|step| evaluate_rule(&step.rule, &self.evidence, ctx))
    }
}

fn validate_rule(step: &str, rule: &Rule, evidence: &BTreeMap<String, EvidenceItem>) -> Result<(), ScriptError> {
    match rule {
        Rule::Evidence { id } if !evidence.contains_key(id) => Err(ScriptError::UndeclaredEvidence {
            step: step.to_string(),
            evidence: id.clone(),
        }),
        Rule::All { rules } | Rule::Any { rules } => {
            if rules.is_empty() {
                let group = if matches!(rule, Rule::All { .. }) { "all" } else { "any" };
                return Err(ScriptError::EmptyGroup {
                    step: step.to_string(),
                    group,
                });
            }
            rules.iter().try_for_each(|child| validate_rule(step, child, evidence))
        }
        _ => Ok(()),
    }
}

/// Cursor over a tour script
#[derive(Debug, Clone)]
pub struct TourEngine {
    script: TourScript,
    started: bool,
    cursor: usize,
    completed: Vec<String>,
    last_outcome: Option<RuleOutcome>,
}

impl TourEngine {
    pub fn new(script: TourScript) -> Self {
        Self {
            script,
            started: false,
            cursor: 0,
            completed: Vec::new(),
            last_outcome: None,
        }
    }

    pub fn script(&self) -> &TourScript {
        &self.script
    }

    /// Open the first step
    pub fn start(&mut self) {
        self.started = true;
        self.cursor = 0;
        self.completed.clear();
        self.last_outcome = None;
    }

    pub fn reset(&mut self) {
        self.started = false;
        self.cursor = 0;
        self.completed.clear();
        self.last_outcome = None;
    }

    pub fn is_finished(&self) -> bool {
        self.started && self.cursor >= self.script.steps.len()
    }

    pub fn current_step(&self) -> Option<&TourStep> {
        if !self.started {
            return None;
        }
        self.script.steps.get(self.cursor)
    }

    /// Complete steps while their rules match
    ///
    /// Returns the ids of the steps completed by this call.
    pub fn evaluate(&mut self, ctx: &EvidenceContext<'_>) -> Vec<String> {
        let mut advanced = Vec::new();
        while let Some(step) = self.current_step() {
            let outcome = evaluate_rule(&step.rule, &self.script.evidence, ctx);
            if !outcome.matched {
                self.last_outcome = Some(outcome);
                break;
            }
            let id = step.id.clone();
            self.complete_current(id.clone());
            advanced.push(id);
        }
        if self.is_finished() {
            self.last_outcome = None;
        }
        advanced
    }

    /// Complete the current step by manual confirmation
    ///
    /// Confirmation satisfies the step's manual nodes only; any other
    /// conditions in the rule must already hold in `ctx`.
    pub fn confirm_manual(&mut self, ctx: &EvidenceContext<'_>) -> bool {
        let step = match self.current_step() {
            Some(step) if step.rule.has_manual() => step,
            _ => return false,
        };
        let outcome = evaluate_rule_with(&step.rule, &self.script.evidence, ctx, true);
        if !outcome.matched {
            self.last_outcome = Some(outcome);
            return false;
        }
        let id = step.id.clone();
        self.complete_current(id);
        self.last_outcome = None;
        true
    }

    fn complete_current(&mut self, id: String) {
        self.completed.push(id);
        self.cursor += 1;
    }

    pub fn progress(&self) -> TourProgress {
        let total = self.script.steps.len();
        let current = self.current_step();
        let (missing_evidence, unmet) = match &self.last_outcome {
            Some(outcome) => (outcome.missing_evidence.clone(), outcome.unmet.clone()),
            None => (Vec::new(), Vec::new()),
        };
        TourProgress {
            started: self.started,
            finished: self.is_finished(),
            current_step: current.map(|s| s.id.clone()),
            completed: self.completed.clone(),
            total,
            ratio: crate::round4(self.completed.len() as f64 / total as f64),
            awaiting_manual: current.map_or(false, |s| s.rule.has_manual()),
            missing_evidence,
            unmet,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
