//! Evidence / rule engine
//!
//! Evaluates declared evidence items and completion rule trees against an
//! append-only event log, the current slide and a DOM query capability.
//! Nothing here mutates the context.

use std::collections::{BTreeMap, BTreeSet};
use crate::types::{
    EvidenceEvent, EvidenceItem, EvidenceSource, PayloadValue, Rule, RuleOutcome, SelectorMode,
    WhereFilter,
};

/// Append-only log of observed events
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<EvidenceEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: EvidenceEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[EvidenceEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events with `name` whose payload passes `filter`
    pub fn count(&self, name: &str, filter: Option<&WhereFilter>) -> usize {
        self.events
            .iter()
            .filter(|e| e.name == name)
            .filter(|e| filter.map_or(true, |f| matches_filter(&e.payload, f)))
            .count()
    }
}

/// Answers whether an element matching a selector currently exists
pub trait DomQuery {
    fn exists(&self, selector: &str) -> bool;
}

/// Fixed set of present selectors
#[derive(Debug, Clone, Default)]
pub struct StaticDom {
    present: BTreeSet<String>,
}

impl StaticDom {
    pub fn new<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            present: selectors.into_iter().map(Into::into).collect(),
        }
    }

    pub fn insert(&mut self, selector: impl Into<String>) {
        self.present.insert(selector.into());
    }

    pub fn remove(&mut self, selector: &str) {
        self.present.remove(selector);
    }
}

impl DomQuery for StaticDom {
    fn exists(&self, selector: &str) -> bool {
        self.present.contains(selector)
    }
}

/// Read-only inputs for one evaluation
pub struct EvidenceContext<'a> {
    pub log: &'a EventLog,
    pub current_slide: Option<&'a str>,
    pub dom: &'a dyn DomQuery,
}

impl<'a> EvidenceContext<'a> {
    pub fn new(log: &'a EventLog, current_slide: Option<&'a str>, dom: &'a dyn DomQuery) -> Self {
        Self { log, current_slide, dom }
    }
}

/// Does a payload satisfy every entry of the filter?
pub fn matches_filter(payload: &BTreeMap<String, PayloadValue>, filter: &WhereFilter) -> bool {
    filter.iter().all(|(key, expected)| match payload.get(key) {
        None => false,
        Some(actual) => value_matches(actual, expected),
    })
}

fn value_matches(actual: &PayloadValue, expected: &PayloadValue) -> bool {
    match (actual, expected) {
        (PayloadValue::Scalar(a), PayloadValue::Scalar(e)) => a == e,
        (PayloadValue::List(items), PayloadValue::Scalar(e)) => items.contains(e),
        (PayloadValue::List(items), PayloadValue::List(wanted)) => {
            wanted.iter().all(|w| items.contains(w))
        }
        (PayloadValue::Scalar(a), PayloadValue::List(options)) => options.contains(a),
    }
}

/// Evaluate one declared evidence item
pub fn evaluate_evidence(item: &EvidenceItem, ctx: &EvidenceContext<'_>) -> RuleOutcome {
    let outcome = evaluate_source(&item.source, ctx);
    if outcome.matched {
        return outcome;
    }
    RuleOutcome {
        matched: false,
        missing_evidence: vec![item.id.clone()],
        unmet: outcome.unmet,
    }
}

fn evaluate_source(source: &EvidenceSource, ctx: &EvidenceContext<'_>) -> RuleOutcome {
    match source {
        EvidenceSource::Event { name, filter, min_count } => {
            check_event(ctx, name, filter.as_ref(), *min_count)
        }
        EvidenceSource::Slide { slides } => check_slide(ctx, slides),
        EvidenceSource::Selector { selector, mode } => {
            let present = ctx.dom.exists(selector);
            match (mode, present) {
                (SelectorMode::Present, true) | (SelectorMode::Missing, false) => RuleOutcome::matched(),
                (SelectorMode::Present, false) => {
                    RuleOutcome::unmet(format!("selector '{}' not present", selector))
                }
                (SelectorMode::Missing, true) => {
                    RuleOutcome::unmet(format!("selector '{}' still present", selector))
                }
            }
        }
    }
}

fn check_event(ctx: &EvidenceContext<'_>, name: &str, filter: Option<&WhereFilter>, min_count: u32) -> RuleOutcome {
    let seen = ctx.log.count(name, filter);
    if seen >= min_count as usize {
        return RuleOutcome::matched();
    }
    let scope = if filter.is_some() { " (filtered)" } else { "" };
    RuleOutcome::unmet(format!("event '{}'{} seen {}/{}", name, scope, seen, min_count))
}

fn check_slide(ctx: &EvidenceContext<'_>, slides: &[String]) -> RuleOutcome {
    match ctx.current_slide {
        Some(current) if slides.iter().any(|s| s == current) => RuleOutcome::matched(),
        current => RuleOutcome::unmet(format!(
            "slide is '{}', expected one of [{}]",
            current.unwrap_or("none"),
            slides.join(", ")
        )),
    }
}

/// Evaluate a rule tree against declared evidence
///
/// `all` evaluates every child and aggregates their diagnostics; `any` stops
/// at the first match. `manual` never matches on its own.
pub fn evaluate_rule(
    rule: &Rule,
    evidence: &BTreeMap<String, EvidenceItem>,
    ctx: &EvidenceContext<'_>,
) -> RuleOutcome {
    evaluate_rule_with(rule, evidence, ctx, false)
}

/// Evaluate a rule tree, optionally treating `manual` nodes as confirmed
///
/// Confirmation satisfies the manual nodes only; the rest of the tree must
/// still match.
pub fn evaluate_rule_with(
    rule: &Rule,
    evidence: &BTreeMap<String, EvidenceItem>,
    ctx: &EvidenceContext<'_>,
    manual_confirmed: bool,
) -> RuleOutcome {
    match rule {
        Rule::Manual if manual_confirmed => RuleOutcome::matched(),
        Rule::Manual => RuleOutcome::unmet("manual confirmation required"),
        Rule::Evidence { id } => match evidence.get(id) {
            Some(item) => evaluate_evidence(item, ctx),
            None => RuleOutcome::missing(id.clone(), format!("evidence '{}' is not declared", id)),
        },
        Rule::Event { name, filter, min_count } => check_event(ctx, name, filter.as_ref(), *min_count),
        Rule::Slide { slides } => check_slide(ctx, slides),
        Rule::All { rules } => {
            let mut outcome = RuleOutcome::matched();
            for child in rules {
                let result = evaluate_rule_with(child, evidence, ctx, manual_confirmed);
                if !result.matched {
                    outcome.matched = false;
                    outcome.absorb(result);
                }
            }
            outcome
        }
        Rule::Any { rules } => {
            let mut outcome = RuleOutcome::default();
            for child in rules {
                let result = evaluate_rule_with(child, evidence, ctx, manual_confirmed);
                if result.matched {
                    return RuleOutcome::matched();
                }
                outcome.absorb(result);
            }
            outcome
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
