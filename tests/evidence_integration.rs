//! Integration tests for evidence rules and guided tours
//!
//! Tours are authored as JSON, validated, then driven by a growing event log.

use decisim::core::{evaluate_rule, EventLog, EvidenceContext, StaticDom, TourEngine, TourScript};
use decisim::error::ScriptError;
use decisim::types::{EvidenceEvent, Primitive, Rule, TourDefinition};

const TOUR: &str = r##"{
    "id": "ladder-walkthrough",
    "evidence": [
        {"id": "paid-plan", "source": {"kind": "event", "name": "plan:select", "where": {"tier": ["pro", "team"]}}},
        {"id": "two-holds", "source": {"kind": "event", "name": "ladder:hold", "min_count": 2}},
        {"id": "on-ladder", "source": {"kind": "slide", "slides": ["ladder", "ladder-detail"]}},
        {"id": "modal-gone", "source": {"kind": "selector", "selector": "#welcome-modal", "mode": "missing"}}
    ],
    "steps": [
        {"id": "dismiss", "title": "Close the welcome modal", "rule": {"type": "evidence", "id": "modal-gone"},
         "actions": [{"type": "click", "selector": "#welcome-modal .close"}]},
        {"id": "pick-plan", "title": "Pick a paid plan", "rule": {"type": "evidence", "id": "paid-plan"}},
        {"id": "hold", "title": "Hold two steps", "slide": "ladder",
         "rule": {"type": "all", "rules": [
            {"type": "evidence", "id": "on-ladder"},
            {"type": "evidence", "id": "two-holds"}
         ]}},
        {"id": "share", "title": "Share or sign off", "rule": {"type": "any", "rules": [
            {"type": "event", "name": "share:sent"},
            {"type": "manual"}
        ]}}
    ]
}"##;

fn script() -> TourScript {
    let definition: TourDefinition = serde_json::from_str(TOUR).unwrap();
    TourScript::new(definition).unwrap()
}

#[test]
fn test_tour_walkthrough() {
    let mut engine = TourEngine::new(script());
    engine.start();

    let mut log = EventLog::new();
    let mut dom = StaticDom::new(["#welcome-modal"]);

    // Modal still open: nothing completes
    assert!(engine.evaluate(&EvidenceContext::new(&log, Some("intro"), &dom)).is_empty());
    assert_eq!(engine.progress().unmet, vec!["selector '#welcome-modal' still present".to_string()]);

    dom.remove("#welcome-modal");
    log.append(EvidenceEvent::new("plan:select", 1.0).with("tier", "free"));
    let advanced = engine.evaluate(&EvidenceContext::new(&log, Some("intro"), &dom));
    assert_eq!(advanced, vec!["dismiss".to_string()]);
    assert_eq!(engine.progress().missing_evidence, vec!["paid-plan".to_string()]);

    log.append(EvidenceEvent::new("plan:select", 2.0).with("tier", "team"));
    log.append(EvidenceEvent::new("ladder:hold", 3.0));
    let advanced = engine.evaluate(&EvidenceContext::new(&log, Some("ladder"), &dom));
    assert_eq!(advanced, vec!["pick-plan".to_string()]);

    // all() reports the unmet child only
    let progress = engine.progress();
    assert_eq!(progress.current_step.as_deref(), Some("hold"));
    assert_eq!(progress.missing_evidence, vec!["two-holds".to_string()]);
    assert_eq!(progress.unmet, vec!["event 'ladder:hold' seen 1/2".to_string()]);

    log.append(EvidenceEvent::new("ladder:hold", 4.0));
    let advanced = engine.evaluate(&EvidenceContext::new(&log, Some("ladder-detail"), &dom));
    assert_eq!(advanced, vec!["hold".to_string()]);
    assert!(engine.progress().awaiting_manual);

    assert!(engine.confirm_manual(&EvidenceContext::new(&log, Some("ladder-detail"), &dom)));
    let progress = engine.progress();
    assert!(progress.finished);
    assert_eq!(progress.completed.len(), 4);
    assert_eq!(progress.ratio, 1.0);
}

#[test]
fn test_list_payload_matches_scalar_filter() {
    let mut log = EventLog::new();
    log.append(
        EvidenceEvent::new("export:done", 1.0)
            .with_list("formats", vec![Primitive::from("pdf"), Primitive::from("csv")]),
    );
    let dom = StaticDom::default();
    let ctx = EvidenceContext::new(&log, None, &dom);

    let rule: Rule = serde_json::from_str(
        r#"{"type": "event", "name": "export:done", "where": {"formats": "csv"}}"#,
    )
    .unwrap();
    assert!(evaluate_rule(&rule, &Default::default(), &ctx).matched);

    let rule: Rule = serde_json::from_str(
        r#"{"type": "event", "name": "export:done", "where": {"formats": ["csv", "xlsx"]}}"#,
    )
    .unwrap();
    assert!(!evaluate_rule(&rule, &Default::default(), &ctx).matched);
}

#[test]
fn test_manual_rule_never_matches_on_its_own() {
    let log = EventLog::new();
    let dom = StaticDom::default();
    let ctx = EvidenceContext::new(&log, None, &dom);
    assert!(!evaluate_rule(&Rule::Manual, &Default::default(), &ctx).matched);
}

#[test]
fn test_authoring_errors_fail_fast() {
    let broken = TOUR.replace(r#""id": "paid-plan"}"#, r#""id": "free-plan"}"#);
    let definition: TourDefinition = serde_json::from_str(&broken).unwrap();
    assert_eq!(
        TourScript::new(definition),
        Err(ScriptError::UndeclaredEvidence {
            step: "pick-plan".into(),
            evidence: "free-plan".into(),
        })
    );
}
