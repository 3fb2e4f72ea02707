//! Integration tests for trace capture and replay
//!
//! Capture a session, write it to disk, load it back and re-drive a fresh
//! reducer with it.

use decisim::config::SimConfig;
use decisim::core::{
    GestureAction, GestureModel, GestureSession, LadderAction, LadderModel, LadderSession,
    ReplayEngine, ReplayLibrary, StoredReplay,
};
use decisim::types::{PointerKind, Sample};
use pretty_assertions::assert_eq;

fn captured_gesture(engine: &ReplayEngine) -> String {
    let mut session = GestureSession::new(GestureModel::standard());
    let points = [(0.74, 0.62), (0.52, 0.47), (0.31, 0.33), (0.12, 0.20)];
    for (i, (x, y)) in points.iter().enumerate() {
        let kind = match i {
            0 => PointerKind::Down,
            3 => PointerKind::Up,
            _ => PointerKind::Move,
        };
        session.dispatch_sample(Sample::new(kind, i as u64 + 1, *x, *y, 1, "stage"));
    }
    let envelope = session.export(engine.trace_version(), engine.source());
    engine.serialize_envelope(&envelope).unwrap()
}

fn captured_ladder(engine: &ReplayEngine, steps: &[&str]) -> String {
    let mut session = LadderSession::new(LadderModel::standard(), "speed-first").unwrap();
    for step in steps {
        session.dispatch(LadderAction::PointerStart { pointer_id: 2 });
        session.dispatch(LadderAction::PointerFrame { pointer_id: 2, ratio: 0.99 });
        session.dispatch(LadderAction::PointerEnd { pointer_id: 2 });
        session.dispatch(LadderAction::ConfirmStep { step_id: step.to_string() });
    }
    engine.serialize_payload(&engine.build_replay_payload(&session)).unwrap()
}

#[test]
fn test_gesture_trace_survives_disk_roundtrip() {
    let engine = ReplayEngine::standard();
    let json = captured_gesture(&engine);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("speed.trace.json");
    std::fs::write(&path, &json).unwrap();
    let loaded = std::fs::read_to_string(&path).unwrap();

    let result = engine.verify_json(&loaded);
    assert!(result.ok, "{}", result.message);
    assert!(result.message.starts_with("Replay clean"));
    assert_eq!(result.report.unwrap().applied, 4);
}

#[test]
fn test_ladder_payload_replays_clean() {
    let engine = ReplayEngine::standard();
    let json = captured_ladder(&engine, &["benchmark", "pilot"]);
    let result = engine.play_replay_payload(&json);
    assert!(result.ok, "{}", result.message);
    assert_eq!(result.report.unwrap().total_actions, 8);
}

#[test]
fn test_tampered_confidence_diverges() {
    let engine = ReplayEngine::standard();
    let json = captured_ladder(&engine, &["benchmark"]);
    let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
    value["expectedFinalConfidence"] = serde_json::json!(99);

    let result = engine.verify_json(&value.to_string());
    assert!(!result.ok);
    assert!(result.message.starts_with("Replay diverged"));
    let report = result.report.unwrap();
    assert_eq!(report.mismatches.len(), 1);
    assert_eq!(report.mismatches[0].field, "confidence");
    assert_eq!(report.mismatches[0].expected, "99");
}

#[test]
fn test_rejected_event_is_reported_not_fatal() {
    let engine = ReplayEngine::standard();
    let json = r#"{"version":"decisim.trace.v1","source":"gesture-scorer","events":[
        {"kind":"pointermove","seq":1,"x":0.3,"y":0.3,"pointerId":1,"targetId":"stage"},
        {"kind":"pointerdown","seq":2,"x":0.3,"y":0.3,"pointerId":1,"targetId":"stage"}
    ]}"#;
    let result = engine.play_envelope(json);
    assert!(!result.ok);

    let report = result.report.unwrap();
    assert_eq!(report.rejected, 1);
    assert_eq!(report.applied, 1);
    assert_eq!(report.mismatches[0].index, 0);
    assert_eq!(report.mismatches[0].field, "accepted");
    assert_eq!(report.mismatches[0].actual, "R104_NO_ACTIVE_GESTURE");
}

#[test]
fn test_reformatted_json_hashes_the_same() {
    let engine = ReplayEngine::standard();
    let pretty = captured_gesture(&engine);
    let value: serde_json::Value = serde_json::from_str(&pretty).unwrap();
    let compact = serde_json::to_string(&value).unwrap();

    let mut library = ReplayLibrary::new();
    let first = library.load(&engine, &pretty).unwrap();
    let second = library.load(&engine, &compact).unwrap();
    assert!(!first.duplicate);
    assert!(second.duplicate);
    assert_eq!(first.hash, second.hash);
    assert_eq!(library.len(), 1);
    assert!(matches!(library.get(&first.hash), Some(StoredReplay::Gesture(_))));

    let ladder = library.load(&engine, &captured_ladder(&engine, &["benchmark"])).unwrap();
    assert!(!ladder.duplicate);
    assert_eq!(library.len(), 2);
}

#[test]
fn test_custom_namespace_rejects_default_traces() {
    let config = SimConfig {
        trace_namespace: "deck".to_string(),
        ..SimConfig::default()
    };
    let custom = ReplayEngine::new(&config, GestureModel::standard(), LadderModel::standard());
    assert_eq!(custom.trace_version(), "deck.trace.v1");

    let json = captured_gesture(&ReplayEngine::standard());
    let result = custom.verify_json(&json);
    assert!(!result.ok);
    assert!(result.message.contains("version mismatch"));
}

fn export_samples(engine: &ReplayEngine, session: &GestureSession) -> String {
    let envelope = session.export(engine.trace_version(), engine.source());
    engine.serialize_envelope(&envelope).unwrap()
}

#[test]
fn test_cancelled_gesture_replays_with_the_cancel() {
    let engine = ReplayEngine::standard();
    let mut session = GestureSession::new(GestureModel::standard());
    let samples = [
        Sample::new(PointerKind::Down, 1, 0.20, 0.30, 1, "stage"),
        Sample::new(PointerKind::Move, 2, 0.45, 0.50, 1, "stage"),
        Sample::new(PointerKind::Cancel, 3, 0.45, 0.50, 1, "stage"),
        Sample::new(PointerKind::Down, 4, 0.74, 0.62, 1, "stage"),
        Sample::new(PointerKind::Up, 5, 0.12, 0.20, 1, "stage"),
    ];
    for sample in samples {
        assert!(session.dispatch_sample(sample).accepted);
    }

    let json = export_samples(&engine, &session);
    let envelope = engine.parse_envelope(&json).unwrap();
    assert_eq!(envelope.events.len(), 5);
    assert_eq!(envelope.events[2].kind(), PointerKind::Cancel);

    let result = engine.play_envelope(&json);
    assert!(result.ok, "{}", result.message);
    let report = result.report.unwrap();
    assert_eq!(report.applied, 5);
    assert_eq!(report.final_state.phase, "resolved");
}

#[test]
fn test_trace_after_mid_gesture_reset_replays_clean() {
    let engine = ReplayEngine::standard();
    let mut session = GestureSession::new(GestureModel::standard());
    session.dispatch_sample(Sample::new(PointerKind::Down, 1, 0.50, 0.50, 1, "stage"));
    session.dispatch_sample(Sample::new(PointerKind::Move, 2, 0.60, 0.60, 1, "stage"));
    assert!(session.dispatch(GestureAction::Reset).accepted);
    assert!(session.trace().is_empty());

    session.dispatch_sample(Sample::new(PointerKind::Down, 3, 0.22, 0.44, 1, "stage"));
    session.dispatch_sample(Sample::new(PointerKind::Move, 4, 0.46, 0.61, 1, "stage"));
    session.dispatch_sample(Sample::new(PointerKind::Up, 5, 0.82, 0.78, 1, "stage"));

    let json = export_samples(&engine, &session);
    let result = engine.play_envelope(&json);
    assert!(result.ok, "{}", result.message);
    assert_eq!(result.report.unwrap().total_actions, 3);
}

#[test]
fn test_mid_stream_divergence_reported_at_its_index() {
    let engine = ReplayEngine::standard();
    let mut session = LadderSession::new(LadderModel::standard(), "proof-first").unwrap();
    session.dispatch(LadderAction::PointerStart { pointer_id: 1 });
    session.dispatch(LadderAction::PointerFrame { pointer_id: 1, ratio: 1.0 });
    session.dispatch(LadderAction::PointerEnd { pointer_id: 1 });
    session.dispatch(LadderAction::ConfirmStep { step_id: "benchmark".into() });
    let mut payload = engine.build_replay_payload(&session);

    // A short hold still ends in the same final state
    payload.actions[1].ratio = Some(0.1);
    let result = engine.play_replay_payload(&engine.serialize_payload(&payload).unwrap());
    assert!(!result.ok);

    let report = result.report.unwrap();
    assert_eq!(report.mismatches.len(), 1);
    let mismatch = &report.mismatches[0];
    assert_eq!(mismatch.index, 2);
    assert_eq!(mismatch.field, "reason");
    assert_eq!(mismatch.expected, "R012_STEP_ARMED");
    assert_eq!(mismatch.actual, "R013_HOLD_RELEASED");
}
