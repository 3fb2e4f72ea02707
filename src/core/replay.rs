//! Trace capture formats, loading and replay
//!
//! Gesture traces travel as `<ns>.trace.v1` envelopes; ladder sessions as
//! version-1 replay payloads. Loading validates everything up front and
//! replay always starts from a fresh session.

use std::collections::BTreeMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use crate::config::SimConfig;
use crate::core::confidence::LadderModel;
use crate::core::ladder_fsm::LadderAction;
use crate::core::recorder::EnvelopeView;
use crate::core::scoring::GestureModel;
use crate::core::session::{GestureSession, LadderSession};
use crate::error::ReplayLoadError;
use crate::types::{
    EnvelopeState, GestureEnvelope, GestureExpectation, LadderReplayPayload, LadderStage, Mismatch, PlaybackResult,
    PointerKind, ReplayAction, ReplayActionType, ReplayReport, Sample, SealLevel,
};
use crate::LADDER_PAYLOAD_VERSION;

lazy_static! {
    /// `<namespace>.trace.v<major>`
    static ref TRACE_VERSION_RE: Regex = Regex::new(r"^([a-z0-9_-]+)\.trace\.v(\d+)$").unwrap();
}

/// Score tolerance when comparing recorded and replayed outcomes
const SCORE_TOLERANCE: f64 = 1e-9;

/// SHA-256 hex digest of a value's canonical JSON encoding
pub fn content_hash<T: Serialize>(value: &T) -> String {
    let canonical = serde_json::to_vec(value).unwrap_or_default();
    Sha256::digest(&canonical)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Split a trace version tag into namespace and major version
pub fn parse_trace_version(tag: &str) -> Option<(String, u32)> {
    let caps = TRACE_VERSION_RE.captures(tag)?;
    let major = caps.get(2)?.as_str().parse().ok()?;
    Some((caps.get(1)?.as_str().to_string(), major))
}

/// A loaded, validated replay artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum StoredReplay {
    Gesture(GestureEnvelope),
    Ladder(LadderReplayPayload),
}

/// Result of adding an artifact to a library
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Loaded {
    pub hash: String,
    pub duplicate: bool,
}

/// Loads, validates and replays traces against a fixed pair of models
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    trace_version: String,
    source: String,
    gesture: GestureModel,
    ladder: LadderModel,
}

impl ReplayEngine {
    pub fn new(config: &SimConfig, gesture: GestureModel, ladder: LadderModel) -> Self {
        Self {
            trace_version: config.trace_version(),
            source: config.gesture_source.clone(),
            gesture,
            ladder,
        }
    }

    /// Engine with the shipped models and default configuration
    pub fn standard() -> Self {
        Self::new(&SimConfig::default(), GestureModel::standard(), LadderModel::standard())
    }

    pub fn trace_version(&self) -> &str {
        &self.trace_version
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    // -------------------------------------------------------------------------
    // Gesture envelopes
    // -------------------------------------------------------------------------

    pub fn serialize_envelope(&self, envelope: &GestureEnvelope) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(envelope)
    }

    /// Parse and validate a gesture envelope
    pub fn parse_envelope(&self, json: &str) -> Result<GestureEnvelope, ReplayLoadError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| ReplayLoadError::InvalidJson(e.to_string()))?;
        self.envelope_from_value(&value)
    }

    fn envelope_from_value(&self, value: &Value) -> Result<GestureEnvelope, ReplayLoadError> {
        let version = value
            .get("version")
            .and_then(Value::as_str)
            .ok_or(ReplayLoadError::MissingEnvelopeField("version"))?;
        if parse_trace_version(version).is_none() || version != self.trace_version {
            return Err(ReplayLoadError::VersionMismatch {
                expected: self.trace_version.clone(),
                actual: version.to_string(),
            });
        }

        let source = value
            .get("source")
            .and_then(Value::as_str)
            .ok_or(ReplayLoadError::MissingEnvelopeField("source"))?;
        if source != self.source {
            return Err(ReplayLoadError::SourceMismatch {
                expected: self.source.clone(),
                actual: source.to_string(),
            });
        }

        let raw_events = value
            .get("events")
            .and_then(Value::as_array)
            .ok_or(ReplayLoadError::MissingEnvelopeField("events"))?;

        let mut events = Vec::with_capacity(raw_events.len());
        let mut previous: i64 = 0;
        for (index, raw) in raw_events.iter().enumerate() {
            let sample = parse_event(index, raw, previous)?;
            previous = sample.seq() as i64;
            events.push(sample);
        }

        let expect = match value.get("expect") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(
                serde_json::from_value::<GestureExpectation>(raw.clone())
                    .map_err(|e| ReplayLoadError::InvalidJson(format!("expect: {}", e)))?,
            ),
        };

        Ok(GestureEnvelope {
            version: version.to_string(),
            source: source.to_string(),
            events,
            expect,
        })
    }

    /// Re-drive a fresh gesture session with the envelope's events
    pub fn replay_gesture(&self, envelope: &GestureEnvelope) -> ReplayReport {
        let mut session = GestureSession::new(self.gesture.clone());
        let mut mismatches = Vec::new();
        let mut applied = 0;

        for (index, sample) in envelope.events.iter().enumerate() {
            let result = session.dispatch_sample(sample.clone());
            if result.accepted {
                applied += 1;
            } else {
                mismatches.push(rejected_mismatch(index, result.reason.code()));
            }
        }

        let final_index = envelope.events.len();
        let state = session.state();
        if let Some(expect) = &envelope.expect {
            compare(&mut mismatches, final_index, "phase", expect.phase.as_str(), state.phase.as_str());
            match &state.score {
                Some(score) => {
                    compare(&mut mismatches, final_index, "winner", &expect.winner.to_string(), &score.winner.to_string());
                    compare_score(&mut mismatches, final_index, "scoreA", expect.score_a, score.score_a);
                    compare_score(&mut mismatches, final_index, "scoreB", expect.score_b, score.score_b);
                }
                None => mismatches.push(Mismatch {
                    index: final_index,
                    field: "winner".to_string(),
                    expected: expect.winner.to_string(),
                    actual: "none".to_string(),
                }),
            }
        }

        let final_state = state.envelope(true, state.last_reason);
        finish_report(envelope.events.len(), applied, mismatches, final_state)
    }

    // -------------------------------------------------------------------------
    // Ladder payloads
    // -------------------------------------------------------------------------

    pub fn serialize_payload(&self, payload: &LadderReplayPayload) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(payload)
    }

    /// Payload of a live session, stamped with the current time
    pub fn build_replay_payload(&self, session: &LadderSession) -> LadderReplayPayload {
        let created_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        session.build_payload(&created_at)
    }

    /// Parse and validate a ladder payload, decoding its actions
    pub fn parse_payload(&self, json: &str) -> Result<(LadderReplayPayload, Vec<LadderAction>), ReplayLoadError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| ReplayLoadError::InvalidJson(e.to_string()))?;
        self.payload_from_value(&value)
    }

    fn payload_from_value(&self, value: &Value) -> Result<(LadderReplayPayload, Vec<LadderAction>), ReplayLoadError> {
        let version = value
            .get("version")
            .ok_or(ReplayLoadError::MissingEnvelopeField("version"))?;
        if version.as_u64() != Some(u64::from(LADDER_PAYLOAD_VERSION)) {
            return Err(ReplayLoadError::VersionMismatch {
                expected: LADDER_PAYLOAD_VERSION.to_string(),
                actual: version.to_string(),
            });
        }

        let route_id = value
            .get("routeId")
            .and_then(Value::as_str)
            .ok_or(ReplayLoadError::MissingEnvelopeField("routeId"))?;
        if self.ladder.route(route_id).is_none() {
            return Err(ReplayLoadError::UnknownRoute(route_id.to_string()));
        }

        let digest = value
            .get("constraintDigest")
            .and_then(Value::as_str)
            .ok_or(ReplayLoadError::MissingEnvelopeField("constraintDigest"))?;
        let active = self.ladder.constraint_digest();
        if digest != active {
            return Err(ReplayLoadError::DigestMismatch {
                expected: active,
                actual: digest.to_string(),
            });
        }

        let raw_actions = value
            .get("actions")
            .and_then(Value::as_array)
            .ok_or(ReplayLoadError::MissingEnvelopeField("actions"))?;
        let mut wire = Vec::with_capacity(raw_actions.len());
        let mut actions = Vec::with_capacity(raw_actions.len());
        for (index, raw) in raw_actions.iter().enumerate() {
            let action = parse_action(index, raw)?;
            actions.push(LadderAction::from_replay(index, &action)?);
            wire.push(action);
        }

        let created_at_iso = required_str(value, "createdAtIso")?;
        let stage = required_str(value, "expectedFinalStage")?;
        let expected_final_stage = LadderStage::parse(stage)
            .ok_or_else(|| ReplayLoadError::InvalidJson(format!("unknown stage '{}'", stage)))?;
        let seal = required_str(value, "expectedSealLevel")?;
        let expected_seal_level = SealLevel::parse(seal)
            .ok_or_else(|| ReplayLoadError::InvalidJson(format!("unknown seal level '{}'", seal)))?;

        let payload = LadderReplayPayload {
            version: LADDER_PAYLOAD_VERSION,
            created_at_iso: created_at_iso.to_string(),
            route_id: route_id.to_string(),
            constraint_digest: digest.to_string(),
            actions: wire,
            expected_final_stage,
            expected_final_confidence: required_int(value, "expectedFinalConfidence")?,
            expected_final_uncertainty: required_int(value, "expectedFinalUncertainty")?,
            expected_seal_level,
        };
        Ok((payload, actions))
    }

    /// Re-drive a fresh ladder session with decoded actions
    pub fn replay_ladder(&self, payload: &LadderReplayPayload, actions: &[LadderAction]) -> ReplayReport {
        let mut session = match LadderSession::new(self.ladder.clone(), &payload.route_id) {
            Ok(session) => session,
            Err(_) => {
                let state = EnvelopeState {
                    phase: LadderStage::Idle.as_str().to_string(),
                    value: 0.0,
                    uncertainty: 0.0,
                    seal: None,
                    accepted: false,
                    reason: format!("unknown route '{}'", payload.route_id),
                };
                let mismatch = Mismatch {
                    index: 0,
                    field: "routeId".to_string(),
                    expected: payload.route_id.clone(),
                    actual: "unknown".to_string(),
                };
                return finish_report(actions.len(), 0, vec![mismatch], state);
            }
        };

        let mut mismatches = Vec::new();
        let mut applied = 0;
        for (index, action) in actions.iter().enumerate() {
            let result = session.dispatch(action.clone());
            if result.accepted {
                applied += 1;
            } else {
                mismatches.push(rejected_mismatch(index, result.reason.code()));
                continue;
            }
            // recorded reasons pin down mid-stream divergence
            if let Some(recorded) = payload.actions.get(index).and_then(|a| a.reason.as_deref()) {
                compare(&mut mismatches, index, "reason", recorded, result.reason.code());
            }
        }

        let final_index = actions.len();
        let state = session.state();
        compare(&mut mismatches, final_index, "stage", payload.expected_final_stage.as_str(), state.stage.as_str());
        compare(
            &mut mismatches,
            final_index,
            "confidence",
            &payload.expected_final_confidence.to_string(),
            &state.confidence.confidence.to_string(),
        );
        compare(
            &mut mismatches,
            final_index,
            "uncertainty",
            &payload.expected_final_uncertainty.to_string(),
            &state.confidence.uncertainty.to_string(),
        );
        compare(&mut mismatches, final_index, "sealLevel", payload.expected_seal_level.as_str(), state.seal().as_str());

        let final_state = state.envelope(true, state.last_reason);
        finish_report(actions.len(), applied, mismatches, final_state)
    }

    /// Load and replay a ladder payload, never failing
    pub fn play_replay_payload(&self, json: &str) -> PlaybackResult {
        match self.parse_payload(json) {
            Ok((payload, actions)) => {
                let report = self.replay_ladder(&payload, &actions);
                PlaybackResult::from_report(content_hash(&payload), report)
            }
            Err(err) => {
                warn!("Ladder payload rejected: {}", err);
                PlaybackResult::failure(err.to_string())
            }
        }
    }

    /// Load and replay a gesture envelope, never failing
    pub fn play_envelope(&self, json: &str) -> PlaybackResult {
        match self.parse_envelope(json) {
            Ok(envelope) => {
                let report = self.replay_gesture(&envelope);
                PlaybackResult::from_report(content_hash(&envelope), report)
            }
            Err(err) => {
                warn!("Gesture envelope rejected: {}", err);
                PlaybackResult::failure(err.to_string())
            }
        }
    }

    /// Parse either artifact, detected by the type of `version`
    pub fn load(&self, json: &str) -> Result<StoredReplay, ReplayLoadError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| ReplayLoadError::InvalidJson(e.to_string()))?;
        match value.get("version") {
            Some(Value::String(_)) => self.envelope_from_value(&value).map(StoredReplay::Gesture),
            Some(Value::Number(_)) => self.payload_from_value(&value).map(|(p, _)| StoredReplay::Ladder(p)),
            Some(_) => Err(ReplayLoadError::VersionMismatch {
                expected: format!("{} or {}", self.trace_version, LADDER_PAYLOAD_VERSION),
                actual: value["version"].to_string(),
            }),
            None => Err(ReplayLoadError::MissingEnvelopeField("version")),
        }
    }

    /// Verify any replay artifact
    pub fn verify_json(&self, json: &str) -> PlaybackResult {
        match self.load(json) {
            Ok(StoredReplay::Gesture(envelope)) => {
                let report = self.replay_gesture(&envelope);
                info!("Verified gesture envelope: {}", report.summary);
                PlaybackResult::from_report(content_hash(&envelope), report)
            }
            Ok(StoredReplay::Ladder(payload)) => self.play_stored_payload(&payload),
            Err(err) => {
                warn!("Replay artifact rejected: {}", err);
                PlaybackResult::failure(err.to_string())
            }
        }
    }

    fn play_stored_payload(&self, payload: &LadderReplayPayload) -> PlaybackResult {
        let decoded: Result<Vec<LadderAction>, ReplayLoadError> = payload
            .actions
            .iter()
            .enumerate()
            .map(|(index, action)| LadderAction::from_replay(index, action))
            .collect();
        match decoded {
            Ok(actions) => {
                let report = self.replay_ladder(payload, &actions);
                info!("Verified ladder payload: {}", report.summary);
                PlaybackResult::from_report(content_hash(payload), report)
            }
            Err(err) => PlaybackResult::failure(err.to_string()),
        }
    }
}

fn parse_event(index: usize, raw: &Value, previous: i64) -> Result<Sample, ReplayLoadError> {
    let kind_name = raw
        .get("kind")
        .and_then(Value::as_str)
        .ok_or(ReplayLoadError::MissingField { index, field: "kind" })?;
    let kind = PointerKind::from_wire(kind_name).ok_or_else(|| ReplayLoadError::UnsupportedKind {
        index,
        kind: kind_name.to_string(),
    })?;

    let seq = raw
        .get("seq")
        .and_then(Value::as_i64)
        .ok_or(ReplayLoadError::MissingField { index, field: "seq" })?;
    if seq <= previous {
        return Err(ReplayLoadError::SequenceOrder { index, seq, previous });
    }

    let x = raw
        .get("x")
        .and_then(Value::as_f64)
        .ok_or(ReplayLoadError::MissingField { index, field: "x" })?;
    let y = raw
        .get("y")
        .and_then(Value::as_f64)
        .ok_or(ReplayLoadError::MissingField { index, field: "y" })?;
    let pointer_id = raw
        .get("pointerId")
        .and_then(Value::as_i64)
        .ok_or(ReplayLoadError::MissingField { index, field: "pointerId" })?;
    let target_id = raw
        .get("targetId")
        .and_then(Value::as_str)
        .ok_or(ReplayLoadError::MissingField { index, field: "targetId" })?;
    let button = match raw.get("button").and_then(Value::as_i64) {
        Some(value) => i32::try_from(value).map_err(|_| ReplayLoadError::OutOfRange { field: "button", value })?,
        None => 0,
    };

    Ok(Sample::new(kind, seq as u64, x, y, pointer_id, target_id).with_button(button))
}

fn parse_action(index: usize, raw: &Value) -> Result<ReplayAction, ReplayLoadError> {
    let type_name = raw
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ReplayLoadError::MissingField { index, field: "type" })?;
    let action_type = ReplayActionType::from_wire(type_name).ok_or_else(|| ReplayLoadError::UnsupportedKind {
        index,
        kind: type_name.to_string(),
    })?;
    Ok(ReplayAction {
        action_type,
        step_id: raw.get("stepId").and_then(Value::as_str).map(str::to_string),
        pointer_id: raw.get("pointerId").and_then(Value::as_i64),
        ratio: raw.get("ratio").and_then(Value::as_f64),
        reason: raw.get("reason").and_then(Value::as_str).map(str::to_string),
    })
}

fn required_str<'a>(value: &'a Value, field: &'static str) -> Result<&'a str, ReplayLoadError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .ok_or(ReplayLoadError::MissingEnvelopeField(field))
}

fn required_int(value: &Value, field: &'static str) -> Result<i32, ReplayLoadError> {
    let raw = value
        .get(field)
        .and_then(Value::as_i64)
        .ok_or(ReplayLoadError::MissingEnvelopeField(field))?;
    i32::try_from(raw).map_err(|_| ReplayLoadError::OutOfRange { field, value: raw })
}

fn rejected_mismatch(index: usize, reason: &str) -> Mismatch {
    Mismatch {
        index,
        field: "accepted".to_string(),
        expected: "accepted".to_string(),
        actual: reason.to_string(),
    }
}

fn compare(mismatches: &mut Vec<Mismatch>, index: usize, field: &str, expected: &str, actual: &str) {
    if expected != actual {
        mismatches.push(Mismatch {
            index,
            field: field.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
}

fn compare_score(mismatches: &mut Vec<Mismatch>, index: usize, field: &str, expected: f64, actual: f64) {
    if (expected - actual).abs() > SCORE_TOLERANCE {
        mismatches.push(Mismatch {
            index,
            field: field.to_string(),
            expected: format!("{:.4}", expected),
            actual: format!("{:.4}", actual),
        });
    }
}

fn finish_report(
    total_actions: usize,
    applied: usize,
    mismatches: Vec<Mismatch>,
    final_state: EnvelopeState,
) -> ReplayReport {
    let rejected = total_actions - applied;
    let summary = if mismatches.is_empty() {
        format!("Replay clean: {} actions applied, final phase {}", applied, final_state.phase)
    } else {
        format!(
            "Replay diverged: {} mismatches ({} of {} actions rejected)",
            mismatches.len(),
            rejected,
            total_actions
        )
    };
    ReplayReport {
        total_actions,
        applied,
        rejected,
        mismatches,
        final_state,
        summary,
    }
}

/// Replay artifacts keyed by content hash
#[derive(Debug, Clone, Default)]
pub struct ReplayLibrary {
    entries: BTreeMap<String, StoredReplay>,
}

impl ReplayLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store; identical content maps to the same key
    pub fn load(&mut self, engine: &ReplayEngine, json: &str) -> Result<Loaded, ReplayLoadError> {
        let stored = engine.load(json)?;
        let hash = match &stored {
            StoredReplay::Gesture(envelope) => content_hash(envelope),
            StoredReplay::Ladder(payload) => content_hash(payload),
        };
        let duplicate = self.entries.contains_key(&hash);
        if !duplicate {
            self.entries.insert(hash.clone(), stored);
        }
        Ok(Loaded { hash, duplicate })
    }

    pub fn get(&self, hash: &str) -> Option<&StoredReplay> {
        self.entries.get(hash)
    }

    pub fn hashes(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::types::Route;

    fn gesture_envelope(engine: &ReplayEngine) -> GestureEnvelope {
        let mut session = GestureSession::new(GestureModel::standard());
        let points = [(0.22, 0.44), (0.32, 0.51), (0.46, 0.61), (0.62, 0.72), (0.82, 0.78)];
        for (i, (x, y)) in points.iter().enumerate() {
            let kind = match i {
                0 => PointerKind::Down,
                4 => PointerKind::Up,
                _ => PointerKind::Move,
            };
            session.dispatch_sample(Sample::new(kind, i as u64 + 1, *x, *y, 1, "stage"));
        }
        session.export(engine.trace_version(), engine.source())
    }

    #[test]
    fn test_trace_version_regex() {
        assert_eq!(parse_trace_version("decisim.trace.v1"), Some(("decisim".to_string(), 1)));
        assert_eq!(parse_trace_version("Decisim.trace.v1"), None);
        assert_eq!(parse_trace_version("decisim.trace.1"), None);
    }

    #[test]
    fn test_envelope_roundtrip() {
        let engine = ReplayEngine::standard();
        let envelope = gesture_envelope(&engine);
        let json = engine.serialize_envelope(&envelope).unwrap();
        assert_eq!(engine.parse_envelope(&json).unwrap(), envelope);
    }

    #[test]
    fn test_gesture_replay_is_clean() {
        let engine = ReplayEngine::standard();
        let envelope = gesture_envelope(&engine);
        assert_eq!(envelope.expect.as_ref().unwrap().winner, Route::B);
        let report = engine.replay_gesture(&envelope);
        assert!(report.is_clean(), "{:?}", report.mismatches);
        assert_eq!(report.applied, 5);
    }

    #[test]
    fn test_tampered_expectation_reports_final_index() {
        let engine = ReplayEngine::standard();
        let mut envelope = gesture_envelope(&engine);
        if let Some(expect) = envelope.expect.as_mut() {
            expect.winner = Route::A;
        }
        let report = engine.replay_gesture(&envelope);
        assert_eq!(report.mismatches.len(), 1);
        assert_eq!(report.mismatches[0].index, 5);
        assert_eq!(report.mismatches[0].field, "winner");
    }

    #[test]
    fn test_wrong_version_rejected() {
        let engine = ReplayEngine::standard();
        let json = r#"{"version":"other.trace.v1","source":"gesture-scorer","events":[]}"#;
        assert!(matches!(
            engine.parse_envelope(json),
            Err(ReplayLoadError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_wrong_source_rejected() {
        let engine = ReplayEngine::standard();
        let json = r#"{"version":"decisim.trace.v1","source":"mouse","events":[]}"#;
        assert!(matches!(
            engine.parse_envelope(json),
            Err(ReplayLoadError::SourceMismatch { .. })
        ));
    }

    #[test]
    fn test_sequence_order_rejected() {
        let engine = ReplayEngine::standard();
        let json = r#"{"version":"decisim.trace.v1","source":"gesture-scorer","events":[
            {"kind":"pointerdown","seq":2,"x":0.1,"y":0.1,"pointerId":1,"button":0,"targetId":"stage"},
            {"kind":"pointermove","seq":2,"x":0.2,"y":0.2,"pointerId":1,"button":0,"targetId":"stage"}
        ]}"#;
        let err = engine.parse_envelope(json).unwrap_err();
        assert_eq!(err, ReplayLoadError::SequenceOrder { index: 1, seq: 2, previous: 2 });
        assert!(err.to_string().starts_with("sequence order"));
    }

    #[test]
    fn test_unsupported_kind_and_missing_fields() {
        let engine = ReplayEngine::standard();
        let kind = r#"{"version":"decisim.trace.v1","source":"gesture-scorer","events":[
            {"kind":"wheel","seq":1,"x":0.1,"y":0.1,"pointerId":1,"targetId":"stage"}]}"#;
        assert!(matches!(
            engine.parse_envelope(kind),
            Err(ReplayLoadError::UnsupportedKind { index: 0, .. })
        ));

        let target = r#"{"version":"decisim.trace.v1","source":"gesture-scorer","events":[
            {"kind":"pointerdown","seq":1,"x":0.1,"y":0.1,"pointerId":1}]}"#;
        assert_eq!(
            engine.parse_envelope(target),
            Err(ReplayLoadError::MissingField { index: 0, field: "targetId" })
        );
    }

    #[test]
    fn test_out_of_range_button_rejected() {
        let engine = ReplayEngine::standard();
        let json = r#"{"version":"decisim.trace.v1","source":"gesture-scorer","events":[
            {"kind":"pointerdown","seq":1,"x":0.1,"y":0.1,"pointerId":1,"button":4294967296,"targetId":"stage"}]}"#;
        assert_eq!(
            engine.parse_envelope(json),
            Err(ReplayLoadError::OutOfRange { field: "button", value: 4_294_967_296 })
        );
    }

    #[test]
    fn test_coordinates_clamped() {
        let engine = ReplayEngine::standard();
        let json = r#"{"version":"decisim.trace.v1","source":"gesture-scorer","events":[
            {"kind":"pointerdown","seq":1,"x":-3.0,"y":7.5,"pointerId":1,"targetId":"stage"}]}"#;
        let envelope = engine.parse_envelope(json).unwrap();
        assert_eq!((envelope.events[0].x(), envelope.events[0].y()), (0.0, 1.0));
    }

    fn sealed_payload(engine: &ReplayEngine) -> LadderReplayPayload {
        let mut session = LadderSession::new(LadderModel::standard(), "proof-first").unwrap();
        for step in ["benchmark", "pilot", "audit"] {
            session.dispatch(LadderAction::PointerStart { pointer_id: 1 });
            session.dispatch(LadderAction::PointerFrame { pointer_id: 1, ratio: 1.0 });
            session.dispatch(LadderAction::PointerEnd { pointer_id: 1 });
            session.dispatch(LadderAction::ConfirmStep { step_id: step.to_string() });
        }
        session.dispatch(LadderAction::CommitSeal);
        engine.build_replay_payload(&session)
    }

    #[test]
    fn test_ladder_build_then_play_is_clean() {
        let engine = ReplayEngine::standard();
        let payload = sealed_payload(&engine);
        assert_eq!(payload.expected_final_stage, LadderStage::Sealed);
        let json = engine.serialize_payload(&payload).unwrap();

        let result = engine.play_replay_payload(&json);
        assert!(result.ok, "{}", result.message);
        assert_eq!(result.hash, Some(content_hash(&payload)));
    }

    #[test]
    fn test_ladder_digest_mismatch() {
        let engine = ReplayEngine::standard();
        let mut payload = sealed_payload(&engine);
        payload.constraint_digest = "0000000000000000".to_string();
        let json = engine.serialize_payload(&payload).unwrap();
        let result = engine.play_replay_payload(&json);
        assert!(!result.ok);
        assert!(result.message.contains("digest"));
    }

    #[test]
    fn test_ladder_unknown_route_and_type() {
        let engine = ReplayEngine::standard();
        let mut payload = sealed_payload(&engine);
        payload.route_id = "moonshot".to_string();
        let json = engine.serialize_payload(&payload).unwrap();
        assert_eq!(
            engine.parse_payload(&json).unwrap_err(),
            ReplayLoadError::UnknownRoute("moonshot".to_string())
        );

        let payload = sealed_payload(&engine);
        let json = engine
            .serialize_payload(&payload)
            .unwrap()
            .replacen("COMMIT_SEAL", "TELEPORT", 1);
        assert!(matches!(
            engine.parse_payload(&json),
            Err(ReplayLoadError::UnsupportedKind { .. })
        ));
    }

    #[test]
    fn test_ladder_out_of_range_expectation_rejected() {
        let engine = ReplayEngine::standard();
        let mut value = serde_json::to_value(sealed_payload(&engine)).unwrap();
        value["expectedFinalConfidence"] = serde_json::json!(4_294_967_396_i64);
        let err = engine.parse_payload(&value.to_string()).unwrap_err();
        assert_eq!(
            err,
            ReplayLoadError::OutOfRange { field: "expectedFinalConfidence", value: 4_294_967_396 }
        );
        assert!(!engine.verify_json(&value.to_string()).ok);
    }

    #[test]
    fn test_ladder_wrong_version() {
        let engine = ReplayEngine::standard();
        let payload = sealed_payload(&engine);
        let mut value = serde_json::to_value(&payload).unwrap();
        value["version"] = serde_json::json!(2);
        let result = engine.play_replay_payload(&value.to_string());
        assert!(!result.ok);
        assert!(result.message.contains("version mismatch"));
    }

    #[test]
    fn test_verify_detects_kind() {
        let engine = ReplayEngine::standard();
        let gesture = engine.serialize_envelope(&gesture_envelope(&engine)).unwrap();
        let ladder = engine.serialize_payload(&sealed_payload(&engine)).unwrap();
        assert!(engine.verify_json(&gesture).ok);
        assert!(engine.verify_json(&ladder).ok);
        assert!(!engine.verify_json("{}").ok);
        assert!(!engine.verify_json("not json").ok);
    }

    #[test]
    fn test_library_flags_duplicates() {
        let engine = ReplayEngine::standard();
        let json = engine.serialize_envelope(&gesture_envelope(&engine)).unwrap();
        let mut library = ReplayLibrary::new();
        let first = library.load(&engine, &json).unwrap();
        let second = library.load(&engine, &json).unwrap();
        assert!(!first.duplicate);
        assert!(second.duplicate);
        assert_eq!(first.hash, second.hash);
        assert_eq!(library.len(), 1);
    }
}
