//! Error types for decisim
//!
//! Runtime rejections never show up here: reducers report them as reason
//! codes and replay reports them as mismatches. These enums cover authoring
//! violations, malformed payloads, and CLI/config failures.

use thiserror::Error;

/// Result type for fallible construction and I/O
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for the CLI and server
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Replay payload rejected on load
    #[error(transparent)]
    Replay(#[from] ReplayLoadError),

    /// Script or model failed validation
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Reasons a replay payload is rejected before any action is applied
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReplayLoadError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    #[error("source mismatch: expected {expected}, got {actual}")]
    SourceMismatch { expected: String, actual: String },

    #[error("sequence order: event {index} has seq {seq} after {previous}")]
    SequenceOrder { index: usize, seq: i64, previous: i64 },

    #[error("unsupported event kind '{kind}' at index {index}")]
    UnsupportedKind { index: usize, kind: String },

    #[error("missing required field '{field}' at index {index}")]
    MissingField { index: usize, field: &'static str },

    #[error("missing required field '{0}'")]
    MissingEnvelopeField(&'static str),

    #[error("unknown route '{0}'")]
    UnknownRoute(String),

    #[error("field '{field}' out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("constraint digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },
}

/// Authoring-time violations (programmer errors, fail fast)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    #[error("script has no steps")]
    EmptyScript,

    #[error("duplicate step id '{0}'")]
    DuplicateStep(String),

    #[error("duplicate evidence id '{0}'")]
    DuplicateEvidence(String),

    #[error("step '{step}' has an empty {group} group")]
    EmptyGroup { step: String, group: &'static str },

    #[error("step '{step}' references undeclared evidence '{evidence}'")]
    UndeclaredEvidence { step: String, evidence: String },

    #[error("step '{0}' has a click action with an empty selector")]
    EmptySelector(String),

    #[error("criterion weights sum to {0}, expected 1")]
    WeightSum(f64),

    #[error("duplicate criterion id '{0}'")]
    DuplicateCriterion(String),

    #[error("ladder needs exactly three steps, got {0}")]
    LadderSize(usize),

    #[error("duplicate route id '{0}'")]
    DuplicateRoute(String),
}
