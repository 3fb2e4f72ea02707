//! Pointer samples and raw input

use serde::{Deserialize, Serialize};

/// Kind of pointer event that produced a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    #[serde(rename = "pointerdown")]
    Down,
    #[serde(rename = "pointermove")]
    Move,
    #[serde(rename = "pointerup")]
    Up,
    #[serde(rename = "pointercancel")]
    Cancel,
}

impl PointerKind {
    /// Wire name used in trace envelopes
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Down => "pointerdown",
            Self::Move => "pointermove",
            Self::Up => "pointerup",
            Self::Cancel => "pointercancel",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "pointerdown" => Some(Self::Down),
            "pointermove" => Some(Self::Move),
            "pointerup" => Some(Self::Up),
            "pointercancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}

/// A normalized, sequenced pointer sample (immutable once built)
///
/// Deserialization goes through [`Sample::new`], so coordinates read from a
/// trace are clamped and rounded exactly like live input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SampleRecord")]
pub struct Sample {
    kind: PointerKind,
    /// Monotonic within a session
    seq: u64,
    /// Unit-square x
    x: f64,
    /// Unit-square y
    y: f64,
    pointer_id: i64,
    button: i32,
    target_id: String,
}

/// Wire shape of a sample before normalization
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SampleRecord {
    kind: PointerKind,
    seq: u64,
    x: f64,
    y: f64,
    pointer_id: i64,
    #[serde(default)]
    button: i32,
    target_id: String,
}

impl From<SampleRecord> for Sample {
    fn from(record: SampleRecord) -> Self {
        Sample::new(record.kind, record.seq, record.x, record.y, record.pointer_id, record.target_id)
            .with_button(record.button)
    }
}

impl Sample {
    /// Build a sample, clamping and rounding coordinates
    pub fn new(
        kind: PointerKind,
        seq: u64,
        x: f64,
        y: f64,
        pointer_id: i64,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            seq,
            x: crate::round4(crate::clamp01(x)),
            y: crate::round4(crate::clamp01(y)),
            pointer_id,
            button: 0,
            target_id: target_id.into(),
        }
    }

    pub fn with_button(mut self, button: i32) -> Self {
        self.button = button;
        self
    }

    pub fn kind(&self) -> PointerKind {
        self.kind
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn pointer_id(&self) -> i64 {
        self.pointer_id
    }

    pub fn button(&self) -> i32 {
        self.button
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Euclidean distance to another sample
    pub fn distance_to(&self, other: &Sample) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Device-space pointer event before normalization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPointer {
    pub kind: PointerKind,
    pub client_x: f64,
    pub client_y: f64,
    pub pointer_id: i64,
    pub button: i32,
}

/// Device-space rectangle of the interactive surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Unit square itself
    pub fn unit() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}
