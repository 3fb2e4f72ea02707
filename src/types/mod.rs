//! Core types for decisim

mod phase;
mod reason;
mod sample;
mod metrics;
mod score;
mod ladder;
mod evidence;
mod tour;
mod replay;
mod view;

pub use phase::{GesturePhase, LadderStage};
pub use reason::ReasonCode;
pub use sample::{Bounds, PointerKind, RawPointer, Sample};
pub use metrics::GestureMetrics;
pub use score::{Contribution, Criterion, Route, ScoreSnapshot};
pub use ladder::{Axes, Band, CardState, ConfidenceSnapshot, Constraint, EvidenceStep, Grade, RouteProfile, SealLevel, StepEffect};
pub use evidence::{EvidenceEvent, EvidenceItem, EvidenceSource, PayloadValue, Primitive, Rule, RuleOutcome, SelectorMode, WhereFilter};
pub use tour::{StepAction, TourDefinition, TourProgress, TourStep};
pub use replay::{
    EnvelopeState, GestureEnvelope, GestureExpectation, LadderReplayPayload, Mismatch,
    PlaybackResult, ReplayAction, ReplayActionType, ReplayEntry, ReplayReport,
};
pub use view::{CriterionRow, GestureView, LadderView, ReplayReadout, ScoreBreakdown, StepCard};
