//! Core modules for decisim

pub mod transition;
pub mod normalizer;
pub mod metrics;
pub mod scoring;
pub mod confidence;
pub mod gesture_fsm;
pub mod ladder_fsm;
pub mod evidence;
pub mod tour;
pub mod recorder;
pub mod session;
pub mod replay;
pub mod view;
pub mod api;

pub use transition::Transition;
pub use normalizer::{normalize_point, FrameSampler, InputNormalizer};
pub use metrics::compute_metrics;
pub use scoring::{resolve_winner, CriterionSpec, GestureModel};
pub use confidence::LadderModel;
pub use gesture_fsm::{GestureAction, GestureState};
pub use ladder_fsm::{HoldState, LadderAction, LadderState};
pub use evidence::{evaluate_evidence, evaluate_rule, evaluate_rule_with, DomQuery, EventLog, EvidenceContext, StaticDom};
pub use tour::{TourEngine, TourScript};
pub use recorder::{EnvelopeView, ReplayRecorder};
pub use session::{Dispatched, GestureSession, LadderSession};
pub use replay::{content_hash, Loaded, ReplayEngine, ReplayLibrary, StoredReplay};
pub use view::{gesture_view, ladder_view, replay_readout, score_breakdown, step_cards};
pub use api::{create_router, run_server};
