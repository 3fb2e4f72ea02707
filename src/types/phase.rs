//! Lifecycle positions for the two state machines

use serde::{Deserialize, Serialize};

/// Gesture-scoring lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GesturePhase {
    /// No gesture yet
    Idle,
    /// Pointer is down, movement below threshold
    Aiming,
    /// Pointer moved far enough to be scored
    Weighing,
    /// Pointer released, score frozen
    Committed,
    /// Outcome resolved; a new pointer-down starts over
    Resolved,
}

impl GesturePhase {
    /// Is a pointer gesture in flight?
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Aiming | Self::Weighing)
    }

    /// Get ANSI color name for terminal display
    pub fn color_name(&self) -> &'static str {
        match self {
            Self::Idle => "bright black",
            Self::Aiming => "yellow",
            Self::Weighing => "cyan",
            Self::Committed => "blue",
            Self::Resolved => "green",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Aiming => "aiming",
            Self::Weighing => "weighing",
            Self::Committed => "committed",
            Self::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for GesturePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Evidence-ladder lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LadderStage {
    Idle,
    Step1,
    Step2,
    Step3,
    /// Terminal until an explicit session reset
    Sealed,
}

impl LadderStage {
    /// Stage reached after `revealed` steps
    pub fn from_revealed(revealed: usize) -> Self {
        match revealed {
            0 => Self::Idle,
            1 => Self::Step1,
            2 => Self::Step2,
            _ => Self::Step3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Step1 => "step1",
            Self::Step2 => "step2",
            Self::Step3 => "step3",
            Self::Sealed => "sealed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "idle" => Some(Self::Idle),
            "step1" => Some(Self::Step1),
            "step2" => Some(Self::Step2),
            "step3" => Some(Self::Step3),
            "sealed" => Some(Self::Sealed),
            _ => None,
        }
    }

    pub fn color_name(&self) -> &'static str {
        match self {
            Self::Idle => "bright black",
            Self::Step1 | Self::Step2 | Self::Step3 => "yellow",
            Self::Sealed => "green",
        }
    }
}

impl std::fmt::Display for LadderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}
