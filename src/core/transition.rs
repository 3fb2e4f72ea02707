//! Reducer result shared by both state machines

use crate::types::ReasonCode;

/// Outcome of `reduce(state, action)`
///
/// A rejected action returns the input state unchanged with a reason code;
/// reducers never fail or panic.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S> {
    pub state: S,
    pub accepted: bool,
    pub reason: ReasonCode,
}

impl<S: Clone> Transition<S> {
    pub fn accepted(state: S, reason: ReasonCode) -> Self {
        Self { state, accepted: true, reason }
    }

    pub fn rejected(state: &S, reason: ReasonCode) -> Self {
        Self {
            state: state.clone(),
            accepted: false,
            reason,
        }
    }
}
