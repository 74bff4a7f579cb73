// src/state/mod.rs

//! Per-unit compilation state and its transitions.
//!
//! - [`UnitState`] is the state a unit is in.
//! - [`machine`] applies the legal transitions to units of a graph
//!   (invalidation, dispatch, job completion, forced rebuild).

pub mod machine;

pub use machine::StateMachine;

/// Build state of a compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitState {
    /// Compiled output is believed to match the source.
    Normal,
    /// Must be recompiled before its output can be trusted.
    Invalid,
    /// Member of a dispatched job that has not completed yet.
    Compiling,
}

impl UnitState {
    /// Whether the transition `self -> next` is one the state machine makes
    /// on its own. Dispatch and job completion go through this; forced
    /// rebuilds bypass it.
    pub fn can_transition_to(self, next: UnitState) -> bool {
        matches!(
            (self, next),
            (UnitState::Normal, UnitState::Invalid)
                | (UnitState::Invalid, UnitState::Invalid)
                | (UnitState::Invalid, UnitState::Compiling)
                | (UnitState::Compiling, UnitState::Normal)
                | (UnitState::Compiling, UnitState::Invalid)
        )
    }
}

impl std::fmt::Display for UnitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UnitState::Normal => "normal",
            UnitState::Invalid => "invalid",
            UnitState::Compiling => "compiling",
        };
        f.write_str(s)
    }
}
