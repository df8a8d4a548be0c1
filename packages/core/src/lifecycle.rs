//! # Lifecycle
//!
//! ```text
//! None ──► Create ──► EditorView ──► Runtime ──► Destroy
//!           │            │              │
//!      on_create     on_view     on_state_update   on_destroy
//! ```
//!
//! Phases only move forward. Hooks run in resolved (priority) order and the
//! first failing hook aborts the rest of its phase.

use crate::error::{PlumeError, PlumeResult};
use crate::store::{ExtensionStore, ManagerStore};
use crate::view::View;
use plume_model::{EditorState, Transaction};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ManagerPhase {
    #[default]
    None,
    Create,
    EditorView,
    Runtime,
    Destroy,
}

impl ManagerPhase {
    /// Move to `next`, refusing to go backwards
    pub fn advance(&mut self, next: ManagerPhase) -> PlumeResult<()> {
        if next < *self {
            return Err(PlumeError::Phase(format!(
                "cannot move from {self} back to {next}"
            )));
        }
        *self = next;
        Ok(())
    }

    pub fn is_destroyed(&self) -> bool {
        *self == ManagerPhase::Destroy
    }
}

impl fmt::Display for ManagerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ManagerPhase::None => "none",
            ManagerPhase::Create => "create",
            ManagerPhase::EditorView => "editor-view",
            ManagerPhase::Runtime => "runtime",
            ManagerPhase::Destroy => "destroy",
        };
        f.write_str(name)
    }
}

/// Passed to `on_create`. No document state exists yet.
pub struct CreateContext<'a> {
    pub store: &'a mut ExtensionStore,
    pub manager_store: &'a ManagerStore,
}

/// Passed to `on_view`
pub struct ViewContext<'a> {
    pub view: &'a dyn View,
    pub store: &'a ExtensionStore,
    pub manager_store: &'a ManagerStore,
}

/// Passed to `on_state_update` once per accepted transaction
pub struct StateUpdateProps<'a> {
    pub previous_state: &'a EditorState,
    pub state: &'a EditorState,
    pub tr: Option<&'a Transaction>,
    /// True only for the first update after the view was attached
    pub first_update: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_are_monotonic() {
        let mut phase = ManagerPhase::default();
        phase.advance(ManagerPhase::Create).unwrap();
        phase.advance(ManagerPhase::Runtime).unwrap();
        phase.advance(ManagerPhase::Runtime).unwrap();

        assert!(phase.advance(ManagerPhase::EditorView).is_err());
        assert_eq!(phase, ManagerPhase::Runtime);

        phase.advance(ManagerPhase::Destroy).unwrap();
        assert!(phase.is_destroyed());
        assert!(phase.advance(ManagerPhase::Create).is_err());
    }
}
