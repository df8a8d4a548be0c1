use crate::error::CommandError;
use plume_model::{EditorState, Transaction};

/// How a command's dispatch requests are honored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Unchained run: the shared transaction is dispatched on request
    Live,
    /// Inside a chain: dispatch requests are accepted but deferred to
    /// `Chain::run`
    Chained,
    /// `is_enabled` check: nothing is ever dispatched
    DryRun,
}

/// Everything a command sees while it runs
pub struct CommandProps<'a> {
    name: &'a str,
    state: &'a EditorState,
    tr: &'a mut Transaction,
    mode: DispatchMode,
    dispatched: bool,
    foreign: Option<Transaction>,
}

impl<'a> CommandProps<'a> {
    pub(crate) fn new(name: &'a str, state: &'a EditorState, tr: &'a mut Transaction, mode: DispatchMode) -> Self {
        Self {
            name,
            state,
            tr,
            mode,
            dispatched: false,
            foreign: None,
        }
    }

    /// Name the command was registered under
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn state(&self) -> &EditorState {
        self.state
    }

    pub fn tr(&mut self) -> &mut Transaction {
        self.tr
    }

    pub fn transaction(&self) -> &Transaction {
        self.tr
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// False during dry runs. Commands should only build steps when this
    /// is true.
    pub fn can_dispatch(&self) -> bool {
        self.mode != DispatchMode::DryRun
    }

    /// Request dispatch of the shared transaction
    pub fn dispatch(&mut self) {
        if self.can_dispatch() {
            self.dispatched = true;
        }
    }

    /// Dispatch a transaction built outside the shared one.
    ///
    /// Chains only ever dispatch their own transaction, so this fails with
    /// [`CommandError::ForeignTransaction`] inside a chain.
    pub fn dispatch_transaction(&mut self, tr: Transaction) -> Result<(), CommandError> {
        if tr.id() == self.tr.id() {
            self.dispatch();
            return Ok(());
        }
        match self.mode {
            DispatchMode::Live => {
                self.foreign = Some(tr);
                Ok(())
            }
            DispatchMode::Chained => Err(CommandError::ForeignTransaction(self.name.to_string())),
            DispatchMode::DryRun => Ok(()),
        }
    }

    pub(crate) fn finish(self) -> Dispatch {
        match (self.dispatched, self.foreign) {
            (_, Some(tr)) => Dispatch::Foreign(tr),
            (true, None) => Dispatch::Shared,
            (false, None) => Dispatch::None,
        }
    }
}

/// What a finished command asked to dispatch
#[derive(Debug)]
pub(crate) enum Dispatch {
    None,
    Shared,
    Foreign(Transaction),
}

#[cfg(test)]
mod tests {
    use super::*;
    use plume_model::{NodeSpec, Schema, SchemaSpec, StateConfig};
    use std::rc::Rc;

    fn state() -> EditorState {
        let mut spec = SchemaSpec::default();
        spec.nodes.insert(
            "doc".to_string(),
            NodeSpec {
                content: Some("text*".to_string()),
                ..Default::default()
            },
        );
        spec.nodes.insert("text".to_string(), NodeSpec::default());
        EditorState::create(StateConfig::new(Rc::new(Schema::new(spec).unwrap()))).unwrap()
    }

    #[test]
    fn test_chained_rejects_foreign_transaction() {
        let state = state();
        let mut shared = state.tr();
        let shared_id = shared.id();
        let mut props = CommandProps::new("insert", &state, &mut shared, DispatchMode::Chained);

        let err = props.dispatch_transaction(state.tr()).unwrap_err();
        assert_eq!(err, CommandError::ForeignTransaction("insert".to_string()));

        assert_eq!(props.transaction().id(), shared_id);
        props.dispatch();
        assert!(matches!(props.finish(), Dispatch::Shared));
    }

    #[test]
    fn test_dry_run_never_dispatches() {
        let state = state();
        let mut scratch = state.tr();
        let mut props = CommandProps::new("insert", &state, &mut scratch, DispatchMode::DryRun);

        assert!(!props.can_dispatch());
        props.dispatch();
        props.dispatch_transaction(state.tr()).unwrap();
        assert!(matches!(props.finish(), Dispatch::None));
    }

    #[test]
    fn test_live_keeps_foreign_transaction() {
        let state = state();
        let mut shared = state.tr();
        let mut props = CommandProps::new("insert", &state, &mut shared, DispatchMode::Live);

        props.dispatch_transaction(state.tr()).unwrap();
        assert!(matches!(props.finish(), Dispatch::Foreign(_)));
    }
}
