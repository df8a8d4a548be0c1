use super::props::{CommandProps, DispatchMode};
use crate::error::{PlumeError, PlumeResult};
use crate::manager::Manager;
use plume_model::Transaction;
use serde_json::Value;
use tracing::debug;

/// Runs several commands on one transaction and dispatches it once.
///
/// The first failing command stops the chain; `run` then reports its error
/// and discards the transaction. A chain dropped without `run` hands its
/// transaction back to the manager as the pending transaction.
#[must_use = "a chain does nothing until `run` is called"]
pub struct Chain<'m> {
    manager: &'m mut Manager,
    tr: Option<Transaction>,
    error: Option<PlumeError>,
    applied: Vec<String>,
}

impl<'m> Chain<'m> {
    pub(crate) fn new(manager: &'m mut Manager) -> PlumeResult<Self> {
        let tr = manager.take_pending()?;
        Ok(Self {
            manager,
            tr: Some(tr),
            error: None,
            applied: Vec::new(),
        })
    }

    pub fn then(mut self, name: &str, args: &[Value]) -> Self {
        if self.error.is_none() {
            if let Err(err) = self.apply(name, args) {
                self.error = Some(err);
            }
        }
        self
    }

    fn apply(&mut self, name: &str, args: &[Value]) -> PlumeResult<bool> {
        let command = self.manager.command(name)?;
        let Some(tr) = self.tr.as_mut() else {
            return Err(PlumeError::Phase("chain has already been run".to_string()));
        };
        let state = self.manager.view_state()?;

        let mut props = CommandProps::new(name, state, tr, DispatchMode::Chained);
        let handled = command(&mut props, args)?;
        // Dispatch requests are deferred to `run`
        let _ = props.finish();

        self.applied.push(name.to_string());
        Ok(handled)
    }

    /// The transaction being built
    pub fn tr(&self) -> Option<&Transaction> {
        self.tr.as_ref()
    }

    /// Commands applied so far
    pub fn applied(&self) -> &[String] {
        &self.applied
    }

    /// Dispatch the accumulated transaction. Returns whether the state
    /// accepted it.
    pub fn run(mut self) -> PlumeResult<bool> {
        let tr = self.tr.take();
        if let Some(err) = self.error.take() {
            debug!(applied = ?self.applied, error = %err, "Chain failed; discarding its transaction");
            return Err(err);
        }
        let Some(tr) = tr else {
            return Ok(false);
        };

        debug!(commands = ?self.applied, steps = tr.steps().len(), "Running chain");
        self.manager.focus_view()?;
        self.manager.dispatch_transaction(tr)
    }
}

impl Drop for Chain<'_> {
    fn drop(&mut self) {
        if let Some(tr) = self.tr.take() {
            self.manager.restore_pending(tr);
        }
    }
}
