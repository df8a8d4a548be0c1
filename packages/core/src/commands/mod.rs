//! # Commands
//!
//! Extensions contribute named commands once a view is attached. Every
//! command runs against [`CommandProps`]: the live state, the manager's
//! pending transaction and a dispatch mode.
//!
//! ```text
//! commands().run(name)          chain().then(a).then(b).run()
//!        │                                 │
//!        ▼                                 ▼
//!  pending tr ── Live ──► dispatch    pending tr ── Chained ──► one dispatch
//!                                          (foreign transactions rejected)
//! ```
//!
//! The pending transaction is created lazily from the view state and reused
//! until the document version moves past its start version.

mod chain;
mod props;
mod registry;

pub use chain::Chain;
pub use props::{CommandProps, DispatchMode};

pub(crate) use props::Dispatch;
pub(crate) use registry::Registry;

use crate::error::{CommandError, PlumeResult};
use crate::manager::Manager;
use serde_json::Value;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Returns whether the command applied. Errors abort the command and
/// discard the transaction it was building.
pub type CommandFn = Rc<dyn Fn(&mut CommandProps<'_>, &[Value]) -> Result<bool, CommandError>>;

/// Names that collide with the command accessors
pub const RESERVED_COMMAND_NAMES: &[&str] = &["run", "chain"];

#[derive(Clone)]
pub struct CommandSpec {
    pub name: String,
    pub command: CommandFn,
}

impl CommandSpec {
    pub fn new(
        name: impl Into<String>,
        command: impl Fn(&mut CommandProps<'_>, &[Value]) -> Result<bool, CommandError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            command: Rc::new(command),
        }
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec").field("name", &self.name).finish()
    }
}

pub trait CommandsProvider {
    fn create_commands(&self) -> Vec<CommandSpec>;
}

/// Unchained command access
pub struct Commands<'m> {
    manager: &'m mut Manager,
}

impl<'m> Commands<'m> {
    pub(crate) fn new(manager: &'m mut Manager) -> Self {
        Self { manager }
    }

    /// Focus the view and run `name` on the pending transaction. The
    /// transaction is dispatched only if the command asks for it. Returns
    /// `false` if the command did not apply or a filter rejected its
    /// transaction.
    pub fn run(&mut self, name: &str, args: &[Value]) -> PlumeResult<bool> {
        let command = self.manager.command(name)?;
        self.manager.focus_view()?;
        let mut tr = self.manager.take_pending()?;

        let (result, dispatch) = {
            let state = self.manager.view_state()?;
            let mut props = CommandProps::new(name, state, &mut tr, DispatchMode::Live);
            let result = command(&mut props, args);
            (result, props.finish())
        };

        let handled = match result {
            Ok(handled) => handled,
            Err(err) => {
                debug!(command = name, error = %err, "Command failed; discarding its transaction");
                return Err(err.into());
            }
        };

        let accepted = match dispatch {
            Dispatch::Shared => self.manager.dispatch_transaction(tr)?,
            Dispatch::Foreign(foreign) => {
                self.manager.restore_pending(tr);
                self.manager.dispatch_transaction(foreign)?
            }
            Dispatch::None => {
                self.manager.restore_pending(tr);
                true
            }
        };
        Ok(handled && accepted)
    }

    /// Dry run of `name` against a scratch transaction
    pub fn is_enabled(&self, name: &str, args: &[Value]) -> PlumeResult<bool> {
        let command = self.manager.command(name)?;
        let state = self.manager.view_state()?;
        let mut scratch = state.tr();
        let mut props = CommandProps::new(name, state, &mut scratch, DispatchMode::DryRun);
        Ok(command(&mut props, args)?)
    }

    pub fn has(&self, name: &str) -> bool {
        self.manager.command(name).is_ok()
    }

    pub fn names(&self) -> Vec<&str> {
        self.manager.command_names()
    }
}
