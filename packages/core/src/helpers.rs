//! Helpers are read-only queries over the editor state, registered by name
//! next to commands.

use crate::error::{CommandError, PlumeResult};
use crate::manager::Manager;
use plume_model::EditorState;
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

pub type HelperFn = Rc<dyn Fn(&EditorState, &[Value]) -> Result<Value, CommandError>>;

#[derive(Clone)]
pub struct HelperSpec {
    pub name: String,
    pub helper: HelperFn,
}

impl HelperSpec {
    pub fn new(
        name: impl Into<String>,
        helper: impl Fn(&EditorState, &[Value]) -> Result<Value, CommandError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            helper: Rc::new(helper),
        }
    }
}

impl fmt::Debug for HelperSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperSpec").field("name", &self.name).finish()
    }
}

pub trait HelpersProvider {
    fn create_helpers(&self) -> Vec<HelperSpec>;
}

pub struct Helpers<'m> {
    manager: &'m Manager,
}

impl<'m> Helpers<'m> {
    pub(crate) fn new(manager: &'m Manager) -> Self {
        Self { manager }
    }

    /// Call `name` against the current view state
    pub fn call(&self, name: &str, args: &[Value]) -> PlumeResult<Value> {
        let helper = self.manager.helper(name)?;
        let state = self.manager.view_state()?;
        Ok(helper(state, args)?)
    }

    /// Call `name` and deserialize its result
    pub fn call_as<T: serde::de::DeserializeOwned>(&self, name: &str, args: &[Value]) -> PlumeResult<T> {
        Ok(serde_json::from_value(self.call(name, args)?)?)
    }

    pub fn names(&self) -> Vec<&'m str> {
        self.manager.helper_names()
    }
}
