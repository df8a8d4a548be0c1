//! Per-instance option state
//!
//! ```text
//! built-in defaults → declared defaults → supplied options
//!                          ↓
//!                     OptionStore ──set / reset──► SetOptionsProps
//!                          │
//!                          └── HandlerDispatcher per handler key
//! ```

use super::handlers::{Disposer, HandlerDispatcher, HandlerFn};
use super::schema::{
    OptionKind, OptionSchema, DISABLE_EXTRA_ATTRIBUTES, EXCLUDE, EXTRA_ATTRIBUTES, EXTRA_TAGS,
    PRIORITY,
};
use crate::error::{PlumeError, PlumeResult};
use crate::priority::Priority;
use crate::settings::Exclude;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::rc::Rc;

pub type Options = BTreeMap<String, Value>;

/// Why `on_set_options` was called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateReason {
    Set,
    Reset,
}

/// Per-key result of an option update
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Unchanged,
    Changed { previous_value: Value, value: Value },
}

impl Change {
    pub fn changed(&self) -> bool {
        matches!(self, Change::Changed { .. })
    }
}

/// Passed to `on_set_options` after every `set` or `reset`
#[derive(Debug, Clone, PartialEq)]
pub struct SetOptionsProps {
    pub reason: UpdateReason,
    /// One entry per dynamic key
    pub changes: BTreeMap<String, Change>,
    /// All options after the update
    pub options: Options,
    /// Dynamic options as they were at construction
    pub initial_options: Options,
}

impl SetOptionsProps {
    /// New values of the given keys that changed
    pub fn pick_changed(&self, keys: &[&str]) -> Options {
        keys.iter()
            .filter_map(|key| match self.changes.get(*key) {
                Some(Change::Changed { value, .. }) => Some((key.to_string(), value.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn changed(&self, key: &str) -> bool {
        self.changes.get(key).is_some_and(Change::changed)
    }
}

#[derive(Debug, Clone)]
pub struct OptionStore {
    owner: String,
    schema: Rc<OptionSchema>,
    options: Options,
    initial: Options,
    handlers: BTreeMap<String, HandlerDispatcher>,
}

impl OptionStore {
    /// Merge defaults with the supplied options (`null` or a JSON object)
    pub fn new(owner: impl Into<String>, schema: OptionSchema, supplied: Value) -> PlumeResult<Self> {
        let owner = owner.into();
        let supplied = match supplied {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(PlumeError::Construction(format!(
                    "options for {owner} must be an object, got {other}"
                )))
            }
        };

        for key in supplied.keys() {
            match schema.kind(key) {
                None => {
                    return Err(PlumeError::Construction(format!(
                        "{owner} has no option '{key}'"
                    )))
                }
                Some(OptionKind::Handler | OptionKind::CustomHandler) => {
                    return Err(PlumeError::Construction(format!(
                        "'{key}' of {owner} is a handler and cannot be set as a value"
                    )))
                }
                Some(_) => {}
            }
        }

        let mut options = Options::new();
        let mut handlers = BTreeMap::new();
        for (key, declaration) in schema.declarations() {
            match declaration.kind {
                OptionKind::Handler => {
                    handlers.insert(
                        key.to_string(),
                        HandlerDispatcher::new(key, declaration.early_return.clone()),
                    );
                }
                OptionKind::CustomHandler => {}
                OptionKind::Static | OptionKind::Dynamic => {
                    let value = supplied
                        .get(key)
                        .cloned()
                        .or_else(|| declaration.default.clone());
                    match value {
                        Some(value) => {
                            options.insert(key.to_string(), value);
                        }
                        None => {
                            return Err(PlumeError::Construction(format!(
                                "{owner} requires the option '{key}'"
                            )))
                        }
                    }
                }
            }
        }

        validate_builtin(&owner, &options)?;

        let initial = schema
            .keys_of(OptionKind::Dynamic)
            .filter_map(|key| options.get(key).map(|value| (key.to_string(), value.clone())))
            .collect();

        Ok(Self {
            owner,
            schema: Rc::new(schema),
            options,
            initial,
            handlers,
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn schema(&self) -> &OptionSchema {
        &self.schema
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Deserialize one option value
    pub fn typed<T: DeserializeOwned>(&self, key: &str) -> PlumeResult<T> {
        let value = self.options.get(key).cloned().unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn initial_options(&self) -> &Options {
        &self.initial
    }

    pub fn dynamic_keys(&self) -> Vec<&str> {
        self.schema.keys_of(OptionKind::Dynamic).collect()
    }

    pub fn is_custom_handler(&self, key: &str) -> bool {
        self.schema.kind(key) == Some(OptionKind::CustomHandler)
    }

    pub fn set(&mut self, update: Value) -> PlumeResult<SetOptionsProps> {
        self.set_with(update, &|a, b| a == b)
    }

    /// Like [`set`](Self::set) with a custom equality for the diff
    pub fn set_with(
        &mut self,
        update: Value,
        equals: &dyn Fn(&Value, &Value) -> bool,
    ) -> PlumeResult<SetOptionsProps> {
        let update = match update {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(PlumeError::Construction(format!(
                    "option update for {} must be an object, got {other}",
                    self.owner
                )))
            }
        };

        for key in update.keys() {
            if self.schema.kind(key) != Some(OptionKind::Dynamic) {
                return Err(PlumeError::InvalidOptionUpdate {
                    extension: self.owner.clone(),
                    key: key.clone(),
                });
            }
        }

        Ok(self.apply(update.into_iter().collect(), UpdateReason::Set, equals))
    }

    /// Restore every dynamic option to its construction-time value
    pub fn reset(&mut self) -> SetOptionsProps {
        let initial = self.initial.clone();
        self.apply(initial, UpdateReason::Reset, &|a, b| a == b)
    }

    fn apply(
        &mut self,
        update: Options,
        reason: UpdateReason,
        equals: &dyn Fn(&Value, &Value) -> bool,
    ) -> SetOptionsProps {
        let mut changes = BTreeMap::new();
        for key in self.schema.keys_of(OptionKind::Dynamic) {
            let previous = self.options.get(key).cloned().unwrap_or(Value::Null);
            let change = match update.get(key) {
                Some(next) if !equals(&previous, next) => Change::Changed {
                    previous_value: previous,
                    value: next.clone(),
                },
                _ => Change::Unchanged,
            };
            changes.insert(key.to_string(), change);
        }

        self.options.extend(update);

        SetOptionsProps {
            reason,
            changes,
            options: self.options.clone(),
            initial_options: self.initial.clone(),
        }
    }

    pub fn handler(&self, key: &str) -> Option<&HandlerDispatcher> {
        self.handlers.get(key)
    }

    pub fn add_handler(&self, key: &str, handler: HandlerFn, priority: Priority) -> PlumeResult<Disposer> {
        let dispatcher = self.handlers.get(key).ok_or_else(|| {
            PlumeError::Construction(format!("'{key}' is not a handler option of {}", self.owner))
        })?;
        Ok(dispatcher.add(handler, priority))
    }

    /// Priority from the `priority` option, if set
    pub fn priority(&self) -> Option<Priority> {
        self.get(PRIORITY)
            .and_then(Value::as_i64)
            .and_then(|value| i32::try_from(value).ok())
            .map(Priority)
    }

    pub fn exclude(&self) -> Exclude {
        self.typed(EXCLUDE).unwrap_or_default()
    }

    pub fn extra_tags(&self) -> Vec<String> {
        self.typed(EXTRA_TAGS).unwrap_or_default()
    }

    pub fn extra_attributes(&self) -> Option<&Map<String, Value>> {
        self.get(EXTRA_ATTRIBUTES).and_then(Value::as_object)
    }

    pub fn disable_extra_attributes(&self) -> bool {
        self.get(DISABLE_EXTRA_ATTRIBUTES)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

fn validate_builtin(owner: &str, options: &Options) -> PlumeResult<()> {
    let invalid = |key: &str, expected: &str| {
        PlumeError::Construction(format!("option '{key}' of {owner} must be {expected}"))
    };

    match options.get(PRIORITY) {
        Some(Value::Null) | None => {}
        Some(value) if value.as_i64().and_then(|v| i32::try_from(v).ok()).is_some() => {}
        Some(_) => return Err(invalid(PRIORITY, "an integer or null")),
    }
    if !options.get(EXTRA_ATTRIBUTES).is_some_and(Value::is_object) {
        return Err(invalid(EXTRA_ATTRIBUTES, "an object"));
    }
    if !options.get(DISABLE_EXTRA_ATTRIBUTES).is_some_and(Value::is_boolean) {
        return Err(invalid(DISABLE_EXTRA_ATTRIBUTES, "a boolean"));
    }
    if let Some(exclude) = options.get(EXCLUDE) {
        serde_json::from_value::<Exclude>(exclude.clone())
            .map_err(|_| invalid(EXCLUDE, "an object of boolean flags"))?;
    }
    if let Some(tags) = options.get(EXTRA_TAGS) {
        serde_json::from_value::<Vec<String>>(tags.clone())
            .map_err(|_| invalid(EXTRA_TAGS, "a list of strings"))?;
    }
    Ok(())
}
