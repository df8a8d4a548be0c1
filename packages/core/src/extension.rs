//! # Extensions
//!
//! An extension is a unit of editor behavior. Every extension has a unique
//! name, an [`OptionStore`], a priority and lifecycle hooks. Optional
//! contributions (commands, helpers, a plugin, schema attributes, view
//! attributes, node views) are exposed through capability probes which the
//! manager indexes once when it is created.
//!
//! ```text
//! Extension
//!   ├─ kind() ─────────────── Plain | Node(&dyn NodeExtension) | Mark(&dyn MarkExtension)
//!   ├─ as_commands() ──────── Option<&dyn CommandsProvider>
//!   ├─ as_helpers() ───────── Option<&dyn HelpersProvider>
//!   ├─ as_plugin() ────────── Option<&dyn PluginProvider>
//!   ├─ as_schema_attributes() Option<&dyn SchemaAttributesProvider>
//!   ├─ as_attributes() ────── Option<&dyn AttributesProvider>
//!   └─ as_node_views() ────── Option<&dyn NodeViewsProvider>
//! ```

use crate::attributes::AttributesProvider;
use crate::commands::CommandsProvider;
use crate::error::{PlumeError, PlumeResult};
use crate::helpers::HelpersProvider;
use crate::lifecycle::{CreateContext, StateUpdateProps, ViewContext};
use crate::options::{Disposer, HandlerFn, OptionSchema, OptionStore, SetOptionsProps};
use crate::plugins::PluginProvider;
use crate::priority::Priority;
use crate::schema::{MarkExtension, NodeExtension, SchemaAttributesProvider};
use crate::view::NodeViewsProvider;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Downcasting support for extension and bundle trait objects.
///
/// Implemented for every `'static` type. Call these through `&dyn
/// Extension` (not on a `Box`), otherwise the box itself is inspected.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Identity of an extension type (the analogue of a constructor)
#[derive(Clone, Copy)]
pub struct ExtensionKey {
    id: TypeId,
    type_name: &'static str,
}

impl ExtensionKey {
    pub fn of<T: Extension>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without its module path
    pub fn short_name(&self) -> &'static str {
        let path = self.type_name.split('<').next().unwrap_or(self.type_name);
        path.rsplit("::").next().unwrap_or(path)
    }
}

impl PartialEq for ExtensionKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ExtensionKey {}

impl Hash for ExtensionKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ExtensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExtensionKey({})", self.short_name())
    }
}

impl fmt::Display for ExtensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Index of an extension in the resolved configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExtensionId(pub usize);

/// Node, mark or plain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionType {
    Node,
    Mark,
    Plain,
}

pub enum ExtensionKind<'a> {
    Plain,
    Node(&'a dyn NodeExtension),
    Mark(&'a dyn MarkExtension),
}

impl ExtensionKind<'_> {
    pub fn extension_type(&self) -> ExtensionType {
        match self {
            ExtensionKind::Plain => ExtensionType::Plain,
            ExtensionKind::Node(_) => ExtensionType::Node,
            ExtensionKind::Mark(_) => ExtensionType::Mark,
        }
    }
}

/// State every extension carries
#[derive(Debug)]
pub struct ExtensionBase {
    options: OptionStore,
    priority_override: Option<Priority>,
}

impl ExtensionBase {
    pub fn new(name: &str, schema: OptionSchema, supplied: Value) -> PlumeResult<Self> {
        Ok(Self {
            options: OptionStore::new(name, schema, supplied)?,
            priority_override: None,
        })
    }

    pub fn options(&self) -> &OptionStore {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut OptionStore {
        &mut self.options
    }

    pub fn priority_override(&self) -> Option<Priority> {
        self.priority_override
    }

    pub(crate) fn set_priority_override(&mut self, priority: Priority) {
        self.priority_override = Some(priority);
    }
}

pub trait Extension: AsAny {
    /// Unique name. Node and mark extensions use it as their type name.
    fn name(&self) -> &str;

    fn base(&self) -> &ExtensionBase;

    fn base_mut(&mut self) -> &mut ExtensionBase;

    fn default_priority(&self) -> Priority {
        Priority::DEFAULT
    }

    /// Settings override, then the `priority` option, then the default
    fn priority(&self) -> Priority {
        let base = self.base();
        base.priority_override()
            .or_else(|| base.options().priority())
            .unwrap_or_else(|| self.default_priority())
    }

    fn tags(&self) -> Vec<String> {
        Vec::new()
    }

    fn required_extensions(&self) -> Vec<ExtensionKey> {
        Vec::new()
    }

    fn kind(&self) -> ExtensionKind<'_> {
        ExtensionKind::Plain
    }

    fn options(&self) -> &OptionStore {
        self.base().options()
    }

    // Lifecycle hooks

    fn on_create(&mut self, _ctx: &mut CreateContext<'_>) -> PlumeResult<()> {
        Ok(())
    }

    fn on_view(&mut self, _ctx: &ViewContext<'_>) -> PlumeResult<()> {
        Ok(())
    }

    fn on_state_update(&mut self, _props: &StateUpdateProps<'_>) -> PlumeResult<()> {
        Ok(())
    }

    fn on_destroy(&mut self) -> PlumeResult<()> {
        Ok(())
    }

    fn on_set_options(&mut self, _props: &SetOptionsProps) -> PlumeResult<()> {
        Ok(())
    }

    /// Register a custom handler value and return its disposer
    fn on_add_custom_handler(&mut self, _key: &str, _value: Box<dyn Any>) -> PlumeResult<Disposer> {
        Ok(Disposer::noop())
    }

    // Capability probes

    fn as_commands(&self) -> Option<&dyn CommandsProvider> {
        None
    }

    fn as_helpers(&self) -> Option<&dyn HelpersProvider> {
        None
    }

    fn as_plugin(&self) -> Option<&dyn PluginProvider> {
        None
    }

    fn as_schema_attributes(&self) -> Option<&dyn SchemaAttributesProvider> {
        None
    }

    fn as_attributes(&self) -> Option<&dyn AttributesProvider> {
        None
    }

    fn as_node_views(&self) -> Option<&dyn NodeViewsProvider> {
        None
    }

    // Option lifecycle

    fn set_options(&mut self, update: Value) -> PlumeResult<SetOptionsProps> {
        let props = self.base_mut().options_mut().set(update)?;
        self.on_set_options(&props)?;
        Ok(props)
    }

    fn reset_options(&mut self) -> PlumeResult<SetOptionsProps> {
        let props = self.base_mut().options_mut().reset();
        self.on_set_options(&props)?;
        Ok(props)
    }

    fn add_handler(&self, key: &str, handler: HandlerFn, priority: Priority) -> PlumeResult<Disposer> {
        self.options().add_handler(key, handler, priority)
    }

    fn add_custom_handler(&mut self, key: &str, value: Box<dyn Any>) -> PlumeResult<Disposer> {
        if !self.options().is_custom_handler(key) {
            return Err(PlumeError::Construction(format!(
                "'{key}' is not a custom handler option of {}",
                self.name()
            )));
        }
        self.on_add_custom_handler(key, value)
    }
}

impl dyn Extension + '_ {
    pub fn key(&self) -> ExtensionKey {
        ExtensionKey {
            id: self.as_any().type_id(),
            type_name: self.type_name(),
        }
    }

    pub fn is<T: Extension>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Extension>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Extension>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    pub fn extension_type(&self) -> ExtensionType {
        self.kind().extension_type()
    }
}

impl fmt::Debug for dyn Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("name", &self.name())
            .field("type", &self.extension_type())
            .field("priority", &self.priority())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Sample {
        base: ExtensionBase,
        updates: usize,
    }

    impl Sample {
        fn new(options: Value) -> PlumeResult<Self> {
            let schema = OptionSchema::builder()
                .dynamic("color", json!("red"))
                .custom_handler("keys")
                .build()?;
            Ok(Self {
                base: ExtensionBase::new("sample", schema, options)?,
                updates: 0,
            })
        }
    }

    impl Extension for Sample {
        fn name(&self) -> &str {
            "sample"
        }

        fn base(&self) -> &ExtensionBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ExtensionBase {
            &mut self.base
        }

        fn on_set_options(&mut self, _props: &SetOptionsProps) -> PlumeResult<()> {
            self.updates += 1;
            Ok(())
        }
    }

    #[test]
    fn test_key_through_trait_object() {
        let boxed: Box<dyn Extension> = Box::new(Sample::new(Value::Null).unwrap());
        assert_eq!(boxed.key(), ExtensionKey::of::<Sample>());
        assert_eq!(boxed.key().short_name(), "Sample");
        assert!(boxed.is::<Sample>());
    }

    #[test]
    fn test_priority_sources() {
        let mut sample = Sample::new(json!({ "priority": 5 })).unwrap();
        assert_eq!(sample.priority(), Priority(5));
        sample.base_mut().set_priority_override(Priority::HIGH);
        assert_eq!(sample.priority(), Priority::HIGH);

        let plain = Sample::new(Value::Null).unwrap();
        assert_eq!(plain.priority(), Priority::DEFAULT);
    }

    #[test]
    fn test_set_options_calls_hook() {
        let mut sample = Sample::new(Value::Null).unwrap();
        sample.set_options(json!({ "color": "blue" })).unwrap();
        sample.reset_options().unwrap();
        assert_eq!(sample.updates, 2);
        assert_eq!(sample.options().get("color"), Some(&json!("red")));
    }

    #[test]
    fn test_custom_handler_key_is_validated() {
        let mut sample = Sample::new(Value::Null).unwrap();
        assert!(sample.add_custom_handler("color", Box::new(1)).is_err());
        sample
            .add_custom_handler("keys", Box::new("Mod-b"))
            .unwrap()
            .dispose();
    }
}
