use plume_core::options::OptionSchema;
use plume_core::schema::{IdentifierSchemaAttributes, Identifiers, SchemaAttribute, SchemaAttributes};
use plume_core::{Extension, ExtensionBase, PlumeResult, Priority, SchemaAttributesProvider};
use serde_json::{json, Value};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

type Generator = Rc<dyn Fn(usize) -> String>;

/// Gives every targeted node a unique `id` attribute, computed once when
/// the node first appears in the document.
///
/// Options: `identifiers` (static, `"nodes"`), `prefix` (static, `"node"`).
/// The attribute is parsed from and serialized to `data-id`.
pub struct NodeIdExtension {
    base: ExtensionBase,
    identifiers: Identifiers,
    generator: Generator,
    generated: Rc<Cell<usize>>,
}

impl NodeIdExtension {
    pub const NAME: &'static str = "nodeId";

    pub fn new() -> PlumeResult<Self> {
        Self::with_options(Value::Null)
    }

    pub fn with_options(options: Value) -> PlumeResult<Self> {
        let base = Self::option_base(options)?;
        let prefix: String = base.options().typed("prefix")?;
        Self::build(base, Rc::new(move |count: usize| format!("{prefix}-{count}")))
    }

    /// Use `generator` instead of the prefixed counter. It receives the
    /// number of ids generated so far.
    pub fn with_generator(options: Value, generator: impl Fn(usize) -> String + 'static) -> PlumeResult<Self> {
        Self::build(Self::option_base(options)?, Rc::new(generator))
    }

    fn option_base(options: Value) -> PlumeResult<ExtensionBase> {
        let schema = OptionSchema::builder()
            .static_option("identifiers", json!("nodes"))
            .static_option("prefix", json!("node"))
            .build()?;
        ExtensionBase::new(Self::NAME, schema, options)
    }

    fn build(base: ExtensionBase, generator: Generator) -> PlumeResult<Self> {
        let identifiers = base.options().typed("identifiers")?;
        Ok(Self {
            base,
            identifiers,
            generator,
            generated: Rc::new(Cell::new(0)),
        })
    }

    /// How many ids have been generated
    pub fn generated(&self) -> usize {
        self.generated.get()
    }
}

impl Extension for NodeIdExtension {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn base(&self) -> &ExtensionBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ExtensionBase {
        &mut self.base
    }

    fn default_priority(&self) -> Priority {
        Priority::LOW
    }

    fn as_schema_attributes(&self) -> Option<&dyn SchemaAttributesProvider> {
        Some(self)
    }
}

impl SchemaAttributesProvider for NodeIdExtension {
    fn create_schema_attributes(&self) -> Vec<IdentifierSchemaAttributes> {
        let generator = self.generator.clone();
        let generated = self.generated.clone();
        let id = SchemaAttribute::dynamic(move |_target| {
            let count = generated.get();
            generated.set(count + 1);
            Value::String(generator(count))
        })
        .parse_dom_attribute("data-id");

        vec![IdentifierSchemaAttributes::new(
            self.identifiers.clone(),
            SchemaAttributes::from([("id".to_string(), id)]),
        )]
    }
}

impl fmt::Debug for NodeIdExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeIdExtension")
            .field("identifiers", &self.identifiers)
            .field("generated", &self.generated.get())
            .finish()
    }
}
