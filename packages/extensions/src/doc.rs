use crate::dom::node_to_dom;
use plume_core::schema::ApplySchemaAttributes;
use plume_core::{Extension, ExtensionBase, ExtensionKind, NodeExtension, PlumeResult, Priority};
use plume_core::options::OptionSchema;
use plume_model::NodeSpec;
use serde_json::{json, Value};

/// The top node of every document
pub struct DocExtension {
    base: ExtensionBase,
}

impl DocExtension {
    pub const NAME: &'static str = "doc";

    pub fn new() -> PlumeResult<Self> {
        Self::with_options(Value::Null)
    }

    /// Options: `content` (static, `"block+"`), the content expression of
    /// the top node
    pub fn with_options(options: Value) -> PlumeResult<Self> {
        let schema = OptionSchema::builder()
            .static_option("content", json!("block+"))
            .build()?;
        Ok(Self {
            base: ExtensionBase::new(Self::NAME, schema, options)?,
        })
    }

    pub fn content(&self) -> String {
        self.options()
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or("block+")
            .to_string()
    }
}

impl Extension for DocExtension {
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
        Priority::MEDIUM
    }

    fn kind(&self) -> ExtensionKind<'_> {
        ExtensionKind::Node(self)
    }
}

impl NodeExtension for DocExtension {
    fn create_node_spec(&self, extra: &ApplySchemaAttributes) -> NodeSpec {
        NodeSpec {
            content: Some(self.content()),
            attrs: extra.defaults(),
            to_dom: Some(node_to_dom("div", extra)),
            ..NodeSpec::default()
        }
    }
}
