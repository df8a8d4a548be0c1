use plume_core::options::OptionSchema;
use plume_core::schema::ApplySchemaAttributes;
use plume_core::{Extension, ExtensionBase, ExtensionKind, NodeExtension, PlumeResult, Priority};
use plume_model::NodeSpec;
use serde_json::Value;

pub struct TextExtension {
    base: ExtensionBase,
}

impl TextExtension {
    pub const NAME: &'static str = "text";

    pub fn new() -> PlumeResult<Self> {
        Ok(Self {
            base: ExtensionBase::new(Self::NAME, OptionSchema::empty(), Value::Null)?,
        })
    }
}

impl Extension for TextExtension {
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

impl NodeExtension for TextExtension {
    fn create_node_spec(&self, extra: &ApplySchemaAttributes) -> NodeSpec {
        NodeSpec {
            group: Some("inline".to_string()),
            inline: true,
            attrs: extra.defaults(),
            ..NodeSpec::default()
        }
    }
}
