use crate::args;
use crate::dom::{node_to_dom, parse_rule};
use plume_core::options::OptionSchema;
use plume_core::schema::ApplySchemaAttributes;
use plume_core::{
    CommandSpec, CommandsProvider, Extension, ExtensionBase, ExtensionKind, NodeExtension, PlumeResult,
};
use plume_model::{NodeSpec, Selection};
use serde_json::Value;

pub struct ParagraphExtension {
    base: ExtensionBase,
}

impl ParagraphExtension {
    pub const NAME: &'static str = "paragraph";

    pub fn new() -> PlumeResult<Self> {
        Self::with_options(Value::Null)
    }

    pub fn with_options(options: Value) -> PlumeResult<Self> {
        Ok(Self {
            base: ExtensionBase::new(Self::NAME, OptionSchema::empty(), options)?,
        })
    }
}

impl Extension for ParagraphExtension {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn base(&self) -> &ExtensionBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ExtensionBase {
        &mut self.base
    }

    fn tags(&self) -> Vec<String> {
        vec!["block".to_string(), "textBlock".to_string()]
    }

    fn kind(&self) -> ExtensionKind<'_> {
        ExtensionKind::Node(self)
    }

    fn as_commands(&self) -> Option<&dyn CommandsProvider> {
        Some(self)
    }
}

impl NodeExtension for ParagraphExtension {
    fn create_node_spec(&self, extra: &ApplySchemaAttributes) -> NodeSpec {
        NodeSpec {
            content: Some("inline*".to_string()),
            group: Some("block".to_string()),
            attrs: extra.defaults(),
            parse_dom: vec![parse_rule("p", extra)],
            to_dom: Some(node_to_dom("p", extra)),
            ..NodeSpec::default()
        }
    }
}

impl CommandsProvider for ParagraphExtension {
    fn create_commands(&self) -> Vec<CommandSpec> {
        vec![CommandSpec::new("insertParagraph", |props, args| {
            // Appends a paragraph, optionally with text, and moves the
            // cursor to its end
            let text = args::optional_string(args, 0).unwrap_or_default();
            if !props.can_dispatch() {
                return Ok(true);
            }

            let schema = props.state().schema().clone();
            let content = if text.is_empty() {
                Vec::new()
            } else {
                vec![schema.text(text, Vec::new())?]
            };
            let paragraph = schema.node(ParagraphExtension::NAME, None, content)?;

            let tr = props.tr();
            let pos = tr.doc().content_size();
            tr.insert(pos, vec![paragraph])?;
            tr.set_selection(Selection::cursor(pos + 1 + text.chars().count()));
            props.dispatch();
            Ok(true)
        })]
    }
}
