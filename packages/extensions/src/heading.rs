use crate::args;
use crate::dom::parse_rule;
use crate::paragraph::ParagraphExtension;
use plume_core::options::OptionSchema;
use plume_core::schema::ApplySchemaAttributes;
use plume_core::{
    CommandError, CommandSpec, CommandsProvider, Extension, ExtensionBase, ExtensionKey, ExtensionKind,
    NodeExtension, PlumeResult,
};
use plume_model::{AttributeSpec, Attrs, DomElement, Node, NodeSpec, Selection};
use serde_json::{json, Value};
use std::rc::Rc;

const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Headings with a `level` attribute.
///
/// Options: `levels` (static, `[1..6]`) and `defaultLevel` (static, `1`).
pub struct HeadingExtension {
    base: ExtensionBase,
    levels: Vec<u64>,
    default_level: u64,
}

impl HeadingExtension {
    pub const NAME: &'static str = "heading";

    pub fn new() -> PlumeResult<Self> {
        Self::with_options(Value::Null)
    }

    pub fn with_options(options: Value) -> PlumeResult<Self> {
        let schema = OptionSchema::builder()
            .static_option("levels", json!([1, 2, 3, 4, 5, 6]))
            .static_option("defaultLevel", json!(1))
            .build()?;
        let base = ExtensionBase::new(Self::NAME, schema, options)?;
        let levels: Vec<u64> = base.options().typed("levels")?;
        let default_level: u64 = base.options().typed("defaultLevel")?;
        Ok(Self {
            base,
            levels,
            default_level,
        })
    }

    pub fn levels(&self) -> &[u64] {
        &self.levels
    }
}

impl Extension for HeadingExtension {
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
        vec!["block".to_string(), "textBlock".to_string(), "formatting".to_string()]
    }

    fn required_extensions(&self) -> Vec<ExtensionKey> {
        vec![ExtensionKey::of::<ParagraphExtension>()]
    }

    fn kind(&self) -> ExtensionKind<'_> {
        ExtensionKind::Node(self)
    }

    fn as_commands(&self) -> Option<&dyn CommandsProvider> {
        Some(self)
    }
}

impl NodeExtension for HeadingExtension {
    fn create_node_spec(&self, extra: &ApplySchemaAttributes) -> NodeSpec {
        let mut attrs = extra.defaults();
        attrs.insert("level".to_string(), AttributeSpec::with_default(json!(self.default_level)));

        let parse_dom = self
            .levels
            .iter()
            .filter_map(|level| {
                let tag = HEADING_TAGS.get(usize::try_from(*level).ok()?.checked_sub(1)?)?;
                let rule = parse_rule(tag, extra);
                let parse = rule.get_attrs.clone();
                let level = *level;
                Some(rule.with_attrs(Rc::new(move |element: &DomElement| {
                    let mut attrs: Attrs = parse.as_ref().and_then(|parse| parse(element)).unwrap_or_default();
                    attrs.insert("level".to_string(), json!(level));
                    Some(attrs)
                })))
            })
            .collect();

        let extra = extra.clone();
        let default_level = self.default_level;
        NodeSpec {
            content: Some("inline*".to_string()),
            group: Some("block".to_string()),
            attrs,
            parse_dom,
            to_dom: Some(Rc::new(move |node: &Node| {
                let level = node.attr("level").and_then(Value::as_u64).unwrap_or(default_level);
                let index = usize::try_from(level.clamp(1, 6) - 1).unwrap_or(0);
                DomElement::new(HEADING_TAGS[index]).with_attributes(extra.dom(&node.attrs))
            })),
            ..NodeSpec::default()
        }
    }
}

impl CommandsProvider for HeadingExtension {
    fn create_commands(&self) -> Vec<CommandSpec> {
        let levels = self.levels.clone();
        let check_level = move |name: &str, level: u64| {
            if levels.contains(&level) {
                Ok(())
            } else {
                Err(CommandError::InvalidArguments {
                    name: name.to_string(),
                    message: format!("heading level {level} is not enabled"),
                })
            }
        };
        let check_insert = check_level.clone();

        vec![
            CommandSpec::new("setHeadingLevel", move |props, args| {
                let pos = args::position("setHeadingLevel", args, 0)?;
                let level = args::position("setHeadingLevel", args, 1)? as u64;
                check_level("setHeadingLevel", level)?;

                let is_heading = props
                    .transaction()
                    .doc()
                    .node_at(pos)
                    .is_some_and(|node| node.type_name == HeadingExtension::NAME);
                if !is_heading {
                    return Ok(false);
                }
                if props.can_dispatch() {
                    props.tr().set_node_attribute(pos, "level", json!(level))?;
                    props.dispatch();
                }
                Ok(true)
            }),
            CommandSpec::new("insertHeading", move |props, args| {
                let level = args::position("insertHeading", args, 0)? as u64;
                check_insert("insertHeading", level)?;
                let text = args::optional_string(args, 1).unwrap_or_default();
                if !props.can_dispatch() {
                    return Ok(true);
                }

                let schema = props.state().schema().clone();
                let content = if text.is_empty() {
                    Vec::new()
                } else {
                    vec![schema.text(text, Vec::new())?]
                };
                let attrs = Attrs::from([("level".to_string(), json!(level))]);
                let heading = schema.node(HeadingExtension::NAME, Some(attrs), content)?;

                let tr = props.tr();
                let pos = tr.doc().content_size();
                tr.insert(pos, vec![heading])?;
                tr.set_selection(Selection::cursor(pos + 1 + text.chars().count()));
                props.dispatch();
                Ok(true)
            }),
        ]
    }
}
