use crate::args;
use crate::dom::mark_to_dom;
use crate::range::marks_at;
use plume_core::options::{EarlyReturn, OptionSchema};
use plume_core::schema::ApplySchemaAttributes;
use plume_core::{
    CommandSpec, CommandsProvider, Extension, ExtensionBase, ExtensionKind, HelperSpec, HelpersProvider,
    MarkExtension, PlumeResult,
};
use plume_model::{AttributeSpec, Attrs, DomElement, Mark, MarkSpec, ParseRule};
use serde_json::{json, Value};
use std::rc::Rc;
use tracing::debug;

/// Hyperlinks.
///
/// | Option | Kind | Default |
/// |---|---|---|
/// | `defaultTarget` | static | `null` |
/// | `openLinkOnClick` | dynamic | `false` |
/// | `selectTextOnClick` | dynamic | `false` |
/// | `onClick` | handler, stops at `true` | |
pub struct LinkExtension {
    base: ExtensionBase,
}

impl LinkExtension {
    pub const NAME: &'static str = "link";

    pub fn new() -> PlumeResult<Self> {
        Self::with_options(Value::Null)
    }

    pub fn with_options(options: Value) -> PlumeResult<Self> {
        let schema = OptionSchema::builder()
            .static_option("defaultTarget", Value::Null)
            .dynamic("openLinkOnClick", json!(false))
            .dynamic("selectTextOnClick", json!(false))
            .handler_with_early_return("onClick", EarlyReturn::Value(json!(true)))
            .build()?;
        Ok(Self {
            base: ExtensionBase::new(Self::NAME, schema, options)?,
        })
    }

    /// Run the `onClick` handlers for a link. Returns whether one of them
    /// handled the click.
    pub fn click(&self, href: &str) -> bool {
        let Some(handler) = self.options().handler("onClick") else {
            return false;
        };
        let handled = handler.call(&[json!(href)]) == json!(true);
        debug!(href, handled, "Link clicked");
        handled
    }

    pub fn opens_on_click(&self) -> bool {
        self.options()
            .get("openLinkOnClick")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

impl Extension for LinkExtension {
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
        vec!["link".to_string(), "excludeInputRules".to_string()]
    }

    fn kind(&self) -> ExtensionKind<'_> {
        ExtensionKind::Mark(self)
    }

    fn as_commands(&self) -> Option<&dyn CommandsProvider> {
        Some(self)
    }

    fn as_helpers(&self) -> Option<&dyn HelpersProvider> {
        Some(self)
    }
}

impl MarkExtension for LinkExtension {
    fn create_mark_spec(&self, extra: &ApplySchemaAttributes) -> MarkSpec {
        let mut attrs = extra.defaults();
        attrs.insert("href".to_string(), AttributeSpec::required());
        let default_target = self.options().get("defaultTarget").cloned().unwrap_or(Value::Null);
        attrs.insert("target".to_string(), AttributeSpec::with_default(default_target));

        let parse_extra = extra.clone();
        let parse = ParseRule::tag("a").with_attrs(Rc::new(move |element: &DomElement| {
            let href = element.get_attribute("href")?;
            let mut attrs: Attrs = parse_extra.parse(element);
            attrs.insert("href".to_string(), json!(href));
            if let Some(target) = element.get_attribute("target") {
                attrs.insert("target".to_string(), json!(target));
            }
            Some(attrs)
        }));

        let anchor = mark_to_dom("a", extra);
        MarkSpec {
            attrs,
            parse_dom: vec![parse],
            to_dom: Some(Rc::new(move |mark: &Mark| {
                let mut element = anchor(mark);
                for name in ["href", "target"] {
                    if let Some(value) = mark.attrs.get(name).and_then(Value::as_str) {
                        element = element.with_attribute(name, value);
                    }
                }
                element.with_attribute("rel", "noopener noreferrer nofollow")
            })),
        }
    }
}

impl CommandsProvider for LinkExtension {
    fn create_commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("updateLink", |props, args| {
                let href = args::string("updateLink", args, 0)?;
                let selection = props.transaction().selection();
                if selection.is_empty() {
                    return Ok(false);
                }
                if !props.can_dispatch() {
                    return Ok(true);
                }

                let mut attrs = Attrs::from([("href".to_string(), json!(href))]);
                if let Some(target) = args::optional_string(args, 1) {
                    attrs.insert("target".to_string(), json!(target));
                }
                let schema = props.state().schema().clone();
                let (from, to) = (selection.from(), selection.to());
                let existing: Vec<Mark> = marks_at(props.transaction().doc(), to)
                    .into_iter()
                    .filter(|mark| mark.type_name == LinkExtension::NAME)
                    .collect();

                let tr = props.tr();
                for mark in existing {
                    tr.remove_mark(from, to, mark)?;
                }
                tr.add_mark(from, to, schema.mark(LinkExtension::NAME, Some(attrs))?)?;
                props.dispatch();
                Ok(true)
            }),
            CommandSpec::new("removeLink", |props, _args| {
                let selection = props.transaction().selection();
                let (from, to) = (selection.from(), selection.to());
                let existing: Vec<Mark> = marks_at(props.transaction().doc(), to)
                    .into_iter()
                    .filter(|mark| mark.type_name == LinkExtension::NAME)
                    .collect();
                if from == to || existing.is_empty() {
                    return Ok(false);
                }
                if props.can_dispatch() {
                    let tr = props.tr();
                    for mark in existing {
                        tr.remove_mark(from, to, mark)?;
                    }
                    props.dispatch();
                }
                Ok(true)
            }),
        ]
    }
}

impl HelpersProvider for LinkExtension {
    fn create_helpers(&self) -> Vec<HelperSpec> {
        vec![HelperSpec::new("getLinkHref", |state, _args| {
            let href = marks_at(state.doc(), state.selection().head)
                .into_iter()
                .find(|mark| mark.type_name == LinkExtension::NAME)
                .and_then(|mark| mark.attrs.get("href").cloned());
            Ok(href.unwrap_or(Value::Null))
        })]
    }
}
