use crate::dom::{mark_to_dom, parse_rule};
use crate::range::mark_in_range;
use plume_core::options::OptionSchema;
use plume_core::schema::ApplySchemaAttributes;
use plume_core::{
    CommandError, CommandProps, CommandSpec, CommandsProvider, Extension, ExtensionBase, ExtensionKind,
    HelperSpec, HelpersProvider, MarkExtension, PlumeResult,
};
use plume_model::{Mark, MarkSpec, ToDom};
use serde_json::Value;
use std::rc::Rc;

/// Bold text.
///
/// Options: `weight` (static, `null`). When set, the mark renders with an
/// explicit `font-weight` style.
pub struct BoldExtension {
    base: ExtensionBase,
}

impl BoldExtension {
    pub const NAME: &'static str = "bold";

    pub fn new() -> PlumeResult<Self> {
        Self::with_options(Value::Null)
    }

    pub fn with_options(options: Value) -> PlumeResult<Self> {
        let schema = OptionSchema::builder().static_option("weight", Value::Null).build()?;
        Ok(Self {
            base: ExtensionBase::new(Self::NAME, schema, options)?,
        })
    }

    fn weight(&self) -> Option<String> {
        match self.options().get("weight")? {
            Value::String(weight) => Some(weight.clone()),
            Value::Number(weight) => Some(weight.to_string()),
            _ => None,
        }
    }
}

#[derive(Clone, Copy)]
enum Toggle {
    Toggle,
    Set,
    Remove,
}

fn bold_command(toggle: Toggle) -> impl Fn(&mut CommandProps<'_>, &[Value]) -> Result<bool, CommandError> {
    move |props: &mut CommandProps<'_>, _args: &[Value]| {
        let selection = props.transaction().selection();
        if selection.is_empty() {
            return Ok(false);
        }
        let (from, to) = (selection.from(), selection.to());
        let active = mark_in_range(props.transaction().doc(), from, to, BoldExtension::NAME);
        let add = match toggle {
            Toggle::Toggle => !active,
            Toggle::Set => true,
            Toggle::Remove => false,
        };
        if matches!(toggle, Toggle::Remove) && !active {
            return Ok(false);
        }
        if !props.can_dispatch() {
            return Ok(true);
        }

        let mark = props.state().schema().mark(BoldExtension::NAME, None)?;
        if add {
            props.tr().add_mark(from, to, mark)?;
        } else {
            props.tr().remove_mark(from, to, mark)?;
        }
        props.dispatch();
        Ok(true)
    }
}

impl Extension for BoldExtension {
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
        vec!["formattingMark".to_string(), "fontStyle".to_string()]
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

impl MarkExtension for BoldExtension {
    fn create_mark_spec(&self, extra: &ApplySchemaAttributes) -> MarkSpec {
        let strong = mark_to_dom("strong", extra);
        let to_dom: ToDom<Mark> = match self.weight() {
            Some(weight) => Rc::new(move |mark: &Mark| {
                strong(mark).with_attribute("style", format!("font-weight: {weight}"))
            }),
            None => strong,
        };
        MarkSpec {
            attrs: extra.defaults(),
            parse_dom: vec![parse_rule("strong", extra), parse_rule("b", extra)],
            to_dom: Some(to_dom),
        }
    }
}

impl CommandsProvider for BoldExtension {
    fn create_commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("toggleBold", bold_command(Toggle::Toggle)),
            CommandSpec::new("setBold", bold_command(Toggle::Set)),
            CommandSpec::new("removeBold", bold_command(Toggle::Remove)),
        ]
    }
}

impl HelpersProvider for BoldExtension {
    fn create_helpers(&self) -> Vec<HelperSpec> {
        vec![HelperSpec::new("isBoldActive", |state, _args| {
            let selection = state.selection();
            Ok(Value::Bool(mark_in_range(
                state.doc(),
                selection.from(),
                selection.to(),
                BoldExtension::NAME,
            )))
        })]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plume_core::schema::{SchemaAttribute, SchemaAttributes};
    use plume_model::Attrs;
    use serde_json::json;

    #[test]
    fn test_to_dom_writes_extra_attributes_and_weight() {
        let extra = ApplySchemaAttributes::new(SchemaAttributes::from([(
            "id".to_string(),
            SchemaAttribute::value(Value::Null).parse_dom_attribute("data-id"),
        )]));
        let bold = BoldExtension::with_options(json!({ "weight": "600" })).unwrap();
        let spec = bold.create_mark_spec(&extra);
        let to_dom = spec.to_dom.unwrap();

        let mark = Mark::new(BoldExtension::NAME, Attrs::from([("id".to_string(), json!("b1"))]));
        let element = to_dom(&mark);
        assert_eq!(element.tag, "strong");
        assert_eq!(element.get_attribute("data-id"), Some("b1"));
        assert_eq!(element.get_attribute("style"), Some("font-weight: 600"));

        let plain = BoldExtension::new().unwrap().create_mark_spec(&extra).to_dom.unwrap();
        let element = plain(&Mark::new(BoldExtension::NAME, Attrs::new()));
        assert!(element.attributes.is_empty());
    }
}
