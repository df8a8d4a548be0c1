use super::apply::{ApplySchemaAttributes, SchemaAttribute, SchemaAttributes};
use super::dynamic::DynamicAttributes;
use super::identifiers::IdentifierSchemaAttributes;
use crate::error::{PlumeError, PlumeResult};
use crate::extension::{Extension, ExtensionKind};
use crate::settings::ManagerSettings;
use crate::tags::TagIndex;
use plume_model::{Schema, SchemaSpec};
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{debug, instrument};

/// Output of schema construction
#[derive(Debug)]
pub struct SchemaBuild {
    pub schema: Rc<Schema>,
    pub dynamic: DynamicAttributes,
}

/// Build the schema from node and mark extensions.
///
/// Attribute sources, lowest precedence first:
/// 1. groups from `SchemaAttributesProvider` extensions,
/// 2. groups from the settings,
/// 3. each extension's own `extraAttributes` option.
#[instrument(skip_all, fields(extensions = extensions.len()))]
pub fn build_schema(
    extensions: &[Box<dyn Extension>],
    settings: &ManagerSettings,
    tags: &TagIndex,
) -> PlumeResult<SchemaBuild> {
    if let Some(schema) = &settings.schema {
        debug!("Using schema override");
        return Ok(SchemaBuild {
            schema: schema.clone(),
            dynamic: DynamicAttributes::default(),
        });
    }

    let mut node_names = Vec::new();
    let mut mark_names = Vec::new();
    for extension in extensions {
        match extension.kind() {
            ExtensionKind::Node(_) => node_names.push(extension.name().to_string()),
            ExtensionKind::Mark(_) => mark_names.push(extension.name().to_string()),
            ExtensionKind::Plain => {}
        }
    }

    let groups: Vec<IdentifierSchemaAttributes> = extensions
        .iter()
        .filter_map(|extension| extension.as_schema_attributes())
        .flat_map(|provider| provider.create_schema_attributes())
        .chain(settings.extra_attributes.iter().cloned())
        .collect();

    let mut merged: BTreeMap<String, SchemaAttributes> = BTreeMap::new();
    for group in &groups {
        for name in group.identifiers.resolve(&node_names, &mark_names, tags) {
            merged
                .entry(name)
                .or_default()
                .extend(group.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }

    let mut spec = SchemaSpec::default();
    let mut dynamic = DynamicAttributes::default();

    for extension in extensions {
        let kind = extension.kind();
        if matches!(kind, ExtensionKind::Plain) {
            continue;
        }

        let name = extension.name();
        let disabled = settings.disable_extra_attributes || extension.options().disable_extra_attributes();
        let attributes = if disabled {
            SchemaAttributes::new()
        } else {
            let mut attributes = merged.remove(name).unwrap_or_default();
            if let Some(own) = extension.options().extra_attributes() {
                for (attribute, value) in own {
                    attributes.insert(attribute.clone(), SchemaAttribute::from_json(attribute, value)?);
                }
            }
            attributes
        };

        let apply = ApplySchemaAttributes::new(attributes);
        let extension_type = kind.extension_type();
        match kind {
            ExtensionKind::Node(node) => {
                spec.nodes.insert(name.to_string(), node.create_node_spec(&apply));
            }
            ExtensionKind::Mark(mark) => {
                spec.marks.insert(name.to_string(), mark.create_mark_spec(&apply));
            }
            ExtensionKind::Plain => {}
        }

        if !disabled && !apply.defaults_called() {
            return Err(PlumeError::Construction(format!(
                "{name} must call ApplySchemaAttributes::defaults() when building its spec"
            )));
        }

        for (attribute, create) in apply.dynamic_defaults() {
            dynamic.insert(extension_type, name, attribute, create.clone());
        }
        debug!(
            extension = name,
            extra = apply.attributes().len(),
            "Built schema spec"
        );
    }

    let schema = Schema::new(spec)?;
    Ok(SchemaBuild {
        schema: Rc::new(schema),
        dynamic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::ExtensionBase;
    use crate::options::OptionSchema;
    use crate::schema::{IdentifierSchemaAttributes, Identifiers, MarkExtension, NodeExtension, SchemaAttributesProvider};
    use plume_model::{MarkSpec, NodeSpec};
    use serde_json::{json, Value};

    enum Shape {
        Doc,
        Text,
        Block { skip_defaults: bool },
        Mark,
    }

    struct Part {
        name: &'static str,
        shape: Shape,
        inject: bool,
        base: ExtensionBase,
    }

    impl Part {
        fn boxed(name: &'static str, shape: Shape, options: Value) -> Box<dyn Extension> {
            Box::new(Self {
                name,
                shape,
                inject: false,
                base: ExtensionBase::new(name, OptionSchema::empty(), options).unwrap(),
            })
        }

        fn injector() -> Box<dyn Extension> {
            Box::new(Self {
                name: "ids",
                shape: Shape::Doc,
                inject: true,
                base: ExtensionBase::new("ids", OptionSchema::empty(), Value::Null).unwrap(),
            })
        }
    }

    impl Extension for Part {
        fn name(&self) -> &str {
            self.name
        }

        fn base(&self) -> &ExtensionBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ExtensionBase {
            &mut self.base
        }

        fn kind(&self) -> ExtensionKind<'_> {
            match self.shape {
                _ if self.inject => ExtensionKind::Plain,
                Shape::Mark => ExtensionKind::Mark(self),
                _ => ExtensionKind::Node(self),
            }
        }

        fn as_schema_attributes(&self) -> Option<&dyn SchemaAttributesProvider> {
            self.inject.then_some(self as &dyn SchemaAttributesProvider)
        }
    }

    impl NodeExtension for Part {
        fn create_node_spec(&self, extra: &ApplySchemaAttributes) -> NodeSpec {
            match self.shape {
                Shape::Doc => NodeSpec {
                    content: Some("block+".to_string()),
                    attrs: extra.defaults(),
                    ..Default::default()
                },
                Shape::Block { skip_defaults: true } => NodeSpec {
                    content: Some("text*".to_string()),
                    ..Default::default()
                },
                _ => NodeSpec {
                    content: matches!(self.shape, Shape::Block { .. }).then(|| "text*".to_string()),
                    attrs: extra.defaults(),
                    ..Default::default()
                },
            }
        }
    }

    impl MarkExtension for Part {
        fn create_mark_spec(&self, extra: &ApplySchemaAttributes) -> MarkSpec {
            MarkSpec {
                attrs: extra.defaults(),
                ..Default::default()
            }
        }
    }

    impl SchemaAttributesProvider for Part {
        fn create_schema_attributes(&self) -> Vec<IdentifierSchemaAttributes> {
            vec![IdentifierSchemaAttributes::new(
                Identifiers::Nodes,
                SchemaAttributes::from([("id".to_string(), SchemaAttribute::dynamic(|_| json!("x")))]),
            )]
        }
    }

    fn extensions(paragraph_options: Value, skip_defaults: bool) -> Vec<Box<dyn Extension>> {
        vec![
            Part::injector(),
            Part::boxed("doc", Shape::Doc, Value::Null),
            Part::boxed("text", Shape::Text, Value::Null),
            Part::boxed("paragraph", Shape::Block { skip_defaults }, paragraph_options),
            Part::boxed("bold", Shape::Mark, Value::Null),
        ]
    }

    #[test]
    fn test_injected_and_own_extra_attributes() {
        let extensions = extensions(json!({ "extraAttributes": { "align": "left", "id": "fixed" } }), false);
        let mut settings = ManagerSettings::default();
        settings.extra_attributes.push(IdentifierSchemaAttributes::new(
            Identifiers::Marks,
            SchemaAttributes::from([("title".to_string(), SchemaAttribute::value(json!("")))]),
        ));

        let build = build_schema(&extensions, &settings, &TagIndex::default()).unwrap();
        let paragraph = build.schema.node_spec("paragraph").unwrap();
        assert_eq!(paragraph.attrs["align"].default, Some(json!("left")));
        // The extension's own option overrides the injected dynamic default
        assert_eq!(paragraph.attrs["id"].default, Some(json!("fixed")));
        assert!(!build.dynamic.contains("paragraph", "id"));

        assert!(build.dynamic.contains("doc", "id"));
        assert!(build.schema.node_spec("text").unwrap().attrs.is_empty());
        assert!(build.schema.mark_spec("bold").unwrap().attrs.contains_key("title"));
        assert_eq!(build.dynamic.len(), 1);
    }

    #[test]
    fn test_missing_defaults_call_is_an_error() {
        let extensions = extensions(Value::Null, true);
        let err = build_schema(&extensions, &ManagerSettings::default(), &TagIndex::default()).unwrap_err();
        assert!(matches!(err, PlumeError::Construction(message) if message.contains("paragraph")));
    }

    #[test]
    fn test_disabled_extra_attributes_skip_the_check() {
        let extensions = extensions(Value::Null, true);
        let settings = ManagerSettings {
            disable_extra_attributes: true,
            ..ManagerSettings::default()
        };

        let build = build_schema(&extensions, &settings, &TagIndex::default()).unwrap();
        assert!(build.dynamic.is_empty());
        assert!(build.schema.node_spec("doc").unwrap().attrs.is_empty());
    }
}
