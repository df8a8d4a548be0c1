use plume_core::options::{OptionSchema, SetOptionsProps};
use plume_core::{AttributesProvider, EditorAttributes, Extension, ExtensionBase, PlumeResult};
use serde_json::{json, Value};
use tracing::debug;

/// Attributes of the editor's root element.
///
/// Options: `className` (static, `"plume-editor"`), `attributes` (dynamic,
/// `{}`). Changing `attributes` takes effect at the next forced
/// `Attributes` view update.
pub struct EditorAttributesExtension {
    base: ExtensionBase,
}

impl EditorAttributesExtension {
    pub const NAME: &'static str = "editorAttributes";

    pub fn new() -> PlumeResult<Self> {
        Self::with_options(Value::Null)
    }

    pub fn with_options(options: Value) -> PlumeResult<Self> {
        let schema = OptionSchema::builder()
            .static_option("className", json!("plume-editor"))
            .dynamic("attributes", json!({}))
            .build()?;
        Ok(Self {
            base: ExtensionBase::new(Self::NAME, schema, options)?,
        })
    }
}

impl Extension for EditorAttributesExtension {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn base(&self) -> &ExtensionBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ExtensionBase {
        &mut self.base
    }

    fn on_set_options(&mut self, props: &SetOptionsProps) -> PlumeResult<()> {
        if props.changed("attributes") {
            debug!(changes = ?props.pick_changed(&["attributes"]), "Editor attributes changed");
        }
        Ok(())
    }

    fn as_attributes(&self) -> Option<&dyn AttributesProvider> {
        Some(self)
    }
}

impl AttributesProvider for EditorAttributesExtension {
    fn create_attributes(&self) -> EditorAttributes {
        let mut attributes = EditorAttributes::from([
            ("role".to_string(), "textbox".to_string()),
            ("aria-multiline".to_string(), "true".to_string()),
        ]);
        let mut class = self
            .options()
            .get("className")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let custom = self.options().get("attributes").and_then(Value::as_object);
        for (name, value) in custom.into_iter().flatten() {
            let value = match value {
                Value::String(value) => value.clone(),
                Value::Null => continue,
                other => other.to_string(),
            };
            if name == "class" {
                if !class.is_empty() {
                    class.push(' ');
                }
                class.push_str(&value);
            } else {
                attributes.insert(name.clone(), value);
            }
        }

        if !class.is_empty() {
            attributes.insert("class".to_string(), class);
        }
        attributes
    }
}
