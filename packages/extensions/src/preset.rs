//! Presets group the extensions most editors use together.

use crate::{
    BoldExtension, DocExtension, EditorAttributesExtension, LinkExtension, ParagraphExtension,
    TextCommandsExtension, TextExtension,
};
use plume_core::options::{OptionSchema, OptionStore, SetOptionsProps};
use plume_core::{Bundle, BundleMembers, Extension, PlumeResult};
use serde_json::{json, Map, Value};
use tracing::debug;

/// Pick the changed keys in `props` and send them to the member `T` under
/// their member-side names.
fn forward<T: Extension>(
    props: &SetOptionsProps,
    members: &mut dyn BundleMembers,
    keys: &[(&str, &str)],
) -> PlumeResult<()> {
    let mut update = Map::new();
    for (bundle_key, member_key) in keys {
        if let Some(value) = props.pick_changed(&[*bundle_key]).remove(*bundle_key) {
            update.insert(member_key.to_string(), value);
        }
    }
    if update.is_empty() {
        return Ok(());
    }

    match members.extension_mut::<T>() {
        Some(member) => {
            member.set_options(Value::Object(update))?;
        }
        None => debug!(member = std::any::type_name::<T>(), "Bundle member not resolved, skipping"),
    }
    Ok(())
}

/// Document, text, paragraphs, text editing commands and editor
/// attributes.
///
/// | Option | Kind | Forwarded to |
/// |---|---|---|
/// | `content` | static | [`DocExtension`] `content` |
/// | `attributes` | dynamic | [`EditorAttributesExtension`] `attributes` |
/// | `maxLength` | dynamic | [`TextCommandsExtension`] `maxLength` |
pub struct CorePreset {
    options: OptionStore,
}

impl CorePreset {
    pub const NAME: &'static str = "core";

    pub fn new() -> PlumeResult<Self> {
        Self::with_options(Value::Null)
    }

    pub fn with_options(options: Value) -> PlumeResult<Self> {
        let schema = OptionSchema::builder()
            .static_option("content", json!("block+"))
            .dynamic("attributes", json!({}))
            .dynamic("maxLength", Value::Null)
            .build()?;
        Ok(Self {
            options: OptionStore::new(Self::NAME, schema, options)?,
        })
    }

    fn option(&self, key: &str) -> Value {
        self.options.get(key).cloned().unwrap_or(Value::Null)
    }
}

impl Bundle for CorePreset {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn options(&self) -> &OptionStore {
        &self.options
    }

    fn options_mut(&mut self) -> &mut OptionStore {
        &mut self.options
    }

    fn create_extensions(&self) -> PlumeResult<Vec<Box<dyn Extension>>> {
        let extensions: Vec<Box<dyn Extension>> = vec![
            Box::new(DocExtension::with_options(json!({ "content": self.option("content") }))?),
            Box::new(TextExtension::new()?),
            Box::new(ParagraphExtension::new()?),
            Box::new(TextCommandsExtension::with_options(
                json!({ "maxLength": self.option("maxLength") }),
            )?),
            Box::new(EditorAttributesExtension::with_options(
                json!({ "attributes": self.option("attributes") }),
            )?),
        ];
        Ok(extensions)
    }

    fn on_set_options(&mut self, props: &SetOptionsProps, members: &mut dyn BundleMembers) -> PlumeResult<()> {
        forward::<TextCommandsExtension>(props, members, &[("maxLength", "maxLength")])?;
        forward::<EditorAttributesExtension>(props, members, &[("attributes", "attributes")])
    }
}

/// Bold and links.
///
/// Options: `linkTarget` (static, `null`) becomes the link's
/// `defaultTarget`; `openLinkOnClick` (dynamic, `false`) is forwarded to
/// the link.
pub struct FormattingPreset {
    options: OptionStore,
}

impl FormattingPreset {
    pub const NAME: &'static str = "formatting";

    pub fn new() -> PlumeResult<Self> {
        Self::with_options(Value::Null)
    }

    pub fn with_options(options: Value) -> PlumeResult<Self> {
        let schema = OptionSchema::builder()
            .static_option("linkTarget", Value::Null)
            .dynamic("openLinkOnClick", json!(false))
            .build()?;
        Ok(Self {
            options: OptionStore::new(Self::NAME, schema, options)?,
        })
    }
}

impl Bundle for FormattingPreset {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn options(&self) -> &OptionStore {
        &self.options
    }

    fn options_mut(&mut self) -> &mut OptionStore {
        &mut self.options
    }

    fn create_extensions(&self) -> PlumeResult<Vec<Box<dyn Extension>>> {
        let link = LinkExtension::with_options(json!({
            "defaultTarget": self.options.get("linkTarget").cloned().unwrap_or(Value::Null),
            "openLinkOnClick": self.options.get("openLinkOnClick").cloned().unwrap_or(json!(false)),
        }))?;
        let extensions: Vec<Box<dyn Extension>> = vec![Box::new(BoldExtension::new()?), Box::new(link)];
        Ok(extensions)
    }

    fn on_set_options(&mut self, props: &SetOptionsProps, members: &mut dyn BundleMembers) -> PlumeResult<()> {
        forward::<LinkExtension>(props, members, &[("openLinkOnClick", "openLinkOnClick")])
    }
}
