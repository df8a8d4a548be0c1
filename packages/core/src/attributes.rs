//! Editor attributes
//!
//! Extensions contribute attributes for the editor's root element. They are
//! merged in resolved order: the higher-priority value wins for every key
//! except `class`, whose values are concatenated.

use crate::extension::Extension;
use std::collections::BTreeMap;
use tracing::debug;

pub type EditorAttributes = BTreeMap<String, String>;

pub trait AttributesProvider {
    fn create_attributes(&self) -> EditorAttributes;
}

/// Merge the attributes of every provider that is not excluded
pub fn merge_attributes(extensions: &[Box<dyn Extension>], exclude_all: bool) -> EditorAttributes {
    let mut merged = EditorAttributes::new();
    if exclude_all {
        return merged;
    }

    for extension in extensions {
        let Some(provider) = extension.as_attributes() else {
            continue;
        };
        if extension.options().exclude().attributes {
            debug!(extension = extension.name(), "Attributes excluded");
            continue;
        }

        for (name, value) in provider.create_attributes() {
            if name == "class" {
                let classes = merged.entry(name).or_default();
                for class in value.split_whitespace() {
                    if !classes.split_whitespace().any(|existing| existing == class) {
                        if !classes.is_empty() {
                            classes.push(' ');
                        }
                        classes.push_str(class);
                    }
                }
            } else {
                merged.entry(name).or_insert(value);
            }
        }
    }

    merged
}
