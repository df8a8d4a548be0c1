//! Tag index
//!
//! Maps tags to extension names, overall and per extension type. Built once
//! from `Extension::tags()` plus each extension's `extraTags` option.

use crate::extension::{Extension, ExtensionType};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagIndex {
    all: BTreeMap<String, Vec<String>>,
    by_type: BTreeMap<(ExtensionType, String), Vec<String>>,
    by_name: BTreeMap<String, Vec<String>>,
}

impl TagIndex {
    /// Index every extension unless tags are excluded globally or by the
    /// extension's own `exclude.tags` option
    pub fn build(extensions: &[Box<dyn Extension>], exclude_all: bool) -> Self {
        let mut index = TagIndex::default();
        if exclude_all {
            return index;
        }

        for extension in extensions {
            if extension.options().exclude().tags {
                debug!(extension = extension.name(), "Tags excluded");
                continue;
            }

            let mut tags: Vec<String> = Vec::new();
            for tag in extension.tags().into_iter().chain(extension.options().extra_tags()) {
                push_unique(&mut tags, &tag);
            }

            let name = extension.name().to_string();
            let kind = extension.extension_type();
            for tag in &tags {
                push_unique(index.all.entry(tag.clone()).or_default(), &name);
                push_unique(index.by_type.entry((kind, tag.clone())).or_default(), &name);
            }
            if !tags.is_empty() {
                index.by_name.insert(name, tags);
            }
        }

        index
    }

    /// Names of all extensions with a tag
    pub fn names(&self, tag: &str) -> &[String] {
        self.all.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn names_of_type(&self, tag: &str, kind: ExtensionType) -> &[String] {
        self.by_type
            .get(&(kind, tag.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn node_names(&self, tag: &str) -> &[String] {
        self.names_of_type(tag, ExtensionType::Node)
    }

    pub fn mark_names(&self, tag: &str) -> &[String] {
        self.names_of_type(tag, ExtensionType::Mark)
    }

    pub fn plain_names(&self, tag: &str) -> &[String] {
        self.names_of_type(tag, ExtensionType::Plain)
    }

    /// Tags of one extension
    pub fn tags_of(&self, name: &str) -> &[String] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.all.keys().map(String::as_str)
    }
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|existing| existing == name) {
        names.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlumeResult;
    use crate::extension::ExtensionBase;
    use crate::options::OptionSchema;
    use serde_json::{json, Value};

    struct Tagged {
        name: &'static str,
        tags: Vec<String>,
        base: ExtensionBase,
    }

    impl Tagged {
        fn new(name: &'static str, tags: &[&str], options: Value) -> PlumeResult<Box<dyn Extension>> {
            Ok(Box::new(Self {
                name,
                tags: tags.iter().map(|tag| tag.to_string()).collect(),
                base: ExtensionBase::new(name, OptionSchema::empty(), options)?,
            }))
        }
    }

    impl Extension for Tagged {
        fn name(&self) -> &str {
            self.name
        }

        fn base(&self) -> &ExtensionBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ExtensionBase {
            &mut self.base
        }

        fn tags(&self) -> Vec<String> {
            self.tags.clone()
        }
    }

    #[test]
    fn test_build_merges_extra_tags() {
        let extensions = vec![
            Tagged::new("history", &["behavior"], json!({ "extraTags": ["behavior", "undo"] })).unwrap(),
            Tagged::new("events", &["behavior"], Value::Null).unwrap(),
            Tagged::new("hidden", &["behavior"], json!({ "exclude": { "tags": true } })).unwrap(),
        ];

        let index = TagIndex::build(&extensions, false);
        assert_eq!(index.names("behavior"), ["history", "events"]);
        assert_eq!(index.plain_names("undo"), ["history"]);
        assert!(index.node_names("behavior").is_empty());
        assert_eq!(index.tags_of("history"), ["behavior", "undo"]);
        assert!(index.tags_of("hidden").is_empty());
    }

    #[test]
    fn test_global_exclude() {
        let extensions = vec![Tagged::new("history", &["behavior"], Value::Null).unwrap()];
        let index = TagIndex::build(&extensions, true);
        assert_eq!(index.tags().count(), 0);
    }
}
