use super::apply::SchemaAttributes;
use crate::extension::ExtensionType;
use crate::tags::TagIndex;
use serde::{Deserialize, Serialize};

/// Which node and mark types an attribute group targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Identifiers {
    /// Every node type except `text`
    Nodes,
    Marks,
    /// Every node (except `text`) and mark type
    All,
    Names(Vec<String>),
    Tags(TagsFilter),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TagsFilter {
    pub tags: Vec<String>,
    /// Restrict tagged names to nodes or marks (both when unset)
    #[serde(rename = "type")]
    pub kind: Option<ExtensionType>,
    /// Always included
    pub names: Vec<String>,
    pub exclude_names: Vec<String>,
    /// Drop any name carrying one of these tags
    pub exclude_tags: Vec<String>,
}

/// Attribute group with its targets
#[derive(Debug, Clone)]
pub struct IdentifierSchemaAttributes {
    pub identifiers: Identifiers,
    pub attributes: SchemaAttributes,
}

impl IdentifierSchemaAttributes {
    pub fn new(identifiers: Identifiers, attributes: SchemaAttributes) -> Self {
        Self {
            identifiers,
            attributes,
        }
    }
}

impl Identifiers {
    pub fn resolve(&self, nodes: &[String], marks: &[String], tags: &TagIndex) -> Vec<String> {
        let without_text = |names: &[String]| -> Vec<String> {
            names.iter().filter(|name| *name != "text").cloned().collect()
        };

        match self {
            Identifiers::Nodes => without_text(nodes),
            Identifiers::Marks => marks.to_vec(),
            Identifiers::All => {
                let mut names = without_text(nodes);
                names.extend(marks.iter().cloned());
                names
            }
            Identifiers::Names(names) => names.clone(),
            Identifiers::Tags(filter) => filter.resolve(tags),
        }
    }
}

impl TagsFilter {
    fn resolve(&self, index: &TagIndex) -> Vec<String> {
        let mut names: Vec<String> = self.names.clone();

        for tag in &self.tags {
            let tagged: Vec<&String> = match self.kind {
                Some(kind) => index.names_of_type(tag, kind).iter().collect(),
                None => index
                    .node_names(tag)
                    .iter()
                    .chain(index.mark_names(tag))
                    .collect(),
            };
            for name in tagged {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }

        names.retain(|name| {
            !self.exclude_names.contains(name)
                && !index
                    .tags_of(name)
                    .iter()
                    .any(|tag| self.exclude_tags.contains(tag))
        });
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_nodes_and_all_skip_text() {
        let nodes = names(&["doc", "text", "paragraph"]);
        let marks = names(&["bold"]);
        let tags = TagIndex::default();

        assert_eq!(Identifiers::Nodes.resolve(&nodes, &marks, &tags), ["doc", "paragraph"]);
        assert_eq!(Identifiers::All.resolve(&nodes, &marks, &tags), ["doc", "paragraph", "bold"]);
        assert_eq!(Identifiers::Marks.resolve(&nodes, &marks, &tags), ["bold"]);
        assert_eq!(
            Identifiers::Names(names(&["text"])).resolve(&nodes, &marks, &tags),
            ["text"]
        );
    }

    #[test]
    fn test_parse_tags_filter() {
        let identifiers: Identifiers = serde_json::from_value(json!({
            "tags": { "tags": ["block"], "type": "node", "excludeNames": ["heading"] }
        }))
        .unwrap();

        match identifiers {
            Identifiers::Tags(filter) => {
                assert_eq!(filter.tags, ["block"]);
                assert_eq!(filter.kind, Some(ExtensionType::Node));
                assert_eq!(filter.exclude_names, ["heading"]);
                assert!(filter.names.is_empty());
                assert!(filter.resolve(&TagIndex::default()).is_empty());
            }
            other => panic!("unexpected identifiers: {other:?}"),
        }
    }
}
