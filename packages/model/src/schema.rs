//! # Schema
//!
//! Node and mark type definitions a document may contain.
//!
//! A [`Schema`] is built once from a [`SchemaSpec`] and shared behind an
//! `Rc`. It fills attribute defaults when creating nodes and marks, and
//! maps between nodes and [`DomElement`]s through the specs' parse rules
//! and `to_dom` serializers.

use crate::dom::DomElement;
use crate::error::{ModelError, ModelResult};
use crate::node::{Attrs, Mark, Node};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Reads node/mark attributes from a DOM element; `None` rejects the match
pub type GetAttrs = Rc<dyn Fn(&DomElement) -> Option<Attrs>>;

/// Serializes a node or mark to a DOM element
pub type ToDom<T> = Rc<dyn Fn(&T) -> DomElement>;

/// Schema-level attribute definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSpec {
    /// Default value. `None` makes the attribute required.
    pub default: Option<Value>,
}

impl AttributeSpec {
    pub fn required() -> Self {
        Self { default: None }
    }

    pub fn with_default(default: Value) -> Self {
        Self {
            default: Some(default),
        }
    }
}

/// DOM parse rule
#[derive(Clone)]
pub struct ParseRule {
    pub tag: String,
    pub get_attrs: Option<GetAttrs>,
}

impl ParseRule {
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            get_attrs: None,
        }
    }

    pub fn with_attrs(mut self, get_attrs: GetAttrs) -> Self {
        self.get_attrs = Some(get_attrs);
        self
    }
}

impl fmt::Debug for ParseRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseRule")
            .field("tag", &self.tag)
            .field("get_attrs", &self.get_attrs.is_some())
            .finish()
    }
}

/// Node type definition
#[derive(Clone, Default)]
pub struct NodeSpec {
    /// Content expression. `None` makes the node a leaf.
    pub content: Option<String>,
    pub group: Option<String>,
    pub inline: bool,
    pub attrs: BTreeMap<String, AttributeSpec>,
    pub parse_dom: Vec<ParseRule>,
    pub to_dom: Option<ToDom<Node>>,
}

impl fmt::Debug for NodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSpec")
            .field("content", &self.content)
            .field("group", &self.group)
            .field("inline", &self.inline)
            .field("attrs", &self.attrs)
            .field("parse_dom", &self.parse_dom)
            .field("to_dom", &self.to_dom.is_some())
            .finish()
    }
}

/// Mark type definition
#[derive(Clone, Default)]
pub struct MarkSpec {
    pub attrs: BTreeMap<String, AttributeSpec>,
    pub parse_dom: Vec<ParseRule>,
    pub to_dom: Option<ToDom<Mark>>,
}

impl fmt::Debug for MarkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkSpec")
            .field("attrs", &self.attrs)
            .field("parse_dom", &self.parse_dom)
            .field("to_dom", &self.to_dom.is_some())
            .finish()
    }
}

/// Input to [`Schema::new`]
#[derive(Debug, Clone, Default)]
pub struct SchemaSpec {
    pub nodes: BTreeMap<String, NodeSpec>,
    pub marks: BTreeMap<String, MarkSpec>,
    /// Defaults to `doc`
    pub top_node: Option<String>,
}

/// Result of matching a DOM element against the schema's parse rules
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedElement {
    Node { type_name: String, attrs: Attrs },
    Mark { type_name: String, attrs: Attrs },
}

#[derive(Debug, Clone)]
pub struct Schema {
    nodes: BTreeMap<String, NodeSpec>,
    marks: BTreeMap<String, MarkSpec>,
    top_node: String,
}

impl Schema {
    pub fn new(spec: SchemaSpec) -> ModelResult<Self> {
        let top_node = spec.top_node.unwrap_or_else(|| "doc".to_string());

        if !spec.nodes.contains_key(&top_node) {
            return Err(ModelError::InvalidSchema(format!(
                "top node '{top_node}' is not defined"
            )));
        }
        if !spec.nodes.contains_key("text") {
            return Err(ModelError::InvalidSchema(
                "every schema needs a 'text' node type".to_string(),
            ));
        }
        if spec.nodes[&top_node].content.is_none() {
            return Err(ModelError::InvalidSchema(format!(
                "top node '{top_node}' must accept content"
            )));
        }

        Ok(Self {
            nodes: spec.nodes,
            marks: spec.marks,
            top_node,
        })
    }

    pub fn top_node_type(&self) -> &str {
        &self.top_node
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn mark_names(&self) -> impl Iterator<Item = &str> {
        self.marks.keys().map(String::as_str)
    }

    pub fn node_spec(&self, name: &str) -> Option<&NodeSpec> {
        self.nodes.get(name)
    }

    pub fn mark_spec(&self, name: &str) -> Option<&MarkSpec> {
        self.marks.get(name)
    }

    /// Create a node, filling attribute defaults
    pub fn node(&self, type_name: &str, attrs: Option<Attrs>, content: Vec<Node>) -> ModelResult<Node> {
        if type_name == "text" {
            return Err(ModelError::InvalidSchema(
                "text nodes are created with Schema::text".to_string(),
            ));
        }

        let spec = self
            .nodes
            .get(type_name)
            .ok_or_else(|| ModelError::UnknownNodeType(type_name.to_string()))?;
        let attrs = compute_attrs(type_name, &spec.attrs, attrs.unwrap_or_default())?;

        if spec.content.is_none() {
            if !content.is_empty() {
                return Err(ModelError::LeafContent(type_name.to_string()));
            }
            return Ok(Node::leaf(type_name, attrs));
        }

        Ok(Node::branch(type_name, attrs, content))
    }

    pub fn text(&self, text: &str, marks: Vec<Mark>) -> ModelResult<Node> {
        for mark in &marks {
            if !self.marks.contains_key(&mark.type_name) {
                return Err(ModelError::UnknownMarkType(mark.type_name.clone()));
            }
        }
        Node::text_node(text, marks)
    }

    /// Create a mark, filling attribute defaults
    pub fn mark(&self, type_name: &str, attrs: Option<Attrs>) -> ModelResult<Mark> {
        let spec = self
            .marks
            .get(type_name)
            .ok_or_else(|| ModelError::UnknownMarkType(type_name.to_string()))?;
        let attrs = compute_attrs(type_name, &spec.attrs, attrs.unwrap_or_default())?;
        Ok(Mark::new(type_name, attrs))
    }

    /// Match a DOM element against node rules first, then mark rules
    pub fn parse_element(&self, element: &DomElement) -> Option<ParsedElement> {
        for (name, spec) in &self.nodes {
            if let Some(attrs) = match_rules(&spec.parse_dom, element) {
                return Some(ParsedElement::Node {
                    type_name: name.clone(),
                    attrs,
                });
            }
        }

        for (name, spec) in &self.marks {
            if let Some(attrs) = match_rules(&spec.parse_dom, element) {
                return Some(ParsedElement::Mark {
                    type_name: name.clone(),
                    attrs,
                });
            }
        }

        None
    }

    pub fn serialize_node(&self, node: &Node) -> Option<DomElement> {
        let to_dom = self.nodes.get(&node.type_name)?.to_dom.as_ref()?;
        Some(to_dom(node))
    }

    pub fn serialize_mark(&self, mark: &Mark) -> Option<DomElement> {
        let to_dom = self.marks.get(&mark.type_name)?.to_dom.as_ref()?;
        Some(to_dom(mark))
    }
}

fn match_rules(rules: &[ParseRule], element: &DomElement) -> Option<Attrs> {
    rules
        .iter()
        .filter(|rule| rule.tag == element.tag)
        .find_map(|rule| match &rule.get_attrs {
            Some(get_attrs) => get_attrs(element),
            None => Some(Attrs::new()),
        })
}

fn compute_attrs(
    type_name: &str,
    specs: &BTreeMap<String, AttributeSpec>,
    mut given: Attrs,
) -> ModelResult<Attrs> {
    let mut attrs = Attrs::new();
    for (name, spec) in specs {
        let value = match given.remove(name) {
            Some(value) => value,
            None => spec.default.clone().ok_or_else(|| ModelError::MissingAttribute {
                type_name: type_name.to_string(),
                attribute: name.clone(),
            })?,
        };
        attrs.insert(name.clone(), value);
    }
    Ok(attrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec() -> SchemaSpec {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            "doc".to_string(),
            NodeSpec {
                content: Some("block+".to_string()),
                ..Default::default()
            },
        );
        nodes.insert("text".to_string(), NodeSpec::default());
        nodes.insert(
            "heading".to_string(),
            NodeSpec {
                content: Some("inline*".to_string()),
                attrs: BTreeMap::from([
                    ("level".to_string(), AttributeSpec::with_default(json!(1))),
                    ("id".to_string(), AttributeSpec::required()),
                ]),
                parse_dom: vec![ParseRule::tag("h1")],
                ..Default::default()
            },
        );

        SchemaSpec {
            nodes,
            ..Default::default()
        }
    }

    #[test]
    fn test_schema_requires_text_node() {
        let mut spec = spec();
        spec.nodes.remove("text");
        assert!(matches!(Schema::new(spec), Err(ModelError::InvalidSchema(_))));
    }

    #[test]
    fn test_node_fills_defaults() {
        let schema = Schema::new(spec()).unwrap();
        let heading = schema
            .node("heading", Some(Attrs::from([("id".to_string(), json!("h"))])), vec![])
            .unwrap();
        assert_eq!(heading.attrs["level"], json!(1));
    }

    #[test]
    fn test_node_missing_required_attribute() {
        let schema = Schema::new(spec()).unwrap();
        let err = schema.node("heading", None, vec![]).unwrap_err();
        assert_eq!(
            err,
            ModelError::MissingAttribute {
                type_name: "heading".to_string(),
                attribute: "id".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_element_matches_tag() {
        let schema = Schema::new(spec()).unwrap();
        let parsed = schema.parse_element(&DomElement::new("h1"));
        assert!(matches!(parsed, Some(ParsedElement::Node { ref type_name, .. }) if type_name == "heading"));
        assert!(schema.parse_element(&DomElement::new("blink")).is_none());
    }
}
