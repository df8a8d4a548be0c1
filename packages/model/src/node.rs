//! # Document Nodes
//!
//! Immutable-by-convention document tree. Nodes are plain values; edits go
//! through [`Step`](crate::Step)s which produce a new tree.

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute map shared by nodes and marks
pub type Attrs = BTreeMap<String, Value>;

/// Inline annotation attached to text (bold, link, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    pub type_name: String,
    #[serde(default)]
    pub attrs: Attrs,
}

impl Mark {
    pub fn new(type_name: impl Into<String>, attrs: Attrs) -> Self {
        Self {
            type_name: type_name.into(),
            attrs,
        }
    }

    pub fn is_in_set(&self, set: &[Mark]) -> bool {
        set.iter().any(|mark| mark == self)
    }

    /// Add this mark to a set, replacing any mark of the same type
    pub fn add_to_set(&self, set: &[Mark]) -> Vec<Mark> {
        let mut next: Vec<Mark> = set
            .iter()
            .filter(|mark| mark.type_name != self.type_name)
            .cloned()
            .collect();
        next.push(self.clone());
        next.sort_by(|a, b| a.type_name.cmp(&b.type_name));
        next
    }

    pub fn remove_from_set(&self, set: &[Mark]) -> Vec<Mark> {
        set.iter().filter(|mark| *mark != self).cloned().collect()
    }
}

/// Document node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub type_name: String,

    #[serde(default)]
    pub attrs: Attrs,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Node>,

    /// Text content (text nodes only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Marks (text nodes only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,

    /// Leaf nodes cannot hold content and occupy a single position
    #[serde(default)]
    pub leaf: bool,
}

impl Node {
    /// Create a node with content. Prefer [`Schema::node`](crate::Schema::node),
    /// which fills in attribute defaults.
    pub fn branch(type_name: impl Into<String>, attrs: Attrs, content: Vec<Node>) -> Self {
        Self {
            type_name: type_name.into(),
            attrs,
            content,
            text: None,
            marks: Vec::new(),
            leaf: false,
        }
    }

    pub fn leaf(type_name: impl Into<String>, attrs: Attrs) -> Self {
        Self {
            leaf: true,
            ..Self::branch(type_name, attrs, Vec::new())
        }
    }

    pub fn text_node(text: impl Into<String>, marks: Vec<Mark>) -> ModelResult<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(ModelError::EmptyText);
        }

        Ok(Self {
            type_name: "text".to_string(),
            attrs: Attrs::new(),
            content: Vec::new(),
            text: Some(text),
            marks,
            leaf: false,
        })
    }

    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }

    /// Text and leaf nodes have no content positions
    pub fn is_atom(&self) -> bool {
        self.is_text() || self.leaf
    }

    /// Number of positions this node occupies in its parent
    pub fn node_size(&self) -> usize {
        match &self.text {
            Some(text) => text.chars().count(),
            None if self.leaf => 1,
            None => self.content_size() + 2,
        }
    }

    pub fn content_size(&self) -> usize {
        content_size(&self.content)
    }

    /// Concatenated text of all descendants
    pub fn text_content(&self) -> String {
        match &self.text {
            Some(text) => text.clone(),
            None => self.content.iter().map(Node::text_content).collect(),
        }
    }

    /// Get an attribute value, treating `null` as unset
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name).filter(|value| !value.is_null())
    }

    /// Visit every descendant with its position (relative to this node's
    /// content start). Returning `false` skips the node's children.
    pub fn descendants<F>(&self, mut f: F)
    where
        F: FnMut(&Node, usize) -> bool,
    {
        walk(&self.content, 0, &mut f);
    }

    /// The node starting exactly at `pos`, if any
    pub fn node_at(&self, pos: usize) -> Option<&Node> {
        let mut offset = 0;
        for child in &self.content {
            let end = offset + child.node_size();
            if offset == pos {
                return Some(child);
            }
            if pos > offset && pos < end {
                if child.is_atom() {
                    return None;
                }
                return child.node_at(pos - offset - 1);
            }
            offset = end;
        }
        None
    }

    pub(crate) fn replace(&mut self, from: usize, to: usize, insert: Vec<Node>) -> ModelResult<()> {
        if from > to {
            return Err(ModelError::InvalidRange { from, to });
        }
        let size = self.content_size();
        if to > size {
            return Err(ModelError::PositionOutOfRange { pos: to, size });
        }
        replace_in(&mut self.content, from, to, insert, (from, to))
    }

    pub(crate) fn set_attr(&mut self, pos: usize, name: &str, value: Value) -> ModelResult<()> {
        let mut offset = 0;
        for child in &mut self.content {
            let end = offset + child.node_size();
            if offset == pos && !child.is_text() {
                child.attrs.insert(name.to_string(), value);
                return Ok(());
            }
            if pos > offset && pos < end && !child.is_atom() {
                return child.set_attr(pos - offset - 1, name, value);
            }
            offset = end;
        }
        Err(ModelError::NoNodeAt(pos))
    }

    pub(crate) fn update_marks<F>(&mut self, from: usize, to: usize, f: &F) -> ModelResult<()>
    where
        F: Fn(&[Mark]) -> Vec<Mark>,
    {
        if from > to {
            return Err(ModelError::InvalidRange { from, to });
        }
        let size = self.content_size();
        if to > size {
            return Err(ModelError::PositionOutOfRange { pos: to, size });
        }
        update_marks_in(&mut self.content, from, to, f);
        Ok(())
    }

    /// Slice of a text node by character offsets (`None` when empty)
    fn text_slice(&self, from: usize, to: usize) -> Option<Node> {
        let text = self.text.as_ref()?;
        let slice: String = text.chars().skip(from).take(to.saturating_sub(from)).collect();
        if slice.is_empty() {
            return None;
        }

        Some(Node {
            text: Some(slice),
            ..self.clone()
        })
    }
}

fn content_size(content: &[Node]) -> usize {
    content.iter().map(Node::node_size).sum()
}

fn walk<F>(content: &[Node], base: usize, f: &mut F)
where
    F: FnMut(&Node, usize) -> bool,
{
    let mut pos = base;
    for child in content {
        let descend = f(child, pos);
        if descend && !child.is_atom() {
            walk(&child.content, pos + 1, f);
        }
        pos += child.node_size();
    }
}

fn replace_in(
    content: &mut Vec<Node>,
    from: usize,
    to: usize,
    insert: Vec<Node>,
    range: (usize, usize),
) -> ModelResult<()> {
    // Descend when the whole range sits inside one child's content
    let mut offset = 0;
    for child in content.iter_mut() {
        let end = offset + child.node_size();
        if !child.is_atom() && from > offset && to < end {
            return replace_in(&mut child.content, from - offset - 1, to - offset - 1, insert, range);
        }
        offset = end;
    }

    let nodes = std::mem::take(content);
    let (before, rest) = match split_content(nodes, from, range) {
        Ok(parts) => parts,
        Err((nodes, err)) => {
            *content = nodes;
            return Err(err);
        }
    };
    let (_, after) = match split_content(rest, to - from, range) {
        Ok(parts) => parts,
        Err((rest, err)) => {
            *content = before.into_iter().chain(rest).collect();
            return Err(err);
        }
    };

    *content = normalize(before.into_iter().chain(insert).chain(after).collect());
    Ok(())
}

type SplitResult = Result<(Vec<Node>, Vec<Node>), (Vec<Node>, ModelError)>;

fn split_content(nodes: Vec<Node>, at: usize, range: (usize, usize)) -> SplitResult {
    let straddles = {
        let mut offset = 0;
        nodes.iter().any(|node| {
            let start = offset;
            offset += node.node_size();
            !node.is_text() && at > start && at < offset
        })
    };
    if straddles {
        let (from, to) = range;
        return Err((nodes, ModelError::CrossesNodeBoundary { from, to }));
    }

    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut offset = 0;
    for node in nodes {
        let size = node.node_size();
        if offset + size <= at {
            left.push(node);
        } else if offset >= at {
            right.push(node);
        } else {
            let cut = at - offset;
            left.extend(node.text_slice(0, cut));
            right.extend(node.text_slice(cut, size));
        }
        offset += size;
    }
    Ok((left, right))
}

fn update_marks_in<F>(content: &mut Vec<Node>, from: usize, to: usize, f: &F)
where
    F: Fn(&[Mark]) -> Vec<Mark>,
{
    let mut out = Vec::with_capacity(content.len());
    let mut offset = 0;
    for mut node in std::mem::take(content) {
        let start = offset;
        let end = start + node.node_size();
        offset = end;

        if end <= from || start >= to {
            out.push(node);
            continue;
        }

        if node.is_text() {
            let local_from = from.max(start) - start;
            let local_to = to.min(end) - start;
            let size = end - start;
            out.extend(node.text_slice(0, local_from));
            if let Some(mut middle) = node.text_slice(local_from, local_to) {
                middle.marks = f(&middle.marks);
                out.push(middle);
            }
            out.extend(node.text_slice(local_to, size));
        } else if !node.leaf {
            let inner_from = from.saturating_sub(start + 1);
            let inner_to = to.min(end - 1).saturating_sub(start + 1);
            if inner_from < inner_to {
                update_marks_in(&mut node.content, inner_from, inner_to, f);
            }
            out.push(node);
        } else {
            out.push(node);
        }
    }
    *content = normalize(out);
}

/// Merge adjacent text nodes with identical marks
fn normalize(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let (Some(last), Some(text)) = (out.last_mut(), node.text.as_ref()) {
            if last.marks == node.marks {
                if let Some(last_text) = last.text.as_mut() {
                    last_text.push_str(text);
                    continue;
                }
            }
        }
        out.push(node);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paragraph(text: &str) -> Node {
        Node::branch(
            "paragraph",
            Attrs::new(),
            vec![Node::text_node(text, vec![]).unwrap()],
        )
    }

    fn doc(content: Vec<Node>) -> Node {
        Node::branch("doc", Attrs::new(), content)
    }

    #[test]
    fn test_sizes() {
        let doc = doc(vec![paragraph("abc"), Node::leaf("rule", Attrs::new())]);
        assert_eq!(doc.content_size(), 6);
        assert_eq!(doc.content[0].node_size(), 5);
    }

    #[test]
    fn test_descendants_positions() {
        let doc = doc(vec![paragraph("ab"), paragraph("cd")]);
        let mut seen = Vec::new();
        doc.descendants(|node, pos| {
            seen.push((node.type_name.clone(), pos));
            true
        });

        assert_eq!(
            seen,
            vec![
                ("paragraph".to_string(), 0),
                ("text".to_string(), 1),
                ("paragraph".to_string(), 4),
                ("text".to_string(), 5),
            ]
        );
    }

    #[test]
    fn test_insert_text_inside_paragraph() {
        let mut doc = doc(vec![paragraph("ad")]);
        doc.replace(2, 2, vec![Node::text_node("bc", vec![]).unwrap()])
            .unwrap();
        assert_eq!(doc.text_content(), "abcd");
        // Adjacent text is merged back into one node
        assert_eq!(doc.content[0].content.len(), 1);
    }

    #[test]
    fn test_delete_across_paragraphs_is_rejected() {
        let mut doc = doc(vec![paragraph("ab"), paragraph("cd")]);
        let err = doc.replace(2, 6, vec![]).unwrap_err();
        assert_eq!(err, ModelError::CrossesNodeBoundary { from: 2, to: 6 });
        assert_eq!(doc.text_content(), "abcd");
    }

    #[test]
    fn test_mark_range_splits_text() {
        let mut doc = doc(vec![paragraph("abcd")]);
        let bold = Mark::new("bold", Attrs::new());
        doc.update_marks(2, 4, &|marks| bold.add_to_set(marks)).unwrap();

        let inline = &doc.content[0].content;
        assert_eq!(inline.len(), 3);
        assert_eq!(inline[1].text.as_deref(), Some("bc"));
        assert!(bold.is_in_set(&inline[1].marks));
    }

    #[test]
    fn test_set_attr_and_node_at() {
        let mut doc = doc(vec![paragraph("ab"), paragraph("cd")]);
        doc.set_attr(4, "id", json!("second")).unwrap();
        assert_eq!(doc.node_at(4).unwrap().attr("id"), Some(&json!("second")));
        assert!(doc.set_attr(2, "id", json!("x")).is_err());
    }
}
