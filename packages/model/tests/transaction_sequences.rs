//! Tests for multi-step transactions against the document model
//!
//! This tests:
//! - Mark steps across split text
//! - Attribute steps on nested nodes
//! - Position mapping across several steps
//! - Step serialization

use plume_model::{
    AttributeSpec, Assoc, EditorState, MarkSpec, NodeSpec, Schema, SchemaSpec, Selection,
    StateConfig, Step,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::rc::Rc;

fn schema() -> anyhow::Result<Rc<Schema>> {
    let mut spec = SchemaSpec::default();
    spec.nodes.insert(
        "doc".to_string(),
        NodeSpec {
            content: Some("block+".to_string()),
            ..Default::default()
        },
    );
    spec.nodes.insert("text".to_string(), NodeSpec::default());
    spec.nodes.insert(
        "paragraph".to_string(),
        NodeSpec {
            content: Some("inline*".to_string()),
            group: Some("block".to_string()),
            attrs: BTreeMap::from([("id".to_string(), AttributeSpec::with_default(json!(null)))]),
            ..Default::default()
        },
    );
    spec.marks.insert("bold".to_string(), MarkSpec::default());

    Ok(Rc::new(Schema::new(spec)?))
}

fn state_with_paragraphs(texts: &[&str]) -> anyhow::Result<EditorState> {
    let schema = schema()?;
    let mut paragraphs = Vec::new();
    for text in texts {
        let content = if text.is_empty() {
            vec![]
        } else {
            vec![schema.text(text, vec![])?]
        };
        paragraphs.push(schema.node("paragraph", None, content)?);
    }
    let doc = schema.node("doc", None, paragraphs)?;
    Ok(EditorState::create(StateConfig::new(schema).with_doc(doc))?)
}

#[test]
fn test_bold_then_unbold_restores_single_text_node() -> anyhow::Result<()> {
    let state = state_with_paragraphs(&["hello"])?;
    let bold = state.schema().mark("bold", None)?;

    let mut tr = state.tr();
    tr.add_mark(2, 4, bold.clone())?;
    assert_eq!(tr.doc().content[0].content.len(), 3);

    tr.remove_mark(2, 4, bold)?;
    assert_eq!(tr.doc().content[0].content.len(), 1);
    assert_eq!(tr.doc().text_content(), "hello");
    Ok(())
}

#[test]
fn test_set_attribute_on_second_paragraph() -> anyhow::Result<()> {
    let state = state_with_paragraphs(&["ab", "cd"])?;

    let mut tr = state.tr();
    tr.set_node_attribute(4, "id", json!("p2"))?;
    let applied = state
        .apply_transaction(tr)?
        .ok_or_else(|| anyhow::anyhow!("transaction rejected"))?;

    let doc = applied.state.doc();
    assert_eq!(doc.content[0].attr("id"), None);
    assert_eq!(doc.content[1].attr("id"), Some(&json!("p2")));
    assert_eq!(applied.state.version(), 1);
    Ok(())
}

#[test]
fn test_mapping_through_insert_and_delete() -> anyhow::Result<()> {
    let state = state_with_paragraphs(&["abcd", "ef"])?;

    let mut tr = state.tr();
    // "abcd" -> "aXYbcd"
    tr.insert_text_at("XY", 2, 2, vec![])?;
    // "aXYbcd" -> "aXYd"
    tr.delete(4, 6)?;

    // Start of the second paragraph moved from 6 to 6 + 2 - 2
    assert_eq!(tr.map(6, Assoc::After), 6);
    // Inside the deleted range collapses to the deletion point
    assert_eq!(tr.map(3, Assoc::After), 4);
    assert_eq!(tr.map(5, Assoc::After), 5);
    assert_eq!(tr.doc().text_content(), "aXYdef");
    Ok(())
}

#[test]
fn test_selection_follows_edits() -> anyhow::Result<()> {
    let schema = schema()?;
    let paragraph = schema.node("paragraph", None, vec![schema.text("abc", vec![])?])?;
    let doc = schema.node("doc", None, vec![paragraph])?;
    let state = EditorState::create(
        StateConfig::new(schema)
            .with_doc(doc)
            .with_selection(Selection::cursor(4)),
    )?;

    let mut tr = state.tr();
    tr.insert_text_at("zz", 1, 1, vec![])?;
    assert_eq!(tr.selection(), Selection::cursor(6));
    Ok(())
}

#[test]
fn test_step_json_shape() -> anyhow::Result<()> {
    let step = Step::SetAttr {
        pos: 3,
        name: "id".to_string(),
        value: json!("x"),
    };
    let value = serde_json::to_value(&step)?;
    assert_eq!(value["stepType"], json!("setAttr"));

    let back: Step = serde_json::from_value(value)?;
    assert_eq!(back, step);
    Ok(())
}
