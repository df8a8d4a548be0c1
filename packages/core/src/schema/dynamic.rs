//! Runtime backfill of dynamic attributes
//!
//! Dynamic attributes are stored as `null` in the schema. After every
//! transaction that changes the document, the backfill plugin walks the new
//! document and computes each unset dynamic attribute exactly once, adding
//! the writes to the same outgoing transaction.

use super::apply::{AttributeTarget, DynamicDefault};
use crate::extension::ExtensionType;
use plume_model::{EditorState, Mark, ModelResult, Plugin, Transaction, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

pub const BACKFILL_PLUGIN_KEY: &str = "plume:dynamicAttributes";

type AttributeMap = BTreeMap<String, BTreeMap<String, DynamicDefault>>;

/// `(type name, attribute) → DynamicDefault`, split by node and mark types
#[derive(Clone, Default)]
pub struct DynamicAttributes {
    nodes: AttributeMap,
    marks: AttributeMap,
}

impl DynamicAttributes {
    pub fn insert(&mut self, kind: ExtensionType, type_name: &str, attribute: &str, create: DynamicDefault) {
        let map = match kind {
            ExtensionType::Node => &mut self.nodes,
            ExtensionType::Mark => &mut self.marks,
            ExtensionType::Plain => return,
        };
        map.entry(type_name.to_string())
            .or_default()
            .insert(attribute.to_string(), create);
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.marks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.values().chain(self.marks.values()).map(BTreeMap::len).sum()
    }

    pub fn contains(&self, type_name: &str, attribute: &str) -> bool {
        [&self.nodes, &self.marks]
            .iter()
            .any(|map| map.get(type_name).is_some_and(|attrs| attrs.contains_key(attribute)))
    }

    /// Plugin appending backfill steps to document-changing transactions
    pub fn backfill_plugin(self: &Rc<Self>) -> Plugin {
        let dynamic = self.clone();
        Plugin::new(BACKFILL_PLUGIN_KEY).with_append(Rc::new(
            move |tr: &mut Transaction, _state: &EditorState| {
                if !tr.doc_changed() {
                    return Ok(());
                }
                dynamic.backfill(tr)
            },
        ))
    }

    fn backfill(&self, tr: &mut Transaction) -> ModelResult<()> {
        let mut node_updates: Vec<(usize, String, Value)> = Vec::new();
        // Unset marks as contiguous `(from, to, mark)` runs across text nodes
        let mut mark_runs: Vec<(usize, usize, Mark)> = Vec::new();

        tr.doc().descendants(|node, pos| {
            if let Some(attributes) = self.nodes.get(&node.type_name) {
                for (name, create) in attributes {
                    if node.attr(name).is_none() {
                        node_updates.push((pos, name.clone(), create(AttributeTarget::Node(node))));
                    }
                }
            }

            let end = pos + node.node_size();
            for mark in &node.marks {
                let Some(attributes) = self.marks.get(&mark.type_name) else {
                    continue;
                };
                let unset = attributes
                    .keys()
                    .any(|name| mark.attrs.get(name).map_or(true, Value::is_null));
                if !unset {
                    continue;
                }
                match mark_runs
                    .iter_mut()
                    .find(|(_, to, previous)| *to == pos && previous == mark)
                {
                    Some(run) => run.1 = end,
                    None => mark_runs.push((pos, end, mark.clone())),
                }
            }
            true
        });

        if node_updates.is_empty() && mark_runs.is_empty() {
            return Ok(());
        }
        debug!(
            nodes = node_updates.len(),
            marks = mark_runs.len(),
            "Backfilling dynamic attributes"
        );

        for (pos, name, value) in node_updates {
            tr.set_node_attribute(pos, name, value)?;
        }
        // Marks are values: replace the old mark with the completed one over
        // the whole run, computing each attribute once per run
        for (from, to, previous) in mark_runs {
            let mut next = previous.clone();
            if let Some(attributes) = self.marks.get(&previous.type_name) {
                for (name, create) in attributes {
                    if previous.attrs.get(name).map_or(true, Value::is_null) {
                        next.attrs.insert(name.clone(), create(AttributeTarget::Mark(&previous)));
                    }
                }
            }
            tr.remove_mark(from, to, previous)?;
            tr.add_mark(from, to, next)?;
        }
        Ok(())
    }
}

impl fmt::Debug for DynamicAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |map: &AttributeMap| -> Vec<String> {
            map.iter()
                .flat_map(|(type_name, attrs)| attrs.keys().map(move |attr| format!("{type_name}.{attr}")))
                .collect()
        };
        f.debug_struct("DynamicAttributes")
            .field("nodes", &names(&self.nodes))
            .field("marks", &names(&self.marks))
            .finish()
    }
}
