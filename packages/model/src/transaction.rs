//! # Transactions
//!
//! A transaction accumulates steps against the document of one state
//! version. It is consumed by [`EditorState::apply_transaction`], so once
//! dispatched it can no longer be changed.
//!
//! [`EditorState::apply_transaction`]: crate::EditorState::apply_transaction

use crate::error::ModelResult;
use crate::node::{Mark, Node};
use crate::schema::Schema;
use crate::state::EditorState;
use crate::step::{Assoc, Step, StepMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one transaction, unique within the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    fn next() -> Self {
        Self(NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Text selection (anchor and head positions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn cursor(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    pub fn map(&self, map: &StepMap) -> Self {
        Self::new(map.map(self.anchor, Assoc::After), map.map(self.head, Assoc::After))
    }
}

#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    schema: Rc<Schema>,
    before: Node,
    doc: Node,
    steps: Vec<Step>,
    maps: Vec<StepMap>,
    selection: Selection,
    selection_set: bool,
    meta: BTreeMap<String, Value>,
    start_version: u64,
}

impl Transaction {
    pub(crate) fn new(state: &EditorState) -> Self {
        Self {
            id: TransactionId::next(),
            schema: state.schema().clone(),
            before: state.doc().clone(),
            doc: state.doc().clone(),
            steps: Vec::new(),
            maps: Vec::new(),
            selection: state.selection(),
            selection_set: false,
            meta: BTreeMap::new(),
            start_version: state.version(),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn schema(&self) -> &Rc<Schema> {
        &self.schema
    }

    /// Document the transaction started from
    pub fn before(&self) -> &Node {
        &self.before
    }

    /// Document after all steps so far
    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    /// State version this transaction was created against
    pub fn start_version(&self) -> u64 {
        self.start_version
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn selection_set(&self) -> bool {
        self.selection_set
    }

    /// Apply a step, leaving the transaction unchanged if it fails
    pub fn step(&mut self, step: Step) -> ModelResult<&mut Self> {
        let doc = step.apply(&self.doc)?;
        let map = step.get_map();
        self.selection = self.selection.map(&map);
        self.doc = doc;
        self.maps.push(map);
        self.steps.push(step);
        Ok(self)
    }

    /// Map a position from the start document through every step
    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.maps.iter().fold(pos, |pos, map| map.map(pos, assoc))
    }

    pub fn replace_with(&mut self, from: usize, to: usize, content: Vec<Node>) -> ModelResult<&mut Self> {
        self.step(Step::Replace { from, to, content })
    }

    pub fn insert(&mut self, pos: usize, content: Vec<Node>) -> ModelResult<&mut Self> {
        self.replace_with(pos, pos, content)
    }

    pub fn delete(&mut self, from: usize, to: usize) -> ModelResult<&mut Self> {
        self.replace_with(from, to, Vec::new())
    }

    /// Replace the current selection with text
    pub fn insert_text(&mut self, text: &str) -> ModelResult<&mut Self> {
        let selection = self.selection;
        self.insert_text_at(text, selection.from(), selection.to(), Vec::new())
    }

    pub fn insert_text_at(
        &mut self,
        text: &str,
        from: usize,
        to: usize,
        marks: Vec<Mark>,
    ) -> ModelResult<&mut Self> {
        if text.is_empty() {
            return self.delete(from, to);
        }
        let node = self.schema.text(text, marks)?;
        self.replace_with(from, to, vec![node])
    }

    pub fn add_mark(&mut self, from: usize, to: usize, mark: Mark) -> ModelResult<&mut Self> {
        self.step(Step::AddMark { from, to, mark })
    }

    pub fn remove_mark(&mut self, from: usize, to: usize, mark: Mark) -> ModelResult<&mut Self> {
        self.step(Step::RemoveMark { from, to, mark })
    }

    pub fn set_node_attribute(
        &mut self,
        pos: usize,
        name: impl Into<String>,
        value: Value,
    ) -> ModelResult<&mut Self> {
        self.step(Step::SetAttr {
            pos,
            name: name.into(),
            value,
        })
    }

    pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
        self.selection = selection;
        self.selection_set = true;
        self
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.meta.insert(key.into(), value);
        self
    }

    pub fn get_meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }
}
