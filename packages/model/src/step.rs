//! # Steps
//!
//! Atomic document changes. Each step produces a new document (leaving the
//! input untouched on failure) and a [`StepMap`] describing how positions
//! move across it.

use crate::error::ModelResult;
use crate::node::{Mark, Node};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stepType", rename_all = "camelCase")]
pub enum Step {
    /// Replace `from..to` with `content` (both ends inside the same parent)
    Replace {
        from: usize,
        to: usize,
        content: Vec<Node>,
    },

    /// Add a mark to all text in `from..to`
    AddMark { from: usize, to: usize, mark: Mark },

    /// Remove a mark from all text in `from..to`
    RemoveMark { from: usize, to: usize, mark: Mark },

    /// Set one attribute on the node starting at `pos`
    SetAttr {
        pos: usize,
        name: String,
        value: Value,
    },
}

impl Step {
    pub fn apply(&self, doc: &Node) -> ModelResult<Node> {
        let mut next = doc.clone();
        match self {
            Step::Replace { from, to, content } => next.replace(*from, *to, content.clone())?,
            Step::AddMark { from, to, mark } => {
                next.update_marks(*from, *to, &|marks: &[Mark]| mark.add_to_set(marks))?
            }
            Step::RemoveMark { from, to, mark } => {
                next.update_marks(*from, *to, &|marks: &[Mark]| mark.remove_from_set(marks))?
            }
            Step::SetAttr { pos, name, value } => next.set_attr(*pos, name, value.clone())?,
        }
        Ok(next)
    }

    pub fn get_map(&self) -> StepMap {
        match self {
            Step::Replace { from, to, content } => StepMap {
                range: Some((*from, to - from, content.iter().map(Node::node_size).sum())),
            },
            _ => StepMap::identity(),
        }
    }
}

/// Which side a position sticks to when content is inserted right at it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Before,
    After,
}

/// Position mapping for one step: `(start, old_size, new_size)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepMap {
    range: Option<(usize, usize, usize)>,
}

impl StepMap {
    pub fn identity() -> Self {
        Self { range: None }
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        let Some((start, old_size, new_size)) = self.range else {
            return pos;
        };
        let end = start + old_size;

        if pos < start || (pos == start && old_size == 0 && assoc == Assoc::Before) {
            return pos;
        }
        if pos > end || (pos == end && old_size > 0) {
            return pos - old_size + new_size;
        }

        match assoc {
            Assoc::Before => start,
            Assoc::After => start + new_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replace(from: usize, to: usize, size: usize) -> StepMap {
        StepMap {
            range: Some((from, to - from, size)),
        }
    }

    #[test]
    fn test_map_insertion() {
        let map = replace(3, 3, 2);
        assert_eq!(map.map(1, Assoc::After), 1);
        assert_eq!(map.map(3, Assoc::Before), 3);
        assert_eq!(map.map(3, Assoc::After), 5);
        assert_eq!(map.map(4, Assoc::After), 6);
    }

    #[test]
    fn test_map_deletion() {
        let map = replace(2, 5, 0);
        assert_eq!(map.map(4, Assoc::After), 2);
        assert_eq!(map.map(5, Assoc::After), 2);
        assert_eq!(map.map(7, Assoc::After), 4);
    }
}
