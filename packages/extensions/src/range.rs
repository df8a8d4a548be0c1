use plume_model::{Mark, Node};

/// Whether every text node overlapping `from..to` carries a mark named
/// `mark`. An empty range checks the marks at `from`.
pub fn mark_in_range(doc: &Node, from: usize, to: usize, mark: &str) -> bool {
    if from == to {
        return marks_at(doc, from).iter().any(|existing| existing.type_name == mark);
    }

    let mut seen = false;
    let mut all = true;
    doc.descendants(|node, pos| {
        if node.is_text() && pos < to && pos + node.node_size() > from {
            seen = true;
            all &= node.marks.iter().any(|existing| existing.type_name == mark);
        }
        all
    });
    seen && all
}

/// Marks of the text ending at or containing `pos`
pub fn marks_at(doc: &Node, pos: usize) -> Vec<Mark> {
    let mut marks = Vec::new();
    doc.descendants(|node, start| {
        if node.is_text() && start < pos && pos <= start + node.node_size() {
            marks = node.marks.clone();
        }
        true
    });
    marks
}
