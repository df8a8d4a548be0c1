//! # View
//!
//! The manager talks to the UI layer through the [`View`] trait.
//! [`HeadlessView`] keeps state and props in memory and is what the tests
//! and non-UI hosts attach.

use crate::extension::Extension;
use plume_model::{DomElement, EditorState, Node, Transaction, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Renders a node in place of its schema `to_dom`
pub type NodeViewFn = Rc<dyn Fn(&Node) -> DomElement>;

pub type NodeViews = BTreeMap<String, NodeViewFn>;

/// Contributes custom node renderers keyed by node name
pub trait NodeViewsProvider {
    fn create_node_views(&self) -> NodeViews;
}

/// Node views of every provider in resolved order; the first view
/// registered for a node name wins
pub fn collect_node_views(extensions: &[Box<dyn Extension>], exclude_all: bool) -> NodeViews {
    let mut views = NodeViews::new();
    if exclude_all {
        return views;
    }

    for extension in extensions {
        let Some(provider) = extension.as_node_views() else {
            continue;
        };
        if extension.options().exclude().node_views {
            debug!(extension = extension.name(), "Node views excluded");
            continue;
        }
        for (name, render) in provider.create_node_views() {
            views.entry(name).or_insert(render);
        }
    }

    views
}

/// View props that cannot be derived from document content
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdatableViewProps {
    Attributes,
    Editable,
    NodeViews,
}

/// Transaction meta key carrying the props to recompute
pub const FORCE_UPDATE_META: &str = "plume:forceUpdate";

/// Ask the manager to recompute `props` after `tr` is dispatched
pub fn force_update(tr: &mut Transaction, props: &[UpdatableViewProps]) {
    let mut requested = forced_updates(tr);
    for prop in props {
        if !requested.contains(prop) {
            requested.push(*prop);
        }
    }
    let value = serde_json::to_value(&requested).unwrap_or(Value::Null);
    tr.set_meta(FORCE_UPDATE_META, value);
}

/// Props requested through [`force_update`]
pub fn forced_updates(tr: &Transaction) -> Vec<UpdatableViewProps> {
    tr.get_meta(FORCE_UPDATE_META)
        .and_then(|value| serde_json::from_value(value.clone()).ok())
        .unwrap_or_default()
}

#[derive(Clone, Default)]
pub struct ViewProps {
    pub attributes: BTreeMap<String, String>,
    pub editable: bool,
    pub node_views: NodeViews,
}

impl fmt::Debug for ViewProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewProps")
            .field("attributes", &self.attributes)
            .field("editable", &self.editable)
            .field("node_views", &self.node_views.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Partial props update; `None` leaves a prop untouched
#[derive(Clone, Default)]
pub struct ViewPropsUpdate {
    pub attributes: Option<BTreeMap<String, String>>,
    pub editable: Option<bool>,
    pub node_views: Option<NodeViews>,
}

impl ViewPropsUpdate {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_none() && self.editable.is_none() && self.node_views.is_none()
    }
}

impl fmt::Debug for ViewPropsUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewPropsUpdate")
            .field("attributes", &self.attributes)
            .field("editable", &self.editable)
            .field(
                "node_views",
                &self.node_views.as_ref().map(|views| views.keys().collect::<Vec<_>>()),
            )
            .finish()
    }
}

pub trait View {
    fn state(&self) -> &EditorState;

    fn update_state(&mut self, state: EditorState);

    fn focus(&mut self);

    fn has_focus(&self) -> bool;

    fn set_props(&mut self, update: ViewPropsUpdate);

    fn props(&self) -> &ViewProps;

    fn destroy(&mut self);
}

/// In-memory view
#[derive(Debug)]
pub struct HeadlessView {
    state: EditorState,
    props: ViewProps,
    focused: bool,
    destroyed: bool,
    prop_updates: usize,
}

impl HeadlessView {
    pub fn new(state: EditorState) -> Self {
        Self {
            state,
            props: ViewProps {
                editable: true,
                ..ViewProps::default()
            },
            focused: false,
            destroyed: false,
            prop_updates: 0,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Number of `set_props` calls received
    pub fn prop_updates(&self) -> usize {
        self.prop_updates
    }

    /// Render a node through its node view, if one is registered
    pub fn render_node(&self, node: &Node) -> Option<DomElement> {
        let render = self.props.node_views.get(&node.type_name)?;
        Some(render(node))
    }
}

impl View for HeadlessView {
    fn state(&self) -> &EditorState {
        &self.state
    }

    fn update_state(&mut self, state: EditorState) {
        self.state = state;
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn set_props(&mut self, update: ViewPropsUpdate) {
        self.prop_updates += 1;
        if let Some(attributes) = update.attributes {
            self.props.attributes = attributes;
        }
        if let Some(editable) = update.editable {
            self.props.editable = editable;
        }
        if let Some(node_views) = update.node_views {
            self.props.node_views = node_views;
        }
    }

    fn props(&self) -> &ViewProps {
        &self.props
    }

    fn destroy(&mut self) {
        self.destroyed = true;
        self.focused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plume_model::{NodeSpec, Schema, SchemaSpec, StateConfig};

    fn state() -> EditorState {
        let mut spec = SchemaSpec::default();
        spec.nodes.insert(
            "doc".to_string(),
            NodeSpec {
                content: Some("text*".to_string()),
                ..Default::default()
            },
        );
        spec.nodes.insert("text".to_string(), NodeSpec::default());
        EditorState::create(StateConfig::new(Rc::new(Schema::new(spec).unwrap()))).unwrap()
    }

    #[test]
    fn test_force_update_accumulates() {
        let state = state();
        let mut tr = state.tr();
        force_update(&mut tr, &[UpdatableViewProps::Attributes]);
        force_update(&mut tr, &[UpdatableViewProps::Editable, UpdatableViewProps::Attributes]);

        assert_eq!(
            forced_updates(&tr),
            vec![UpdatableViewProps::Attributes, UpdatableViewProps::Editable]
        );
        assert!(forced_updates(&state.tr()).is_empty());
    }

    #[test]
    fn test_headless_props_update() {
        let mut view = HeadlessView::new(state());
        view.set_props(ViewPropsUpdate {
            editable: Some(false),
            ..Default::default()
        });

        assert!(!view.props().editable);
        assert!(view.props().attributes.is_empty());
        assert_eq!(view.prop_updates(), 1);
    }
}
