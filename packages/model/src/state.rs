//! # Editor State
//!
//! Immutable snapshot of document, selection and plugins. Applying a
//! transaction runs plugin filters, then plugin append hooks, and yields a
//! new state.
//!
//! ```text
//! state.tr() ──► Transaction ──► apply_transaction
//!                                   │
//!                                   ├─ stale? ──────────► Err(StaleTransaction)
//!                                   ├─ filter rejects? ─► Ok(None)
//!                                   └─ append hooks ────► Ok(Some(AppliedTransaction))
//! ```

use crate::error::{ModelError, ModelResult};
use crate::node::Node;
use crate::schema::Schema;
use crate::transaction::{Selection, Transaction};
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Returns `false` to reject a transaction
pub type FilterTransaction = Rc<dyn Fn(&Transaction, &EditorState) -> bool>;

/// Adds steps to an outgoing transaction before it is applied
pub type AppendTransaction = Rc<dyn Fn(&mut Transaction, &EditorState) -> ModelResult<()>>;

/// State plugin
#[derive(Clone)]
pub struct Plugin {
    key: String,
    filter: Option<FilterTransaction>,
    append: Option<AppendTransaction>,
}

impl Plugin {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            filter: None,
            append: None,
        }
    }

    pub fn with_filter(mut self, filter: FilterTransaction) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_append(mut self, append: AppendTransaction) -> Self {
        self.append = Some(append);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("key", &self.key)
            .field("filter", &self.filter.is_some())
            .field("append", &self.append.is_some())
            .finish()
    }
}

/// Input to [`EditorState::create`]
#[derive(Debug, Clone)]
pub struct StateConfig {
    pub schema: Rc<Schema>,
    /// Defaults to an empty top node
    pub doc: Option<Node>,
    pub selection: Option<Selection>,
    pub plugins: Vec<Plugin>,
}

impl StateConfig {
    pub fn new(schema: Rc<Schema>) -> Self {
        Self {
            schema,
            doc: None,
            selection: None,
            plugins: Vec::new(),
        }
    }

    pub fn with_doc(mut self, doc: Node) -> Self {
        self.doc = Some(doc);
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn with_plugins(mut self, plugins: Vec<Plugin>) -> Self {
        self.plugins = plugins;
        self
    }
}

#[derive(Debug, Clone)]
pub struct EditorState {
    schema: Rc<Schema>,
    doc: Node,
    selection: Selection,
    version: u64,
    plugins: Rc<Vec<Plugin>>,
}

/// Result of applying a transaction
#[derive(Debug)]
pub struct AppliedTransaction {
    pub state: EditorState,
    /// The transaction as applied, including appended steps
    pub transaction: Transaction,
}

impl EditorState {
    pub fn create(config: StateConfig) -> ModelResult<Self> {
        let doc = match config.doc {
            Some(doc) => doc,
            None => config
                .schema
                .node(config.schema.top_node_type(), None, Vec::new())?,
        };

        let size = doc.content_size();
        let selection = config.selection.unwrap_or_default();
        if selection.to() > size {
            return Err(ModelError::PositionOutOfRange {
                pos: selection.to(),
                size,
            });
        }

        Ok(Self {
            schema: config.schema,
            doc,
            selection,
            version: 0,
            plugins: Rc::new(config.plugins),
        })
    }

    pub fn schema(&self) -> &Rc<Schema> {
        &self.schema
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Incremented each time a transaction changes the document
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    /// Start a transaction against this state
    pub fn tr(&self) -> Transaction {
        Transaction::new(self)
    }

    pub fn apply_transaction(&self, mut tr: Transaction) -> ModelResult<Option<AppliedTransaction>> {
        if tr.start_version() != self.version {
            return Err(ModelError::StaleTransaction {
                expected: tr.start_version(),
                actual: self.version,
            });
        }

        for plugin in self.plugins.iter() {
            if let Some(filter) = &plugin.filter {
                if !filter(&tr, self) {
                    debug!(plugin = %plugin.key, "Transaction rejected by filter");
                    return Ok(None);
                }
            }
        }

        for plugin in self.plugins.iter() {
            if let Some(append) = &plugin.append {
                append(&mut tr, self)?;
            }
        }

        let state = Self {
            schema: self.schema.clone(),
            doc: tr.doc().clone(),
            selection: tr.selection(),
            version: if tr.doc_changed() {
                self.version + 1
            } else {
                self.version
            },
            plugins: self.plugins.clone(),
        };

        Ok(Some(AppliedTransaction {
            state,
            transaction: tr,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{NodeSpec, SchemaSpec};
    use serde_json::json;

    fn schema() -> Rc<Schema> {
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
                ..Default::default()
            },
        );
        Rc::new(Schema::new(spec).unwrap())
    }

    fn paragraph(schema: &Schema) -> Node {
        schema.node("paragraph", None, vec![]).unwrap()
    }

    #[test]
    fn test_apply_increments_version_on_doc_change() {
        let schema = schema();
        let state = EditorState::create(StateConfig::new(schema.clone())).unwrap();

        let mut tr = state.tr();
        tr.insert(0, vec![paragraph(&schema)]).unwrap();
        let applied = state.apply_transaction(tr).unwrap().unwrap();
        assert_eq!(applied.state.version(), 1);
        assert_eq!(applied.state.doc().content.len(), 1);

        let mut tr = applied.state.tr();
        tr.set_meta("noop", json!(true));
        let next = applied.state.apply_transaction(tr).unwrap().unwrap();
        assert_eq!(next.state.version(), 1);
    }

    #[test]
    fn test_stale_transaction_rejected() {
        let schema = schema();
        let state = EditorState::create(StateConfig::new(schema.clone())).unwrap();

        let stale = state.tr();
        let mut tr = state.tr();
        tr.insert(0, vec![paragraph(&schema)]).unwrap();
        let next = state.apply_transaction(tr).unwrap().unwrap().state;

        assert!(matches!(
            next.apply_transaction(stale),
            Err(ModelError::StaleTransaction { expected: 0, actual: 1 })
        ));
    }

    #[test]
    fn test_filter_and_append() {
        let schema = schema();
        let append_schema = schema.clone();
        let plugins = vec![
            Plugin::new("reject-meta").with_filter(Rc::new(|tr: &Transaction, _: &EditorState| {
                tr.get_meta("reject").is_none()
            })),
            Plugin::new("append").with_append(Rc::new(move |tr: &mut Transaction, _: &EditorState| {
                if tr.doc_changed() {
                    let end = tr.doc().content_size();
                    tr.insert(end, vec![append_schema.node("paragraph", None, vec![])?])?;
                }
                Ok(())
            })),
        ];
        let state = EditorState::create(StateConfig::new(schema.clone()).with_plugins(plugins)).unwrap();

        let mut rejected = state.tr();
        rejected.set_meta("reject", json!(true));
        assert!(state.apply_transaction(rejected).unwrap().is_none());

        let mut tr = state.tr();
        tr.insert(0, vec![paragraph(&schema)]).unwrap();
        let applied = state.apply_transaction(tr).unwrap().unwrap();
        assert_eq!(applied.state.doc().content.len(), 2);
        assert_eq!(applied.transaction.steps().len(), 2);
    }
}
