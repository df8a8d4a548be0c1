//! # Plume Model
//!
//! Minimal document engine used by the Plume extension manager.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ schema: node / mark specs → Schema          │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ node: Node / Mark trees, positions          │
//! │ step: Replace / AddMark / RemoveMark / Attr │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ transaction: steps against one version      │
//! │ state: EditorState + plugins                │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Positions
//!
//! Positions count tokens inside the top node's content: each character of
//! text is one token, a leaf node is one token, and every other node adds
//! one token for its opening and one for its closing boundary.
//!
//! ## Limits
//!
//! This is not a general-purpose editing engine. Content expressions are
//! recorded but never validated, replace steps cannot cross node
//! boundaries, and the DOM is a flat element description used only for
//! attribute parsing and serialization.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use plume_model::{EditorState, StateConfig};
//!
//! let state = EditorState::create(StateConfig::new(schema))?;
//! let mut tr = state.tr();
//! tr.insert(0, vec![paragraph])?;
//! let applied = state.apply_transaction(tr)?.expect("no filters");
//! ```

mod dom;
mod error;
mod node;
mod schema;
mod state;
mod step;
mod transaction;

pub use dom::DomElement;
pub use error::{ModelError, ModelResult};
pub use node::{Attrs, Mark, Node};
pub use schema::{
    AttributeSpec, GetAttrs, MarkSpec, NodeSpec, ParseRule, ParsedElement, Schema, SchemaSpec,
    ToDom,
};
pub use state::{
    AppendTransaction, AppliedTransaction, EditorState, FilterTransaction, Plugin, StateConfig,
};
pub use step::{Assoc, Step, StepMap};
pub use transaction::{Selection, Transaction, TransactionId};

// Re-export the attribute value type for convenience
pub use serde_json::Value;
