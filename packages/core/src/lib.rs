//! # Plume Core
//!
//! Composes independently written editor extensions into one schema-driven
//! editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ resolver: extensions + bundles → sorted, unique list │
//! └──────────────────────────────────────────────────────┘
//!                          ↓
//! ┌──────────────────────────────────────────────────────┐
//! │ manager (Create): tags, schema + extra attributes,   │
//! │ plugins, view attributes, on_create hooks            │
//! └──────────────────────────────────────────────────────┘
//!                          ↓
//! ┌──────────────────────────────────────────────────────┐
//! │ manager (EditorView): commands, helpers, on_view     │
//! └──────────────────────────────────────────────────────┘
//!                          ↓
//! ┌──────────────────────────────────────────────────────┐
//! │ manager (Runtime): commands / chains → transactions, │
//! │ on_state_update hooks                                │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use plume_core::{Combined, HeadlessView, Manager, ManagerSettings};
//!
//! let mut manager = Manager::create(
//!     vec![Combined::extension(DocExtension::new()?), Combined::extension(TextExtension::new()?)],
//!     ManagerSettings::default(),
//! )?;
//! let state = manager.create_state(None)?;
//! manager.attach_view(Box::new(HeadlessView::new(state)))?;
//! manager.chain()?.then("insertText", &[json!("hi")]).run()?;
//! ```

mod attributes;
mod bundle;
mod capabilities;
mod commands;
mod error;
mod extension;
mod helpers;
mod lifecycle;
mod manager;
mod plugins;
mod priority;
mod resolver;
mod settings;
mod tags;
mod view;

pub mod options;
pub mod schema;
pub mod store;

pub use attributes::{merge_attributes, AttributesProvider, EditorAttributes};
pub use bundle::{Bundle, BundleEntry, BundleMembers};
pub use capabilities::CapabilityIndex;
pub use commands::{
    Chain, CommandFn, CommandProps, CommandSpec, Commands, CommandsProvider, DispatchMode,
    RESERVED_COMMAND_NAMES,
};
pub use error::{CommandError, MissingRequirement, PlumeError, PlumeResult};
pub use extension::{
    AsAny, Extension, ExtensionBase, ExtensionId, ExtensionKey, ExtensionKind, ExtensionType,
};
pub use helpers::{HelperFn, HelperSpec, Helpers, HelpersProvider};
pub use lifecycle::{CreateContext, ManagerPhase, StateUpdateProps, ViewContext};
pub use manager::Manager;
pub use plugins::{collect_plugins, PluginProvider};
pub use priority::Priority;
pub use resolver::{resolve, Combined, ResolvedConfiguration};
pub use schema::{MarkExtension, NodeExtension, SchemaAttributesProvider};
pub use settings::{Exclude, ManagerSettings, SettingsConfig};
pub use tags::TagIndex;
pub use view::{
    collect_node_views, force_update, forced_updates, HeadlessView, NodeViewFn, NodeViews,
    NodeViewsProvider, UpdatableViewProps, View, ViewProps, ViewPropsUpdate, FORCE_UPDATE_META,
};

// Re-export the document model for extension authors
pub use plume_model;
