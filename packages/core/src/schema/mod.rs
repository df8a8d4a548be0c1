//! # Schema Attributes
//!
//! Builds node and mark specs from extensions, merging in attributes
//! injected by other extensions, by the settings and by each extension's
//! `extraAttributes` option.
//!
//! ```text
//! SchemaAttributesProvider groups ─┐
//! settings.extra_attributes ───────┼─► resolve identifiers ─► merge per name
//!                                  │                              │
//! extension extraAttributes ───────┴──────────────────────────────┤
//!                                                                 ▼
//!                         ApplySchemaAttributes ─► create_node_spec / create_mark_spec
//!                                                                 │
//!                                    Schema + DynamicAttributes ◄─┘
//! ```

mod apply;
mod dynamic;
mod identifiers;
mod merger;

pub use apply::{
    ApplySchemaAttributes, AttributeDefault, AttributeTarget, DomValue, DynamicDefault, ParseAttribute,
    ParseFn, SchemaAttribute, SchemaAttributes, SerializeAttribute, SerializeFn,
};
pub use dynamic::{DynamicAttributes, BACKFILL_PLUGIN_KEY};
pub use identifiers::{IdentifierSchemaAttributes, Identifiers, TagsFilter};
pub use merger::{build_schema, SchemaBuild};

use plume_model::{MarkSpec, NodeSpec};

/// Implemented by extensions that define a node type
pub trait NodeExtension {
    /// Must call `extra.defaults()` and should merge the result into the
    /// spec's attributes
    fn create_node_spec(&self, extra: &ApplySchemaAttributes) -> NodeSpec;
}

/// Implemented by extensions that define a mark type
pub trait MarkExtension {
    fn create_mark_spec(&self, extra: &ApplySchemaAttributes) -> MarkSpec;
}

/// Injects attributes into other extensions' node and mark types
pub trait SchemaAttributesProvider {
    fn create_schema_attributes(&self) -> Vec<IdentifierSchemaAttributes>;
}
