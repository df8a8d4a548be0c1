//! # Options
//!
//! Option lifecycle shared by extensions and bundles: declaration
//! ([`OptionSchema`]), state and diffing ([`OptionStore`]) and prioritized
//! handler dispatch ([`HandlerDispatcher`]).

mod handlers;
mod schema;
mod store;

pub use handlers::{Disposer, EarlyReturn, HandlerDispatcher, HandlerFn};
pub use schema::{
    OptionDeclaration, OptionKind, OptionSchema, OptionSchemaBuilder, DISABLE_EXTRA_ATTRIBUTES,
    EXCLUDE, EXTRA_ATTRIBUTES, EXTRA_TAGS, PRIORITY,
};
pub use store::{Change, OptionStore, Options, SetOptionsProps, UpdateReason};
