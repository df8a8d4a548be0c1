//! Option declarations
//!
//! Each extension declares its option keys once through
//! [`OptionSchema::builder`]. The built-in keys shared by every extension
//! are pre-declared as static options.

use super::handlers::EarlyReturn;
use crate::error::{PlumeError, PlumeResult};
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub const PRIORITY: &str = "priority";
pub const EXTRA_ATTRIBUTES: &str = "extraAttributes";
pub const DISABLE_EXTRA_ATTRIBUTES: &str = "disableExtraAttributes";
pub const EXCLUDE: &str = "exclude";
pub const EXTRA_TAGS: &str = "extraTags";

/// Option key partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Set only at construction
    Static,
    /// Settable at any time through `set_options`
    Dynamic,
    /// Prioritized list of handler functions
    Handler,
    /// Registration owned by the extension itself
    CustomHandler,
}

#[derive(Debug, Clone)]
pub struct OptionDeclaration {
    pub kind: OptionKind,
    /// `None` for handler keys and required static keys
    pub default: Option<Value>,
    pub required: bool,
    pub early_return: Option<EarlyReturn>,
}

impl OptionDeclaration {
    fn value(kind: OptionKind, default: Value) -> Self {
        Self {
            kind,
            default: Some(default),
            required: false,
            early_return: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptionSchema {
    declarations: BTreeMap<String, OptionDeclaration>,
}

impl OptionSchema {
    pub fn builder() -> OptionSchemaBuilder {
        let mut declarations = BTreeMap::new();
        declarations.insert(
            PRIORITY.to_string(),
            OptionDeclaration::value(OptionKind::Static, Value::Null),
        );
        declarations.insert(
            EXTRA_ATTRIBUTES.to_string(),
            OptionDeclaration::value(OptionKind::Static, json!({})),
        );
        declarations.insert(
            DISABLE_EXTRA_ATTRIBUTES.to_string(),
            OptionDeclaration::value(OptionKind::Static, json!(false)),
        );
        declarations.insert(
            EXCLUDE.to_string(),
            OptionDeclaration::value(OptionKind::Static, json!({})),
        );
        declarations.insert(
            EXTRA_TAGS.to_string(),
            OptionDeclaration::value(OptionKind::Static, json!([])),
        );

        OptionSchemaBuilder {
            declarations,
            errors: Vec::new(),
        }
    }

    /// Schema with only the built-in keys
    pub fn empty() -> Self {
        Self {
            declarations: OptionSchema::builder().declarations,
        }
    }

    pub fn get(&self, key: &str) -> Option<&OptionDeclaration> {
        self.declarations.get(key)
    }

    pub fn kind(&self, key: &str) -> Option<OptionKind> {
        self.get(key).map(|declaration| declaration.kind)
    }

    pub fn declarations(&self) -> impl Iterator<Item = (&str, &OptionDeclaration)> {
        self.declarations
            .iter()
            .map(|(key, declaration)| (key.as_str(), declaration))
    }

    pub fn keys_of(&self, kind: OptionKind) -> impl Iterator<Item = &str> {
        self.declarations()
            .filter(move |(_, declaration)| declaration.kind == kind)
            .map(|(key, _)| key)
    }
}

/// Builder for [`OptionSchema`]. Declaration errors are collected and
/// reported by [`build`](OptionSchemaBuilder::build).
#[derive(Debug)]
pub struct OptionSchemaBuilder {
    declarations: BTreeMap<String, OptionDeclaration>,
    errors: Vec<String>,
}

impl OptionSchemaBuilder {
    fn declare(mut self, key: &str, declaration: OptionDeclaration) -> Self {
        if self.declarations.contains_key(key) {
            self.errors.push(format!("option '{key}' is declared twice"));
        } else {
            self.declarations.insert(key.to_string(), declaration);
        }
        self
    }

    pub fn static_option(self, key: &str, default: Value) -> Self {
        self.declare(key, OptionDeclaration::value(OptionKind::Static, default))
    }

    /// Static option that must be supplied at construction
    pub fn required_static(self, key: &str) -> Self {
        self.declare(
            key,
            OptionDeclaration {
                kind: OptionKind::Static,
                default: None,
                required: true,
                early_return: None,
            },
        )
    }

    pub fn dynamic(self, key: &str, default: Value) -> Self {
        self.declare(key, OptionDeclaration::value(OptionKind::Dynamic, default))
    }

    pub fn handler(self, key: &str) -> Self {
        self.declare(
            key,
            OptionDeclaration {
                kind: OptionKind::Handler,
                default: None,
                required: false,
                early_return: None,
            },
        )
    }

    pub fn handler_with_early_return(self, key: &str, early_return: EarlyReturn) -> Self {
        self.declare(
            key,
            OptionDeclaration {
                kind: OptionKind::Handler,
                default: None,
                required: false,
                early_return: Some(early_return),
            },
        )
    }

    pub fn custom_handler(self, key: &str) -> Self {
        self.declare(
            key,
            OptionDeclaration {
                kind: OptionKind::CustomHandler,
                default: None,
                required: false,
                early_return: None,
            },
        )
    }

    /// Override the default of an already declared static or dynamic key
    pub fn default(mut self, key: &str, default: Value) -> Self {
        match self.declarations.get_mut(key) {
            Some(declaration)
                if matches!(declaration.kind, OptionKind::Static | OptionKind::Dynamic) =>
            {
                declaration.default = Some(default);
                declaration.required = false;
            }
            Some(_) => self
                .errors
                .push(format!("option '{key}' is a handler and has no default")),
            None => self
                .errors
                .push(format!("cannot set the default of undeclared option '{key}'")),
        }
        self
    }

    pub fn build(self) -> PlumeResult<OptionSchema> {
        if !self.errors.is_empty() {
            return Err(PlumeError::Construction(self.errors.join("; ")));
        }
        Ok(OptionSchema {
            declarations: self.declarations,
        })
    }
}
