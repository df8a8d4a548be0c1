//! Extra schema attributes and the helper handed to node/mark spec builders

use crate::error::{PlumeError, PlumeResult};
use plume_model::{AttributeSpec, Attrs, DomElement, Mark, Node};
use serde_json::Value;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// What a dynamic default is computed for
#[derive(Debug, Clone, Copy)]
pub enum AttributeTarget<'a> {
    Node(&'a Node),
    Mark(&'a Mark),
}

/// Computes an attribute value when a node or mark is first seen without one
pub type DynamicDefault = Rc<dyn Fn(AttributeTarget<'_>) -> Value>;

pub type ParseFn = Rc<dyn Fn(&DomElement) -> Option<Value>>;

pub type SerializeFn = Rc<dyn Fn(&Attrs) -> Option<DomValue>>;

#[derive(Clone)]
pub enum AttributeDefault {
    /// No default, the attribute must be supplied
    Required,
    Value(Value),
    /// Stored as `null` in the schema and backfilled after each change
    Dynamic(DynamicDefault),
}

/// How an attribute is read from a DOM element
#[derive(Clone)]
pub enum ParseAttribute {
    /// Read this DOM attribute instead of the attribute's own name
    Named(String),
    Custom(ParseFn),
}

/// Serialized DOM attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomValue {
    /// Written under the attribute's own name
    Literal(String),
    /// Written under `key`; `None` uses the attribute's value
    Pair(String, Option<String>),
}

#[derive(Clone)]
pub enum SerializeAttribute {
    Static(DomValue),
    Custom(SerializeFn),
}

/// One extra attribute
#[derive(Clone)]
pub struct SchemaAttribute {
    pub default: AttributeDefault,
    pub parse_dom: Option<ParseAttribute>,
    pub to_dom: Option<SerializeAttribute>,
}

pub type SchemaAttributes = BTreeMap<String, SchemaAttribute>;

impl SchemaAttribute {
    fn with(default: AttributeDefault) -> Self {
        Self {
            default,
            parse_dom: None,
            to_dom: None,
        }
    }

    pub fn value(default: Value) -> Self {
        Self::with(AttributeDefault::Value(default))
    }

    pub fn required() -> Self {
        Self::with(AttributeDefault::Required)
    }

    pub fn dynamic(create: impl Fn(AttributeTarget<'_>) -> Value + 'static) -> Self {
        Self::with(AttributeDefault::Dynamic(Rc::new(create)))
    }

    pub fn parse_dom_attribute(mut self, name: impl Into<String>) -> Self {
        self.parse_dom = Some(ParseAttribute::Named(name.into()));
        self
    }

    pub fn parse_with(mut self, parse: impl Fn(&DomElement) -> Option<Value> + 'static) -> Self {
        self.parse_dom = Some(ParseAttribute::Custom(Rc::new(parse)));
        self
    }

    pub fn to_dom(mut self, value: DomValue) -> Self {
        self.to_dom = Some(SerializeAttribute::Static(value));
        self
    }

    pub fn to_dom_with(mut self, serialize: impl Fn(&Attrs) -> Option<DomValue> + 'static) -> Self {
        self.to_dom = Some(SerializeAttribute::Custom(Rc::new(serialize)));
        self
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.default, AttributeDefault::Dynamic(_))
    }

    /// Read the JSON form used by the `extraAttributes` option.
    ///
    /// A plain value is the default. An object with a `default` key may
    /// also carry `parseDOM` (attribute name) and `toDOM` (literal string
    /// or `[key, value]` pair). An object without `default` describes a
    /// required attribute only when it has `required: true`; any other
    /// object is itself the default.
    pub fn from_json(name: &str, value: &Value) -> PlumeResult<Self> {
        let Some(object) = value.as_object() else {
            return Ok(Self::value(value.clone()));
        };

        let described = object.contains_key("default")
            || object.get("required").and_then(Value::as_bool) == Some(true);
        if !described {
            return Ok(Self::value(value.clone()));
        }

        let mut attribute = match object.get("default") {
            Some(default) => Self::value(default.clone()),
            None => Self::required(),
        };

        match object.get("parseDOM") {
            None => {}
            Some(Value::String(dom_name)) => attribute = attribute.parse_dom_attribute(dom_name),
            Some(_) => {
                return Err(PlumeError::Construction(format!(
                    "extra attribute '{name}': parseDOM must be an attribute name"
                )))
            }
        }

        match object.get("toDOM") {
            None => {}
            Some(Value::String(literal)) => attribute = attribute.to_dom(DomValue::Literal(literal.clone())),
            Some(Value::Array(pair)) => {
                let key = pair.first().and_then(Value::as_str);
                let value = pair.get(1).and_then(Value::as_str).map(str::to_string);
                match key {
                    Some(key) if pair.len() <= 2 => {
                        attribute = attribute.to_dom(DomValue::Pair(key.to_string(), value))
                    }
                    _ => {
                        return Err(PlumeError::Construction(format!(
                            "extra attribute '{name}': toDOM pair must be [key, value?]"
                        )))
                    }
                }
            }
            Some(_) => {
                return Err(PlumeError::Construction(format!(
                    "extra attribute '{name}': toDOM must be a string or a [key, value] pair"
                )))
            }
        }

        Ok(attribute)
    }
}

impl fmt::Debug for SchemaAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let default = match &self.default {
            AttributeDefault::Required => "required".to_string(),
            AttributeDefault::Value(value) => value.to_string(),
            AttributeDefault::Dynamic(_) => "dynamic".to_string(),
        };
        f.debug_struct("SchemaAttribute")
            .field("default", &default)
            .field("parse_dom", &self.parse_dom.is_some())
            .field("to_dom", &self.to_dom.is_some())
            .finish()
    }
}

/// Extra attributes for one node or mark type.
///
/// Node and mark extensions must call [`defaults`](Self::defaults) while
/// building their spec and should route DOM parsing and serialization
/// through [`parse`](Self::parse) and [`dom`](Self::dom). Cloning is cheap,
/// so it can be moved into parse rules and `to_dom` closures.
#[derive(Clone)]
pub struct ApplySchemaAttributes {
    inner: Rc<ApplyInner>,
}

struct ApplyInner {
    attributes: SchemaAttributes,
    defaults_called: Cell<bool>,
}

impl ApplySchemaAttributes {
    pub fn new(attributes: SchemaAttributes) -> Self {
        Self {
            inner: Rc::new(ApplyInner {
                attributes,
                defaults_called: Cell::new(false),
            }),
        }
    }

    pub fn attributes(&self) -> &SchemaAttributes {
        &self.inner.attributes
    }

    /// Schema-level attribute specs. Dynamic attributes default to `null`.
    pub fn defaults(&self) -> BTreeMap<String, AttributeSpec> {
        self.inner.defaults_called.set(true);
        self.inner
            .attributes
            .iter()
            .map(|(name, attribute)| {
                let spec = match &attribute.default {
                    AttributeDefault::Required => AttributeSpec::required(),
                    AttributeDefault::Value(value) => AttributeSpec::with_default(value.clone()),
                    AttributeDefault::Dynamic(_) => AttributeSpec::with_default(Value::Null),
                };
                (name.clone(), spec)
            })
            .collect()
    }

    /// Read extra attributes from a DOM element
    pub fn parse(&self, element: &DomElement) -> Attrs {
        let mut attrs = Attrs::new();
        for (name, attribute) in &self.inner.attributes {
            let parsed = match &attribute.parse_dom {
                Some(ParseAttribute::Custom(parse)) => parse(element),
                Some(ParseAttribute::Named(dom_name)) => element
                    .get_attribute(dom_name)
                    .map(|value| Value::String(value.to_string())),
                None => element
                    .get_attribute(name)
                    .map(|value| Value::String(value.to_string())),
            };

            let value = match (parsed, &attribute.default) {
                (Some(value), _) => value,
                (None, AttributeDefault::Value(default)) => default.clone(),
                (None, AttributeDefault::Dynamic(_)) => Value::Null,
                (None, AttributeDefault::Required) => continue,
            };
            attrs.insert(name.clone(), value);
        }
        attrs
    }

    /// Serialize extra attributes to DOM attributes. Unset values are
    /// skipped.
    pub fn dom(&self, attrs: &Attrs) -> BTreeMap<String, String> {
        let mut dom = BTreeMap::new();
        for (name, attribute) in &self.inner.attributes {
            let Some(value) = attrs.get(name).filter(|value| !value.is_null()) else {
                continue;
            };

            let serialized = match &attribute.to_dom {
                Some(SerializeAttribute::Static(dom_value)) => Some(dom_value.clone()),
                Some(SerializeAttribute::Custom(serialize)) => serialize(attrs),
                None => {
                    let key = match &attribute.parse_dom {
                        Some(ParseAttribute::Named(dom_name)) => dom_name.clone(),
                        _ => name.clone(),
                    };
                    Some(DomValue::Pair(key, None))
                }
            };

            match serialized {
                Some(DomValue::Literal(literal)) => {
                    dom.insert(name.clone(), literal);
                }
                Some(DomValue::Pair(key, explicit)) => {
                    dom.insert(key, explicit.unwrap_or_else(|| value_to_string(value)));
                }
                None => {}
            }
        }
        dom
    }

    pub(crate) fn defaults_called(&self) -> bool {
        self.inner.defaults_called.get()
    }

    pub(crate) fn dynamic_defaults(&self) -> impl Iterator<Item = (&str, &DynamicDefault)> {
        self.inner
            .attributes
            .iter()
            .filter_map(|(name, attribute)| match &attribute.default {
                AttributeDefault::Dynamic(create) => Some((name.as_str(), create)),
                _ => None,
            })
    }
}

impl fmt::Debug for ApplySchemaAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplySchemaAttributes")
            .field("attributes", &self.inner.attributes)
            .field("defaults_called", &self.inner.defaults_called.get())
            .finish()
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
