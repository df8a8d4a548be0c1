//! Prioritized handler lists
//!
//! Every handler option owns one list. Handlers are kept sorted by
//! descending priority (stable for equal priorities) and are combined into
//! a single [`HandlerDispatcher`] call.

use crate::priority::Priority;
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

pub type HandlerFn = Rc<dyn Fn(&[Value]) -> Value>;

/// Stops handler dispatch once a handler returns a matching value
#[derive(Clone)]
pub enum EarlyReturn {
    Value(Value),
    Predicate(Rc<dyn Fn(&Value) -> bool>),
}

impl EarlyReturn {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            EarlyReturn::Value(expected) => expected == value,
            EarlyReturn::Predicate(predicate) => predicate(value),
        }
    }
}

impl fmt::Debug for EarlyReturn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EarlyReturn::Value(value) => f.debug_tuple("Value").field(value).finish(),
            EarlyReturn::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Undoes one registration. Dropping it without calling
/// [`dispose`](Disposer::dispose) keeps the registration alive.
#[must_use = "a Disposer is the only way to undo the registration"]
pub struct Disposer(Option<Box<dyn FnOnce()>>);

impl Disposer {
    pub fn new(dispose: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(dispose)))
    }

    pub fn noop() -> Self {
        Self(None)
    }

    pub fn dispose(mut self) {
        if let Some(dispose) = self.0.take() {
            dispose();
        }
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Disposer")
            .field(&if self.0.is_some() { "pending" } else { "noop" })
            .finish()
    }
}

struct HandlerEntry {
    id: u64,
    priority: Priority,
    handler: HandlerFn,
}

#[derive(Default)]
struct HandlerList {
    next_id: u64,
    entries: Vec<HandlerEntry>,
}

/// Combined handler for one option key
#[derive(Clone)]
pub struct HandlerDispatcher {
    key: String,
    list: Rc<RefCell<HandlerList>>,
    early_return: Option<EarlyReturn>,
}

impl HandlerDispatcher {
    pub(crate) fn new(key: impl Into<String>, early_return: Option<EarlyReturn>) -> Self {
        Self {
            key: key.into(),
            list: Rc::new(RefCell::new(HandlerList::default())),
            early_return,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.list.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a handler after every entry with the same or higher priority
    pub fn add(&self, handler: HandlerFn, priority: Priority) -> Disposer {
        let id = {
            let mut list = self.list.borrow_mut();
            let id = list.next_id;
            list.next_id += 1;

            let index = list
                .entries
                .iter()
                .position(|entry| entry.priority < priority)
                .unwrap_or(list.entries.len());
            list.entries.insert(
                index,
                HandlerEntry {
                    id,
                    priority,
                    handler,
                },
            );
            id
        };

        let list: Weak<RefCell<HandlerList>> = Rc::downgrade(&self.list);
        Disposer::new(move || {
            if let Some(list) = list.upgrade() {
                list.borrow_mut().entries.retain(|entry| entry.id != id);
            }
        })
    }

    /// Call handlers in priority order.
    ///
    /// Returns the first value matching the early-return rule, otherwise the
    /// last handler's value (`null` when there are no handlers). Handlers
    /// may register or dispose handlers while being called; those changes
    /// apply to the next call.
    pub fn call(&self, args: &[Value]) -> Value {
        let snapshot: Vec<HandlerFn> = self
            .list
            .borrow()
            .entries
            .iter()
            .map(|entry| entry.handler.clone())
            .collect();

        let mut value = Value::Null;
        for handler in snapshot {
            value = handler(args);
            if self
                .early_return
                .as_ref()
                .is_some_and(|rule| rule.matches(&value))
            {
                break;
            }
        }
        value
    }
}

impl fmt::Debug for HandlerDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDispatcher")
            .field("key", &self.key)
            .field("handlers", &self.len())
            .field("early_return", &self.early_return)
            .finish()
    }
}
