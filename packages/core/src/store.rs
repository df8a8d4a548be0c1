//! Typed stores shared between the manager and its extensions
//!
//! Both stores are writable only while the manager is in its Create phase.
//! [`ManagerStore`] keys are write-once; [`ExtensionStore`] keys may be
//! overwritten, so extensions can publish and then refine cross-extension
//! bridges during creation.

use crate::error::{PlumeError, PlumeResult};
use crate::schema::DynamicAttributes;
use crate::tags::TagIndex;
use plume_model::{Plugin, Schema};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// Typed store key
pub struct StoreKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> StoreKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for StoreKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StoreKey<T> {}

impl<T> fmt::Debug for StoreKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreKey({})", self.name)
    }
}

pub const SCHEMA: StoreKey<Rc<Schema>> = StoreKey::new("schema");
pub const TAGS: StoreKey<TagIndex> = StoreKey::new("tags");
pub const PLUGINS: StoreKey<Vec<Plugin>> = StoreKey::new("plugins");
pub const DYNAMIC_ATTRIBUTES: StoreKey<Rc<DynamicAttributes>> = StoreKey::new("dynamicAttributes");
pub const VIEW_ATTRIBUTES: StoreKey<BTreeMap<String, String>> = StoreKey::new("viewAttributes");
pub const NODE_NAMES: StoreKey<Vec<String>> = StoreKey::new("nodeNames");
pub const MARK_NAMES: StoreKey<Vec<String>> = StoreKey::new("markNames");
pub const PLAIN_NAMES: StoreKey<Vec<String>> = StoreKey::new("plainNames");

#[derive(Default)]
struct TypedMap {
    entries: BTreeMap<&'static str, Box<dyn Any>>,
}

impl TypedMap {
    fn get<T: 'static>(&self, key: StoreKey<T>) -> Option<&T> {
        self.entries.get(key.name)?.downcast_ref::<T>()
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn insert<T: 'static>(&mut self, key: StoreKey<T>, value: T) {
        self.entries.insert(key.name, Box::new(value));
    }
}

/// Computed manager artifacts
#[derive(Default)]
pub struct ManagerStore {
    map: TypedMap,
    sealed: bool,
}

impl ManagerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: 'static>(&self, key: StoreKey<T>) -> Option<&T> {
        self.map.get(key)
    }

    pub fn set<T: 'static>(&mut self, key: StoreKey<T>, value: T) -> PlumeResult<()> {
        if self.sealed {
            return Err(PlumeError::Phase(format!(
                "manager store key '{}' can only be written during creation",
                key.name
            )));
        }
        if self.map.contains(key.name) {
            return Err(PlumeError::Phase(format!(
                "manager store key '{}' has already been written",
                key.name
            )));
        }
        self.map.insert(key, value);
        Ok(())
    }

    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }
}

impl fmt::Debug for ManagerStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerStore")
            .field("keys", &self.map.entries.keys().collect::<Vec<_>>())
            .field("sealed", &self.sealed)
            .finish()
    }
}

/// Shared context handed to every extension hook
#[derive(Default)]
pub struct ExtensionStore {
    map: TypedMap,
    sealed: bool,
}

impl ExtensionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: 'static>(&self, key: StoreKey<T>) -> Option<&T> {
        self.map.get(key)
    }

    pub fn set<T: 'static>(&mut self, key: StoreKey<T>, value: T) -> PlumeResult<()> {
        if self.sealed {
            return Err(PlumeError::Phase(format!(
                "extension store key '{}' can only be written during creation",
                key.name
            )));
        }
        self.map.insert(key, value);
        Ok(())
    }

    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }
}

impl fmt::Debug for ExtensionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionStore")
            .field("keys", &self.map.entries.keys().collect::<Vec<_>>())
            .field("sealed", &self.sealed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNT: StoreKey<u32> = StoreKey::new("count");

    #[test]
    fn test_manager_store_is_write_once() {
        let mut store = ManagerStore::new();
        store.set(COUNT, 1).unwrap();
        assert!(matches!(store.set(COUNT, 2), Err(PlumeError::Phase(_))));
        assert_eq!(store.get(COUNT), Some(&1));
    }

    #[test]
    fn test_extension_store_overwrites_until_sealed() {
        let mut store = ExtensionStore::new();
        store.set(COUNT, 1).unwrap();
        store.set(COUNT, 2).unwrap();
        store.seal();

        assert!(matches!(store.set(COUNT, 3), Err(PlumeError::Phase(_))));
        assert_eq!(store.get(COUNT), Some(&2));
    }

    #[test]
    fn test_sealed_manager_store_rejects_new_keys() {
        let mut store = ManagerStore::new();
        store.seal();
        assert!(store.set(NODE_NAMES, vec![]).is_err());
        assert!(store.get(NODE_NAMES).is_none());
    }
}
