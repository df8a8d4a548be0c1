use crate::error::{PlumeError, PlumeResult};
use std::collections::BTreeMap;
use std::fmt;

/// Name → entry table shared by commands and helpers
pub(crate) struct Registry<T> {
    kind: &'static str,
    reserved: &'static [&'static str],
    entries: BTreeMap<String, Registered<T>>,
}

struct Registered<T> {
    owner: String,
    value: T,
}

impl<T> Registry<T> {
    pub(crate) fn new(kind: &'static str, reserved: &'static [&'static str]) -> Self {
        Self {
            kind,
            reserved,
            entries: BTreeMap::new(),
        }
    }

    pub(crate) fn register(&mut self, owner: &str, name: String, value: T) -> PlumeResult<()> {
        if self.reserved.contains(&name.as_str()) {
            return Err(PlumeError::ReservedName { kind: self.kind, name });
        }
        if let Some(existing) = self.entries.get(&name) {
            return Err(PlumeError::DuplicateName {
                kind: self.kind,
                name,
                first: existing.owner.clone(),
                second: owner.to_string(),
            });
        }
        self.entries.insert(
            name,
            Registered {
                owner: owner.to_string(),
                value,
            },
        );
        Ok(())
    }

    pub(crate) fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name).map(|entry| &entry.value)
    }

    /// Extension that registered `name`
    pub(crate) fn owner(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|entry| entry.owner.as_str())
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_and_reserved_names() {
        let mut registry: Registry<u8> = Registry::new("command", &["run", "chain"]);
        registry.register("bold", "toggleBold".to_string(), 1).unwrap();

        let err = registry.register("strong", "toggleBold".to_string(), 2).unwrap_err();
        assert!(matches!(
            err,
            PlumeError::DuplicateName { kind: "command", ref first, ref second, .. }
                if first == "bold" && second == "strong"
        ));

        assert!(matches!(
            registry.register("bold", "chain".to_string(), 3),
            Err(PlumeError::ReservedName { kind: "command", .. })
        ));

        assert_eq!(registry.get("toggleBold"), Some(&1));
        assert_eq!(registry.owner("toggleBold"), Some("bold"));
        assert_eq!(registry.len(), 1);
    }
}
