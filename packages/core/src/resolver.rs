//! # Composition
//!
//! Flattens extensions and bundles into one priority-ordered list in which
//! every extension type and every name appears once.
//!
//! ```text
//! [Extension | Bundle]* ─► flatten + priority overrides ─► stable sort (desc)
//!                                                              │
//!        ResolvedConfiguration ◄─ requirement check ◄─ first key/name wins
//! ```

use crate::bundle::{Bundle, BundleEntry};
use crate::error::{MissingRequirement, PlumeError, PlumeResult};
use crate::extension::{Extension, ExtensionId, ExtensionKey};
use crate::settings::ManagerSettings;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// One input item
pub enum Combined {
    Extension(Box<dyn Extension>),
    Bundle(BundleEntry),
}

impl Combined {
    pub fn extension(extension: impl Extension + 'static) -> Self {
        Combined::Extension(Box::new(extension))
    }

    /// Build the bundle entry, creating the bundle's members
    pub fn bundle(bundle: impl Bundle + 'static) -> PlumeResult<Self> {
        Ok(Combined::Bundle(BundleEntry::new(bundle)?))
    }
}

impl From<Box<dyn Extension>> for Combined {
    fn from(extension: Box<dyn Extension>) -> Self {
        Combined::Extension(extension)
    }
}

impl From<BundleEntry> for Combined {
    fn from(entry: BundleEntry) -> Self {
        Combined::Bundle(entry)
    }
}

impl fmt::Debug for Combined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combined::Extension(extension) => f.debug_tuple("Extension").field(&extension.name()).finish(),
            Combined::Bundle(entry) => f.debug_tuple("Bundle").field(&entry.name()).finish(),
        }
    }
}

/// Sorted, deduplicated extensions plus the bundles bound to them
#[derive(Debug, Default)]
pub struct ResolvedConfiguration {
    pub extensions: Vec<Box<dyn Extension>>,
    pub bundles: Vec<BundleEntry>,
}

impl ResolvedConfiguration {
    pub fn id_of(&self, key: ExtensionKey) -> Option<ExtensionId> {
        self.extensions
            .iter()
            .position(|extension| extension.key() == key)
            .map(ExtensionId)
    }

    pub fn names(&self) -> Vec<&str> {
        self.extensions.iter().map(|extension| extension.name()).collect()
    }
}

#[instrument(skip_all, fields(items = combined.len()))]
pub fn resolve(combined: Vec<Combined>, settings: &ManagerSettings) -> PlumeResult<ResolvedConfiguration> {
    let mut raw: Vec<Box<dyn Extension>> = Vec::new();
    let mut bundles: Vec<BundleEntry> = Vec::new();
    // Bundles declaring each extension type
    let mut owners: HashMap<ExtensionKey, Vec<usize>> = HashMap::new();

    for item in combined {
        match item {
            Combined::Extension(extension) => raw.push(extension),
            Combined::Bundle(mut entry) => {
                let index = bundles.len();
                for member in entry.take_members() {
                    let declared = owners.entry(member.key()).or_default();
                    if !declared.contains(&index) {
                        declared.push(index);
                    }
                    raw.push(member);
                }
                bundles.push(entry);
            }
        }
    }

    for extension in raw.iter_mut() {
        if let Some(priority) = settings.priority.get(extension.name()) {
            debug!(extension = extension.name(), %priority, "Priority override");
            extension.base_mut().set_priority_override(*priority);
        }
    }

    raw.sort_by_key(|extension| Reverse(extension.priority()));

    let mut extensions: Vec<Box<dyn Extension>> = Vec::with_capacity(raw.len());
    let mut by_key: HashMap<ExtensionKey, ExtensionId> = HashMap::new();
    let mut by_name: HashMap<String, ExtensionKey> = HashMap::new();

    for extension in raw {
        let key = extension.key();
        if by_key.contains_key(&key) {
            debug!(extension = extension.name(), priority = %extension.priority(), "Dropping duplicate instance");
            continue;
        }
        if let Some(winner) = by_name.get(extension.name()) {
            warn!(
                name = extension.name(),
                kept = %winner,
                dropped = %key,
                "Dropping extension with a name already in use"
            );
            continue;
        }

        let id = ExtensionId(extensions.len());
        by_key.insert(key, id);
        by_name.insert(extension.name().to_string(), key);
        for &bundle in owners.get(&key).into_iter().flatten() {
            bundles[bundle].bind(key, id);
        }
        extensions.push(extension);
    }

    let mut missing = Vec::new();
    for extension in &extensions {
        for required in extension.required_extensions() {
            if !by_key.contains_key(&required) {
                missing.push(MissingRequirement {
                    extension: extension.name().to_string(),
                    required: required.short_name().to_string(),
                });
            }
        }
    }
    if !missing.is_empty() {
        return Err(PlumeError::MissingRequiredExtension(missing));
    }

    info!(
        extensions = extensions.len(),
        bundles = bundles.len(),
        "Resolved extensions"
    );
    Ok(ResolvedConfiguration { extensions, bundles })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::ExtensionBase;
    use crate::options::{OptionSchema, OptionStore};
    use crate::priority::Priority;
    use serde_json::{json, Value};

    macro_rules! probe {
        ($ty:ident, $name:expr $(, requires $req:ty)*) => {
            struct $ty {
                name: &'static str,
                base: ExtensionBase,
            }

            impl $ty {
                fn with_options(options: Value) -> Self {
                    Self {
                        name: $name,
                        base: ExtensionBase::new($name, OptionSchema::empty(), options).unwrap(),
                    }
                }

                fn new() -> Self {
                    Self::with_options(Value::Null)
                }
            }

            impl Extension for $ty {
                fn name(&self) -> &str {
                    self.name
                }

                fn base(&self) -> &ExtensionBase {
                    &self.base
                }

                fn base_mut(&mut self) -> &mut ExtensionBase {
                    &mut self.base
                }

                fn required_extensions(&self) -> Vec<ExtensionKey> {
                    vec![$(ExtensionKey::of::<$req>()),*]
                }
            }
        };
    }

    probe!(Alpha, "alpha");
    probe!(Beta, "beta", requires Alpha);
    probe!(Gamma, "gamma", requires Alpha, requires Beta);
    probe!(Impostor, "alpha");

    struct Pair {
        name: &'static str,
        options: OptionStore,
    }

    impl Pair {
        fn entry(name: &'static str) -> BundleEntry {
            BundleEntry::new(Pair {
                name,
                options: OptionStore::new(name, OptionSchema::empty(), Value::Null).unwrap(),
            })
            .unwrap()
        }
    }

    impl Bundle for Pair {
        fn name(&self) -> &str {
            self.name
        }

        fn options(&self) -> &OptionStore {
            &self.options
        }

        fn options_mut(&mut self) -> &mut OptionStore {
            &mut self.options
        }

        fn create_extensions(&self) -> PlumeResult<Vec<Box<dyn Extension>>> {
            let priority = if self.name == "high" { 500 } else { 5 };
            let extensions: Vec<Box<dyn Extension>> = vec![
                Box::new(Alpha::with_options(json!({ "priority": priority }))),
                Box::new(Beta::new()),
            ];
            Ok(extensions)
        }
    }

    #[test]
    fn test_sorted_by_priority_and_stable() {
        let combined = vec![
            Combined::extension(Beta::new()),
            Combined::extension(Alpha::new()),
            Combined::extension(Gamma::with_options(json!({ "priority": 1 }))),
        ];

        let resolved = resolve(combined, &ManagerSettings::default()).unwrap();
        assert_eq!(resolved.names(), ["beta", "alpha", "gamma"]);
    }

    #[test]
    fn test_settings_priority_overrides_option() {
        let mut settings = ManagerSettings::default();
        settings.priority.insert("gamma".to_string(), Priority::HIGH);

        let combined = vec![
            Combined::extension(Alpha::new()),
            Combined::extension(Beta::new()),
            Combined::extension(Gamma::with_options(json!({ "priority": 1 }))),
        ];

        let resolved = resolve(combined, &settings).unwrap();
        assert_eq!(resolved.names(), ["gamma", "alpha", "beta"]);
    }

    #[test]
    fn test_bundles_share_the_highest_priority_instance() {
        let combined = vec![Combined::Bundle(Pair::entry("low")), Combined::Bundle(Pair::entry("high"))];

        let resolved = resolve(combined, &ManagerSettings::default()).unwrap();
        assert_eq!(resolved.extensions.len(), 2);

        let alpha = resolved.id_of(ExtensionKey::of::<Alpha>()).unwrap();
        assert_eq!(resolved.extensions[alpha.0].priority(), Priority(500));
        for entry in &resolved.bundles {
            assert_eq!(entry.member_id(ExtensionKey::of::<Alpha>()), Some(alpha));
            assert!(entry.member_id(ExtensionKey::of::<Beta>()).is_some());
        }
    }

    #[test]
    fn test_name_collision_keeps_first() {
        let combined = vec![
            Combined::extension(Impostor::with_options(json!({ "priority": 1 }))),
            Combined::extension(Alpha::new()),
        ];

        let resolved = resolve(combined, &ManagerSettings::default()).unwrap();
        assert_eq!(resolved.extensions.len(), 1);
        assert!(resolved.extensions[0].is::<Alpha>());
    }

    #[test]
    fn test_missing_requirements_are_aggregated() {
        let combined = vec![Combined::extension(Gamma::new())];

        let err = resolve(combined, &ManagerSettings::default()).unwrap_err();
        match err {
            PlumeError::MissingRequiredExtension(missing) => {
                assert_eq!(missing.len(), 2);
                assert_eq!(missing[0].to_string(), "gamma requires Alpha");
                assert_eq!(missing[1].to_string(), "gamma requires Beta");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
