//! # Bundles
//!
//! A bundle is a named group of extensions created once, when its
//! [`BundleEntry`] is built. After resolution the entry no longer owns its
//! members: it refers to the winning instances by [`ExtensionId`], so two
//! bundles declaring the same extension type share one instance.

use crate::error::PlumeResult;
use crate::extension::{AsAny, Extension, ExtensionId, ExtensionKey};
use crate::options::{OptionStore, SetOptionsProps};
use serde_json::Value;
use std::fmt;

/// Mutable access to a bundle's resolved members
pub trait BundleMembers {
    fn get_mut(&mut self, key: ExtensionKey) -> Option<&mut (dyn Extension + 'static)>;
}

impl dyn BundleMembers + '_ {
    pub fn extension_mut<T: Extension>(&mut self) -> Option<&mut T> {
        self.get_mut(ExtensionKey::of::<T>())
            .and_then(|extension| extension.downcast_mut::<T>())
    }
}

pub trait Bundle: AsAny {
    fn name(&self) -> &str;

    fn options(&self) -> &OptionStore;

    fn options_mut(&mut self) -> &mut OptionStore;

    /// Called once, when the bundle entry is built
    fn create_extensions(&self) -> PlumeResult<Vec<Box<dyn Extension>>>;

    /// Forward option changes to the members
    fn on_set_options(
        &mut self,
        _props: &SetOptionsProps,
        _members: &mut dyn BundleMembers,
    ) -> PlumeResult<()> {
        Ok(())
    }
}

enum Members {
    Owned(Vec<Box<dyn Extension>>),
    Bound(Vec<(ExtensionKey, Option<ExtensionId>)>),
}

pub struct BundleEntry {
    bundle: Box<dyn Bundle>,
    members: Members,
}

impl BundleEntry {
    pub fn new(bundle: impl Bundle + 'static) -> PlumeResult<Self> {
        let extensions = bundle.create_extensions()?;
        Ok(Self {
            bundle: Box::new(bundle),
            members: Members::Owned(extensions),
        })
    }

    pub fn name(&self) -> &str {
        self.bundle.name()
    }

    pub fn bundle(&self) -> &dyn Bundle {
        self.bundle.as_ref()
    }

    pub fn is<B: Bundle>(&self) -> bool {
        self.bundle.as_ref().as_any().is::<B>()
    }

    pub fn downcast_ref<B: Bundle>(&self) -> Option<&B> {
        self.bundle.as_ref().as_any().downcast_ref::<B>()
    }

    /// Keys of the declared members, in declaration order
    pub fn member_keys(&self) -> Vec<ExtensionKey> {
        match &self.members {
            Members::Owned(extensions) => extensions.iter().map(|extension| extension.key()).collect(),
            Members::Bound(bound) => bound.iter().map(|(key, _)| *key).collect(),
        }
    }

    /// Resolved instance of a member, if it won resolution
    pub fn member_id(&self, key: ExtensionKey) -> Option<ExtensionId> {
        match &self.members {
            Members::Owned(_) => None,
            Members::Bound(bound) => bound
                .iter()
                .find(|(member, _)| *member == key)
                .and_then(|(_, id)| *id),
        }
    }

    /// Hand the owned members to the resolver, switching to bound members
    pub(crate) fn take_members(&mut self) -> Vec<Box<dyn Extension>> {
        match std::mem::replace(&mut self.members, Members::Bound(Vec::new())) {
            Members::Owned(extensions) => {
                self.members =
                    Members::Bound(extensions.iter().map(|extension| (extension.key(), None)).collect());
                extensions
            }
            bound @ Members::Bound(_) => {
                self.members = bound;
                Vec::new()
            }
        }
    }

    pub(crate) fn bind(&mut self, key: ExtensionKey, id: ExtensionId) {
        if let Members::Bound(bound) = &mut self.members {
            for (member, slot) in bound.iter_mut() {
                if *member == key {
                    *slot = Some(id);
                }
            }
        }
    }

    pub(crate) fn set_options(
        &mut self,
        update: Value,
        extensions: &mut [Box<dyn Extension>],
    ) -> PlumeResult<SetOptionsProps> {
        let props = self.bundle.options_mut().set(update)?;
        self.forward(&props, extensions)?;
        Ok(props)
    }

    pub(crate) fn reset_options(
        &mut self,
        extensions: &mut [Box<dyn Extension>],
    ) -> PlumeResult<SetOptionsProps> {
        let props = self.bundle.options_mut().reset();
        self.forward(&props, extensions)?;
        Ok(props)
    }

    fn forward(&mut self, props: &SetOptionsProps, extensions: &mut [Box<dyn Extension>]) -> PlumeResult<()> {
        let bound = match &self.members {
            Members::Bound(bound) => bound.as_slice(),
            Members::Owned(_) => &[],
        };
        let mut members = BoundMembers { bound, extensions };
        self.bundle.on_set_options(props, &mut members)
    }
}

impl fmt::Debug for BundleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleEntry")
            .field("name", &self.name())
            .field("members", &self.member_keys())
            .finish()
    }
}

struct BoundMembers<'a> {
    bound: &'a [(ExtensionKey, Option<ExtensionId>)],
    extensions: &'a mut [Box<dyn Extension>],
}

impl BundleMembers for BoundMembers<'_> {
    fn get_mut(&mut self, key: ExtensionKey) -> Option<&mut (dyn Extension + 'static)> {
        let id = self
            .bound
            .iter()
            .find(|(member, _)| *member == key)
            .and_then(|(_, id)| *id)?;
        self.extensions.get_mut(id.0).map(|extension| extension.as_mut())
    }
}
