use crate::extension::{Extension, ExtensionId, ExtensionType};
use std::collections::BTreeMap;

/// Which resolved extensions provide each optional capability.
///
/// Built once after resolution so later phases iterate only the relevant
/// extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityIndex {
    pub commands: Vec<ExtensionId>,
    pub helpers: Vec<ExtensionId>,
    pub plugins: Vec<ExtensionId>,
    pub schema_attributes: Vec<ExtensionId>,
    pub attributes: Vec<ExtensionId>,
    pub node_views: Vec<ExtensionId>,
    pub names: BTreeMap<ExtensionType, Vec<String>>,
}

impl CapabilityIndex {
    pub fn build(extensions: &[Box<dyn Extension>]) -> Self {
        let mut index = CapabilityIndex::default();
        for (position, extension) in extensions.iter().enumerate() {
            let id = ExtensionId(position);
            let extension = extension.as_ref();
            if extension.as_commands().is_some() {
                index.commands.push(id);
            }
            if extension.as_helpers().is_some() {
                index.helpers.push(id);
            }
            if extension.as_plugin().is_some() {
                index.plugins.push(id);
            }
            if extension.as_schema_attributes().is_some() {
                index.schema_attributes.push(id);
            }
            if extension.as_attributes().is_some() {
                index.attributes.push(id);
            }
            if extension.as_node_views().is_some() {
                index.node_views.push(id);
            }
            index
                .names
                .entry(extension.extension_type())
                .or_default()
                .push(extension.name().to_string());
        }
        index
    }

    /// Names of the resolved extensions of one type, in resolved order
    pub fn names_of(&self, kind: ExtensionType) -> &[String] {
        self.names.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}
