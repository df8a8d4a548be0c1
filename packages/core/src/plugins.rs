use crate::extension::Extension;
use crate::schema::DynamicAttributes;
use crate::settings::ManagerSettings;
use plume_model::Plugin;
use std::rc::Rc;
use tracing::debug;

/// Contributes one document plugin
pub trait PluginProvider {
    fn create_plugin(&self) -> Plugin;
}

/// Settings plugins first, then extension plugins in resolved order, then
/// the dynamic attribute backfill
pub fn collect_plugins(
    extensions: &[Box<dyn Extension>],
    settings: &ManagerSettings,
    dynamic: &Rc<DynamicAttributes>,
) -> Vec<Plugin> {
    let mut plugins = settings.plugins.clone();

    if !settings.exclude.plugins {
        for extension in extensions {
            let Some(provider) = extension.as_plugin() else {
                continue;
            };
            if extension.options().exclude().plugins {
                debug!(extension = extension.name(), "Plugin excluded");
                continue;
            }
            plugins.push(provider.create_plugin());
        }
    }

    if !dynamic.is_empty() {
        plugins.push(dynamic.backfill_plugin());
    }

    debug!(count = plugins.len(), "Collected plugins");
    plugins
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlumeResult;
    use crate::extension::{ExtensionBase, ExtensionType};
    use crate::options::OptionSchema;
    use crate::schema::{AttributeTarget, DynamicDefault, BACKFILL_PLUGIN_KEY};
    use serde_json::{json, Value};

    struct Guard {
        base: ExtensionBase,
        key: &'static str,
    }

    impl Guard {
        fn new(key: &'static str, options: Value) -> Self {
            Self {
                base: ExtensionBase::new(key, OptionSchema::empty(), options).unwrap(),
                key,
            }
        }
    }

    impl Extension for Guard {
        fn name(&self) -> &str {
            self.key
        }

        fn base(&self) -> &ExtensionBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ExtensionBase {
            &mut self.base
        }

        fn as_plugin(&self) -> Option<&dyn PluginProvider> {
            Some(self)
        }
    }

    impl PluginProvider for Guard {
        fn create_plugin(&self) -> Plugin {
            Plugin::new(self.key)
        }
    }

    fn keys(plugins: &[Plugin]) -> Vec<&str> {
        plugins.iter().map(Plugin::key).collect()
    }

    #[test]
    fn test_collection_order() -> PlumeResult<()> {
        let extensions: Vec<Box<dyn Extension>> = vec![
            Box::new(Guard::new("first", Value::Null)),
            Box::new(Guard::new("skipped", json!({ "exclude": { "plugins": true } }))),
            Box::new(Guard::new("second", Value::Null)),
        ];
        let settings = ManagerSettings {
            plugins: vec![Plugin::new("external")],
            ..ManagerSettings::default()
        };

        let mut dynamic = DynamicAttributes::default();
        let create: DynamicDefault = Rc::new(|_target: AttributeTarget<'_>| json!("generated"));
        dynamic.insert(ExtensionType::Node, "paragraph", "id", create);

        let plugins = collect_plugins(&extensions, &settings, &Rc::new(dynamic));
        assert_eq!(keys(&plugins), ["external", "first", "second", BACKFILL_PLUGIN_KEY]);

        let plugins = collect_plugins(&extensions, &ManagerSettings::default(), &Rc::default());
        assert_eq!(keys(&plugins), ["first", "second"]);
        Ok(())
    }
}
