//! # Manager
//!
//! Owns the resolved extensions and drives them through their lifecycle.
//!
//! ```text
//! Manager::create ── resolve ─► tags ─► schema ─► plugins ─► on_create
//! attach_view ────── commands + helpers ─► view props ─► on_view
//! dispatch ───────── apply ─► view.update_state ─► forced props ─► on_state_update
//! destroy ────────── on_destroy ─► view.destroy
//! ```

use crate::attributes::{merge_attributes, EditorAttributes};
use crate::bundle::{Bundle, BundleEntry};
use crate::capabilities::CapabilityIndex;
use crate::commands::{Chain, CommandFn, Commands, Registry, RESERVED_COMMAND_NAMES};
use crate::error::{CommandError, PlumeError, PlumeResult};
use crate::extension::{Extension, ExtensionId, ExtensionKey, ExtensionType};
use crate::helpers::{HelperFn, Helpers};
use crate::lifecycle::{CreateContext, ManagerPhase, StateUpdateProps, ViewContext};
use crate::options::SetOptionsProps;
use crate::plugins::collect_plugins;
use crate::resolver::{resolve, Combined, ResolvedConfiguration};
use crate::schema::{build_schema, SchemaBuild};
use crate::settings::ManagerSettings;
use crate::store::{
    ExtensionStore, ManagerStore, DYNAMIC_ATTRIBUTES, MARK_NAMES, NODE_NAMES, PLAIN_NAMES, PLUGINS, SCHEMA,
    TAGS, VIEW_ATTRIBUTES,
};
use crate::tags::TagIndex;
use crate::view::{collect_node_views, force_update, forced_updates, UpdatableViewProps, View, ViewPropsUpdate};
use plume_model::{EditorState, Node, Schema, StateConfig, Transaction};
use serde_json::Value;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info, instrument};

pub struct Manager {
    extensions: Vec<Box<dyn Extension>>,
    bundles: Vec<BundleEntry>,
    settings: ManagerSettings,
    phase: ManagerPhase,
    store: ManagerStore,
    extension_store: ExtensionStore,
    capabilities: CapabilityIndex,
    schema: Rc<Schema>,
    tags: TagIndex,
    commands: Registry<CommandFn>,
    helpers: Registry<HelperFn>,
    pending: Option<Transaction>,
    view: Option<Box<dyn View>>,
    editable: bool,
    updated: bool,
}

impl Manager {
    /// Resolve `combined`, build the schema and run every `on_create` hook
    #[instrument(skip_all, fields(items = combined.len()))]
    pub fn create(combined: Vec<Combined>, settings: ManagerSettings) -> PlumeResult<Self> {
        let ResolvedConfiguration {
            mut extensions,
            bundles,
        } = resolve(combined, &settings)?;

        let mut phase = ManagerPhase::default();
        phase.advance(ManagerPhase::Create)?;
        info!(phase = %phase, "Manager phase");

        let capabilities = CapabilityIndex::build(&extensions);
        let tags = TagIndex::build(&extensions, settings.exclude.tags);
        let SchemaBuild { schema, dynamic } = build_schema(&extensions, &settings, &tags)?;
        let dynamic = Rc::new(dynamic);
        let plugins = collect_plugins(&extensions, &settings, &dynamic);

        let mut store = ManagerStore::new();
        store.set(SCHEMA, schema.clone())?;
        store.set(TAGS, tags.clone())?;
        store.set(PLUGINS, plugins)?;
        store.set(DYNAMIC_ATTRIBUTES, dynamic)?;
        store.set(
            VIEW_ATTRIBUTES,
            merge_attributes(&extensions, settings.exclude.attributes),
        )?;
        store.set(NODE_NAMES, capabilities.names_of(ExtensionType::Node).to_vec())?;
        store.set(MARK_NAMES, capabilities.names_of(ExtensionType::Mark).to_vec())?;
        store.set(PLAIN_NAMES, capabilities.names_of(ExtensionType::Plain).to_vec())?;

        let mut extension_store = ExtensionStore::new();
        for extension in extensions.iter_mut() {
            let mut ctx = CreateContext {
                store: &mut extension_store,
                manager_store: &store,
            };
            extension.on_create(&mut ctx)?;
        }
        store.seal();
        extension_store.seal();

        info!(
            extensions = extensions.len(),
            bundles = bundles.len(),
            commands = capabilities.commands.len(),
            "Manager created"
        );

        Ok(Self {
            extensions,
            bundles,
            editable: settings.editable,
            settings,
            phase,
            store,
            extension_store,
            capabilities,
            schema,
            tags,
            commands: Registry::new("command", RESERVED_COMMAND_NAMES),
            helpers: Registry::new("helper", &[]),
            pending: None,
            view: None,
            updated: false,
        })
    }

    /// Editor state over the manager's schema and plugins
    pub fn create_state(&self, doc: Option<Node>) -> PlumeResult<EditorState> {
        let plugins = self.store.get(PLUGINS).cloned().unwrap_or_default();
        let mut config = StateConfig::new(self.schema.clone()).with_plugins(plugins);
        if let Some(doc) = doc {
            config = config.with_doc(doc);
        }
        Ok(EditorState::create(config)?)
    }

    /// Attach the view, register commands and helpers and run every
    /// `on_view` hook. Returns `false` if a view is already attached.
    #[instrument(skip_all)]
    pub fn attach_view(&mut self, mut view: Box<dyn View>) -> PlumeResult<bool> {
        if self.phase.is_destroyed() {
            return Err(PlumeError::Phase(
                "cannot attach a view to a destroyed manager".to_string(),
            ));
        }
        if self.view.is_some() {
            debug!("View already attached");
            return Ok(false);
        }

        self.register_commands()?;
        self.register_helpers()?;

        view.set_props(view_props_update(
            &self.extensions,
            &self.settings,
            self.editable,
            &[
                UpdatableViewProps::Attributes,
                UpdatableViewProps::Editable,
                UpdatableViewProps::NodeViews,
            ],
        ));
        self.phase.advance(ManagerPhase::EditorView)?;
        info!(phase = %self.phase, commands = self.commands.len(), helpers = self.helpers.len(), "Manager phase");

        let result = self.run_view_hooks(view.as_ref());
        self.view = Some(view);
        result?;
        Ok(true)
    }

    fn register_commands(&mut self) -> PlumeResult<()> {
        let mut commands = Registry::new("command", RESERVED_COMMAND_NAMES);
        for id in &self.capabilities.commands {
            let extension = &self.extensions[id.0];
            let Some(provider) = extension.as_commands() else {
                continue;
            };
            for spec in provider.create_commands() {
                commands.register(extension.name(), spec.name, spec.command)?;
            }
        }
        self.commands = commands;
        Ok(())
    }

    fn register_helpers(&mut self) -> PlumeResult<()> {
        let mut helpers = Registry::new("helper", &[]);
        for id in &self.capabilities.helpers {
            let extension = &self.extensions[id.0];
            let Some(provider) = extension.as_helpers() else {
                continue;
            };
            for spec in provider.create_helpers() {
                helpers.register(extension.name(), spec.name, spec.helper)?;
            }
        }
        self.helpers = helpers;
        Ok(())
    }

    fn run_view_hooks(&mut self, view: &dyn View) -> PlumeResult<()> {
        for extension in self.extensions.iter_mut() {
            let ctx = ViewContext {
                view,
                store: &self.extension_store,
                manager_store: &self.store,
            };
            extension.on_view(&ctx)?;
        }
        Ok(())
    }

    /// Apply `tr` to the view state, recompute forced view props and run
    /// every `on_state_update` hook. Returns `false` if a plugin filtered
    /// the transaction out.
    pub fn dispatch_transaction(&mut self, tr: Transaction) -> PlumeResult<bool> {
        if self.phase.is_destroyed() {
            return Err(PlumeError::Phase(
                "cannot dispatch a transaction after the manager was destroyed".to_string(),
            ));
        }
        let view = self
            .view
            .as_mut()
            .ok_or_else(|| PlumeError::Phase("cannot dispatch a transaction without a view".to_string()))?;

        let Some(applied) = view.state().apply_transaction(tr)? else {
            debug!("Transaction filtered out");
            return Ok(false);
        };
        // Appending plugins may request forced props too
        let forced = forced_updates(&applied.transaction);
        let previous_state = view.state().clone();
        view.update_state(applied.state);

        if !forced.is_empty() {
            debug!(props = ?forced, "Forced view props update");
            view.set_props(view_props_update(
                &self.extensions,
                &self.settings,
                self.editable,
                &forced,
            ));
        }

        let first_update = !self.updated;
        if first_update {
            self.updated = true;
            self.phase.advance(ManagerPhase::Runtime)?;
            info!(phase = %self.phase, "Manager phase");
        }

        let props = StateUpdateProps {
            previous_state: &previous_state,
            state: view.state(),
            tr: Some(&applied.transaction),
            first_update,
        };
        for extension in self.extensions.iter_mut() {
            extension.on_state_update(&props)?;
        }
        Ok(true)
    }

    /// Replace the view state without a transaction
    pub fn update_state(&mut self, state: EditorState) -> PlumeResult<()> {
        if self.phase.is_destroyed() {
            return Err(PlumeError::Phase(
                "cannot update the state of a destroyed manager".to_string(),
            ));
        }
        let view = self
            .view
            .as_mut()
            .ok_or_else(|| PlumeError::Phase("cannot update the state without a view".to_string()))?;

        let previous_state = view.state().clone();
        view.update_state(state);
        self.pending = None;

        let first_update = !self.updated;
        if first_update {
            self.updated = true;
            self.phase.advance(ManagerPhase::Runtime)?;
        }

        let props = StateUpdateProps {
            previous_state: &previous_state,
            state: view.state(),
            tr: None,
            first_update,
        };
        for extension in self.extensions.iter_mut() {
            extension.on_state_update(&props)?;
        }
        Ok(())
    }

    /// Dispatch an empty transaction that recomputes `props`
    pub fn force_update(&mut self, props: &[UpdatableViewProps]) -> PlumeResult<bool> {
        let mut tr = self.view_state()?.tr();
        force_update(&mut tr, props);
        self.dispatch_transaction(tr)
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
        if let Some(view) = self.view.as_mut() {
            view.set_props(ViewPropsUpdate {
                editable: Some(editable),
                ..ViewPropsUpdate::default()
            });
        }
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Run every `on_destroy` hook and destroy the view. Idempotent.
    #[instrument(skip_all)]
    pub fn destroy(&mut self) -> PlumeResult<()> {
        if self.phase.is_destroyed() {
            return Ok(());
        }
        self.phase.advance(ManagerPhase::Destroy)?;
        self.pending = None;
        info!(phase = %self.phase, "Manager phase");

        let result = self
            .extensions
            .iter_mut()
            .try_for_each(|extension| extension.on_destroy());
        if let Some(view) = self.view.as_mut() {
            view.destroy();
        }
        result
    }

    // Commands and helpers

    pub fn commands(&mut self) -> PlumeResult<Commands<'_>> {
        self.ensure_runtime("commands")?;
        Ok(Commands::new(self))
    }

    pub fn chain(&mut self) -> PlumeResult<Chain<'_>> {
        self.ensure_runtime("chain")?;
        Chain::new(self)
    }

    pub fn helpers(&self) -> PlumeResult<Helpers<'_>> {
        self.ensure_runtime("helpers")?;
        Ok(Helpers::new(self))
    }

    fn ensure_runtime(&self, accessor: &str) -> PlumeResult<()> {
        if self.phase.is_destroyed() {
            return Err(PlumeError::Phase(format!(
                "`{accessor}` cannot be used after the manager was destroyed"
            )));
        }
        if self.view.is_none() {
            return Err(PlumeError::Phase(format!(
                "`{accessor}` was called in the outer scope, before a view was attached"
            )));
        }
        Ok(())
    }

    pub(crate) fn command(&self, name: &str) -> Result<CommandFn, CommandError> {
        self.commands
            .get(name)
            .cloned()
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))
    }

    pub(crate) fn command_names(&self) -> Vec<&str> {
        self.commands.names().collect()
    }

    /// Extension that registered command `name`
    pub fn command_owner(&self, name: &str) -> Option<&str> {
        self.commands.owner(name)
    }

    pub(crate) fn helper(&self, name: &str) -> Result<HelperFn, CommandError> {
        self.helpers
            .get(name)
            .cloned()
            .ok_or_else(|| CommandError::UnknownHelper(name.to_string()))
    }

    pub(crate) fn helper_names(&self) -> Vec<&str> {
        self.helpers.names().collect()
    }

    pub(crate) fn view_state(&self) -> PlumeResult<&EditorState> {
        self.view
            .as_deref()
            .map(|view| view.state())
            .ok_or_else(|| PlumeError::Phase("no view is attached".to_string()))
    }

    pub(crate) fn focus_view(&mut self) -> PlumeResult<()> {
        let view = self
            .view
            .as_mut()
            .ok_or_else(|| PlumeError::Phase("no view is attached".to_string()))?;
        if !view.has_focus() {
            view.focus();
        }
        Ok(())
    }

    /// The pending transaction if it still matches the document version,
    /// otherwise a fresh one
    pub(crate) fn take_pending(&mut self) -> PlumeResult<Transaction> {
        let version = self.view_state()?.version();
        match self.pending.take() {
            Some(tr) if tr.start_version() == version => Ok(tr),
            _ => Ok(self.view_state()?.tr()),
        }
    }

    pub(crate) fn restore_pending(&mut self, tr: Transaction) {
        if !self.phase.is_destroyed() {
            self.pending = Some(tr);
        }
    }

    /// Transaction shared by unchained commands that have not dispatched
    pub fn pending_transaction(&self) -> Option<&Transaction> {
        self.pending.as_ref()
    }

    // Extensions and bundles

    pub fn extension<T: Extension>(&self) -> PlumeResult<&T> {
        self.extensions
            .iter()
            .find_map(|extension| extension.as_ref().downcast_ref::<T>())
            .ok_or_else(|| unknown::<T>())
    }

    pub fn extension_mut<T: Extension>(&mut self) -> PlumeResult<&mut T> {
        self.extensions
            .iter_mut()
            .find_map(|extension| extension.as_mut().downcast_mut::<T>())
            .ok_or_else(|| unknown::<T>())
    }

    pub fn extension_by_name(&self, name: &str) -> Option<&dyn Extension> {
        self.extensions
            .iter()
            .find(|extension| extension.name() == name)
            .map(|extension| extension.as_ref())
    }

    pub fn extension_id<T: Extension>(&self) -> Option<ExtensionId> {
        let key = ExtensionKey::of::<T>();
        self.extensions
            .iter()
            .position(|extension| extension.key() == key)
            .map(ExtensionId)
    }

    pub fn extensions(&self) -> &[Box<dyn Extension>] {
        &self.extensions
    }

    pub fn set_extension_options<T: Extension>(&mut self, update: Value) -> PlumeResult<SetOptionsProps> {
        self.extension_mut::<T>()?.set_options(update)
    }

    pub fn reset_extension_options<T: Extension>(&mut self) -> PlumeResult<SetOptionsProps> {
        self.extension_mut::<T>()?.reset_options()
    }

    pub fn bundle<B: Bundle>(&self) -> PlumeResult<&B> {
        self.bundles
            .iter()
            .find_map(|entry| entry.downcast_ref::<B>())
            .ok_or_else(|| PlumeError::UnknownExtension(std::any::type_name::<B>().to_string()))
    }

    pub fn bundles(&self) -> &[BundleEntry] {
        &self.bundles
    }

    /// Update a bundle's options and forward the change to its members
    pub fn set_bundle_options<B: Bundle>(&mut self, update: Value) -> PlumeResult<SetOptionsProps> {
        let entry = self
            .bundles
            .iter_mut()
            .find(|entry| entry.is::<B>())
            .ok_or_else(|| PlumeError::UnknownExtension(std::any::type_name::<B>().to_string()))?;
        entry.set_options(update, &mut self.extensions)
    }

    pub fn reset_bundle_options<B: Bundle>(&mut self) -> PlumeResult<SetOptionsProps> {
        let entry = self
            .bundles
            .iter_mut()
            .find(|entry| entry.is::<B>())
            .ok_or_else(|| PlumeError::UnknownExtension(std::any::type_name::<B>().to_string()))?;
        entry.reset_options(&mut self.extensions)
    }

    /// Resolved instance of bundle `B`'s member `T`
    pub fn bundle_member_id<B: Bundle, T: Extension>(&self) -> Option<ExtensionId> {
        self.bundles
            .iter()
            .find(|entry| entry.is::<B>())?
            .member_id(ExtensionKey::of::<T>())
    }

    // Accessors

    pub fn phase(&self) -> ManagerPhase {
        self.phase
    }

    pub fn schema(&self) -> &Rc<Schema> {
        &self.schema
    }

    pub fn tags(&self) -> &TagIndex {
        &self.tags
    }

    pub fn capabilities(&self) -> &CapabilityIndex {
        &self.capabilities
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    pub fn store(&self) -> &ManagerStore {
        &self.store
    }

    pub fn extension_store(&self) -> &ExtensionStore {
        &self.extension_store
    }

    pub fn view(&self) -> Option<&dyn View> {
        self.view.as_deref()
    }

    /// Current view state
    pub fn state(&self) -> PlumeResult<&EditorState> {
        self.view_state()
    }

    /// Attributes currently computed for the editor element
    pub fn view_attributes(&self) -> EditorAttributes {
        merge_attributes(&self.extensions, self.settings.exclude.attributes)
    }
}

fn unknown<T: Extension>() -> PlumeError {
    PlumeError::UnknownExtension(ExtensionKey::of::<T>().short_name().to_string())
}

fn view_props_update(
    extensions: &[Box<dyn Extension>],
    settings: &ManagerSettings,
    editable: bool,
    props: &[UpdatableViewProps],
) -> ViewPropsUpdate {
    let mut update = ViewPropsUpdate::default();
    for prop in props {
        match prop {
            UpdatableViewProps::Attributes => {
                update.attributes = Some(merge_attributes(extensions, settings.exclude.attributes));
            }
            UpdatableViewProps::Editable => update.editable = Some(editable),
            UpdatableViewProps::NodeViews => {
                update.node_views = Some(collect_node_views(extensions, settings.exclude.node_views));
            }
        }
    }
    update
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("phase", &self.phase)
            .field(
                "extensions",
                &self.extensions.iter().map(|extension| extension.name()).collect::<Vec<_>>(),
            )
            .field("bundles", &self.bundles)
            .field("commands", &self.commands)
            .field("helpers", &self.helpers)
            .field("view", &self.view.is_some())
            .finish()
    }
}
