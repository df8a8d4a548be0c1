//! Lifecycle tests for the extension manager
//!
//! This tests:
//! - Hook order across every phase
//! - Stores shared during creation
//! - Hook failures
//! - View props: node views, attributes and editability
//! - Helpers and state replacement

use plume_core::options::OptionSchema;
use plume_core::store::{StoreKey, NODE_NAMES, PLAIN_NAMES, SCHEMA};
use plume_core::{
    AttributesProvider, Combined, CommandError, CreateContext, EditorAttributes, Extension, ExtensionBase,
    HeadlessView, HelperSpec, HelpersProvider, Manager, ManagerPhase, ManagerSettings, NodeViews,
    NodeViewsProvider, PlumeError, PlumeResult, Priority, StateUpdateProps, ViewContext,
};
use plume_core::plume_model::{DomElement, Node, NodeSpec, Schema, SchemaSpec};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

const SEEN: StoreKey<Vec<String>> = StoreKey::new("seen");

struct Recorder {
    base: ExtensionBase,
    name: &'static str,
    priority: i32,
    log: Log,
    fail_on_view: bool,
    node_view_tag: Option<&'static str>,
}

impl Recorder {
    fn new(name: &'static str, priority: i32, log: &Log) -> Self {
        Self::with_options(name, priority, log, Value::Null)
    }

    fn with_options(name: &'static str, priority: i32, log: &Log, options: Value) -> Self {
        Self {
            base: ExtensionBase::new(name, OptionSchema::empty(), options).unwrap(),
            name,
            priority,
            log: log.clone(),
            fail_on_view: false,
            node_view_tag: None,
        }
    }

    fn failing_on_view(mut self) -> Self {
        self.fail_on_view = true;
        self
    }

    fn rendering(mut self, tag: &'static str) -> Self {
        self.node_view_tag = Some(tag);
        self
    }

    fn record(&self, event: &str) {
        self.log.borrow_mut().push(format!("{}:{event}", self.name));
    }
}

impl Extension for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    fn base(&self) -> &ExtensionBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ExtensionBase {
        &mut self.base
    }

    fn default_priority(&self) -> Priority {
        Priority(self.priority)
    }

    fn on_create(&mut self, ctx: &mut CreateContext<'_>) -> PlumeResult<()> {
        self.record("create");
        let mut seen = ctx.store.get(SEEN).cloned().unwrap_or_default();
        seen.push(self.name.to_string());
        ctx.store.set(SEEN, seen)
    }

    fn on_view(&mut self, _ctx: &ViewContext<'_>) -> PlumeResult<()> {
        self.record("view");
        if self.fail_on_view {
            return Err(PlumeError::Construction(format!("{} refused the view", self.name)));
        }
        Ok(())
    }

    fn on_state_update(&mut self, props: &StateUpdateProps<'_>) -> PlumeResult<()> {
        let source = if props.tr.is_some() { "tr" } else { "state" };
        let first = if props.first_update { ",first" } else { "" };
        self.record(&format!("update({source}{first})"));
        Ok(())
    }

    fn on_destroy(&mut self) -> PlumeResult<()> {
        self.record("destroy");
        Ok(())
    }

    fn as_helpers(&self) -> Option<&dyn HelpersProvider> {
        Some(self)
    }

    fn as_node_views(&self) -> Option<&dyn NodeViewsProvider> {
        self.node_view_tag.map(|_| self as &dyn NodeViewsProvider)
    }

    fn as_attributes(&self) -> Option<&dyn AttributesProvider> {
        Some(self)
    }
}

impl HelpersProvider for Recorder {
    fn create_helpers(&self) -> Vec<HelperSpec> {
        vec![HelperSpec::new(format!("{}Size", self.name), |state, _args| {
            Ok(json!(state.doc().content_size()))
        })]
    }
}

impl NodeViewsProvider for Recorder {
    fn create_node_views(&self) -> NodeViews {
        let tag = self.node_view_tag.unwrap_or("div");
        NodeViews::from([(
            "paragraph".to_string(),
            Rc::new(move |node: &Node| {
                DomElement::new(tag).with_attribute("data-size", node.content_size().to_string())
            }) as Rc<dyn Fn(&Node) -> DomElement>,
        )])
    }
}

impl AttributesProvider for Recorder {
    fn create_attributes(&self) -> EditorAttributes {
        EditorAttributes::from([
            ("class".to_string(), self.name.to_string()),
            ("data-owner".to_string(), self.name.to_string()),
        ])
    }
}

fn settings() -> anyhow::Result<ManagerSettings> {
    let mut spec = SchemaSpec::default();
    spec.nodes.insert(
        "doc".to_string(),
        NodeSpec {
            content: Some("block+".to_string()),
            ..Default::default()
        },
    );
    spec.nodes.insert("text".to_string(), NodeSpec::default());
    spec.nodes.insert(
        "paragraph".to_string(),
        NodeSpec {
            content: Some("inline*".to_string()),
            group: Some("block".to_string()),
            ..Default::default()
        },
    );

    Ok(ManagerSettings {
        schema: Some(Rc::new(Schema::new(spec)?)),
        ..ManagerSettings::default()
    })
}

fn manager(extensions: Vec<Recorder>) -> anyhow::Result<Manager> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let combined = extensions.into_iter().map(Combined::extension).collect();
    Ok(Manager::create(combined, settings()?)?)
}

fn attach(manager: &mut Manager) -> anyhow::Result<bool> {
    let schema = manager.schema().clone();
    let paragraph = schema.node("paragraph", None, vec![schema.text("hi", vec![])?])?;
    let doc = schema.node("doc", None, vec![paragraph])?;
    let state = manager.create_state(Some(doc))?;
    Ok(manager.attach_view(Box::new(HeadlessView::new(state)))?)
}

fn events(log: &Log, event: &str) -> Vec<String> {
    log.borrow()
        .iter()
        .filter(|entry| entry.ends_with(event))
        .cloned()
        .collect()
}

#[test]
fn test_hooks_follow_priority_in_every_phase() -> anyhow::Result<()> {
    let log = Log::default();
    let mut manager = manager(vec![
        Recorder::new("low", 10, &log),
        Recorder::new("high", 1000, &log),
        Recorder::new("mid", 100, &log),
    ])?;
    assert_eq!(manager.phase(), ManagerPhase::Create);
    assert_eq!(events(&log, ":create"), ["high:create", "mid:create", "low:create"]);

    assert!(attach(&mut manager)?);
    assert_eq!(manager.phase(), ManagerPhase::EditorView);
    assert_eq!(events(&log, ":view"), ["high:view", "mid:view", "low:view"]);

    let tr = manager.state()?.tr();
    assert!(manager.dispatch_transaction(tr)?);
    assert_eq!(manager.phase(), ManagerPhase::Runtime);
    assert_eq!(
        events(&log, "(tr,first)"),
        ["high:update(tr,first)", "mid:update(tr,first)", "low:update(tr,first)"]
    );

    let tr = manager.state()?.tr();
    manager.dispatch_transaction(tr)?;
    assert_eq!(events(&log, "(tr)").len(), 3);

    manager.destroy()?;
    assert_eq!(manager.phase(), ManagerPhase::Destroy);
    assert_eq!(events(&log, ":destroy"), ["high:destroy", "mid:destroy", "low:destroy"]);
    Ok(())
}

#[test]
fn test_stores_are_filled_during_creation() -> anyhow::Result<()> {
    let log = Log::default();
    let manager = manager(vec![Recorder::new("first", 200, &log), Recorder::new("second", 100, &log)])?;

    let seen = manager.extension_store().get(SEEN).cloned().unwrap_or_default();
    assert_eq!(seen, ["first", "second"]);

    let store = manager.store();
    assert!(store.get(SCHEMA).is_some());
    assert_eq!(store.get(NODE_NAMES).map(Vec::len), Some(0));
    assert_eq!(
        store.get(PLAIN_NAMES).cloned().unwrap_or_default(),
        ["first", "second"]
    );
    Ok(())
}

#[test]
fn test_view_hook_error_stops_the_phase() -> anyhow::Result<()> {
    let log = Log::default();
    let mut manager = manager(vec![
        Recorder::new("high", 1000, &log).failing_on_view(),
        Recorder::new("low", 10, &log),
    ])?;

    let err = attach(&mut manager).unwrap_err();
    assert!(err.to_string().contains("high refused the view"));
    assert_eq!(events(&log, ":view"), ["high:view"]);
    assert!(manager.view().is_some());
    Ok(())
}

#[test]
fn test_attach_view_only_once() -> anyhow::Result<()> {
    let log = Log::default();
    let mut manager = manager(vec![Recorder::new("only", 100, &log)])?;
    assert!(attach(&mut manager)?);
    assert!(!attach(&mut manager)?);
    assert_eq!(events(&log, ":view").len(), 1);
    Ok(())
}

#[test]
fn test_update_state_runs_hooks_without_transaction() -> anyhow::Result<()> {
    let log = Log::default();
    let mut manager = manager(vec![Recorder::new("only", 100, &log)])?;
    attach(&mut manager)?;

    let state = manager.create_state(None)?;
    manager.update_state(state)?;
    assert_eq!(events(&log, "update(state,first)"), ["only:update(state,first)"]);
    assert_eq!(manager.state()?.doc().content_size(), 0);
    Ok(())
}

#[test]
fn test_first_node_view_wins() -> anyhow::Result<()> {
    let log = Log::default();
    let mut manager = manager(vec![
        Recorder::new("fallback", 10, &log).rendering("div"),
        Recorder::new("preferred", 500, &log).rendering("section"),
    ])?;
    attach(&mut manager)?;

    let props = manager.view().map(|view| view.props()).ok_or_else(|| anyhow::anyhow!("no view"))?;
    let render = props.node_views.get("paragraph").ok_or_else(|| anyhow::anyhow!("no node view"))?;
    let paragraph = &manager.state()?.doc().content[0];
    let element = render(paragraph);
    assert_eq!(element.tag, "section");
    assert_eq!(element.get_attribute("data-size"), Some("2"));
    Ok(())
}

#[test]
fn test_node_views_respect_exclusions() -> anyhow::Result<()> {
    let log = Log::default();
    let mut manager = manager(vec![
        Recorder::with_options("excluded", 500, &log, json!({ "exclude": { "nodeViews": true } }))
            .rendering("section"),
        Recorder::new("kept", 10, &log).rendering("article"),
    ])?;
    attach(&mut manager)?;
    let tag = manager
        .view()
        .and_then(|view| view.props().node_views.get("paragraph").cloned())
        .map(|render| render(&manager.state().unwrap().doc().content[0]).tag);
    assert_eq!(tag.as_deref(), Some("article"));

    let mut settings = settings()?;
    settings.exclude.node_views = true;
    let mut manager = Manager::create(
        vec![Combined::extension(Recorder::new("kept", 10, &log).rendering("article"))],
        settings,
    )?;
    attach(&mut manager)?;
    assert!(manager.view().is_some_and(|view| view.props().node_views.is_empty()));
    Ok(())
}

#[test]
fn test_view_attributes_and_editable() -> anyhow::Result<()> {
    let log = Log::default();
    let mut manager = manager(vec![Recorder::new("low", 10, &log), Recorder::new("high", 1000, &log)])?;
    attach(&mut manager)?;

    let attributes = manager.view_attributes();
    assert_eq!(attributes["data-owner"], "high");
    assert_eq!(attributes["class"], "high low");

    assert!(manager.view().is_some_and(|view| view.props().editable));
    manager.set_editable(false);
    assert!(!manager.is_editable());
    assert!(manager.view().is_some_and(|view| !view.props().editable));
    Ok(())
}

#[test]
fn test_helpers_read_the_view_state() -> anyhow::Result<()> {
    let log = Log::default();
    let mut manager = manager(vec![Recorder::new("alpha", 100, &log)])?;
    attach(&mut manager)?;

    let helpers = manager.helpers()?;
    assert_eq!(helpers.names(), ["alphaSize"]);
    assert_eq!(helpers.call_as::<usize>("alphaSize", &[])?, 4);
    assert!(matches!(
        helpers.call("missing", &[]),
        Err(PlumeError::Command(CommandError::UnknownHelper(name))) if name == "missing"
    ));
    Ok(())
}
