use crate::args;
use plume_core::options::{OptionSchema, SetOptionsProps};
use plume_core::{
    CommandSpec, CommandsProvider, Extension, ExtensionBase, HelperSpec, HelpersProvider, PlumeResult,
    PluginProvider,
};
use plume_model::{EditorState, Plugin, Selection, Transaction};
use serde_json::{json, Value};
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

pub const MAX_LENGTH_PLUGIN_KEY: &str = "plume:maxLength";

/// Text insertion, deletion and selection commands.
///
/// Options: `maxLength` (dynamic, `null`). When set, transactions that
/// would grow the document's text beyond it are rejected.
pub struct TextCommandsExtension {
    base: ExtensionBase,
    max_length: Rc<Cell<Option<usize>>>,
}

impl TextCommandsExtension {
    pub const NAME: &'static str = "textCommands";

    pub fn new() -> PlumeResult<Self> {
        Self::with_options(Value::Null)
    }

    pub fn with_options(options: Value) -> PlumeResult<Self> {
        let schema = OptionSchema::builder().dynamic("maxLength", Value::Null).build()?;
        let base = ExtensionBase::new(Self::NAME, schema, options)?;
        let max_length = Rc::new(Cell::new(read_max_length(base.options().get("maxLength"))));
        Ok(Self { base, max_length })
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length.get()
    }
}

fn read_max_length(value: Option<&Value>) -> Option<usize> {
    value
        .and_then(Value::as_u64)
        .and_then(|value| usize::try_from(value).ok())
}

impl Extension for TextCommandsExtension {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn base(&self) -> &ExtensionBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ExtensionBase {
        &mut self.base
    }

    fn on_set_options(&mut self, props: &SetOptionsProps) -> PlumeResult<()> {
        if props.changed("maxLength") {
            let max_length = read_max_length(props.options.get("maxLength"));
            debug!(?max_length, "Updated max length");
            self.max_length.set(max_length);
        }
        Ok(())
    }

    fn as_commands(&self) -> Option<&dyn CommandsProvider> {
        Some(self)
    }

    fn as_helpers(&self) -> Option<&dyn HelpersProvider> {
        Some(self)
    }

    fn as_plugin(&self) -> Option<&dyn PluginProvider> {
        Some(self)
    }
}

impl PluginProvider for TextCommandsExtension {
    fn create_plugin(&self) -> Plugin {
        let max_length = self.max_length.clone();
        Plugin::new(MAX_LENGTH_PLUGIN_KEY).with_filter(Rc::new(move |tr: &Transaction, _state: &EditorState| {
            match max_length.get() {
                Some(max) if tr.doc_changed() => tr.doc().text_content().chars().count() <= max,
                _ => true,
            }
        }))
    }
}

impl CommandsProvider for TextCommandsExtension {
    fn create_commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("insertText", |props, args| {
                let text = args::string("insertText", args, 0)?;
                if props.can_dispatch() {
                    props.tr().insert_text(text)?;
                    props.dispatch();
                }
                Ok(true)
            }),
            CommandSpec::new("deleteSelection", |props, _args| {
                let selection = props.transaction().selection();
                if selection.is_empty() {
                    return Ok(false);
                }
                if props.can_dispatch() {
                    props.tr().delete(selection.from(), selection.to())?;
                    props.dispatch();
                }
                Ok(true)
            }),
            CommandSpec::new("selectText", |props, args| {
                let anchor = args::position("selectText", args, 0)?;
                let head = args
                    .get(1)
                    .map(|_| args::position("selectText", args, 1))
                    .transpose()?
                    .unwrap_or(anchor);
                let size = props.transaction().doc().content_size();
                if anchor > size || head > size {
                    return Ok(false);
                }
                if props.can_dispatch() {
                    props.tr().set_selection(Selection::new(anchor, head));
                    props.dispatch();
                }
                Ok(true)
            }),
            CommandSpec::new("selectAll", |props, _args| {
                let size = props.transaction().doc().content_size();
                if props.can_dispatch() {
                    props.tr().set_selection(Selection::new(0, size));
                    props.dispatch();
                }
                Ok(true)
            }),
        ]
    }
}

impl HelpersProvider for TextCommandsExtension {
    fn create_helpers(&self) -> Vec<HelperSpec> {
        vec![
            HelperSpec::new("getText", |state, _args| Ok(json!(state.doc().text_content()))),
            HelperSpec::new("getTextLength", |state, _args| {
                Ok(json!(state.doc().text_content().chars().count()))
            }),
            HelperSpec::new("getSelection", |state, _args| {
                let selection = state.selection();
                Ok(json!({ "anchor": selection.anchor, "head": selection.head }))
            }),
        ]
    }
}
