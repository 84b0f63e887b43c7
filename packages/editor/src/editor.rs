//! # Editor Lifecycle
//!
//! An [`Editor`] is one mounted editing session for one page:
//!
//! ```text
//! mount   → handler (document + history) → register plugins → tracking on
//! session → trigger / undo / redo / keyboard shortcuts
//! unmount → unregister plugins → Document handed back
//! ```
//!
//! `unmount` consumes the editor, so nothing can be triggered through a handler
//! whose plugins have been torn down.

use std::sync::Arc;

use tracing::info;

use crate::actions::ActionEvent;
use crate::config::EditorConfig;
use crate::document::{Document, Page, PageState};
use crate::handler::{EventActionHandler, TriggerOutcome};
use crate::history::HistoryTracker;
use crate::keys::{EditorCommand, KeyBindings, KeyOutcome};
use crate::plugins::{register_plugins, unregister_plugins, MountedPlugins, PluginRegistry};
use crate::EditorError;

/// Transient UI flags (never part of history)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiState {
    pub is_dragging: bool,
    pub is_resizing: bool,
    /// A rich-text editor has focus and owns undo/redo shortcuts
    pub text_editor_active: bool,
}

pub struct Editor {
    handler: EventActionHandler,
    plugins: Arc<PluginRegistry>,
    mounted: MountedPlugins,
    keys: KeyBindings,
    ui: UiState,
}

impl Editor {
    /// Mount an editor for a page
    pub fn mount(
        page: Page,
        plugins: Arc<PluginRegistry>,
        config: &EditorConfig,
    ) -> Result<Self, EditorError> {
        Self::mount_document(Document::from_page(page)?, plugins, config)
    }

    /// Mount an editor for an already loaded document (e.g. file-backed)
    pub fn mount_document(
        document: Document,
        plugins: Arc<PluginRegistry>,
        config: &EditorConfig,
    ) -> Result<Self, EditorError> {
        let page_id = document.state().page.id.clone();
        let history = HistoryTracker::with_max_levels(config.history.max_levels);
        let mut handler = EventActionHandler::new(document, history);

        let element_types: Vec<String> = plugins
            .element_types()
            .map(|p| p.element_type.clone())
            .collect();
        if !element_types.is_empty() {
            handler.set_element_types(element_types);
        }

        let mounted = register_plugins(&mut handler, &plugins)?;
        info!(page = %page_id, plugins = mounted.len(), "editor mounted");

        Ok(Self {
            handler,
            plugins,
            mounted,
            keys: config.key_bindings(),
            ui: UiState::default(),
        })
    }

    /// Tear down plugins and hand back the document
    pub fn unmount(self) -> Result<Document, EditorError> {
        let Self {
            mut handler,
            plugins,
            mounted,
            ..
        } = self;

        unregister_plugins(&mut handler, &plugins, mounted)?;
        info!(page = %handler.state().page.id, "editor unmounted");
        Ok(handler.into_document())
    }

    pub fn trigger(&mut self, event: ActionEvent) -> Result<TriggerOutcome, EditorError> {
        self.handler.trigger(event)
    }

    pub fn undo(&mut self) -> Result<bool, EditorError> {
        self.handler.undo()
    }

    pub fn redo(&mut self) -> Result<bool, EditorError> {
        self.handler.redo()
    }

    /// Group the following events into a single undo step
    pub fn begin_batch(&mut self, description: impl Into<String>) {
        self.handler.begin_batch(description);
    }

    pub fn end_batch(&mut self) {
        self.handler.end_batch();
    }

    /// Run the command bound to a key combo
    pub fn handle_key(&mut self, combo: &str) -> Result<KeyOutcome, EditorError> {
        let Some(command) = self.keys.get(combo) else {
            return Ok(KeyOutcome::Unbound);
        };

        if self.ui.text_editor_active {
            return Ok(KeyOutcome::Ignored);
        }

        let changed = match command {
            EditorCommand::Undo => self.undo()?,
            EditorCommand::Redo => self.redo()?,
        };
        Ok(KeyOutcome::Handled { command, changed })
    }

    pub fn set_text_editor_active(&mut self, active: bool) {
        self.ui.text_editor_active = active;
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.ui.is_dragging = dragging;
    }

    pub fn set_resizing(&mut self, resizing: bool) {
        self.ui.is_resizing = resizing;
    }

    pub fn ui(&self) -> UiState {
        self.ui
    }

    pub fn handler(&self) -> &EventActionHandler {
        &self.handler
    }

    /// Handler access for subscriptions made outside of plugins
    pub fn handler_mut(&mut self) -> &mut EventActionHandler {
        &mut self.handler
    }

    pub fn state(&self) -> &PageState {
        self.handler.state()
    }

    pub fn document(&self) -> &Document {
        self.handler.document()
    }

    pub fn mounted_plugins(&self) -> &MountedPlugins {
        &self.mounted
    }
}
