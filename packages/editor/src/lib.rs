//! # Page Builder Editor
//!
//! Core editing engine for page builder pages.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Page JSON (nested content tree)             │
//! └─────────────────────────────────────────────┘
//!                     ↓ flatten
//! ┌─────────────────────────────────────────────┐
//! │ Document: page metadata + ElementStore      │
//! └─────────────────────────────────────────────┘
//!                     ↑ trigger(ActionEvent)
//! ┌─────────────────────────────────────────────┐
//! │ EventActionHandler                          │
//! │  - validate + reduce                        │
//! │  - HistoryTracker (undo/redo, merge)        │
//! │  - observers by state slice                 │
//! │  - action listeners from plugins            │
//! └─────────────────────────────────────────────┘
//!                     ↑ mount / unmount
//! ┌─────────────────────────────────────────────┐
//! │ Editor + PluginRegistry                     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Actions are the only way in**: every change is an `ActionEvent`
//! 2. **Fail fast**: an event aimed at a missing element changes nothing
//! 3. **Linear history**: a new commit after undo drops the redo stack
//! 4. **Explicit plugins**: the registry is passed in, never global
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagebuilder_editor::{Action, ActionEvent, Editor, EditorConfig, PluginRegistry};
//!
//! let mut editor = Editor::mount(page, Arc::new(PluginRegistry::new()), &EditorConfig::default())?;
//!
//! editor.trigger(ActionEvent::new(Action::UpdateElement { element }).merging())?;
//! editor.undo()?;
//!
//! let document = editor.unmount()?;
//! ```

mod actions;
mod config;
mod document;
mod editor;
mod errors;
mod handler;
mod history;
mod keys;
mod plugins;
mod store;

pub use actions::{reduce, Action, ActionError, ActionEvent, ActionKind, StateChange};
pub use config::{EditorConfig, HistoryConfig};
pub use document::{Document, DocumentStorage, Page, PageMeta, PageState, PageStatus};
pub use editor::{Editor, UiState};
pub use errors::EditorError;
pub use handler::{
    ActionListener, EventActionHandler, ListenerId, Observer, Slice, SubscriptionId,
    TriggerOutcome,
};
pub use history::{HistoryEntry, HistoryTracker, Recorded, TrackingState};
pub use keys::{normalize_combo, EditorCommand, KeyBindings, KeyOutcome};
pub use plugins::{
    register_plugins, unregister_plugins, Capability, EditorPlugin, ElementTypePlugin,
    EventActionPlugin, MountedPlugins, PluginError, PluginRegistry, Teardown,
    EVENT_ACTION_PLUGIN, PAGE_ELEMENT_PLUGIN,
};
pub use store::{
    Element, ElementId, ElementStore, ListMeta, ListPage, ListParams, PageElement, StoreError,
};
