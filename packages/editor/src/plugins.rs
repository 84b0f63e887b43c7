//! # Plugin Registry
//!
//! Extensions are registered on an explicit [`PluginRegistry`] that is handed to
//! the editor when it mounts. Each extension declares a capability:
//!
//! - `pb-editor-event-action-plugin`: hooks into the [`EventActionHandler`] at
//!   mount time (subscribing observers, adding action listeners) and cleans up at
//!   unmount time
//! - `pb-editor-page-element`: declares an element type the editor accepts
//!
//! ## Mount / unmount
//!
//! ```text
//! register_plugins(handler, registry)
//!   → every event-action plugin must have a unique, non-empty name
//!   → on_editor_mount(handler) per plugin, in registration order
//!   → MountedPlugins { name → Teardown }
//!
//! unregister_plugins(handler, registry, mounted)
//!   → on_editor_unmount(handler, teardown) per mounted name
//!     (the default hook just runs the teardown)
//! ```
//!
//! Names are checked before anything is mounted, so a bad registry never leaves
//! a half-mounted editor behind.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::handler::{EventActionHandler, ListenerId, SubscriptionId};

pub const EVENT_ACTION_PLUGIN: &str = "pb-editor-event-action-plugin";
pub const PAGE_ELEMENT_PLUGIN: &str = "pb-editor-page-element";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PluginError {
    #[error("All plugins with type \"{0}\" must have a name")]
    MissingName(&'static str),

    #[error("Plugin name \"{0}\" is registered more than once")]
    DuplicateName(String),

    #[error("Plugin \"{plugin}\" failed: {message}")]
    Hook { plugin: String, message: String },
}

impl PluginError {
    pub fn hook(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        PluginError::Hook {
            plugin: plugin.into(),
            message: message.into(),
        }
    }
}

/// Capability tag an extension is registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    EventAction,
    ElementType,
}

impl Capability {
    pub fn tag(&self) -> &'static str {
        match self {
            Capability::EventAction => EVENT_ACTION_PLUGIN,
            Capability::ElementType => PAGE_ELEMENT_PLUGIN,
        }
    }
}

/// Cleanup captured when a plugin mounts
pub struct Teardown(Box<dyn FnOnce(&mut EventActionHandler) + Send>);

impl Teardown {
    pub fn new(f: impl FnOnce(&mut EventActionHandler) + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    /// Nothing to clean up
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Remove an observer subscription
    pub fn unsubscribe(id: SubscriptionId) -> Self {
        Self::new(move |handler| {
            handler.unsubscribe(id);
        })
    }

    /// Remove an action listener
    pub fn off(id: ListenerId) -> Self {
        Self::new(move |handler| {
            handler.off(id);
        })
    }

    /// Run several teardowns in order
    pub fn all(teardowns: Vec<Teardown>) -> Self {
        Self::new(move |handler| {
            for teardown in teardowns {
                teardown.run(handler);
            }
        })
    }

    pub fn run(self, handler: &mut EventActionHandler) {
        (self.0)(handler)
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Teardown")
    }
}

/// Extension that hooks into the event-action handler
pub trait EventActionPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Attach to the handler, returning the cleanup to run at unmount
    fn on_editor_mount(&self, handler: &mut EventActionHandler) -> Result<Teardown, PluginError>;

    /// Detach from the handler. Plugins without their own unmount logic keep
    /// the default, which runs the teardown returned from mount.
    fn on_editor_unmount(
        &self,
        handler: &mut EventActionHandler,
        teardown: Teardown,
    ) -> Result<(), PluginError> {
        teardown.run(handler);
        Ok(())
    }
}

/// Element type accepted by the editor
#[derive(Debug, Clone, PartialEq)]
pub struct ElementTypePlugin {
    pub name: String,
    pub element_type: String,
    /// Data used when the element is created from the toolbar
    pub default_data: serde_json::Value,
}

impl ElementTypePlugin {
    pub fn new(element_type: impl Into<String>) -> Self {
        let element_type = element_type.into();
        Self {
            name: format!("{}-{}", PAGE_ELEMENT_PLUGIN, element_type),
            element_type,
            default_data: serde_json::Value::Null,
        }
    }

    pub fn with_default_data(mut self, data: serde_json::Value) -> Self {
        self.default_data = data;
        self
    }
}

/// A registered extension
#[derive(Clone)]
pub enum EditorPlugin {
    EventAction(Arc<dyn EventActionPlugin>),
    ElementType(ElementTypePlugin),
}

impl EditorPlugin {
    pub fn capability(&self) -> Capability {
        match self {
            EditorPlugin::EventAction(_) => Capability::EventAction,
            EditorPlugin::ElementType(_) => Capability::ElementType,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            EditorPlugin::EventAction(plugin) => plugin.name(),
            EditorPlugin::ElementType(plugin) => &plugin.name,
        }
    }
}

impl fmt::Debug for EditorPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorPlugin")
            .field("capability", &self.capability().tag())
            .field("name", &self.name())
            .finish()
    }
}

impl From<ElementTypePlugin> for EditorPlugin {
    fn from(plugin: ElementTypePlugin) -> Self {
        EditorPlugin::ElementType(plugin)
    }
}

impl<P: EventActionPlugin + 'static> From<Arc<P>> for EditorPlugin {
    fn from(plugin: Arc<P>) -> Self {
        EditorPlugin::EventAction(plugin)
    }
}

/// Insertion-ordered set of extensions, looked up by capability or name
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<EditorPlugin>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: impl Into<EditorPlugin>) {
        self.plugins.push(plugin.into());
    }

    pub fn with(mut self, plugin: impl Into<EditorPlugin>) -> Self {
        self.register(plugin);
        self
    }

    pub fn by_capability(&self, capability: Capability) -> impl Iterator<Item = &EditorPlugin> {
        self.plugins
            .iter()
            .filter(move |p| p.capability() == capability)
    }

    pub fn event_action_plugins(&self) -> impl Iterator<Item = &Arc<dyn EventActionPlugin>> {
        self.plugins.iter().filter_map(|p| match p {
            EditorPlugin::EventAction(plugin) => Some(plugin),
            _ => None,
        })
    }

    pub fn element_types(&self) -> impl Iterator<Item = &ElementTypePlugin> {
        self.plugins.iter().filter_map(|p| match p {
            EditorPlugin::ElementType(plugin) => Some(plugin),
            _ => None,
        })
    }

    /// First plugin registered under `name`
    pub fn by_name(&self, name: &str) -> Option<&EditorPlugin> {
        self.plugins.iter().find(|p| p.name() == name)
    }

    fn event_action_by_name(&self, name: &str) -> Option<&Arc<dyn EventActionPlugin>> {
        self.event_action_plugins().find(|p| p.name() == name)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Plugins mounted on one handler, with their teardowns
#[derive(Debug, Default)]
pub struct MountedPlugins {
    entries: Vec<(String, Teardown)>,
}

impl MountedPlugins {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Mount every event-action plugin on the handler.
///
/// Fails with `MissingName` or `DuplicateName` before mounting anything. If a
/// mount hook fails, plugins mounted so far are unmounted again and the hook's
/// error is returned.
pub fn register_plugins(
    handler: &mut EventActionHandler,
    registry: &PluginRegistry,
) -> Result<MountedPlugins, PluginError> {
    let plugins: Vec<&Arc<dyn EventActionPlugin>> = registry.event_action_plugins().collect();

    let mut names = HashSet::new();
    for plugin in &plugins {
        let name = plugin.name();
        if name.trim().is_empty() {
            return Err(PluginError::MissingName(EVENT_ACTION_PLUGIN));
        }
        if !names.insert(name) {
            return Err(PluginError::DuplicateName(name.to_string()));
        }
    }

    let mut mounted = MountedPlugins::default();
    for plugin in plugins {
        match plugin.on_editor_mount(handler) {
            Ok(teardown) => {
                debug!(plugin = plugin.name(), "plugin mounted");
                mounted.entries.push((plugin.name().to_string(), teardown));
            }
            Err(e) => {
                warn!(plugin = plugin.name(), error = %e, "plugin mount failed, rolling back");
                if let Err(rollback) = unregister_plugins(handler, registry, mounted) {
                    warn!(error = %rollback, "rollback after failed mount also failed");
                }
                return Err(e);
            }
        }
    }

    Ok(mounted)
}

/// Unmount plugins captured by [`register_plugins`].
///
/// Every teardown is attempted; the first hook error is returned afterwards.
/// A name no longer present in the registry gets its teardown run directly.
pub fn unregister_plugins(
    handler: &mut EventActionHandler,
    registry: &PluginRegistry,
    mounted: MountedPlugins,
) -> Result<(), PluginError> {
    let mut first_error = None;

    for (name, teardown) in mounted.entries {
        let result = match registry.event_action_by_name(&name) {
            Some(plugin) => plugin.on_editor_unmount(handler, teardown),
            None => {
                teardown.run(handler);
                Ok(())
            }
        };

        match result {
            Ok(()) => debug!(plugin = %name, "plugin unmounted"),
            Err(e) => {
                warn!(plugin = %name, error = %e, "plugin unmount failed");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
