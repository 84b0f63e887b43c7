//! Keyboard shortcuts for editor commands.
//!
//! Combos are normalized so `Ctrl+Shift+Z`, `shift+cmd+z` and `mod+shift+z`
//! all address the same binding.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditorCommand {
    Undo,
    Redo,
}

/// What happened to a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Command ran; `changed` is false at a history boundary
    Handled { command: EditorCommand, changed: bool },
    /// A text editor has focus and keeps the shortcut for itself
    Ignored,
    /// No binding for this combo
    Unbound,
}

const MODIFIERS: [&str; 3] = ["mod", "shift", "alt"];

/// Canonical form: lowercase, `ctrl`/`cmd`/`meta` folded into `mod`,
/// modifiers in a fixed order, key last.
pub fn normalize_combo(combo: &str) -> String {
    let mut modifiers = Vec::new();
    let mut keys = Vec::new();

    for part in combo.split('+').map(|p| p.trim().to_lowercase()) {
        let part = if matches!(part.as_str(), "ctrl" | "control" | "cmd" | "command" | "meta") {
            "mod".to_string()
        } else if part == "option" {
            "alt".to_string()
        } else {
            part
        };
        if part.is_empty() {
            continue;
        }
        if MODIFIERS.contains(&part.as_str()) {
            if !modifiers.contains(&part) {
                modifiers.push(part);
            }
        } else {
            keys.push(part);
        }
    }

    modifiers.sort_by_key(|m| MODIFIERS.iter().position(|known| *known == m.as_str()));
    modifiers.extend(keys);
    modifiers.join("+")
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyBindings {
    bindings: HashMap<String, EditorCommand>,
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    pub fn bind(&mut self, combo: &str, command: EditorCommand) {
        self.bindings.insert(normalize_combo(combo), command);
    }

    pub fn unbind(&mut self, combo: &str) -> Option<EditorCommand> {
        self.bindings.remove(&normalize_combo(combo))
    }

    pub fn get(&self, combo: &str) -> Option<EditorCommand> {
        self.bindings.get(&normalize_combo(combo)).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self::empty();
        bindings.bind("mod+z", EditorCommand::Undo);
        bindings.bind("mod+shift+z", EditorCommand::Redo);
        bindings
    }
}
