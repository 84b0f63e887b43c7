//! # History Tracker
//!
//! Records committed action events for undo/redo.
//!
//! ## Design
//!
//! - Each recorded event stores its inverse, computed before it was applied
//! - Undo applies the inverses and moves the entry to the redo stack
//! - Redo reapplies the original actions
//! - New entries clear the redo stack (history is linear, never branching)
//! - Events flagged `merge` coalesce into the previous entry for the same target
//! - Batches group several events into one entry; nested batches fold into
//!   the outermost one
//!
//! Tracking starts disabled and is switched on once the first page with content
//! is loaded. It is never switched off again within a session; events committed
//! while it is disabled are applied but not recorded.
//!
//! Undo and redo are all-or-nothing: the inverses run against a copy of the
//! state and the copy is committed only if every one of them applied.

use tracing::{debug, trace};

use crate::actions::{Action, ActionError, ActionEvent, StateChange};
use crate::document::Document;
use crate::store::ElementId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Disabled,
    Enabled,
}

/// One undo step
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Element the entry is about (None for page-level or mixed batches)
    pub target: Option<ElementId>,

    /// Actions in application order
    pub actions: Vec<Action>,

    /// Inverse actions in undo order
    pub inverses: Vec<Action>,

    pub description: Option<String>,

    mergeable: bool,
}

impl HistoryEntry {
    fn single(event: &ActionEvent, inverse: Action) -> Self {
        Self {
            target: event.action().target().cloned(),
            actions: vec![event.action().clone()],
            inverses: vec![inverse],
            description: None,
            mergeable: event.merge(),
        }
    }

    fn batch(description: Option<String>) -> Self {
        Self {
            target: None,
            actions: Vec::new(),
            inverses: Vec::new(),
            description,
            mergeable: false,
        }
    }
}

/// What happened to an event handed to [`HistoryTracker::record`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// Tracking disabled or the event opted out of history
    Skipped,
    /// Pushed as a new entry
    Appended,
    /// Coalesced into the previous entry
    Merged,
    /// Added to the open batch
    Batched,
}

/// Undo/redo history for one editor session
#[derive(Debug)]
pub struct HistoryTracker {
    tracking: TrackingState,

    /// Applied entries (most recent last)
    undo_stack: Vec<HistoryEntry>,

    /// Undone entries (most recent last)
    redo_stack: Vec<HistoryEntry>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    current_batch: Option<HistoryEntry>,

    /// Open `begin_batch` calls not yet matched by `end_batch`
    batch_depth: usize,

    /// Top entry may still absorb merge events (cleared by undo/redo)
    merge_open: bool,
}

impl HistoryTracker {
    /// Create a tracker with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            tracking: TrackingState::Disabled,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            current_batch: None,
            batch_depth: 0,
            merge_open: false,
        }
    }

    pub fn tracking(&self) -> TrackingState {
        self.tracking
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking == TrackingState::Enabled
    }

    /// Start recording. One-way for the lifetime of the tracker.
    pub fn enable(&mut self) {
        if self.tracking == TrackingState::Disabled {
            debug!("history tracking enabled");
            self.tracking = TrackingState::Enabled;
        }
    }

    /// Record a committed event with the inverse computed before it applied
    pub fn record(&mut self, event: &ActionEvent, inverse: Action) -> Recorded {
        if !self.is_tracking() || !event.history() {
            return Recorded::Skipped;
        }

        if let Some(batch) = &mut self.current_batch {
            batch.actions.push(event.action().clone());
            batch.inverses.insert(0, inverse);
            self.redo_stack.clear();
            return Recorded::Batched;
        }

        if event.merge() && self.merge_open {
            if let Some(top) = self.undo_stack.last_mut() {
                if top.mergeable && top.target.as_ref() == event.action().target() {
                    top.actions.push(event.action().clone());
                    top.inverses.insert(0, inverse);
                    trace!(element = ?top.target, steps = top.actions.len(), "merged history entry");
                    return Recorded::Merged;
                }
            }
        }

        self.push_entry(HistoryEntry::single(event, inverse));
        self.merge_open = event.merge();
        Recorded::Appended
    }

    /// Start a batch (all events until the matching `end_batch` undo as one step).
    ///
    /// A batch opened inside another one joins it; the outer description wins.
    pub fn begin_batch(&mut self, description: Option<String>) {
        if self.current_batch.is_none() {
            self.current_batch = Some(HistoryEntry::batch(description));
        }
        self.batch_depth += 1;
    }

    /// Close one level of batching. The outermost `end_batch` pushes the
    /// batch if it recorded anything; without an open batch this is a no-op.
    pub fn end_batch(&mut self) {
        match self.batch_depth {
            0 => {}
            1 => self.flush_batch(),
            _ => self.batch_depth -= 1,
        }
    }

    /// Close every open batch level at once
    fn flush_batch(&mut self) {
        self.batch_depth = 0;
        if let Some(batch) = self.current_batch.take() {
            if !batch.actions.is_empty() {
                trace!(steps = batch.actions.len(), "closed history batch");
                self.push_entry(batch);
                self.merge_open = false;
            }
        }
    }

    pub fn is_batching(&self) -> bool {
        self.current_batch.is_some()
    }

    fn push_entry(&mut self, entry: HistoryEntry) {
        self.undo_stack.push(entry);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        self.redo_stack.clear();
    }

    /// Undo the most recent entry.
    ///
    /// Returns the touched slices, or `None` when there is nothing to undo.
    pub fn undo(&mut self, document: &mut Document) -> Result<Option<StateChange>, ActionError> {
        self.flush_batch();

        let Some(entry) = self.undo_stack.last() else {
            return Ok(None);
        };

        let change = Self::replay(document, &entry.inverses)?;

        if let Some(entry) = self.undo_stack.pop() {
            self.redo_stack.push(entry);
        }
        self.merge_open = false;

        Ok(Some(change))
    }

    /// Redo the most recently undone entry
    pub fn redo(&mut self, document: &mut Document) -> Result<Option<StateChange>, ActionError> {
        self.flush_batch();

        let Some(entry) = self.redo_stack.last() else {
            return Ok(None);
        };

        let change = Self::replay(document, &entry.actions)?;

        if let Some(entry) = self.redo_stack.pop() {
            self.undo_stack.push(entry);
        }
        self.merge_open = false;

        Ok(Some(change))
    }

    fn replay(document: &mut Document, actions: &[Action]) -> Result<StateChange, ActionError> {
        let mut state = document.state().clone();
        let mut change = StateChange::default();

        for action in actions {
            change.extend(action.apply(&mut state)?);
        }

        document.commit(state);
        Ok(change)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.undo_stack
    }

    /// Clear all undo/redo history (tracking state is kept)
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_batch = None;
        self.batch_depth = 0;
        self.merge_open = false;
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }
}

impl Default for HistoryTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Page;
    use crate::store::Element;
    use serde_json::json;

    fn document() -> Document {
        let page: Page = serde_json::from_value(json!({
            "id": "page-1",
            "content": {
                "id": "doc",
                "type": "document",
                "elements": [
                    { "id": "btn", "type": "button", "data": { "buttonText": "Click me" } }
                ]
            }
        }))
        .unwrap();
        Document::from_page(page).unwrap()
    }

    fn set_text(text: &str) -> Action {
        Action::UpdateElement {
            element: Element::new("btn", "button").with_data(json!({ "buttonText": text })),
        }
    }

    /// Commit an event the way the handler does: inverse, apply, record
    fn commit(history: &mut HistoryTracker, doc: &mut Document, event: ActionEvent) -> Recorded {
        let inverse = event.action().to_inverse(doc.state()).unwrap();
        let mut state = doc.state().clone();
        event.action().apply(&mut state).unwrap();
        doc.commit(state);
        history.record(&event, inverse)
    }

    fn button_text(doc: &Document) -> String {
        doc.state().elements.get(&"btn".into()).unwrap().data["buttonText"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_tracker_creation() {
        let history = HistoryTracker::new();
        assert_eq!(history.tracking(), TrackingState::Disabled);
        assert_eq!(history.undo_levels(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_disabled_tracking_skips_events() {
        let mut doc = document();
        let mut history = HistoryTracker::new();

        let recorded = commit(&mut history, &mut doc, ActionEvent::new(set_text("Buy")));

        assert_eq!(recorded, Recorded::Skipped);
        assert_eq!(button_text(&doc), "Buy");
        assert!(!history.can_undo());
    }

    #[test]
    fn test_history_false_is_not_recorded() {
        let mut doc = document();
        let mut history = HistoryTracker::new();
        history.enable();

        let event = ActionEvent::new(set_text("Buy")).with_history(false);
        assert_eq!(commit(&mut history, &mut doc, event), Recorded::Skipped);
        assert_eq!(history.undo_levels(), 0);
    }

    #[test]
    fn test_apply_undo_redo() {
        let mut doc = document();
        let mut history = HistoryTracker::new();
        history.enable();

        commit(&mut history, &mut doc, ActionEvent::new(set_text("Buy")));
        assert_eq!(history.undo_levels(), 1);

        let change = history.undo(&mut doc).unwrap();
        assert_eq!(change, Some(StateChange::element("btn".into())));
        assert_eq!(button_text(&doc), "Click me");
        assert_eq!(history.redo_levels(), 1);

        history.redo(&mut doc).unwrap();
        assert_eq!(button_text(&doc), "Buy");
        assert_eq!(history.undo_levels(), 1);
        assert_eq!(history.redo_levels(), 0);
    }

    #[test]
    fn test_boundaries_are_noops() {
        let mut doc = document();
        let mut history = HistoryTracker::new();
        history.enable();

        assert_eq!(history.undo(&mut doc).unwrap(), None);
        assert_eq!(history.redo(&mut doc).unwrap(), None);
        assert_eq!(doc.version, 0);
    }

    #[test]
    fn test_merge_coalesces_same_target() {
        let mut doc = document();
        let mut history = HistoryTracker::new();
        history.enable();

        let first = commit(&mut history, &mut doc, ActionEvent::new(set_text("B")).merging());
        let second = commit(&mut history, &mut doc, ActionEvent::new(set_text("Bu")).merging());
        let third = commit(&mut history, &mut doc, ActionEvent::new(set_text("Buy")).merging());

        assert_eq!(first, Recorded::Appended);
        assert_eq!(second, Recorded::Merged);
        assert_eq!(third, Recorded::Merged);
        assert_eq!(history.undo_levels(), 1);

        history.undo(&mut doc).unwrap();
        assert_eq!(button_text(&doc), "Click me");

        history.redo(&mut doc).unwrap();
        assert_eq!(button_text(&doc), "Buy");
    }

    #[test]
    fn test_merge_does_not_cross_undo() {
        let mut doc = document();
        let mut history = HistoryTracker::new();
        history.enable();

        commit(&mut history, &mut doc, ActionEvent::new(set_text("A")).merging());
        commit(&mut history, &mut doc, ActionEvent::new(set_text("B")).merging());
        history.undo(&mut doc).unwrap();

        let recorded = commit(&mut history, &mut doc, ActionEvent::new(set_text("C")).merging());
        assert_eq!(recorded, Recorded::Appended);
        assert_eq!(history.undo_levels(), 1);
        assert_eq!(history.redo_levels(), 0);
    }

    #[test]
    fn test_unflagged_event_does_not_merge() {
        let mut doc = document();
        let mut history = HistoryTracker::new();
        history.enable();

        commit(&mut history, &mut doc, ActionEvent::new(set_text("A")).merging());
        let recorded = commit(&mut history, &mut doc, ActionEvent::new(set_text("B")));

        assert_eq!(recorded, Recorded::Appended);
        assert_eq!(history.undo_levels(), 2);
    }

    #[test]
    fn test_batched_events() {
        let mut doc = document();
        let mut history = HistoryTracker::new();
        history.enable();

        history.begin_batch(Some("Rename button".to_string()));
        commit(&mut history, &mut doc, ActionEvent::new(set_text("One")));
        commit(&mut history, &mut doc, ActionEvent::new(set_text("Two")));
        history.end_batch();

        assert_eq!(history.undo_levels(), 1);
        assert_eq!(history.undo_description(), Some("Rename button"));

        history.undo(&mut doc).unwrap();
        assert_eq!(button_text(&doc), "Click me");
        assert_eq!(history.redo_description(), Some("Rename button"));
    }

    #[test]
    fn test_batched_event_clears_redo() {
        let mut doc = document();
        let mut history = HistoryTracker::new();
        history.enable();

        commit(&mut history, &mut doc, ActionEvent::new(set_text("x")));
        history.undo(&mut doc).unwrap();
        assert!(history.can_redo());

        history.begin_batch(Some("Retype".to_string()));
        let recorded = commit(&mut history, &mut doc, ActionEvent::new(set_text("y")));
        assert_eq!(recorded, Recorded::Batched);
        assert!(!history.can_redo());

        assert_eq!(history.redo(&mut doc).unwrap(), None);
        assert_eq!(button_text(&doc), "y");

        // redo closed the open batch, so it is undoable on its own
        assert!(!history.is_batching());
        history.undo(&mut doc).unwrap();
        assert_eq!(button_text(&doc), "Click me");
        assert!(!history.can_undo());
    }

    #[test]
    fn test_nested_batches_fold_into_outer() {
        let mut doc = document();
        let mut history = HistoryTracker::new();
        history.enable();

        history.begin_batch(Some("one".to_string()));
        commit(&mut history, &mut doc, ActionEvent::new(set_text("b")));
        history.begin_batch(Some("two".to_string()));
        commit(&mut history, &mut doc, ActionEvent::new(set_text("c")));
        history.end_batch();

        assert!(history.is_batching());
        assert_eq!(history.undo_levels(), 0);

        history.end_batch();
        assert!(!history.is_batching());
        assert_eq!(history.undo_levels(), 1);
        assert_eq!(history.undo_description(), Some("one"));

        while history.undo(&mut doc).unwrap().is_some() {}
        assert_eq!(button_text(&doc), "Click me");
    }

    #[test]
    fn test_undo_inside_nested_batch_keeps_every_event() {
        let mut doc = document();
        let mut history = HistoryTracker::new();
        history.enable();

        history.begin_batch(Some("one".to_string()));
        commit(&mut history, &mut doc, ActionEvent::new(set_text("b")));
        history.begin_batch(Some("two".to_string()));
        commit(&mut history, &mut doc, ActionEvent::new(set_text("c")));

        while history.undo(&mut doc).unwrap().is_some() {}
        assert_eq!(button_text(&doc), "Click me");
        assert!(!history.is_batching());

        // the batch levels were all closed by undo
        history.end_batch();
        history.end_batch();
        assert_eq!(history.undo_levels(), 0);
        assert_eq!(history.redo_levels(), 1);
    }

    #[test]
    fn test_end_batch_without_batch_is_noop() {
        let mut doc = document();
        let mut history = HistoryTracker::new();
        history.enable();

        commit(&mut history, &mut doc, ActionEvent::new(set_text("A")));
        history.end_batch();

        assert!(!history.is_batching());
        assert_eq!(history.undo_levels(), 1);

        let recorded = commit(&mut history, &mut doc, ActionEvent::new(set_text("B")));
        assert_eq!(recorded, Recorded::Appended);
        assert_eq!(history.undo_levels(), 2);
    }

    #[test]
    fn test_new_entry_clears_redo() {
        let mut doc = document();
        let mut history = HistoryTracker::new();
        history.enable();

        commit(&mut history, &mut doc, ActionEvent::new(set_text("A")));
        history.undo(&mut doc).unwrap();
        assert_eq!(history.redo_levels(), 1);

        commit(&mut history, &mut doc, ActionEvent::new(set_text("B")));
        assert_eq!(history.redo_levels(), 0);
    }

    #[test]
    fn test_max_levels_enforced() {
        let mut doc = document();
        let mut history = HistoryTracker::with_max_levels(2);
        history.enable();

        for i in 0..3 {
            commit(&mut history, &mut doc, ActionEvent::new(set_text(&format!("Text {}", i))));
        }

        assert_eq!(history.undo_levels(), 2);
    }

    #[test]
    fn test_failed_undo_leaves_state_and_stack() {
        let mut doc = document();
        let mut history = HistoryTracker::new();
        history.enable();

        commit(&mut history, &mut doc, ActionEvent::new(set_text("A")));

        // Remove the button outside of history so the inverse has no target
        let delete = ActionEvent::new(Action::DeleteElement { id: "btn".into() }).with_history(false);
        commit(&mut history, &mut doc, delete);
        let version = doc.version;

        let result = history.undo(&mut doc);
        assert_eq!(result, Err(ActionError::ElementNotFound("btn".into())));
        assert_eq!(history.undo_levels(), 1);
        assert_eq!(doc.version, version);
    }
}
