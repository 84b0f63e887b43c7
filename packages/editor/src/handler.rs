//! # Event-Action Handler
//!
//! Single entry point for changing a page. `trigger` validates an event,
//! applies it to the document, records history, then tells everyone who cares.
//!
//! ```text
//! trigger(event)
//!   → inverse + reduce        (fails fast, nothing applied on error)
//!   → commit to Document
//!   → HistoryTracker::record
//!   → observers whose slice intersects the StateChange
//!   → action listeners registered for the event kind
//! ```
//!
//! `trigger` takes `&mut self`, so two events can never interleave their
//! changes. Observers and listeners receive shared references only and cannot
//! trigger from inside a notification.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::actions::{reduce, Action, ActionError, ActionEvent, ActionKind, StateChange};
use crate::document::{Document, Page, PageState};
use crate::history::{HistoryTracker, Recorded};
use crate::store::{ElementId, PageElement};
use crate::EditorError;

/// Handle returned by [`EventActionHandler::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Handle returned by [`EventActionHandler::on`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Part of the page state an observer watches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slice {
    /// One element (its data, type or child list)
    Element(ElementId),
    /// Page metadata
    Page,
    /// Any element
    AnyElement,
}

impl Slice {
    pub fn matches(&self, change: &StateChange) -> bool {
        match self {
            Slice::Element(id) => change.elements.contains(id),
            Slice::Page => change.page,
            Slice::AnyElement => !change.elements.is_empty(),
        }
    }
}

/// Notified after a committed change touching its slice
pub trait Observer: Send + Sync {
    fn on_change(&self, change: &StateChange);
}

impl<F> Observer for F
where
    F: Fn(&StateChange) + Send + Sync,
{
    fn on_change(&self, change: &StateChange) {
        self(change)
    }
}

/// Called after an event of the registered kind has been committed
pub trait ActionListener: Send + Sync {
    fn on_action(&self, event: &ActionEvent, state: &PageState);
}

impl<F> ActionListener for F
where
    F: Fn(&ActionEvent, &PageState) + Send + Sync,
{
    fn on_action(&self, event: &ActionEvent, state: &PageState) {
        self(event, state)
    }
}

/// Result of a successful trigger
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerOutcome {
    pub change: StateChange,
    pub recorded: Recorded,
    /// Document version after the commit
    pub version: u64,
}

pub struct EventActionHandler {
    document: Document,
    history: HistoryTracker,
    observers: Vec<(SubscriptionId, Slice, Arc<dyn Observer>)>,
    listeners: Vec<(ListenerId, ActionKind, Arc<dyn ActionListener>)>,
    /// Element types accepted by insert/update (empty = anything goes)
    element_types: HashSet<String>,
    next_id: u64,
}

impl EventActionHandler {
    /// Create a handler for a loaded document.
    ///
    /// History tracking is switched on if the document already has content.
    pub fn new(document: Document, history: HistoryTracker) -> Self {
        let mut handler = Self {
            document,
            history,
            observers: Vec::new(),
            listeners: Vec::new(),
            element_types: HashSet::new(),
            next_id: 0,
        };
        handler.track_if_loaded();
        handler
    }

    fn track_if_loaded(&mut self) {
        if self.document.has_content() && !self.history.is_tracking() {
            self.history.enable();
        }
    }

    /// Replace the page being edited.
    ///
    /// History recorded against the previous page is discarded.
    pub fn load_page(&mut self, page: Page) -> Result<(), EditorError> {
        let document = Document::from_page(page)?;
        self.document = document;
        self.history.clear();
        self.track_if_loaded();

        let mut change = StateChange::page();
        change.elements.extend(self.document.state().elements.document_order());
        self.notify(&change);
        Ok(())
    }

    /// Restrict insert/update to the given element types
    pub fn set_element_types<I, S>(&mut self, types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.element_types = types.into_iter().map(Into::into).collect();
    }

    /// Apply an event, record it, and notify observers
    #[instrument(level = "debug", skip_all, fields(kind = ?event.kind()))]
    pub fn trigger(&mut self, event: ActionEvent) -> Result<TriggerOutcome, EditorError> {
        let result = self.commit(&event);
        if let Err(e) = &result {
            warn!(error = %e, "action rejected");
        }
        let (change, recorded) = result?;

        self.notify(&change);
        for (_, kind, listener) in &self.listeners {
            if *kind == event.kind() {
                listener.on_action(&event, self.document.state());
            }
        }

        debug!(version = self.document.version, ?recorded, "action committed");
        Ok(TriggerOutcome {
            change,
            recorded,
            version: self.document.version,
        })
    }

    fn commit(&mut self, event: &ActionEvent) -> Result<(StateChange, Recorded), ActionError> {
        self.check_element_types(event.action())?;

        let state = self.document.state();
        let inverse = event.action().to_inverse(state)?;
        let (next, change) = reduce(state, event.action())?;

        self.document.commit(next);
        let recorded = self.history.record(event, inverse);
        Ok((change, recorded))
    }

    fn check_element_types(&self, action: &Action) -> Result<(), ActionError> {
        if self.element_types.is_empty() {
            return Ok(());
        }

        let check = |element_type: &str| {
            if self.element_types.contains(element_type) {
                Ok(())
            } else {
                Err(ActionError::UnknownElementType(element_type.to_string()))
            }
        };

        match action {
            Action::UpdateElement { element } => check(element.element_type.as_str()),
            Action::InsertElement { element, .. } => {
                fn walk(
                    node: &PageElement,
                    check: &dyn Fn(&str) -> Result<(), ActionError>,
                ) -> Result<(), ActionError> {
                    check(node.element_type.as_str())?;
                    node.elements.iter().try_for_each(|child| walk(child, check))
                }
                walk(element, &check)
            }
            _ => Ok(()),
        }
    }

    /// Undo the last history entry. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        match self.history.undo(&mut self.document)? {
            Some(change) => {
                debug!(version = self.document.version, "undo");
                self.notify(&change);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Redo the last undone entry. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool, EditorError> {
        match self.history.redo(&mut self.document)? {
            Some(change) => {
                debug!(version = self.document.version, "redo");
                self.notify(&change);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn begin_batch(&mut self, description: impl Into<String>) {
        self.history.begin_batch(Some(description.into()));
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch();
    }

    fn notify(&self, change: &StateChange) {
        for (_, slice, observer) in &self.observers {
            if slice.matches(change) {
                observer.on_change(change);
            }
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Watch a state slice
    pub fn subscribe(&mut self, slice: Slice, observer: impl Observer + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id());
        self.observers.push((id, slice, Arc::new(observer)));
        id
    }

    /// Stop watching. Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _, _)| *sub != id);
        self.observers.len() != before
    }

    /// Listen for committed events of one kind
    pub fn on(&mut self, kind: ActionKind, listener: impl ActionListener + 'static) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.listeners.push((id, kind, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _, _)| *listener != id);
        self.listeners.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn state(&self) -> &PageState {
        self.document.state()
    }

    pub fn history(&self) -> &HistoryTracker {
        &self.history
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Element;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn page(with_content: bool) -> Page {
        let mut value = json!({ "id": "page-1", "title": "Home", "url": "/home" });
        if with_content {
            value["content"] = json!({
                "id": "doc",
                "type": "document",
                "elements": [
                    { "id": "btn", "type": "button", "data": { "buttonText": "Click me" } },
                    { "id": "txt", "type": "text", "data": { "text": "Hello" } }
                ]
            });
        }
        serde_json::from_value(value).unwrap()
    }

    fn handler() -> EventActionHandler {
        EventActionHandler::new(Document::from_page(page(true)).unwrap(), HistoryTracker::new())
    }

    fn update(id: &str, element_type: &str, data: serde_json::Value) -> ActionEvent {
        ActionEvent::new(Action::UpdateElement {
            element: Element::new(id, element_type).with_data(data),
        })
    }

    #[test]
    fn test_tracking_enabled_for_loaded_content() {
        assert!(handler().history().is_tracking());

        let empty =
            EventActionHandler::new(Document::from_page(page(false)).unwrap(), HistoryTracker::new());
        assert!(!empty.history().is_tracking());
    }

    #[test]
    fn test_load_page_enables_tracking_once() {
        let mut handler =
            EventActionHandler::new(Document::from_page(page(false)).unwrap(), HistoryTracker::new());

        handler.load_page(page(true)).unwrap();
        assert!(handler.history().is_tracking());

        handler.load_page(page(false)).unwrap();
        assert!(handler.history().is_tracking());
    }

    #[test]
    fn test_trigger_notifies_matching_slices_only() {
        let mut handler = handler();
        let btn_calls = Arc::new(AtomicUsize::new(0));
        let txt_calls = Arc::new(AtomicUsize::new(0));
        let page_calls = Arc::new(AtomicUsize::new(0));

        let counter = btn_calls.clone();
        handler.subscribe(Slice::Element("btn".into()), move |_: &StateChange| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = txt_calls.clone();
        handler.subscribe(Slice::Element("txt".into()), move |_: &StateChange| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = page_calls.clone();
        handler.subscribe(Slice::Page, move |_: &StateChange| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        handler
            .trigger(update("btn", "button", json!({ "buttonText": "Buy" })))
            .unwrap();

        assert_eq!(btn_calls.load(Ordering::SeqCst), 1);
        assert_eq!(txt_calls.load(Ordering::SeqCst), 0);
        assert_eq!(page_calls.load(Ordering::SeqCst), 0);

        handler.undo().unwrap();
        assert_eq!(btn_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_missing_element_fails_fast() {
        let mut handler = handler();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        handler.subscribe(Slice::AnyElement, move |_: &StateChange| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let before = handler.state().clone();

        let result = handler.trigger(update("ghost", "button", json!({})));

        assert!(matches!(
            result,
            Err(EditorError::Action(ActionError::ElementNotFound(_)))
        ));
        assert_eq!(handler.state(), &before);
        assert_eq!(handler.document().version, 0);
        assert_eq!(handler.history().undo_levels(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_listeners_receive_committed_state() {
        let mut handler = handler();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = seen.clone();
        handler.on(ActionKind::UpdatePage, move |_: &ActionEvent, state: &PageState| {
            log.lock().unwrap().push(state.page.title.clone());
        });

        handler
            .trigger(ActionEvent::new(Action::UpdatePage {
                title: Some("About".to_string()),
                url: None,
            }))
            .unwrap();
        handler
            .trigger(update("btn", "button", json!({ "buttonText": "Buy" })))
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["About".to_string()]);
    }

    #[test]
    fn test_unsubscribe_and_off() {
        let mut handler = handler();
        let sub = handler.subscribe(Slice::Page, |_: &StateChange| {});
        let listener = handler.on(ActionKind::MoveElement, |_: &ActionEvent, _: &PageState| {});

        assert!(handler.unsubscribe(sub));
        assert!(!handler.unsubscribe(sub));
        assert!(handler.off(listener));
        assert_eq!(handler.observer_count(), 0);
        assert_eq!(handler.listener_count(), 0);
    }

    #[test]
    fn test_element_type_registry_rejects_unknown_types() {
        let mut handler = handler();
        handler.set_element_types(["document", "button", "text"]);

        let result = handler.trigger(ActionEvent::new(Action::InsertElement {
            parent_id: "doc".into(),
            index: 0,
            element: PageElement::new("vid", "video"),
        }));
        assert!(matches!(
            result,
            Err(EditorError::Action(ActionError::UnknownElementType(t))) if t == "video"
        ));

        handler
            .trigger(ActionEvent::new(Action::InsertElement {
                parent_id: "doc".into(),
                index: 0,
                element: PageElement::new("btn-2", "button"),
            }))
            .unwrap();
        assert!(handler.state().elements.contains(&"btn-2".into()));
    }

    #[test]
    fn test_trigger_outcome_reports_history() {
        let mut handler = handler();

        let first = handler
            .trigger(update("txt", "text", json!({ "text": "H" })).merging())
            .unwrap();
        let second = handler
            .trigger(update("txt", "text", json!({ "text": "He" })).merging())
            .unwrap();

        assert_eq!(first.recorded, Recorded::Appended);
        assert_eq!(second.recorded, Recorded::Merged);
        assert_eq!(second.version, 2);
    }
}
