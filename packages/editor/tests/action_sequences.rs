//! Tests for longer action sequences through the event-action handler
//!
//! This tests:
//! - Move + insert + delete chains
//! - Undo/redo sequences with a bounded history
//! - Rejected actions leaving state untouched
//! - Structural integrity after every step

use pagebuilder_editor::{
    reduce, Action, ActionError, ActionEvent, Document, ElementId, EventActionHandler,
    HistoryTracker, Page, PageElement, PageState,
};
use serde_json::json;

fn page() -> Page {
    Page {
        id: "landing#0001".to_string(),
        title: "Landing".to_string(),
        url: "/landing".to_string(),
        version: 1,
        status: Default::default(),
        saved_on: None,
        content: Some(PageElement::new("doc", "document").with_children(vec![
            PageElement::new("row", "row").with_children(vec![
                PageElement::new("col-a", "column"),
                PageElement::new("col-b", "column"),
            ]),
        ])),
    }
}

fn handler(max_levels: usize) -> EventActionHandler {
    let document = Document::from_page(page()).unwrap();
    EventActionHandler::new(document, HistoryTracker::with_max_levels(max_levels))
}

fn children(state: &PageState, id: &str) -> Vec<String> {
    state
        .elements
        .get(&ElementId::new(id))
        .unwrap()
        .elements
        .iter()
        .map(|id| id.to_string())
        .collect()
}

#[test]
fn test_move_then_delete_sequence() {
    let mut handler = handler(100);

    handler
        .trigger(ActionEvent::new(Action::MoveElement {
            id: "col-b".into(),
            new_parent_id: "col-a".into(),
            index: 0,
        }))
        .unwrap();
    assert_eq!(children(handler.state(), "col-a"), vec!["col-b"]);

    handler
        .trigger(ActionEvent::new(Action::DeleteElement { id: "col-a".into() }))
        .unwrap();
    assert!(!handler.state().elements.contains(&"col-b".into()));
    handler.state().elements.validate().unwrap();

    handler.undo().unwrap();
    assert_eq!(children(handler.state(), "col-a"), vec!["col-b"]);

    handler.undo().unwrap();
    assert_eq!(children(handler.state(), "row"), vec!["col-a", "col-b"]);
    handler.state().elements.validate().unwrap();
}

#[test]
fn test_repeated_updates_with_undo_redo() {
    let mut handler = handler(100);

    for i in 1..=5 {
        handler
            .trigger(ActionEvent::new(Action::UpdatePage {
                title: Some(format!("v{}", i)),
                url: None,
            }))
            .unwrap();
    }
    assert_eq!(handler.history().undo_levels(), 5);

    for _ in 0..5 {
        assert!(handler.undo().unwrap());
    }
    assert_eq!(handler.state().page.title, "Landing");
    assert_eq!(handler.history().redo_levels(), 5);

    for _ in 0..5 {
        assert!(handler.redo().unwrap());
    }
    assert_eq!(handler.state().page.title, "v5");

    for _ in 0..3 {
        handler.undo().unwrap();
    }
    assert_eq!(handler.history().redo_levels(), 3);

    handler
        .trigger(ActionEvent::new(Action::UpdatePage {
            title: Some("new branch".to_string()),
            url: None,
        }))
        .unwrap();
    assert_eq!(handler.history().redo_levels(), 0);
    assert_eq!(handler.history().undo_levels(), 3);
}

#[test]
fn test_history_drops_oldest_levels() {
    let mut handler = handler(3);

    for i in 1..=5 {
        handler
            .trigger(ActionEvent::new(Action::UpdatePage {
                title: None,
                url: Some(format!("/v{}", i)),
            }))
            .unwrap();
    }
    assert_eq!(handler.history().undo_levels(), 3);

    while handler.undo().unwrap() {}
    assert_eq!(handler.state().page.url, "/v2");
}

#[test]
fn test_rejected_actions() {
    let state = Document::from_page(page()).unwrap().state().clone();

    let cases = vec![
        (
            Action::MoveElement {
                id: "row".into(),
                new_parent_id: "col-a".into(),
                index: 0,
            },
            "cycle",
        ),
        (Action::DeleteElement { id: "doc".into() }, "root"),
        (
            Action::InsertElement {
                parent_id: "nowhere".into(),
                index: 0,
                element: PageElement::new("x", "text"),
            },
            "parent",
        ),
        (
            Action::InsertElement {
                parent_id: "col-a".into(),
                index: 0,
                element: PageElement::new("col-b", "text"),
            },
            "duplicate",
        ),
    ];

    for (action, case) in cases {
        let err = reduce(&state, &action).unwrap_err();
        let expected = match case {
            "cycle" => matches!(err, ActionError::CycleDetected { .. }),
            "root" => matches!(err, ActionError::RootRemoval(_)),
            "parent" => matches!(err, ActionError::ParentNotFound(_)),
            "duplicate" => matches!(err, ActionError::DuplicateElement(_)),
            _ => false,
        };
        assert!(expected, "{}: unexpected error {:?}", case, err);
    }
}

#[test]
fn test_reduce_leaves_input_untouched() {
    let state = Document::from_page(page()).unwrap().state().clone();
    let snapshot = state.clone();

    let (next, change) = reduce(
        &state,
        &Action::InsertElement {
            parent_id: "col-a".into(),
            index: 0,
            element: PageElement::new("hero", "image").with_data(json!({ "src": "hero.png" })),
        },
    )
    .unwrap();

    assert_eq!(state, snapshot);
    assert!(next.elements.contains(&"hero".into()));
    assert!(change.elements.contains(&ElementId::new("col-a")));
}
