//! # Action Events
//!
//! Every change to a page goes through an [`Action`], wrapped in an
//! [`ActionEvent`] that says how history should treat it.
//!
//! ## Action semantics
//!
//! ### UpdateElement
//! - Replaces `type` and `data` of an existing element
//! - The incoming child list is ignored; structure changes only via insert/move/delete
//!
//! ### InsertElement
//! - Inserts a whole subtree under a parent, index clamped to the child count
//! - Fails if any id in the subtree already exists
//!
//! ### MoveElement
//! - Detaches the element and re-inserts it at `index` of the new parent
//! - `index` is read after the element has been detached
//! - Fails if the target parent is the element itself or one of its descendants
//!
//! ### DeleteElement
//! - Removes the element and all descendants
//! - The root element cannot be deleted
//!
//! Targeting an id that does not exist is an error for every action. Nothing is
//! applied in that case.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::PageState;
use crate::store::{Element, ElementId, PageElement, StoreError};

/// Semantic page mutations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    /// Replace the type and data of an element
    #[serde(rename_all = "camelCase")]
    UpdateElement { element: Element },

    /// Insert a new subtree under `parent_id`
    #[serde(rename_all = "camelCase")]
    InsertElement {
        parent_id: ElementId,
        index: usize,
        element: PageElement,
    },

    /// Move an element to a new parent at index (drag and drop)
    #[serde(rename_all = "camelCase")]
    MoveElement {
        id: ElementId,
        new_parent_id: ElementId,
        index: usize,
    },

    /// Remove an element and its descendants
    #[serde(rename_all = "camelCase")]
    DeleteElement { id: ElementId },

    /// Update page metadata
    #[serde(rename_all = "camelCase")]
    UpdatePage {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
}

/// Discriminant of [`Action`], used to key action listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    UpdateElement,
    InsertElement,
    MoveElement,
    DeleteElement,
    UpdatePage,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),

    #[error("Parent not found: {0}")]
    ParentNotFound(ElementId),

    #[error("Element already exists: {0}")]
    DuplicateElement(ElementId),

    #[error("Would create cycle moving {id} into {parent}")]
    CycleDetected { id: ElementId, parent: ElementId },

    #[error("Cannot remove or move the root element {0}")]
    RootRemoval(ElementId),

    #[error("Unknown element type: {0}")]
    UnknownElementType(String),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
}

impl From<StoreError> for ActionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateId(id) => ActionError::DuplicateElement(id),
            other => ActionError::InvalidStructure(other.to_string()),
        }
    }
}

/// State slices touched by a committed change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateChange {
    /// Elements whose data or child list changed, added or removed
    pub elements: BTreeSet<ElementId>,

    /// Page metadata changed
    pub page: bool,
}

impl StateChange {
    pub fn element(id: ElementId) -> Self {
        let mut change = Self::default();
        change.elements.insert(id);
        change
    }

    pub fn page() -> Self {
        Self {
            elements: BTreeSet::new(),
            page: true,
        }
    }

    pub fn extend(&mut self, other: StateChange) {
        self.elements.extend(other.elements);
        self.page |= other.page;
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && !self.page
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::UpdateElement { .. } => ActionKind::UpdateElement,
            Action::InsertElement { .. } => ActionKind::InsertElement,
            Action::MoveElement { .. } => ActionKind::MoveElement,
            Action::DeleteElement { .. } => ActionKind::DeleteElement,
            Action::UpdatePage { .. } => ActionKind::UpdatePage,
        }
    }

    /// Element this action is about (used for history merging)
    pub fn target(&self) -> Option<&ElementId> {
        match self {
            Action::UpdateElement { element } => Some(&element.id),
            Action::InsertElement { element, .. } => Some(&element.id),
            Action::MoveElement { id, .. } | Action::DeleteElement { id } => Some(id),
            Action::UpdatePage { .. } => None,
        }
    }

    /// Validate without applying
    pub fn validate(&self, state: &PageState) -> Result<(), ActionError> {
        let store = &state.elements;

        match self {
            Action::UpdateElement { element } => {
                if !store.contains(&element.id) {
                    return Err(ActionError::ElementNotFound(element.id.clone()));
                }
                Ok(())
            }

            Action::InsertElement { parent_id, element, .. } => {
                if !store.contains(parent_id) {
                    return Err(ActionError::ParentNotFound(parent_id.clone()));
                }
                let mut seen = BTreeSet::new();
                for id in element.ids() {
                    if store.contains(&id) || !seen.insert(id.clone()) {
                        return Err(ActionError::DuplicateElement(id));
                    }
                }
                Ok(())
            }

            Action::MoveElement { id, new_parent_id, .. } => {
                if !store.contains(id) {
                    return Err(ActionError::ElementNotFound(id.clone()));
                }
                if !store.contains(new_parent_id) {
                    return Err(ActionError::ParentNotFound(new_parent_id.clone()));
                }
                if store.root() == Some(id) {
                    return Err(ActionError::RootRemoval(id.clone()));
                }
                if store.is_ancestor(id, new_parent_id) {
                    return Err(ActionError::CycleDetected {
                        id: id.clone(),
                        parent: new_parent_id.clone(),
                    });
                }
                Ok(())
            }

            Action::DeleteElement { id } => {
                if !store.contains(id) {
                    return Err(ActionError::ElementNotFound(id.clone()));
                }
                if store.root() == Some(id) {
                    return Err(ActionError::RootRemoval(id.clone()));
                }
                Ok(())
            }

            Action::UpdatePage { .. } => Ok(()),
        }
    }

    /// Apply to the state with validation, returning the touched slices
    pub fn apply(&self, state: &mut PageState) -> Result<StateChange, ActionError> {
        self.validate(state)?;

        match self {
            Action::UpdateElement { element } => Self::apply_update(state, element),

            Action::InsertElement { parent_id, index, element } => {
                Self::apply_insert(state, parent_id, *index, element)
            }

            Action::MoveElement { id, new_parent_id, index } => {
                Self::apply_move(state, id, new_parent_id, *index)
            }

            Action::DeleteElement { id } => Self::apply_delete(state, id),

            Action::UpdatePage { title, url } => {
                if let Some(title) = title {
                    state.page.title = title.clone();
                }
                if let Some(url) = url {
                    state.page.url = url.clone();
                }
                Ok(StateChange::page())
            }
        }
    }

    fn apply_update(state: &mut PageState, element: &Element) -> Result<StateChange, ActionError> {
        let existing = state
            .elements
            .get_mut(&element.id)
            .ok_or_else(|| ActionError::ElementNotFound(element.id.clone()))?;

        existing.element_type = element.element_type.clone();
        existing.data = element.data.clone();

        Ok(StateChange::element(element.id.clone()))
    }

    fn apply_insert(
        state: &mut PageState,
        parent_id: &ElementId,
        index: usize,
        element: &PageElement,
    ) -> Result<StateChange, ActionError> {
        let store = &mut state.elements;
        let id = store.insert_tree(element.clone())?;
        store
            .link_child(parent_id, index, id)
            .ok_or_else(|| ActionError::ParentNotFound(parent_id.clone()))?;

        let mut change = StateChange::element(parent_id.clone());
        change.elements.extend(element.ids());
        Ok(change)
    }

    fn apply_move(
        state: &mut PageState,
        id: &ElementId,
        new_parent_id: &ElementId,
        index: usize,
    ) -> Result<StateChange, ActionError> {
        let store = &mut state.elements;
        let mut change = StateChange::element(id.clone());

        if let Some(old_parent_id) = store.unlink_child(id) {
            change.elements.insert(old_parent_id);
        }

        store
            .link_child(new_parent_id, index, id.clone())
            .ok_or_else(|| ActionError::ParentNotFound(new_parent_id.clone()))?;
        change.elements.insert(new_parent_id.clone());

        Ok(change)
    }

    fn apply_delete(state: &mut PageState, id: &ElementId) -> Result<StateChange, ActionError> {
        let store = &mut state.elements;
        let parent = store.parent_of(id).cloned();
        let removed = store
            .remove_tree(id)
            .ok_or_else(|| ActionError::ElementNotFound(id.clone()))?;

        let mut change = StateChange::default();
        change.elements.extend(removed.ids());
        change.elements.extend(parent);
        Ok(change)
    }

    /// Build the action that reverts this one, given the state before applying
    pub fn to_inverse(&self, state: &PageState) -> Result<Action, ActionError> {
        self.validate(state)?;
        let store = &state.elements;

        match self {
            Action::UpdateElement { element } => {
                let current = store
                    .get(&element.id)
                    .ok_or_else(|| ActionError::ElementNotFound(element.id.clone()))?;
                Ok(Action::UpdateElement {
                    element: current.clone(),
                })
            }

            Action::InsertElement { element, .. } => Ok(Action::DeleteElement {
                id: element.id.clone(),
            }),

            Action::MoveElement { id, .. } => {
                let (parent_id, index) = Self::position_of(state, id)?;
                Ok(Action::MoveElement {
                    id: id.clone(),
                    new_parent_id: parent_id,
                    index,
                })
            }

            Action::DeleteElement { id } => {
                let (parent_id, index) = Self::position_of(state, id)?;
                let subtree = store
                    .subtree(id)
                    .ok_or_else(|| ActionError::ElementNotFound(id.clone()))?;
                Ok(Action::InsertElement {
                    parent_id,
                    index,
                    element: subtree,
                })
            }

            Action::UpdatePage { title, url } => Ok(Action::UpdatePage {
                title: title.as_ref().map(|_| state.page.title.clone()),
                url: url.as_ref().map(|_| state.page.url.clone()),
            }),
        }
    }

    fn position_of(state: &PageState, id: &ElementId) -> Result<(ElementId, usize), ActionError> {
        let store = &state.elements;
        let parent = store
            .parent_of(id)
            .cloned()
            .ok_or_else(|| ActionError::RootRemoval(id.clone()))?;
        let index = store
            .index_in_parent(id)
            .ok_or_else(|| ActionError::ElementNotFound(id.clone()))?;
        Ok((parent, index))
    }
}

/// Pure reducer: the state after `action`, leaving `state` untouched
pub fn reduce(state: &PageState, action: &Action) -> Result<(PageState, StateChange), ActionError> {
    let mut next = state.clone();
    let change = action.apply(&mut next)?;
    Ok((next, change))
}

fn default_history() -> bool {
    true
}

/// Immutable command: an action plus how history should record it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEvent {
    action: Action,

    /// Record a history entry for this event
    #[serde(default = "default_history")]
    history: bool,

    /// Coalesce with the previous entry for the same target
    #[serde(default)]
    merge: bool,
}

impl ActionEvent {
    /// New event recorded in history, not merged
    pub fn new(action: Action) -> Self {
        Self {
            action,
            history: true,
            merge: false,
        }
    }

    pub fn with_history(mut self, history: bool) -> Self {
        self.history = history;
        self
    }

    /// Mark the event as mergeable with the previous entry for the same target
    pub fn merging(mut self) -> Self {
        self.merge = true;
        self
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }

    pub fn history(&self) -> bool {
        self.history
    }

    pub fn merge(&self) -> bool {
        self.merge
    }
}

impl From<Action> for ActionEvent {
    fn from(action: Action) -> Self {
        ActionEvent::new(action)
    }
}
