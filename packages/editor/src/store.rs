//! # Element Store
//!
//! Flattened, id-keyed view of a page's content tree.
//!
//! Pages arrive with their content nested (`PageElement` holding child
//! `PageElement`s). On load the tree is split into one `Element` per node, each
//! carrying only the ids of its children. All edits then address elements by id.
//!
//! ```text
//! document ─┬─ block ── heading
//!           └─ block ─┬─ text
//!                     └─ button
//!
//! flatten ↓
//!
//! { document: [block-1, block-2], block-1: [heading], block-2: [text, button], ... }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Unique identifier of a page element
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A single node of the flattened content tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,

    /// Element type tag (e.g. "document", "block", "button", "text")
    #[serde(rename = "type")]
    pub element_type: String,

    /// Type-specific payload (button text, rich text content, settings)
    #[serde(default)]
    pub data: serde_json::Value,

    /// Ordered child ids
    #[serde(default)]
    pub elements: Vec<ElementId>,
}

impl Element {
    pub fn new(id: impl Into<ElementId>, element_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            element_type: element_type.into(),
            data: serde_json::Value::Null,
            elements: Vec::new(),
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// A node of the nested content tree as stored on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageElement {
    pub id: ElementId,

    #[serde(rename = "type")]
    pub element_type: String,

    #[serde(default)]
    pub data: serde_json::Value,

    #[serde(default)]
    pub elements: Vec<PageElement>,
}

impl PageElement {
    pub fn new(id: impl Into<ElementId>, element_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            element_type: element_type.into(),
            data: serde_json::Value::Null,
            elements: Vec::new(),
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_children(mut self, children: Vec<PageElement>) -> Self {
        self.elements = children;
        self
    }

    /// Ids of this node and all nodes below it, pre-order
    pub fn ids(&self) -> Vec<ElementId> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids(&self, out: &mut Vec<ElementId>) {
        out.push(self.id.clone());
        for child in &self.elements {
            child.collect_ids(out);
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Duplicate element id: {0}")]
    DuplicateId(ElementId),

    #[error("Element {parent} references missing child {child}")]
    DanglingChild { parent: ElementId, child: ElementId },

    #[error("Element {0} has more than one parent")]
    MultipleParents(ElementId),

    #[error("Element {0} is not reachable from the root")]
    Unreachable(ElementId),

    #[error("Root element {0} is missing")]
    MissingRoot(ElementId),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
}

/// Pagination parameters for [`ElementStore::list`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListParams {
    /// Maximum number of items per page (`None` = everything)
    pub limit: Option<usize>,

    /// Cursor returned by the previous page
    pub after: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
    /// Cursor to pass as `after` for the next page
    pub cursor: Option<String>,
    pub has_more_items: bool,
    pub total_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<'a> {
    pub items: Vec<&'a Element>,
    pub meta: ListMeta,
}

/// Id-keyed element storage with an optional root
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementStore {
    elements: HashMap<ElementId, Element>,
    root: Option<ElementId>,

    /// Child id to parent id, kept in step with every child list
    parents: HashMap<ElementId, ElementId>,
}

impl ElementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a nested content tree into the flat store
    pub fn flatten(root: PageElement) -> Result<Self, StoreError> {
        let mut store = Self {
            elements: HashMap::new(),
            root: Some(root.id.clone()),
            parents: HashMap::new(),
        };
        store.insert_tree(root)?;
        Ok(store)
    }

    /// Insert a detached subtree, returning the id of its root.
    ///
    /// The caller is responsible for linking the returned id into a parent.
    pub(crate) fn insert_tree(&mut self, node: PageElement) -> Result<ElementId, StoreError> {
        for id in node.ids() {
            if self.elements.contains_key(&id) {
                return Err(StoreError::DuplicateId(id));
            }
        }
        let mut seen = HashSet::new();
        for id in node.ids() {
            if !seen.insert(id.clone()) {
                return Err(StoreError::DuplicateId(id));
            }
        }

        let id = node.id.clone();
        self.insert_unchecked(node);
        Ok(id)
    }

    fn insert_unchecked(&mut self, node: PageElement) {
        let PageElement {
            id,
            element_type,
            data,
            elements,
        } = node;

        let child_ids: Vec<ElementId> = elements.iter().map(|c| c.id.clone()).collect();
        for child in &child_ids {
            self.parents.insert(child.clone(), id.clone());
        }
        self.elements.insert(
            id.clone(),
            Element {
                id,
                element_type,
                data,
                elements: child_ids,
            },
        );

        for child in elements {
            self.insert_unchecked(child);
        }
    }

    /// Rebuild the nested tree from the root
    pub fn to_tree(&self) -> Option<PageElement> {
        self.root.as_ref().and_then(|root| self.subtree(root))
    }

    /// Nested copy of the subtree rooted at `id`
    pub fn subtree(&self, id: &ElementId) -> Option<PageElement> {
        let element = self.elements.get(id)?;
        let children = element
            .elements
            .iter()
            .filter_map(|child| self.subtree(child))
            .collect();

        Some(PageElement {
            id: element.id.clone(),
            element_type: element.element_type.clone(),
            data: element.data.clone(),
            elements: children,
        })
    }

    pub fn root(&self) -> Option<&ElementId> {
        self.root.as_ref()
    }

    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.elements.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Find the element listing `id` as a child
    pub fn parent_of(&self, id: &ElementId) -> Option<&ElementId> {
        self.parents.get(id)
    }

    /// Insert `child` into `parent`'s child list at `index` (clamped to the end).
    ///
    /// Returns the index used, or `None` if the parent does not exist.
    pub(crate) fn link_child(
        &mut self,
        parent: &ElementId,
        index: usize,
        child: ElementId,
    ) -> Option<usize> {
        let element = self.elements.get_mut(parent)?;
        let index = index.min(element.elements.len());
        element.elements.insert(index, child.clone());
        self.parents.insert(child, parent.clone());
        Some(index)
    }

    /// Detach `child` from its parent's child list, returning the old parent
    pub(crate) fn unlink_child(&mut self, child: &ElementId) -> Option<ElementId> {
        let parent = self.parents.remove(child)?;
        if let Some(element) = self.elements.get_mut(&parent) {
            element.elements.retain(|c| c != child);
        }
        Some(parent)
    }

    /// Position of `id` within its parent's child list
    pub fn index_in_parent(&self, id: &ElementId) -> Option<usize> {
        let parent = self.parent_of(id)?;
        self.elements[parent].elements.iter().position(|c| c == id)
    }

    /// Ids of `id` and everything below it, pre-order
    pub fn descendants(&self, id: &ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            if let Some(element) = self.elements.get(&current) {
                out.push(current);
                stack.extend(element.elements.iter().rev().cloned());
            }
        }
        out
    }

    /// True if `ancestor` is `id` or contains it
    pub fn is_ancestor(&self, ancestor: &ElementId, id: &ElementId) -> bool {
        let mut current = Some(id);
        while let Some(step) = current {
            if step == ancestor {
                return true;
            }
            current = self.parents.get(step);
        }
        false
    }

    /// Remove the subtree rooted at `id`, unlinking it from its parent.
    pub(crate) fn remove_tree(&mut self, id: &ElementId) -> Option<PageElement> {
        let tree = self.subtree(id)?;

        self.unlink_child(id);
        for removed in self.descendants(id) {
            self.elements.remove(&removed);
            self.parents.remove(&removed);
        }
        Some(tree)
    }

    /// All element ids in document order (pre-order from the root)
    pub fn document_order(&self) -> Vec<ElementId> {
        match &self.root {
            Some(root) => self.descendants(root),
            None => Vec::new(),
        }
    }

    /// Page through elements in document order.
    ///
    /// The cursor is the id of the last element of the previous page.
    pub fn list(&self, params: &ListParams) -> Result<ListPage<'_>, StoreError> {
        let order = self.document_order();
        let total_count = order.len();

        let start = match &params.after {
            Some(cursor) => {
                let position = order
                    .iter()
                    .position(|id| id.as_str() == cursor)
                    .ok_or_else(|| StoreError::InvalidCursor(cursor.clone()))?;
                position + 1
            }
            None => 0,
        };

        let end = match params.limit {
            Some(limit) => (start + limit).min(total_count),
            None => total_count,
        };

        let items: Vec<&Element> = order[start..end]
            .iter()
            .filter_map(|id| self.elements.get(id))
            .collect();

        let has_more_items = end < total_count;
        let cursor = if has_more_items {
            items.last().map(|e| e.id.to_string())
        } else {
            None
        };

        Ok(ListPage {
            items,
            meta: ListMeta {
                cursor,
                has_more_items,
                total_count,
            },
        })
    }

    /// Check structural invariants
    ///
    /// - every child id exists
    /// - every element except the root has exactly one parent
    /// - every element is reachable from the root (no cycles, no orphans)
    pub fn validate(&self) -> Result<(), StoreError> {
        let Some(root) = &self.root else {
            return if self.elements.is_empty() {
                Ok(())
            } else {
                let id = self.elements.keys().next().cloned();
                Err(StoreError::Unreachable(id.unwrap_or_else(|| ElementId::new(""))))
            };
        };

        if !self.elements.contains_key(root) {
            return Err(StoreError::MissingRoot(root.clone()));
        }

        let mut parents: HashMap<&ElementId, usize> = HashMap::new();
        for element in self.elements.values() {
            for child in &element.elements {
                if !self.elements.contains_key(child) {
                    return Err(StoreError::DanglingChild {
                        parent: element.id.clone(),
                        child: child.clone(),
                    });
                }
                *parents.entry(child).or_default() += 1;
            }
        }

        for (id, count) in &parents {
            if *count > 1 || *id == root {
                return Err(StoreError::MultipleParents((*id).clone()));
            }
        }

        let reachable: HashSet<ElementId> = self.descendants(root).into_iter().collect();
        if let Some(orphan) = self.elements.keys().find(|id| !reachable.contains(*id)) {
            return Err(StoreError::Unreachable(orphan.clone()));
        }

        Ok(())
    }
}
