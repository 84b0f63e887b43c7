//! # Document Handle
//!
//! A Document is one page being edited: its metadata, its flattened element
//! store, and where it came from.
//!
//! Documents can be:
//! - **Memory-backed**: built from a page value, nothing to save
//! - **File-backed**: loaded from a page JSON file, saved back in place
//!
//! ## Lifecycle
//!
//! ```text
//! Load → Flatten → Edit → Unflatten → Save
//!   ↓       ↓        ↓        ↓         ↓
//! JSON   Elements  Actions   Page      JSON
//! ```

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{ElementStore, PageElement};
use crate::EditorError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageStatus {
    #[default]
    Draft,
    Published,
    Unpublished,
}

/// Page record with nested content, as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub version: u32,

    #[serde(default)]
    pub status: PageStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_on: Option<DateTime<Utc>>,

    #[serde(default)]
    pub content: Option<PageElement>,
}

/// Page record with the content split out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub id: String,
    pub title: String,
    pub url: String,
    pub version: u32,
    pub status: PageStatus,
    pub saved_on: Option<DateTime<Utc>>,
}

/// Everything an action can change: page metadata plus elements
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    pub page: PageMeta,
    pub elements: ElementStore,
}

impl PageState {
    /// Split the page's content into the element store
    pub fn from_page(page: Page) -> Result<Self, EditorError> {
        let Page {
            id,
            title,
            url,
            version,
            status,
            saved_on,
            content,
        } = page;

        let elements = match content {
            Some(root) => ElementStore::flatten(root)?,
            None => ElementStore::new(),
        };

        Ok(Self {
            page: PageMeta {
                id,
                title,
                url,
                version,
                status,
                saved_on,
            },
            elements,
        })
    }

    /// Recombine metadata and elements into a page record
    pub fn to_page(&self) -> Page {
        Page {
            id: self.page.id.clone(),
            title: self.page.title.clone(),
            url: self.page.url.clone(),
            version: self.page.version,
            status: self.page.status,
            saved_on: self.page.saved_on,
            content: self.elements.to_tree(),
        }
    }
}

/// Backing storage for a document
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentStorage {
    /// In-memory only (tests, previews)
    Memory,

    /// Loaded from and saved to a page JSON file
    File { path: PathBuf, dirty: bool },
}

/// Editable page document
#[derive(Debug, Clone)]
pub struct Document {
    /// Increments on every committed change (including undo/redo)
    pub version: u64,

    state: PageState,
    storage: DocumentStorage,
}

impl Document {
    /// Create a memory-backed document from a page
    pub fn from_page(page: Page) -> Result<Self, EditorError> {
        Ok(Self {
            version: 0,
            state: PageState::from_page(page)?,
            storage: DocumentStorage::Memory,
        })
    }

    /// Load a page JSON file (file-backed)
    pub fn load(path: PathBuf) -> Result<Self, EditorError> {
        let source = std::fs::read_to_string(&path)?;
        let page: Page = serde_json::from_str(&source)?;
        debug!(path = %path.display(), page = %page.id, "loaded page");

        Ok(Self {
            version: 0,
            state: PageState::from_page(page)?,
            storage: DocumentStorage::File { path, dirty: false },
        })
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn storage(&self) -> &DocumentStorage {
        &self.storage
    }

    /// Swap in a new state after a committed change
    pub(crate) fn commit(&mut self, state: PageState) {
        self.state = state;
        self.version += 1;
        if let DocumentStorage::File { dirty, .. } = &mut self.storage {
            *dirty = true;
        }
    }

    /// True once the page has any content to edit
    pub fn has_content(&self) -> bool {
        !self.state.elements.is_empty()
    }

    pub fn to_page(&self) -> Page {
        self.state.to_page()
    }

    /// Check if document has unsaved changes
    pub fn is_dirty(&self) -> bool {
        match &self.storage {
            DocumentStorage::File { dirty, .. } => *dirty,
            DocumentStorage::Memory => false,
        }
    }

    /// Save document to disk (if file-backed)
    pub fn save(&mut self) -> Result<(), EditorError> {
        match &mut self.storage {
            DocumentStorage::File { path, dirty } => {
                self.state.page.saved_on = Some(Utc::now());
                let json = serde_json::to_string_pretty(&self.state.to_page())?;
                std::fs::write(&*path, json)?;
                *dirty = false;
                debug!(path = %path.display(), "saved page");
                Ok(())
            }
            DocumentStorage::Memory => Err(EditorError::NotFileBacked),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page_json() -> serde_json::Value {
        json!({
            "id": "page-1",
            "title": "Home",
            "url": "/home",
            "version": 1,
            "status": "draft",
            "content": {
                "id": "doc",
                "type": "document",
                "elements": [
                    {
                        "id": "btn",
                        "type": "button",
                        "data": { "buttonText": "Click me" }
                    }
                ]
            }
        })
    }

    #[test]
    fn test_create_memory_document() {
        let page: Page = serde_json::from_value(page_json()).unwrap();
        let doc = Document::from_page(page.clone()).unwrap();

        assert_eq!(doc.version, 0);
        assert!(!doc.is_dirty());
        assert!(doc.has_content());
        assert_eq!(doc.state().elements.len(), 2);
        assert_eq!(doc.state().page.title, "Home");
        assert_eq!(doc.to_page(), page);
    }

    #[test]
    fn test_page_without_content() {
        let page = Page {
            id: "empty".to_string(),
            title: String::new(),
            url: String::new(),
            version: 1,
            status: PageStatus::Draft,
            saved_on: None,
            content: None,
        };
        let doc = Document::from_page(page).unwrap();

        assert!(!doc.has_content());
        assert_eq!(doc.to_page().content, None);
    }

    #[test]
    fn test_memory_document_cannot_save() {
        let page: Page = serde_json::from_value(page_json()).unwrap();
        let mut doc = Document::from_page(page).unwrap();

        assert!(matches!(doc.save(), Err(EditorError::NotFileBacked)));
    }

    #[test]
    fn test_file_document_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.json");
        std::fs::write(&path, page_json().to_string()).unwrap();

        let mut doc = Document::load(path.clone()).unwrap();
        assert!(!doc.is_dirty());

        let mut state = doc.state().clone();
        state.page.title = "Landing".to_string();
        doc.commit(state);
        assert!(doc.is_dirty());
        assert_eq!(doc.version, 1);

        doc.save().unwrap();
        assert!(!doc.is_dirty());

        let reloaded = Document::load(path).unwrap();
        assert_eq!(reloaded.state().page.title, "Landing");
        assert!(reloaded.state().page.saved_on.is_some());
    }
}
