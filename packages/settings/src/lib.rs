//! # Page Builder Settings
//!
//! The site-wide settings record and the per-request cache in front of it.
//!
//! ```text
//! SettingsService::begin_request() → RequestContext { key, SettingsCache }
//!                                          │
//!        get_settings / update_settings ───┤
//!        list_published_pages (N pages) ───┘→ at most one SettingsStore::read
//! ```
//!
//! The cache boundary is the [`RequestContext`]: nothing read in one request
//! is visible to another.

mod cache;
mod config;
mod context;
mod error;
mod key;
mod pages;
mod service;
mod settings;
mod store;

pub use cache::SettingsCache;
pub use config::SettingsConfig;
pub use context::RequestContext;
pub use error::SettingsError;
pub use key::SettingsKey;
pub use pages::{PublishedPage, PublishedPageView, PublishedPagesService};
pub use service::{ErrorResponse, SettingsResponse, SettingsService};
pub use settings::{
    FileRef, Prerendering, PrerenderingApp, PrerenderingStorage, Settings, Social,
};
pub use store::{
    JsonFileSettingsStore, MemorySettingsStore, Operation, SettingsStore, StoreOp,
};
