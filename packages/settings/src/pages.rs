//! Published page listing.
//!
//! Every listed page carries its public URL, built from the site's
//! `websiteUrl`. Pages resolve concurrently and all of them go through the
//! request's settings cache, so one listing costs a single settings read.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{RequestContext, Settings, SettingsError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedPage {
    pub id: String,
    pub title: String,
    /// Site-relative path, e.g. `/blog/hello`
    pub path: String,
    pub published_on: DateTime<Utc>,
}

/// A published page with its resolved public URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedPageView {
    #[serde(flatten)]
    pub page: PublishedPage,
    /// `None` until the site has a `websiteUrl`
    pub full_url: Option<String>,
}

impl PublishedPageView {
    fn resolve(page: PublishedPage, settings: Option<&Settings>) -> Self {
        let full_url = settings
            .and_then(|s| s.website_url.as_deref())
            .map(|base| join_url(base, &page.path));
        Self { page, full_url }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// In-memory source of published pages
#[derive(Debug, Default)]
pub struct PublishedPagesService {
    pages: Vec<PublishedPage>,
}

impl PublishedPagesService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a page, replacing an earlier revision with the same id
    pub fn publish(&mut self, page: PublishedPage) {
        self.pages.retain(|p| p.id != page.id);
        self.pages.push(page);
    }

    pub fn unpublish(&mut self, id: &str) -> bool {
        let before = self.pages.len();
        self.pages.retain(|p| p.id != id);
        self.pages.len() != before
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// List published pages, newest first, up to `limit`
    pub async fn list_published_pages(
        &self,
        ctx: &RequestContext,
        limit: Option<usize>,
    ) -> Result<Vec<PublishedPageView>, SettingsError> {
        let mut pages: Vec<&PublishedPage> = self.pages.iter().collect();
        pages.sort_by(|a, b| b.published_on.cmp(&a.published_on));
        if let Some(limit) = limit {
            pages.truncate(limit);
        }

        let views = join_all(pages.into_iter().map(|page| async move {
            let settings = ctx.settings().get(ctx.key()).await?;
            Ok::<_, SettingsError>(PublishedPageView::resolve(page.clone(), settings.as_ref()))
        }))
        .await;

        let views = views.into_iter().collect::<Result<Vec<_>, _>>()?;
        debug!(count = views.len(), "listed published pages");
        Ok(views)
    }
}
