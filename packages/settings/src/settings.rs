//! The page builder settings record.
//!
//! Every field is optional; a record that was never written reads back as
//! `None` rather than as an all-empty record.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub website_url: Option<String>,

    #[serde(default)]
    pub website_preview_url: Option<String>,

    #[serde(default)]
    pub favicon: Option<FileRef>,

    #[serde(default)]
    pub logo: Option<FileRef>,

    #[serde(default)]
    pub prerendering: Option<Prerendering>,

    #[serde(default)]
    pub social: Option<Social>,
}

/// Reference to an uploaded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    pub id: String,
    pub src: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prerendering {
    #[serde(default)]
    pub app: Option<PrerenderingApp>,
    #[serde(default)]
    pub storage: Option<PrerenderingStorage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrerenderingApp {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrerenderingStorage {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Social {
    #[serde(default)]
    pub facebook: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub image: Option<FileRef>,
}

impl Settings {
    /// Strip trailing slashes from the site URLs.
    ///
    /// Social links are stored exactly as given. Nothing here validates that a
    /// value is a well-formed URL.
    pub fn normalized(mut self) -> Self {
        strip_trailing_slashes(&mut self.website_url);
        strip_trailing_slashes(&mut self.website_preview_url);
        if let Some(app) = self.prerendering.as_mut().and_then(|p| p.app.as_mut()) {
            strip_trailing_slashes(&mut app.url);
        }
        self
    }

    /// Overlay the fields present in `patch` on top of `self`
    pub fn merge(self, patch: Settings) -> Settings {
        Settings {
            name: patch.name.or(self.name),
            website_url: patch.website_url.or(self.website_url),
            website_preview_url: patch.website_preview_url.or(self.website_preview_url),
            favicon: patch.favicon.or(self.favicon),
            logo: patch.logo.or(self.logo),
            prerendering: patch.prerendering.or(self.prerendering),
            social: patch.social.or(self.social),
        }
    }
}

fn strip_trailing_slashes(url: &mut Option<String>) {
    if let Some(url) = url {
        let len = url.trim_end_matches('/').len();
        url.truncate(len);
    }
}
