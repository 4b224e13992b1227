//! Response bodies of the wallabag REST API.

use serde::Deserialize;

use wallabook_shared::Entry;

/// `POST /oauth/v2/token` success body.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
}

/// OAuth error body (`invalid_grant`, `invalid_client`, ...).
#[derive(Debug, Deserialize)]
pub(crate) struct OAuthError {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl std::fmt::Display for OAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {desc}", self.error),
            None => f.write_str(&self.error),
        }
    }
}

/// One page of `GET /api/entries.json`.
#[derive(Debug, Deserialize)]
pub(crate) struct EntriesPage {
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(rename = "_embedded", default)]
    pub embedded: Embedded,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Embedded {
    #[serde(default)]
    pub items: Vec<EntryItem>,
}

/// A single entry as serialized by wallabag. Most fields are ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct EntryItem {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl From<EntryItem> for Entry {
    fn from(item: EntryItem) -> Self {
        Self {
            id: item.id,
            title: item.title.unwrap_or_default(),
            content: item.content.unwrap_or_default(),
        }
    }
}
