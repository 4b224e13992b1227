//! wallabag article store client.
//!
//! The export pipeline only sees the [`ArticleStore`] trait: a total article
//! count and the complete, ordered entry collection. [`WallabagClient`]
//! implements it against the wallabag v2 REST API, authenticating with the
//! OAuth2 password grant and walking `/api/entries.json` page by page.

mod wire;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::{debug, info, instrument};
use url::Url;

use wallabook_shared::{Entry, Result, StoreConfig, WallabookError};

use wire::{EntriesPage, OAuthError, TokenResponse};

/// User-Agent string for store requests.
const USER_AGENT: &str = concat!("Wallabook/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// ArticleStore
// ---------------------------------------------------------------------------

/// Source of saved articles.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Total number of articles the store advertises.
    async fn total_count(&self) -> Result<u64>;

    /// Every entry, in store order. Either the full collection or an error.
    async fn all_entries(&self) -> Result<Vec<Entry>>;
}

// ---------------------------------------------------------------------------
// WallabagClient
// ---------------------------------------------------------------------------

/// Authenticated wallabag API client.
#[derive(Debug)]
pub struct WallabagClient {
    http: Client,
    base_url: Url,
    per_page: u32,
    token: String,
}

impl WallabagClient {
    /// Build an HTTP client and obtain an access token.
    #[instrument(skip_all, fields(url = %config.base_url, user = %config.username))]
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WallabookError::store(format!("failed to build HTTP client: {e}")))?;

        let token = authenticate(&http, config).await?;
        info!("authenticated with wallabag");

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            per_page: config.per_page,
            token,
        })
    }

    /// Fetch one page of entries.
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<EntriesPage> {
        let url = endpoint(&self.base_url, "api/entries.json")?;

        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.token)
            .query(&[("perPage", per_page), ("page", page)])
            .send()
            .await
            .map_err(|e| WallabookError::store(format!("{url}: {e}")))?;

        let response = ensure_success(response, &url).await?;

        let parsed = response
            .json::<EntriesPage>()
            .await
            .map_err(|e| WallabookError::store(format!("{url}: invalid entries page: {e}")))?;

        debug!(
            page,
            per_page,
            pages = parsed.pages,
            items = parsed.embedded.items.len(),
            "fetched entries page"
        );
        Ok(parsed)
    }
}

#[async_trait]
impl ArticleStore for WallabagClient {
    async fn total_count(&self) -> Result<u64> {
        Ok(self.fetch_page(1, 1).await?.total)
    }

    async fn all_entries(&self) -> Result<Vec<Entry>> {
        let first = self.fetch_page(1, self.per_page).await?;
        let pages = first.pages.max(1);

        // `total` is advisory and not used for sizing.
        let mut entries: Vec<Entry> = first.embedded.items.into_iter().map(Entry::from).collect();

        for page in 2..=pages {
            let next = self.fetch_page(page, self.per_page).await?;
            entries.extend(next.embedded.items.into_iter().map(Entry::from));
        }

        info!(entries = entries.len(), pages, "retrieved all entries");
        Ok(entries)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Exchange credentials for an access token.
async fn authenticate(http: &Client, config: &StoreConfig) -> Result<String> {
    let url = endpoint(&config.base_url, "oauth/v2/token")?;

    let response = http
        .post(url.clone())
        .form(&[
            ("grant_type", "password"),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("username", config.username.as_str()),
            ("password", config.password.as_str()),
        ])
        .send()
        .await
        .map_err(|e| WallabookError::store(format!("{url}: {e}")))?;

    let response = ensure_success(response, &url).await?;

    let token = response
        .json::<TokenResponse>()
        .await
        .map_err(|e| WallabookError::store(format!("{url}: invalid token response: {e}")))?;

    Ok(token.access_token)
}

fn endpoint(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| WallabookError::store(format!("cannot build {path} URL from {base}: {e}")))
}

/// Turn a non-2xx response into a store error, keeping the OAuth error
/// description when the body carries one.
async fn ensure_success(response: Response, url: &Url) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<OAuthError>(&body) {
        Ok(oauth) => format!(" ({oauth})"),
        Err(_) => String::new(),
    };

    Err(WallabookError::store(format!("{url}: HTTP {status}{detail}")))
}
