//! Application configuration for Wallabook.
//!
//! The config file holds wallabag credentials and export settings. Two
//! layouts are accepted: the wallabago JSON layout (`*.json`) and the native
//! TOML layout (anything else). CLI flags override config file values, which
//! override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, WallabookError};

/// Default book title.
const DEFAULT_TITLE: &str = "Wallabooks";

/// Default book author.
const DEFAULT_AUTHOR: &str = "Wallabook";

/// Entries whose content is not longer than this are skipped.
pub const DEFAULT_MIN_CONTENT_LENGTH: usize = 500;

/// Placeholder printed instead of secrets.
const REDACTED: &str = "********";

// ---------------------------------------------------------------------------
// Config structs (matching the TOML schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML or wallabago JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// wallabag connection settings.
    #[serde(default)]
    pub wallabag: WallabagConfig,

    /// Book export settings.
    #[serde(default)]
    pub export: ExportSettings,
}

/// `[wallabag]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallabagConfig {
    /// Base URL of the wallabag instance.
    #[serde(default)]
    pub url: String,

    /// OAuth client id (created under "API clients management").
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret.
    #[serde(default)]
    pub client_secret: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Entries requested per page while listing.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for WallabagConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            username: String::new(),
            password: String::new(),
            timeout_secs: default_timeout_secs(),
            per_page: default_per_page(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_per_page() -> u32 {
    100
}

/// `[export]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Book title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Book author.
    #[serde(default = "default_author")]
    pub author: String,

    /// Minimum content length (bytes) an entry must exceed to be exported.
    #[serde(default = "default_min_content_length")]
    pub min_content_length: usize,

    /// Output file. Falls back to the deployment default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            title: default_title(),
            author: default_author(),
            min_content_length: default_min_content_length(),
            output: None,
        }
    }
}

fn default_title() -> String {
    DEFAULT_TITLE.into()
}
fn default_author() -> String {
    DEFAULT_AUTHOR.into()
}
fn default_min_content_length() -> usize {
    DEFAULT_MIN_CONTENT_LENGTH
}

/// The JSON layout read by wallabago-based tools.
#[derive(Debug, Clone, Deserialize)]
struct WallabagoConfig {
    #[serde(rename = "WallabagURL")]
    wallabag_url: String,
    #[serde(rename = "ClientId")]
    client_id: String,
    #[serde(rename = "ClientSecret")]
    client_secret: String,
    #[serde(rename = "UserName")]
    user_name: String,
    #[serde(rename = "UserPassword")]
    user_password: String,
}

impl From<WallabagoConfig> for AppConfig {
    fn from(legacy: WallabagoConfig) -> Self {
        Self {
            wallabag: WallabagConfig {
                url: legacy.wallabag_url,
                client_id: legacy.client_id,
                client_secret: legacy.client_secret,
                username: legacy.user_name,
                password: legacy.user_password,
                ..WallabagConfig::default()
            },
            export: ExportSettings::default(),
        }
    }
}

impl AppConfig {
    /// Copy of this config with credentials masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for secret in [
            &mut copy.wallabag.client_secret,
            &mut copy.wallabag.password,
        ] {
            if !secret.is_empty() {
                *secret = REDACTED.into();
            }
        }
        copy
    }
}

// ---------------------------------------------------------------------------
// Deployment profiles
// ---------------------------------------------------------------------------

/// Where Wallabook runs. Only paths and the log sink differ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Deployment {
    /// Desktop or server: everything relative to the working directory.
    #[default]
    Desktop,
    /// PocketBook-style e-reader with fixed mount points.
    Device,
}

impl Deployment {
    /// Config file used when `--config` is not given.
    pub fn default_config_path(self) -> PathBuf {
        match self {
            Self::Desktop => PathBuf::from("config.json"),
            Self::Device => PathBuf::from("/mnt/ext1/system/config/wallabook.json"),
        }
    }

    /// Book written when neither `--output` nor `export.output` is set.
    pub fn default_output_path(self) -> PathBuf {
        match self {
            Self::Desktop => PathBuf::from("result.epub"),
            Self::Device => PathBuf::from("/mnt/ext1/Wallabook/result.epub"),
        }
    }

    /// Log file for operator output; `None` means standard output.
    pub fn default_log_file(self) -> Option<PathBuf> {
        match self {
            Self::Desktop => None,
            Self::Device => Some(PathBuf::from("/mnt/ext1/Wallabook/wallabook.log")),
        }
    }
}

// ---------------------------------------------------------------------------
// Verbosity
// ---------------------------------------------------------------------------

/// Ordered output verbosity, resolved once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    #[default]
    Quiet,
    Verbose,
    Debug,
    Trace,
}

impl Verbosity {
    /// Resolve the level implied by the CLI flags.
    ///
    /// `-v` counts up from `Quiet`; `-d` implies at least `Debug`, while
    /// `-dd` or `--dd` imply `Trace`. The highest implied level wins.
    pub fn from_flags(verbose: u8, debug: u8, trace: bool) -> Self {
        let counted = match verbose {
            0 => Self::Quiet,
            1 => Self::Verbose,
            2 => Self::Debug,
            _ => Self::Trace,
        };
        let debug = match debug {
            0 => Self::Quiet,
            1 => Self::Debug,
            _ => Self::Trace,
        };
        let trace = if trace { Self::Trace } else { Self::Quiet };
        counted.max(debug).max(trace)
    }

    /// `EnvFilter` directive for this level.
    pub fn filter_directive(self) -> &'static str {
        match self {
            Self::Quiet => "wallabook=info",
            Self::Verbose => "wallabook=debug",
            Self::Debug => "wallabook=trace",
            Self::Trace => "trace",
        }
    }
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Validated wallabag connection settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL, always ending in `/` so relative joins keep any path prefix.
    pub base_url: Url,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,
    pub per_page: u32,
}

impl TryFrom<&AppConfig> for StoreConfig {
    type Error = WallabookError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        let w = &config.wallabag;
        for (field, value) in [
            ("url", &w.url),
            ("client_id", &w.client_id),
            ("client_secret", &w.client_secret),
            ("username", &w.username),
        ] {
            if value.trim().is_empty() {
                return Err(WallabookError::config(format!("wallabag.{field} is not set")));
            }
        }
        if w.per_page == 0 {
            return Err(WallabookError::config("wallabag.per_page must be at least 1"));
        }

        let mut raw = w.url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw)
            .map_err(|e| WallabookError::config(format!("invalid wallabag.url '{}': {e}", w.url)))?;

        Ok(Self {
            base_url,
            client_id: w.client_id.clone(),
            client_secret: w.client_secret.clone(),
            username: w.username.clone(),
            password: w.password.clone(),
            timeout_secs: w.timeout_secs,
            per_page: w.per_page,
        })
    }
}

/// Runtime export settings.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub title: String,
    pub author: String,
    pub min_content_length: usize,
    /// Target EPUB path.
    pub output_path: PathBuf,
}

impl ExportConfig {
    /// Merge the file settings with the deployment default and an optional
    /// CLI override for the output path.
    pub fn resolve(config: &AppConfig, deployment: Deployment, output: Option<&Path>) -> Self {
        let output_path = match (output, config.export.output.as_deref()) {
            (Some(cli), _) => cli.to_path_buf(),
            (None, Some(file)) => PathBuf::from(file),
            (None, None) => deployment.default_output_path(),
        };
        Self {
            title: config.export.title.clone(),
            author: config.export.author.clone(),
            min_content_length: config.export.min_content_length,
            output_path,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the application config from a specific file path.
///
/// `*.json` files are read in the wallabago layout, everything else as TOML.
/// A missing or malformed file is a config error.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        WallabookError::config(format!("failed to read {}: {e}", path.display()))
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let legacy: WallabagoConfig = serde_json::from_str(&content).map_err(|e| {
            WallabookError::config(format!("failed to parse {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "loaded wallabago JSON config");
        Ok(legacy.into())
    } else {
        let config = toml::from_str(&content).map_err(|e| {
            WallabookError::config(format!("failed to parse {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "loaded TOML config");
        Ok(config)
    }
}

/// Write a default TOML config file at `path`, creating parent directories.
/// Refuses to overwrite an existing file.
pub fn init_config(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Err(WallabookError::config(format!(
            "{} already exists, not overwriting",
            path.display()
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| WallabookError::io(parent, e))?;
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| WallabookError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| WallabookError::io(path, e))?;
    tracing::info!(path = %path.display(), "created default config file");

    Ok(path.to_path_buf())
}
