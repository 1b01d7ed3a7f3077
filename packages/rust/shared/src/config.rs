//! Application configuration for Docmill.
//!
//! User config lives at `~/.docmill/docmill.toml`. Runtime flags from the
//! embedding application override config file values, which override
//! defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocmillError, Result};
use crate::types::RenderingMode;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docmill.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docmill";

// ---------------------------------------------------------------------------
// Config structs (matching docmill.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Chunking parameters.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// URL filter policies.
    #[serde(default)]
    pub filters: FiltersConfig,

    /// Safety limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Concurrent static fetches per batch.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Concurrent rendered-page loads per batch. Kept lower than
    /// `concurrency`: one rendering session is never shared across tasks.
    #[serde(default = "default_rendered_concurrency")]
    pub rendered_concurrency: usize,

    /// Minimum ms between requests to the same host.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_ms: u64,

    /// Overall page cap enforced before scheduling. Zero means unlimited.
    #[serde(default)]
    pub max_pages: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            rendered_concurrency: default_rendered_concurrency(),
            rate_limit_ms: default_rate_limit(),
            max_pages: 0,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_concurrency() -> usize {
    5
}
fn default_rendered_concurrency() -> usize {
    3
}
fn default_rate_limit() -> u64 {
    200
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[chunking]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Token budget per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Token budget for the trailing overlap carried between chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Minimum content length floor; shorter chunks are discarded.
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,

    /// Budget multiplier for sections containing code.
    #[serde(default = "default_code_budget_multiplier")]
    pub code_budget_multiplier: f64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            min_chunk_chars: default_min_chunk_chars(),
            code_budget_multiplier: default_code_budget_multiplier(),
        }
    }
}

fn default_chunk_size() -> usize {
    800
}
fn default_chunk_overlap() -> usize {
    100
}
fn default_min_chunk_chars() -> usize {
    100
}
fn default_code_budget_multiplier() -> f64 {
    2.5
}

/// `[filters]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FiltersConfig {
    /// URL include regex patterns (if non-empty, a URL must match one).
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// URL exclude regex patterns.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Documentation path substrings preferred during rendered discovery
    /// (e.g. `/docs/`). Empty means accept any same-origin page path.
    #[serde(default)]
    pub doc_path_filters: Vec<String>,
}

/// `[limits]` section. Valves, kept configurable rather than hard-coded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Cap on URLs accepted from rendered discovery.
    #[serde(default = "default_max_rendered_urls")]
    pub max_rendered_urls: usize,

    /// Cap on nested sitemaps followed from a sitemap index.
    #[serde(default = "default_max_nested_sitemaps")]
    pub max_nested_sitemaps: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_rendered_urls: default_max_rendered_urls(),
            max_nested_sitemaps: default_max_nested_sitemaps(),
        }
    }
}

fn default_max_rendered_urls() -> usize {
    500
}
fn default_max_nested_sitemaps() -> usize {
    50
}

// ---------------------------------------------------------------------------
// Selector overrides
// ---------------------------------------------------------------------------

/// Caller-supplied CSS selector overrides, tried before the built-in
/// candidates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorOverrides {
    /// Title element selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Main content element selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Navigation container selector (discovery).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation: Option<String>,

    /// Extra boilerplate selectors stripped before extraction.
    #[serde(default)]
    pub exclude: Vec<String>,
}

// ---------------------------------------------------------------------------
// Ingest config (runtime, merged from config + caller flags)
// ---------------------------------------------------------------------------

/// Runtime ingestion configuration for one run against one base URL.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Base documentation URL.
    pub base_url: String,
    /// Skip classification and force a rendering mode.
    pub forced_mode: Option<RenderingMode>,
    /// Route extraction through the reader-mode capability first.
    pub use_reader_mode: bool,
    /// Selector overrides.
    pub selectors: SelectorOverrides,
    /// Concurrent static fetches per batch.
    pub concurrency: usize,
    /// Concurrent rendered loads per batch.
    pub rendered_concurrency: usize,
    /// Minimum ms between requests to the same host.
    pub rate_limit_ms: u64,
    /// Overall page cap (0 = unlimited).
    pub max_pages: usize,
    /// Per-request timeout in ms.
    pub timeout_ms: u64,
    /// URL include regex patterns.
    pub include_patterns: Vec<String>,
    /// URL exclude regex patterns.
    pub exclude_patterns: Vec<String>,
    /// Documentation path substrings for rendered discovery.
    pub doc_path_filters: Vec<String>,
    /// Cap on rendered-discovered URLs.
    pub max_rendered_urls: usize,
    /// Cap on nested sitemaps.
    pub max_nested_sitemaps: usize,
    /// Chunking parameters.
    pub chunking: ChunkingConfig,
}

impl IngestConfig {
    /// Build a runtime config for `base_url` from an [`AppConfig`].
    pub fn from_app_config(base_url: impl Into<String>, config: &AppConfig) -> Self {
        Self {
            base_url: base_url.into(),
            forced_mode: None,
            use_reader_mode: false,
            selectors: SelectorOverrides::default(),
            concurrency: config.defaults.concurrency,
            rendered_concurrency: config.defaults.rendered_concurrency,
            rate_limit_ms: config.defaults.rate_limit_ms,
            max_pages: config.defaults.max_pages,
            timeout_ms: config.defaults.timeout_secs * 1000,
            include_patterns: config.filters.include_patterns.clone(),
            exclude_patterns: config.filters.exclude_patterns.clone(),
            doc_path_filters: config.filters.doc_path_filters.clone(),
            max_rendered_urls: config.limits.max_rendered_urls,
            max_nested_sitemaps: config.limits.max_nested_sitemaps,
            chunking: config.chunking.clone(),
        }
    }

    /// Fail-fast validation, run before anything else in a pipeline run.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url)
            .map_err(|e| DocmillError::config(format!("invalid base_url {:?}: {e}", self.base_url)))?;

        if self.forced_mode == Some(RenderingMode::Unknown) {
            return Err(DocmillError::config(
                "forced_mode cannot be 'unknown'; omit it to classify automatically",
            ));
        }
        if self.concurrency == 0 || self.rendered_concurrency == 0 {
            return Err(DocmillError::config("concurrency limits must be >= 1"));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(DocmillError::config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }

        for pattern in self.include_patterns.iter().chain(&self.exclude_patterns) {
            regex::Regex::new(pattern).map_err(|e| {
                DocmillError::config(format!("invalid URL filter pattern {pattern:?}: {e}"))
            })?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docmill/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocmillError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docmill/docmill.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does
/// not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| DocmillError::config(format!("read {}: {e}", path.display())))?;

    toml::from_str(&content)
        .map_err(|e| DocmillError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)
        .map_err(|e| DocmillError::config(format!("create {}: {e}", dir.display())))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocmillError::config(e.to_string()))?;

    std::fs::write(&path, content)
        .map_err(|e| DocmillError::config(format!("write {}: {e}", path.display())))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
