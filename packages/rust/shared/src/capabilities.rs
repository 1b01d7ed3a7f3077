//! Capability traits consumed by the pipeline.
//!
//! The pipeline never talks to the network, a headless browser, or a
//! reader-mode service directly; it goes through these seams. Plain HTTP
//! fetching has a reqwest-backed implementation in `docmill-core`; the
//! rendering and reader-mode capabilities are provided by the embedding
//! application.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::WaitStrategy;

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

/// Response from a plain HTTP fetch.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
    /// Lowercased response header names to values.
    pub headers: HashMap<String, String>,
}

/// Plain HTTP page fetching with a politeness delay.
///
/// Fails with [`DocmillError::Transport`](crate::DocmillError::Transport) on
/// timeout, connection error, or non-success status.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`, sleeping at least `min_delay_ms` before issuing the
    /// request when the implementation tracks per-host pacing.
    async fn fetch(&self, url: &str, min_delay_ms: u64) -> Result<FetchResponse>;
}

// ---------------------------------------------------------------------------
// Render
// ---------------------------------------------------------------------------

/// A page loaded with script execution.
#[derive(Debug, Clone, Default)]
pub struct RenderedPage {
    /// Post-render serialized DOM.
    pub html: String,
    /// Visible text of the largest content block.
    pub extracted_text: String,
    /// Absolute same-origin links found after render.
    pub links: Vec<String>,
    /// Metadata gathered in-page (description, canonical URL, ...).
    pub metadata: HashMap<String, String>,
}

/// Headless rendering capability.
///
/// A renderer wraps one browser session. Sessions are not safe to share
/// across concurrent tasks: the pipeline drives a renderer sequentially and
/// calls [`Renderer::close`] on every exit path.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Load `url`, wait per `wait`/`wait_selector`, and return the rendered
    /// page. Fails with [`DocmillError::Render`](crate::DocmillError::Render).
    async fn render(
        &self,
        url: &str,
        wait: WaitStrategy,
        wait_selector: Option<&str>,
        timeout_ms: u64,
    ) -> Result<RenderedPage>;

    /// Release the underlying session. Idempotent.
    async fn close(&self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Reader mode
// ---------------------------------------------------------------------------

/// Pre-cleaned structured text from an external reader-mode service.
#[derive(Debug, Clone)]
pub struct ReaderDocument {
    /// Title reported by the service, when present.
    pub title: Option<String>,
    /// Clean markdown content.
    pub markdown_content: String,
}

/// Reader-mode extraction capability. Externally rate-limited; fails with
/// [`DocmillError::Reader`](crate::DocmillError::Reader) on empty or error
/// responses.
#[async_trait]
pub trait ReaderMode: Send + Sync {
    async fn fetch_reader(&self, url: &str) -> Result<ReaderDocument>;
}
