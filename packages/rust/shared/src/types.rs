//! Core domain types for the Docmill ingestion pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Site profile
// ---------------------------------------------------------------------------

/// Whether page content is present in the initial HTML or requires script
/// execution to materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderingMode {
    /// Content is complete in the fetched HTML.
    Static,
    /// Content only appears after script execution (SPA).
    Rendered,
    /// Server-rendered shell with client-side hydration (Next.js, Nuxt).
    Hybrid,
    /// Classification produced no usable signal.
    Unknown,
}

impl std::fmt::Display for RenderingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Static => "static",
            Self::Rendered => "rendered",
            Self::Hybrid => "hybrid",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// How long a renderer should wait before considering a page loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitStrategy {
    /// Wait until the network goes quiet (safest for SPAs).
    NetworkIdle,
    /// Wait for DOMContentLoaded.
    DomContent,
    /// Wait for the full load event.
    #[default]
    Load,
}

/// Result of classifying a site's rendering requirements.
///
/// Computed once per base domain per run; downstream strategy selection keys
/// off `rendering_mode` and the wait fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Classified rendering mode.
    pub rendering_mode: RenderingMode,
    /// Summed signal weights; `> 40` static, `< 0` rendered, else hybrid.
    pub score: i32,
    /// Human-readable signal strings contributing to the score.
    pub signals: Vec<String>,
    /// Recommended wait strategy for rendered work.
    pub wait_strategy: WaitStrategy,
    /// Framework-specific readiness selector, when a framework was detected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_selector: Option<String>,
}

impl SiteProfile {
    /// Profile used when classification is skipped (forced mode).
    pub fn unknown() -> Self {
        Self {
            rendering_mode: RenderingMode::Unknown,
            score: 0,
            signals: Vec::new(),
            wait_strategy: WaitStrategy::Load,
            wait_selector: None,
        }
    }

    /// True when extraction should go through the rendering capability.
    pub fn needs_rendering(&self) -> bool {
        matches!(
            self.rendering_mode,
            RenderingMode::Rendered | RenderingMode::Hybrid
        )
    }
}

// ---------------------------------------------------------------------------
// Discovery result
// ---------------------------------------------------------------------------

/// Outcome of URL discovery, frozen (deduplicated + filtered) before any
/// scheduling happens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryResult {
    /// Final in-scope URLs in first-seen order, deduplicated.
    pub urls: Vec<String>,
    /// URLs that came from sitemap.xml (pre-filter).
    pub sitemap_urls: Vec<String>,
    /// URLs that came from navigation/content anchors (pre-filter).
    pub nav_urls: Vec<String>,
    /// Non-fatal errors accumulated during discovery.
    pub errors: Vec<String>,
}

impl DiscoveryResult {
    /// Record an error without aborting discovery.
    pub fn push_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }
}

// ---------------------------------------------------------------------------
// Extracted document
// ---------------------------------------------------------------------------

/// Page-level metadata pulled from meta tags or the rendering capability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    /// Framework detected on the page (e.g. "Angular"), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
}

/// Clean article content extracted from one page. Transient: discarded after
/// chunking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Resolved page title (never empty; falls back to a literal).
    pub title: String,
    /// Content as produced by the winning strategy (HTML or markdown).
    pub raw_content: String,
    /// Visible text with markup stripped; input to chunking.
    pub plain_text: String,
    /// Absolute links found on the page, deduplicated.
    pub links: Vec<String>,
    /// Page metadata.
    #[serde(default)]
    pub metadata: DocumentMetadata,
    /// Heuristic admissibility score (word count based).
    pub quality_score: u32,
}

impl ExtractedDocument {
    /// Whitespace-delimited word count of the plain text.
    pub fn word_count(&self) -> usize {
        self.plain_text.split_whitespace().count()
    }
}

// ---------------------------------------------------------------------------
// Fetch outcome
// ---------------------------------------------------------------------------

/// Per-URL result of a scheduled unit of work. Failures carry enough context
/// for end-of-run reporting; they are never silently dropped.
#[derive(Debug, Clone)]
pub enum FetchOutcome<T> {
    /// The unit completed and produced a value.
    Success(T),
    /// The unit failed; siblings in the same batch were unaffected.
    Failure {
        url: String,
        error: String,
        elapsed_ms: u64,
    },
}

impl<T> FetchOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Borrow the success value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success(v) => Some(v),
            Self::Failure { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

/// A bounded-size slice of a document's text: the unit handed to the vector
/// store for indexing. Owned by the caller once emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk identifier (UUID v7, time-sortable).
    pub id: Uuid,
    /// Chunk text, always above the configured minimum length floor.
    pub content: String,
    /// URL of the source page.
    pub source_url: String,
    /// Document title (frontmatter title wins over the extracted one).
    pub title: String,
    /// Nearest enclosing section header, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
    /// Position within the source document; strictly increasing.
    pub ordinal_index: usize,
    /// Heuristic token estimate used for budgeting.
    pub estimated_token_count: usize,
    /// When the chunk was produced.
    pub created_at: DateTime<Utc>,
}
