//! Content extraction with a quality-gated strategy chain.
//!
//! Three strategies share one output shape: [`ReaderModeExtractor`] (remote
//! pre-cleaned markdown), [`RenderedExtractor`] (script-executed DOM) and
//! [`StaticExtractor`] (initial HTML). [`ExtractionCoordinator`] walks them
//! in priority order; a candidate advances the chain when its strategy
//! errors or the result fails the quality gate. Static extraction is the
//! guaranteed last resort.

mod reader;
mod rendered;
mod static_html;

use std::fmt;

use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use url::Url;

use docmill_shared::{
    ExtractedDocument, Fetcher, IngestConfig, ReaderMode, Renderer, Result, SiteProfile,
};

pub use reader::ReaderModeExtractor;
pub use rendered::RenderedExtractor;
pub use static_html::{FALLBACK_TITLE, StaticExtractor};

/// Minimum words for a candidate to pass the quality gate.
const MIN_WORD_COUNT: usize = 50;

/// Minimum plain-text length for a candidate to pass the quality gate.
const MIN_CONTENT_CHARS: usize = 500;

/// Why a candidate document was rejected. Internal to the chain; callers
/// only ever see the final fallback result or the strategy error.
#[derive(Debug)]
struct ExtractionQualityError {
    word_count: usize,
    content_length: usize,
}

impl fmt::Display for ExtractionQualityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "below quality gate: {} words, {} chars",
            self.word_count, self.content_length
        )
    }
}

/// Check a candidate against the admission thresholds.
fn quality_gate(doc: &ExtractedDocument) -> std::result::Result<(), ExtractionQualityError> {
    let word_count = doc.word_count();
    let content_length = doc.plain_text.len();

    if word_count >= MIN_WORD_COUNT
        && content_length >= MIN_CONTENT_CHARS
        && !doc.title.trim().is_empty()
    {
        Ok(())
    } else {
        Err(ExtractionQualityError {
            word_count,
            content_length,
        })
    }
}

// ---------------------------------------------------------------------------
// ExtractionCoordinator
// ---------------------------------------------------------------------------

/// Walks the extraction strategy chain for one URL.
pub struct ExtractionCoordinator<'a> {
    fetcher: &'a dyn Fetcher,
    renderer: Option<&'a dyn Renderer>,
    reader: Option<&'a dyn ReaderMode>,
    // One browser session backs the renderer; concurrent units must not
    // drive it at the same time, so render calls take turns here.
    render_lock: Mutex<()>,
}

impl<'a> ExtractionCoordinator<'a> {
    pub fn new(
        fetcher: &'a dyn Fetcher,
        renderer: Option<&'a dyn Renderer>,
        reader: Option<&'a dyn ReaderMode>,
    ) -> Self {
        Self {
            fetcher,
            renderer,
            reader,
            render_lock: Mutex::new(()),
        }
    }

    /// Extract one document for `url`.
    ///
    /// Fails only when every strategy in the chain failed to produce any
    /// document at all (typically the final static fetch erroring); a
    /// low-quality document from a working strategy is still returned.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn extract(
        &self,
        url: &Url,
        profile: &SiteProfile,
        config: &IngestConfig,
    ) -> Result<ExtractedDocument> {
        // Best rejected candidate, returned if the last resort also breaks.
        let mut rejected: Option<ExtractedDocument> = None;

        if config.use_reader_mode {
            if let Some(reader) = self.reader {
                match ReaderModeExtractor::new(reader).extract(url).await {
                    Ok(doc) => match quality_gate(&doc) {
                        Ok(()) => {
                            debug!(strategy = "reader", "extraction accepted");
                            return Ok(doc);
                        }
                        Err(e) => {
                            debug!(strategy = "reader", %e, "candidate rejected");
                            rejected = pick_better(rejected, doc);
                        }
                    },
                    Err(e) => warn!(strategy = "reader", error = %e, "strategy failed"),
                }
            } else {
                warn!("reader mode requested but no reader is configured");
            }
        }

        if profile.needs_rendering() {
            if let Some(renderer) = self.renderer {
                let outcome = {
                    let _session = self.render_lock.lock().await;
                    RenderedExtractor::new(renderer)
                        .extract(url, profile, config)
                        .await
                };
                match outcome {
                    Ok(doc) => match quality_gate(&doc) {
                        Ok(()) => {
                            debug!(strategy = "rendered", "extraction accepted");
                            return Ok(doc);
                        }
                        Err(e) => {
                            debug!(strategy = "rendered", %e, "candidate rejected");
                            rejected = pick_better(rejected, doc);
                        }
                    },
                    Err(e) => warn!(strategy = "rendered", error = %e, "strategy failed"),
                }
            }
        }

        match self.fetcher.fetch(url.as_str(), config.rate_limit_ms).await {
            Ok(response) => Ok(StaticExtractor::extract(
                &response.body,
                url,
                &config.selectors,
            )),
            Err(e) => match rejected {
                // An earlier low-quality candidate beats no document.
                Some(doc) => {
                    warn!(error = %e, "static fetch failed, keeping rejected candidate");
                    Ok(doc)
                }
                None => Err(e),
            },
        }
    }
}

fn pick_better(
    current: Option<ExtractedDocument>,
    candidate: ExtractedDocument,
) -> Option<ExtractedDocument> {
    match current {
        Some(existing) if existing.plain_text.len() >= candidate.plain_text.len() => {
            Some(existing)
        }
        _ => Some(candidate),
    }
}
