//! End-to-end ingestion: classify, discover, extract, chunk.

use serde::Serialize;
use tracing::{info, instrument, warn};
use url::Url;

use docmill_chunking::{ChunkingEngine, DocumentSource};
use docmill_classify::{SiteClassifier, recommend_wait};
use docmill_discovery::DiscoveryCoordinator;
use docmill_extract::ExtractionCoordinator;
use docmill_shared::{
    Chunk, DocmillError, FetchOutcome, Fetcher, IngestConfig, ProgressReporter, ReaderMode,
    Renderer, Result, SiteProfile, Stage,
};

use crate::scheduler::FetchScheduler;

/// Cap on the per-URL error list carried in an [`IngestResult`].
const MAX_REPORTED_ERRORS: usize = 25;

/// Outcome of one ingestion run.
#[derive(Debug, Serialize)]
pub struct IngestResult {
    /// Base URL the run was configured with.
    pub base_url: String,
    /// Site profile the run operated under.
    pub profile: SiteProfile,
    /// URLs discovered (after filtering and the page cap).
    pub discovered_count: usize,
    /// Pages extracted successfully.
    pub success_count: usize,
    /// Pages that failed fetch or extraction.
    pub failure_count: usize,
    /// Per-URL errors, truncated to a reporting cap. Counts above are not.
    pub errors: Vec<(String, String)>,
    /// All chunks, in document input order.
    pub chunks: Vec<Chunk>,
}

/// Run the full ingestion pipeline for one base URL.
///
/// The renderer, when present, is closed before this returns, on success
/// and on error alike.
#[instrument(skip_all, fields(url = %config.base_url))]
pub async fn ingest(
    config: &IngestConfig,
    fetcher: &dyn Fetcher,
    renderer: Option<&dyn Renderer>,
    reader: Option<&dyn ReaderMode>,
    progress: &dyn ProgressReporter,
) -> Result<IngestResult> {
    let result = run_stages(config, fetcher, renderer, reader, progress).await;

    if let Some(renderer) = renderer {
        if let Err(e) = renderer.close().await {
            warn!(error = %e, "renderer close failed");
        }
    }

    result
}

async fn run_stages(
    config: &IngestConfig,
    fetcher: &dyn Fetcher,
    renderer: Option<&dyn Renderer>,
    reader: Option<&dyn ReaderMode>,
    progress: &dyn ProgressReporter,
) -> Result<IngestResult> {
    config.validate()?;
    let base_url = Url::parse(&config.base_url)
        .map_err(|e| DocmillError::config(format!("invalid base_url: {e}")))?;

    progress.phase(Stage::Classify);
    let profile = match config.forced_mode {
        Some(mode) => {
            info!(%mode, "classification skipped, mode forced");
            let (wait_strategy, wait_selector) = recommend_wait(mode, None);
            SiteProfile {
                rendering_mode: mode,
                score: 0,
                signals: vec![format!("mode forced to {mode}")],
                wait_strategy,
                wait_selector,
            }
        }
        None => {
            SiteClassifier::new(fetcher, config.rate_limit_ms)
                .analyze_site(&base_url)
                .await
        }
    };

    progress.phase(Stage::Discover);
    let discovery = DiscoveryCoordinator::new(fetcher, renderer)
        .discover(&base_url, &profile, config)
        .await;

    let mut urls = discovery.urls;
    if config.max_pages > 0 && urls.len() > config.max_pages {
        info!(cap = config.max_pages, found = urls.len(), "applying page cap");
        urls.truncate(config.max_pages);
    }

    let mut errors: Vec<(String, String)> = discovery
        .errors
        .iter()
        .map(|e| (config.base_url.clone(), e.clone()))
        .collect();

    // Rendered work holds a browser session per unit; keep its batches
    // narrower than plain fetches.
    let concurrency = if profile.needs_rendering() && renderer.is_some() {
        config.rendered_concurrency
    } else {
        config.concurrency
    };

    progress.phase(Stage::Extract);
    let coordinator = ExtractionCoordinator::new(fetcher, renderer, reader);
    let scheduler = FetchScheduler::new(concurrency, config.rate_limit_ms);
    let outcomes = scheduler
        .run(Stage::Extract, &urls, progress, |url| {
            let coordinator = &coordinator;
            let profile = &profile;
            async move {
                let parsed = Url::parse(&url)
                    .map_err(|e| DocmillError::parse(format!("{url}: {e}")))?;
                coordinator.extract(&parsed, profile, config).await
            }
        })
        .await;

    let mut sources: Vec<DocumentSource> = Vec::new();
    let mut failure_count = 0usize;
    for (url, outcome) in urls.iter().zip(outcomes) {
        match outcome {
            FetchOutcome::Success(doc) => sources.push(DocumentSource {
                url: url.clone(),
                title: doc.title,
                content: doc.plain_text,
            }),
            FetchOutcome::Failure { url, error, .. } => {
                failure_count += 1;
                errors.push((url, error));
            }
        }
    }

    progress.phase(Stage::Chunk);
    let chunks = ChunkingEngine::new(config.chunking.clone()).chunk_documents(&sources);

    let success_count = sources.len();
    errors.truncate(MAX_REPORTED_ERRORS);

    info!(
        discovered = urls.len(),
        succeeded = success_count,
        failed = failure_count,
        chunks = chunks.len(),
        "ingestion complete"
    );

    Ok(IngestResult {
        base_url: config.base_url.clone(),
        profile,
        discovered_count: urls.len(),
        success_count,
        failure_count,
        errors,
        chunks,
    })
}
