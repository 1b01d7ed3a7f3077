//! Rendered extraction: drives the rendering capability and normalizes the
//! result into the same document shape the static path produces.

use tracing::{debug, instrument};
use url::Url;

use docmill_shared::{
    ExtractedDocument, IngestConfig, RenderedPage, Renderer, Result, SiteProfile,
};

use crate::static_html::StaticExtractor;

/// Extracts content from pages that need script execution.
pub struct RenderedExtractor<'a> {
    renderer: &'a dyn Renderer,
}

impl<'a> RenderedExtractor<'a> {
    pub fn new(renderer: &'a dyn Renderer) -> Self {
        Self { renderer }
    }

    /// Render `url` with the profile's wait strategy and extract from the
    /// settled DOM. Fails with `DocmillError::Render` when the renderer does.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn extract(
        &self,
        url: &Url,
        profile: &SiteProfile,
        config: &IngestConfig,
    ) -> Result<ExtractedDocument> {
        let page = self
            .renderer
            .render(
                url.as_str(),
                profile.wait_strategy,
                profile.wait_selector.as_deref(),
                config.timeout_ms,
            )
            .await?;

        Ok(document_from_page(page, url, config))
    }
}

/// Run the static extractor over the settled HTML, then let the renderer's
/// own text and metadata win where they are richer.
fn document_from_page(page: RenderedPage, url: &Url, config: &IngestConfig) -> ExtractedDocument {
    let mut doc = StaticExtractor::extract(&page.html, url, &config.selectors);

    if page.extracted_text.len() > doc.plain_text.len() {
        debug!(
            renderer_len = page.extracted_text.len(),
            parsed_len = doc.plain_text.len(),
            "using renderer-extracted text"
        );
        doc.plain_text = page.extracted_text;
        doc.quality_score = doc.word_count().min(u32::MAX as usize) as u32;
    }

    if !page.links.is_empty() {
        let mut seen = std::collections::HashSet::new();
        doc.links = page
            .links
            .iter()
            .filter_map(|link| url.join(link).ok())
            .map(|u| u.to_string())
            .filter(|u| seen.insert(u.clone()))
            .collect();
    }

    if let Some(description) = page.metadata.get("description") {
        doc.metadata.description = Some(description.clone());
    }
    if let Some(author) = page.metadata.get("author") {
        doc.metadata.author = Some(author.clone());
    }
    if let Some(framework) = page.metadata.get("framework") {
        doc.metadata.framework = Some(framework.clone());
    }

    doc
}
