//! Reader-mode extraction: a remote service returns pre-cleaned markdown,
//! which already carries the structure the chunker wants.

use tracing::instrument;
use url::Url;

use docmill_shared::{
    DocmillError, DocumentMetadata, ExtractedDocument, ReaderMode, Result,
};

use crate::static_html::FALLBACK_TITLE;

/// Extracts content through the reader-mode capability.
pub struct ReaderModeExtractor<'a> {
    reader: &'a dyn ReaderMode,
}

impl<'a> ReaderModeExtractor<'a> {
    pub fn new(reader: &'a dyn ReaderMode) -> Self {
        Self { reader }
    }

    /// Fetch `url` through the reader service. Empty content fails with
    /// `DocmillError::Reader` so the caller can advance to the next strategy.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn extract(&self, url: &Url) -> Result<ExtractedDocument> {
        let reader_doc = self.reader.fetch_reader(url.as_str()).await?;

        let markdown = reader_doc.markdown_content.trim().to_string();
        if markdown.is_empty() {
            return Err(DocmillError::Reader(format!("{url}: empty reader response")));
        }

        let title = reader_doc
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| title_from_markdown(&markdown));

        let word_count = markdown.split_whitespace().count();

        Ok(ExtractedDocument {
            title,
            plain_text: markdown.clone(),
            raw_content: markdown,
            links: Vec::new(),
            metadata: DocumentMetadata::default(),
            quality_score: word_count.min(u32::MAX as usize) as u32,
        })
    }
}

/// First non-empty line with leading `#` markers stripped.
fn title_from_markdown(markdown: &str) -> String {
    markdown
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.trim_start_matches('#').trim().to_string())
        .filter(|line| !line.is_empty())
        .unwrap_or_else(|| FALLBACK_TITLE.to_string())
}
