//! Code-aware document chunking.
//!
//! The engine turns extracted documents into bounded-size, semantically
//! coherent chunks through a fixed stage order: strip frontmatter, mask code
//! regions, split at header boundaries, pack each section against a token
//! budget, carry a bounded trailing overlap, and drop fragments below the
//! minimum length floor. Code blocks within budget are never split; chunk
//! text and ordinal order are pure functions of the input.

mod frontmatter;
mod mask;
mod pack;
mod sections;

use chrono::Utc;
use tracing::{debug, instrument};
use uuid::Uuid;

use docmill_shared::{Chunk, ChunkingConfig};

pub use frontmatter::strip_frontmatter;
pub use mask::{MaskedDocument, mask_code_blocks};
pub use pack::{estimate_tokens, split_sentences};
pub use sections::split_sections;

/// One extracted document queued for chunking.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    /// Source page URL, copied onto every chunk.
    pub url: String,
    /// Extracted title; a frontmatter `title` overrides it.
    pub title: String,
    /// Plain text or markdown to chunk.
    pub content: String,
}

// ---------------------------------------------------------------------------
// ChunkingEngine
// ---------------------------------------------------------------------------

/// Splits documents into chunks under a configured token budget.
pub struct ChunkingEngine {
    config: ChunkingConfig,
}

impl ChunkingEngine {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Chunk every document, concatenating per-document output in input
    /// order. Ordinals restart per document.
    pub fn chunk_documents(&self, sources: &[DocumentSource]) -> Vec<Chunk> {
        sources
            .iter()
            .flat_map(|source| self.chunk_document(source))
            .collect()
    }

    /// Chunk one document. Returns an empty vec for content that never
    /// clears the minimum length floor.
    #[instrument(skip_all, fields(url = %source.url))]
    pub fn chunk_document(&self, source: &DocumentSource) -> Vec<Chunk> {
        let (fm, body) = strip_frontmatter(&source.content);
        let title = fm
            .title()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&source.title)
            .to_string();

        let masked = mask_code_blocks(body);
        let sections = split_sections(&masked.text);

        let base_budget = self.config.chunk_size;
        let code_budget =
            (self.config.chunk_size as f64 * self.config.code_budget_multiplier) as usize;

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut ordinal = 0usize;

        for section in &sections {
            // Code-bearing sections get the widened budget so blocks that
            // fit stay whole.
            let budget = if masked.has_code(&section.body) {
                code_budget
            } else {
                base_budget
            };

            for packed in pack::pack_section(
                &section.body,
                &masked,
                budget,
                self.config.chunk_overlap,
            ) {
                let content = packed.content.trim().to_string();
                if content.len() < self.config.min_chunk_chars {
                    debug!(len = content.len(), "dropping under-floor chunk");
                    continue;
                }

                chunks.push(Chunk {
                    id: Uuid::now_v7(),
                    content,
                    source_url: source.url.clone(),
                    title: title.clone(),
                    section_title: section.title.clone(),
                    ordinal_index: ordinal,
                    estimated_token_count: packed.tokens,
                    created_at: Utc::now(),
                });
                ordinal += 1;
            }
        }

        debug!(chunks = chunks.len(), sections = sections.len(), "document chunked");
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ChunkingEngine {
        ChunkingEngine::new(ChunkingConfig::default())
    }

    fn source(content: &str) -> DocumentSource {
        DocumentSource {
            url: "https://docs.example.com/guide".into(),
            title: "Extracted Title".into(),
            content: content.into(),
        }
    }

    fn prose(words: usize) -> String {
        "All work and no play makes the documentation dull. ".repeat(words / 9)
    }

    #[test]
    fn frontmatter_title_overrides_extracted() {
        let content = format!("---\ntitle: Frontmatter Title\n---\n\n{}", prose(200));
        let chunks = engine().chunk_document(&source(&content));

        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.title == "Frontmatter Title"));
    }

    #[test]
    fn section_titles_follow_headers() {
        let content = format!(
            "# Install\n\n{}\n\n# Configure\n\n{}",
            prose(120),
            prose(120)
        );
        let chunks = engine().chunk_document(&source(&content));

        let titles: Vec<_> = chunks
            .iter()
            .filter_map(|c| c.section_title.as_deref())
            .collect();
        assert!(titles.contains(&"Install"));
        assert!(titles.contains(&"Configure"));
    }

    #[test]
    fn ordinals_are_strictly_increasing() {
        let content = format!(
            "# A\n\n{}\n\n# B\n\n{}\n\n# C\n\n{}",
            prose(900),
            prose(900),
            prose(900)
        );
        let chunks = engine().chunk_document(&source(&content));

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.ordinal_index, i);
        }
    }

    #[test]
    fn code_block_within_budget_stays_whole() {
        let code = "```rust\nfn handler() {\n    respond(42);\n}\n```";
        let content = format!("# Usage\n\n{}\n\n{code}\n\n{}", prose(150), prose(150));
        let chunks = engine().chunk_document(&source(&content));

        let carrying: Vec<_> = chunks
            .iter()
            .filter(|c| c.content.contains("fn handler"))
            .collect();
        assert_eq!(carrying.len(), 1);
        assert!(carrying[0].content.contains("```rust"));
        assert!(carrying[0].content.contains("respond(42);"));
    }

    #[test]
    fn fences_survive_chunk_boundaries() {
        let fences: Vec<String> = (0..3)
            .map(|i| format!("```rust\nfn block_{i}() {{\n    body_{i}();\n}}\n```"))
            .collect();
        let content = format!(
            "{}\n\n{}\n\n{}\n\n{}\n\n{}\n\n{}",
            prose(400),
            fences[0],
            prose(400),
            fences[1],
            prose(400),
            fences[2]
        );
        let config = ChunkingConfig {
            chunk_size: 200,
            chunk_overlap: 0,
            ..Default::default()
        };
        let chunks = ChunkingEngine::new(config).chunk_document(&source(&content));
        assert!(chunks.len() > 1);

        // Every fence appears exactly once and intact in exactly one chunk.
        for (i, fence) in fences.iter().enumerate() {
            let holders: Vec<_> = chunks
                .iter()
                .filter(|c| c.content.contains(&format!("fn block_{i}")))
                .collect();
            assert_eq!(holders.len(), 1, "fence {i} split across chunks");
            assert!(holders[0].content.contains(fence.as_str()));
        }
    }

    #[test]
    fn two_section_markdown_with_fence() {
        let content = "# Title\n\nPara1.\n\n```js\ncode\n```\n\n## Sub\n\nPara2.";
        let config = ChunkingConfig {
            min_chunk_chars: 5,
            ..Default::default()
        };
        let chunks = ChunkingEngine::new(config).chunk_document(&source(content));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].section_title.as_deref(), Some("Title"));
        assert_eq!(chunks[1].section_title.as_deref(), Some("Sub"));
        assert!(chunks[0].content.contains("```js\ncode\n```"));
        assert!(chunks[1].content.contains("Para2."));
    }

    #[test]
    fn placeholders_never_leak() {
        let content = format!(
            "Intro with code:\n\n```py\nprint('hello')\n```\n\n{}",
            prose(300)
        );
        let chunks = engine().chunk_document(&source(&content));
        for chunk in &chunks {
            assert!(!chunk.content.contains("__CODE_BLOCK_"));
        }
    }

    #[test]
    fn under_floor_fragments_are_dropped() {
        let chunks = engine().chunk_document(&source("tiny."));
        assert!(chunks.is_empty());
    }

    #[test]
    fn content_sequence_is_deterministic() {
        let content = format!("# One\n\n{}\n\n# Two\n\n{}", prose(1200), prose(600));
        let first: Vec<String> = engine()
            .chunk_document(&source(&content))
            .into_iter()
            .map(|c| c.content)
            .collect();
        let second: Vec<String> = engine()
            .chunk_document(&source(&content))
            .into_iter()
            .map(|c| c.content)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn multiple_documents_concatenate_in_order() {
        let sources = vec![
            DocumentSource {
                url: "https://docs.example.com/a".into(),
                title: "A".into(),
                content: prose(200),
            },
            DocumentSource {
                url: "https://docs.example.com/b".into(),
                title: "B".into(),
                content: prose(200),
            },
        ];
        let chunks = engine().chunk_documents(&sources);

        let first_b = chunks
            .iter()
            .position(|c| c.source_url.ends_with("/b"))
            .unwrap();
        assert!(chunks[..first_b]
            .iter()
            .all(|c| c.source_url.ends_with("/a")));
        // Ordinals restart for the second document.
        assert_eq!(chunks[first_b].ordinal_index, 0);
    }

    #[test]
    fn estimated_tokens_are_positive_and_bounded() {
        let content = prose(2000);
        let chunks = engine().chunk_document(&source(&content));
        for chunk in &chunks {
            assert!(chunk.estimated_token_count > 0);
            // Budget plus one oversize unit of slack.
            assert!(chunk.estimated_token_count <= 800 + 200);
        }
    }
}
