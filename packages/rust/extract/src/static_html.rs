//! Static HTML extraction: boilerplate stripping, content-element selection
//! and metadata harvesting over the initial HTML, no script execution.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use docmill_shared::{DocumentMetadata, ExtractedDocument, SelectorOverrides};

/// Elements whose subtree is never content.
const BOILERPLATE_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "nav", "header", "footer", "aside",
];

/// Class/attribute selectors stripped as boilerplate before extraction.
const BOILERPLATE_SELECTORS: &[&str] = &[
    ".ad",
    ".ads",
    ".advertisement",
    ".cookie-banner",
    ".cookie-consent",
    ".social-share",
    ".share-buttons",
    ".sidebar",
    ".breadcrumb",
    ".breadcrumbs",
];

/// Content container candidates tried after any caller override, best
/// text-yield wins.
const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    r#"[role="main"]"#,
    ".content",
    ".main-content",
    ".post-content",
    ".entry-content",
    ".page-content",
    ".documentation-content",
];

/// Elements that terminate a text block when flattening to plain text.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "li", "tr", "pre", "blockquote", "h1", "h2", "h3", "h4",
    "h5", "h6", "br",
];

/// Title used when no title source yields text.
pub const FALLBACK_TITLE: &str = "Untitled Page";

// ---------------------------------------------------------------------------
// StaticExtractor
// ---------------------------------------------------------------------------

/// Extracts clean content from already-fetched HTML. Pure and infallible:
/// the worst input still produces a (possibly low-quality) document.
pub struct StaticExtractor;

impl StaticExtractor {
    /// Extract a document from `html` fetched at `base_url`.
    pub fn extract(
        html: &str,
        base_url: &Url,
        selectors: &SelectorOverrides,
    ) -> ExtractedDocument {
        let doc = Html::parse_document(html);
        let excludes = compile_excludes(&selectors.exclude);

        let content_el = pick_content_element(&doc, selectors.content.as_deref(), &excludes);

        let (raw_content, plain_text) = match content_el {
            Some(el) => (el.html(), visible_text(el, &excludes)),
            // Last resort: the whole body after boilerplate stripping.
            None => {
                debug!("no content container matched, using body");
                let body = Selector::parse("body").expect("static selector");
                match doc.select(&body).next() {
                    Some(el) => (el.html(), visible_text(el, &excludes)),
                    None => (html.to_string(), String::new()),
                }
            }
        };

        let title = resolve_title(&doc, selectors.title.as_deref());
        let links = collect_links(&doc, base_url);
        let metadata = collect_metadata(&doc);

        let word_count = plain_text.split_whitespace().count();

        ExtractedDocument {
            title,
            raw_content,
            plain_text,
            links,
            metadata,
            quality_score: word_count.min(u32::MAX as usize) as u32,
        }
    }
}

fn compile_excludes(extra: &[String]) -> Vec<Selector> {
    BOILERPLATE_SELECTORS
        .iter()
        .copied()
        .map(String::from)
        .chain(extra.iter().cloned())
        .filter_map(|s| match Selector::parse(&s) {
            Ok(sel) => Some(sel),
            Err(_) => {
                debug!(selector = %s, "skipping unparsable exclude selector");
                None
            }
        })
        .collect()
}

/// Pick the content container. A caller-supplied selector wins when it
/// matches; otherwise the built-in candidate with the most visible text.
fn pick_content_element<'a>(
    doc: &'a Html,
    content_override: Option<&str>,
    excludes: &[Selector],
) -> Option<ElementRef<'a>> {
    if let Some(custom) = content_override {
        if let Ok(selector) = Selector::parse(custom) {
            if let Some(el) = doc.select(&selector).next() {
                return Some(el);
            }
        }
    }

    let mut best: Option<(usize, ElementRef<'a>)> = None;
    for candidate in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        if let Some(el) = doc.select(&selector).next() {
            let yield_len = visible_text(el, excludes).len();
            if best.as_ref().is_none_or(|(len, _)| yield_len > *len) {
                best = Some((yield_len, el));
            }
        }
    }
    best.map(|(_, el)| el)
}

/// Flatten an element's subtree to whitespace-normalized text, skipping
/// boilerplate subtrees.
fn visible_text(root: ElementRef<'_>, excludes: &[Selector]) -> String {
    let mut out = String::new();
    push_text(root, excludes, &mut out);

    // Collapse runs of spaces per line, drop blank-only lines to one break.
    let mut lines: Vec<String> = Vec::new();
    for line in out.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if !collapsed.is_empty() {
            lines.push(collapsed);
        }
    }
    lines.join("\n")
}

fn push_text(el: ElementRef<'_>, excludes: &[Selector], out: &mut String) {
    let name = el.value().name();
    if BOILERPLATE_TAGS.contains(&name) {
        return;
    }
    if excludes.iter().any(|s| s.matches(&el)) {
        return;
    }

    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            push_text(child_el, excludes, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }

    if BLOCK_TAGS.contains(&name) {
        out.push('\n');
    }
}

/// Title chain: caller selector, first `h1`, `<title>`, then the fallback
/// literal. Empty matches advance the chain.
fn resolve_title(doc: &Html, title_override: Option<&str>) -> String {
    let mut candidates: Vec<String> = Vec::new();
    if let Some(custom) = title_override {
        candidates.push(custom.to_string());
    }
    candidates.push("h1".to_string());
    candidates.push("title".to_string());

    for candidate in candidates {
        let Ok(selector) = Selector::parse(&candidate) else {
            continue;
        };
        if let Some(el) = doc.select(&selector).next() {
            let text = el.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                return text;
            }
        }
    }

    FALLBACK_TITLE.to_string()
}

/// Absolute links from every anchor, resolved against the page URL and
/// deduplicated in first-seen order.
fn collect_links(doc: &Html, base_url: &Url) -> Vec<String> {
    let anchor = Selector::parse("a[href]").expect("static selector");
    let mut seen = std::collections::HashSet::new();
    doc.select(&anchor)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| base_url.join(href).ok())
        .map(|u| u.to_string())
        .filter(|u| seen.insert(u.clone()))
        .collect()
}

fn collect_metadata(doc: &Html) -> DocumentMetadata {
    let meta_content = |selector: &str| -> Option<String> {
        let sel = Selector::parse(selector).ok()?;
        doc.select(&sel)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    let description = meta_content(r#"meta[name="description"]"#)
        .or_else(|| meta_content(r#"meta[property="og:description"]"#));
    let author = meta_content(r#"meta[name="author"]"#);

    let canonical = Selector::parse(r#"link[rel="canonical"]"#)
        .ok()
        .and_then(|sel| {
            doc.select(&sel)
                .next()
                .and_then(|el| el.value().attr("href"))
                .map(String::from)
        });

    DocumentMetadata {
        description,
        author,
        canonical_url: canonical,
        framework: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> ExtractedDocument {
        let url = Url::parse("https://docs.example.com/guide/intro").unwrap();
        StaticExtractor::extract(html, &url, &SelectorOverrides::default())
    }

    #[test]
    fn strips_nav_script_and_footer() {
        let doc = extract(
            r#"<html><head><title>Guide</title></head><body>
                <nav><a href="/other">menu item</a></nav>
                <script>var tracking = true;</script>
                <main><p>The actual guide content.</p></main>
                <footer>copyright notice</footer>
            </body></html>"#,
        );

        assert_eq!(doc.plain_text, "The actual guide content.");
        assert!(!doc.plain_text.contains("menu item"));
        assert!(!doc.plain_text.contains("tracking"));
        assert!(!doc.plain_text.contains("copyright"));
    }

    #[test]
    fn title_chain_prefers_h1_over_title_tag() {
        let doc = extract(
            "<html><head><title>site.example</title></head>\
             <body><main><h1>Installation</h1><p>steps</p></main></body></html>",
        );
        assert_eq!(doc.title, "Installation");

        let doc = extract(
            "<html><head><title>Only Title</title></head><body><main><p>x</p></main></body></html>",
        );
        assert_eq!(doc.title, "Only Title");

        let doc = extract("<html><body><main><p>x</p></main></body></html>");
        assert_eq!(doc.title, FALLBACK_TITLE);
    }

    #[test]
    fn caller_title_selector_wins() {
        let url = Url::parse("https://docs.example.com/").unwrap();
        let selectors = SelectorOverrides {
            title: Some(".doc-title".into()),
            ..Default::default()
        };
        let doc = StaticExtractor::extract(
            "<html><body><h1>Wrong</h1><span class=\"doc-title\">Right</span></body></html>",
            &url,
            &selectors,
        );
        assert_eq!(doc.title, "Right");
    }

    #[test]
    fn picks_container_with_most_text() {
        let doc = extract(
            r#"<html><body>
                <div class="content">short teaser</div>
                <article>This article holds the substantially longer body of
                the page and should be chosen over the teaser div.</article>
            </body></html>"#,
        );
        assert!(doc.plain_text.contains("substantially longer"));
        assert!(!doc.plain_text.contains("short teaser"));
    }

    #[test]
    fn falls_back_to_body_when_nothing_matches() {
        let doc = extract("<html><body><p>bare paragraph</p></body></html>");
        assert_eq!(doc.plain_text, "bare paragraph");
    }

    #[test]
    fn links_are_absolute_and_deduped() {
        let doc = extract(
            r#"<html><body><main>
                <a href="/a">one</a>
                <a href="/a">again</a>
                <a href="sibling">rel</a>
                <a href="https://other.example/x">ext</a>
            </main></body></html>"#,
        );
        assert_eq!(
            doc.links,
            vec![
                "https://docs.example.com/a".to_string(),
                "https://docs.example.com/guide/sibling".to_string(),
                "https://other.example/x".to_string(),
            ]
        );
    }

    #[test]
    fn metadata_from_meta_tags() {
        let doc = extract(
            r#"<html><head>
                <meta name="description" content="A guide.">
                <meta name="author" content="Docs Team">
                <link rel="canonical" href="https://docs.example.com/guide/intro">
            </head><body><main>x</main></body></html>"#,
        );
        assert_eq!(doc.metadata.description.as_deref(), Some("A guide."));
        assert_eq!(doc.metadata.author.as_deref(), Some("Docs Team"));
        assert_eq!(
            doc.metadata.canonical_url.as_deref(),
            Some("https://docs.example.com/guide/intro")
        );
    }

    #[test]
    fn og_description_is_the_fallback() {
        let doc = extract(
            r#"<html><head>
                <meta property="og:description" content="Social description.">
            </head><body><main>x</main></body></html>"#,
        );
        assert_eq!(doc.metadata.description.as_deref(), Some("Social description."));
    }
}
