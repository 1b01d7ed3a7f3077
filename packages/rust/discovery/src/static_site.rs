//! Static discovery: sitemap.xml traversal with a navigation-anchor
//! fallback, no script execution required.

use std::collections::{HashSet, VecDeque};
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

use docmill_shared::{DiscoveryResult, Fetcher, IngestConfig};

use crate::filter::{UrlFilter, is_valid_doc_url};

/// `<loc>` entries inside sitemap XML.
static LOC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<loc>\s*([^<]+?)\s*</loc>").expect("static regex"));

/// Navigation containers scanned for anchors, in priority order.
const NAV_SELECTORS: &[&str] = &[
    "nav",
    r#"[role="navigation"]"#,
    ".navigation",
    ".nav",
    ".sidebar",
    ".menu",
    ".toc",
    ".table-of-contents",
];

/// Content containers scanned for anchors after navigation.
const CONTENT_SELECTORS: &[&str] = &["main", r#"[role="main"]"#, ".content", ".main-content", "article"];

// ---------------------------------------------------------------------------
// StaticDiscoverer
// ---------------------------------------------------------------------------

/// Finds candidate URLs from initial HTML only.
pub struct StaticDiscoverer<'a> {
    fetcher: &'a dyn Fetcher,
}

impl<'a> StaticDiscoverer<'a> {
    pub fn new(fetcher: &'a dyn Fetcher) -> Self {
        Self { fetcher }
    }

    /// Discover in-scope URLs for `base_url`. Degrades to a partial result
    /// with recorded errors; never fails.
    #[instrument(skip_all, fields(url = %base_url))]
    pub async fn discover(&self, base_url: &Url, config: &IngestConfig) -> DiscoveryResult {
        let mut result = DiscoveryResult::default();

        let filter = match UrlFilter::from_config(config) {
            Ok(f) => f,
            Err(e) => {
                result.push_error(e.to_string());
                return result;
            }
        };

        self.collect_sitemap_urls(base_url, config, &mut result).await;

        let mut raw = result.sitemap_urls.clone();

        // Sitemap came up empty: fall back to same-origin anchors in the
        // base page's navigation and content areas (non-recursive).
        if raw.is_empty() {
            self.collect_nav_urls(base_url, config, &mut result).await;
            raw.extend(result.nav_urls.iter().cloned());
        }

        result.urls = filter.freeze(raw);

        info!(
            urls = result.urls.len(),
            from_sitemap = result.sitemap_urls.len(),
            from_nav = result.nav_urls.len(),
            errors = result.errors.len(),
            "static discovery complete"
        );

        result
    }

    /// Walk `/sitemap.xml`, following nested sitemap indexes breadth-first.
    /// A seen-set guards against index cycles; the nested-sitemap cap bounds
    /// the walk.
    async fn collect_sitemap_urls(
        &self,
        base_url: &Url,
        config: &IngestConfig,
        result: &mut DiscoveryResult,
    ) {
        let root = match base_url.join("/sitemap.xml") {
            Ok(u) => u.to_string(),
            Err(e) => {
                result.push_error(format!("unresolvable sitemap URL: {e}"));
                return;
            }
        };

        let mut queue = VecDeque::from([root]);
        let mut seen: HashSet<String> = HashSet::new();
        let mut fetched = 0usize;

        while let Some(sitemap_url) = queue.pop_front() {
            if !seen.insert(sitemap_url.clone()) {
                continue;
            }
            if fetched >= config.max_nested_sitemaps {
                result.push_error(format!(
                    "sitemap traversal stopped at {} nested sitemaps",
                    config.max_nested_sitemaps
                ));
                break;
            }
            fetched += 1;

            match self.fetcher.fetch(&sitemap_url, config.rate_limit_ms).await {
                Ok(response) => {
                    let body = response.body;
                    if !looks_like_xml(&body) {
                        debug!(url = %sitemap_url, "sitemap response is not XML");
                        continue;
                    }

                    let locs = parse_loc_entries(&body);
                    if body.contains("<sitemapindex") {
                        debug!(url = %sitemap_url, nested = locs.len(), "sitemap index");
                        queue.extend(locs);
                    } else {
                        result.sitemap_urls.extend(
                            locs.into_iter().filter(|u| is_valid_doc_url(u, base_url)),
                        );
                    }
                }
                Err(e) => {
                    debug!(url = %sitemap_url, error = %e, "sitemap fetch failed");
                    result.push_error(format!("sitemap {sitemap_url}: {e}"));
                }
            }
        }
    }

    /// Fetch the base page and pull same-origin anchors from navigation and
    /// content containers.
    async fn collect_nav_urls(
        &self,
        base_url: &Url,
        config: &IngestConfig,
        result: &mut DiscoveryResult,
    ) {
        match self.fetcher.fetch(base_url.as_str(), config.rate_limit_ms).await {
            Ok(response) => {
                result.nav_urls = extract_nav_links(
                    &response.body,
                    base_url,
                    config.selectors.navigation.as_deref(),
                );
                debug!(urls = result.nav_urls.len(), "navigation fallback");
            }
            Err(e) => {
                result.push_error(format!("navigation discovery: {e}"));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn looks_like_xml(body: &str) -> bool {
    body.contains("<?xml") || body.contains("<urlset") || body.contains("<sitemapindex")
}

/// Extract `<loc>` entry values from sitemap XML.
pub fn parse_loc_entries(xml: &str) -> Vec<String> {
    LOC_RE
        .captures_iter(xml)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Pull same-origin documentation anchors out of navigation and content
/// areas of a single page.
fn extract_nav_links(html: &str, base_url: &Url, nav_override: Option<&str>) -> Vec<String> {
    let doc = Html::parse_document(html);
    let anchor = Selector::parse("a[href]").expect("static selector");

    let mut urls = Vec::new();
    let mut containers: Vec<&str> = Vec::new();
    if let Some(custom) = nav_override {
        containers.push(custom);
    }
    containers.extend(NAV_SELECTORS);
    containers.extend(CONTENT_SELECTORS);

    for container in containers {
        let Ok(selector) = Selector::parse(container) else {
            debug!(selector = container, "skipping unparsable navigation selector");
            continue;
        };

        for element in doc.select(&selector) {
            for link in element.select(&anchor) {
                let Some(href) = link.value().attr("href") else {
                    continue;
                };
                if let Ok(resolved) = base_url.join(href) {
                    let resolved = resolved.to_string();
                    if is_valid_doc_url(&resolved, base_url) {
                        urls.push(resolved);
                    }
                }
            }
        }
    }

    urls
}
