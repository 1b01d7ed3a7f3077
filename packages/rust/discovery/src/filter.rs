//! URL scope filtering shared by both discoverers.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use url::Url;

use docmill_shared::{DocmillError, IngestConfig, Result};

/// Asset and machinery URLs that are never documentation pages.
static SKIP_EXTENSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\.(jpg|jpeg|png|gif|svg|ico|css|js|json|xml|pdf|zip|woff2?)$")
        .case_insensitive(true)
        .build()
        .expect("static regex")
});

static SKIP_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"/(api|rss|feed|sitemap)")
        .case_insensitive(true)
        .build()
        .expect("static regex")
});

/// True when `url` is a same-host candidate documentation page: not an
/// asset, not a feed/API path, no fragment, no query string.
pub fn is_valid_doc_url(url: &str, base: &Url) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    if parsed.host_str() != base.host_str() {
        return false;
    }
    if parsed.fragment().is_some() || parsed.query().is_some() {
        return false;
    }
    if SKIP_EXTENSION_RE.is_match(parsed.path()) || SKIP_PATH_RE.is_match(parsed.path()) {
        return false;
    }

    true
}

/// Compiled include/exclude/doc-path scope, applied when a
/// [`DiscoveryResult`](docmill_shared::DiscoveryResult) is frozen.
pub struct UrlFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
    doc_path_filters: Vec<String>,
}

impl UrlFilter {
    /// Compile the filter from a runtime config. Pattern validity was
    /// already checked by `IngestConfig::validate`, but compilation can
    /// still be driven directly in tests.
    pub fn from_config(config: &IngestConfig) -> Result<Self> {
        let compile = |patterns: &[String]| -> Result<Vec<Regex>> {
            patterns
                .iter()
                .map(|p| {
                    Regex::new(p).map_err(|e| {
                        DocmillError::config(format!("invalid URL filter pattern {p:?}: {e}"))
                    })
                })
                .collect()
        };

        Ok(Self {
            include: compile(&config.include_patterns)?,
            exclude: compile(&config.exclude_patterns)?,
            doc_path_filters: config.doc_path_filters.clone(),
        })
    }

    /// True when `url` survives include/exclude and doc-path filtering.
    pub fn accepts(&self, url: &str) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|re| re.is_match(url)) {
            return false;
        }
        if self.exclude.iter().any(|re| re.is_match(url)) {
            return false;
        }
        if !self.doc_path_filters.is_empty() {
            let path = Url::parse(url).map(|u| u.path().to_string()).unwrap_or_default();
            if !self.doc_path_filters.iter().any(|f| path.contains(f.as_str())) {
                return false;
            }
        }
        true
    }

    /// Freeze a raw URL list: filter, then deduplicate preserving first-seen
    /// order. Discovery output must be frozen before any scheduling.
    pub fn freeze(&self, urls: impl IntoIterator<Item = String>) -> Vec<String> {
        let mut seen = HashSet::new();
        urls.into_iter()
            .filter(|u| self.accepts(u))
            .filter(|u| seen.insert(u.clone()))
            .collect()
    }
}
