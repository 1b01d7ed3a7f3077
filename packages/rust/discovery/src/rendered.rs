//! Rendered discovery: harvests links from a script-executed page load for
//! sites whose navigation only exists after hydration.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use tracing::{debug, info, instrument, warn};
use url::Url;

use docmill_shared::{DiscoveryResult, IngestConfig, Renderer, SiteProfile};

use crate::filter::UrlFilter;

/// Path prefixes that usually carry documentation content.
const DOC_PATH_ALLOW: &[&str] = &[
    "/docs/",
    "/guide/",
    "/tutorial/",
    "/learn/",
    "/getting-started/",
    "/introduction/",
    "/overview/",
    "/concepts/",
    "/examples/",
    "/reference/",
];

/// Path prefixes that never carry documentation content.
const DOC_PATH_DENY: &[&str] = &[
    "/api/", "/assets/", "/images/", "/img/", "/css/", "/js/", "/fonts/", "/_next/", "/_nuxt/",
    "/static/",
];

static ASSET_EXTENSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\.(jpg|jpeg|png|gif|svg|ico|css|js|json|xml|pdf|zip|woff2?)$")
        .case_insensitive(true)
        .build()
        .expect("static regex")
});

// ---------------------------------------------------------------------------
// RenderedDiscoverer
// ---------------------------------------------------------------------------

/// Finds candidate URLs by rendering the base page and collecting the links
/// that exist after script execution.
pub struct RenderedDiscoverer<'a> {
    renderer: &'a dyn Renderer,
}

impl<'a> RenderedDiscoverer<'a> {
    pub fn new(renderer: &'a dyn Renderer) -> Self {
        Self { renderer }
    }

    /// Discover in-scope URLs for `base_url` using the site profile's wait
    /// strategy. A render failure produces an empty result with a recorded
    /// error so the caller can fall back.
    #[instrument(skip_all, fields(url = %base_url))]
    pub async fn discover(
        &self,
        base_url: &Url,
        profile: &SiteProfile,
        config: &IngestConfig,
    ) -> DiscoveryResult {
        let mut result = DiscoveryResult::default();

        let filter = match UrlFilter::from_config(config) {
            Ok(f) => f,
            Err(e) => {
                result.push_error(e.to_string());
                return result;
            }
        };

        let page = match self
            .renderer
            .render(
                base_url.as_str(),
                profile.wait_strategy,
                profile.wait_selector.as_deref(),
                config.timeout_ms,
            )
            .await
        {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, "rendered discovery failed");
                result.push_error(format!("render {base_url}: {e}"));
                return result;
            }
        };

        let same_origin = resolve_same_origin(&page.links, base_url);
        debug!(
            raw = page.links.len(),
            same_origin = same_origin.len(),
            "rendered page links collected"
        );

        let allow: Vec<&str> = if config.doc_path_filters.is_empty() {
            DOC_PATH_ALLOW.to_vec()
        } else {
            config.doc_path_filters.iter().map(String::as_str).collect()
        };

        let mut candidates: Vec<String> = same_origin
            .iter()
            .filter(|u| path_looks_documentational(u, &allow))
            .cloned()
            .collect();

        // Sites that keep docs at the path root produce zero allow-list
        // matches; fall back to every same-origin page link, and say so.
        if candidates.is_empty() && !same_origin.is_empty() {
            warn!(links = same_origin.len(), "no documentation-path matches, widening scope");
            result.push_error(format!(
                "no documentation-path matches; widened to {} same-origin links",
                same_origin.len()
            ));
            candidates = same_origin;
        }

        if candidates.len() > config.max_rendered_urls {
            result.push_error(format!(
                "rendered discovery truncated to {} URLs",
                config.max_rendered_urls
            ));
            candidates.truncate(config.max_rendered_urls);
        }

        result.nav_urls = candidates.clone();
        result.urls = filter.freeze(candidates);

        info!(urls = result.urls.len(), "rendered discovery complete");
        result
    }
}

/// Resolve raw links against `base_url` and keep same-host page URLs,
/// dropping fragments, queries and asset paths.
fn resolve_same_origin(links: &[String], base_url: &Url) -> Vec<String> {
    links
        .iter()
        .filter_map(|link| base_url.join(link).ok())
        .filter(|u| u.host_str() == base_url.host_str())
        .filter(|u| u.fragment().is_none() && u.query().is_none())
        .filter(|u| !ASSET_EXTENSION_RE.is_match(u.path()))
        .map(|u| u.to_string())
        .collect()
}

fn path_looks_documentational(url: &str, allow: &[&str]) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let path = parsed.path();

    if DOC_PATH_DENY.iter().any(|deny| path.contains(deny)) {
        return false;
    }
    allow.iter().any(|prefix| path.contains(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    use docmill_shared::{
        AppConfig, DocmillError, RenderedPage, Result, WaitStrategy,
    };

    struct StubRenderer {
        links: Vec<String>,
        fail: bool,
    }

    #[async_trait]
    impl Renderer for StubRenderer {
        async fn render(
            &self,
            url: &str,
            _wait: WaitStrategy,
            _wait_selector: Option<&str>,
            _timeout_ms: u64,
        ) -> Result<RenderedPage> {
            if self.fail {
                return Err(DocmillError::Render(format!("{url}: browser crashed")));
            }
            Ok(RenderedPage {
                html: "<html></html>".into(),
                extracted_text: String::new(),
                links: self.links.clone(),
                metadata: HashMap::new(),
            })
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    fn default_config(base: &str) -> IngestConfig {
        IngestConfig::from_app_config(base, &AppConfig::default())
    }

    #[tokio::test]
    async fn keeps_doc_paths_and_drops_assets_and_api() {
        let renderer = StubRenderer {
            links: vec![
                "/docs/intro".into(),
                "/docs/install".into(),
                "/api/v1/users".into(),
                "/assets/logo.svg".into(),
                "https://other.example/docs/elsewhere".into(),
                "/guide/advanced".into(),
            ],
            fail: false,
        };

        let base = Url::parse("https://spa.example/").unwrap();
        let profile = SiteProfile::unknown();
        let discoverer = RenderedDiscoverer::new(&renderer);
        let result = discoverer
            .discover(&base, &profile, &default_config(base.as_str()))
            .await;

        assert_eq!(
            result.urls,
            vec![
                "https://spa.example/docs/intro".to_string(),
                "https://spa.example/docs/install".to_string(),
                "https://spa.example/guide/advanced".to_string(),
            ]
        );
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn falls_back_to_same_origin_when_no_doc_paths_match() {
        let renderer = StubRenderer {
            links: vec!["/start".into(), "/usage".into()],
            fail: false,
        };

        let base = Url::parse("https://spa.example/").unwrap();
        let discoverer = RenderedDiscoverer::new(&renderer);
        let result = discoverer
            .discover(&base, &SiteProfile::unknown(), &default_config(base.as_str()))
            .await;

        assert_eq!(result.urls.len(), 2);
        // The widened scope leaves a trace.
        assert!(result.errors.iter().any(|e| e.contains("widened")));
    }

    #[tokio::test]
    async fn render_failure_yields_empty_result_with_error() {
        let renderer = StubRenderer {
            links: vec![],
            fail: true,
        };

        let base = Url::parse("https://spa.example/").unwrap();
        let discoverer = RenderedDiscoverer::new(&renderer);
        let result = discoverer
            .discover(&base, &SiteProfile::unknown(), &default_config(base.as_str()))
            .await;

        assert!(result.urls.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("browser crashed"));
    }

    #[tokio::test]
    async fn url_cap_truncates_and_records() {
        let links: Vec<String> = (0..20).map(|i| format!("/docs/page-{i}")).collect();
        let renderer = StubRenderer { links, fail: false };

        let base = Url::parse("https://spa.example/").unwrap();
        let mut config = default_config(base.as_str());
        config.max_rendered_urls = 5;

        let discoverer = RenderedDiscoverer::new(&renderer);
        let result = discoverer
            .discover(&base, &SiteProfile::unknown(), &config)
            .await;

        assert_eq!(result.urls.len(), 5);
        assert!(result.errors.iter().any(|e| e.contains("truncated")));
    }
}
