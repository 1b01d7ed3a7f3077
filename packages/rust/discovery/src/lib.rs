//! URL discovery for documentation sites.
//!
//! Two discoverers share one output shape: [`StaticDiscoverer`] walks
//! sitemap.xml and falls back to navigation anchors, and
//! [`RenderedDiscoverer`] harvests links from a script-executed page load.
//! [`DiscoveryCoordinator`] picks the primary strategy from the site profile
//! and falls back to the other when the primary comes back empty.

mod filter;
mod rendered;
mod static_site;

use tracing::{info, instrument, warn};
use url::Url;

use docmill_shared::{
    DiscoveryResult, Fetcher, IngestConfig, Renderer, RenderingMode, SiteProfile,
};

pub use filter::{UrlFilter, is_valid_doc_url};
pub use rendered::RenderedDiscoverer;
pub use static_site::{StaticDiscoverer, parse_loc_entries};

// ---------------------------------------------------------------------------
// DiscoveryCoordinator
// ---------------------------------------------------------------------------

/// Routes discovery to the right strategy for the classified site and
/// falls back when the primary produces nothing.
pub struct DiscoveryCoordinator<'a> {
    fetcher: &'a dyn Fetcher,
    renderer: Option<&'a dyn Renderer>,
}

impl<'a> DiscoveryCoordinator<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, renderer: Option<&'a dyn Renderer>) -> Self {
        Self { fetcher, renderer }
    }

    /// Discover in-scope URLs for `base_url`.
    ///
    /// A forced rendering mode pins the strategy with no fallback. Otherwise
    /// the profile picks the primary: rendered-first only for sites
    /// classified as script-rendered; hybrid and unknown sites start static.
    /// The fallback never re-runs the primary strategy.
    #[instrument(skip_all, fields(url = %base_url, mode = %profile.rendering_mode))]
    pub async fn discover(
        &self,
        base_url: &Url,
        profile: &SiteProfile,
        config: &IngestConfig,
    ) -> DiscoveryResult {
        let rendered_first = match config.forced_mode {
            Some(mode) => mode == RenderingMode::Rendered,
            None => profile.rendering_mode == RenderingMode::Rendered,
        };
        let fallback_allowed = config.forced_mode.is_none();

        if rendered_first {
            let primary = self.discover_rendered(base_url, profile, config).await;
            // A clean render that found no links is an answer, not a
            // failure; only a broken rendered attempt falls back.
            if !primary.urls.is_empty() || primary.errors.is_empty() || !fallback_allowed {
                return primary;
            }

            warn!("rendered discovery failed, falling back to static");
            let mut fallback = StaticDiscoverer::new(self.fetcher)
                .discover(base_url, config)
                .await;
            fallback.errors = merge_errors(primary.errors, fallback.errors);
            fallback
        } else {
            let primary = StaticDiscoverer::new(self.fetcher)
                .discover(base_url, config)
                .await;
            if !primary.urls.is_empty() || !fallback_allowed {
                return primary;
            }
            // A confirmed-static site with no URLs will not improve under a
            // renderer; stop there.
            if profile.rendering_mode == RenderingMode::Static {
                return primary;
            }

            warn!("static discovery empty, falling back to rendered");
            let mut fallback = self.discover_rendered(base_url, profile, config).await;
            fallback.errors = merge_errors(primary.errors, fallback.errors);
            fallback
        }
    }

    async fn discover_rendered(
        &self,
        base_url: &Url,
        profile: &SiteProfile,
        config: &IngestConfig,
    ) -> DiscoveryResult {
        match self.renderer {
            Some(renderer) => {
                RenderedDiscoverer::new(renderer)
                    .discover(base_url, profile, config)
                    .await
            }
            None => {
                info!("no rendering capability configured");
                let mut result = DiscoveryResult::default();
                result.push_error("rendered discovery requested but no renderer is configured");
                result
            }
        }
    }
}

fn merge_errors(mut primary: Vec<String>, fallback: Vec<String>) -> Vec<String> {
    primary.extend(fallback);
    primary
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    use docmill_shared::{
        AppConfig, DocmillError, FetchResponse, RenderedPage, Result, WaitStrategy,
    };

    struct StubFetcher {
        responses: HashMap<String, String>,
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, url: &str, _min_delay_ms: u64) -> Result<FetchResponse> {
            match self.responses.get(url) {
                Some(body) => Ok(FetchResponse {
                    status: 200,
                    body: body.clone(),
                    headers: HashMap::new(),
                }),
                None => Err(DocmillError::Transport(format!("{url}: HTTP 404"))),
            }
        }
    }

    struct StubRenderer {
        links: Vec<String>,
    }

    #[async_trait]
    impl Renderer for StubRenderer {
        async fn render(
            &self,
            _url: &str,
            _wait: WaitStrategy,
            _wait_selector: Option<&str>,
            _timeout_ms: u64,
        ) -> Result<RenderedPage> {
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

    fn config(base: &str) -> IngestConfig {
        IngestConfig::from_app_config(base, &AppConfig::default())
    }

    fn profile(mode: RenderingMode) -> SiteProfile {
        SiteProfile {
            rendering_mode: mode,
            score: 0,
            signals: Vec::new(),
            wait_strategy: WaitStrategy::Load,
            wait_selector: None,
        }
    }

    #[tokio::test]
    async fn static_profile_uses_sitemap_without_renderer() {
        let mut responses = HashMap::new();
        responses.insert(
            "https://docs.example.com/sitemap.xml".to_string(),
            "<?xml version=\"1.0\"?><urlset>\
             <url><loc>https://docs.example.com/docs/a</loc></url></urlset>"
                .to_string(),
        );
        let fetcher = StubFetcher { responses };

        let base = Url::parse("https://docs.example.com/").unwrap();
        let coordinator = DiscoveryCoordinator::new(&fetcher, None);
        let result = coordinator
            .discover(&base, &profile(RenderingMode::Static), &config(base.as_str()))
            .await;

        assert_eq!(result.urls, vec!["https://docs.example.com/docs/a".to_string()]);
    }

    #[tokio::test]
    async fn hybrid_profile_falls_back_to_rendered_when_static_is_empty() {
        // No sitemap, no reachable homepage: static discovery finds nothing.
        let fetcher = StubFetcher {
            responses: HashMap::new(),
        };
        let renderer = StubRenderer {
            links: vec!["/docs/intro".into()],
        };

        let base = Url::parse("https://hybrid.example/").unwrap();
        let coordinator = DiscoveryCoordinator::new(&fetcher, Some(&renderer));
        let result = coordinator
            .discover(&base, &profile(RenderingMode::Hybrid), &config(base.as_str()))
            .await;

        assert_eq!(result.urls, vec!["https://hybrid.example/docs/intro".to_string()]);
        // Errors from the failed static attempt are preserved.
        assert!(!result.errors.is_empty());
    }

    #[tokio::test]
    async fn hybrid_profile_starts_with_static_discovery() {
        // The renderer would offer different links, but a hybrid site's
        // sitemap is authoritative and must be consulted first.
        let mut responses = HashMap::new();
        responses.insert(
            "https://hybrid.example/sitemap.xml".to_string(),
            "<?xml version=\"1.0\"?><urlset>\
             <url><loc>https://hybrid.example/docs/from-sitemap</loc></url></urlset>"
                .to_string(),
        );
        let fetcher = StubFetcher { responses };
        let renderer = StubRenderer {
            links: vec!["/docs/rendered-only".into()],
        };

        let base = Url::parse("https://hybrid.example/").unwrap();
        let coordinator = DiscoveryCoordinator::new(&fetcher, Some(&renderer));
        let result = coordinator
            .discover(&base, &profile(RenderingMode::Hybrid), &config(base.as_str()))
            .await;

        assert_eq!(
            result.urls,
            vec!["https://hybrid.example/docs/from-sitemap".to_string()]
        );
    }

    #[tokio::test]
    async fn clean_empty_render_does_not_fall_back_to_static() {
        // The sitemap exists, but a successful render that found zero links
        // is a definitive answer for a script-rendered site.
        let mut responses = HashMap::new();
        responses.insert(
            "https://spa.example/sitemap.xml".to_string(),
            "<?xml version=\"1.0\"?><urlset>\
             <url><loc>https://spa.example/docs/a</loc></url></urlset>"
                .to_string(),
        );
        let fetcher = StubFetcher { responses };
        let renderer = StubRenderer { links: vec![] };

        let base = Url::parse("https://spa.example/").unwrap();
        let coordinator = DiscoveryCoordinator::new(&fetcher, Some(&renderer));
        let result = coordinator
            .discover(&base, &profile(RenderingMode::Rendered), &config(base.as_str()))
            .await;

        assert!(result.urls.is_empty());
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn rendered_profile_without_renderer_falls_back_to_static() {
        let mut responses = HashMap::new();
        responses.insert(
            "https://spa.example/sitemap.xml".to_string(),
            "<?xml version=\"1.0\"?><urlset>\
             <url><loc>https://spa.example/docs/a</loc></url></urlset>"
                .to_string(),
        );
        let fetcher = StubFetcher { responses };

        let base = Url::parse("https://spa.example/").unwrap();
        let coordinator = DiscoveryCoordinator::new(&fetcher, None);
        let result = coordinator
            .discover(&base, &profile(RenderingMode::Rendered), &config(base.as_str()))
            .await;

        assert_eq!(result.urls, vec!["https://spa.example/docs/a".to_string()]);
        assert!(
            result.errors.iter().any(|e| e.contains("no renderer")),
            "missing-renderer error should be preserved: {:?}",
            result.errors
        );
    }

    #[tokio::test]
    async fn forced_static_never_falls_back() {
        // Static discovery finds nothing, but the mode is pinned.
        let fetcher = StubFetcher {
            responses: HashMap::new(),
        };
        let renderer = StubRenderer {
            links: vec!["/docs/intro".into()],
        };

        let base = Url::parse("https://pinned.example/").unwrap();
        let mut config = config(base.as_str());
        config.forced_mode = Some(RenderingMode::Static);

        let coordinator = DiscoveryCoordinator::new(&fetcher, Some(&renderer));
        let result = coordinator
            .discover(&base, &SiteProfile::unknown(), &config)
            .await;

        assert!(result.urls.is_empty());
    }

    #[tokio::test]
    async fn confirmed_static_site_with_no_urls_stops() {
        let fetcher = StubFetcher {
            responses: HashMap::new(),
        };
        let renderer = StubRenderer {
            links: vec!["/docs/never-used".into()],
        };

        let base = Url::parse("https://empty.example/").unwrap();
        let coordinator = DiscoveryCoordinator::new(&fetcher, Some(&renderer));
        let result = coordinator
            .discover(&base, &profile(RenderingMode::Static), &config(base.as_str()))
            .await;

        assert!(result.urls.is_empty());
    }
}
