//! Site classification: scores rendering-mode signals into a [`SiteProfile`].
//!
//! Before discovery, Docmill probes a site three ways — sitemap validity,
//! robots.txt validity, and a homepage fingerprint — and sums the resulting
//! `(signal, weight)` pairs into a score that picks the rendering mode for
//! the rest of the run. Every check degrades a network failure into a
//! negative signal; classification itself never fails.

mod fingerprint;

use tracing::{debug, info, instrument};
use url::Url;

use docmill_shared::{Fetcher, RenderingMode, SiteProfile, WaitStrategy};

pub use fingerprint::{Signal, fingerprint_homepage};

/// Score above which a site is considered fully static.
const STATIC_THRESHOLD: i32 = 40;

/// Score below which a site is considered script-rendered.
const RENDERED_THRESHOLD: i32 = 0;

// ---------------------------------------------------------------------------
// SiteClassifier
// ---------------------------------------------------------------------------

/// Classifies a site's rendering requirements. Computed once per base domain
/// per run.
pub struct SiteClassifier<'a> {
    fetcher: &'a dyn Fetcher,
    rate_limit_ms: u64,
}

impl<'a> SiteClassifier<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, rate_limit_ms: u64) -> Self {
        Self {
            fetcher,
            rate_limit_ms,
        }
    }

    /// Analyze `base_url` and produce a [`SiteProfile`]. Never fails: checks
    /// that error contribute negative signals instead.
    #[instrument(skip_all, fields(url = %base_url))]
    pub async fn analyze_site(&self, base_url: &Url) -> SiteProfile {
        let mut signals: Vec<Signal> = Vec::new();

        signals.push(self.check_sitemap(base_url).await);
        signals.push(self.check_robots(base_url).await);
        signals.extend(self.check_homepage(base_url).await);

        let score: i32 = signals.iter().map(|s| s.weight).sum();
        let framework = signals.iter().find_map(|s| s.framework.clone());
        let rendering_mode = score_to_mode(score);
        let (wait_strategy, wait_selector) = recommend_wait(rendering_mode, framework.as_deref());

        info!(
            mode = %rendering_mode,
            score,
            signals = signals.len(),
            framework = framework.as_deref().unwrap_or("-"),
            "site classification complete"
        );

        SiteProfile {
            rendering_mode,
            score,
            signals: signals.into_iter().map(|s| s.label).collect(),
            wait_strategy,
            wait_selector,
        }
    }

    /// Check whether `/sitemap.xml` returns actual XML rather than an HTML
    /// error page.
    async fn check_sitemap(&self, base_url: &Url) -> Signal {
        let sitemap_url = match base_url.join("/sitemap.xml") {
            Ok(u) => u,
            Err(e) => return Signal::negative(format!("unresolvable sitemap URL: {e}"), -10),
        };

        match self.fetcher.fetch(sitemap_url.as_str(), self.rate_limit_ms).await {
            Ok(response) => {
                let body = &response.body;
                let is_xml = body.contains("<?xml")
                    || body.contains("<urlset")
                    || body.contains("<sitemapindex");
                let is_html = body.contains("<!DOCTYPE html") || body.contains("<html");

                if is_xml && !is_html {
                    Signal::positive("has valid sitemap.xml", 30)
                } else {
                    Signal::negative("no sitemap.xml or returns HTML", -10)
                }
            }
            Err(e) => {
                debug!(error = %e, "sitemap check failed");
                Signal::negative("no sitemap.xml or returns HTML", -10)
            }
        }
    }

    /// Check whether `/robots.txt` serves a plain-text file.
    async fn check_robots(&self, base_url: &Url) -> Signal {
        let robots_url = match base_url.join("/robots.txt") {
            Ok(u) => u,
            Err(e) => return Signal::negative(format!("unresolvable robots.txt URL: {e}"), -5),
        };

        match self.fetcher.fetch(robots_url.as_str(), self.rate_limit_ms).await {
            Ok(response) => {
                let body = &response.body;
                let is_html = body.contains("<!DOCTYPE html") || body.contains("<html");
                if is_html {
                    Signal::negative("no robots.txt or returns HTML", -5)
                } else {
                    Signal::positive("has valid robots.txt", 10)
                }
            }
            Err(e) => {
                debug!(error = %e, "robots.txt check failed");
                Signal::negative("no robots.txt or returns HTML", -5)
            }
        }
    }

    /// Fetch the homepage and run the pure fingerprint over its body.
    async fn check_homepage(&self, base_url: &Url) -> Vec<Signal> {
        match self.fetcher.fetch(base_url.as_str(), self.rate_limit_ms).await {
            Ok(response) => fingerprint_homepage(&response.body),
            Err(e) => {
                debug!(error = %e, "homepage fetch failed");
                vec![Signal::negative("failed to fetch homepage", -10)]
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pure decision functions
// ---------------------------------------------------------------------------

/// Map a summed score to a rendering mode.
pub fn score_to_mode(score: i32) -> RenderingMode {
    if score > STATIC_THRESHOLD {
        RenderingMode::Static
    } else if score < RENDERED_THRESHOLD {
        RenderingMode::Rendered
    } else {
        RenderingMode::Hybrid
    }
}

/// Recommend a renderer wait strategy (and framework-specific readiness
/// selector) for the classified mode.
pub fn recommend_wait(
    mode: RenderingMode,
    framework: Option<&str>,
) -> (WaitStrategy, Option<String>) {
    match mode {
        RenderingMode::Rendered => {
            let selector = framework.and_then(|name| match name {
                "Angular" => Some("router-outlet, [ng-version]".to_string()),
                "React" => Some("[data-reactroot], #root".to_string()),
                "Vue" => Some("[data-v-], .vue-app".to_string()),
                _ => None,
            });
            (WaitStrategy::NetworkIdle, selector)
        }
        RenderingMode::Hybrid => (WaitStrategy::DomContent, None),
        RenderingMode::Static | RenderingMode::Unknown => (WaitStrategy::Load, None),
    }
}
