//! Homepage fingerprinting: pure signal extraction from an HTML body.
//!
//! Fingerprint tables are fixed and scanned in priority order; the first
//! match per category wins. Keeping each check a pure function over the body
//! keeps the scoring auditable and unit-testable in isolation.

/// One scored classification signal.
#[derive(Debug, Clone)]
pub struct Signal {
    /// Human-readable description, surfaced in [`SiteProfile::signals`].
    ///
    /// [`SiteProfile::signals`]: docmill_shared::SiteProfile::signals
    pub label: String,
    /// Signed score contribution.
    pub weight: i32,
    /// Framework name when this signal came from a framework fingerprint.
    pub framework: Option<String>,
}

impl Signal {
    pub fn positive(label: impl Into<String>, weight: i32) -> Self {
        Self {
            label: label.into(),
            weight,
            framework: None,
        }
    }

    pub fn negative(label: impl Into<String>, weight: i32) -> Self {
        Self {
            label: label.into(),
            weight,
            framework: None,
        }
    }
}

/// SPA framework markers, in priority order. Markers are matched as
/// substrings against the lowercased homepage body.
const SPA_FRAMEWORKS: &[(&str, &[&str])] = &[
    ("Angular", &["ng-version", "angular", "app-root"]),
    ("React", &["react", "reactdom", "__react"]),
    ("Vue", &["vue.js", "vue.min.js", "__vue__"]),
    ("Next.js", &["__next", "_next/", "next.js"]),
    ("Nuxt", &["__nuxt", "_nuxt/", "nuxt.js"]),
    ("Svelte", &["svelte", "__svelte"]),
];

/// Static-site generator markers, in priority order.
const STATIC_GENERATORS: &[(&str, &[&str])] = &[
    ("Gatsby", &["gatsby", "__gatsby"]),
    ("Hugo", &["generated by hugo"]),
    ("Jekyll", &["generated by jekyll"]),
    ("Docusaurus", &["docusaurus", "__docusaurus"]),
    ("VuePress", &["vuepress"]),
    ("GitBook", &["gitbook"]),
];

/// Documentation keywords suggesting the homepage fronts a docs site.
const DOC_KEYWORDS: &[&str] = &["docs/", "documentation", "api reference", "getting started"];

/// Body length above which a page counts as substantial even without
/// semantic content tags.
const SUBSTANTIAL_CONTENT_CHARS: usize = 5000;

/// Run every fingerprint check over the homepage body and return the scored
/// signals.
pub fn fingerprint_homepage(body: &str) -> Vec<Signal> {
    let content = body.to_lowercase();
    let mut signals = Vec::new();

    // SPA framework: first match wins, needs script execution.
    if let Some((name, _)) = SPA_FRAMEWORKS
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| content.contains(m)))
    {
        signals.push(Signal {
            label: format!("uses {name} framework"),
            weight: -20,
            framework: Some((*name).to_string()),
        });
    }

    // Static generator: first match wins, usually crawlable as-is.
    if let Some((name, _)) = STATIC_GENERATORS
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| content.contains(m)))
    {
        signals.push(Signal::positive(format!("built with {name}"), 25));
    }

    // Navigation links present in the initial HTML.
    if content.contains("<nav") && content.contains("href=") {
        signals.push(Signal::positive("navigation links present in initial HTML", 20));
    } else {
        signals.push(Signal::negative("limited navigation in initial HTML", -15));
    }

    if DOC_KEYWORDS.iter().any(|kw| content.contains(kw)) {
        signals.push(Signal::positive("contains documentation keywords", 15));
    }

    // Script-tag density.
    let script_tags = content.matches("<script").count();
    if script_tags > 10 {
        signals.push(Signal::negative(
            format!("heavy script usage ({script_tags} script tags)"),
            -15,
        ));
    } else if script_tags < 3 {
        signals.push(Signal::positive("minimal script usage", 10));
    }

    // Substantial content already present without script execution.
    let has_main_content = content.contains("<main")
        || content.contains("<article")
        || content.len() > SUBSTANTIAL_CONTENT_CHARS;
    if has_main_content {
        signals.push(Signal::positive("substantial content in initial HTML", 15));
    } else {
        signals.push(Signal::negative("limited content in initial HTML", -20));
    }

    signals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(signals: &[Signal]) -> i32 {
        signals.iter().map(|s| s.weight).sum()
    }

    #[test]
    fn framework_priority_first_match_wins() {
        // Body matches both Angular and React markers; Angular is scanned
        // first.
        let signals = fingerprint_homepage("<app-root></app-root> reactdom");
        let framework: Vec<_> = signals.iter().filter_map(|s| s.framework.as_deref()).collect();
        assert_eq!(framework, vec!["Angular"]);
    }

    #[test]
    fn docusaurus_marker_scores_positive() {
        let signals = fingerprint_homepage(
            "<html><body class=\"__docusaurus\"><nav><a href=\"/docs/\">docs</a></nav>\
             <main>getting started</main></body></html>",
        );
        assert!(signals.iter().any(|s| s.label.contains("Docusaurus")));
        assert!(total(&signals) > 0);
    }

    #[test]
    fn empty_shell_scores_negative() {
        let signals = fingerprint_homepage("<html><body><div id=\"root\"></div></body></html>");
        assert!(total(&signals) < 0);
        assert!(signals.iter().any(|s| s.label.contains("limited content")));
    }

    #[test]
    fn script_density_cuts_both_ways() {
        let heavy = "<script></script>".repeat(11);
        let signals = fingerprint_homepage(&heavy);
        assert!(signals.iter().any(|s| s.label.contains("heavy script usage")));

        let signals = fingerprint_homepage("<html><main>one tiny page</main></html>");
        assert!(signals.iter().any(|s| s.label == "minimal script usage"));
    }
}
