//! Technology fingerprinting.
//!
//! Matches fetched page markup against a fixed signature table of platform,
//! JS framework, and analytics markers. The page fetch itself goes through
//! [`HtmlFetcher`] so this module stays independent of the audit browser
//! session (and testable without a network).

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AuditError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechCategory {
    Platform,
    Framework,
    Analytics,
}

/// One detected technology.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technology {
    pub name: String,
    pub category: TechCategory,
    pub confidence: f32,
    pub version: Option<String>,
}

/// Fetches raw page HTML. Implemented over reqwest in the worker crate and
/// by canned fixtures in tests.
#[async_trait]
pub trait HtmlFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, AuditError>;
}

struct Signature {
    name: &'static str,
    category: TechCategory,
    markers: &'static [&'static str],
}

const SIGNATURES: &[Signature] = &[
    // Platforms
    Signature {
        name: "WordPress",
        category: TechCategory::Platform,
        markers: &["wp-content", "wp-includes"],
    },
    Signature {
        name: "Shopify",
        category: TechCategory::Platform,
        markers: &["cdn.shopify.com", "Shopify.theme"],
    },
    Signature {
        name: "Wix",
        category: TechCategory::Platform,
        markers: &["static.wixstatic.com", "wix-code"],
    },
    Signature {
        name: "Squarespace",
        category: TechCategory::Platform,
        markers: &["squarespace.com", "Static.SQUARESPACE_CONTEXT"],
    },
    Signature {
        name: "Webflow",
        category: TechCategory::Platform,
        markers: &["assets.website-files.com", "w-webflow-badge"],
    },
    Signature {
        name: "Drupal",
        category: TechCategory::Platform,
        markers: &["Drupal.settings", "/sites/default/files"],
    },
    // Frameworks
    Signature {
        name: "Next.js",
        category: TechCategory::Framework,
        markers: &["__NEXT_DATA__", "/_next/static"],
    },
    Signature {
        name: "React",
        category: TechCategory::Framework,
        markers: &["data-reactroot", "react-dom"],
    },
    Signature {
        name: "Nuxt",
        category: TechCategory::Framework,
        markers: &["__NUXT__", "/_nuxt/"],
    },
    Signature {
        name: "Vue.js",
        category: TechCategory::Framework,
        markers: &["data-v-app", "vue.runtime"],
    },
    Signature {
        name: "Angular",
        category: TechCategory::Framework,
        markers: &["ng-version"],
    },
    Signature {
        name: "Svelte",
        category: TechCategory::Framework,
        markers: &["svelte-"],
    },
    Signature {
        name: "jQuery",
        category: TechCategory::Framework,
        markers: &["jquery.min.js", "jquery.js"],
    },
    // Analytics
    Signature {
        name: "Google Analytics",
        category: TechCategory::Analytics,
        markers: &["google-analytics.com", "gtag("],
    },
    Signature {
        name: "Google Tag Manager",
        category: TechCategory::Analytics,
        markers: &["googletagmanager.com/gtm.js"],
    },
    Signature {
        name: "Meta Pixel",
        category: TechCategory::Analytics,
        markers: &["connect.facebook.net", "fbq("],
    },
    Signature {
        name: "Hotjar",
        category: TechCategory::Analytics,
        markers: &["static.hotjar.com"],
    },
];

/// Match page markup against the signature table.
pub fn match_html(html: &str) -> Vec<Technology> {
    let generator = generator_meta(html);

    SIGNATURES
        .iter()
        .filter_map(|sig| {
            let matched = sig.markers.iter().filter(|m| html.contains(**m)).count();
            if matched == 0 {
                return None;
            }

            // One marker is a decent hint; every marker is close to certain.
            let confidence = 0.5 + 0.5 * (matched as f32 / sig.markers.len() as f32);

            Some(Technology {
                name: sig.name.to_string(),
                category: sig.category,
                confidence,
                version: version_for(sig.name, generator.as_deref(), html),
            })
        })
        .collect()
}

/// Fetch a page and fingerprint it in one step.
pub async fn detect_technologies(
    fetcher: &dyn HtmlFetcher,
    url: &Url,
) -> Result<Vec<Technology>, AuditError> {
    let html = fetcher.fetch(url).await?;
    let stack = match_html(&html);
    tracing::debug!(url = %url, detected = stack.len(), "technology fingerprint complete");
    Ok(stack)
}

/// Contents of `<meta name="generator">`, if present.
fn generator_meta(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"meta[name="generator"]"#).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.to_string())
}

fn version_for(name: &str, generator: Option<&str>, html: &str) -> Option<String> {
    // Generator tags look like "WordPress 6.4.2".
    if let Some(gen) = generator {
        let mut parts = gen.splitn(2, ' ');
        if parts.next()?.eq_ignore_ascii_case(name) {
            if let Some(version) = parts.next() {
                return Some(version.trim().to_string());
            }
        }
    }

    // Angular publishes its version as an attribute.
    if name == "Angular" {
        if let Some(idx) = html.find("ng-version=\"") {
            let rest = &html[idx + "ng-version=\"".len()..];
            return rest.split('"').next().map(|v| v.to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_wordpress_with_version() {
        let html = r#"<html><head>
            <meta name="generator" content="WordPress 6.4.2">
            <link rel="stylesheet" href="/wp-content/themes/shop/style.css">
            <script src="/wp-includes/js/jquery/jquery.min.js"></script>
        </head><body></body></html>"#;

        let stack = match_html(html);
        let wp = stack.iter().find(|t| t.name == "WordPress").unwrap();
        assert_eq!(wp.category, TechCategory::Platform);
        assert_eq!(wp.version.as_deref(), Some("6.4.2"));
        assert!(wp.confidence >= 0.99);

        // The bundled jQuery is picked up too.
        assert!(stack.iter().any(|t| t.name == "jQuery"));
    }

    #[test]
    fn detects_next_and_analytics() {
        let html = r#"<html><body>
            <script id="__NEXT_DATA__" type="application/json">{}</script>
            <script async src="https://www.googletagmanager.com/gtag/js"></script>
            <script>gtag('config', 'G-TEST');</script>
        </body></html>"#;

        let stack = match_html(html);
        assert!(stack
            .iter()
            .any(|t| t.name == "Next.js" && t.category == TechCategory::Framework));
        assert!(stack
            .iter()
            .any(|t| t.name == "Google Analytics" && t.category == TechCategory::Analytics));
    }

    #[test]
    fn detects_angular_version_attribute() {
        let html = r#"<app-root ng-version="17.1.0"></app-root>"#;
        let stack = match_html(html);
        let ng = stack.iter().find(|t| t.name == "Angular").unwrap();
        assert_eq!(ng.version.as_deref(), Some("17.1.0"));
    }

    #[test]
    fn plain_page_detects_nothing() {
        let stack = match_html("<html><body><h1>Hello</h1></body></html>");
        assert!(stack.is_empty());
    }

    #[test]
    fn partial_marker_match_has_lower_confidence() {
        let full = match_html("wp-content wp-includes");
        let partial = match_html("wp-content only");
        let f = full.iter().find(|t| t.name == "WordPress").unwrap();
        let p = partial.iter().find(|t| t.name == "WordPress").unwrap();
        assert!(f.confidence > p.confidence);
    }

    struct FixtureFetcher(&'static str);

    #[async_trait]
    impl HtmlFetcher for FixtureFetcher {
        async fn fetch(&self, _url: &Url) -> Result<String, AuditError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn detect_technologies_uses_the_fetcher() {
        let fetcher = FixtureFetcher(r#"<script src="https://static.hotjar.com/c.js"></script>"#);
        let url = Url::parse("https://example.com").unwrap();
        let stack = detect_technologies(&fetcher, &url).await.unwrap();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack[0].name, "Hotjar");
    }
}
