//! Page-quality audit tool client (Lighthouse-style API).

use std::time::Duration;

use async_trait::async_trait;
use audit::types::{AuditCategory, AuditItem, CategoryResults};
use audit::AuditError;
use serde_json::Value;
use url::Url;

/// Raw output of one audit tool run: 0-1 category scores plus the sub-items
/// recommendations are derived from.
#[derive(Debug, Clone, Default)]
pub struct AuditRun {
    pub categories: CategoryResults,
    pub items: Vec<AuditItem>,
}

#[async_trait]
pub trait AuditTool: Send + Sync {
    /// Run the audit against `url`, optionally in a mobile throttling profile.
    async fn run(&self, url: &Url, mobile: bool) -> Result<AuditRun, AuditError>;
}

pub struct PagespeedClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl PagespeedClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl AuditTool for PagespeedClient {
    async fn run(&self, url: &Url, mobile: bool) -> Result<AuditRun, AuditError> {
        let strategy = if mobile { "mobile" } else { "desktop" };
        let mut query = vec![
            ("url".to_string(), url.to_string()),
            ("strategy".to_string(), strategy.to_string()),
        ];
        for category in ["PERFORMANCE", "ACCESSIBILITY", "BEST_PRACTICES", "SEO"] {
            query.push(("category".to_string(), category.to_string()));
        }
        if let Some(key) = &self.api_key {
            query.push(("key".to_string(), key.clone()));
        }

        let response = self
            .http
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| AuditError::AuditTool(format!("audit request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuditError::AuditTool(format!(
                "audit tool returned HTTP {status}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AuditError::AuditTool(format!("audit response was not JSON: {e}")))?;

        Ok(parse_report(&body))
    }
}

/// Pull category scores and audit sub-items out of a Lighthouse-style report.
/// Missing pieces degrade to `None`/empty rather than erroring.
fn parse_report(body: &Value) -> AuditRun {
    let result = body.get("lighthouseResult").unwrap_or(body);
    let categories = result.get("categories").cloned().unwrap_or_default();
    let audits = result.get("audits").cloned().unwrap_or_default();

    let score_of = |key: &str| -> Option<f64> {
        categories.get(key)?.get("score")?.as_f64()
    };

    let mut items = Vec::new();
    let category_keys = [
        ("performance", AuditCategory::Performance),
        ("accessibility", AuditCategory::Accessibility),
        ("best-practices", AuditCategory::BestPractices),
        ("seo", AuditCategory::Seo),
    ];

    for (key, category) in category_keys {
        let Some(refs) = categories
            .get(key)
            .and_then(|c| c.get("auditRefs"))
            .and_then(Value::as_array)
        else {
            continue;
        };

        for audit_ref in refs {
            let Some(id) = audit_ref.get("id").and_then(Value::as_str) else {
                continue;
            };
            let weight = audit_ref
                .get("weight")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);

            let audit = audits.get(id);
            // Informational audits report a null score; they are not failures.
            let Some(score) = audit
                .and_then(|a| a.get("score"))
                .and_then(Value::as_f64)
            else {
                continue;
            };
            let title = audit
                .and_then(|a| a.get("title"))
                .and_then(Value::as_str)
                .unwrap_or(id)
                .to_string();

            items.push(AuditItem {
                id: id.to_string(),
                title,
                category,
                score,
                weight,
            });
        }
    }

    AuditRun {
        categories: CategoryResults {
            performance: score_of("performance"),
            accessibility: score_of("accessibility"),
            best_practices: score_of("best-practices"),
            seo: score_of("seo"),
        },
        items,
    }
}
