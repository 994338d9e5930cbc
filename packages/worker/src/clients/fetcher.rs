//! Plain HTML fetcher for technology detection, separate from the audit
//! browser session.

use std::time::Duration;

use async_trait::async_trait;
use audit::tech::HtmlFetcher;
use audit::AuditError;
use url::Url;

pub struct HttpHtmlFetcher {
    http: reqwest::Client,
}

impl HttpHtmlFetcher {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .user_agent("mainstreet-audit/0.1")
                .build()
                .unwrap_or_default(),
        }
    }
}

impl Default for HttpHtmlFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HtmlFetcher for HttpHtmlFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, AuditError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AuditError::Network(format!("page fetch failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuditError::Network(format!(
                "page fetch returned HTTP {status}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AuditError::Network(format!("failed to read page body: {e}")))
    }
}
