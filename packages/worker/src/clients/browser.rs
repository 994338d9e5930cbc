//! Scoped headless-browser sessions.
//!
//! One audit job owns exactly one session for its duration. The processor
//! acquires a page via [`BrowserProvider::launch`], runs its body, and calls
//! [`BrowserPage::close`] on every exit path before surfacing the result —
//! the Rust rendition of acquire/body/finally.

use std::time::Duration;

use async_trait::async_trait;
use audit::AuditError;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use tokio::task::JoinHandle;
use url::Url;

pub const DESKTOP_VIEWPORT: (u32, u32) = (1920, 1080);
pub const MOBILE_VIEWPORT: (u32, u32) = (390, 844);

/// Launches isolated browser sessions. Sessions are never shared or pooled.
#[async_trait]
pub trait BrowserProvider: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserPage>, AuditError>;
}

/// One page inside one session.
#[async_trait]
pub trait BrowserPage: Send {
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<(), AuditError>;
    async fn set_viewport(&mut self, width: u32, height: u32, mobile: bool)
        -> Result<(), AuditError>;
    async fn screenshot_full_page(&mut self) -> Result<Vec<u8>, AuditError>;
    /// Tear the whole session down. Must be called on every exit path.
    async fn close(&mut self) -> Result<(), AuditError>;
}

pub struct ChromiumBrowserProvider;

#[async_trait]
impl BrowserProvider for ChromiumBrowserProvider {
    async fn launch(&self) -> Result<Box<dyn BrowserPage>, AuditError> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .window_size(DESKTOP_VIEWPORT.0, DESKTOP_VIEWPORT.1)
            .build()
            .map_err(AuditError::Network)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AuditError::Network(format!("browser launch failed: {e}")))?;

        // The handler drives the CDP websocket; it lives as long as the session.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| AuditError::Network(format!("failed to open page: {e}")))?;

        Ok(Box::new(ChromiumPage {
            browser,
            page,
            handler_task,
        }))
    }
}

struct ChromiumPage {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<(), AuditError> {
        let navigation = async {
            self.page
                .goto(url.as_str())
                .await
                .map_err(|e| AuditError::Network(format!("navigation failed: {e}")))?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| AuditError::Network(format!("navigation failed: {e}")))?;
            Ok::<(), AuditError>(())
        };

        tokio::time::timeout(timeout, navigation)
            .await
            .map_err(|_| {
                AuditError::Network(format!(
                    "navigation to {} timed out after {}s",
                    url,
                    timeout.as_secs()
                ))
            })?
    }

    async fn set_viewport(
        &mut self,
        width: u32,
        height: u32,
        mobile: bool,
    ) -> Result<(), AuditError> {
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(width as i64)
            .height(height as i64)
            .device_scale_factor(1.0)
            .mobile(mobile)
            .build()
            .map_err(AuditError::Network)?;

        self.page
            .execute(params)
            .await
            .map_err(|e| AuditError::Network(format!("viewport override failed: {e}")))?;
        Ok(())
    }

    async fn screenshot_full_page(&mut self) -> Result<Vec<u8>, AuditError> {
        self.page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
            )
            .await
            .map_err(|e| AuditError::Network(format!("screenshot failed: {e}")))
    }

    async fn close(&mut self) -> Result<(), AuditError> {
        let result = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| AuditError::Network(format!("browser close failed: {e}")));
        self.handler_task.abort();
        result
    }
}
