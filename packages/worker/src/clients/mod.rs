//! Clients for the external systems the pipeline coordinates: the places
//! API, the headless browser, object storage, the page-quality audit tool,
//! and a plain HTML fetcher for technology detection.
//!
//! Every client sits behind a trait so processors can be tested with
//! hand-written mocks.

pub mod audit_tool;
pub mod browser;
pub mod fetcher;
pub mod places;
pub mod screenshots;

pub use audit_tool::{AuditRun, AuditTool, PagespeedClient};
pub use browser::{
    BrowserPage, BrowserProvider, ChromiumBrowserProvider, DESKTOP_VIEWPORT, MOBILE_VIEWPORT,
};
pub use fetcher::HttpHtmlFetcher;
pub use places::{DiscoveredPlace, GooglePlacesClient, PlacesClient};
pub use screenshots::{screenshot_key, S3ScreenshotStore, ScreenshotStore};
