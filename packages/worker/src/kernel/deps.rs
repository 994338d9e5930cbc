//! Shared dependency container for job handlers.
//!
//! Every external system sits behind a trait object so processors stay
//! testable with hand-written mocks. The queue itself owns the database
//! pool; handlers never touch `sqlx` directly.

use std::sync::Arc;

use audit::tech::HtmlFetcher;

use crate::clients::{AuditTool, BrowserProvider, PlacesClient, ScreenshotStore};
use crate::kernel::jobs::JobQueue;
use crate::storage::PipelineStore;

pub struct WorkerDeps {
    pub store: Arc<dyn PipelineStore>,
    pub places: Arc<dyn PlacesClient>,
    pub browser: Arc<dyn BrowserProvider>,
    pub screenshots: Arc<dyn ScreenshotStore>,
    pub audit_tool: Arc<dyn AuditTool>,
    pub fetcher: Arc<dyn HtmlFetcher>,
    pub queue: Arc<dyn JobQueue>,
}
