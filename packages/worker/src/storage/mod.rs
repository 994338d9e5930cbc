//! Persistence for the pipeline's domain entities.
//!
//! Everything sits behind [`PipelineStore`] so processors can be tested with
//! an in-memory implementation. Consistency across concurrent workers comes
//! from upsert-by-natural-key, not cross-job transactions.

pub mod models;
mod postgres;

use async_trait::async_trait;
use audit::grid::GeoBounds;
use audit::transform::CanonicalBusiness;
use audit::AuditError;
use serde_json::Value;
use uuid::Uuid;

pub use models::{Business, GeoGrid, NewWebsiteAudit, RawBusinessRecord, ScraperRun};
pub use postgres::PostgresStore;

#[async_trait]
pub trait PipelineStore: Send + Sync {
    /// Insert-or-update a raw discovery record keyed by
    /// `(source_id, external_id)`. This is the dedupe boundary: rediscovery
    /// refreshes the payload instead of duplicating the record.
    async fn upsert_raw_record(
        &self,
        source_id: &str,
        external_id: &str,
        payload: &Value,
    ) -> Result<Uuid, AuditError>;

    async fn get_raw_record(&self, id: Uuid) -> Result<Option<RawBusinessRecord>, AuditError>;

    /// Mark a raw record consumed. `error` records a transform failure for
    /// post-mortems; either way the record is never reprocessed.
    async fn mark_raw_processed(&self, id: Uuid, error: Option<&str>) -> Result<(), AuditError>;

    /// Insert-or-update the canonical business keyed by
    /// `(source_id, external_id)`. Identity fields only; score fields are
    /// owned by `record_audit_outcome`.
    async fn upsert_business(&self, business: &CanonicalBusiness) -> Result<Uuid, AuditError>;

    async fn get_business(&self, id: Uuid) -> Result<Option<Business>, AuditError>;

    /// Append one audit row.
    async fn insert_audit(&self, audit: &NewWebsiteAudit) -> Result<Uuid, AuditError>;

    /// Update the business's audit-derived fields after a successful audit.
    async fn record_audit_outcome(
        &self,
        business_id: Uuid,
        website: &str,
        overall_score: i32,
        audit_id: Uuid,
    ) -> Result<(), AuditError>;

    async fn get_grid(&self, id: Uuid) -> Result<Option<GeoGrid>, AuditError>;

    /// Insert one grid cell of a city, never scraped yet.
    async fn insert_grid(&self, city: &str, bounds: GeoBounds) -> Result<Uuid, AuditError>;

    /// Stamp a grid cell's freshness after a successful scan.
    async fn mark_grid_scraped(&self, id: Uuid) -> Result<(), AuditError>;

    /// Open a new discovery campaign in `running` state.
    async fn create_run(&self, location: &str) -> Result<ScraperRun, AuditError>;

    /// Atomically bump a scraper run's discovered-business counter.
    async fn add_businesses_found(&self, run_id: Uuid, count: i32) -> Result<(), AuditError>;

    async fn mark_run_failed(&self, run_id: Uuid, error: &str) -> Result<(), AuditError>;
}
