//! Persisted row shapes. The database is the durable source of truth for
//! everything except job lifecycle, which the queue owns.

use audit::grid::{GeoBounds, GeoPoint};
use audit::recommendations::Recommendation;
use audit::tech::Technology;
use audit::types::AuditScores;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One search cell of a city.
#[derive(FromRow, Debug, Clone)]
pub struct GeoGrid {
    pub id: Uuid,
    pub city: String,
    pub ne_lat: f64,
    pub ne_lng: f64,
    pub sw_lat: f64,
    pub sw_lng: f64,
    pub last_scraped: Option<DateTime<Utc>>,
}

impl GeoGrid {
    pub fn bounds(&self) -> GeoBounds {
        GeoBounds::new(
            GeoPoint::new(self.ne_lat, self.ne_lng),
            GeoPoint::new(self.sw_lat, self.sw_lng),
        )
    }
}

/// An unprocessed provider payload awaiting transformation.
#[derive(FromRow, Debug, Clone)]
pub struct RawBusinessRecord {
    pub id: Uuid,
    pub source_id: String,
    pub external_id: String,
    pub raw_payload: Value,
    pub processed: bool,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The canonical business entity.
#[derive(FromRow, Debug, Clone)]
pub struct Business {
    pub id: Uuid,
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub website: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub source_id: String,
    pub external_id: String,
    pub overall_score: Option<i32>,
    pub latest_audit_id: Option<Uuid>,
    pub last_scanned: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A finished audit, ready to insert. Audit rows are append-only.
#[derive(Debug, Clone)]
pub struct NewWebsiteAudit {
    pub business_id: Uuid,
    pub url: String,
    pub scores: AuditScores,
    pub desktop_screenshot: Option<String>,
    pub mobile_screenshot: Option<String>,
    pub technology_stack: Vec<Technology>,
    pub recommendations: Vec<Recommendation>,
    pub audit_date: DateTime<Utc>,
}

/// Aggregate progress for one discovery campaign.
#[derive(FromRow, Debug, Clone)]
pub struct ScraperRun {
    pub id: Uuid,
    pub status: String,
    pub location: String,
    pub businesses_found: i32,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
