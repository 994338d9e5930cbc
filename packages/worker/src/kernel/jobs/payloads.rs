//! Job payload shapes, as consumed by queue producers (REST endpoints and
//! schedulers outside this crate).

use audit::grid::GeoBounds;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SEED_CAMPAIGN: &str = "seed-campaign";
pub const GRID_SEARCH: &str = "grid-search";
pub const AUDIT_WEBSITE: &str = "audit-website";
pub const PROCESS_RAW_DATA: &str = "process-raw-data";

/// Fan-out job: tile a city's bounding box into grid cells and enqueue one
/// grid search per cell under a fresh scraper run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedCampaignJob {
    pub location: String,
    pub bounds: GeoBounds,
    pub rows: u32,
    pub cols: u32,
    /// Search radius in meters for each cell scan.
    pub radius_m: u32,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSearchJob {
    /// Existing grid cell to scan; producers may instead inline `bounds`.
    pub grid_id: Option<Uuid>,
    pub location: String,
    pub bounds: Option<GeoBounds>,
    /// Search radius in meters around the cell center.
    pub radius_m: u32,
    pub category: Option<String>,
    /// Discovery campaign this scan belongs to.
    pub scraper_run_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuditOptions {
    #[serde(default = "default_true")]
    pub run_audit_tool: bool,
    #[serde(default = "default_true")]
    pub detect_technologies: bool,
    #[serde(default = "default_true")]
    pub take_screenshots: bool,
    /// Navigate only; persist nothing.
    #[serde(default)]
    pub validate_only: bool,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            run_audit_tool: true,
            detect_technologies: true,
            take_screenshots: true,
            validate_only: false,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditWebsiteJob {
    pub business_id: Uuid,
    pub url: String,
    #[serde(default)]
    pub options: AuditOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRawDataJob {
    pub raw_record_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn audit_job_options_default_when_omitted() {
        let job: AuditWebsiteJob = serde_json::from_value(json!({
            "business_id": Uuid::new_v4(),
            "url": "https://example.com"
        }))
        .unwrap();

        assert!(job.options.run_audit_tool);
        assert!(job.options.detect_technologies);
        assert!(job.options.take_screenshots);
        assert!(!job.options.validate_only);
    }

    #[test]
    fn grid_search_job_accepts_inline_bounds() {
        let job: GridSearchJob = serde_json::from_value(json!({
            "grid_id": null,
            "location": "Saint Paul",
            "bounds": {
                "northeast": { "lat": 45.0, "lng": -93.0 },
                "southwest": { "lat": 44.9, "lng": -93.3 }
            },
            "radius_m": 1500,
            "category": "restaurant",
            "scraper_run_id": null
        }))
        .unwrap();

        assert!(job.bounds.is_some());
        assert_eq!(job.radius_m, 1500);
    }
}
