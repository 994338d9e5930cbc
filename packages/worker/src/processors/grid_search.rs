//! Grid search: scan one geographic cell against the places API and stash
//! every discovery as a raw record for downstream transformation.

use tracing::{info, warn};

use audit::grid::GeoBounds;
use audit::types::BusinessSource;
use audit::AuditError;

use crate::kernel::deps::WorkerDeps;
use crate::kernel::jobs::payloads::GridSearchJob;

/// Scan one cell. Returns the number of raw records written.
///
/// The run counter and the grid freshness stamp are only touched after every
/// discovery landed, so a retried job never double-counts a partial batch
/// it already wrote (upserts make the rewrites no-ops).
pub async fn run(job: GridSearchJob, deps: &WorkerDeps) -> Result<usize, AuditError> {
    let result = scan_cell(&job, deps).await;

    if let Err(err) = &result {
        if let Some(run_id) = job.scraper_run_id {
            if let Err(mark_err) = deps.store.mark_run_failed(run_id, &err.to_string()).await {
                warn!(run_id = %run_id, error = %mark_err, "failed to record scan error on run");
            }
        }
    }

    result
}

async fn scan_cell(job: &GridSearchJob, deps: &WorkerDeps) -> Result<usize, AuditError> {
    let bounds = resolve_bounds(job, deps).await?;
    bounds.validate()?;

    let center = bounds.center();
    info!(
        location = %job.location,
        lat = center.lat,
        lng = center.lng,
        radius_m = job.radius_m,
        "scanning grid cell"
    );

    let places = deps
        .places
        .search(center, job.radius_m, job.category.as_deref())
        .await?;

    let source = BusinessSource::GooglePlaces.as_str();
    for place in &places {
        deps.store
            .upsert_raw_record(source, &place.external_id, &place.payload)
            .await?;
    }

    if let Some(run_id) = job.scraper_run_id {
        deps.store
            .add_businesses_found(run_id, places.len() as i32)
            .await?;
    }

    if let Some(grid_id) = job.grid_id {
        deps.store.mark_grid_scraped(grid_id).await?;
    }

    info!(location = %job.location, found = places.len(), "grid cell scanned");
    Ok(places.len())
}

async fn resolve_bounds(job: &GridSearchJob, deps: &WorkerDeps) -> Result<GeoBounds, AuditError> {
    if let Some(grid_id) = job.grid_id {
        let grid = deps
            .store
            .get_grid(grid_id)
            .await?
            .ok_or_else(|| AuditError::Validation(format!("grid {grid_id} not found")))?;
        return Ok(grid.bounds());
    }

    job.bounds.ok_or_else(|| {
        AuditError::Validation("grid search needs either grid_id or inline bounds".to_string())
    })
}
