//! Campaign seeding: tile a city's bounding box into grid cells and fan out
//! one grid-search job per cell, all tracked by a fresh scraper run.

use tracing::info;

use audit::AuditError;

use crate::kernel::deps::WorkerDeps;
use crate::kernel::jobs::payloads::{self, GridSearchJob, SeedCampaignJob};

/// Seed one discovery campaign. Returns the number of cells enqueued.
pub async fn run(job: SeedCampaignJob, deps: &WorkerDeps) -> Result<usize, AuditError> {
    job.bounds.validate()?;
    if job.rows == 0 || job.cols == 0 {
        return Err(AuditError::Validation(
            "campaign needs at least one row and one column".to_string(),
        ));
    }

    let campaign = deps.store.create_run(&job.location).await?;
    let cells = job.bounds.tile(job.rows, job.cols);

    for cell in &cells {
        let grid_id = deps.store.insert_grid(&job.location, *cell).await?;
        let search = GridSearchJob {
            grid_id: Some(grid_id),
            location: job.location.clone(),
            bounds: None,
            radius_m: job.radius_m,
            category: job.category.clone(),
            scraper_run_id: Some(campaign.id),
        };
        deps.queue
            .enqueue(
                payloads::GRID_SEARCH,
                serde_json::to_value(&search)
                    .map_err(|e| AuditError::Validation(e.to_string()))?,
            )
            .await
            .map_err(|e| AuditError::Database(e.to_string()))?;
    }

    info!(
        location = %job.location,
        run_id = %campaign.id,
        cells = cells.len(),
        "campaign seeded"
    );
    Ok(cells.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::deps::test_support::MockWorld;
    use audit::grid::{GeoBounds, GeoPoint};
    use serde_json::json;

    fn campaign_job() -> SeedCampaignJob {
        SeedCampaignJob {
            location: "Saint Paul".into(),
            bounds: GeoBounds::new(GeoPoint::new(45.0, -93.0), GeoPoint::new(44.9, -93.3)),
            rows: 2,
            cols: 3,
            radius_m: 1500,
            category: Some("restaurant".into()),
        }
    }

    #[tokio::test]
    async fn tiles_the_city_and_enqueues_one_search_per_cell() {
        let world = MockWorld::default();
        let deps = world.deps();

        let seeded = run(campaign_job(), &deps).await.unwrap();

        assert_eq!(seeded, 6);
        assert_eq!(world.store.grids.lock().unwrap().len(), 6);

        let runs = world.store.created_runs.lock().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].location, "Saint Paul");

        let enqueued = world.queue.enqueued.lock().unwrap();
        assert_eq!(enqueued.len(), 6);
        for (job_type, args) in enqueued.iter() {
            assert_eq!(job_type, payloads::GRID_SEARCH);
            assert!(args["grid_id"].is_string());
            assert_eq!(args["bounds"], json!(null));
            assert_eq!(args["scraper_run_id"].as_str(), Some(runs[0].id.to_string().as_str()));
        }
    }

    #[tokio::test]
    async fn every_seeded_cell_resolves_for_a_grid_search() {
        let world = MockWorld::default();
        let deps = world.deps();

        run(campaign_job(), &deps).await.unwrap();

        let grids = world.store.grids.lock().unwrap();
        for grid in grids.values() {
            assert!(grid.bounds().validate().is_ok());
            assert!(grid.last_scraped.is_none());
        }
    }

    #[tokio::test]
    async fn degenerate_bounds_seed_nothing() {
        let world = MockWorld::default();
        let deps = world.deps();

        let mut job = campaign_job();
        job.bounds = GeoBounds::new(GeoPoint::new(44.9, -93.3), GeoPoint::new(44.9, -93.3));

        let err = run(job, &deps).await.unwrap_err();
        assert!(matches!(err, AuditError::Validation(_)));
        assert!(world.store.created_runs.lock().unwrap().is_empty());
        assert!(world.queue.enqueued.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_sized_tiling_is_rejected() {
        let world = MockWorld::default();
        let deps = world.deps();

        let mut job = campaign_job();
        job.rows = 0;

        let err = run(job, &deps).await.unwrap_err();
        assert!(matches!(err, AuditError::Validation(_)));
        assert!(world.store.created_runs.lock().unwrap().is_empty());
    }
}
