//! Integration tests for the Postgres-backed pipeline store, pinning the
//! dedupe boundary: rediscovery and reprocessing update rows in place.

mod common;

use chrono::Utc;
use serde_json::{json, Value};

use audit::grid::GeoPoint;
use audit::transform::CanonicalBusiness;
use audit::types::{AuditScores, BusinessSource};
use worker_core::storage::{NewWebsiteAudit, PipelineStore, PostgresStore};

use common::fresh_pool;

fn canonical(name: &str, website: Option<&str>) -> CanonicalBusiness {
    CanonicalBusiness {
        source: BusinessSource::GooglePlaces,
        external_id: Some("place-a".into()),
        name: Some(name.into()),
        address: Some("180 Grand Ave W".into()),
        city: Some("Saint Paul".into()),
        phone: None,
        website: website.map(str::to_string),
        categories: vec!["restaurant".into()],
        location: Some(GeoPoint::new(44.94, -93.12)),
        status: None,
        hours: None,
        photos: Vec::new(),
        rating: None,
        raw: json!({}),
    }
}

async fn row_count(pool: &sqlx::PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn rediscovered_raw_record_updates_in_place() {
    let pool = fresh_pool().await;
    let store = PostgresStore::new(pool.clone());

    let first = store
        .upsert_raw_record("google_places", "place-a", &json!({"name": "Old Name"}))
        .await
        .unwrap();
    let second = store
        .upsert_raw_record("google_places", "place-a", &json!({"name": "New Name"}))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(row_count(&pool, "raw_business_data").await, 1);

    let record = store.get_raw_record(first).await.unwrap().unwrap();
    assert_eq!(record.raw_payload["name"], Value::from("New Name"));
    assert!(!record.processed);

    // A different external id is its own record.
    let other = store
        .upsert_raw_record("google_places", "place-b", &json!({}))
        .await
        .unwrap();
    assert_ne!(other, first);
    assert_eq!(row_count(&pool, "raw_business_data").await, 2);
}

#[tokio::test]
async fn reprocessed_business_updates_in_place() {
    let pool = fresh_pool().await;
    let store = PostgresStore::new(pool.clone());

    let first = store
        .upsert_business(&canonical("Cafe Astoria", Some("https://cafeastoria.example")))
        .await
        .unwrap();
    let second = store
        .upsert_business(&canonical("Caf\u{e9} Astoria", Some("https://cafeastoria.example")))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(row_count(&pool, "businesses").await, 1);

    let business = store.get_business(first).await.unwrap().unwrap();
    assert_eq!(business.name.as_deref(), Some("Caf\u{e9} Astoria"));
    assert_eq!(business.source_id, "google_places");
    assert_eq!(business.external_id, "place-a");
}

#[tokio::test]
async fn audit_outcome_survives_identity_refresh() {
    let pool = fresh_pool().await;
    let store = PostgresStore::new(pool);

    let business_id = store
        .upsert_business(&canonical("Cafe Astoria", Some("https://cafeastoria.example")))
        .await
        .unwrap();

    let audit_id = store
        .insert_audit(&NewWebsiteAudit {
            business_id,
            url: "https://cafeastoria.example".into(),
            scores: AuditScores {
                overall: 77,
                ..Default::default()
            },
            desktop_screenshot: None,
            mobile_screenshot: None,
            technology_stack: Vec::new(),
            recommendations: Vec::new(),
            audit_date: Utc::now(),
        })
        .await
        .unwrap();
    store
        .record_audit_outcome(business_id, "https://cafeastoria.example", 77, audit_id)
        .await
        .unwrap();

    // Rediscovery refreshes identity fields without clobbering audit fields.
    store
        .upsert_business(&canonical("Cafe Astoria", Some("https://cafeastoria.example")))
        .await
        .unwrap();

    let business = store.get_business(business_id).await.unwrap().unwrap();
    assert_eq!(business.overall_score, Some(77));
    assert_eq!(business.latest_audit_id, Some(audit_id));
    assert!(business.last_scanned.is_some());
}

#[tokio::test]
async fn seeded_grid_round_trips() {
    let pool = fresh_pool().await;
    let store = PostgresStore::new(pool);

    let bounds = audit::grid::GeoBounds::new(
        GeoPoint::new(45.0, -93.0),
        GeoPoint::new(44.9, -93.2),
    );
    let grid_id = store.insert_grid("Saint Paul", bounds).await.unwrap();

    let grid = store.get_grid(grid_id).await.unwrap().unwrap();
    assert_eq!(grid.city, "Saint Paul");
    assert_eq!(grid.bounds(), bounds);
    assert!(grid.last_scraped.is_none());

    store.mark_grid_scraped(grid_id).await.unwrap();
    let grid = store.get_grid(grid_id).await.unwrap().unwrap();
    assert!(grid.last_scraped.is_some());
}

#[tokio::test]
async fn campaign_counter_accumulates() {
    let pool = fresh_pool().await;
    let store = PostgresStore::new(pool.clone());

    let run = store.create_run("Saint Paul").await.unwrap();
    assert_eq!(run.status, "running");
    assert_eq!(run.businesses_found, 0);

    store.add_businesses_found(run.id, 4).await.unwrap();
    store.add_businesses_found(run.id, 3).await.unwrap();

    let found: i32 =
        sqlx::query_scalar("SELECT businesses_found FROM scraper_runs WHERE id = $1")
            .bind(run.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(found, 7);
}
