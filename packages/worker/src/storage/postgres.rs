use async_trait::async_trait;
use audit::grid::GeoBounds;
use audit::transform::CanonicalBusiness;
use audit::AuditError;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Business, GeoGrid, NewWebsiteAudit, RawBusinessRecord, ScraperRun};
use super::PipelineStore;

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> AuditError {
    AuditError::Database(e.to_string())
}

fn json_err(e: serde_json::Error) -> AuditError {
    AuditError::Database(format!("failed to serialize column: {e}"))
}

#[async_trait]
impl PipelineStore for PostgresStore {
    async fn upsert_raw_record(
        &self,
        source_id: &str,
        external_id: &str,
        payload: &Value,
    ) -> Result<Uuid, AuditError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO raw_business_data (id, source_id, external_id, raw_payload, processed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, FALSE, NOW(), NOW())
            ON CONFLICT (source_id, external_id) DO UPDATE SET
                raw_payload = EXCLUDED.raw_payload,
                updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(source_id)
        .bind(external_id)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(id)
    }

    async fn get_raw_record(&self, id: Uuid) -> Result<Option<RawBusinessRecord>, AuditError> {
        sqlx::query_as::<_, RawBusinessRecord>(
            r#"
            SELECT id, source_id, external_id, raw_payload, processed, error, created_at, updated_at
            FROM raw_business_data
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn mark_raw_processed(&self, id: Uuid, error: Option<&str>) -> Result<(), AuditError> {
        sqlx::query(
            r#"
            UPDATE raw_business_data
            SET processed = TRUE, error = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(error)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn upsert_business(&self, business: &CanonicalBusiness) -> Result<Uuid, AuditError> {
        let external_id = business.external_id.as_deref().ok_or_else(|| {
            AuditError::Validation("business payload has no external id".to_string())
        })?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO businesses (id, name, address, city, category, website, lat, lng,
                                    source_id, external_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW())
            ON CONFLICT (source_id, external_id) DO UPDATE SET
                name = EXCLUDED.name,
                address = EXCLUDED.address,
                city = EXCLUDED.city,
                category = EXCLUDED.category,
                website = EXCLUDED.website,
                lat = EXCLUDED.lat,
                lng = EXCLUDED.lng,
                updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&business.name)
        .bind(&business.address)
        .bind(&business.city)
        .bind(business.categories.first())
        .bind(&business.website)
        .bind(business.location.map(|p| p.lat))
        .bind(business.location.map(|p| p.lng))
        .bind(business.source.as_str())
        .bind(external_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(id)
    }

    async fn get_business(&self, id: Uuid) -> Result<Option<Business>, AuditError> {
        sqlx::query_as::<_, Business>(
            r#"
            SELECT id, name, address, city, category, website, lat, lng,
                   source_id, external_id, overall_score, latest_audit_id, last_scanned,
                   created_at, updated_at
            FROM businesses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn insert_audit(&self, audit: &NewWebsiteAudit) -> Result<Uuid, AuditError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO website_audits (id, business_id, url,
                performance_score, accessibility_score, best_practices_score, seo_score,
                mobile_score, technical_score, overall_score,
                desktop_screenshot, mobile_screenshot, technology_stack, recommendations, audit_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(id)
        .bind(audit.business_id)
        .bind(&audit.url)
        .bind(audit.scores.performance)
        .bind(audit.scores.accessibility)
        .bind(audit.scores.best_practices)
        .bind(audit.scores.seo)
        .bind(audit.scores.mobile)
        .bind(audit.scores.technical)
        .bind(audit.scores.overall)
        .bind(&audit.desktop_screenshot)
        .bind(&audit.mobile_screenshot)
        .bind(serde_json::to_value(&audit.technology_stack).map_err(json_err)?)
        .bind(serde_json::to_value(&audit.recommendations).map_err(json_err)?)
        .bind(audit.audit_date)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(id)
    }

    async fn record_audit_outcome(
        &self,
        business_id: Uuid,
        website: &str,
        overall_score: i32,
        audit_id: Uuid,
    ) -> Result<(), AuditError> {
        sqlx::query(
            r#"
            UPDATE businesses
            SET website = $1,
                overall_score = $2,
                latest_audit_id = $3,
                last_scanned = NOW(),
                updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(website)
        .bind(overall_score)
        .bind(audit_id)
        .bind(business_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_grid(&self, id: Uuid) -> Result<Option<GeoGrid>, AuditError> {
        sqlx::query_as::<_, GeoGrid>(
            r#"
            SELECT id, city, ne_lat, ne_lng, sw_lat, sw_lng, last_scraped
            FROM geo_grids
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn insert_grid(&self, city: &str, bounds: GeoBounds) -> Result<Uuid, AuditError> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO geo_grids (city, ne_lat, ne_lng, sw_lat, sw_lng)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(city)
        .bind(bounds.northeast.lat)
        .bind(bounds.northeast.lng)
        .bind(bounds.southwest.lat)
        .bind(bounds.southwest.lng)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn create_run(&self, location: &str) -> Result<ScraperRun, AuditError> {
        sqlx::query_as::<_, ScraperRun>(
            r#"
            INSERT INTO scraper_runs (location)
            VALUES ($1)
            RETURNING id, status, location, businesses_found, error, created_at, updated_at
            "#,
        )
        .bind(location)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn mark_grid_scraped(&self, id: Uuid) -> Result<(), AuditError> {
        sqlx::query("UPDATE geo_grids SET last_scraped = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn add_businesses_found(&self, run_id: Uuid, count: i32) -> Result<(), AuditError> {
        sqlx::query(
            r#"
            UPDATE scraper_runs
            SET businesses_found = businesses_found + $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(count)
        .bind(run_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn mark_run_failed(&self, run_id: Uuid, error: &str) -> Result<(), AuditError> {
        sqlx::query(
            r#"
            UPDATE scraper_runs
            SET status = 'failed', error = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(error)
        .bind(run_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}
