//! Raw-record transformation: turn a provider payload into the canonical
//! business row and hand off websites to the audit pipeline.

use tracing::{info, warn};

use audit::transform::SourcePayload;
use audit::AuditError;

use crate::kernel::deps::WorkerDeps;
use crate::kernel::jobs::payloads::{self, AuditWebsiteJob, ProcessRawDataJob};

pub async fn run(job: ProcessRawDataJob, deps: &WorkerDeps) -> Result<(), AuditError> {
    let record = deps
        .store
        .get_raw_record(job.raw_record_id)
        .await?
        .ok_or_else(|| {
            AuditError::Validation(format!("raw record {} not found", job.raw_record_id))
        })?;

    if record.processed {
        info!(raw_record_id = %record.id, "raw record already processed, skipping");
        return Ok(());
    }

    let payload = SourcePayload::from_tag(&record.source_id, record.raw_payload.clone());
    let business = payload.transform();

    let business_id = match deps.store.upsert_business(&business).await {
        Ok(id) => id,
        Err(err @ AuditError::Validation(_)) => {
            // Unusable payloads are consumed with the error recorded, so the
            // record is never picked up again.
            warn!(raw_record_id = %record.id, error = %err, "unusable raw payload");
            deps.store
                .mark_raw_processed(record.id, Some(&err.to_string()))
                .await?;
            return Err(err);
        }
        Err(err) => return Err(err),
    };

    deps.store.mark_raw_processed(record.id, None).await?;
    info!(raw_record_id = %record.id, business_id = %business_id, "raw record transformed");

    if let Some(website) = business.website {
        let audit_job = AuditWebsiteJob {
            business_id,
            url: website,
            options: Default::default(),
        };
        deps.queue
            .enqueue(
                payloads::AUDIT_WEBSITE,
                serde_json::to_value(&audit_job)
                    .map_err(|e| AuditError::Validation(e.to_string()))?,
            )
            .await
            .map_err(|e| AuditError::Database(e.to_string()))?;
    }

    Ok(())
}
