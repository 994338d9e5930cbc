//! PostgreSQL-backed job queue.
//!
//! Claiming uses `FOR UPDATE SKIP LOCKED` so concurrent runners never
//! double-claim, plus lease-expiry recovery for jobs orphaned by a dead
//! worker. Succeeded jobs are deleted; failed and dead-lettered jobs are
//! kept with their error for inspection.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::events::{JobEvent, JobEvents};
use super::job::{ErrorKind, Job};

/// Queue operations available to processors and producers.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job for immediate execution. Returns the job id.
    async fn enqueue(&self, job_type: &str, args: serde_json::Value) -> Result<Uuid>;

    /// Claim up to `limit` ready jobs for this worker.
    async fn claim(&self, worker_id: &str, limit: i64) -> Result<Vec<Job>>;

    /// Report successful completion. The job row is removed.
    async fn mark_succeeded(&self, job_id: Uuid) -> Result<()>;

    /// Report failure. Reschedules with backoff while retryable attempts
    /// remain, otherwise dead-letters the job.
    async fn mark_failed(&self, job_id: Uuid, error: &str, kind: ErrorKind) -> Result<()>;

    /// Extend the lease of a running job.
    async fn heartbeat(&self, job_id: Uuid) -> Result<()>;
}

pub struct PostgresJobQueue {
    pool: PgPool,
    events: JobEvents,
    lease_ms: i64,
}

const JOB_COLUMNS: &str = "id, job_type, args, status, retry_count, max_retries, next_run_at, \
     lease_expires_at, worker_id, error_message, error_kind, created_at, updated_at";

impl PostgresJobQueue {
    pub fn new(pool: PgPool, events: JobEvents) -> Self {
        Self {
            pool,
            events,
            lease_ms: 60_000,
        }
    }

    pub fn with_lease_duration(pool: PgPool, events: JobEvents, lease_ms: i64) -> Self {
        Self {
            pool,
            events,
            lease_ms,
        }
    }

    pub fn events(&self) -> &JobEvents {
        &self.events
    }

    /// Fetch one job row; failed jobs stay inspectable through this.
    pub async fn find(&self, job_id: Uuid) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }
}

#[async_trait]
impl JobQueue for PostgresJobQueue {
    async fn enqueue(&self, job_type: &str, args: serde_json::Value) -> Result<Uuid> {
        let job = Job::immediate(job_type, args);
        sqlx::query(
            r#"
            INSERT INTO jobs (id, job_type, args, status, retry_count, max_retries,
                              next_run_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(job.id)
        .bind(&job.job_type)
        .bind(&job.args)
        .bind(job.status)
        .bind(job.retry_count)
        .bind(job.max_retries)
        .bind(job.next_run_at)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(job_id = %job.id, job_type = %job_type, "job enqueued");
        Ok(job.id)
    }

    async fn claim(&self, worker_id: &str, limit: i64) -> Result<Vec<Job>> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            r#"
            WITH next_jobs AS (
                SELECT id
                FROM jobs
                WHERE
                    (status = 'pending' AND (next_run_at IS NULL OR next_run_at <= NOW()))
                    OR (status = 'running' AND lease_expires_at < NOW())
                ORDER BY COALESCE(next_run_at, created_at)
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE jobs
            SET status = 'running',
                lease_expires_at = NOW() + ($2 || ' milliseconds')::INTERVAL,
                worker_id = $3,
                updated_at = NOW()
            WHERE id IN (SELECT id FROM next_jobs)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(limit)
        .bind(self.lease_ms.to_string())
        .bind(worker_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }

    async fn mark_succeeded(&self, job_id: Uuid) -> Result<()> {
        // removeOnComplete: a finished job row has no further value.
        let job = self.find(job_id).await?;
        sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;

        if let Some(job) = job {
            self.events.publish(JobEvent::Completed {
                job_id,
                job_type: job.job_type,
            });
        }
        Ok(())
    }

    async fn mark_failed(&self, job_id: Uuid, error: &str, kind: ErrorKind) -> Result<()> {
        let Some(job) = self.find(job_id).await? else {
            anyhow::bail!("job {job_id} not found");
        };

        if job.can_retry(kind) {
            let retry_at = Utc::now() + Job::backoff_delay(job.retry_count);
            sqlx::query(
                r#"
                UPDATE jobs
                SET status = 'pending',
                    retry_count = retry_count + 1,
                    next_run_at = $1,
                    error_message = $2,
                    error_kind = $3,
                    lease_expires_at = NULL,
                    worker_id = NULL,
                    updated_at = NOW()
                WHERE id = $4
                "#,
            )
            .bind(retry_at)
            .bind(error)
            .bind(kind)
            .bind(job_id)
            .execute(&self.pool)
            .await?;

            self.events.publish(JobEvent::Failed {
                job_id,
                job_type: job.job_type,
                error: error.to_string(),
                error_kind: kind,
                attempt: job.retry_count + 1,
                will_retry: true,
            });
        } else {
            sqlx::query(
                r#"
                UPDATE jobs
                SET status = 'dead_letter',
                    error_message = $1,
                    error_kind = $2,
                    updated_at = NOW()
                WHERE id = $3
                "#,
            )
            .bind(error)
            .bind(kind)
            .bind(job_id)
            .execute(&self.pool)
            .await?;

            self.events.publish(JobEvent::Failed {
                job_id,
                job_type: job.job_type.clone(),
                error: error.to_string(),
                error_kind: kind,
                attempt: job.retry_count + 1,
                will_retry: false,
            });
            self.events.publish(JobEvent::DeadLettered {
                job_id,
                job_type: job.job_type,
                total_attempts: job.retry_count + 1,
                final_error: error.to_string(),
            });
            tracing::error!(job_id = %job_id, error = %error, "job dead-lettered");
        }

        Ok(())
    }

    async fn heartbeat(&self, job_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET lease_expires_at = NOW() + ($1 || ' milliseconds')::INTERVAL,
                updated_at = NOW()
            WHERE id = $2 AND status = 'running'
            "#,
        )
        .bind(self.lease_ms.to_string())
        .bind(job_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
