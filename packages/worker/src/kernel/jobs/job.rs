//! Job model for background pipeline execution.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Base retry delay; doubles per attempt.
const BACKOFF_BASE_SECS: i64 = 30;
/// Ceiling on a single retry delay.
const BACKOFF_MAX_SECS: i64 = 3_600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
    DeadLetter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "error_kind", rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transient error; retried while attempts remain.
    #[default]
    Retryable,
    /// Permanent error; goes straight to dead letter.
    NonRetryable,
}

impl ErrorKind {
    pub fn should_retry(&self) -> bool {
        matches!(self, ErrorKind::Retryable)
    }
}

/// One queued unit of work. Owned exclusively by the queue: processors
/// receive the payload and report an outcome, never mutate job state.
#[derive(FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub job_type: String,
    pub args: serde_json::Value,

    pub status: JobStatus,
    pub retry_count: i32,
    pub max_retries: i32,
    pub next_run_at: Option<DateTime<Utc>>,

    // Lease management for concurrent claiming
    pub lease_expires_at: Option<DateTime<Utc>>,
    pub worker_id: Option<String>,

    // Kept on failure for post-mortems; cleared on retry reschedule
    pub error_message: Option<String>,
    pub error_kind: Option<ErrorKind>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create an immediately runnable job.
    pub fn immediate(job_type: &str, args: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_type: job_type.to_string(),
            args,
            status: JobStatus::Pending,
            retry_count: 0,
            max_retries: 3,
            next_run_at: None,
            lease_expires_at: None,
            worker_id: None,
            error_message: None,
            error_kind: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Exponential backoff for the next attempt after `retry_count` failures.
    pub fn backoff_delay(retry_count: i32) -> Duration {
        let exp = retry_count.clamp(0, 30) as u32;
        let secs = BACKOFF_BASE_SECS
            .saturating_mul(2_i64.saturating_pow(exp))
            .min(BACKOFF_MAX_SECS);
        Duration::seconds(secs)
    }

    /// Whether a failure should be rescheduled rather than dead-lettered.
    pub fn can_retry(&self, kind: ErrorKind) -> bool {
        kind.should_retry() && self.retry_count + 1 < self.max_retries
    }

    pub fn is_ready(&self) -> bool {
        if self.status != JobStatus::Pending {
            return false;
        }
        match self.next_run_at {
            None => true,
            Some(at) => at <= Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_job() -> Job {
        Job::immediate("grid-search", json!({"location": "Saint Paul"}))
    }

    #[test]
    fn new_job_defaults() {
        let job = sample_job();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.retry_count, 0);
        assert_eq!(job.max_retries, 3);
        assert!(job.is_ready());
    }

    #[test]
    fn scheduled_job_is_not_ready_early() {
        let mut job = sample_job();
        job.next_run_at = Some(Utc::now() + Duration::minutes(5));
        assert!(!job.is_ready());
    }

    #[test]
    fn running_job_is_not_ready() {
        let mut job = sample_job();
        job.status = JobStatus::Running;
        assert!(!job.is_ready());
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        assert_eq!(Job::backoff_delay(0).num_seconds(), 30);
        assert_eq!(Job::backoff_delay(1).num_seconds(), 60);
        assert_eq!(Job::backoff_delay(2).num_seconds(), 120);
    }

    #[test]
    fn backoff_is_capped() {
        assert_eq!(Job::backoff_delay(10).num_seconds(), BACKOFF_MAX_SECS);
        assert_eq!(Job::backoff_delay(30).num_seconds(), BACKOFF_MAX_SECS);
    }

    #[test]
    fn retry_policy_respects_attempts_and_kind() {
        let mut job = sample_job();
        assert!(job.can_retry(ErrorKind::Retryable));
        assert!(!job.can_retry(ErrorKind::NonRetryable));

        // Third attempt (retry_count 2 of max 3) is the last one.
        job.retry_count = 2;
        assert!(!job.can_retry(ErrorKind::Retryable));
    }
}
