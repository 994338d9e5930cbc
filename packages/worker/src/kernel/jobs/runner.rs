//! Job runner: polls the queue, dispatches through the registry, and reports
//! outcomes. Retries and dead-lettering are the queue's concern; the runner
//! only classifies errors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use audit::AuditError;

use super::job::ErrorKind;
use super::queue::JobQueue;
use super::registry::SharedJobRegistry;
use crate::kernel::deps::WorkerDeps;

#[derive(Debug, Clone)]
pub struct JobRunnerConfig {
    /// Maximum number of jobs to claim at once.
    pub batch_size: i64,
    /// How long to wait when no jobs are available.
    pub poll_interval: Duration,
    /// Worker ID for this instance.
    pub worker_id: String,
}

impl Default for JobRunnerConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            poll_interval: Duration::from_secs(5),
            worker_id: format!("worker-{}", Uuid::new_v4()),
        }
    }
}

pub struct JobRunner {
    queue: Arc<dyn JobQueue>,
    registry: SharedJobRegistry,
    deps: Arc<WorkerDeps>,
    config: JobRunnerConfig,
    shutdown: Arc<AtomicBool>,
}

impl JobRunner {
    pub fn new(queue: Arc<dyn JobQueue>, registry: SharedJobRegistry, deps: Arc<WorkerDeps>) -> Self {
        Self::with_config(queue, registry, deps, JobRunnerConfig::default())
    }

    pub fn with_config(
        queue: Arc<dyn JobQueue>,
        registry: SharedJobRegistry,
        deps: Arc<WorkerDeps>,
        config: JobRunnerConfig,
    ) -> Self {
        Self {
            queue,
            registry,
            deps,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Main loop. Runs until shutdown is requested.
    pub async fn run(self) -> Result<()> {
        info!(
            worker_id = %self.config.worker_id,
            batch_size = self.config.batch_size,
            "job runner starting"
        );

        loop {
            if self.is_shutdown_requested() {
                break;
            }

            let jobs = match self
                .queue
                .claim(&self.config.worker_id, self.config.batch_size)
                .await
            {
                Ok(jobs) => jobs,
                Err(e) => {
                    error!(error = %e, "failed to claim jobs");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            if jobs.is_empty() {
                tokio::time::sleep(self.config.poll_interval).await;
                continue;
            }

            debug!(count = jobs.len(), "claimed jobs");

            for job in jobs {
                if self.is_shutdown_requested() {
                    break;
                }

                let job_id = job.id;
                let job_type = job.job_type.clone();
                debug!(job_id = %job_id, job_type = %job_type, attempt = job.retry_count + 1, "executing job");

                // Keep the lease alive while the handler runs; audits can
                // outlast the claim window.
                let heartbeat = {
                    let queue = self.queue.clone();
                    tokio::spawn(async move {
                        let mut tick = tokio::time::interval(Duration::from_secs(30));
                        tick.tick().await;
                        loop {
                            tick.tick().await;
                            if let Err(e) = queue.heartbeat(job_id).await {
                                warn!(job_id = %job_id, error = %e, "heartbeat failed");
                            }
                        }
                    })
                };

                let result = self.registry.execute(&job, self.deps.clone()).await;
                heartbeat.abort();

                match result {
                    Ok(()) => {
                        info!(job_id = %job_id, job_type = %job_type, "job succeeded");
                        if let Err(e) = self.queue.mark_succeeded(job_id).await {
                            error!(job_id = %job_id, error = %e, "failed to mark job as succeeded");
                        }
                    }
                    Err(e) => {
                        warn!(job_id = %job_id, job_type = %job_type, error = %e, "job failed");
                        let kind = classify_error(&e);
                        if let Err(mark_err) =
                            self.queue.mark_failed(job_id, &e.to_string(), kind).await
                        {
                            error!(job_id = %job_id, error = %mark_err, "failed to mark job as failed");
                        }
                    }
                }
            }
        }

        info!(worker_id = %self.config.worker_id, "job runner stopped");
        Ok(())
    }

    /// Run until Ctrl+C.
    pub async fn run_until_shutdown(self) -> Result<()> {
        let shutdown = self.shutdown_handle();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("received shutdown signal");
            shutdown.store(true, Ordering::SeqCst);
        });
        self.run().await
    }
}

/// Classify an error for the retry decision. Typed pipeline errors carry
/// their own policy; everything else falls back to string matching.
fn classify_error(error: &anyhow::Error) -> ErrorKind {
    if let Some(audit_err) = error.downcast_ref::<AuditError>() {
        return if audit_err.is_retryable() {
            ErrorKind::Retryable
        } else {
            ErrorKind::NonRetryable
        };
    }

    let error_str = error.to_string().to_lowercase();
    if error_str.contains("invalid")
        || error_str.contains("not found")
        || error_str.contains("deserialize")
        || error_str.contains("parse")
    {
        return ErrorKind::NonRetryable;
    }

    ErrorKind::Retryable
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = JobRunnerConfig::default();
        assert_eq!(config.batch_size, 5);
        assert!(config.worker_id.starts_with("worker-"));
    }

    #[test]
    fn classify_typed_validation_error() {
        let err = anyhow::Error::from(AuditError::Validation("bad url".into()));
        assert_eq!(classify_error(&err), ErrorKind::NonRetryable);
    }

    #[test]
    fn classify_typed_network_error() {
        let err = anyhow::Error::from(AuditError::Network("timeout".into()));
        assert_eq!(classify_error(&err), ErrorKind::Retryable);
    }

    #[test]
    fn classify_untyped_errors_by_message() {
        assert_eq!(
            classify_error(&anyhow::anyhow!("connection timeout")),
            ErrorKind::Retryable
        );
        assert_eq!(
            classify_error(&anyhow::anyhow!("invalid payload for grid-search")),
            ErrorKind::NonRetryable
        );
        assert_eq!(
            classify_error(&anyhow::anyhow!("failed to parse response")),
            ErrorKind::NonRetryable
        );
    }
}
