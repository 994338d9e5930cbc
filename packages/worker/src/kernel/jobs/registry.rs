//! Job registry: maps job-type strings to typed async handlers.
//!
//! Each processor registers its job type at startup; the runner claims rows
//! and dispatches through here without knowing the concrete payload types.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;

use super::job::Job;
use crate::kernel::deps::WorkerDeps;

type BoxedHandler = Box<
    dyn Fn(serde_json::Value, Arc<WorkerDeps>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>
        + Send
        + Sync,
>;

#[derive(Default)]
pub struct JobRegistry {
    handlers: HashMap<&'static str, BoxedHandler>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a job type with its handler.
    ///
    /// ```ignore
    /// registry.register::<GridSearchJob, _, _>(payloads::GRID_SEARCH, |job, deps| async move {
    ///     processors::grid_search::run(job, &deps).await?;
    ///     Ok(())
    /// });
    /// ```
    pub fn register<J, F, Fut>(&mut self, job_type: &'static str, handler: F)
    where
        J: DeserializeOwned + Send + 'static,
        F: Fn(J, Arc<WorkerDeps>) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let boxed: BoxedHandler = Box::new(move |value, deps| {
            let handler = handler.clone();
            Box::pin(async move {
                let payload: J = serde_json::from_value(value)
                    .map_err(|e| anyhow!("invalid payload for {}: {}", job_type, e))?;
                handler(payload, deps).await
            })
        });
        self.handlers.insert(job_type, boxed);
    }

    /// Deserialize and execute a claimed job.
    pub async fn execute(&self, job: &Job, deps: Arc<WorkerDeps>) -> Result<()> {
        let handler = self
            .handlers
            .get(job.job_type.as_str())
            .ok_or_else(|| anyhow!("unknown job type: {}", job.job_type))?;
        handler(job.args.clone(), deps).await
    }

    pub fn is_registered(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }

    pub fn registered_types(&self) -> Vec<&'static str> {
        self.handlers.keys().copied().collect()
    }
}

pub type SharedJobRegistry = Arc<JobRegistry>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::deps::test_support::mock_deps;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct PingJob {
        count: u32,
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = JobRegistry::new();
        registry.register::<PingJob, _, _>("ping", |_job, _deps| async move { Ok(()) });

        assert!(registry.is_registered("ping"));
        assert!(!registry.is_registered("pong"));
        assert!(registry.registered_types().contains(&"ping"));
    }

    #[tokio::test]
    async fn executes_registered_handler() {
        let mut registry = JobRegistry::new();
        registry.register::<PingJob, _, _>("ping", |job, _deps| async move {
            assert_eq!(job.count, 3);
            Ok(())
        });

        let job = Job::immediate("ping", json!({"count": 3}));
        registry.execute(&job, Arc::new(mock_deps())).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_job_type_is_an_error() {
        let registry = JobRegistry::new();
        let job = Job::immediate("mystery", json!({}));
        let err = registry
            .execute(&job, Arc::new(mock_deps()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown job type"));
    }

    #[tokio::test]
    async fn malformed_payload_is_an_error() {
        let mut registry = JobRegistry::new();
        registry.register::<PingJob, _, _>("ping", |_job, _deps| async move { Ok(()) });

        let job = Job::immediate("ping", json!({"count": "three"}));
        let err = registry
            .execute(&job, Arc::new(mock_deps()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid payload"));
    }
}
