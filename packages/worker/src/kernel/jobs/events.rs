//! Job lifecycle events.
//!
//! Every `active -> completed` and `active -> failed` queue transition is
//! published here so subscribers (metrics, admin dashboards) can observe the
//! pipeline without touching the jobs table.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::job::ErrorKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobEvent {
    Completed {
        job_id: Uuid,
        job_type: String,
    },
    Failed {
        job_id: Uuid,
        job_type: String,
        error: String,
        error_kind: ErrorKind,
        attempt: i32,
        will_retry: bool,
    },
    DeadLettered {
        job_id: Uuid,
        job_type: String,
        total_attempts: i32,
        final_error: String,
    },
}

/// Broadcast hub for job events. Cloning shares the underlying channel.
#[derive(Clone)]
pub struct JobEvents {
    tx: broadcast::Sender<JobEvent>,
}

impl JobEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Lagging or absent subscribers are not an error.
    pub fn publish(&self, event: JobEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.tx.subscribe()
    }
}

impl Default for JobEvents {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let events = JobEvents::default();
        let mut rx = events.subscribe();

        events.publish(JobEvent::Completed {
            job_id: Uuid::new_v4(),
            job_type: "grid-search".to_string(),
        });

        match rx.recv().await.unwrap() {
            JobEvent::Completed { job_type, .. } => assert_eq!(job_type, "grid-search"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let events = JobEvents::default();
        events.publish(JobEvent::Completed {
            job_id: Uuid::new_v4(),
            job_type: "audit-website".to_string(),
        });
    }
}
