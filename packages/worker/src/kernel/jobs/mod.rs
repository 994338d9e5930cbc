//! Queue infrastructure for background pipeline jobs.
//!
//! Business logic lives in `crate::processors`; this module only provides
//! the queue, registry, runner, and job model.

pub mod events;
mod job;
pub mod payloads;
mod queue;
mod registry;
mod runner;

pub use events::{JobEvent, JobEvents};
pub use job::{ErrorKind, Job, JobStatus};
pub use queue::{JobQueue, PostgresJobQueue};
pub use registry::{JobRegistry, SharedJobRegistry};
pub use runner::{JobRunner, JobRunnerConfig};
