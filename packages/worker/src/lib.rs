//! Mainstreet pipeline worker.
//!
//! Wires the domain logic from the `audit` crate into a Postgres-backed job
//! pipeline:
//!
//! ```text
//! JobRunner
//!     │
//!     ├─► Poll DB (claim jobs via JobQueue)
//!     ├─► Dispatch via JobRegistry
//!     │       ├─► seed-campaign      (processors::campaign)
//!     │       ├─► grid-search        (processors::grid_search)
//!     │       ├─► process-raw-data   (processors::data_processing)
//!     │       └─► audit-website      (processors::website_audit)
//!     └─► Mark succeeded/failed (queue handles retries + dead letter)
//! ```

pub mod clients;
pub mod config;
pub mod kernel;
pub mod processors;
pub mod storage;

pub use config::Config;
pub use kernel::deps::WorkerDeps;
