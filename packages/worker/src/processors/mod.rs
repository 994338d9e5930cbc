//! Job processors: one module per job type. Each exposes a single `run`
//! taking its typed payload and the shared dependency container.

pub mod campaign;
pub mod data_processing;
pub mod grid_search;
pub mod website_audit;
