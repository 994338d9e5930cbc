pub mod deps;
pub mod jobs;
