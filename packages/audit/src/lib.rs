//! Domain logic for the Mainstreet audit pipeline.
//!
//! Everything in this crate is side-effect free (the tech detector's page
//! fetch goes through the [`tech::HtmlFetcher`] trait so callers own the
//! I/O). The worker crate wires these pieces into the job pipeline.

pub mod error;
pub mod grid;
pub mod recommendations;
pub mod scoring;
pub mod tech;
pub mod transform;
pub mod types;

pub use error::AuditError;
pub use grid::{GeoBounds, GeoPoint};
pub use recommendations::{derive_recommendations, Impact, Recommendation};
pub use scoring::{mobile_score, overall_score, scale_score, technical_score, PartialScores};
pub use tech::{HtmlFetcher, TechCategory, Technology};
pub use transform::{CanonicalBusiness, SourcePayload};
pub use types::{AuditCategory, AuditItem, AuditScores, BusinessSource, CategoryResults};
