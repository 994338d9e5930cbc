//! Recommendation derivation from failing audit items.

use serde::{Deserialize, Serialize};

use crate::types::{AuditCategory, AuditItem};

/// Recommendations are truncated to the top entries after prioritization.
const MAX_RECOMMENDATIONS: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Medium,
    Low,
}

/// One actionable finding surfaced to the business owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub audit_id: String,
    pub title: String,
    pub category: AuditCategory,
    pub impact: Impact,
}

/// Impact classification from `(audit score, audit weight)`. Heavily weighted
/// items failing badly are high impact; light or near-passing items are low.
fn classify_impact(score: f64, weight: f64) -> Impact {
    if score < 0.5 && weight >= 1.0 {
        Impact::High
    } else if score < 0.75 || weight >= 2.0 {
        Impact::Medium
    } else {
        Impact::Low
    }
}

/// Build a prioritized recommendation list from one audit run's sub-items.
///
/// Failing items (score below 0.9) are ordered by category priority
/// (performance, seo, accessibility, best-practices), then by weight within
/// the category, and truncated to [`MAX_RECOMMENDATIONS`].
pub fn derive_recommendations(items: &[AuditItem]) -> Vec<Recommendation> {
    let mut failing: Vec<&AuditItem> = items.iter().filter(|i| i.is_failing()).collect();

    failing.sort_by(|a, b| {
        a.category
            .priority()
            .cmp(&b.category.priority())
            .then(b.weight.total_cmp(&a.weight))
            .then(a.score.total_cmp(&b.score))
    });

    failing
        .into_iter()
        .take(MAX_RECOMMENDATIONS)
        .map(|item| Recommendation {
            audit_id: item.id.clone(),
            title: item.title.clone(),
            category: item.category,
            impact: classify_impact(item.score, item.weight),
        })
        .collect()
}
