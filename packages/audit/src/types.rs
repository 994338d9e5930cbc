use serde::{Deserialize, Serialize};

/// Where a raw business record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessSource {
    GooglePlaces,
    ReviewSite,
    Generic,
}

impl BusinessSource {
    /// Stable identifier used as the `source_id` half of the dedupe key.
    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessSource::GooglePlaces => "google_places",
            BusinessSource::ReviewSite => "review_site",
            BusinessSource::Generic => "generic",
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "google_places" => BusinessSource::GooglePlaces,
            "review_site" => BusinessSource::ReviewSite,
            _ => BusinessSource::Generic,
        }
    }
}

/// Audit categories recognized by the scoring tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
    Performance,
    Accessibility,
    BestPractices,
    Seo,
}

impl AuditCategory {
    /// Ordering used when prioritizing recommendations:
    /// performance, then seo, then accessibility, then best-practices.
    pub fn priority(&self) -> u8 {
        match self {
            AuditCategory::Performance => 0,
            AuditCategory::Seo => 1,
            AuditCategory::Accessibility => 2,
            AuditCategory::BestPractices => 3,
        }
    }
}

/// Raw 0-1 category scores from one audit tool run.
///
/// `None` means the tool did not report that category. An errored run is
/// represented by `CategoryResults::default()`, which scales to all zeros.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CategoryResults {
    pub performance: Option<f64>,
    pub accessibility: Option<f64>,
    pub best_practices: Option<f64>,
    pub seo: Option<f64>,
}

/// One sub-item of an audit tool run (e.g. "image-alt", "render-blocking-resources").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditItem {
    pub id: String,
    pub title: String,
    pub category: AuditCategory,
    /// 0-1; anything below 0.9 counts as failing.
    pub score: f64,
    /// Relative weight within its category.
    pub weight: f64,
}

impl AuditItem {
    pub fn is_failing(&self) -> bool {
        self.score < 0.9
    }
}

/// The full 0-100 score set persisted on a website audit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditScores {
    pub performance: i32,
    pub accessibility: i32,
    pub best_practices: i32,
    pub seo: i32,
    pub mobile: i32,
    pub technical: i32,
    pub overall: i32,
}
