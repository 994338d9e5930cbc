//! Score calculation.
//!
//! Pure functions from raw audit metrics to 0-100 category scores and the
//! weighted overall score stored on a business.

use crate::tech::{TechCategory, Technology};

/// Fixed weights for the overall score. Summed they equal 1.0; if a category
/// is missing from a run the remaining weights are renormalized.
const WEIGHT_PERFORMANCE: f64 = 0.30;
const WEIGHT_ACCESSIBILITY: f64 = 0.15;
const WEIGHT_BEST_PRACTICES: f64 = 0.15;
const WEIGHT_SEO: f64 = 0.15;
const WEIGHT_MOBILE: f64 = 0.15;
const WEIGHT_TECHNICAL: f64 = 0.10;

/// Base the technical score starts from before stack bonuses.
const TECHNICAL_BASE: i32 = 60;

const MODERN_FRAMEWORKS: &[&str] = &["React", "Next.js", "Vue.js", "Nuxt", "Angular", "Svelte"];
const MODERN_PLATFORMS: &[&str] = &["Shopify", "Squarespace", "Webflow", "Wix"];

/// Scale a 0-1 tool score to 0-100.
pub fn scale_score(raw: f64) -> i32 {
    ((raw * 100.0).round() as i32).clamp(0, 100)
}

/// Category scores available for one overall-score computation.
///
/// `None` marks a category the run did not produce; its weight is
/// redistributed over the rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialScores {
    pub performance: Option<i32>,
    pub accessibility: Option<i32>,
    pub best_practices: Option<i32>,
    pub seo: Option<i32>,
    pub mobile: Option<i32>,
    pub technical: Option<i32>,
}

/// Weighted overall score over whichever categories are present, clamped to
/// [0, 100]. All categories absent yields 0.
pub fn overall_score(scores: &PartialScores) -> i32 {
    let weighted = [
        (scores.performance, WEIGHT_PERFORMANCE),
        (scores.accessibility, WEIGHT_ACCESSIBILITY),
        (scores.best_practices, WEIGHT_BEST_PRACTICES),
        (scores.seo, WEIGHT_SEO),
        (scores.mobile, WEIGHT_MOBILE),
        (scores.technical, WEIGHT_TECHNICAL),
    ];

    let mut sum = 0.0;
    let mut weight_total = 0.0;
    for (score, weight) in weighted {
        if let Some(s) = score {
            sum += s as f64 * weight;
            weight_total += weight;
        }
    }

    if weight_total == 0.0 {
        return 0;
    }

    ((sum / weight_total).round() as i32).clamp(0, 100)
}

/// Mobile score from a mobile-profile audit run compared against desktop.
///
/// Starts from the mobile performance score, penalizing a mobile/desktop gap
/// beyond 10 and 20 percentage points, and penalizing mobile having strictly
/// more failing audit items than desktop.
pub fn mobile_score(
    desktop_performance: i32,
    mobile_performance: i32,
    desktop_failing: usize,
    mobile_failing: usize,
) -> i32 {
    let mut score = mobile_performance;

    let gap = desktop_performance - mobile_performance;
    if gap > 20 {
        score -= 15;
    } else if gap > 10 {
        score -= 7;
    }

    if mobile_failing > desktop_failing {
        score -= 5;
    }

    score.clamp(0, 100)
}

/// Technical score derived from the detected technology stack: a fixed base
/// plus bonuses for a modern JS framework, any analytics, and a modern
/// CMS/e-commerce platform.
pub fn technical_score(stack: &[Technology]) -> i32 {
    let mut score = TECHNICAL_BASE;

    if stack
        .iter()
        .any(|t| t.category == TechCategory::Framework && MODERN_FRAMEWORKS.contains(&t.name.as_str()))
    {
        score += 15;
    }

    if stack.iter().any(|t| t.category == TechCategory::Analytics) {
        score += 10;
    }

    if stack
        .iter()
        .any(|t| t.category == TechCategory::Platform && MODERN_PLATFORMS.contains(&t.name.as_str()))
    {
        score += 10;
    }

    score.clamp(0, 100)
}
