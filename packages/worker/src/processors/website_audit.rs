//! Website audit: one scoped browser session per job, screenshots to object
//! storage, category scores from the audit tool, technology fingerprinting,
//! and a persisted audit row with derived recommendations.

use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use audit::scoring::{mobile_score, overall_score, scale_score, technical_score, PartialScores};
use audit::tech::detect_technologies;
use audit::types::AuditScores;
use audit::{derive_recommendations, AuditError, Recommendation};

use crate::clients::{screenshot_key, AuditRun, BrowserPage, DESKTOP_VIEWPORT, MOBILE_VIEWPORT};
use crate::kernel::deps::WorkerDeps;
use crate::kernel::jobs::payloads::AuditWebsiteJob;

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn run(job: AuditWebsiteJob, deps: &WorkerDeps) -> Result<(), AuditError> {
    let url = Url::parse(&job.url)
        .map_err(|e| AuditError::Validation(format!("invalid url {:?}: {e}", job.url)))?;

    // The business may have been deleted between enqueue and execution.
    deps.store
        .get_business(job.business_id)
        .await?
        .ok_or_else(|| AuditError::Validation(format!("business {} not found", job.business_id)))?;

    let mut page = deps.browser.launch().await?;
    let outcome = audit_session(page.as_mut(), &job, &url, deps).await;
    if let Err(close_err) = page.close().await {
        warn!(url = %url, error = %close_err, "failed to close browser session");
    }
    outcome
}

async fn audit_session(
    page: &mut dyn BrowserPage,
    job: &AuditWebsiteJob,
    url: &Url,
    deps: &WorkerDeps,
) -> Result<(), AuditError> {
    page.set_viewport(DESKTOP_VIEWPORT.0, DESKTOP_VIEWPORT.1, false)
        .await?;
    page.navigate(url, NAVIGATION_TIMEOUT).await?;

    if job.options.validate_only {
        info!(business_id = %job.business_id, url = %url, "url validated, skipping audit");
        return Ok(());
    }

    let (desktop_screenshot, mobile_screenshot) = if job.options.take_screenshots {
        capture_screenshots(page, job.business_id, deps).await?
    } else {
        (None, None)
    };

    let stack = if job.options.detect_technologies {
        match detect_technologies(deps.fetcher.as_ref(), url).await {
            Ok(stack) => stack,
            Err(e) => {
                warn!(url = %url, error = %e, "technology fingerprint failed");
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    // The technical score only needs the fingerprint, not the audit tool.
    let technical = job
        .options
        .detect_technologies
        .then(|| technical_score(&stack));

    let (scores, recommendations) = if job.options.run_audit_tool {
        score_site(url, technical, deps).await
    } else {
        let partial = PartialScores {
            technical,
            ..Default::default()
        };
        (fold_scores(&partial), Vec::new())
    };

    let audit = crate::storage::NewWebsiteAudit {
        business_id: job.business_id,
        url: job.url.clone(),
        scores,
        desktop_screenshot,
        mobile_screenshot,
        technology_stack: stack,
        recommendations,
        audit_date: Utc::now(),
    };

    let audit_id = deps.store.insert_audit(&audit).await?;
    deps.store
        .record_audit_outcome(job.business_id, &job.url, scores.overall, audit_id)
        .await?;

    info!(
        business_id = %job.business_id,
        audit_id = %audit_id,
        overall = scores.overall,
        "website audit complete"
    );
    Ok(())
}

/// Desktop screenshot, then mobile viewport, then mobile screenshot. Upload
/// failures are fatal: a half-stored audit is worse than a retried one.
async fn capture_screenshots(
    page: &mut dyn BrowserPage,
    business_id: Uuid,
    deps: &WorkerDeps,
) -> Result<(Option<String>, Option<String>), AuditError> {
    let desktop_bytes = page.screenshot_full_page().await?;
    let desktop_url = deps
        .screenshots
        .put_png(&screenshot_key(business_id, "desktop", Utc::now()), desktop_bytes)
        .await?;

    page.set_viewport(MOBILE_VIEWPORT.0, MOBILE_VIEWPORT.1, true)
        .await?;

    let mobile_bytes = page.screenshot_full_page().await?;
    let mobile_url = deps
        .screenshots
        .put_png(&screenshot_key(business_id, "mobile", Utc::now()), mobile_bytes)
        .await?;

    Ok((Some(desktop_url), Some(mobile_url)))
}

/// Run the audit tool (desktop, then a mobile-profile pass) and fold the
/// results into category scores and recommendations. A tool failure degrades
/// to zero scores rather than failing the job.
async fn score_site(
    url: &Url,
    technical: Option<i32>,
    deps: &WorkerDeps,
) -> (AuditScores, Vec<Recommendation>) {
    let desktop = match deps.audit_tool.run(url, false).await {
        Ok(run) => run,
        Err(e) => {
            warn!(url = %url, error = %e, "audit tool failed, recording zero scores");
            return (AuditScores::default(), Vec::new());
        }
    };

    let performance = desktop.categories.performance.map(scale_score);
    let desktop_failing = failing_count(&desktop);

    let mobile = match deps.audit_tool.run(url, true).await {
        Ok(mobile_run) => {
            let mobile_perf = mobile_run
                .categories
                .performance
                .map(scale_score)
                .unwrap_or(0);
            Some(mobile_score(
                performance.unwrap_or(0),
                mobile_perf,
                desktop_failing,
                failing_count(&mobile_run),
            ))
        }
        Err(e) => {
            // Approximate from desktop performance instead of losing the
            // whole audit.
            warn!(url = %url, error = %e, "mobile audit pass failed, approximating");
            performance.map(|p| ((p as f64) * 0.7).round() as i32)
        }
    };

    let partial = PartialScores {
        performance,
        accessibility: desktop.categories.accessibility.map(scale_score),
        best_practices: desktop.categories.best_practices.map(scale_score),
        seo: desktop.categories.seo.map(scale_score),
        mobile,
        technical,
    };

    (fold_scores(&partial), derive_recommendations(&desktop.items))
}

fn fold_scores(partial: &PartialScores) -> AuditScores {
    AuditScores {
        performance: partial.performance.unwrap_or(0),
        accessibility: partial.accessibility.unwrap_or(0),
        best_practices: partial.best_practices.unwrap_or(0),
        seo: partial.seo.unwrap_or(0),
        mobile: partial.mobile.unwrap_or(0),
        technical: partial.technical.unwrap_or(0),
        overall: overall_score(partial),
    }
}

fn failing_count(run: &AuditRun) -> usize {
    run.items.iter().filter(|item| item.is_failing()).count()
}
