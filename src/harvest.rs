//! Scroll-and-collect loop over a rendered job list.
//!
//! The list materializes lazily as it is scrolled and may drop cards that
//! scrolled out of view, so every pass re-enumerates what is rendered and
//! only processes ids not seen before in this session. The loop ends when
//! `target_count` records are collected, after `max_stagnant_passes`
//! consecutive passes that discover no new id, or when a scroll fails.

use crate::error::{HarvestError, Result};
use crate::models::{JOB_POST_SOURCE, JobRecord};
use crate::normalize::{clean_company_name, clean_job_title, clean_location};
use crate::scrapers::ContentSource;
use crate::utils::{canonical_company_url, job_post_url};
use chrono::Utc;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

/// Tuning knobs for one harvest session.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Stop once this many unique records are collected.
    pub target_count: usize,
    /// Consecutive passes without a new id before giving up.
    pub max_stagnant_passes: u32,
    /// Pause after each scroll for new cards to render.
    pub settle: Duration,
    /// Pause before activating each card.
    pub activation_delay: Duration,
    /// Bound on each activation and detail panel wait.
    pub wait_timeout: Duration,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            target_count: 25,
            max_stagnant_passes: 3,
            settle: Duration::from_secs(2),
            activation_delay: Duration::from_secs(1),
            wait_timeout: Duration::from_secs(5),
        }
    }
}

pub(crate) async fn bounded<T>(
    what: &str,
    limit: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(HarvestError::Timeout {
            what: what.to_string(),
            millis: limit.as_millis(),
        }),
    }
}

/// Collect up to `config.target_count` unique job records from the loaded view.
///
/// Per-card failures are logged and the card is dropped. Errors enumerating
/// the rendered cards propagate; a failed scroll ends the session with what
/// was collected so far.
#[instrument(level = "info", skip(source, config), fields(target = config.target_count))]
pub async fn collect<S: ContentSource>(
    source: &mut S,
    query: &str,
    config: &HarvestConfig,
) -> Result<Vec<JobRecord>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut results: Vec<JobRecord> = Vec::new();
    let mut stagnant_passes = 0u32;

    while results.len() < config.target_count {
        let cards = source.items().await?;
        let seen_before = seen.len();
        debug!(rendered = cards.len(), "Enumerated job cards");

        for card in &cards {
            let id = match source.item_id(card).await {
                Ok(Some(id)) if !id.is_empty() => id,
                Ok(_) => continue,
                Err(e) => {
                    warn!(error = %e, "Could not read job id; skipping card");
                    continue;
                }
            };
            if !seen.insert(id.clone()) {
                continue;
            }

            match harvest_card(source, card, &id, query, config).await {
                Ok(record) => results.push(record),
                Err(e) => {
                    let e = match e {
                        skip @ HarvestError::ExtractionSkip(_) => skip,
                        other => HarvestError::ExtractionSkip(other.to_string()),
                    };
                    warn!(job_post_id = %id, error = %e, "Error processing job card");
                }
            }
        }

        info!(
            rendered = cards.len(),
            collected = results.len(),
            "Finished pass over job cards"
        );

        if results.len() >= config.target_count {
            break;
        }

        if seen.len() == seen_before {
            stagnant_passes += 1;
            if stagnant_passes >= config.max_stagnant_passes {
                info!(stagnant_passes, "No new jobs after repeated scrolls; stopping");
                break;
            }
        } else {
            stagnant_passes = 0;
        }

        if let Err(e) = source.scroll().await {
            warn!(error = %e, "Scroll failed; stopping with collected jobs");
            break;
        }
        sleep(config.settle).await;
    }

    results.truncate(config.target_count);
    Ok(results)
}

async fn harvest_card<S: ContentSource>(
    source: &mut S,
    card: &S::Item,
    id: &str,
    query: &str,
    config: &HarvestConfig,
) -> Result<JobRecord> {
    let fields = source.item_fields(card).await?;

    sleep(config.activation_delay).await;
    bounded("card activation", config.wait_timeout, source.activate(card)).await?;
    let href = bounded("detail panel", config.wait_timeout, source.detail_company_href()).await?;

    Ok(JobRecord {
        job_post_id: id.to_string(),
        job_post_title: clean_job_title(&fields.title)?,
        job_post_url: job_post_url(id),
        job_post_location: clean_location(&fields.location),
        company_name: clean_company_name(&fields.company)?,
        company_linkedin_url: href.as_deref().and_then(canonical_company_url),
        job_search_keyword: query.to_string(),
        job_post_source: JOB_POST_SOURCE.to_string(),
        created_at: Some(Utc::now()),
    })
}
