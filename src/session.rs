//! One harvesting run from login to Slack summary.
//!
//! ```text
//! Init → Authenticating → PageFetch(1) → Harvesting(1) → Persisting(1)
//!      → … → PageFetch(4) → Harvesting(4) → Persisting(4)
//!      → Summarizing → Done
//! ```
//!
//! Any fatal error moves the run to `Failed` and is returned to the caller.
//! Rows appended for earlier pages stay in the sheet.

use crate::auth::Authenticator;
use crate::error::Result;
use crate::harvest::{self, HarvestConfig, bounded};
use crate::models::RunSummary;
use crate::notify::Notifier;
use crate::scrapers::ContentSource;
use crate::scrapers::linkedin::search_url;
use crate::store::{RecordStore, SheetBackend};
use std::fmt;
use std::time::Duration;
use tracing::{error, info, instrument};

/// Pages visited in full mode. Other runs only harvest page 1.
pub const FULL_MODE_PAGES: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Authenticating,
    PageFetch(u32),
    Harvesting(u32),
    Persisting(u32),
    Summarizing,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Init => write!(f, "init"),
            RunState::Authenticating => write!(f, "authenticating"),
            RunState::PageFetch(n) => write!(f, "page_fetch({n})"),
            RunState::Harvesting(n) => write!(f, "harvesting({n})"),
            RunState::Persisting(n) => write!(f, "persisting({n})"),
            RunState::Summarizing => write!(f, "summarizing"),
            RunState::Done => write!(f, "done"),
            RunState::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub query: String,
    /// Harvest pages 2..=4 as well.
    pub full: bool,
    pub harvest: HarvestConfig,
    /// Bound on loading the search page or switching result pages.
    pub navigation_timeout: Duration,
}

impl SessionConfig {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            full: false,
            harvest: HarvestConfig::default(),
            navigation_timeout: Duration::from_secs(30),
        }
    }

    pub fn pages(&self) -> u32 {
        if self.full { FULL_MODE_PAGES } else { 1 }
    }
}

/// Context objects for a run, built once by the caller.
pub struct Session<S, A, B, N> {
    pub source: S,
    pub auth: A,
    pub store: RecordStore<B>,
    pub notifier: N,
    state: RunState,
}

impl<S, A, B, N> Session<S, A, B, N>
where
    S: ContentSource,
    A: Authenticator,
    B: SheetBackend,
    N: Notifier,
{
    pub fn new(source: S, auth: A, store: RecordStore<B>, notifier: N) -> Self {
        Self {
            source,
            auth,
            store,
            notifier,
            state: RunState::Init,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        info!(from = %self.state, to = %next, "Run state change");
        self.state = next;
    }

    #[instrument(level = "info", skip_all, fields(query = %config.query, full = config.full))]
    pub async fn run(&mut self, config: &SessionConfig) -> Result<RunSummary> {
        match self.drive(config).await {
            Ok(summary) => {
                self.transition(RunState::Done);
                Ok(summary)
            }
            Err(e) => {
                error!(state = %self.state, error = %e, "Run failed");
                self.transition(RunState::Failed);
                Err(e)
            }
        }
    }

    async fn drive(&mut self, config: &SessionConfig) -> Result<RunSummary> {
        self.transition(RunState::Authenticating);
        self.auth.ensure_authenticated().await?;

        let pages = config.pages();
        let mut new_records = 0usize;

        for page in 1..=pages {
            self.transition(RunState::PageFetch(page));
            if page == 1 {
                let url = search_url(&config.query);
                let load = self.source.navigate(&url);
                bounded("search page", config.navigation_timeout, load).await?;
            } else {
                let switch = self.source.goto_page(page);
                bounded("pagination", config.navigation_timeout, switch).await?;
            }

            self.transition(RunState::Harvesting(page));
            let jobs = harvest::collect(&mut self.source, &config.query, &config.harvest).await?;
            info!(page, found = jobs.len(), "Found jobs on page");

            self.transition(RunState::Persisting(page));
            let added = self.store.append_new(&jobs).await?;
            new_records += added;
            info!(page, added, new_records, "Persisted page");
        }

        self.transition(RunState::Summarizing);
        let total_records = self.store.read_all().await?.len();
        let summary = RunSummary {
            query: config.query.clone(),
            pages_harvested: pages,
            new_records,
            total_records,
        };
        info!(%summary, "Run complete");
        self.notifier.notify(&summary.to_string()).await;

        Ok(summary)
    }
}
