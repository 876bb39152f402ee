//! # Job Harvest
//!
//! Collects job postings from LinkedIn search results and appends the ones
//! not seen before to a Google Sheets table, then posts a run summary to
//! Slack.
//!
//! ## Usage
//!
//! ```sh
//! job_harvest "QA Engineer" --full
//! ```
//!
//! ## Architecture
//!
//! 1. **Authentication**: restore or create a LinkedIn session, obtain a
//!    Google access token
//! 2. **Harvesting**: scroll each results page and extract normalized job
//!    records, deduplicated per page
//! 3. **Persistence**: append records whose id is not in the sheet yet
//! 4. **Summary**: count the table and notify Slack

use clap::Parser;
use reqwest::cookie::Jar;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod auth;
mod cli;
mod error;
mod guard;
mod harvest;
mod http;
mod keywords;
mod models;
mod normalize;
mod notify;
mod scrapers;
mod session;
mod store;
mod utils;

use auth::google::{GoogleAuth, OAuthClient};
use auth::linkedin::{LinkedInAuth, default_state_path};
use cli::{Cli, RunMode};
use error::HarvestError;
use http::{DEFAULT_TIMEOUT, build_client};
use notify::SlackNotifier;
use scrapers::linkedin::LinkedInSource;
use session::{Session, SessionConfig};
use store::RecordStore;
use store::sheets::GoogleSheets;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("job_harvest starting up");

    let args = Cli::parse();
    let mode = args.run_mode();
    debug!(?mode, full = args.full, sheet_range = %args.sheet_range, "Parsed CLI arguments");

    // ---- Query ----
    let query = match args.explicit_query() {
        Some(q) => q.to_string(),
        None => keywords::select_keyword(&args.keywords_file, args.event_name.as_deref()).await?,
    };
    info!(%query, "Using search query");

    // ---- Google Sheets ----
    let google_http = build_client(DEFAULT_TIMEOUT, None)?;
    let oauth_client = match args.google_oauth_json.as_deref() {
        Some(raw) => OAuthClient::from_json(raw)?,
        None => OAuthClient::from_file(&args.google_oauth_client).await?,
    };
    let google_auth = match mode {
        RunMode::Local => GoogleAuth::Local {
            client: oauth_client,
            token_path: args.google_token_file.clone(),
        },
        RunMode::Hosted => GoogleAuth::Hosted {
            client: oauth_client,
            refresh_token: args.google_refresh_token.clone().ok_or_else(|| {
                HarvestError::Config("GOOGLE_REFRESH_TOKEN is required unless ENV=local".into())
            })?,
        },
    };
    let access_token = google_auth.access_token(&google_http).await?;
    let sheets = GoogleSheets::new(google_http, &args.spreadsheet_id, access_token);
    let store = RecordStore::new(sheets, &args.sheet_range);

    // ---- LinkedIn ----
    let jar = Arc::new(Jar::default());
    let linkedin_http = build_client(DEFAULT_TIMEOUT, Some(jar.clone()))?;
    let source = LinkedInSource::new(linkedin_http.clone());
    let linkedin_auth = LinkedInAuth::new(
        linkedin_http,
        jar,
        args.linkedin_auth_state.clone().unwrap_or_else(default_state_path),
        args.linkedin_username.clone(),
        args.linkedin_password.clone(),
    );

    let notifier = SlackNotifier::new(args.slack_webhook_url.clone())?;

    // ---- Run ----
    let mut config = SessionConfig::new(query);
    config.full = args.full;
    config.harvest.target_count = args.target_count;

    let mut session = Session::new(source, linkedin_auth, store, notifier);
    let summary = match session.run(&config).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Job harvest failed");
            return Err(e.into());
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        new_records = summary.new_records,
        total_records = summary.total_records,
        "Execution complete"
    );

    Ok(())
}
