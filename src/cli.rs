//! Command-line interface definitions for the job harvester.
//!
//! Every option can also come from the environment, which is how scheduled
//! runs configure it.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the job harvester.
///
/// # Examples
///
/// ```sh
/// # Scheduled run: keyword picked by rotation, first results page only
/// job_harvest
///
/// # Explicit query, all four result pages, local token file
/// ENV=local job_harvest "SDET" --full
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Search query; falls back to JOB_SEARCH_KEYWORD, then keyword rotation
    pub query: Option<String>,

    /// Search query used when no positional query is given
    #[arg(long = "keyword", env = "JOB_SEARCH_KEYWORD")]
    pub job_search_keyword: Option<String>,

    /// Execution environment; `local` reads and refreshes a local Google token file
    #[arg(long = "env", env = "ENV", default_value = "")]
    pub environment: String,

    /// Harvest result pages 2 to 4 in addition to page 1
    #[arg(long, env = "HARVEST_FULL")]
    pub full: bool,

    /// Maximum jobs collected per results page
    #[arg(long, default_value_t = 25)]
    pub target_count: usize,

    /// Google spreadsheet id holding the job table
    #[arg(
        long,
        env = "SPREADSHEET_ID",
        default_value = "1acuQFPRf1cLDTDOeXpvlawxpk-G2KB48H8XBUOqv6AI"
    )]
    pub spreadsheet_id: String,

    /// A1 range of the job table
    #[arg(long, env = "SHEET_RANGE", default_value = "QA Engineer!A:I")]
    pub sheet_range: String,

    /// Slack incoming webhook for the run summary
    #[arg(long, env = "SLACK_WEBHOOK_URL")]
    pub slack_webhook_url: Option<String>,

    #[arg(long, env = "LINKEDIN_USERNAME")]
    pub linkedin_username: Option<String>,

    #[arg(long, env = "LINKEDIN_PASSWORD", hide_env_values = true)]
    pub linkedin_password: Option<String>,

    /// LinkedIn session state file (default: ~/Downloads/linkedin-auth.json)
    #[arg(long, env = "LINKEDIN_AUTH_STATE")]
    pub linkedin_auth_state: Option<PathBuf>,

    /// Google OAuth client secrets file
    #[arg(long, env = "GOOGLE_OAUTH_CLIENT", default_value = "google-oauth.json")]
    pub google_oauth_client: PathBuf,

    /// Google OAuth client secrets as inline JSON, used instead of the file
    #[arg(long, env = "GOOGLE_OAUTH_JSON", hide_env_values = true)]
    pub google_oauth_json: Option<String>,

    /// Cached Google token, used when ENV=local
    #[arg(long, env = "GOOGLE_TOKEN_FILE", default_value = "token.json")]
    pub google_token_file: PathBuf,

    /// Google refresh token, used outside ENV=local
    #[arg(long, env = "GOOGLE_REFRESH_TOKEN", hide_env_values = true)]
    pub google_refresh_token: Option<String>,

    /// Keyword rotation list, created with defaults when missing
    #[arg(long, env = "KEYWORDS_FILE", default_value = "keywords.json")]
    pub keywords_file: PathBuf,

    /// Trigger of the current CI run; `workflow_dispatch` selects the first keyword
    #[arg(long, env = "GITHUB_EVENT_NAME")]
    pub event_name: Option<String>,
}

/// Where credentials come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Developer machine: cached token file on disk.
    Local,
    /// CI: secrets handed in through the environment.
    Hosted,
}

impl Cli {
    pub fn run_mode(&self) -> RunMode {
        if self.environment.eq_ignore_ascii_case("local") {
            RunMode::Local
        } else {
            RunMode::Hosted
        }
    }

    /// Query given on the command line or through JOB_SEARCH_KEYWORD.
    pub fn explicit_query(&self) -> Option<&str> {
        self.query
            .as_deref()
            .or(self.job_search_keyword.as_deref())
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}
