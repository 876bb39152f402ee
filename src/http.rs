//! Shared HTTP plumbing for LinkedIn, Google Sheets and Slack.
//!
//! - [`build_client`]: one `reqwest::Client` per collaborator, with a bounded
//!   request timeout and an optional cookie jar
//! - [`FixedAttempts`]: re-runs an idempotent request a fixed number of times
//!   with a constant pause; no backoff growth, no jitter
//! - [`expect_success`]: turns a non-2xx response into [`HarvestError::Transport`]

use crate::error::{HarvestError, Result};
use crate::utils::truncate_for_log;
use reqwest::cookie::Jar;
use reqwest::{Client, Response};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

/// Desktop Chrome user agent; LinkedIn serves a different markup to unknown clients.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Timeout for calls to Sheets, Google OAuth and LinkedIn.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build a client with the given request timeout.
pub fn build_client(timeout: Duration, cookies: Option<Arc<Jar>>) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10));
    if let Some(jar) = cookies {
        builder = builder.cookie_provider(jar);
    }
    Ok(builder.build()?)
}

/// Fail with the status code and the start of the body on non-2xx responses.
pub async fn expect_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let url = resp.url().to_string();
    let body = resp.text().await.unwrap_or_default();
    Err(HarvestError::Transport(format!(
        "{} returned {}: {}",
        url,
        status,
        truncate_for_log(&body, 300)
    )))
}

/// Fixed attempt cap for idempotent requests.
///
/// Only transport-class errors are retried; anything else (bad JSON, auth)
/// returns immediately.
#[derive(Debug, Clone, Copy)]
pub struct FixedAttempts {
    /// Total attempts, including the first one.
    pub max_attempts: usize,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for FixedAttempts {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl FixedAttempts {
    #[instrument(level = "debug", skip_all, fields(%op))]
    pub async fn run<T, F, Fut>(&self, op: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            match call().await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_transport() && attempt < self.max_attempts => {
                    warn!(
                        op,
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        error = %e,
                        "request failed; retrying"
                    );
                    sleep(self.delay).await;
                }
                Err(e) => {
                    error!(
                        op,
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        error = %e,
                        "request failed"
                    );
                    return Err(e);
                }
            }
        }
    }
}
