//! Run summaries posted to a Slack incoming webhook.
//!
//! Delivery is best-effort: a missing webhook is a no-op and every failure is
//! logged and swallowed, so notifications never fail a run.

use crate::error::Result;
use crate::guard::{Policy, guard};
use crate::http::{build_client, expect_success};
use serde_json::json;
use std::time::Duration;
use tracing::{info, instrument};

/// Timeout for a webhook post.
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(20);

/// Receives a single text payload per run.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    /// Deliver `text`. Never fails; returns whether delivery succeeded.
    async fn notify(&self, text: &str) -> bool;
}

#[derive(Debug)]
pub struct SlackNotifier {
    http: reqwest::Client,
    webhook_url: Option<String>,
}

impl SlackNotifier {
    pub fn new(webhook_url: Option<String>) -> Result<Self> {
        Ok(Self {
            http: build_client(NOTIFY_TIMEOUT, None)?,
            webhook_url: webhook_url.filter(|u| !u.is_empty()),
        })
    }
}

impl Notifier for SlackNotifier {
    #[instrument(level = "info", skip_all)]
    async fn notify(&self, text: &str) -> bool {
        let Some(url) = self.webhook_url.as_deref() else {
            info!("SLACK_WEBHOOK_URL not set; skipping notification");
            return false;
        };
        guard(
            "slack",
            json!({ "text": text }),
            Policy::Suppress(false),
            async {
                let resp = self.http.post(url).json(&json!({ "text": text })).send().await?;
                expect_success(resp).await?;
                info!("Posted run summary to Slack");
                Ok(true)
            },
        )
        .await
        .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_webhook_is_noop() {
        let slack = SlackNotifier::new(None).unwrap();
        assert!(!slack.notify("hello").await);

        let slack = SlackNotifier::new(Some(String::new())).unwrap();
        assert!(!slack.notify("hello").await);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        // Nothing listens on port 9 of localhost; the post fails fast.
        let slack = SlackNotifier::new(Some("http://127.0.0.1:9/hook".to_string())).unwrap();
        assert!(!slack.notify("hello").await);
    }
}
