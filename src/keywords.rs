//! Search keyword rotation.
//!
//! Scheduled runs fire every eight hours, so the UTC hour picks one of three
//! slots and each slot maps onto the keyword list. Manual runs always use the
//! first keyword.

use crate::error::{HarvestError, Result};
use chrono::{Timelike, Utc};
use std::path::Path;
use tracing::{info, instrument};

pub const DEFAULT_KEYWORDS: [&str; 6] = [
    "Test Automation Engineer",
    "QA Engineer",
    "Software QA",
    "Quality Assurance Engineer",
    "SDET",
    "Test Engineer",
];

/// Hours between scheduled runs.
const RUN_INTERVAL_HOURS: u32 = 8;

const MANUAL_EVENT: &str = "workflow_dispatch";

/// Choose a keyword for the given trigger event and UTC hour.
pub fn pick_keyword<'a>(
    keywords: &'a [String],
    event_name: Option<&str>,
    hour: u32,
) -> Option<&'a str> {
    if keywords.is_empty() {
        return None;
    }
    let index = if event_name == Some(MANUAL_EVENT) {
        0
    } else {
        (hour / RUN_INTERVAL_HOURS) as usize % keywords.len()
    };
    keywords.get(index).map(String::as_str)
}

/// Read the keyword list, creating the file with [`DEFAULT_KEYWORDS`] when absent.
pub async fn load_keywords(path: &Path) -> Result<Vec<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let keywords: Vec<String> = DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect();
            tokio::fs::write(path, serde_json::to_string_pretty(&keywords)?).await?;
            info!(path = %path.display(), "Created keyword file with defaults");
            Ok(keywords)
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(level = "info", skip_all, fields(path = %path.display(), event = ?event_name))]
pub async fn select_keyword(path: &Path, event_name: Option<&str>) -> Result<String> {
    let keywords = load_keywords(path).await?;
    let hour = Utc::now().hour();
    let keyword = pick_keyword(&keywords, event_name, hour)
        .ok_or_else(|| HarvestError::Config(format!("{} has no keywords", path.display())))?;
    info!(keyword, hour, "Selected search keyword");
    Ok(keyword.to_string())
}
