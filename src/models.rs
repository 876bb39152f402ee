//! Data models for harvested job postings.
//!
//! - [`JobRecord`]: one job posting, the unit of persistence
//! - [`CardFields`]: raw text pulled off a rendered job card before cleaning
//! - [`RunSummary`]: aggregate counts reported at the end of a run
//!
//! Records are written to the sheet in the fixed [`COLUMNS`] order, which is
//! also the header row of an empty sheet.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Value of `job_post_source` for every record this crate produces.
pub const JOB_POST_SOURCE: &str = "LinkedIn";

/// Sheet column order, doubling as the header row.
pub const COLUMNS: [&str; 9] = [
    "job_post_id",
    "job_post_title",
    "job_post_url",
    "job_post_location",
    "company_name",
    "company_linkedin_url",
    "job_search_keyword",
    "job_post_source",
    "created_at",
];

/// A single job posting.
///
/// `job_post_id` is the dedup key across the whole record store. Records are
/// never mutated after they are built; the store only ever appends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_post_id: String,
    pub job_post_title: String,
    pub job_post_url: String,
    pub job_post_location: String,
    pub company_name: String,
    pub company_linkedin_url: Option<String>,
    pub job_search_keyword: String,
    pub job_post_source: String,
    /// Collection time. `None` only for rows read back with a missing or
    /// unparseable timestamp.
    pub created_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Render the record as a sheet row in [`COLUMNS`] order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.job_post_id.clone(),
            self.job_post_title.clone(),
            self.job_post_url.clone(),
            self.job_post_location.clone(),
            self.company_name.clone(),
            self.company_linkedin_url.clone().unwrap_or_default(),
            self.job_search_keyword.clone(),
            self.job_post_source.clone(),
            self.created_at
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_default(),
        ]
    }

    /// Build a record from a header-keyed row. Unknown columns are ignored and
    /// missing ones read as empty.
    pub fn from_named_cells(cells: &HashMap<String, String>) -> Self {
        let get = |k: &str| cells.get(k).cloned().unwrap_or_default();
        let company_linkedin_url = Some(get("company_linkedin_url")).filter(|s| !s.is_empty());
        let created_at = DateTime::parse_from_rfc3339(&get("created_at"))
            .ok()
            .map(|t| t.with_timezone(&Utc));

        JobRecord {
            job_post_id: get("job_post_id"),
            job_post_title: get("job_post_title"),
            job_post_url: get("job_post_url"),
            job_post_location: get("job_post_location"),
            company_name: get("company_name"),
            company_linkedin_url,
            job_search_keyword: get("job_search_keyword"),
            job_post_source: get("job_post_source"),
            created_at,
        }
    }
}

/// Raw text extracted from a job card, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardFields {
    pub title: String,
    pub company: String,
    pub location: String,
}

/// Counts reported once every page of a run has been persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub query: String,
    pub pages_harvested: u32,
    pub new_records: usize,
    pub total_records: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LinkedIn job search for \"{}\": {} new job(s) added from {} page(s), {} job(s) in the sheet.",
            self.query, self.new_records, self.pages_harvested, self.total_records
        )
    }
}
