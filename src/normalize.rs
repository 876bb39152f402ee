//! Cleanup of raw job card text into display form.
//!
//! Each function applies its substitutions in a fixed order, every step
//! working on the output of the previous one.

use crate::error::{HarvestError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static TITLE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // QA Automation Engineer (SDET) -> QA Automation Engineer
        r"\(.*?\)",
        // QA Automation Engineer [SDET] -> QA Automation Engineer
        r"\[.*?\]",
        // Mobile Test Automation Engineer || W2 role -> Mobile Test Automation Engineer
        r"\s*\|+.*",
        // Senior SDET - Javascript -> Senior SDET, but Vehicle-to-Cloud stays
        r"\s+-\s+.*",
        // Quality Engineer, 2+ Years of Experience -> Quality Engineer
        r",\s*\d+\+?\s*[Yy]ears?.*",
        r",\s*[Ee]xperienced?.*",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static COMPANY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i),?\s*Inc\.?.*",
        r"(?i),?\s*LLC\.?.*",
        r"(?i)\.com.*",
        r"™.*",
        r"®.*",
        r"\(.*\).*",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

fn apply_in_order(input: &str, patterns: &[Regex]) -> String {
    patterns.iter().fold(input.to_string(), |acc, re| {
        re.replace_all(&acc, "").into_owned()
    })
}

/// Strip annotations and trailing qualifiers from a job title.
///
/// # Errors
///
/// [`HarvestError::InvalidInput`] when the title is empty or only whitespace.
pub fn clean_job_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(HarvestError::InvalidInput("job title is required".into()));
    }
    Ok(collapse_whitespace(&apply_in_order(title, &TITLE_PATTERNS)))
}

/// Strip legal-entity suffixes, domains, trademark marks and parentheticals
/// from a company name.
///
/// # Errors
///
/// [`HarvestError::InvalidInput`] when the name is empty or only whitespace.
pub fn clean_company_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(HarvestError::InvalidInput("company name is required".into()));
    }
    Ok(collapse_whitespace(&apply_in_order(name, &COMPANY_PATTERNS)))
}

/// Collapse whitespace in a location string. Never fails.
pub fn clean_location(location: &str) -> String {
    collapse_whitespace(location)
}
