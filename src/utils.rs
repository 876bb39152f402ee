//! Utility functions for log truncation and LinkedIn URL handling.
//!
//! - String and JSON truncation for log payloads
//! - Job post URL derivation from a job id
//! - Company profile URL canonicalization

use serde_json::Value;
use url::Url;

/// Maximum characters kept per string when logging call arguments.
pub const LOG_ARG_MAX_CHARS: usize = 30;

const LINKEDIN_ROOT: &str = "https://www.linkedin.com/";

/// Path segment after which a company link points at a sub-page.
const COMPANY_SUBPAGE_SEGMENT: &str = "life";

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a count of
/// the dropped bytes appended. Cuts land on a char boundary.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Truncate every string inside a JSON value, recursing into arrays and objects.
///
/// Strings longer than `max` characters become their first `max` characters
/// followed by `...`. Numbers, booleans and nulls pass through.
pub fn truncate_value(value: &Value, max: usize) -> Value {
    match value {
        Value::String(s) if s.chars().count() > max => {
            Value::String(format!("{}...", s.chars().take(max).collect::<String>()))
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| truncate_value(v, max)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), truncate_value(v, max)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Public URL of a job posting.
pub fn job_post_url(job_post_id: &str) -> String {
    format!("https://www.linkedin.com/jobs/view/{}", job_post_id)
}

/// Reduce a company link to the company profile root.
///
/// Drops the query string and fragment, cuts before a `life` path segment,
/// and leaves exactly one trailing slash. Relative links are resolved against
/// `https://www.linkedin.com`. Returns `None` for blank or unparseable input.
pub fn canonical_company_url(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let mut url = Url::parse(LINKEDIN_ROOT).ok()?.join(href).ok()?;
    let segments = url
        .path_segments()
        .map(|segs| {
            segs.filter(|s| !s.is_empty())
                .take_while(|s| *s != COMPANY_SUBPAGE_SEGMENT)
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default();
    let path = if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", segments)
    };
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        let s = "™".repeat(5);
        assert_eq!(truncate_for_log(&s, 2), "™™…(+9 bytes)");
    }

    #[test]
    fn test_truncate_value_nested() {
        let long = "x".repeat(40);
        let v = json!({
            "query": long,
            "pages": [long, "short", 3],
            "full": true,
        });
        let t = truncate_value(&v, LOG_ARG_MAX_CHARS);
        let cut = format!("{}...", "x".repeat(30));
        assert_eq!(t["query"], json!(cut));
        assert_eq!(t["pages"][0], json!(cut));
        assert_eq!(t["pages"][1], json!("short"));
        assert_eq!(t["pages"][2], json!(3));
        assert_eq!(t["full"], json!(true));
    }

    #[test]
    fn test_truncate_value_exact_length_kept() {
        let s = "y".repeat(30);
        assert_eq!(truncate_value(&json!(s), 30), json!(s));
    }

    #[test]
    fn test_job_post_url() {
        assert_eq!(
            job_post_url("4220568275"),
            "https://www.linkedin.com/jobs/view/4220568275"
        );
    }

    #[test]
    fn test_canonical_company_url_life_page() {
        assert_eq!(
            canonical_company_url("https://www.linkedin.com/company/acme/life"),
            Some("https://www.linkedin.com/company/acme/".to_string())
        );
        assert_eq!(
            canonical_company_url("https://www.linkedin.com/company/acme/life/culture?trk=x"),
            Some("https://www.linkedin.com/company/acme/".to_string())
        );
    }

    #[test]
    fn test_canonical_company_url_plain_and_relative() {
        assert_eq!(
            canonical_company_url("https://www.linkedin.com/company/acme/?trk=public_jobs"),
            Some("https://www.linkedin.com/company/acme/".to_string())
        );
        assert_eq!(
            canonical_company_url("/company/acme"),
            Some("https://www.linkedin.com/company/acme/".to_string())
        );
        assert_eq!(canonical_company_url("   "), None);
    }

    #[test]
    fn test_canonical_company_url_keeps_life_prefixed_slugs() {
        assert_eq!(
            canonical_company_url(
                "https://www.linkedin.com/company/lifeway-christian-resources/?trk=x"
            ),
            Some("https://www.linkedin.com/company/lifeway-christian-resources/".to_string())
        );
        assert_eq!(
            canonical_company_url("https://www.linkedin.com/company/lifestance/life/about"),
            Some("https://www.linkedin.com/company/lifestance/".to_string())
        );
        assert_eq!(
            canonical_company_url("https://www.linkedin.com/company/acme/#about"),
            Some("https://www.linkedin.com/company/acme/".to_string())
        );
    }
}
