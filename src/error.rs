//! Error taxonomy shared by every stage of a harvest run.
//!
//! The variants map onto how each failure is handled:
//!
//! | Variant | Raised by | Handling |
//! |---------|-----------|----------|
//! | [`HarvestError::InvalidInput`] | text normalizer | raised immediately |
//! | [`HarvestError::ExtractionSkip`] | harvest loop, per card | card dropped, loop continues |
//! | [`HarvestError::Transport`] | content source, sheets, Slack | fatal except for notifications |
//! | [`HarvestError::Timeout`] | bounded UI waits | item-level: skip, page-level: fatal |
//! | [`HarvestError::AuthFailure`] | LinkedIn login, Google token | fatal |
//! | [`HarvestError::Config`] | CLI / environment | fatal |

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("skipped job card: {0}")]
    ExtractionSkip(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("timed out after {millis} ms waiting for {what}")]
    Timeout { what: String, millis: u128 },

    #[error("authentication failed: {0}")]
    AuthFailure(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("url error: {0}")]
    Url(#[from] url::ParseError),
}

impl HarvestError {
    /// Transport-class failures: anything that came back from the network or the backend.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            HarvestError::Transport(_) | HarvestError::Http(_) | HarvestError::Timeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, HarvestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let e = HarvestError::Timeout {
            what: "detail panel".to_string(),
            millis: 5000,
        };
        assert_eq!(e.to_string(), "timed out after 5000 ms waiting for detail panel");
        assert!(e.is_transport());
    }

    #[test]
    fn test_invalid_input_is_not_transport() {
        assert!(!HarvestError::InvalidInput("empty".into()).is_transport());
        assert!(!HarvestError::AuthFailure("no li_at".into()).is_transport());
    }

    #[test]
    fn test_json_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e: HarvestError = err.into();
        assert!(matches!(e, HarvestError::Json(_)));
    }
}
