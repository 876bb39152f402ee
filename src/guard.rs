//! Error wrapper applied at each I/O boundary.
//!
//! [`guard`] awaits an operation and, when it fails, logs the operation name,
//! the error and its arguments (as JSON with every string truncated), then
//! either propagates the error or swallows it and returns a fallback.
//!
//! ```ignore
//! let rows = guard("read_all", json!({ "range": range }), Policy::Propagate, fetch).await?;
//! guard("notify", json!({ "text": text }), Policy::Suppress(()), post).await?;
//! ```

use crate::error::HarvestError;
use crate::utils::{LOG_ARG_MAX_CHARS, truncate_value};
use serde_json::Value;
use std::future::Future;
use tracing::{error, warn};

/// What to do with a failed operation.
#[derive(Debug, Clone)]
pub enum Policy<T> {
    /// Log and return the error to the caller.
    Propagate,
    /// Log and return this value instead.
    Suppress(T),
}

/// Await `fut`, logging failures with truncated `args` and applying `policy`.
pub async fn guard<T, F>(
    op: &str,
    args: Value,
    policy: Policy<T>,
    fut: F,
) -> Result<T, HarvestError>
where
    F: Future<Output = Result<T, HarvestError>>,
{
    match fut.await {
        Ok(v) => Ok(v),
        Err(e) => {
            let args = truncate_value(&args, LOG_ARG_MAX_CHARS);
            match policy {
                Policy::Propagate => {
                    error!(op, error = %e, %args, "operation failed");
                    Err(e)
                }
                Policy::Suppress(fallback) => {
                    warn!(op, error = %e, %args, "operation failed; continuing with fallback");
                    Ok(fallback)
                }
            }
        }
    }
}
