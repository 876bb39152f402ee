//! Credentials for the two authenticated collaborators.
//!
//! - [`linkedin`]: a logged-in LinkedIn session kept in a cookie jar and
//!   persisted to a state file between runs
//! - [`google`]: OAuth access tokens for the Sheets API

use crate::error::Result;

pub mod google;
pub mod linkedin;

/// Something that can bring a content source session into a logged-in state.
#[allow(async_fn_in_trait)]
pub trait Authenticator {
    /// Make sure the session is authenticated, logging in if needed.
    async fn ensure_authenticated(&mut self) -> Result<()>;
}
