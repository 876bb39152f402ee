//! Content sources the harvest loop can drive.
//!
//! A content source is a navigable view over a job search: it renders a list
//! of job cards, grows that list when scrolled, opens a detail panel when a
//! card is activated, and can jump to a numbered results page.
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | LinkedIn | [`linkedin`] | HTML job-card fragments over `reqwest`, parsed with `scraper` |
//!
//! Item handles are opaque to the harvest loop; it only passes them back to
//! the source that produced them.

use crate::error::Result;
use crate::models::CardFields;

pub mod linkedin;

#[cfg(test)]
pub mod fake;

/// A paginated, lazily growing list of job cards.
#[allow(async_fn_in_trait)]
pub trait ContentSource {
    /// Handle to one rendered job card.
    type Item;

    /// Load the search results view at `url`.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Every job card currently rendered, in display order.
    async fn items(&mut self) -> Result<Vec<Self::Item>>;

    /// The card's job id attribute, if it has one.
    async fn item_id(&self, item: &Self::Item) -> Result<Option<String>>;

    /// Title, company and location text of a card.
    async fn item_fields(&self, item: &Self::Item) -> Result<CardFields>;

    /// Click the card so its detail panel starts loading.
    async fn activate(&mut self, item: &Self::Item) -> Result<()>;

    /// Wait for the detail panel of the last activated card and return the
    /// `href` of its company link.
    async fn detail_company_href(&mut self) -> Result<Option<String>>;

    /// Scroll the list to make more cards render.
    async fn scroll(&mut self) -> Result<()>;

    /// Switch to results page `page` (1-based).
    async fn goto_page(&mut self, page: u32) -> Result<()>;
}
