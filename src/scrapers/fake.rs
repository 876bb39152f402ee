//! In-memory job board used by the harvest and session tests.
//!
//! Simulates a virtualized infinite-scroll list: `initial` cards render on
//! load, each scroll reveals `batch` more, and with a `window` only the last
//! `window` rendered cards are visible at a time. A new board starts with
//! page 1 already loaded.

use super::ContentSource;
use crate::error::{HarvestError, Result};
use crate::models::CardFields;

#[derive(Debug, Clone)]
pub struct FakeCard {
    pub id: Option<String>,
    pub title: String,
    pub company: String,
    pub location: String,
    pub company_href: Option<String>,
    /// Activation of this card never produces a detail panel.
    pub broken_detail: bool,
}

impl FakeCard {
    pub fn new(id: &str) -> Self {
        FakeCard {
            id: Some(id.to_string()),
            title: format!("QA Engineer {} (Remote)", id),
            company: "Acme Inc.".to_string(),
            location: " Austin,  TX ".to_string(),
            company_href: Some("https://www.linkedin.com/company/acme/life?trk=x".to_string()),
            broken_detail: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeBoard {
    pub pages: Vec<Vec<FakeCard>>,
    pub initial: usize,
    pub batch: usize,
    pub window: Option<usize>,
    /// Scrolls fail once this many have succeeded.
    pub scroll_budget: Option<usize>,
    pub fail_navigation: bool,
    /// Navigation never completes.
    pub hang_navigation: bool,
    pub fail_page: Option<u32>,

    pub current_page: usize,
    pub rendered: usize,
    pub navigations: Vec<String>,
    pub pages_visited: Vec<u32>,
    pub items_calls: usize,
    pub scrolls: usize,
    pub activations: usize,
    last_activated: Option<FakeCard>,
}

impl FakeBoard {
    /// One page of `total` cards with ids `"{prefix}{n}"`.
    pub fn with_ids(prefix: &str, total: usize, initial: usize, batch: usize) -> Self {
        Self::paged(&[prefix], total, initial, batch)
    }

    /// One page per prefix, `per_page` cards each.
    pub fn paged(prefixes: &[&str], per_page: usize, initial: usize, batch: usize) -> Self {
        FakeBoard {
            rendered: initial.min(per_page),
            pages: prefixes
                .iter()
                .map(|p| (1..=per_page).map(|n| FakeCard::new(&format!("{p}{n}"))).collect())
                .collect(),
            initial,
            batch,
            ..Default::default()
        }
    }

    fn page_len(&self) -> usize {
        self.pages.get(self.current_page).map_or(0, Vec::len)
    }
}

impl ContentSource for FakeBoard {
    type Item = FakeCard;

    async fn navigate(&mut self, url: &str) -> Result<()> {
        if self.hang_navigation {
            std::future::pending::<()>().await;
        }
        if self.fail_navigation {
            return Err(HarvestError::Transport(format!("navigation to {url} failed")));
        }
        self.navigations.push(url.to_string());
        self.current_page = 0;
        self.rendered = self.initial.min(self.page_len());
        Ok(())
    }

    async fn items(&mut self) -> Result<Vec<FakeCard>> {
        self.items_calls += 1;
        let start = self
            .window
            .map_or(0, |w| self.rendered.saturating_sub(w));
        Ok(self.pages[self.current_page][start..self.rendered].to_vec())
    }

    async fn item_id(&self, item: &FakeCard) -> Result<Option<String>> {
        Ok(item.id.clone())
    }

    async fn item_fields(&self, item: &FakeCard) -> Result<CardFields> {
        Ok(CardFields {
            title: item.title.clone(),
            company: item.company.clone(),
            location: item.location.clone(),
        })
    }

    async fn activate(&mut self, item: &FakeCard) -> Result<()> {
        self.activations += 1;
        self.last_activated = Some(item.clone());
        Ok(())
    }

    async fn detail_company_href(&mut self) -> Result<Option<String>> {
        match self.last_activated.take() {
            Some(card) if !card.broken_detail => Ok(card.company_href),
            // Never resolves, like a detail panel that never renders.
            Some(_) => std::future::pending().await,
            None => Err(HarvestError::ExtractionSkip("no card activated".into())),
        }
    }

    async fn scroll(&mut self) -> Result<()> {
        if self.scroll_budget.is_some_and(|b| self.scrolls >= b) {
            return Err(HarvestError::Transport("scroll failed".into()));
        }
        self.scrolls += 1;
        self.rendered = (self.rendered + self.batch).min(self.page_len());
        Ok(())
    }

    async fn goto_page(&mut self, page: u32) -> Result<()> {
        if self.fail_page == Some(page) || page == 0 || page as usize > self.pages.len() {
            return Err(HarvestError::Transport(format!("no pagination button for page {page}")));
        }
        self.pages_visited.push(page);
        self.current_page = page as usize - 1;
        self.rendered = self.initial.min(self.page_len());
        Ok(())
    }
}
