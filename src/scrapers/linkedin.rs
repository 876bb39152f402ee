//! LinkedIn job search scraper.
//!
//! The job list is rendered from LinkedIn's HTML job-card fragments
//! (`/jobs-guest/jobs/api/seeMoreJobPostings/search`), which return one batch
//! of `<li>` cards per `start` offset. Scrolling loads the next batch and
//! appends it to the rendered list; activating a card loads its posting
//! fragment, which carries the company link.
//!
//! # URL Pattern
//!
//! Searches use the same filters as the LinkedIn UI:
//! `https://www.linkedin.com/jobs/search/?f_T=…&geoId=103644278&keywords=…`

use super::ContentSource;
use crate::error::{HarvestError, Result};
use crate::http::{FixedAttempts, expect_success};
use crate::models::CardFields;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

const SEARCH_URL: &str = "https://www.linkedin.com/jobs/search/";
const CARDS_PATH: &str = "/jobs-guest/jobs/api/seeMoreJobPostings/search";
const POSTING_URL: &str = "https://www.linkedin.com/jobs-guest/jobs/api/jobPosting/";

/// Job title facet ids applied to every search.
const TITLE_FILTER: &str = "11227,13936,4729,264,661,20648,1510";
/// United States.
const GEO_ID: &str = "103644278";
/// Cards per results page.
pub const PAGE_SIZE: u32 = 25;

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

static CARD: Lazy<Selector> = Lazy::new(|| {
    selector(
        ".job-card-container, .base-search-card, [data-entity-urn^=\"urn:li:jobPosting:\"]",
    )
});
static TITLE: Lazy<Selector> =
    Lazy::new(|| selector(".job-card-list__title--link strong, .base-search-card__title"));
static COMPANY: Lazy<Selector> =
    Lazy::new(|| selector(".artdeco-entity-lockup__subtitle span, .base-search-card__subtitle"));
static LOCATION: Lazy<Selector> = Lazy::new(|| {
    selector(".job-card-container__metadata-wrapper span[dir='ltr'], .job-search-card__location")
});
static DETAIL_COMPANY_LINK: Lazy<Selector> = Lazy::new(|| {
    selector(".job-details-jobs-unified-top-card__company-name a, a.topcard__org-name-link")
});

/// Build the search URL for `query`.
pub fn search_url(query: &str) -> String {
    format!(
        "{}?f_T={}&geoId={}&keywords={}",
        SEARCH_URL,
        urlencoding::encode(TITLE_FILTER),
        GEO_ID,
        urlencoding::encode(query)
    )
}

/// One rendered job card, kept as its outer HTML.
#[derive(Debug, Clone)]
pub struct RenderedCard {
    html: String,
}

impl RenderedCard {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    fn with_root<T>(&self, f: impl FnOnce(ElementRef<'_>) -> T) -> Option<T> {
        let fragment = Html::parse_fragment(&self.html);
        let root = fragment.select(&CARD).next()?;
        Some(f(root))
    }

    /// `data-job-id`, or the numeric tail of a `urn:li:jobPosting:` urn.
    pub fn job_id(&self) -> Option<String> {
        self.with_root(|el| {
            let attrs = el.value();
            attrs
                .attr("data-job-id")
                .map(str::to_string)
                .or_else(|| {
                    attrs
                        .attr("data-entity-urn")
                        .and_then(|urn| urn.rsplit(':').next())
                        .map(str::to_string)
                })
        })
        .flatten()
        .filter(|id| !id.is_empty())
    }

    pub fn fields(&self) -> Result<CardFields> {
        self.with_root(|el| -> Result<CardFields> {
            let text = |sel: &Selector| {
                el.select(sel)
                    .next()
                    .map(|e| e.text().collect::<Vec<_>>().join(" ").trim().to_string())
            };
            let missing = |what: &str| HarvestError::ExtractionSkip(format!("card has no {what}"));
            let title = text(&TITLE).ok_or_else(|| missing("title"))?;
            let company = text(&COMPANY).ok_or_else(|| missing("company"))?;
            let location = text(&LOCATION).ok_or_else(|| missing("location"))?;
            Ok(CardFields {
                title,
                company,
                location,
            })
        })
        .unwrap_or_else(|| Err(HarvestError::ExtractionSkip("not a job card".into())))
    }
}

/// Split a batch of job-card HTML into rendered cards.
pub fn parse_cards(html: &str) -> Vec<RenderedCard> {
    let document = Html::parse_fragment(html);
    document
        .select(&CARD)
        .map(|el| RenderedCard::new(el.html()))
        .collect()
}

/// Company link `href` from a job posting page or fragment.
pub fn parse_company_href(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&DETAIL_COMPANY_LINK)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
}

/// LinkedIn job search results, driven over HTTP.
pub struct LinkedInSource {
    http: Client,
    attempts: FixedAttempts,
    cards_base: Option<Url>,
    page_start: u32,
    loaded: u32,
    rendered: Vec<RenderedCard>,
    active_job: Option<String>,
}

impl LinkedInSource {
    /// `http` should share its cookie jar with the LinkedIn authenticator.
    pub fn new(http: Client) -> Self {
        Self {
            http,
            attempts: FixedAttempts::default(),
            cards_base: None,
            page_start: 0,
            loaded: 0,
            rendered: Vec::new(),
            active_job: None,
        }
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        self.attempts
            .run("linkedin_get", move || async move {
                let resp = expect_success(self.http.get(url).send().await?).await?;
                Ok(resp.text().await?)
            })
            .await
    }

    /// Fetch the batch at `page_start + loaded` and append it to the rendered list.
    async fn load_batch(&mut self) -> Result<usize> {
        let mut url = self
            .cards_base
            .clone()
            .ok_or_else(|| HarvestError::Config("no search loaded; navigate first".into()))?;
        url.query_pairs_mut()
            .append_pair("start", &(self.page_start + self.loaded).to_string());

        let html = self.get_text(url.as_str()).await?;
        let cards = parse_cards(&html);
        let count = cards.len();
        self.loaded += count as u32;
        self.rendered.extend(cards);
        debug!(%url, count, "Loaded job card batch");
        Ok(count)
    }
}

impl ContentSource for LinkedInSource {
    type Item = RenderedCard;

    #[instrument(level = "info", skip(self))]
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let mut base = Url::parse(url)?;
        base.set_path(CARDS_PATH);
        self.cards_base = Some(base);
        self.page_start = 0;
        self.loaded = 0;
        self.rendered.clear();
        let count = self.load_batch().await?;
        info!(count, "Loaded search results");
        Ok(())
    }

    async fn items(&mut self) -> Result<Vec<RenderedCard>> {
        Ok(self.rendered.clone())
    }

    async fn item_id(&self, item: &RenderedCard) -> Result<Option<String>> {
        Ok(item.job_id())
    }

    async fn item_fields(&self, item: &RenderedCard) -> Result<CardFields> {
        item.fields()
    }

    async fn activate(&mut self, item: &RenderedCard) -> Result<()> {
        let id = item
            .job_id()
            .ok_or_else(|| HarvestError::ExtractionSkip("card has no job id".into()))?;
        self.active_job = Some(id);
        Ok(())
    }

    async fn detail_company_href(&mut self) -> Result<Option<String>> {
        let id = self
            .active_job
            .take()
            .ok_or_else(|| HarvestError::ExtractionSkip("no card activated".into()))?;
        let html = self.get_text(&format!("{}{}", POSTING_URL, id)).await?;
        Ok(parse_company_href(&html))
    }

    async fn scroll(&mut self) -> Result<()> {
        // An empty batch is not an error; the harvest loop's stagnation
        // counter ends the session.
        self.load_batch().await.map(|_| ())
    }

    #[instrument(level = "info", skip(self))]
    async fn goto_page(&mut self, page: u32) -> Result<()> {
        if page == 0 {
            return Err(HarvestError::InvalidInput("pages are numbered from 1".into()));
        }
        self.page_start = (page - 1) * PAGE_SIZE;
        self.loaded = 0;
        self.rendered.clear();
        let count = self.load_batch().await?;
        if count == 0 {
            return Err(HarvestError::Transport(format!("results page {} is empty", page)));
        }
        Ok(())
    }
}
