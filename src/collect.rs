use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::SiteConfig;
use crate::fetch::{FetchError, Page, PageFetcher, ParseError};
use crate::models::Deck;
use crate::parse::{self, DeckPageParser, MalformedDeckPageError};
use crate::progress::ProgressCounter;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Malformed deck page: {0}")]
    DeckPage(#[from] MalformedDeckPageError),
    #[error("Deck task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Collects every deck listed on one category page.
///
/// Deck pages are fetched and parsed concurrently, gated on a semaphore
/// shared across the whole run so total simultaneous connections stay
/// bounded no matter how many categories are in flight.
#[derive(Clone)]
pub struct CategoryCollector {
    fetcher: PageFetcher,
    parser: Arc<DeckPageParser>,
    config: Arc<SiteConfig>,
    fetch_permits: Arc<Semaphore>,
}

impl CategoryCollector {
    pub fn new(
        fetcher: PageFetcher,
        parser: Arc<DeckPageParser>,
        config: Arc<SiteConfig>,
        fetch_permits: Arc<Semaphore>,
    ) -> Self {
        CategoryCollector {
            fetcher,
            parser,
            config,
            fetch_permits,
        }
    }

    /// Fetch one category page, then fetch and parse every deck it links to.
    ///
    /// A failed deck page is logged and skipped while its siblings continue;
    /// a failure to fetch or read the category page itself fails the whole
    /// category. Returned deck order is completion order and carries no
    /// meaning downstream.
    pub async fn collect(
        &self,
        category_url: &str,
        progress: Arc<ProgressCounter>,
    ) -> Result<Vec<Deck>, CollectError> {
        let page = self.fetcher.fetch(category_url).await?;
        let deck_urls = parse::select_links(&page, &self.config.deck_links, &self.config)?;
        debug!("Category {} lists {} decks", category_url, deck_urls.len());

        // The only place found-counts rise: once per category page, before
        // any deck task is launched. Publishes the baseline report.
        progress.add_found(deck_urls.len() as u64);

        let mut tasks = JoinSet::new();
        for url in deck_urls {
            let fetcher = self.fetcher.clone();
            let parser = Arc::clone(&self.parser);
            let permits = Arc::clone(&self.fetch_permits);
            let progress = Arc::clone(&progress);

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.unwrap();

                match fetch_deck(&fetcher, &parser, &url).await {
                    Ok(deck) => {
                        progress.increment_imported();
                        Some(deck)
                    }
                    Err(e) => {
                        // Skip-and-log: one bad deck page never sinks its
                        // category.
                        warn!("Skipping deck page {}: {}", url, e);
                        None
                    }
                }
            });
        }

        // Structured join. A JoinError here means a deck task panicked or
        // was aborted, which is not a deck-page failure and does fail the
        // category.
        let mut decks = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            if let Some(deck) = joined? {
                decks.push(deck);
            }
        }

        Ok(decks)
    }
}

async fn fetch_deck(
    fetcher: &PageFetcher,
    parser: &DeckPageParser,
    url: &str,
) -> Result<Deck, CollectError> {
    let page: Page = fetcher.fetch(url).await?;
    let document = page.document()?;
    let deck = parser.parse(&page.url, &document)?;
    Ok(deck)
}
