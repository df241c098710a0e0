use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::info;

use crate::collect::{CategoryCollector, CollectError};
use crate::config::SiteConfig;
use crate::fetch::{FetchError, PageFetcher, ParseError};
use crate::models::{Deck, ImportOptions, ImportSummary};
use crate::parse::{self, DeckPageParser};
use crate::progress::{ProgressCounter, ProgressObserver};
use crate::store::{DeckStore, StoreError};

/// Tag marking imported records as archetype decks.
pub const CATEGORY_TAG: &str = "Archetype";

/// Tag marking records as owned by this importer. This is the only
/// discriminator bulk deletion has — the store has no other notion of
/// "imported by us".
pub const ORIGIN_TAG: &str = "Advisor";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Category {url} failed: {source}")]
    Category {
        url: String,
        #[source]
        source: CollectError,
    },
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Category task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Orchestrates a whole import run against one deck store.
///
/// Discovery failures (catalog root or a category page) abort the run;
/// individual deck pages are skipped by the collectors. A store write
/// failure aborts immediately and decks already written stay written.
pub struct DeckImporter {
    fetcher: PageFetcher,
    parser: Arc<DeckPageParser>,
    store: Arc<dyn DeckStore>,
    config: Arc<SiteConfig>,
}

impl DeckImporter {
    pub fn new(store: Arc<dyn DeckStore>, config: SiteConfig) -> Result<Self, ImportError> {
        let fetcher = PageFetcher::new(&config)?;
        let parser = Arc::new(DeckPageParser::new(&config)?);

        Ok(DeckImporter {
            fetcher,
            parser,
            store,
            config: Arc::new(config),
        })
    }

    /// Run a full import: discover categories, collect every category
    /// concurrently, then write the combined result to the store.
    ///
    /// The observer sees one `ProgressCounter` scoped to this run; two runs
    /// never share counters.
    pub async fn run(
        &self,
        options: ImportOptions,
        observer: impl ProgressObserver + 'static,
    ) -> Result<ImportSummary, ImportError> {
        info!("Starting archetype deck import");

        if options.delete_previous {
            let removed = self.store.delete_all_with_tag(ORIGIN_TAG).await?;
            info!("Deleted {} previously imported decks", removed);
        }

        let progress = Arc::new(ProgressCounter::new(observer));
        let fetch_permits = Arc::new(Semaphore::new(self.config.max_concurrent_fetches));

        let catalog = self.fetcher.fetch(&self.config.catalog_url()).await?;
        let category_urls =
            parse::select_links(&catalog, &self.config.category_links, &self.config)?;
        info!("Catalog lists {} category pages", category_urls.len());

        let handles: Vec<_> = category_urls
            .into_iter()
            .map(|url| {
                let collector = CategoryCollector::new(
                    self.fetcher.clone(),
                    Arc::clone(&self.parser),
                    Arc::clone(&self.config),
                    Arc::clone(&fetch_permits),
                );
                let progress = Arc::clone(&progress);
                tokio::spawn(async move {
                    let collected = collector.collect(&url, progress).await;
                    (url, collected)
                })
            })
            .collect();

        // Aggregation barrier: every category joins before the first write.
        let mut decks: Vec<Deck> = Vec::new();
        for joined in futures::future::join_all(handles).await {
            let (url, collected) = joined?;
            decks.extend(collected.map_err(|source| ImportError::Category { url, source })?);
        }

        // Writes are serialized on purpose: the store is shared external
        // state and this loop is its only writer.
        let mut deck_count = 0;
        for deck in &decks {
            info!("Importing deck ({})", deck.name);

            let deck = if options.strip_class_from_name {
                deck.renamed(strip_class_token(&deck.name, &deck.class))
            } else {
                deck.clone()
            };

            self.store
                .add_deck(
                    &deck.name,
                    &deck,
                    options.archive_previous,
                    CATEGORY_TAG,
                    ORIGIN_TAG,
                )
                .await?;
            deck_count += 1;
        }

        info!("Import of {} archetype decks completed", deck_count);
        Ok(ImportSummary { deck_count })
    }

    /// Delete every record this importer has ever written.
    pub async fn delete_decks(&self) -> Result<u64, ImportError> {
        info!("Deleting all archetype decks");
        let count = self.store.delete_all_with_tag(ORIGIN_TAG).await?;
        info!("Deleted {} decks", count);
        Ok(count)
    }
}

/// Remove the class token from a deck display name, so "Control Warrior"
/// with class "Warrior" becomes "Control". Removal is case-sensitive;
/// whitespace runs left behind by an interior removal are collapsed.
pub fn strip_class_token(name: &str, class: &str) -> String {
    let stripped = if class.is_empty() {
        name.to_string()
    } else {
        name.replace(class, "")
    };
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
