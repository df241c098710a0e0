// Library exports for the CLI binary and integration tests

pub mod collect;
pub mod config;
pub mod fetch;
pub mod import;
pub mod models;
pub mod parse;
pub mod progress;
pub mod store;

// Test support (only available with test-utils feature)
#[cfg(feature = "test-utils")]
pub mod test_support;

pub use import::{DeckImporter, ImportError, CATEGORY_TAG, ORIGIN_TAG};
pub use models::{Deck, ImportOptions, ImportSummary};
pub use progress::{NullObserver, ProgressObserver, ProgressSnapshot};
