use serde::{Deserialize, Serialize};

/// A deck parsed from one catalog deck page.
///
/// Immutable once parsed: renaming for display produces a derived copy via
/// [`Deck::renamed`], never an in-place edit. The card list keeps the order
/// the page listed it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub name: String,
    /// Player class the catalog groups this deck under.
    pub class: String,
    pub cards: Vec<String>,
    pub source_url: String,
}

impl Deck {
    /// Copy of this deck under a different display name.
    pub fn renamed(&self, name: impl Into<String>) -> Deck {
        Deck {
            name: name.into(),
            class: self.class.clone(),
            cards: self.cards.clone(),
            source_url: self.source_url.clone(),
        }
    }
}

/// The three switches an import run consumes. Supplied by the caller's
/// settings surface; everything defaults to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Mark freshly written records as archived.
    pub archive_previous: bool,
    /// Delete all previously imported records before starting.
    pub delete_previous: bool,
    /// Remove the class token from deck display names ("Control Warrior"
    /// becomes "Control").
    pub strip_class_from_name: bool,
}

/// Final result of an import run: how many decks were written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub deck_count: usize,
}
