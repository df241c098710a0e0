use scraper::{Html, Selector};
use thiserror::Error;

use crate::config::SiteConfig;
use crate::fetch::{Page, ParseError};
use crate::models::Deck;

#[derive(Debug, Error)]
pub enum MalformedDeckPageError {
    #[error("Deck page {0} has no deck metadata")]
    MissingMetadata(String),
    #[error("Deck page {0} is missing its {1}")]
    MissingField(String, &'static str),
    #[error("Deck page {0} has an empty card list")]
    EmptyCardList(String),
}

fn compile(selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|_| ParseError::Selector(selector.to_string()))
}

/// Collect the href target of every element matching `selector`,
/// absolutized against the configured base URL.
pub fn select_links(
    page: &Page,
    selector: &str,
    config: &SiteConfig,
) -> Result<Vec<String>, ParseError> {
    let document = page.document()?;
    let links = compile(selector)?;

    Ok(document
        .select(&links)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| config.absolute_url(href))
        .collect())
}

/// Extracts one deck from a deck page's metadata block.
///
/// Pure, synchronous transform. The deck-page convention is three meta
/// properties in the page head: title, player class, and the
/// comma-separated card list.
pub struct DeckPageParser {
    meta: Selector,
    title_property: String,
    class_property: String,
    cards_property: String,
}

impl DeckPageParser {
    pub fn new(config: &SiteConfig) -> Result<Self, ParseError> {
        Ok(DeckPageParser {
            meta: compile("head meta")?,
            title_property: config.meta_title.clone(),
            class_property: config.meta_class.clone(),
            cards_property: config.meta_cards.clone(),
        })
    }

    pub fn parse(&self, url: &str, document: &Html) -> Result<Deck, MalformedDeckPageError> {
        let mut title = None;
        let mut class = None;
        let mut cards = None;

        for element in document.select(&self.meta) {
            let property = match element.value().attr("property") {
                Some(property) => property,
                None => continue,
            };
            let content = match element.value().attr("content") {
                Some(content) => content,
                None => continue,
            };

            if property == self.title_property {
                title = Some(content.trim().to_string());
            } else if property == self.class_property {
                class = Some(content.trim().to_string());
            } else if property == self.cards_property {
                cards = Some(content.to_string());
            }
        }

        if title.is_none() && class.is_none() && cards.is_none() {
            return Err(MalformedDeckPageError::MissingMetadata(url.to_string()));
        }

        let name = title
            .filter(|t| !t.is_empty())
            .ok_or_else(|| MalformedDeckPageError::MissingField(url.to_string(), "title"))?;
        let class = class
            .filter(|c| !c.is_empty())
            .ok_or_else(|| MalformedDeckPageError::MissingField(url.to_string(), "class"))?;
        let cards: Vec<String> = cards
            .ok_or_else(|| MalformedDeckPageError::MissingField(url.to_string(), "card list"))?
            .split(',')
            .map(str::trim)
            .filter(|card| !card.is_empty())
            .map(String::from)
            .collect();

        if cards.is_empty() {
            return Err(MalformedDeckPageError::EmptyCardList(url.to_string()));
        }

        Ok(Deck {
            name,
            class,
            cards,
            source_url: url.to_string(),
        })
    }
}
