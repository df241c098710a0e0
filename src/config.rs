use std::time::Duration;

/// Catalog site shape and request policy.
///
/// The three node paths below are the only wire contract the importer has
/// with the catalog site, so a markup change on the site is a config edit
/// rather than a code change. Defaults match the live catalog; env vars
/// override the pieces that differ per deployment.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Scheme + host, no trailing slash. Relative hrefs are joined onto this.
    pub base_url: String,
    /// Path of the catalog root, which lists one link per class category.
    pub catalog_path: String,
    /// Selector for category links on the catalog root.
    pub category_links: String,
    /// Selector for deck-page links on a category page.
    pub deck_links: String,
    /// Meta property carrying the deck title on a deck page.
    pub meta_title: String,
    /// Meta property carrying the player class on a deck page.
    pub meta_class: String,
    /// Meta property carrying the comma-separated card list on a deck page.
    pub meta_cards: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Cap on simultaneous deck-page fetches across a whole run.
    pub max_concurrent_fetches: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            base_url: "http://metastats.net".to_string(),
            catalog_path: "/decks/".to_string(),
            category_links: "div#meta-nav ul li a".to_string(),
            deck_links: "div.decklist div h4 a".to_string(),
            meta_title: "x-deck:title".to_string(),
            meta_class: "x-deck:class".to_string(),
            meta_cards: "x-deck:cards".to_string(),
            request_timeout: Duration::from_secs(15),
            max_concurrent_fetches: 8,
        }
    }
}

impl SiteConfig {
    /// Default site shape with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = SiteConfig::default();

        if let Ok(url) = std::env::var("METADECK_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(value) = std::env::var("METADECK_MAX_FETCHES") {
            if let Ok(n) = value.parse() {
                config.max_concurrent_fetches = n;
            }
        }

        config
    }

    /// Full URL of the catalog root page.
    pub fn catalog_url(&self) -> String {
        format!("{}{}", self.base_url, self.catalog_path)
    }

    /// Join a possibly-relative href against the base URL.
    pub fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{}{}", self.base_url, href)
        } else {
            format!("{}/{}", self.base_url, href)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_url_joins_relative_hrefs() {
        let config = SiteConfig::default();

        assert_eq!(
            config.absolute_url("/decks/warrior"),
            "http://metastats.net/decks/warrior"
        );
        assert_eq!(
            config.absolute_url("decks/warrior"),
            "http://metastats.net/decks/warrior"
        );
    }

    #[test]
    fn absolute_url_passes_absolute_hrefs_through() {
        let config = SiteConfig::default();

        assert_eq!(
            config.absolute_url("https://elsewhere.test/deck/1"),
            "https://elsewhere.test/deck/1"
        );
    }

    #[test]
    fn catalog_url_is_base_plus_path() {
        let config = SiteConfig::default();
        assert_eq!(config.catalog_url(), "http://metastats.net/decks/");
    }
}
