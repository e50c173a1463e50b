//! Parsed page wrapper and DOM helpers
//!
//! Selector strings are parsed on use; a selector that fails to parse is
//! treated like one that matches nothing.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// A parsed HTML page together with the URL it was fetched from
///
/// Holds a `scraper::Html`, which is not `Send`; build it, read everything
/// needed from it, and drop it before awaiting.
pub struct PageDocument {
    html: Html,
    url: String,
}

impl PageDocument {
    /// Parse an HTML document
    pub fn parse(html: &str, url: impl Into<String>) -> Self {
        Self {
            html: Html::parse_document(html),
            url: url.into(),
        }
    }

    /// URL the document was fetched from
    pub fn url(&self) -> &str {
        &self.url
    }

    /// All elements matching `css`, in document order
    pub fn select(&self, css: &str) -> Vec<ElementRef<'_>> {
        match selector(css) {
            Some(selector) => self.html.select(&selector).collect(),
            None => Vec::new(),
        }
    }
}

/// Parse a CSS selector, logging and discarding invalid ones
pub(crate) fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            debug!(css, error = ?e, "Ignoring invalid selector");
            None
        }
    }
}

/// Descendants of `element` matching `css`, in document order
pub(crate) fn select_within<'a>(element: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(selector) => element.select(&selector).collect(),
        None => Vec::new(),
    }
}

/// Text content of an element with runs of whitespace collapsed
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Collapse runs of whitespace into single spaces and trim
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First non-empty text among the elements matching `css` within `element`
pub(crate) fn first_text_within(element: ElementRef<'_>, css: &str) -> Option<String> {
    select_within(element, css)
        .into_iter()
        .map(element_text)
        .find(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let doc = PageDocument::parse("<p>x</p>", "https://a.test/");
        assert!(doc.select("p[").is_empty());
        assert_eq!(doc.select("p").len(), 1);
    }

    #[test]
    fn test_element_text_collapses_whitespace() {
        let doc = PageDocument::parse(
            "<h2>  Multi\n   line\t<b>title</b> </h2>",
            "https://a.test/",
        );
        assert_eq!(element_text(doc.select("h2")[0]), "Multi line title");
    }

    #[test]
    fn test_first_text_within_skips_empty() {
        let doc = PageDocument::parse(
            "<div id=\"row\"><span></span><span> second </span></div>",
            "https://a.test/",
        );
        let row = doc.select("div#row")[0];
        assert_eq!(first_text_within(row, "span").as_deref(), Some("second"));
        assert_eq!(first_text_within(row, "em"), None);
    }
}
