//! Fixture helpers for tests and examples.

use scraper::{ElementRef, Html, Selector};

pub struct TestHelper;

impl TestHelper {
    pub fn parse(html: &str) -> Html {
        Html::parse_document(html)
    }

    pub fn select_first<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
        let parsed = Selector::parse(selector).ok()?;
        document.select(&parsed).next()
    }

    pub fn select_all<'a>(document: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
        match Selector::parse(selector) {
            Ok(parsed) => document.select(&parsed).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// The fixture's target element; panics when the fixture is wrong, which
    /// is what a test wants.
    pub fn target<'a>(document: &'a Html, selector: &str) -> ElementRef<'a> {
        Self::select_first(document, selector).expect("fixture selector must match an element")
    }
}
