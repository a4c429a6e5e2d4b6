//! Single-best CSS selector generation.

use crate::dom::query::{self, UniquenessCheck};
use crate::errors::Result;
use crate::patterns;
use crate::scoring::{self, POSITION_WARNING};
use crate::strategy::{ConfidenceFactor, ConfidenceScore, LocatorStrategy, LocatorType};
use scraper::{ElementRef, Html};
use tracing::debug;

/// Attributes worth anchoring on when an id is absent, in priority order.
const DISCRIMINATING_ATTRIBUTES: &[&str] = &["name", "data-testid", "data-test"];

/// How far up the tree ancestor qualification will walk.
const MAX_ANCESTOR_DEPTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectorShape {
    IdRooted,
    Attribute,
    ClassChain,
    Hierarchy,
    TagOnly,
}

#[derive(Debug, Default)]
pub struct CssGenerator;

impl CssGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Always returns exactly one `css` candidate; the bare tag name is the
    /// guaranteed final fallback.
    pub fn generate_css_locator<'a>(
        &self,
        element: ElementRef<'a>,
        document: &'a Html,
    ) -> Result<LocatorStrategy> {
        query::ensure_attached(element, document)?;

        let (selector, shape) = self.build_selector(element, document);
        debug!(selector = %selector, "css candidate selected");

        let check = query::by_css_selector(document, element, &selector);
        let stability = patterns::css_selector_stability(&selector);
        let confidence = compose_css_confidence(&selector, shape, &check, stability);

        Ok(scoring::finish_strategy(
            LocatorType::Css,
            selector,
            confidence,
            check.is_unique,
            stability >= LocatorType::Css.stability_threshold(),
        ))
    }

    fn build_selector<'a>(
        &self,
        element: ElementRef<'a>,
        document: &'a Html,
    ) -> (String, SelectorShape) {
        let tag = element.value().name();

        if let Some(id) = non_blank(element.value().attr("id")) {
            return (format!("#{}", css_escape(id)), SelectorShape::IdRooted);
        }

        for attr in DISCRIMINATING_ATTRIBUTES {
            if let Some(value) = non_blank(element.value().attr(attr)) {
                return (
                    format!("{tag}[{attr}=\"{}\"]", value.replace('"', "\\\"")),
                    SelectorShape::Attribute,
                );
            }
        }

        if let Some(class) = non_blank(element.value().attr("class")) {
            let tokens: Vec<String> = class.split_whitespace().map(css_escape).collect();
            let simple = format!("{tag}.{}", tokens.join("."));
            if query::by_css_selector(document, element, &simple).is_unique {
                return (simple, SelectorShape::ClassChain);
            }
            if let Some(qualified) = self.qualify_with_ancestors(element, document, &simple) {
                return (qualified, SelectorShape::Hierarchy);
            }
            return (simple, SelectorShape::ClassChain);
        }

        (tag.to_string(), SelectorShape::TagOnly)
    }

    /// Prefix the simple selector with ancestor selectors (direct-child
    /// combinators) until the result is document-unique. The parent selector
    /// follows the same priority rules: id, then classes, then tag.
    fn qualify_with_ancestors<'a>(
        &self,
        element: ElementRef<'a>,
        document: &'a Html,
        simple: &str,
    ) -> Option<String> {
        let mut candidate = simple.to_string();
        let mut current = element;

        for _ in 0..MAX_ANCESTOR_DEPTH {
            let parent = current.parent().and_then(ElementRef::wrap)?;
            let parent_selector = ancestor_selector(parent)?;
            candidate = format!("{parent_selector} > {candidate}");
            if query::by_css_selector(document, element, &candidate).is_unique {
                return Some(candidate);
            }
            current = parent;
        }
        None
    }
}

/// Selector for an ancestor step: `#id`, `tag.classes`, or bare tag. Roots
/// of the parse tree (`html`) end the walk.
fn ancestor_selector(parent: ElementRef<'_>) -> Option<String> {
    let tag = parent.value().name();
    if tag == "html" {
        return None;
    }
    if let Some(id) = non_blank(parent.value().attr("id")) {
        return Some(format!("#{}", css_escape(id)));
    }
    if let Some(class) = non_blank(parent.value().attr("class")) {
        let tokens: Vec<String> = class.split_whitespace().map(css_escape).collect();
        return Some(format!("{tag}.{}", tokens.join(".")));
    }
    Some(tag.to_string())
}

/// First-pass CSS confidence: uniqueness 40, stability-scaled 40, shape
/// term up to +-20, clipped to [0, 100].
fn compose_css_confidence(
    selector: &str,
    shape: SelectorShape,
    check: &UniquenessCheck,
    stability: u8,
) -> ConfidenceScore {
    let mut score: i32 = 0;
    let mut factors = Vec::new();
    let mut warnings = Vec::new();

    if check.is_unique {
        score += 40;
        factors.push(ConfidenceFactor::positive(
            "uniqueness",
            0.40,
            "Selector matches exactly one element in the document",
        ));
    } else {
        factors.push(ConfidenceFactor::negative(
            "uniqueness",
            0.40,
            "Selector does not uniquely identify the element",
        ));
        if let Some(warning) = &check.warning {
            warnings.push(warning.clone());
        }
    }

    score += i32::from(stability) * 40 / 100;
    factors.push(ConfidenceFactor::positive(
        "stability",
        0.40,
        format!("Selector-shape stability estimate {stability}/100"),
    ));

    let (shape_points, shape_description) = match shape {
        SelectorShape::IdRooted => (15, "Rooted in the element id"),
        SelectorShape::Attribute => (10, "Anchored to a discriminating attribute"),
        SelectorShape::ClassChain => (5, "Built from the element's class list"),
        SelectorShape::Hierarchy => (0, "Qualified by ancestor selectors"),
        SelectorShape::TagOnly => (-20, "Bare tag-name fallback"),
    };
    score += shape_points;
    factors.push(if shape_points >= 0 {
        ConfidenceFactor::positive("selector-shape", shape_points.abs() as f32 / 100.0, shape_description)
    } else {
        ConfidenceFactor::negative("selector-shape", shape_points.abs() as f32 / 100.0, shape_description)
    });

    if patterns::selector_has_auto_generated_token(selector) {
        score -= 8;
        let warning = scoring::auto_generated_warning(LocatorType::Css);
        factors.push(ConfidenceFactor::negative("pattern", 0.08, warning));
        warnings.push(warning.to_string());
    }
    if patterns::is_positional_selector(selector) {
        score -= 10;
        factors.push(ConfidenceFactor::negative("pattern", 0.10, POSITION_WARNING));
        warnings.push(POSITION_WARNING.to_string());
    }

    ConfidenceScore {
        score: score.clamp(0, 100) as u8,
        factors,
        warnings,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Escape characters that carry meaning inside a compound selector.
fn css_escape(token: impl AsRef<str>) -> String {
    token
        .as_ref()
        .chars()
        .flat_map(|c| match c {
            ' ' | '.' | '#' | ':' | '[' | ']' | '(' | ')' | '\'' | '"' | '>' | '+' | '~' => {
                vec!['\\', c]
            }
            _ => vec![c],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    fn first<'a>(document: &'a Html, selector: &str) -> ElementRef<'a> {
        let sel = Selector::parse(selector).unwrap();
        document.select(&sel).next().unwrap()
    }

    #[test]
    fn unique_id_wins_the_chain() {
        let document = doc(r#"<button id="submit-btn">Submit</button>"#);
        let element = first(&document, "button");
        let strategy = CssGenerator::new()
            .generate_css_locator(element, &document)
            .unwrap();
        assert_eq!(strategy.selector, "#submit-btn");
        assert!(strategy.is_unique);
        assert!(strategy.confidence.score > 90, "got {}", strategy.confidence.score);
    }

    #[test]
    fn name_attribute_is_used_without_id() {
        let document = doc(r#"<input name="email" class="field">"#);
        let element = first(&document, "input");
        let strategy = CssGenerator::new()
            .generate_css_locator(element, &document)
            .unwrap();
        assert_eq!(strategy.selector, r#"input[name="email"]"#);
        assert!(strategy.is_unique);
    }

    #[test]
    fn class_chain_when_no_id_or_attribute() {
        let document = doc(r#"<div class="card wide"></div>"#);
        let element = first(&document, "div");
        let strategy = CssGenerator::new()
            .generate_css_locator(element, &document)
            .unwrap();
        assert_eq!(strategy.selector, "div.card.wide");
        assert!(strategy.is_unique);
    }

    #[test]
    fn ancestor_qualification_disambiguates() {
        let document = doc(
            r#"<div id="sidebar"><p class="note">a</p></div><div id="content"><p class="note">b</p></div>"#,
        );
        let element = first(&document, "#content .note");
        let strategy = CssGenerator::new()
            .generate_css_locator(element, &document)
            .unwrap();
        assert_eq!(strategy.selector, "#content > p.note");
        assert!(strategy.is_unique);
    }

    #[test]
    fn bare_tag_is_the_final_fallback() {
        let document = doc("<section><article>x</article><article>y</article></section>");
        let element = first(&document, "article");
        let strategy = CssGenerator::new()
            .generate_css_locator(element, &document)
            .unwrap();
        assert_eq!(strategy.selector, "article");
        assert!(!strategy.is_unique);
        assert!(strategy.confidence.score < 60);
    }

    #[test]
    fn auto_generated_classes_are_warned() {
        let document = doc(r#"<div class="css-1a2b3c4d"></div><div class="css-1a2b3c4d"></div>"#);
        let element = first(&document, "div");
        let strategy = CssGenerator::new()
            .generate_css_locator(element, &document)
            .unwrap();
        assert!(strategy.confidence.score < 60);
        assert!(strategy
            .confidence
            .warnings
            .iter()
            .any(|w| w == "Contains auto-generated class names that may change"));
    }
}
