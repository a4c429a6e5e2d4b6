//! Single-best XPath expression generation.

use crate::dom::query::{self, UniquenessCheck};
use crate::dom::xpath as xpath_eval;
use crate::errors::Result;
use crate::patterns;
use crate::scoring::{self, POSITION_WARNING};
use crate::strategy::{ConfidenceFactor, ConfidenceScore, LocatorStrategy, LocatorType};
use scraper::{ElementRef, Html};
use tracing::debug;

pub const ABSOLUTE_PATH_WARNING: &str =
    "Absolute tag path is fragile and may break with any structure change";

/// Attributes tried for the `//tag[@attr="..."]` form, in order.
const XPATH_ATTRIBUTES: &[&str] = &["name", "type", "data-testid", "data-test", "role"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpressionShape {
    Id,
    Attribute,
    Class,
    Text,
    Positional,
    TagOnly,
}

#[derive(Debug, Default)]
pub struct XPathGenerator;

impl XPathGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Always returns exactly one `xpath` candidate; `//tag` is the final
    /// fallback.
    pub fn generate_xpath_locator<'a>(
        &self,
        element: ElementRef<'a>,
        document: &'a Html,
    ) -> Result<LocatorStrategy> {
        query::ensure_attached(element, document)?;

        let (expression, shape) = self.build_expression_inner(element);
        debug!(expression = %expression, "xpath candidate selected");

        let check = xpath_eval::check_unique(document, element, &expression);
        let stability = patterns::xpath_stability(&expression);
        let confidence = compose_xpath_confidence(&expression, shape, &check, stability);

        Ok(scoring::finish_strategy(
            LocatorType::XPath,
            expression,
            confidence,
            check.is_unique,
            stability >= LocatorType::XPath.stability_threshold(),
        ))
    }

    /// The ordered fallback chain; the first form the element supports wins.
    pub fn build_expression(&self, element: ElementRef<'_>) -> String {
        self.build_expression_inner(element).0
    }

    fn build_expression_inner(&self, element: ElementRef<'_>) -> (String, ExpressionShape) {
        let tag = element.value().name();

        if let Some(id) = non_blank(element.value().attr("id")) {
            if !id.contains('"') {
                return (format!(r#"//{tag}[@id="{id}"]"#), ExpressionShape::Id);
            }
        }

        for attr in XPATH_ATTRIBUTES {
            if let Some(value) = non_blank(element.value().attr(attr)) {
                if !value.contains('"') {
                    return (
                        format!(r#"//{tag}[@{attr}="{value}"]"#),
                        ExpressionShape::Attribute,
                    );
                }
            }
        }

        if let Some(class) = non_blank(element.value().attr("class")) {
            let terms: Vec<String> = class
                .split_whitespace()
                .filter(|t| !t.contains('"'))
                .map(|t| format!(r#"contains(@class, "{t}")"#))
                .collect();
            if !terms.is_empty() {
                return (
                    format!("//{tag}[{}]", terms.join(" and ")),
                    ExpressionShape::Class,
                );
            }
        }

        let text: String = element.text().collect();
        let text = text.trim();
        if !text.is_empty() && !text.contains('"') && text.len() <= 80 {
            return (
                format!(r#"//{tag}[text()="{text}"]"#),
                ExpressionShape::Text,
            );
        }

        if let Some(parent) = element.parent().and_then(ElementRef::wrap) {
            if parent.value().name() != "html" {
                let position = element
                    .prev_siblings()
                    .filter_map(ElementRef::wrap)
                    .filter(|e| e.value().name() == tag)
                    .count()
                    + 1;
                return (
                    format!("//{}/{tag}[{position}]", parent_step(parent)),
                    ExpressionShape::Positional,
                );
            }
        }

        (format!("//{tag}"), ExpressionShape::TagOnly)
    }
}

/// Parent step for the sibling-position form: id, first class, or tag.
fn parent_step(parent: ElementRef<'_>) -> String {
    let tag = parent.value().name();
    if let Some(id) = non_blank(parent.value().attr("id")) {
        if !id.contains('"') {
            return format!(r#"{tag}[@id="{id}"]"#);
        }
    }
    if let Some(token) = non_blank(parent.value().attr("class"))
        .and_then(|c| c.split_whitespace().find(|t| !t.contains('"')))
    {
        return format!(r#"{tag}[contains(@class, "{token}")]"#);
    }
    tag.to_string()
}

/// The generator's own confidence formula: uniqueness 40, stability-scaled
/// 40, expression-shape term up to +-20, clipped to [0, 100].
fn compose_xpath_confidence(
    expression: &str,
    shape: ExpressionShape,
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
            "Expression matches exactly one node in the document",
        ));
    } else {
        factors.push(ConfidenceFactor::negative(
            "uniqueness",
            0.40,
            "Expression does not uniquely identify the node",
        ));
        if let Some(warning) = &check.warning {
            warnings.push(warning.clone());
        }
    }

    score += i32::from(stability) * 40 / 100;
    factors.push(ConfidenceFactor::positive(
        "stability",
        0.40,
        format!("Expression-shape stability estimate {stability}/100"),
    ));

    let (shape_points, shape_description) = match shape {
        ExpressionShape::Id => (20, "Anchored to the element id"),
        ExpressionShape::Attribute => (15, "Anchored to a discriminating attribute"),
        ExpressionShape::Class => (10, "Built from the element's class list"),
        ExpressionShape::Text => (5, "Anchored to the element's text content"),
        ExpressionShape::Positional => (-20, "Depends on sibling position"),
        ExpressionShape::TagOnly => (-21, "Bare tag-name fallback"),
    };
    score += shape_points;
    factors.push(if shape_points >= 0 {
        ConfidenceFactor::positive(
            "expression-shape",
            shape_points.abs() as f32 / 100.0,
            shape_description,
        )
    } else {
        ConfidenceFactor::negative(
            "expression-shape",
            shape_points.abs() as f32 / 100.0,
            shape_description,
        )
    });

    if shape == ExpressionShape::Positional {
        warnings.push(POSITION_WARNING.to_string());
    }
    if shape == ExpressionShape::TagOnly {
        warnings.push(ABSOLUTE_PATH_WARNING.to_string());
    }
    if patterns::selector_has_auto_generated_token(expression) {
        let warning = scoring::auto_generated_warning(LocatorType::XPath);
        factors.push(ConfidenceFactor::negative("pattern", 0.08, warning));
        warnings.push(warning.to_string());
        score -= 8;
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
    fn id_form_wins_and_scores_high() {
        let document = doc(r#"<button id="submit-btn">Submit</button>"#);
        let element = first(&document, "button");
        let strategy = XPathGenerator::new()
            .generate_xpath_locator(element, &document)
            .unwrap();
        assert_eq!(strategy.selector, r#"//button[@id="submit-btn"]"#);
        assert!(strategy.is_unique);
        assert!(strategy.confidence.score > 85);
    }

    #[test]
    fn attribute_form_follows_priority_order() {
        let document = doc(r#"<input type="email" name="user-email">"#);
        let element = first(&document, "input");
        let strategy = XPathGenerator::new()
            .generate_xpath_locator(element, &document)
            .unwrap();
        assert_eq!(strategy.selector, r#"//input[@name="user-email"]"#);
    }

    #[test]
    fn class_form_chains_every_token() {
        let document = doc(r#"<div class="card wide"></div>"#);
        let element = first(&document, "div");
        let strategy = XPathGenerator::new()
            .generate_xpath_locator(element, &document)
            .unwrap();
        assert_eq!(
            strategy.selector,
            r#"//div[contains(@class, "card") and contains(@class, "wide")]"#
        );
        assert!(strategy.is_unique);
    }

    #[test]
    fn text_form_uses_trimmed_content() {
        let document = doc("<p></p><button> Save draft </button>");
        let element = first(&document, "button");
        let strategy = XPathGenerator::new()
            .generate_xpath_locator(element, &document)
            .unwrap();
        assert_eq!(strategy.selector, r#"//button[text()="Save draft"]"#);
    }

    #[test]
    fn sibling_position_fallback_builds_parent_qualified_form() {
        let document = doc(
            r#"<div class="container"><button></button><button></button></div>"#,
        );
        let buttons: Vec<ElementRef<'_>> = {
            let sel = Selector::parse("button").unwrap();
            document.select(&sel).collect()
        };
        let strategy = XPathGenerator::new()
            .generate_xpath_locator(buttons[1], &document)
            .unwrap();
        assert_eq!(
            strategy.selector,
            r#"//div[contains(@class, "container")]/button[2]"#
        );
        assert!(strategy.confidence.score < 60);
        assert!(strategy
            .confidence
            .warnings
            .iter()
            .any(|w| w == POSITION_WARNING));
    }

    #[test]
    fn bare_tag_fallback_warns_about_fragility() {
        let document = doc("<body><section></section></body>");
        let element = first(&document, "body");
        let strategy = XPathGenerator::new()
            .generate_xpath_locator(element, &document)
            .unwrap();
        assert_eq!(strategy.selector, "//body");
        assert!(strategy
            .confidence
            .warnings
            .iter()
            .any(|w| w == ABSOLUTE_PATH_WARNING));
    }

    #[test]
    fn generation_is_idempotent() {
        let document = doc(r#"<input name="q">"#);
        let element = first(&document, "input");
        let generator = XPathGenerator::new();
        let a = generator.generate_xpath_locator(element, &document).unwrap();
        let b = generator.generate_xpath_locator(element, &document).unwrap();
        assert_eq!(a, b);
    }
}
