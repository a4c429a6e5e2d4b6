//! id / class / name / tag candidate generation.

use crate::dom::query;
use crate::errors::Result;
use crate::patterns;
use crate::scoring;
use crate::strategy::{LocatorStrategy, LocatorType};
use scraper::{ElementRef, Html};
use tracing::debug;

/// Tags whose `name` attribute is form-associated and worth locating by.
const NAME_BEARING_TAGS: &[&str] = &["input", "select", "textarea", "button", "fieldset", "form"];

#[derive(Debug, Default)]
pub struct AttributeGenerator;

impl AttributeGenerator {
    pub fn new() -> Self {
        Self
    }

    /// `#id` candidate, only when the element carries a non-blank id.
    pub fn generate_id_locator<'a>(
        &self,
        element: ElementRef<'a>,
        document: &'a Html,
    ) -> Result<Option<LocatorStrategy>> {
        query::ensure_attached(element, document)?;
        let Some(id) = non_blank(element.value().attr("id")) else {
            return Ok(None);
        };

        let check = query::by_id(document, element, id);
        let stability = patterns::attribute_value_stability(id);
        let confidence = scoring::compose(LocatorType::Id, &check, stability, id);
        Ok(Some(scoring::finish_strategy(
            LocatorType::Id,
            format!("#{id}"),
            confidence,
            check.is_unique,
            stability >= LocatorType::Id.stability_threshold(),
        )))
    }

    /// `.class` candidate using the best single token: uniqueness first,
    /// stability as the tie-break.
    pub fn generate_class_locator<'a>(
        &self,
        element: ElementRef<'a>,
        document: &'a Html,
    ) -> Result<Option<LocatorStrategy>> {
        query::ensure_attached(element, document)?;
        let Some(class) = non_blank(element.value().attr("class")) else {
            return Ok(None);
        };

        let mut best: Option<(&str, query::UniquenessCheck, u8)> = None;
        for token in class.split_whitespace() {
            let check = query::by_class_token(document, element, token);
            let stability = patterns::class_token_stability(token);
            let better = match &best {
                None => true,
                Some((_, best_check, best_stability)) => {
                    (check.is_unique, stability) > (best_check.is_unique, *best_stability)
                }
            };
            if better {
                best = Some((token, check, stability));
            }
        }
        let Some((token, check, stability)) = best else {
            return Ok(None);
        };

        debug!(token, unique = check.is_unique, "selected class token");
        let confidence = scoring::compose(LocatorType::Class, &check, stability, token);
        Ok(Some(scoring::finish_strategy(
            LocatorType::Class,
            format!(".{token}"),
            confidence,
            check.is_unique,
            stability >= LocatorType::Class.stability_threshold(),
        )))
    }

    /// `[name="..."]` candidate, restricted to form-associated tags.
    pub fn generate_name_locator<'a>(
        &self,
        element: ElementRef<'a>,
        document: &'a Html,
    ) -> Result<Option<LocatorStrategy>> {
        query::ensure_attached(element, document)?;
        if !NAME_BEARING_TAGS.contains(&element.value().name()) {
            return Ok(None);
        }
        let Some(name) = non_blank(element.value().attr("name")) else {
            return Ok(None);
        };

        let check = query::by_name(document, element, name);
        let stability = patterns::attribute_value_stability(name);
        let confidence = scoring::compose(LocatorType::Name, &check, stability, name);
        Ok(Some(scoring::finish_strategy(
            LocatorType::Name,
            format!("[name=\"{}\"]", name.replace('"', "\\\"")),
            confidence,
            check.is_unique,
            stability >= LocatorType::Name.stability_threshold(),
        )))
    }

    /// Bare tag candidate, always produced as the guaranteed fallback.
    pub fn generate_tag_locator<'a>(
        &self,
        element: ElementRef<'a>,
        document: &'a Html,
    ) -> Result<LocatorStrategy> {
        query::ensure_attached(element, document)?;
        let tag = element.value().name();

        let check = query::by_tag(document, element, tag);
        let stability = patterns::tag_stability(tag);
        let confidence = scoring::compose(LocatorType::Tag, &check, stability, tag);
        Ok(scoring::finish_strategy(
            LocatorType::Tag,
            tag.to_string(),
            confidence,
            check.is_unique,
            stability >= LocatorType::Tag.stability_threshold(),
        ))
    }

    /// All attribute-family candidates, sorted descending by score; ties
    /// fall back to the id > name > class > tag hierarchy.
    pub fn generate_all_locators<'a>(
        &self,
        element: ElementRef<'a>,
        document: &'a Html,
    ) -> Result<Vec<LocatorStrategy>> {
        query::ensure_attached(element, document)?;

        let mut strategies = Vec::with_capacity(4);
        if let Some(s) = self.generate_id_locator(element, document)? {
            strategies.push(s);
        }
        if let Some(s) = self.generate_name_locator(element, document)? {
            strategies.push(s);
        }
        if let Some(s) = self.generate_class_locator(element, document)? {
            strategies.push(s);
        }
        strategies.push(self.generate_tag_locator(element, document)?);

        strategies.sort_by(|a, b| {
            b.confidence
                .score
                .cmp(&a.confidence.score)
                .then_with(|| {
                    a.locator_type
                        .reliability_rank()
                        .cmp(&b.locator_type.reliability_rank())
                })
        });
        Ok(strategies)
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
    fn unique_id_produces_high_confidence_candidate() {
        let document = doc(r#"<button id="submit-btn">Submit</button>"#);
        let element = first(&document, "button");
        let strategy = AttributeGenerator::new()
            .generate_id_locator(element, &document)
            .unwrap()
            .unwrap();
        assert_eq!(strategy.selector, "#submit-btn");
        assert!(strategy.is_unique);
        assert!(strategy.is_stable);
        assert!(strategy.confidence.score > 85);
    }

    #[test]
    fn blank_id_yields_no_candidate() {
        let document = doc(r#"<button id="  ">Submit</button>"#);
        let element = first(&document, "button");
        let strategy = AttributeGenerator::new()
            .generate_id_locator(element, &document)
            .unwrap();
        assert!(strategy.is_none());
    }

    #[test]
    fn best_class_token_prefers_unique_over_stable() {
        let document = doc(
            r#"<div class="card mt-4"></div><div class="card highlight"></div>"#,
        );
        let element = first(&document, ".mt-4");
        let strategy = AttributeGenerator::new()
            .generate_class_locator(element, &document)
            .unwrap()
            .unwrap();
        // "card" is more stable but matches both divs; the utility token is
        // the only unique one.
        assert_eq!(strategy.selector, ".mt-4");
        assert!(strategy.is_unique);
    }

    #[test]
    fn auto_generated_class_is_flagged() {
        let document = doc(r#"<div class="css-1a2b3c4d"></div>"#);
        let element = first(&document, "div");
        let strategy = AttributeGenerator::new()
            .generate_class_locator(element, &document)
            .unwrap()
            .unwrap();
        assert!(!strategy.is_stable);
        assert!(strategy
            .confidence
            .warnings
            .iter()
            .any(|w| w == "Class appears to be auto-generated and may change"));
    }

    #[test]
    fn name_candidate_only_on_form_tags() {
        let document = doc(r#"<div name="x"></div><input name="email">"#);
        let generator = AttributeGenerator::new();

        let div = first(&document, "div");
        assert!(generator
            .generate_name_locator(div, &document)
            .unwrap()
            .is_none());

        let input = first(&document, "input");
        let strategy = generator
            .generate_name_locator(input, &document)
            .unwrap()
            .unwrap();
        assert_eq!(strategy.selector, r#"[name="email"]"#);
        assert!(strategy.is_unique);
    }

    #[test]
    fn tag_candidate_is_always_produced() {
        let document = doc("<span>a</span><span>b</span>");
        let element = first(&document, "span");
        let strategy = AttributeGenerator::new()
            .generate_tag_locator(element, &document)
            .unwrap();
        assert_eq!(strategy.selector, "span");
        assert!(!strategy.is_unique);
        assert!(!strategy.is_stable);
    }

    #[test]
    fn all_locators_sorted_non_increasing() {
        let document =
            doc(r#"<form><input id="email-field" name="email" class="form-input"></form>"#);
        let element = first(&document, "input");
        let strategies = AttributeGenerator::new()
            .generate_all_locators(element, &document)
            .unwrap();
        assert!(strategies.len() >= 3);
        for pair in strategies.windows(2) {
            assert!(pair[0].confidence.score >= pair[1].confidence.score);
        }
    }

    #[test]
    fn generation_is_idempotent() {
        let document = doc(r#"<button id="save" class="btn primary">Save</button>"#);
        let element = first(&document, "button");
        let generator = AttributeGenerator::new();
        let a = generator.generate_all_locators(element, &document).unwrap();
        let b = generator.generate_all_locators(element, &document).unwrap();
        assert_eq!(a, b);
    }
}
