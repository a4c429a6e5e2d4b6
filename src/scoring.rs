//! Type-agnostic confidence scoring.
//!
//! Generators produce a first-pass score while they work; this module is the
//! authoritative implementation of the same algorithm, so candidates from
//! different generators stay comparable. Weights: uniqueness 40, stability
//! 35, type reliability 15, pattern bonus/penalty 10. The weights are
//! calibrated constants; keep them bit-for-bit.

use crate::dom::query::{self, UniquenessCheck};
use crate::dom::xpath;
use crate::errors::Result;
use crate::patterns;
use crate::strategy::{ConfidenceFactor, ConfidenceScore, Impact, LocatorStrategy, LocatorType};
use scraper::{ElementRef, Html};
use std::cmp::Ordering;
use tracing::trace;

pub const EMPTY_SELECTOR_WARNING: &str = "Empty selector provided";

pub const POSITION_WARNING: &str =
    "Selector depends on element position and may break when the layout changes";

const UNIQUENESS_POINTS: i32 = 40;
const STABILITY_POINTS: i32 = 35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    SemanticNaming,
    AccessibilityFriendly,
    AutoGenerated,
    Positional,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectedPattern {
    pub kind: PatternKind,
    pub description: String,
}

/// Canonical stability estimate for a locator value, per type.
pub fn assess_stability(locator_type: LocatorType, value: &str) -> u8 {
    match locator_type {
        LocatorType::Id | LocatorType::Name => patterns::attribute_value_stability(value),
        LocatorType::Class => patterns::class_token_stability(value),
        LocatorType::Tag => patterns::tag_stability(value),
        LocatorType::Css => patterns::css_selector_stability(value),
        LocatorType::XPath => patterns::xpath_stability(value),
        LocatorType::Aria => match split_attribute_selector(value) {
            Some((name, attr_value)) => patterns::aria_attribute_stability(&name, &attr_value),
            None => 60,
        },
    }
}

/// Canonical pattern classification for a locator value, per type.
pub fn detect_patterns(locator_type: LocatorType, value: &str) -> Vec<DetectedPattern> {
    let mut found = Vec::new();

    let auto_generated = match locator_type {
        LocatorType::Id | LocatorType::Name | LocatorType::Tag => {
            patterns::is_auto_generated_value(value)
        }
        LocatorType::Class => patterns::is_auto_generated_class(value),
        LocatorType::Css | LocatorType::XPath => {
            patterns::selector_has_auto_generated_token(value)
        }
        LocatorType::Aria => false,
    };
    if auto_generated {
        found.push(DetectedPattern {
            kind: PatternKind::AutoGenerated,
            description: auto_generated_warning(locator_type).to_string(),
        });
    }

    if patterns::is_positional_selector(value) {
        found.push(DetectedPattern {
            kind: PatternKind::Positional,
            description: POSITION_WARNING.to_string(),
        });
    }

    let bare = value.trim_start_matches(['#', '.']);
    if !auto_generated && patterns::is_semantic_value(bare) {
        found.push(DetectedPattern {
            kind: PatternKind::SemanticNaming,
            description: "Value uses semantic, human-chosen naming".to_string(),
        });
    }

    if locator_type == LocatorType::Aria
        || value.contains("aria-")
        || value.contains("[role=")
        || value.contains("@role")
    {
        found.push(DetectedPattern {
            kind: PatternKind::AccessibilityFriendly,
            description: "Selector is anchored to accessibility semantics".to_string(),
        });
    }

    found
}

pub fn auto_generated_warning(locator_type: LocatorType) -> &'static str {
    match locator_type {
        LocatorType::Id => "ID appears to be auto-generated and may change",
        LocatorType::Name => "Name appears to be auto-generated and may change",
        LocatorType::Class => "Class appears to be auto-generated and may change",
        LocatorType::Css => "Contains auto-generated class names that may change",
        LocatorType::XPath => "Contains auto-generated values that may change",
        LocatorType::Tag | LocatorType::Aria => {
            "Value appears to be auto-generated and may change"
        }
    }
}

/// Re-assess any candidate against the live document and produce the
/// canonical score. `value` is the raw locator value (attribute value, class
/// token, tag name); for css/xpath/aria candidates pass the selector itself.
pub fn calculate_confidence(
    locator_type: LocatorType,
    selector: &str,
    value: &str,
    element: ElementRef<'_>,
    document: &Html,
) -> Result<ConfidenceScore> {
    query::ensure_attached(element, document)?;

    if selector.trim().is_empty() {
        return Ok(ConfidenceScore {
            score: 0,
            factors: Vec::new(),
            warnings: vec![EMPTY_SELECTOR_WARNING.to_string()],
        });
    }

    let check = verify_uniqueness(locator_type, selector, value, element, document);
    let stability = assess_stability(locator_type, value);
    Ok(compose(locator_type, &check, stability, value))
}

/// Uniqueness probe matching the lookup the original selector would use.
pub fn verify_uniqueness<'a>(
    locator_type: LocatorType,
    selector: &str,
    value: &str,
    element: ElementRef<'a>,
    document: &'a Html,
) -> UniquenessCheck {
    let check = match locator_type {
        LocatorType::Id => query::by_id(document, element, value),
        LocatorType::Class => query::by_class_token(document, element, value),
        LocatorType::Name => query::by_name(document, element, value),
        LocatorType::Tag => query::by_tag(document, element, value),
        LocatorType::Css | LocatorType::Aria => {
            query::by_css_selector(document, element, selector)
        }
        LocatorType::XPath => xpath::check_unique(document, element, selector),
    };
    trace!(
        locator_type = %locator_type,
        selector,
        is_unique = check.is_unique,
        match_count = check.match_count,
        "uniqueness probe"
    );
    check
}

/// Fold uniqueness, stability, type reliability and detected patterns into
/// one score. Shared by the public entry point and the generators, which
/// pass the probe they already ran.
pub(crate) fn compose(
    locator_type: LocatorType,
    check: &UniquenessCheck,
    stability: u8,
    value: &str,
) -> ConfidenceScore {
    let mut score: i32 = 0;
    let mut factors = Vec::new();
    let mut warnings = Vec::new();

    if check.is_unique {
        score += UNIQUENESS_POINTS;
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

    score += i32::from(stability) * STABILITY_POINTS / 100;
    let stable = stability >= locator_type.stability_threshold();
    let stability_factor = format!("Stability estimate {stability}/100 for this value");
    factors.push(if stable {
        ConfidenceFactor::positive("stability", 0.35, stability_factor)
    } else {
        ConfidenceFactor::negative("stability", 0.35, stability_factor)
    });

    score += i32::from(locator_type.reliability_points());
    factors.push(ConfidenceFactor::positive(
        "type-reliability",
        0.15,
        format!("{locator_type} locators rank {} of 7 in the reliability hierarchy",
            locator_type.reliability_rank() + 1),
    ));

    let mut pattern_points: i32 = 0;
    for pattern in detect_patterns(locator_type, value) {
        let (points, weight) = match pattern.kind {
            PatternKind::SemanticNaming => (6, 0.06),
            PatternKind::AccessibilityFriendly => (4, 0.04),
            PatternKind::AutoGenerated => (-8, 0.08),
            PatternKind::Positional => (-10, 0.10),
        };
        pattern_points += points;
        if points >= 0 {
            factors.push(ConfidenceFactor::positive(
                "pattern",
                weight,
                pattern.description,
            ));
        } else {
            factors.push(ConfidenceFactor::negative(
                "pattern",
                weight,
                pattern.description.clone(),
            ));
            warnings.push(pattern.description);
        }
    }
    score += pattern_points.clamp(-10, 10);

    ConfidenceScore {
        score: score.clamp(0, 100) as u8,
        factors,
        warnings,
    }
}

/// Re-score an existing candidate against the current document state. The
/// locator value is recovered from the selector, so candidates from any
/// generator can be re-ranked with the canonical weights.
pub fn rescore_strategy(
    strategy: &LocatorStrategy,
    element: ElementRef<'_>,
    document: &Html,
) -> Result<LocatorStrategy> {
    let value = extract_value(strategy.locator_type, &strategy.selector);
    let confidence = calculate_confidence(
        strategy.locator_type,
        &strategy.selector,
        &value,
        element,
        document,
    )?;
    let is_unique = confidence
        .factors
        .iter()
        .any(|f| f.factor == "uniqueness" && f.impact == Impact::Positive);
    let stability = assess_stability(strategy.locator_type, &value);
    Ok(finish_strategy(
        strategy.locator_type,
        strategy.selector.clone(),
        confidence,
        is_unique,
        stability >= strategy.locator_type.stability_threshold(),
    ))
}

/// Recover the raw locator value from a selector string.
fn extract_value(locator_type: LocatorType, selector: &str) -> String {
    match locator_type {
        LocatorType::Id => selector.trim_start_matches('#').to_string(),
        LocatorType::Class => selector.trim_start_matches('.').to_string(),
        LocatorType::Name => split_attribute_selector(selector)
            .map(|(_, value)| value)
            .unwrap_or_else(|| selector.to_string()),
        _ => selector.to_string(),
    }
}

/// Rank two candidates: type reliability first, then uniqueness, then score.
pub fn compare_strategies(a: &LocatorStrategy, b: &LocatorStrategy) -> Ordering {
    a.locator_type
        .reliability_rank()
        .cmp(&b.locator_type.reliability_rank())
        .then_with(|| b.is_unique.cmp(&a.is_unique))
        .then_with(|| b.confidence.score.cmp(&a.confidence.score))
}

/// Human-readable summary of a candidate's reliability.
pub fn generate_explanation(strategy: &LocatorStrategy) -> String {
    let tier = match strategy.confidence.score {
        80..=100 => "high reliability",
        60..=79 => "medium reliability",
        _ => "low reliability",
    };
    let uniqueness = if strategy.is_unique {
        "uniquely identifies the element"
    } else {
        "matches more than one element"
    };
    let stability = if strategy.is_stable {
        "the value is unlikely to change across routine markup edits"
    } else {
        "the value may change as the markup evolves"
    };

    let mut explanation = format!(
        "{} locator with {tier}: {uniqueness}, and {stability}.",
        strategy.locator_type
    );
    if !strategy.confidence.warnings.is_empty() {
        explanation.push_str(" Warnings: ");
        explanation.push_str(&strategy.confidence.warnings.join("; "));
        explanation.push('.');
    }
    if strategy.locator_type == LocatorType::Aria {
        explanation
            .push_str(" Anchored to accessibility semantics that assistive technology relies on.");
    }
    explanation
}

/// Assemble a finished candidate, deriving the explanation from its parts.
pub(crate) fn finish_strategy(
    locator_type: LocatorType,
    selector: String,
    confidence: ConfidenceScore,
    is_unique: bool,
    is_stable: bool,
) -> LocatorStrategy {
    let mut strategy = LocatorStrategy {
        locator_type,
        selector,
        confidence,
        explanation: String::new(),
        is_unique,
        is_stable,
    };
    strategy.explanation = generate_explanation(&strategy);
    strategy
}

fn split_attribute_selector(selector: &str) -> Option<(String, String)> {
    let inner = selector.strip_prefix('[')?.strip_suffix(']')?;
    let (name, value) = inner.split_once('=')?;
    let value = value.trim_matches(['"', '\'']);
    Some((name.trim().to_string(), value.to_string()))
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
    fn unique_semantic_id_scores_high() {
        let document = doc(r#"<button id="submit-btn">Submit</button>"#);
        let element = first(&document, "button");
        let confidence = calculate_confidence(
            LocatorType::Id,
            "#submit-btn",
            "submit-btn",
            element,
            &document,
        )
        .unwrap();
        assert!(confidence.score > 85, "got {}", confidence.score);
        assert!(confidence.warnings.is_empty());
    }

    #[test]
    fn auto_generated_id_is_penalized_and_warned() {
        let document = doc(r#"<div id="auto-123456"></div>"#);
        let element = first(&document, "div");
        let confidence = calculate_confidence(
            LocatorType::Id,
            "#auto-123456",
            "auto-123456",
            element,
            &document,
        )
        .unwrap();
        assert!(confidence.score < 90);
        assert!(confidence
            .warnings
            .iter()
            .any(|w| w.contains("auto-generated")));
    }

    #[test]
    fn empty_selector_scores_zero_with_warning() {
        let document = doc("<p>x</p>");
        let element = first(&document, "p");
        let confidence =
            calculate_confidence(LocatorType::Css, "  ", "", element, &document).unwrap();
        assert_eq!(confidence.score, 0);
        assert_eq!(confidence.warnings, vec![EMPTY_SELECTOR_WARNING.to_string()]);
    }

    #[test]
    fn detached_element_fails_fast() {
        let document = doc("<p>x</p>");
        let other = doc("<p>x</p>");
        let element = first(&other, "p");
        assert!(
            calculate_confidence(LocatorType::Tag, "p", "p", element, &document).is_err()
        );
    }

    #[test]
    fn every_factor_weight_is_a_budget_fraction() {
        let document = doc(r#"<button id="submit-btn">Submit</button>"#);
        let element = first(&document, "button");
        let confidence = calculate_confidence(
            LocatorType::Id,
            "#submit-btn",
            "submit-btn",
            element,
            &document,
        )
        .unwrap();
        assert!(!confidence.factors.is_empty());
        for factor in &confidence.factors {
            assert!(factor.weight > 0.0 && factor.weight <= 1.0);
        }
    }

    #[test]
    fn comparator_prefers_id_over_class_at_equal_uniqueness() {
        let id = finish_strategy(
            LocatorType::Id,
            "#save".into(),
            ConfidenceScore {
                score: 70,
                ..Default::default()
            },
            true,
            true,
        );
        let class = finish_strategy(
            LocatorType::Class,
            ".save".into(),
            ConfidenceScore {
                score: 74,
                ..Default::default()
            },
            true,
            true,
        );
        assert_eq!(compare_strategies(&id, &class), Ordering::Less);
        assert_eq!(compare_strategies(&class, &id), Ordering::Greater);
    }

    #[test]
    fn rescoring_recovers_value_and_reprobes_uniqueness() {
        let document = doc(r#"<button id="save">Save</button><button id="other">X</button>"#);
        let element = first(&document, "#save");
        let original = finish_strategy(
            LocatorType::Id,
            "#save".into(),
            ConfidenceScore::default(),
            false,
            false,
        );
        let rescored = rescore_strategy(&original, element, &document).unwrap();
        assert!(rescored.is_unique);
        assert!(rescored.is_stable);
        assert!(rescored.confidence.score > 85);
    }

    #[test]
    fn explanation_mentions_tier_and_warnings() {
        let strategy = finish_strategy(
            LocatorType::Aria,
            r#"[aria-label="Search"]"#.into(),
            ConfidenceScore {
                score: 85,
                factors: Vec::new(),
                warnings: vec!["something risky".into()],
            },
            true,
            true,
        );
        assert!(strategy.explanation.contains("high reliability"));
        assert!(strategy.explanation.contains("something risky"));
        assert!(strategy.explanation.contains("accessibility"));
    }
}
