//! Shared pattern classification and stability scoring.
//!
//! Every generator and the confidence engine consult this one table; the
//! regexes and stability buckets are never duplicated per module.

use regex::Regex;
use std::sync::LazyLock;

/// Attribute values that look machine-generated: throwaway prefixes, long
/// digit runs, UUID fragments.
static AUTO_GENERATED_VALUE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"^(auto|gen|temp|tmp)-?\d+").unwrap(),
        Regex::new(r"\d{6,}").unwrap(),
        Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap(),
    ]
});

/// Class tokens emitted by CSS-in-JS tooling or bundler hashing.
static AUTO_GENERATED_CLASS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"^css-[a-z0-9]+$").unwrap(),
        Regex::new(r"^sc-[a-zA-Z0-9]+$").unwrap(),
        Regex::new(r"^jss\d+").unwrap(),
        Regex::new(r"^makeStyles-").unwrap(),
        Regex::new(r"^_[a-zA-Z0-9]{5,}$").unwrap(),
        Regex::new(r"\d[a-z]\d[a-z0-9]*$").unwrap(),
    ]
});

/// Spacing/sizing/layout utility tokens (`mt-4`, `d-none`, `text-center`).
static UTILITY_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^-?(?:[mp][trblxy]?|w|h|gap|space|text|bg|border|rounded|shadow|flex|grid|col|row|order|z|top|right|bottom|left|inset|opacity|font|leading|tracking|d|justify|items|align|self)-[a-z0-9.-]+$",
    )
    .unwrap()
});

/// `block__element--modifier` shape. A token only counts as BEM when it
/// actually carries an element or modifier separator.
static BEM_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-z][a-z0-9]*(?:-[a-z0-9]+)*(?:__[a-z][a-z0-9]*(?:-[a-z0-9]+)*)?(?:--[a-z][a-z0-9]*(?:-[a-z0-9]+)*)?$",
    )
    .unwrap()
});

/// Dash-separated lowercase words (`submit-btn`, `main-navigation`).
static SEMANTIC_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9]*(?:-[a-z0-9]+)*$").unwrap());

/// Class tokens referenced inside a compound CSS selector.
static CSS_CLASS_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.([A-Za-z0-9_-]+)").unwrap());

/// Positional index predicate in an XPath expression (`button[2]`).
static XPATH_POSITIONAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\d+\]").unwrap());

/// Class tokens referenced by `contains(@class, "...")` terms.
static XPATH_CLASS_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"contains\(@class,\s*["']([^"']+)["']\)"#).unwrap());

/// ARIA state attributes that flip during normal interaction and make poor
/// locator anchors.
pub const TRANSIENT_ARIA_ATTRIBUTES: &[&str] = &["aria-hidden", "aria-expanded", "aria-pressed"];

pub fn is_auto_generated_value(value: &str) -> bool {
    AUTO_GENERATED_VALUE.iter().any(|p| p.is_match(value))
}

pub fn is_auto_generated_class(token: &str) -> bool {
    is_auto_generated_value(token) || AUTO_GENERATED_CLASS.iter().any(|p| p.is_match(token))
}

pub fn is_utility_class(token: &str) -> bool {
    UTILITY_CLASS.is_match(token)
}

pub fn is_bem_class(token: &str) -> bool {
    (token.contains("__") || token.contains("--")) && BEM_CLASS.is_match(token)
}

pub fn is_semantic_value(value: &str) -> bool {
    SEMANTIC_VALUE.is_match(value)
}

/// Stability of an id or name attribute value.
pub fn attribute_value_stability(value: &str) -> u8 {
    if AUTO_GENERATED_VALUE[0].is_match(value) {
        25
    } else if is_auto_generated_value(value) {
        30
    } else if is_semantic_value(value) {
        95
    } else {
        70
    }
}

/// Stability of a single class token.
pub fn class_token_stability(token: &str) -> u8 {
    if is_auto_generated_class(token) {
        25
    } else if is_utility_class(token) {
        65
    } else if is_bem_class(token) {
        80
    } else if is_semantic_value(token) {
        85
    } else {
        60
    }
}

/// Stability of a bare tag-name locator, bucketed by a fixed tag taxonomy.
pub fn tag_stability(tag: &str) -> u8 {
    match tag {
        "main" | "nav" | "header" | "footer" | "aside" | "section" | "article" | "form"
        | "dialog" => 70,
        "button" | "input" | "select" | "textarea" | "label" | "fieldset" | "legend"
        | "summary" | "details" => 60,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "table" | "thead" | "tbody" | "tr" | "td"
        | "th" | "ul" | "ol" | "li" | "img" | "figure" | "figcaption" => 45,
        "div" | "span" | "p" | "a" => 30,
        _ => 40,
    }
}

/// Stability of an ARIA attribute as a locator anchor.
pub fn aria_attribute_stability(name: &str, value: &str) -> u8 {
    if TRANSIENT_ARIA_ATTRIBUTES.contains(&name) {
        return 30;
    }
    match name {
        "aria-label" => 85,
        "role" => 80,
        // id-reference attributes are only as stable as the ids they point at
        "aria-labelledby" | "aria-describedby" | "aria-controls" | "aria-owns" => {
            attribute_value_stability(value).min(70)
        }
        _ => 60,
    }
}

/// Shape-based stability of a full CSS selector.
pub fn css_selector_stability(selector: &str) -> u8 {
    if selector.contains(":nth-child") || selector.contains(":nth-of-type") {
        return 25;
    }
    if selector.contains('#') {
        return 95;
    }

    let tokens: Vec<&str> = CSS_CLASS_TOKEN
        .captures_iter(selector)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    if tokens.is_empty() {
        let base = selector
            .split(&['[', ' ', '>'][..])
            .next()
            .unwrap_or(selector)
            .trim();
        if selector.contains('[') {
            return 75;
        }
        return tag_stability(base);
    }

    if tokens.iter().any(|t| is_auto_generated_class(t)) {
        return 35;
    }

    let sum: u32 = tokens.iter().map(|t| u32::from(class_token_stability(t))).sum();
    let avg = (sum / tokens.len() as u32) as u8;
    avg.clamp(60, 90)
}

/// Shape-based stability of an XPath expression.
pub fn xpath_stability(expr: &str) -> u8 {
    if XPATH_POSITIONAL.is_match(expr) {
        return 35;
    }
    if expr.contains("[@id=") {
        95
    } else if expr.contains("contains(@class") {
        65
    } else if expr.contains("[@") {
        75
    } else if expr.contains("text()=") {
        55
    } else {
        15
    }
}

/// Whether a compound CSS or XPath selector references any machine-looking
/// class token or value.
pub fn selector_has_auto_generated_token(selector: &str) -> bool {
    if is_auto_generated_value(selector) {
        return true;
    }
    CSS_CLASS_TOKEN
        .captures_iter(selector)
        .chain(XPATH_CLASS_TOKEN.captures_iter(selector))
        .any(|c| c.get(1).is_some_and(|m| is_auto_generated_class(m.as_str())))
}

pub fn is_positional_selector(selector: &str) -> bool {
    selector.contains(":nth-child")
        || selector.contains(":nth-of-type")
        || XPATH_POSITIONAL.is_match(selector)
}
