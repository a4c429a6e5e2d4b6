//! ARIA attribute locator generation and accessibility snapshots.

use crate::dom::query::{self, UniquenessCheck};
use crate::errors::Result;
use crate::patterns::{self, TRANSIENT_ARIA_ATTRIBUTES};
use crate::scoring;
use crate::strategy::{ConfidenceFactor, ConfidenceScore, LocatorStrategy, LocatorType};
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub const MULTIPLE_ARIA_WARNING: &str = "Multiple elements found with same ARIA attributes";

pub const TRANSIENT_ARIA_WARNING: &str =
    "Attribute reflects transient interaction state and may change at any time";

/// Attributes preferred for the single-best candidate, highest first. The
/// order is product policy; keep it exactly.
const ARIA_PRIORITY: &[&str] = &["aria-label", "role", "aria-labelledby", "aria-describedby"];

/// Derived boolean accessibility states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AriaStates {
    pub required: bool,
    pub disabled: bool,
    pub expanded: bool,
    pub pressed: bool,
    pub selected: bool,
    pub hidden: bool,
}

/// Structured accessibility snapshot of one element, consumed by the
/// analysis/export collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AriaSnapshot {
    /// Lowercase tag name.
    pub element: String,
    /// Every `role`/`aria-*` attribute with a non-blank value.
    pub aria_attributes: BTreeMap<String, String>,
    pub accessible_name: Option<String>,
    pub accessible_description: Option<String>,
    /// Explicit `role` attribute, or the implicit role for the tag.
    pub role: String,
    pub states: AriaStates,
    /// Ancestor roles, outermost first, `generic` skipped.
    pub hierarchy: Vec<String>,
}

#[derive(Debug, Default)]
pub struct AriaGenerator;

impl AriaGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Every `role`/`aria-*` attribute with a non-blank value, priority
    /// attributes first, the rest alphabetical.
    pub fn collect_aria_attributes(&self, element: ElementRef<'_>) -> Vec<(String, String)> {
        let mut found: Vec<(String, String)> = element
            .value()
            .attrs()
            .filter(|(name, value)| {
                (*name == "role" || name.starts_with("aria-")) && !value.trim().is_empty()
            })
            .map(|(name, value)| (name.to_string(), value.trim().to_string()))
            .collect();
        found.sort_by_key(|(name, _)| attribute_priority(name));
        found
    }

    /// Single best candidate by the fixed priority order, or `None` when the
    /// element carries no ARIA attribute at all.
    pub fn generate_aria_locator<'a>(
        &self,
        element: ElementRef<'a>,
        document: &'a Html,
    ) -> Result<Option<LocatorStrategy>> {
        query::ensure_attached(element, document)?;
        let attributes = self.collect_aria_attributes(element);
        let Some((name, value)) = attributes.into_iter().next() else {
            return Ok(None);
        };
        Ok(Some(self.build_candidate(&name, &value, element, document)))
    }

    /// One candidate per present ARIA attribute, sorted descending by score.
    pub fn generate_all_aria_strategies<'a>(
        &self,
        element: ElementRef<'a>,
        document: &'a Html,
    ) -> Result<Vec<LocatorStrategy>> {
        query::ensure_attached(element, document)?;
        let mut strategies: Vec<LocatorStrategy> = self
            .collect_aria_attributes(element)
            .into_iter()
            .map(|(name, value)| self.build_candidate(&name, &value, element, document))
            .collect();
        strategies.sort_by(|a, b| b.confidence.score.cmp(&a.confidence.score));
        Ok(strategies)
    }

    fn build_candidate<'a>(
        &self,
        name: &str,
        value: &str,
        element: ElementRef<'a>,
        document: &'a Html,
    ) -> LocatorStrategy {
        let selector = format!("[{name}=\"{}\"]", value.replace('"', "\\\""));
        let check = query::by_css_selector(document, element, &selector);
        debug!(selector = %selector, unique = check.is_unique, "aria candidate");

        let stability = patterns::aria_attribute_stability(name, value);
        let confidence = compose_aria_confidence(name, &check);

        scoring::finish_strategy(
            LocatorType::Aria,
            selector,
            confidence,
            check.is_unique,
            stability >= LocatorType::Aria.stability_threshold(),
        )
    }

    /// Structured accessibility snapshot; independent of candidate
    /// generation and valid for elements with no ARIA attributes at all.
    pub fn build_snapshot<'a>(
        &self,
        element: ElementRef<'a>,
        document: &'a Html,
    ) -> Result<AriaSnapshot> {
        query::ensure_attached(element, document)?;

        let aria_attributes: BTreeMap<String, String> = self
            .collect_aria_attributes(element)
            .into_iter()
            .collect();

        Ok(AriaSnapshot {
            element: element.value().name().to_lowercase(),
            accessible_name: accessible_name(element, document),
            accessible_description: referenced_text(element, document, "aria-describedby"),
            role: resolved_role(element),
            states: derive_states(element),
            hierarchy: role_hierarchy(element),
            aria_attributes,
        })
    }
}

/// Base 50; +35 aria-label, +10 role, +5 other aria-*; +15 when unique,
/// -20 with a warning otherwise; -15 for transient state attributes. Probe
/// failures degrade to a warning without the uniqueness terms.
fn compose_aria_confidence(name: &str, check: &UniquenessCheck) -> ConfidenceScore {
    let mut score: i32 = 50;
    let mut factors = vec![ConfidenceFactor::positive(
        "type-base",
        0.50,
        "ARIA attributes describe intent and survive cosmetic changes",
    )];
    let mut warnings = Vec::new();

    let (attribute_points, attribute_description) = match name {
        "aria-label" => (35, "aria-label is the strongest accessibility anchor"),
        "role" => (10, "role describes the element's purpose"),
        _ => (5, "aria attribute adds accessibility context"),
    };
    score += attribute_points;
    factors.push(ConfidenceFactor::positive(
        "attribute-priority",
        attribute_points as f32 / 100.0,
        attribute_description,
    ));

    if check.is_probe_failure() {
        if let Some(warning) = &check.warning {
            warnings.push(warning.clone());
        }
    } else if check.is_unique {
        score += 15;
        factors.push(ConfidenceFactor::positive(
            "uniqueness",
            0.15,
            "Selector matches exactly one element in the document",
        ));
    } else {
        score -= 20;
        factors.push(ConfidenceFactor::negative(
            "uniqueness",
            0.20,
            "Several elements share these ARIA attributes",
        ));
        warnings.push(MULTIPLE_ARIA_WARNING.to_string());
    }

    if TRANSIENT_ARIA_ATTRIBUTES.contains(&name) {
        score -= 15;
        factors.push(ConfidenceFactor::negative(
            "transient-state",
            0.15,
            TRANSIENT_ARIA_WARNING,
        ));
        warnings.push(TRANSIENT_ARIA_WARNING.to_string());
    }

    ConfidenceScore {
        score: score.clamp(0, 100) as u8,
        factors,
        warnings,
    }
}

fn attribute_priority(name: &str) -> (usize, String) {
    let rank = ARIA_PRIORITY
        .iter()
        .position(|p| *p == name)
        .unwrap_or(ARIA_PRIORITY.len());
    (rank, name.to_string())
}

/// aria-label, then aria-labelledby references, then `<label for>`, then the
/// element's own text.
fn accessible_name(element: ElementRef<'_>, document: &Html) -> Option<String> {
    if let Some(label) = non_blank(element.value().attr("aria-label")) {
        return Some(label.to_string());
    }
    if let Some(text) = referenced_text(element, document, "aria-labelledby") {
        return Some(text);
    }
    if let Some(id) = non_blank(element.value().attr("id")) {
        let label_text: String = query::all_elements(document)
            .filter(|e| e.value().name() == "label" && e.value().attr("for") == Some(id))
            .flat_map(|e| e.text())
            .collect();
        let label_text = label_text.trim();
        if !label_text.is_empty() {
            return Some(collapse_whitespace(label_text));
        }
    }
    let own: String = element.text().collect();
    let own = own.trim();
    (!own.is_empty()).then(|| collapse_whitespace(own))
}

/// Joined text of the elements an id-reference attribute points at.
fn referenced_text(element: ElementRef<'_>, document: &Html, attribute: &str) -> Option<String> {
    let ids = non_blank(element.value().attr(attribute))?;
    let mut parts = Vec::new();
    for id in ids.split_whitespace() {
        let text: String = query::all_elements(document)
            .filter(|e| e.value().attr("id") == Some(id))
            .flat_map(|e| e.text())
            .collect();
        let text = text.trim().to_string();
        if !text.is_empty() {
            parts.push(collapse_whitespace(&text));
        }
    }
    (!parts.is_empty()).then(|| parts.join(" "))
}

/// Explicit `role` attribute, else the implicit role for the tag.
fn resolved_role(element: ElementRef<'_>) -> String {
    if let Some(role) = non_blank(element.value().attr("role")) {
        return role.to_string();
    }
    implicit_role(element).to_string()
}

fn implicit_role(element: ElementRef<'_>) -> &'static str {
    let value = element.value();
    match value.name() {
        "a" => {
            if value.attr("href").is_some() {
                "link"
            } else {
                "generic"
            }
        }
        "button" => "button",
        "nav" => "navigation",
        "main" => "main",
        "header" => "banner",
        "footer" => "contentinfo",
        "aside" => "complementary",
        "form" => "form",
        "section" => "region",
        "article" => "article",
        "select" => "combobox",
        "textarea" => "textbox",
        "img" => "img",
        "ul" | "ol" => "list",
        "li" => "listitem",
        "table" => "table",
        "dialog" => "dialog",
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
        "input" => match value.attr("type").unwrap_or("text") {
            "checkbox" => "checkbox",
            "radio" => "radio",
            "button" | "submit" | "reset" => "button",
            "search" => "searchbox",
            "range" => "slider",
            "number" => "spinbutton",
            "hidden" => "generic",
            _ => "textbox",
        },
        _ => "generic",
    }
}

fn derive_states(element: ElementRef<'_>) -> AriaStates {
    let value = element.value();
    let aria_true = |name: &str| value.attr(name) == Some("true");
    AriaStates {
        required: aria_true("aria-required") || value.attr("required").is_some(),
        disabled: aria_true("aria-disabled") || value.attr("disabled").is_some(),
        expanded: aria_true("aria-expanded"),
        pressed: aria_true("aria-pressed"),
        selected: aria_true("aria-selected") || value.attr("selected").is_some(),
        hidden: aria_true("aria-hidden") || value.attr("hidden").is_some(),
    }
}

/// Ancestor roles from the outermost in, skipping `generic`.
fn role_hierarchy(element: ElementRef<'_>) -> Vec<String> {
    let mut roles: Vec<String> = std::iter::successors(
        element.parent().and_then(ElementRef::wrap),
        |current| current.parent().and_then(ElementRef::wrap),
    )
    .map(resolved_role)
    .filter(|role| role != "generic")
    .collect();
    roles.reverse();
    roles
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
