use crate::errors::{LocatorError, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

pub const DOM_QUERY_WARNING: &str = "Unable to validate uniqueness due to DOM query error";

/// Outcome of a uniqueness probe against the live document.
///
/// Returned by value so that probe failures never leak through shared state;
/// a failed probe degrades to `is_unique = false` plus a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniquenessCheck {
    pub is_unique: bool,
    pub match_count: usize,
    pub warning: Option<String>,
}

impl UniquenessCheck {
    fn unique() -> Self {
        Self {
            is_unique: true,
            match_count: 1,
            warning: None,
        }
    }

    fn ambiguous(match_count: usize) -> Self {
        Self {
            is_unique: false,
            match_count,
            warning: Some(format!(
                "Selector matches {match_count} elements in the document"
            )),
        }
    }

    fn missed(match_count: usize) -> Self {
        Self {
            is_unique: false,
            match_count,
            warning: Some("Selector did not match the inspected element".to_string()),
        }
    }

    pub(crate) fn failed(warning: impl Into<String>) -> Self {
        Self {
            is_unique: false,
            match_count: 0,
            warning: Some(warning.into()),
        }
    }

    /// The probe itself failed (parse or evaluation error), as opposed to a
    /// probe that ran and found the selector ambiguous.
    pub fn is_probe_failure(&self) -> bool {
        self.warning.as_deref() == Some(DOM_QUERY_WARNING)
    }
}

/// Verify the element actually belongs to the document it was passed with.
/// A detached element is a caller contract violation, not a degradable
/// condition.
pub fn ensure_attached(element: ElementRef<'_>, document: &Html) -> Result<()> {
    let attached = document
        .tree
        .get(element.id())
        .is_some_and(|node| node == *element);
    if attached {
        Ok(())
    } else {
        Err(LocatorError::DetachedElement)
    }
}

/// Every element in the document, in document order.
pub fn all_elements(document: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    document.tree.nodes().filter_map(ElementRef::wrap)
}

pub fn has_class_token(element: ElementRef<'_>, token: &str) -> bool {
    element
        .value()
        .attr("class")
        .map(|c| c.split_whitespace().any(|t| t == token))
        .unwrap_or(false)
}

/// `getElementById` analogue: exactly one element carries the id and it is
/// the inspected one.
pub fn by_id<'a>(document: &'a Html, target: ElementRef<'a>, id: &str) -> UniquenessCheck {
    check_matches(
        target,
        all_elements(document).filter(|e| e.value().attr("id") == Some(id)),
    )
}

/// `getElementsByClassName` analogue for a single class token.
pub fn by_class_token<'a>(
    document: &'a Html,
    target: ElementRef<'a>,
    token: &str,
) -> UniquenessCheck {
    check_matches(
        target,
        all_elements(document).filter(|e| has_class_token(*e, token)),
    )
}

/// `getElementsByName` analogue.
pub fn by_name<'a>(document: &'a Html, target: ElementRef<'a>, name: &str) -> UniquenessCheck {
    check_matches(
        target,
        all_elements(document).filter(|e| e.value().attr("name") == Some(name)),
    )
}

/// `getElementsByTagName` analogue.
pub fn by_tag<'a>(document: &'a Html, target: ElementRef<'a>, tag: &str) -> UniquenessCheck {
    check_matches(
        target,
        all_elements(document).filter(|e| e.value().name() == tag),
    )
}

/// `querySelectorAll` analogue for a full CSS selector string. A selector
/// the engine cannot parse degrades to a failed check, mirroring a thrown
/// DOM exception.
pub fn by_css_selector<'a>(
    document: &'a Html,
    target: ElementRef<'a>,
    selector: &str,
) -> UniquenessCheck {
    match Selector::parse(selector) {
        Ok(parsed) => check_matches(target, document.select(&parsed)),
        Err(err) => {
            debug!(selector, error = ?err, "CSS selector rejected by parser");
            UniquenessCheck::failed(DOM_QUERY_WARNING)
        }
    }
}

pub(crate) fn check_matches<'a>(
    target: ElementRef<'a>,
    matches: impl Iterator<Item = ElementRef<'a>>,
) -> UniquenessCheck {
    let mut count = 0usize;
    let mut contains_target = false;
    for matched in matches {
        count += 1;
        if matched.id() == target.id() {
            contains_target = true;
        }
    }
    match (count, contains_target) {
        (1, true) => UniquenessCheck::unique(),
        (_, false) => UniquenessCheck::missed(count),
        (n, true) => UniquenessCheck::ambiguous(n),
    }
}
