//! Evaluation of the XPath dialect the locator generators emit.
//!
//! The supported grammar is exactly the fallback-chain output:
//! `//tag[@attr="v"]`, `//tag[contains(@class, "a") and contains(@class, "b")]`,
//! `//tag[text()="v"]`, `//parent[pred]/tag[N]` and bare `//tag`. Anything
//! outside it is rejected, which callers treat the same way as a DOM
//! `evaluate` call throwing.

use crate::dom::query::{check_matches, UniquenessCheck, DOM_QUERY_WARNING};
use crate::errors::{LocatorError, Result};
use scraper::{ElementRef, Html};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPathExpr {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// `None` matches any element (`*`).
    pub tag: Option<String>,
    pub predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Attribute { name: String, value: String },
    /// `contains(@class, "...")` terms joined by `and`; substring semantics,
    /// exactly like the browser evaluator.
    ClassContains(Vec<String>),
    Text(String),
    /// 1-based index among the siblings selected by the step.
    Position(usize),
}

pub fn parse(expr: &str) -> Result<XPathExpr> {
    let rest = expr
        .strip_prefix("//")
        .ok_or_else(|| unsupported(expr, "expression must start with //"))?;
    if rest.is_empty() {
        return Err(unsupported(expr, "missing step"));
    }

    let mut steps = Vec::new();
    for segment in split_top_level(rest, '/') {
        if segment.is_empty() {
            return Err(unsupported(expr, "empty step"));
        }
        steps.push(parse_step(expr, &segment)?);
    }
    Ok(XPathExpr { steps })
}

/// Evaluate against the document, returning matches as an ordered snapshot.
pub fn evaluate<'a>(document: &'a Html, expr: &XPathExpr) -> Vec<ElementRef<'a>> {
    let mut current: Vec<ElementRef<'a>> = Vec::new();

    // Leading descendant axis: apply the first step to the children of every
    // node so positional predicates stay relative to each parent.
    if let Some(first) = expr.steps.first() {
        for node in document.tree.nodes() {
            let children: Vec<ElementRef<'a>> =
                node.children().filter_map(ElementRef::wrap).collect();
            current.extend(apply_step(&children, first));
        }
    }

    // Remaining steps use the child axis.
    for step in expr.steps.iter().skip(1) {
        let mut next = Vec::new();
        for context in &current {
            let children: Vec<ElementRef<'a>> =
                context.children().filter_map(ElementRef::wrap).collect();
            next.extend(apply_step(&children, step));
        }
        current = next;
    }

    current
}

/// Parse and evaluate in one call.
pub fn evaluate_expression<'a>(document: &'a Html, expr: &str) -> Result<Vec<ElementRef<'a>>> {
    let parsed = parse(expr)?;
    Ok(evaluate(document, &parsed))
}

/// Ordered-snapshot uniqueness probe: exactly one match, identical to the
/// target. Grammar rejections degrade like a thrown evaluation.
pub fn check_unique<'a>(document: &'a Html, target: ElementRef<'a>, expr: &str) -> UniquenessCheck {
    match parse(expr) {
        Ok(parsed) => check_matches(target, evaluate(document, &parsed).into_iter()),
        Err(err) => {
            debug!(expr, error = %err, "XPath expression rejected");
            UniquenessCheck::failed(DOM_QUERY_WARNING)
        }
    }
}

fn apply_step<'a>(children: &[ElementRef<'a>], step: &Step) -> Vec<ElementRef<'a>> {
    let mut matched: Vec<ElementRef<'a>> = children
        .iter()
        .copied()
        .filter(|e| {
            step.tag
                .as_deref()
                .map_or(true, |tag| e.value().name() == tag)
        })
        .filter(|e| {
            step.predicates
                .iter()
                .all(|p| predicate_holds(*e, p))
        })
        .collect();

    if let Some(position) = step.predicates.iter().find_map(|p| match p {
        Predicate::Position(n) => Some(*n),
        _ => None,
    }) {
        matched = match matched.get(position - 1) {
            Some(e) => vec![*e],
            None => Vec::new(),
        };
    }
    matched
}

fn predicate_holds(element: ElementRef<'_>, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Attribute { name, value } => element.value().attr(name) == Some(value.as_str()),
        Predicate::ClassContains(tokens) => {
            let class = element.value().attr("class").unwrap_or("");
            tokens.iter().all(|t| class.contains(t.as_str()))
        }
        Predicate::Text(value) => {
            let text: String = element.text().collect();
            text.trim() == value
        }
        // applied after the sibling set is known
        Predicate::Position(_) => true,
    }
}

fn parse_step(expr: &str, segment: &str) -> Result<Step> {
    let (name_part, preds_part) = match segment.find('[') {
        Some(idx) => (&segment[..idx], &segment[idx..]),
        None => (segment, ""),
    };

    let tag = if name_part == "*" {
        None
    } else if !name_part.is_empty()
        && name_part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Some(name_part.to_string())
    } else {
        return Err(unsupported(expr, "invalid step name"));
    };

    let mut predicates = Vec::new();
    for body in predicate_bodies(expr, preds_part)? {
        predicates.push(parse_predicate(expr, &body)?);
    }
    Ok(Step { tag, predicates })
}

fn parse_predicate(expr: &str, body: &str) -> Result<Predicate> {
    let body = body.trim();

    if !body.is_empty() && body.chars().all(|c| c.is_ascii_digit()) {
        let position: usize = body
            .parse()
            .map_err(|_| unsupported(expr, "invalid position"))?;
        if position == 0 {
            return Err(unsupported(expr, "positions are 1-based"));
        }
        return Ok(Predicate::Position(position));
    }

    if let Some(rest) = body.strip_prefix('@') {
        let eq = rest
            .find('=')
            .ok_or_else(|| unsupported(expr, "attribute predicate without comparison"))?;
        let name = rest[..eq].trim().to_string();
        let value = parse_quoted(expr, rest[eq + 1..].trim())?;
        return Ok(Predicate::Attribute { name, value });
    }

    if let Some(rest) = body.strip_prefix("text()=") {
        return Ok(Predicate::Text(parse_quoted(expr, rest.trim())?));
    }

    if body.starts_with("contains(@class") {
        let mut tokens = Vec::new();
        for term in body.split(" and ") {
            let term = term.trim();
            let inner = term
                .strip_prefix("contains(@class,")
                .and_then(|t| t.trim_end().strip_suffix(')'))
                .ok_or_else(|| unsupported(expr, "malformed contains(@class, ...)"))?;
            tokens.push(parse_quoted(expr, inner.trim())?);
        }
        return Ok(Predicate::ClassContains(tokens));
    }

    Err(unsupported(expr, "unsupported predicate"))
}

fn parse_quoted(expr: &str, raw: &str) -> Result<String> {
    let bytes = raw.as_bytes();
    if raw.len() >= 2 {
        let quote = bytes[0];
        if (quote == b'"' || quote == b'\'') && bytes[raw.len() - 1] == quote {
            let inner = &raw[1..raw.len() - 1];
            if !inner.contains(quote as char) {
                return Ok(inner.to_string());
            }
        }
    }
    Err(unsupported(expr, "expected quoted literal"))
}

/// Split predicate text into bracketed bodies, honouring quoted literals.
fn predicate_bodies(expr: &str, preds: &str) -> Result<Vec<String>> {
    let mut bodies = Vec::new();
    let mut chars = preds.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '[' {
            return Err(unsupported(expr, "unexpected text between predicates"));
        }
        let mut body = String::new();
        let mut quote: Option<char> = None;
        let mut closed = false;
        for c in chars.by_ref() {
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => {}
                None if c == '"' || c == '\'' => quote = Some(c),
                None if c == ']' => {
                    closed = true;
                    break;
                }
                None => {}
            }
            body.push(c);
        }
        if !closed {
            return Err(unsupported(expr, "unterminated predicate"));
        }
        bodies.push(body);
    }
    Ok(bodies)
}

/// Split on a separator outside brackets and quoted literals.
fn split_top_level(input: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for c in input.chars() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
                current.push(c);
                continue;
            }
            None => {}
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                current.push(c);
            }
            '[' => {
                depth += 1;
                current.push(c);
            }
            ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            c if c == separator && depth == 0 => {
                parts.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    parts.push(current);
    parts
}

fn unsupported(expr: &str, detail: &str) -> LocatorError {
    LocatorError::XPathEval(format!("{detail}: {expr}"))
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
    fn id_attribute_expression_matches() {
        let document = doc(r#"<button id="save">Save</button>"#);
        let matches = evaluate_expression(&document, r#"//button[@id="save"]"#).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].value().name(), "button");
    }

    #[test]
    fn class_contains_chain_matches() {
        let document = doc(r#"<div class="card wide"></div><div class="card"></div>"#);
        let matches = evaluate_expression(
            &document,
            r#"//div[contains(@class, "card") and contains(@class, "wide")]"#,
        )
        .unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn text_predicate_compares_trimmed_content() {
        let document = doc("<button> Save </button><button>Cancel</button>");
        let matches = evaluate_expression(&document, r#"//button[text()="Save"]"#).unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn positional_child_step_selects_nth_sibling() {
        let document = doc(
            r#"<div class="container"><button>One</button><button>Two</button></div>"#,
        );
        let matches = evaluate_expression(
            &document,
            r#"//div[contains(@class, "container")]/button[2]"#,
        )
        .unwrap();
        assert_eq!(matches.len(), 1);
        let text: String = matches[0].text().collect();
        assert_eq!(text, "Two");
    }

    #[test]
    fn bare_tag_expression_matches_all() {
        let document = doc("<p>a</p><p>b</p>");
        let matches = evaluate_expression(&document, "//p").unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn unsupported_syntax_is_rejected() {
        let document = doc("<p>a</p>");
        assert!(evaluate_expression(&document, "/html/body/p").is_err());
        assert!(evaluate_expression(&document, "//p[last()]").is_err());
    }

    #[test]
    fn rejected_expression_degrades_in_uniqueness_probe() {
        let document = doc("<p>a</p>");
        let target = first(&document, "p");
        let check = check_unique(&document, target, "//p[last()]");
        assert!(!check.is_unique);
        assert_eq!(check.warning.as_deref(), Some(DOM_QUERY_WARNING));
    }

    #[test]
    fn unique_probe_confirms_identity() {
        let document = doc(r#"<input name="email"><input name="other">"#);
        let target = first(&document, r#"input[name="email"]"#);
        let check = check_unique(&document, target, r#"//input[@name="email"]"#);
        assert!(check.is_unique);
    }
}
