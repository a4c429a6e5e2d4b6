//! Generic composition of the strategy generators.

use crate::dom::query;
use crate::errors::Result;
use crate::scoring;
use crate::strategy::{
    AriaGenerator, AttributeGenerator, CssGenerator, LocatorStrategy, XPathGenerator,
};
use crate::types::{ElementSnapshot, InspectionRecord};
use scraper::{ElementRef, Html};
use tracing::debug;

/// One locator strategy behind a uniform capability: a stateless generator
/// producing zero or more candidates for an element.
pub trait StrategyGenerator {
    fn name(&self) -> &'static str;

    fn generate<'a>(
        &self,
        element: ElementRef<'a>,
        document: &'a Html,
    ) -> Result<Vec<LocatorStrategy>>;
}

impl StrategyGenerator for AttributeGenerator {
    fn name(&self) -> &'static str {
        "attribute"
    }

    fn generate<'a>(
        &self,
        element: ElementRef<'a>,
        document: &'a Html,
    ) -> Result<Vec<LocatorStrategy>> {
        self.generate_all_locators(element, document)
    }
}

impl StrategyGenerator for CssGenerator {
    fn name(&self) -> &'static str {
        "css"
    }

    fn generate<'a>(
        &self,
        element: ElementRef<'a>,
        document: &'a Html,
    ) -> Result<Vec<LocatorStrategy>> {
        Ok(vec![self.generate_css_locator(element, document)?])
    }
}

impl StrategyGenerator for XPathGenerator {
    fn name(&self) -> &'static str {
        "xpath"
    }

    fn generate<'a>(
        &self,
        element: ElementRef<'a>,
        document: &'a Html,
    ) -> Result<Vec<LocatorStrategy>> {
        Ok(vec![self.generate_xpath_locator(element, document)?])
    }
}

impl StrategyGenerator for AriaGenerator {
    fn name(&self) -> &'static str {
        "aria"
    }

    fn generate<'a>(
        &self,
        element: ElementRef<'a>,
        document: &'a Html,
    ) -> Result<Vec<LocatorStrategy>> {
        Ok(self
            .generate_aria_locator(element, document)?
            .into_iter()
            .collect())
    }
}

/// Merges every generator's output and ranks it, without knowing the
/// concrete generator count or identity.
pub struct LocatorAggregator {
    generators: Vec<Box<dyn StrategyGenerator>>,
}

impl Default for LocatorAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl LocatorAggregator {
    pub fn new() -> Self {
        Self {
            generators: vec![
                Box::new(AttributeGenerator::new()),
                Box::new(CssGenerator::new()),
                Box::new(XPathGenerator::new()),
                Box::new(AriaGenerator::new()),
            ],
        }
    }

    pub fn with_generators(generators: Vec<Box<dyn StrategyGenerator>>) -> Self {
        Self { generators }
    }

    /// All candidates from all generators, sorted descending by score; ties
    /// fall back to the cross-type comparator.
    pub fn inspect<'a>(
        &self,
        element: ElementRef<'a>,
        document: &'a Html,
    ) -> Result<Vec<LocatorStrategy>> {
        query::ensure_attached(element, document)?;

        let mut strategies = Vec::new();
        for generator in &self.generators {
            let produced = generator.generate(element, document)?;
            debug!(
                generator = generator.name(),
                candidates = produced.len(),
                "generator finished"
            );
            strategies.extend(produced);
        }
        strategies.sort_by(|a, b| {
            b.confidence
                .score
                .cmp(&a.confidence.score)
                .then_with(|| scoring::compare_strategies(a, b))
        });
        Ok(strategies)
    }

    /// The highest-rated candidate.
    pub fn best<'a>(
        &self,
        element: ElementRef<'a>,
        document: &'a Html,
    ) -> Result<Option<LocatorStrategy>> {
        Ok(self.inspect(element, document)?.into_iter().next())
    }

    /// Full persistence payload: element snapshot plus ranked candidates.
    pub fn inspect_record<'a>(
        &self,
        element: ElementRef<'a>,
        document: &'a Html,
    ) -> Result<InspectionRecord> {
        let strategies = self.inspect(element, document)?;
        Ok(InspectionRecord::new(
            snapshot_element(element),
            strategies,
        ))
    }
}

/// Snapshot of the inspected element for the history payload. Layout data
/// is the hosting runtime's to fill in.
pub fn snapshot_element(element: ElementRef<'_>) -> ElementSnapshot {
    let text: String = element.text().collect();
    let text = text.trim();
    ElementSnapshot {
        tag_name: element.value().name().to_string(),
        text_content: (!text.is_empty()).then(|| text.to_string()),
        attributes: element
            .value()
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        rect: None,
        xpath: XPathGenerator::new().build_expression(element),
    }
}
