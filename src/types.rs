use crate::strategy::LocatorStrategy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Layout rectangle supplied by the hosting runtime. Parsing alone carries
/// no layout, so builders from a bare parse tree leave it `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Snapshot of the inspected element as it looked at generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub tag_name: String,
    pub text_content: Option<String>,
    pub attributes: HashMap<String, String>,
    pub rect: Option<ElementRect>,
    pub xpath: String,
}

/// The payload shape the persistence collaborator stores per inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionRecord {
    pub element: ElementSnapshot,
    pub strategies: Vec<LocatorStrategy>,
    pub captured_at: DateTime<Utc>,
}

impl InspectionRecord {
    pub fn new(element: ElementSnapshot, strategies: Vec<LocatorStrategy>) -> Self {
        Self {
            element,
            strategies,
            captured_at: Utc::now(),
        }
    }
}
