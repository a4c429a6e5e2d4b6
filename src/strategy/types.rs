use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of locator strategy types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocatorType {
    Id,
    Class,
    Name,
    Tag,
    Css,
    XPath,
    Aria,
}

impl LocatorType {
    /// Fixed cross-type reliability hierarchy; 0 ranks first.
    pub fn reliability_rank(self) -> u8 {
        match self {
            LocatorType::Id => 0,
            LocatorType::Aria => 1,
            LocatorType::Name => 2,
            LocatorType::Css => 3,
            LocatorType::Class => 4,
            LocatorType::XPath => 5,
            LocatorType::Tag => 6,
        }
    }

    /// Share of the engine's 15-point type-reliability budget.
    pub fn reliability_points(self) -> u8 {
        match self {
            LocatorType::Id => 15,
            LocatorType::Aria => 13,
            LocatorType::Name => 12,
            LocatorType::Css => 10,
            LocatorType::Class => 8,
            LocatorType::XPath => 6,
            LocatorType::Tag => 4,
        }
    }

    /// Minimum stability estimate for a locator of this type to be flagged
    /// stable.
    pub fn stability_threshold(self) -> u8 {
        match self {
            LocatorType::Id | LocatorType::Name => 80,
            LocatorType::Class => 70,
            _ => 60,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LocatorType::Id => "id",
            LocatorType::Class => "class",
            LocatorType::Name => "name",
            LocatorType::Tag => "tag",
            LocatorType::Css => "css",
            LocatorType::XPath => "xpath",
            LocatorType::Aria => "aria",
        }
    }
}

impl fmt::Display for LocatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Positive,
    Negative,
}

/// One additive or subtractive term of a confidence score. `weight` is the
/// fraction of the 100-point budget the factor can contribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceFactor {
    pub factor: String,
    pub impact: Impact,
    pub weight: f32,
    pub description: String,
}

impl ConfidenceFactor {
    pub fn positive(factor: &str, weight: f32, description: impl Into<String>) -> Self {
        Self {
            factor: factor.to_string(),
            impact: Impact::Positive,
            weight,
            description: description.into(),
        }
    }

    pub fn negative(factor: &str, weight: f32, description: impl Into<String>) -> Self {
        Self {
            factor: factor.to_string(),
            impact: Impact::Negative,
            weight,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidenceScore {
    /// Calibrated 0..=100 estimate of the locator's future reliability.
    pub score: u8,
    pub factors: Vec<ConfidenceFactor>,
    pub warnings: Vec<String>,
}

/// One candidate locator, ready for ranking and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatorStrategy {
    #[serde(rename = "type")]
    pub locator_type: LocatorType,
    pub selector: String,
    pub confidence: ConfidenceScore,
    pub explanation: String,
    pub is_unique: bool,
    pub is_stable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reliability_hierarchy_is_total() {
        let ordered = [
            LocatorType::Id,
            LocatorType::Aria,
            LocatorType::Name,
            LocatorType::Css,
            LocatorType::Class,
            LocatorType::XPath,
            LocatorType::Tag,
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0].reliability_rank() < pair[1].reliability_rank());
            assert!(pair[0].reliability_points() > pair[1].reliability_points());
        }
    }

    #[test]
    fn serialized_type_names_are_lowercase() {
        assert_eq!(
            serde_json::to_string(&LocatorType::XPath).unwrap(),
            "\"xpath\""
        );
        assert_eq!(serde_json::to_string(&LocatorType::Aria).unwrap(), "\"aria\"");
    }

    #[test]
    fn stability_thresholds_follow_type() {
        assert_eq!(LocatorType::Id.stability_threshold(), 80);
        assert_eq!(LocatorType::Name.stability_threshold(), 80);
        assert_eq!(LocatorType::Class.stability_threshold(), 70);
        assert_eq!(LocatorType::XPath.stability_threshold(), 60);
        assert_eq!(LocatorType::Tag.stability_threshold(), 60);
    }
}
