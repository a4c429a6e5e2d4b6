//! Accessibility report serialization for the presentation boundary.

use crate::errors::{LocatorError, Result};
use crate::strategy::AriaSnapshot;

/// Pretty-printed JSON rendering of the snapshot.
pub fn snapshot_to_json(snapshot: &AriaSnapshot) -> Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

/// Tabular field/value rendering. The writer applies RFC4180 quoting, so
/// commas, quotes and newlines inside values survive a round-trip.
pub fn snapshot_to_csv(snapshot: &AriaSnapshot) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(["field", "value"])?;
    writer.write_record(["element", snapshot.element.as_str()])?;
    writer.write_record(["role", snapshot.role.as_str()])?;
    writer.write_record([
        "accessible_name",
        snapshot.accessible_name.as_deref().unwrap_or(""),
    ])?;
    writer.write_record([
        "accessible_description",
        snapshot.accessible_description.as_deref().unwrap_or(""),
    ])?;

    for (name, value) in &snapshot.aria_attributes {
        writer.write_record([name.as_str(), value.as_str()])?;
    }

    let states = &snapshot.states;
    for (name, value) in [
        ("state:required", states.required),
        ("state:disabled", states.disabled),
        ("state:expanded", states.expanded),
        ("state:pressed", states.pressed),
        ("state:selected", states.selected),
        ("state:hidden", states.hidden),
    ] {
        writer.write_record([name, if value { "true" } else { "false" }])?;
    }

    let hierarchy = snapshot.hierarchy.join(" > ");
    writer.write_record(["hierarchy", hierarchy.as_str()])?;

    let bytes = writer
        .into_inner()
        .map_err(|e| LocatorError::ExportFailed(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| LocatorError::ExportFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::AriaGenerator;
    use crate::testing::TestHelper;

    fn snapshot() -> AriaSnapshot {
        let document = TestHelper::parse(
            r#"<nav><button aria-label="Open, or close" aria-expanded="true">Menu</button></nav>"#,
        );
        let element = TestHelper::target(&document, "button");
        AriaGenerator::new().build_snapshot(element, &document).unwrap()
    }

    #[test]
    fn json_round_trips() {
        let snapshot = snapshot();
        let json = snapshot_to_json(&snapshot).unwrap();
        let back: AriaSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn csv_quotes_fields_containing_commas() {
        let snapshot = snapshot();
        let csv = snapshot_to_csv(&snapshot).unwrap();
        assert!(csv.starts_with("field,value"));
        // RFC4180: the comma-bearing label must be wrapped in quotes.
        assert!(csv.contains(r#""Open, or close""#));
        assert!(csv.contains("state:expanded,true"));
        assert!(csv.contains("hierarchy,navigation"));
    }
}
