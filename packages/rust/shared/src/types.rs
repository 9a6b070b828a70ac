//! Core domain types for healthpull extractions.

use serde_json::Value;

/// One API-returned mapping of field name to scalar value (codes, not
/// display names). Produced by the fetcher, consumed by the transformer,
/// never mutated in between.
pub type RawRecord = serde_json::Map<String, Value>;

// ---------------------------------------------------------------------------
// TabularRow
// ---------------------------------------------------------------------------

/// A row with a fixed, named column set.
///
/// The exporter writes `columns()` as the header and one `values()` line per
/// row; implementations must keep the two in the same order and of the same
/// length, so no column can be silently dropped between stages.
pub trait TabularRow {
    /// The fixed output schema, in declared order.
    fn columns() -> &'static [&'static str];

    /// Cell values for this row, aligned with [`TabularRow::columns`].
    /// Absent values become empty cells (explicit null), never missing ones.
    fn values(&self) -> Vec<String>;
}

// ---------------------------------------------------------------------------
// OrgUnitRow
// ---------------------------------------------------------------------------

/// Output schema for the org-unit listing extraction.
pub const ORG_UNIT_COLUMNS: [&str; 12] = [
    "name",
    "id",
    "parent_id",
    "org_unit_type_id",
    "org_unit_type_name",
    "validation_status",
    "created_at",
    "updated_at",
    "latitude",
    "longitude",
    "altitude",
    "aliases",
];

/// One organizational unit from the registry listing, projected onto the
/// fixed 12-column output schema. Fields absent upstream stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrgUnitRow {
    pub name: Option<String>,
    pub id: Option<String>,
    pub parent_id: Option<String>,
    pub org_unit_type_id: Option<String>,
    pub org_unit_type_name: Option<String>,
    pub validation_status: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub altitude: Option<String>,
    pub aliases: Option<String>,
}

impl TabularRow for OrgUnitRow {
    fn columns() -> &'static [&'static str] {
        &ORG_UNIT_COLUMNS
    }

    fn values(&self) -> Vec<String> {
        [
            &self.name,
            &self.id,
            &self.parent_id,
            &self.org_unit_type_id,
            &self.org_unit_type_name,
            &self.validation_status,
            &self.created_at,
            &self.updated_at,
            &self.latitude,
            &self.longitude,
            &self.altitude,
            &self.aliases,
        ]
        .into_iter()
        .map(|v| v.clone().unwrap_or_default())
        .collect()
    }
}

// ---------------------------------------------------------------------------
// ValueRow
// ---------------------------------------------------------------------------

/// Output schema for the value-extraction variant.
pub const VALUE_COLUMNS: [&str; 8] = [
    "dataElement",
    "dataElementName",
    "CategoryOption",
    "categoryOptionComboName",
    "orgUnit",
    "orgUnitName",
    "period",
    "value",
];

/// One aggregated data value, enriched with display names resolved from
/// the analytics metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueRow {
    pub data_element: String,
    pub data_element_name: Option<String>,
    pub category_option: String,
    pub category_option_combo_name: Option<String>,
    pub org_unit: String,
    pub org_unit_name: Option<String>,
    pub period: String,
    pub value: String,
}

impl TabularRow for ValueRow {
    fn columns() -> &'static [&'static str] {
        &VALUE_COLUMNS
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.data_element.clone(),
            self.data_element_name.clone().unwrap_or_default(),
            self.category_option.clone(),
            self.category_option_combo_name.clone().unwrap_or_default(),
            self.org_unit.clone(),
            self.org_unit_name.clone().unwrap_or_default(),
            self.period.clone(),
            self.value.clone(),
        ]
    }
}

// ---------------------------------------------------------------------------
// JSON scalar stringification
// ---------------------------------------------------------------------------

/// Stringify a JSON scalar for tabular output.
///
/// `Null` and missing map to `None` (an explicitly empty cell). Arrays are
/// joined with `"; "` since alias lists are the only array field upstream.
pub fn scalar_to_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|v| scalar_to_string(Some(v)).unwrap_or_default())
                .collect::<Vec<_>>()
                .join("; "),
        ),
        Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn org_unit_row_matches_schema_width() {
        let row = OrgUnitRow::default();
        assert_eq!(row.values().len(), OrgUnitRow::columns().len());
    }

    #[test]
    fn value_row_matches_schema_width() {
        let row = ValueRow::default();
        assert_eq!(row.values().len(), ValueRow::columns().len());
        assert_eq!(ValueRow::columns()[0], "dataElement");
        assert_eq!(ValueRow::columns()[7], "value");
    }

    #[test]
    fn absent_fields_become_empty_cells() {
        let row = OrgUnitRow {
            name: Some("Alger".into()),
            ..Default::default()
        };
        let values = row.values();
        assert_eq!(values[0], "Alger");
        assert!(values[1..].iter().all(String::is_empty));
    }

    #[test]
    fn scalar_stringification() {
        assert_eq!(scalar_to_string(Some(&json!("x"))), Some("x".into()));
        assert_eq!(scalar_to_string(Some(&json!(29688))), Some("29688".into()));
        assert_eq!(scalar_to_string(Some(&json!(1.5))), Some("1.5".into()));
        assert_eq!(scalar_to_string(Some(&json!(null))), None);
        assert_eq!(scalar_to_string(None), None);
        assert_eq!(
            scalar_to_string(Some(&json!(["a", "b"]))),
            Some("a; b".into())
        );
    }
}
