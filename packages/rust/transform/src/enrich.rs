//! Enrichment and projection onto the fixed output schemas.
//!
//! Raw records carry codes; the functions here attach display names resolved
//! from metadata and rename/project the columns to the external contract.
//! Columns never get silently dropped: anything absent upstream becomes an
//! explicitly empty cell.

use std::collections::HashMap;

use tracing::debug;

use healthpull_shared::{OrgUnitRow, RawRecord, ValueRow, scalar_to_string};

/// Project raw org-unit records onto the fixed 12-column listing schema.
///
/// An empty input yields an empty output; the exporter still writes the
/// schema header.
pub fn org_unit_rows(records: &[RawRecord]) -> Vec<OrgUnitRow> {
    let rows: Vec<OrgUnitRow> = records
        .iter()
        .map(|r| OrgUnitRow {
            name: field(r, "name"),
            id: field(r, "id"),
            parent_id: field(r, "parent_id"),
            org_unit_type_id: field(r, "org_unit_type_id"),
            org_unit_type_name: field(r, "org_unit_type_name"),
            validation_status: field(r, "validation_status"),
            created_at: field(r, "created_at"),
            updated_at: field(r, "updated_at"),
            latitude: field(r, "latitude"),
            longitude: field(r, "longitude"),
            altitude: field(r, "altitude"),
            aliases: field(r, "aliases"),
        })
        .collect();

    debug!(count = rows.len(), "org-unit records projected");
    rows
}

/// Attach display names from the metadata map and rename the analytics
/// dimensions (`dx`/`co`/`ou`/`pe`/`value`) to the fixed 8-column schema.
///
/// A code with no metadata entry keeps an empty name cell; the code column
/// itself is always populated from the record.
pub fn enrich_values(records: &[RawRecord], names: &HashMap<String, String>) -> Vec<ValueRow> {
    let rows: Vec<ValueRow> = records
        .iter()
        .map(|r| {
            let data_element = field(r, "dx").unwrap_or_default();
            let category_option = field(r, "co").unwrap_or_default();
            let org_unit = field(r, "ou").unwrap_or_default();

            ValueRow {
                data_element_name: names.get(&data_element).cloned(),
                category_option_combo_name: names.get(&category_option).cloned(),
                org_unit_name: names.get(&org_unit).cloned(),
                data_element,
                category_option,
                org_unit,
                period: field(r, "pe").unwrap_or_default(),
                value: field(r, "value").unwrap_or_default(),
            }
        })
        .collect();

    debug!(count = rows.len(), "value records enriched");
    rows
}

fn field(record: &RawRecord, name: &str) -> Option<String> {
    scalar_to_string(record.get(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthpull_shared::TabularRow;
    use serde_json::{Value, json};

    fn raw(pairs: &[(&str, Value)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn org_unit_projection_fills_all_columns() {
        let records = vec![raw(&[
            ("name", json!("Alger")),
            ("id", json!(30001)),
            ("parent_id", json!(29688)),
            ("org_unit_type_id", json!(6)),
            ("org_unit_type_name", json!("Region")),
            ("validation_status", json!("VALID")),
            ("created_at", json!(1672531200.0)),
            ("updated_at", json!(1675209600.0)),
            ("latitude", json!(36.75)),
            ("longitude", json!(3.06)),
            ("altitude", json!(null)),
            ("aliases", json!(["Algiers"])),
        ])];

        let rows = org_unit_rows(&records);
        assert_eq!(rows.len(), 1);
        let values = rows[0].values();
        assert_eq!(values.len(), OrgUnitRow::columns().len());
        assert_eq!(values[0], "Alger");
        assert_eq!(values[1], "30001");
        assert_eq!(values[10], ""); // null altitude stays an empty cell
        assert_eq!(values[11], "Algiers");
    }

    #[test]
    fn missing_upstream_fields_become_empty_cells() {
        let records = vec![raw(&[("name", json!("Oran")), ("id", json!(30002))])];
        let rows = org_unit_rows(&records);
        let values = rows[0].values();
        assert_eq!(values[0], "Oran");
        assert!(values[2..].iter().all(String::is_empty));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(org_unit_rows(&[]).is_empty());
        assert!(enrich_values(&[], &HashMap::new()).is_empty());
    }

    #[test]
    fn value_enrichment_attaches_names_and_renames() {
        let records = vec![raw(&[
            ("dx", json!("fbfJHSPpUQD")),
            ("co", json!("HllvX50cXC0")),
            ("ou", json!("vELbGdEphPd")),
            ("pe", json!("202301")),
            ("value", json!("42")),
        ])];
        let names = HashMap::from([
            ("fbfJHSPpUQD".to_string(), "ANC 1st visit".to_string()),
            ("HllvX50cXC0".to_string(), "default".to_string()),
            ("vELbGdEphPd".to_string(), "Alger".to_string()),
        ]);

        let rows = enrich_values(&records, &names);
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].values(),
            vec![
                "fbfJHSPpUQD",
                "ANC 1st visit",
                "HllvX50cXC0",
                "default",
                "vELbGdEphPd",
                "Alger",
                "202301",
                "42",
            ]
        );
    }

    #[test]
    fn unresolved_code_keeps_an_empty_name_cell() {
        let records = vec![raw(&[
            ("dx", json!("unknownCode")),
            ("co", json!("co1")),
            ("ou", json!("ou1")),
            ("pe", json!("202301")),
            ("value", json!("7")),
        ])];

        let rows = enrich_values(&records, &HashMap::new());
        assert_eq!(rows[0].data_element, "unknownCode");
        assert_eq!(rows[0].data_element_name, None);
        // Schema invariant: width still matches the declared column set.
        assert_eq!(rows[0].values().len(), ValueRow::columns().len());
    }
}
