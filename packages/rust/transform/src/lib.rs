//! Transformation stage: filter, enrich, and project raw records onto the
//! fixed output schemas.

pub mod enrich;
pub mod filter;

pub use enrich::{enrich_values, org_unit_rows};
pub use filter::{NameFilter, filter_by_ids, filter_by_name};

use healthpull_shared::ValueRow;

/// Keep only value rows whose data element name matches the filter.
///
/// Rows with an unresolved (empty) name never match. Idempotent, like the
/// record-level name filter it mirrors.
pub fn filter_value_rows(rows: Vec<ValueRow>, filter: &NameFilter) -> Vec<ValueRow> {
    rows.into_iter()
        .filter(|row| {
            row.data_element_name
                .as_deref()
                .is_some_and(|name| filter.matches(name))
        })
        .collect()
}
