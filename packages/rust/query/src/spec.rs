//! Resolved query specifications.
//!
//! A query spec is built once from user-supplied parameters and the lookup
//! tables, before any network call, and is immutable afterwards. All
//! parameter resolution errors surface here.

use tracing::debug;

use healthpull_shared::{HealthPullError, Result};

use crate::lookup::{Level, LookupTables};
use crate::period::period_range;

/// Validation status filter sent with every org-unit listing request.
const VALIDATION_STATUS_ALL: &str = "all";

/// Source id of the upstream registry's reference pyramid.
const DEFAULT_SOURCE_ID: u32 = 2;

// ---------------------------------------------------------------------------
// OrgUnitQuery
// ---------------------------------------------------------------------------

/// Resolved parameters for the org-unit listing extraction.
#[derive(Debug, Clone)]
pub struct OrgUnitQuery {
    /// Canonical country name (as registered in the lookup table).
    pub country: &'static str,
    /// Requested hierarchy level.
    pub level: Level,
    /// Registry source pyramid.
    pub source_id: u32,
    /// Validation status filter.
    pub validation_status: String,
    /// Resolved org-unit-type id for the level.
    pub org_unit_type_id: u32,
    /// Resolved parent org-unit id for the country.
    pub org_unit_parent_id: u64,
}

impl OrgUnitQuery {
    /// Resolve country and level names against the lookup tables.
    ///
    /// Fails with a config error on an unknown key, before any network call.
    pub fn build(country: &str, level: Level, tables: &LookupTables) -> Result<Self> {
        let (canonical, parent_id) = tables.countries.resolve(country)?;
        let type_id = tables.levels.org_unit_type_id(level)?;

        debug!(country = canonical, %level, type_id, parent_id, "resolved org-unit query");

        Ok(Self {
            country: canonical,
            level,
            source_id: DEFAULT_SOURCE_ID,
            validation_status: VALIDATION_STATUS_ALL.to_string(),
            org_unit_type_id: type_id,
            org_unit_parent_id: parent_id,
        })
    }

    /// Output file name encoding the query parameters, e.g. `Algeria_Regions.csv`.
    pub fn file_name(&self) -> String {
        format!("{}_{}.csv", self.country, self.level.name())
    }
}

// ---------------------------------------------------------------------------
// ValueQuery
// ---------------------------------------------------------------------------

/// Resolved parameters for the value extraction.
#[derive(Debug, Clone)]
pub struct ValueQuery {
    /// Data element identifiers to extract.
    pub data_elements: Vec<String>,
    /// Org units to extract values for.
    pub org_units: Vec<String>,
    /// Expanded, ordered period sequence covering `[start, end]`.
    pub periods: Vec<String>,
    /// Start period as supplied (canonicalized to YYYYMM).
    pub start: String,
    /// End period as supplied (canonicalized to YYYYMM).
    pub end: String,
}

impl ValueQuery {
    /// Expand the date range and validate the identifier lists.
    pub fn build(
        data_elements: Vec<String>,
        org_units: Vec<String>,
        start: &str,
        end: &str,
    ) -> Result<Self> {
        if data_elements.is_empty() {
            return Err(HealthPullError::config(
                "no data elements given: pass --data-element or set defaults.data_elements",
            ));
        }
        if org_units.is_empty() {
            return Err(HealthPullError::config("no org units given"));
        }

        let periods = period_range(start, end)?;
        let start = periods.first().cloned().unwrap_or_default();
        let end = periods.last().cloned().unwrap_or_default();

        debug!(
            elements = data_elements.len(),
            org_units = org_units.len(),
            periods = periods.len(),
            "resolved value query"
        );

        Ok(Self {
            data_elements,
            org_units,
            periods,
            start,
            end,
        })
    }

    /// Output file name encoding org units, elements, and the period range.
    pub fn file_name(&self) -> String {
        format!(
            "dataextraction_ous-{}_elements-{}_periods-{}_{}.csv",
            self.org_units.join(","),
            self.data_elements.join(","),
            self.start,
            self.end
        )
    }
}
