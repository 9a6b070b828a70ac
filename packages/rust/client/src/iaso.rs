//! Org-unit registry listing (IASO-style API).

use serde_json::Value;
use tracing::{debug, info, instrument};

use healthpull_query::OrgUnitQuery;
use healthpull_shared::{HealthPullError, RawRecord, Result};

use crate::{ExtractClient, check_status};

/// Page size for listing requests.
const PAGE_LIMIT: u32 = 500;

impl ExtractClient {
    /// List organizational units constrained by type and parent.
    ///
    /// Issues `GET /api/orgunits/` with the resolved query codes and drains
    /// pagination completely before returning: the registry reports
    /// `has_next` alongside the `orgUnits` array when results span pages.
    #[instrument(skip_all, fields(type_id = query.org_unit_type_id, parent_id = query.org_unit_parent_id))]
    pub async fn list_org_units(&self, query: &OrgUnitQuery) -> Result<Vec<RawRecord>> {
        let mut records: Vec<RawRecord> = Vec::new();
        let mut page: u32 = 1;

        loop {
            let url = format!("{}/api/orgunits/", self.base_url());
            let response = self
                .get("/api/orgunits/")
                .query(&[
                    ("source_id", query.source_id.to_string()),
                    ("validation_status", query.validation_status.clone()),
                    ("orgUnitTypeId", query.org_unit_type_id.to_string()),
                    ("orgUnitParentId", query.org_unit_parent_id.to_string()),
                    ("limit", PAGE_LIMIT.to_string()),
                    ("page", page.to_string()),
                ])
                .send()
                .await
                .map_err(|e| HealthPullError::Fetch(format!("{url}: {e}")))?;

            let response = check_status(response, &url).await?;
            let body: Value = response
                .json()
                .await
                .map_err(|e| HealthPullError::Fetch(format!("{url}: malformed JSON: {e}")))?;

            let units = body
                .get("orgUnits")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    HealthPullError::validation(format!("{url}: response lacks 'orgUnits' array"))
                })?;

            for unit in units {
                let record = unit.as_object().cloned().ok_or_else(|| {
                    HealthPullError::validation(format!("{url}: non-object org unit entry"))
                })?;
                records.push(record);
            }

            let has_next = body
                .get("has_next")
                .and_then(Value::as_bool)
                .unwrap_or(false);

            debug!(page, total = records.len(), has_next, "org-unit page fetched");

            if !has_next {
                break;
            }
            page += 1;
        }

        info!(count = records.len(), "org-unit listing complete");
        Ok(records)
    }
}
