//! Analytics value extraction and metadata lookups (DHIS2-style API).

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, info, instrument};

use healthpull_query::ValueQuery;
use healthpull_shared::{HealthPullError, RawRecord, Result};

use crate::{ExtractClient, check_status};

/// Raw analytics records plus the id-to-name metadata returned with them.
///
/// The `names` map resolves org-unit, data-element, and category-option-combo
/// codes to display names; the transformer joins it onto the records.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsResult {
    /// One record per analytics row, keyed by dimension name
    /// (`dx`, `co`, `ou`, `pe`, `value`).
    pub records: Vec<RawRecord>,
    /// Metadata id → display name.
    pub names: HashMap<String, String>,
}

impl ExtractClient {
    /// Extract aggregated values for the given elements, periods, and org
    /// units via the analytics endpoint.
    ///
    /// The response is positional (`headers` + `rows`); each row is mapped
    /// back into a named record. Display names come along in
    /// `metaData.items` and are returned for the enrichment stage.
    #[instrument(skip_all, fields(elements = query.data_elements.len(), periods = query.periods.len()))]
    pub async fn get_analytics(&self, query: &ValueQuery) -> Result<AnalyticsResult> {
        let url = format!("{}/api/analytics.json", self.base_url());

        let response = self
            .get("/api/analytics.json")
            .query(&[
                ("dimension", format!("dx:{}", query.data_elements.join(";"))),
                ("dimension", format!("pe:{}", query.periods.join(";"))),
                ("dimension", format!("ou:{}", query.org_units.join(";"))),
                ("dimension", "co".to_string()),
            ])
            .send()
            .await
            .map_err(|e| HealthPullError::Fetch(format!("{url}: {e}")))?;

        let response = check_status(response, &url).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| HealthPullError::Fetch(format!("{url}: malformed JSON: {e}")))?;

        let headers: Vec<String> = body
            .get("headers")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                HealthPullError::validation(format!("{url}: response lacks 'headers' array"))
            })?
            .iter()
            .map(|h| {
                h.get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        HealthPullError::validation(format!("{url}: unnamed analytics header"))
                    })
            })
            .collect::<Result<_>>()?;

        let rows = body.get("rows").and_then(Value::as_array).ok_or_else(|| {
            HealthPullError::validation(format!("{url}: response lacks 'rows' array"))
        })?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let cells = row.as_array().ok_or_else(|| {
                HealthPullError::validation(format!("{url}: non-array analytics row"))
            })?;
            let mut record = RawRecord::new();
            for (name, cell) in headers.iter().zip(cells) {
                record.insert(name.clone(), cell.clone());
            }
            records.push(record);
        }

        let names = metadata_names(&body);

        debug!(rows = records.len(), names = names.len(), "analytics response mapped");
        info!(count = records.len(), "value extraction complete");

        Ok(AnalyticsResult { records, names })
    }

    /// Find the identifier of the first dataset whose name matches
    /// (case-insensitive substring, server-side `ilike` filter).
    pub async fn find_dataset_id(&self, name: &str) -> Result<String> {
        let url = format!("{}/api/dataSets.json", self.base_url());

        let response = self
            .get("/api/dataSets.json")
            .query(&[
                ("fields", "id,displayName".to_string()),
                ("filter", format!("name:ilike:{name}")),
            ])
            .send()
            .await
            .map_err(|e| HealthPullError::Fetch(format!("{url}: {e}")))?;

        let response = check_status(response, &url).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| HealthPullError::Fetch(format!("{url}: malformed JSON: {e}")))?;

        body.get("dataSets")
            .and_then(Value::as_array)
            .and_then(|sets| sets.first())
            .and_then(|ds| ds.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                HealthPullError::validation(format!("no dataset matching '{name}' found"))
            })
    }

    /// List data elements (id and name), unpaged, optionally restricted to
    /// the members of one dataset.
    pub async fn list_data_elements(&self, dataset_id: Option<&str>) -> Result<Vec<RawRecord>> {
        let url = format!("{}/api/dataElements.json", self.base_url());

        let mut params: Vec<(&str, String)> = vec![
            ("fields", "id,name".to_string()),
            ("paging", "false".to_string()),
        ];
        if let Some(id) = dataset_id {
            params.push(("filter", format!("dataSetElements.dataSet.id:eq:{id}")));
        }

        let response = self
            .get("/api/dataElements.json")
            .query(&params)
            .send()
            .await
            .map_err(|e| HealthPullError::Fetch(format!("{url}: {e}")))?;

        let response = check_status(response, &url).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| HealthPullError::Fetch(format!("{url}: malformed JSON: {e}")))?;

        body.get("dataElements")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                HealthPullError::validation(format!("{url}: response lacks 'dataElements' array"))
            })?
            .iter()
            .map(|de| {
                de.as_object().cloned().ok_or_else(|| {
                    HealthPullError::validation(format!("{url}: non-object data element entry"))
                })
            })
            .collect()
    }
}

/// Pull the id → display-name map out of `metaData.items`.
fn metadata_names(body: &Value) -> HashMap<String, String> {
    let mut names = HashMap::new();
    if let Some(items) = body
        .pointer("/metaData/items")
        .and_then(Value::as_object)
    {
        for (id, item) in items {
            if let Some(name) = item.get("name").and_then(Value::as_str) {
                names.insert(id.clone(), name.to_string());
            }
        }
    }
    names
}
