//! End-to-end extraction pipelines: authenticate → fetch → transform → export.
//!
//! Control flows strictly forward through the four stages; each stage
//! completes before the next begins and any error aborts the run. Parameter
//! resolution happens before authentication so configuration errors surface
//! before the first network call.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, instrument};

use healthpull_client::ExtractClient;
use healthpull_query::{Level, LookupTables, OrgUnitQuery, ValueQuery};
use healthpull_shared::{Credentials, HealthPullError, Result, ValueRow};
use healthpull_transform::{NameFilter, enrich_values, filter_value_rows, org_unit_rows};

/// Shared configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Resolved credentials for the remote system.
    pub credentials: Credentials,
    /// Workspace root for produced files.
    pub files_path: PathBuf,
}

/// Parameters for the org-unit listing extraction.
#[derive(Debug, Clone)]
pub struct OrgUnitParams {
    /// Country name, resolved against the country table.
    pub country: String,
    /// Hierarchy level to list.
    pub level: Level,
    /// Subdirectory under the workspace root for the output file.
    pub output_dir: String,
}

/// Parameters for the value extraction.
#[derive(Debug, Clone, Default)]
pub struct ValueParams {
    /// Data element identifiers. May be empty when `diseases` or `dataset`
    /// is given; the elements are then resolved from the remote metadata.
    pub data_elements: Vec<String>,

    /// Dataset name scoping the element resolution (matched server-side,
    /// case-insensitive). Ignored when explicit data elements are given.
    pub dataset: Option<String>,
    /// Org units to extract values for.
    pub org_units: Vec<String>,
    /// Inclusive start period (`YYYYMM` or `YYYY-MM-DD`).
    pub start: String,
    /// Inclusive end period.
    pub end: String,
    /// Disease name patterns; matched case-insensitively against data
    /// element names.
    pub diseases: Vec<String>,
}

/// Result of a completed extraction run.
#[derive(Debug)]
pub struct RunResult {
    /// Absolute path of the produced CSV file.
    pub output_path: PathBuf,
    /// Number of data rows written (header excluded).
    pub row_count: usize,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Run-notification sink for the hosting environment.
pub trait RunReporter: Send + Sync {
    /// Called when entering a new stage.
    fn phase(&self, name: &str);
    /// Called once the output file exists at its final path.
    fn file_produced(&self, path: &Path);
    /// Called when the run completes.
    fn done(&self, result: &RunResult);
}

/// No-op reporter for headless/test usage.
pub struct SilentRun;

impl RunReporter for SilentRun {
    fn phase(&self, _name: &str) {}
    fn file_produced(&self, _path: &Path) {}
    fn done(&self, _result: &RunResult) {}
}

// ---------------------------------------------------------------------------
// Org-unit listing pipeline
// ---------------------------------------------------------------------------

/// Extract the org units of one country and hierarchy level to CSV.
#[instrument(skip_all, fields(country = %params.country, level = %params.level))]
pub async fn run_org_unit_extraction(
    config: &PipelineConfig,
    params: &OrgUnitParams,
    reporter: &dyn RunReporter,
) -> Result<RunResult> {
    let start = Instant::now();

    // Lookup resolution first: unknown names must fail before any request.
    let query = OrgUnitQuery::build(&params.country, params.level, &LookupTables::builtin())?;

    reporter.phase("Authenticating");
    let client = ExtractClient::connect(&config.credentials).await?;

    reporter.phase("Fetching org units");
    let records = client.list_org_units(&query).await?;

    reporter.phase("Transforming");
    let rows = org_unit_rows(&records);

    reporter.phase("Exporting");
    let directory = config.files_path.join(&params.output_dir);
    let output_path = healthpull_export::write_csv(&directory, &query.file_name(), &rows)?;
    reporter.file_produced(&output_path);

    let result = RunResult {
        output_path,
        row_count: rows.len(),
        elapsed: start.elapsed(),
    };
    reporter.done(&result);

    info!(
        rows = result.row_count,
        path = %result.output_path.display(),
        elapsed_ms = result.elapsed.as_millis(),
        "org-unit extraction complete"
    );

    Ok(result)
}

// ---------------------------------------------------------------------------
// Value extraction pipeline
// ---------------------------------------------------------------------------

/// Extract aggregated data values over a period range to CSV.
#[instrument(skip_all, fields(start = %params.start, end = %params.end))]
pub async fn run_value_extraction(
    config: &PipelineConfig,
    params: &ValueParams,
    reporter: &dyn RunReporter,
) -> Result<RunResult> {
    let start = Instant::now();

    if params.data_elements.is_empty() && params.diseases.is_empty() && params.dataset.is_none() {
        return Err(HealthPullError::config(
            "no data elements given: pass --data-element, --disease, or --dataset",
        ));
    }

    // Validate configuration before the first network call.
    let periods = healthpull_query::period_range(&params.start, &params.end)?;
    let filter = match params.diseases.is_empty() {
        true => None,
        false => Some(NameFilter::new(&params.diseases)?),
    };

    reporter.phase("Authenticating");
    let client = ExtractClient::connect(&config.credentials).await?;

    // Resolve data elements from metadata when none were given explicitly.
    let data_elements = if params.data_elements.is_empty() {
        reporter.phase("Resolving data elements");
        resolve_data_elements(&client, params.dataset.as_deref(), filter.as_ref()).await?
    } else {
        params.data_elements.clone()
    };

    let query = match data_elements.is_empty() {
        // The disease patterns or dataset matched nothing upstream: a
        // data-dependent empty result, not an error. Export the header-only
        // file.
        true => None,
        false => Some(ValueQuery::build(
            data_elements,
            params.org_units.clone(),
            &params.start,
            &params.end,
        )?),
    };

    let rows: Vec<ValueRow> = match &query {
        None => Vec::new(),
        Some(query) => {
            debug_assert_eq!(query.periods, periods);

            reporter.phase("Fetching values");
            let analytics = client.get_analytics(query).await?;

            reporter.phase("Transforming");
            let rows = enrich_values(&analytics.records, &analytics.names);
            match &filter {
                Some(filter) => filter_value_rows(rows, filter),
                None => rows,
            }
        }
    };

    reporter.phase("Exporting");
    let file_name = match &query {
        Some(query) => query.file_name(),
        None => fallback_file_name(params, &periods),
    };
    let output_path = healthpull_export::write_csv(&config.files_path, &file_name, &rows)?;
    reporter.file_produced(&output_path);

    let result = RunResult {
        output_path,
        row_count: rows.len(),
        elapsed: start.elapsed(),
    };
    reporter.done(&result);

    info!(
        rows = result.row_count,
        path = %result.output_path.display(),
        elapsed_ms = result.elapsed.as_millis(),
        "value extraction complete"
    );

    Ok(result)
}

/// Resolve data element ids from the remote metadata: list the elements
/// (scoped to the dataset when one was named) and keep the ids whose names
/// match the disease filter, when one is set.
async fn resolve_data_elements(
    client: &ExtractClient,
    dataset: Option<&str>,
    filter: Option<&NameFilter>,
) -> Result<Vec<String>> {
    let dataset_id = match dataset {
        Some(name) => Some(client.find_dataset_id(name).await?),
        None => None,
    };

    let elements = client.list_data_elements(dataset_id.as_deref()).await?;
    let matched = match filter {
        Some(filter) => healthpull_transform::filter_by_name(elements, "name", filter),
        None => elements,
    };

    let ids: Vec<String> = matched
        .iter()
        .filter_map(|e| e.get("id").and_then(|v| v.as_str()).map(str::to_string))
        .collect();

    info!(count = ids.len(), dataset = ?dataset_id, "data elements resolved");
    Ok(ids)
}

/// File name for a header-only export, when no data elements matched.
fn fallback_file_name(params: &ValueParams, periods: &[String]) -> String {
    format!(
        "dataextraction_ous-{}_elements-_periods-{}_{}.csv",
        params.org_units.join(","),
        periods.first().map(String::as_str).unwrap_or_default(),
        periods.last().map(String::as_str).unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthpull_shared::RawRecord;
    use serde_json::json;

    fn raw_org_unit(name: &str, id: u64) -> RawRecord {
        let mut r = RawRecord::new();
        r.insert("name".into(), json!(name));
        r.insert("id".into(), json!(id));
        r.insert("parent_id".into(), json!(29688));
        r.insert("org_unit_type_id".into(), json!(6));
        r.insert("org_unit_type_name".into(), json!("Region"));
        r.insert("validation_status".into(), json!("VALID"));
        r
    }

    /// The transformer and exporter, fed two fetched records for
    /// type 6 / parent 29688, must produce Algeria_Regions.csv with a
    /// header plus exactly two data rows under the workspace.
    #[test]
    fn test_transform_and_export_of_fetched_org_units() {
        let workspace = tempfile::tempdir().unwrap();
        let fetched = vec![raw_org_unit("Alger", 30001), raw_org_unit("Oran", 30002)];

        let query =
            OrgUnitQuery::build("Algeria", Level::Regions, &LookupTables::builtin()).unwrap();
        let rows = org_unit_rows(&fetched);
        let path = healthpull_export::write_csv(
            &workspace.path().join("rita_iaso_exercise"),
            &query.file_name(),
            &rows,
        )
        .unwrap();

        assert_eq!(
            path,
            workspace
                .path()
                .join("rita_iaso_exercise")
                .join("Algeria_Regions.csv")
        );

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("name,id,parent_id,org_unit_type_id"));
        assert!(lines[1].starts_with("Alger,30001,29688,6,Region,VALID"));
        assert!(lines[2].starts_with("Oran,30002,29688,6,Region,VALID"));
    }

    #[tokio::test]
    async fn test_org_unit_pipeline_against_mock_server() {
        let server = wiremock::MockServer::start().await;
        let workspace = tempfile::tempdir().unwrap();

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/api/token/"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(json!({ "access": "tok-e2e" })),
            )
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/orgunits/"))
            .and(wiremock::matchers::query_param("orgUnitTypeId", "6"))
            .and(wiremock::matchers::query_param("orgUnitParentId", "29688"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "orgUnits": [
                    { "name": "Alger", "id": 30001 },
                    { "name": "Oran", "id": 30002 },
                ],
            })))
            .mount(&server)
            .await;

        let config = PipelineConfig {
            credentials: Credentials::UserPass {
                base_url: server.uri(),
                username: "pipeline".into(),
                password: "pw".into(),
            },
            files_path: workspace.path().to_path_buf(),
        };
        let params = OrgUnitParams {
            country: "Algeria".into(),
            level: Level::Regions,
            output_dir: "rita_iaso_exercise".into(),
        };

        let result = run_org_unit_extraction(&config, &params, &SilentRun)
            .await
            .unwrap();

        assert_eq!(result.row_count, 2);
        assert!(result.output_path.ends_with("rita_iaso_exercise/Algeria_Regions.csv"));
        let content = std::fs::read_to_string(&result.output_path).unwrap();
        assert_eq!(content.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_unknown_country_fails_without_touching_the_network() {
        // No mock server mounted: a network call would error differently.
        let workspace = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            credentials: Credentials::UserPass {
                base_url: "http://127.0.0.1:1".into(),
                username: "pipeline".into(),
                password: "pw".into(),
            },
            files_path: workspace.path().to_path_buf(),
        };
        let params = OrgUnitParams {
            country: "Atlantis".into(),
            level: Level::Regions,
            output_dir: "out".into(),
        };

        let err = run_org_unit_extraction(&config, &params, &SilentRun)
            .await
            .expect_err("must fail");
        assert!(matches!(err, HealthPullError::Config { .. }));
    }

    #[tokio::test]
    async fn test_value_pipeline_with_disease_filter() {
        let server = wiremock::MockServer::start().await;
        let workspace = tempfile::tempdir().unwrap();

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/dataElements.json"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "dataElements": [
                    { "id": "deMpox00001", "name": "Mpox suspected cases" },
                    { "id": "deMeasles01", "name": "Measles cases" },
                ],
            })))
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/analytics.json"))
            .and(wiremock::matchers::query_param(
                "dimension",
                "dx:deMpox00001",
            ))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "headers": [
                    { "name": "dx" }, { "name": "co" }, { "name": "ou" },
                    { "name": "pe" }, { "name": "value" },
                ],
                "metaData": {
                    "items": {
                        "deMpox00001": { "name": "Mpox suspected cases" },
                        "ouAlger0001": { "name": "Alger" },
                        "coDefault01": { "name": "default" },
                    },
                },
                "rows": [
                    ["deMpox00001", "coDefault01", "ouAlger0001", "202301", "3"],
                ],
            })))
            .mount(&server)
            .await;

        let config = PipelineConfig {
            credentials: Credentials::Token {
                base_url: server.uri(),
                api_token: "tok".into(),
            },
            files_path: workspace.path().to_path_buf(),
        };
        let params = ValueParams {
            data_elements: vec![],
            org_units: vec!["ouAlger0001".into()],
            start: "202301".into(),
            end: "202301".into(),
            diseases: vec!["mpox".into(), "cholera".into(), "covid".into()],
            dataset: None,
        };

        let result = run_value_extraction(&config, &params, &SilentRun)
            .await
            .unwrap();

        assert_eq!(result.row_count, 1);
        let content = std::fs::read_to_string(&result.output_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "dataElement,dataElementName,CategoryOption,categoryOptionComboName,orgUnit,orgUnitName,period,value"
        );
        assert_eq!(
            lines[1],
            "deMpox00001,Mpox suspected cases,coDefault01,default,ouAlger0001,Alger,202301,3"
        );
    }

    #[tokio::test]
    async fn test_value_pipeline_scoped_to_a_dataset() {
        let server = wiremock::MockServer::start().await;
        let workspace = tempfile::tempdir().unwrap();

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/dataSets.json"))
            .and(wiremock::matchers::query_param(
                "filter",
                "name:ilike:00 DSNIS : SIMR",
            ))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "dataSets": [ { "id": "ds00simr001", "displayName": "00 DSNIS : SIMR" } ],
            })))
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/dataElements.json"))
            .and(wiremock::matchers::query_param(
                "filter",
                "dataSetElements.dataSet.id:eq:ds00simr001",
            ))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "dataElements": [
                    { "id": "deMpox00001", "name": "Mpox suspected cases" },
                    { "id": "deCholera01", "name": "Cholera confirmed" },
                ],
            })))
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/analytics.json"))
            .and(wiremock::matchers::query_param(
                "dimension",
                "dx:deMpox00001;deCholera01",
            ))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "headers": [
                    { "name": "dx" }, { "name": "co" }, { "name": "ou" },
                    { "name": "pe" }, { "name": "value" },
                ],
                "metaData": {
                    "items": {
                        "deMpox00001": { "name": "Mpox suspected cases" },
                        "deCholera01": { "name": "Cholera confirmed" },
                        "ouAlger0001": { "name": "Alger" },
                        "coDefault01": { "name": "default" },
                    },
                },
                "rows": [
                    ["deMpox00001", "coDefault01", "ouAlger0001", "202301", "3"],
                    ["deCholera01", "coDefault01", "ouAlger0001", "202301", "9"],
                ],
            })))
            .mount(&server)
            .await;

        let config = PipelineConfig {
            credentials: Credentials::Token {
                base_url: server.uri(),
                api_token: "tok".into(),
            },
            files_path: workspace.path().to_path_buf(),
        };
        let params = ValueParams {
            data_elements: vec![],
            org_units: vec!["ouAlger0001".into()],
            start: "202301".into(),
            end: "202301".into(),
            diseases: vec![],
            dataset: Some("00 DSNIS : SIMR".into()),
        };

        let result = run_value_extraction(&config, &params, &SilentRun)
            .await
            .unwrap();

        assert_eq!(result.row_count, 2);
        let content = std::fs::read_to_string(&result.output_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("deMpox00001,Mpox suspected cases"));
        assert!(lines[2].starts_with("deCholera01,Cholera confirmed"));
    }

    #[tokio::test]
    async fn test_unmatched_disease_filter_exports_header_only() {
        let server = wiremock::MockServer::start().await;
        let workspace = tempfile::tempdir().unwrap();

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/dataElements.json"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "dataElements": [ { "id": "de1", "name": "Malaria cases" } ],
            })))
            .mount(&server)
            .await;

        let config = PipelineConfig {
            credentials: Credentials::Token {
                base_url: server.uri(),
                api_token: "tok".into(),
            },
            files_path: workspace.path().to_path_buf(),
        };
        let params = ValueParams {
            data_elements: vec![],
            org_units: vec!["ou1".into()],
            start: "202301".into(),
            end: "202302".into(),
            diseases: vec!["ebola".into()],
            dataset: None,
        };

        let result = run_value_extraction(&config, &params, &SilentRun)
            .await
            .unwrap();

        assert_eq!(result.row_count, 0);
        let content = std::fs::read_to_string(&result.output_path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_value_pipeline_requires_elements_or_diseases() {
        let workspace = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            credentials: Credentials::Token {
                base_url: "http://127.0.0.1:1".into(),
                api_token: "tok".into(),
            },
            files_path: workspace.path().to_path_buf(),
        };
        let params = ValueParams {
            org_units: vec!["ou1".into()],
            start: "202301".into(),
            end: "202301".into(),
            ..Default::default()
        };

        let err = run_value_extraction(&config, &params, &SilentRun)
            .await
            .expect_err("must fail");
        assert!(matches!(err, HealthPullError::Config { .. }));
    }
}
