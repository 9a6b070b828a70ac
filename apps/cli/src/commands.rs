//! CLI command definitions, routing, and tracing setup.

use std::path::Path;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use healthpull_core::{
    OrgUnitParams, PipelineConfig, RunReporter, RunResult, ValueParams,
    run_org_unit_extraction, run_value_extraction,
};
use healthpull_query::Level;
use healthpull_shared::{AppConfig, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// healthpull — extract health-information-system data to CSV.
#[derive(Parser)]
#[command(
    name = "healthpull",
    version,
    about = "Extract org units and aggregated values from DHIS2/IASO-style APIs into CSV files.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// List the org units of one country and hierarchy level.
    OrgUnits {
        /// Country name (one of the 46 registered countries).
        #[arg(long)]
        country: String,

        /// Hierarchy level: Country, Regions, Districts, or FOSAs.
        #[arg(long)]
        level: Level,

        /// Connection name (defaults to the configured IASO connection).
        #[arg(long)]
        connection: Option<String>,

        /// Subdirectory under the workspace root for the output file.
        #[arg(long, default_value = "org_units")]
        out_dir: String,
    },

    /// Extract aggregated data values over a period range.
    Values {
        /// Org unit identifier (repeatable).
        #[arg(long = "org-unit", required = true)]
        org_units: Vec<String>,

        /// Inclusive start period (YYYYMM or YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// Inclusive end period (YYYYMM or YYYY-MM-DD).
        #[arg(long)]
        end: String,

        /// Data element identifier (repeatable; defaults to the configured
        /// list, or to name resolution when --disease is given).
        #[arg(long = "data-element")]
        data_elements: Vec<String>,

        /// Disease name pattern (repeatable), matched case-insensitively
        /// against data element names.
        #[arg(long = "disease")]
        diseases: Vec<String>,

        /// Dataset name restricting element resolution to its members.
        /// Ignored when explicit --data-element ids are given.
        #[arg(long)]
        dataset: Option<String>,

        /// Connection name (defaults to the configured DHIS2 connection).
        #[arg(long)]
        connection: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "healthpull=info",
        1 => "healthpull=debug",
        _ => "healthpull=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::OrgUnits {
            country,
            level,
            connection,
            out_dir,
        } => cmd_org_units(&country, level, connection.as_deref(), &out_dir).await,
        Command::Values {
            org_units,
            start,
            end,
            data_elements,
            diseases,
            dataset,
            connection,
        } => {
            cmd_values(
                org_units,
                &start,
                &end,
                data_elements,
                diseases,
                dataset,
                connection.as_deref(),
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn pipeline_config(config: &AppConfig, connection_name: &str) -> Result<PipelineConfig> {
    let connection = config.connection(connection_name)?;
    let credentials = connection.resolve()?;
    let files_path = config.files_path()?;

    Ok(PipelineConfig {
        credentials,
        files_path,
    })
}

async fn cmd_org_units(
    country: &str,
    level: Level,
    connection: Option<&str>,
    out_dir: &str,
) -> Result<()> {
    let config = load_config()?;
    let connection_name = connection.unwrap_or(&config.defaults.iaso_connection);
    let pipeline = pipeline_config(&config, connection_name)?;

    let params = OrgUnitParams {
        country: country.to_string(),
        level,
        output_dir: out_dir.to_string(),
    };

    info!(country, %level, connection = connection_name, "starting org-unit extraction");

    let reporter = CliRun::new();
    let result = run_org_unit_extraction(&pipeline, &params, &reporter).await?;
    print_summary(&result);

    Ok(())
}

async fn cmd_values(
    org_units: Vec<String>,
    start: &str,
    end: &str,
    data_elements: Vec<String>,
    diseases: Vec<String>,
    dataset: Option<String>,
    connection: Option<&str>,
) -> Result<()> {
    let config = load_config()?;
    let connection_name = connection.unwrap_or(&config.defaults.dhis2_connection);
    let pipeline = pipeline_config(&config, connection_name)?;

    // CLI flags override the configured defaults.
    let dataset = dataset.or_else(|| config.defaults.dataset.clone());
    let data_elements = if data_elements.is_empty() && diseases.is_empty() && dataset.is_none() {
        config.defaults.data_elements.clone()
    } else {
        data_elements
    };

    let params = ValueParams {
        data_elements,
        org_units,
        start: start.to_string(),
        end: end.to_string(),
        diseases,
        dataset,
    };

    info!(start, end, connection = connection_name, "starting value extraction");

    let reporter = CliRun::new();
    let result = run_value_extraction(&pipeline, &params, &reporter).await?;
    print_summary(&result);

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config file created at {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let rendered = toml::to_string_pretty(&config)
        .map_err(|e| healthpull_shared::HealthPullError::config(e.to_string()))?;
    println!("{rendered}");
    Ok(())
}

fn print_summary(result: &RunResult) {
    println!();
    println!("  Extraction finished!");
    println!("  Rows:   {}", result.row_count);
    println!("  Output: {}", result.output_path.display());
    println!("  Time:   {:.1}s", result.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI run reporter
// ---------------------------------------------------------------------------

/// Run reporter using an indicatif spinner.
struct CliRun {
    spinner: ProgressBar,
}

impl CliRun {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl RunReporter for CliRun {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn file_produced(&self, path: &Path) {
        self.spinner.println(format!("  produced {}", path.display()));
    }

    fn done(&self, _result: &RunResult) {
        self.spinner.finish_and_clear();
    }
}
