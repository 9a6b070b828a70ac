//! Application configuration for healthpull.
//!
//! User config lives at `~/.healthpull/healthpull.toml`. It holds the
//! workspace output root and the connection registry; secrets themselves are
//! never stored in the file, only the names of the env vars holding them.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HealthPullError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "healthpull.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".healthpull";

// ---------------------------------------------------------------------------
// Config structs (matching healthpull.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workspace settings.
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Registered connections.
    #[serde(default)]
    pub connections: Vec<Connection>,
}

/// `[workspace]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Root directory for produced files.
    #[serde(default = "default_files_path")]
    pub files_path: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            files_path: default_files_path(),
        }
    }
}

fn default_files_path() -> String {
    "~/healthpull-files".into()
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Connection name used by the org-unit listing extraction.
    #[serde(default = "default_iaso_connection")]
    pub iaso_connection: String,

    /// Connection name used by the value extraction.
    #[serde(default = "default_dhis2_connection")]
    pub dhis2_connection: String,

    /// Data element identifiers extracted when none are passed on the CLI.
    #[serde(default)]
    pub data_elements: Vec<String>,

    /// Dataset name scoping the value extraction when no explicit data
    /// elements are given (matched server-side, case-insensitive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            iaso_connection: default_iaso_connection(),
            dhis2_connection: default_dhis2_connection(),
            data_elements: Vec::new(),
            dataset: None,
        }
    }
}

fn default_iaso_connection() -> String {
    "iaso-playground".into()
}
fn default_dhis2_connection() -> String {
    "dhis2".into()
}

/// `[[connections]]` entry — one remote system in the connection registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Registry name, referenced by `[defaults]` and `--connection`.
    pub name: String,
    /// Base URL of the remote API.
    pub url: String,
    /// Username for token exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Name of the env var holding the password (never the password itself).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
    /// Name of the env var holding a ready-made API token. Takes precedence
    /// over username/password when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Resolved credentials for one pipeline run. Read-only; lifetime ends with
/// the run.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Username/password pair to exchange for a bearer token.
    UserPass {
        base_url: String,
        username: String,
        password: String,
    },
    /// A ready-made API token; no exchange call is needed.
    Token { base_url: String, api_token: String },
}

impl Credentials {
    /// Base URL of the remote system.
    pub fn base_url(&self) -> &str {
        match self {
            Self::UserPass { base_url, .. } | Self::Token { base_url, .. } => base_url,
        }
    }
}

impl Connection {
    /// Resolve this registry entry into runnable credentials, reading the
    /// secret from the configured env var.
    pub fn resolve(&self) -> Result<Credentials> {
        if let Some(token_env) = &self.token_env {
            let api_token = read_secret(token_env, &self.name)?;
            return Ok(Credentials::Token {
                base_url: self.url.clone(),
                api_token,
            });
        }

        let username = self.username.clone().ok_or_else(|| {
            HealthPullError::config(format!(
                "connection '{}' has neither token_env nor username",
                self.name
            ))
        })?;
        let password_env = self.password_env.as_ref().ok_or_else(|| {
            HealthPullError::config(format!(
                "connection '{}' has a username but no password_env",
                self.name
            ))
        })?;
        let password = read_secret(password_env, &self.name)?;

        Ok(Credentials::UserPass {
            base_url: self.url.clone(),
            username,
            password,
        })
    }
}

fn read_secret(var_name: &str, connection: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(HealthPullError::config(format!(
            "secret for connection '{connection}' not found. Set the {var_name} environment variable."
        ))),
    }
}

impl AppConfig {
    /// Look up a connection by registry name.
    pub fn connection(&self, name: &str) -> Result<&Connection> {
        self.connections
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| {
                HealthPullError::config(format!(
                    "no connection named '{name}' in the registry ({} configured)",
                    self.connections.len()
                ))
            })
    }

    /// Resolved workspace files root, with `~` expanded.
    pub fn files_path(&self) -> Result<PathBuf> {
        expand_home(&self.workspace.files_path)
    }
}

/// Expand a leading `~/` against the user's home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| HealthPullError::config("could not determine home directory"))?;
        Ok(home.join(rest))
    } else {
        Ok(PathBuf::from(path))
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.healthpull/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| HealthPullError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.healthpull/healthpull.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| HealthPullError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        HealthPullError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| HealthPullError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| HealthPullError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| HealthPullError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
