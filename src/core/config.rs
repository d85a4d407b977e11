//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.waypoint/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::LogLevel;
use crate::fetch::HttpSettings;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct WaypointConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub document: DocumentConfig,
    #[serde(default)]
    pub downloads: DownloadsConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub host: HostConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub log_level: Option<LogLevel>,
    pub log_file: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DocumentConfig {
    pub location: Option<String>,
    pub strict_links: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DownloadsConfig {
    pub dir: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HostConfig {
    pub allow_calls: Option<bool>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_DOCUMENT_LOCATION: &str = "app.json";
pub const DEFAULT_LOG_FILE: &str = "waypoint.log";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("waypoint/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub document_location: String,
    pub strict_links: bool,
    pub download_dir: PathBuf,
    pub http: HttpSettings,
    pub log_level: LogLevel,
    pub log_file: PathBuf,
    pub allow_calls: bool,
}

/// Values given on the command line. `None` = not specified.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub document: Option<String>,
    pub download_dir: Option<PathBuf>,
    pub log_level: Option<LogLevel>,
    pub strict_links: bool,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.waypoint/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".waypoint").join("config.toml"))
}

/// Load config from `~/.waypoint/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `WaypointConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<WaypointConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(WaypointConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(WaypointConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: WaypointConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Waypoint Configuration
# All settings are optional — defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# log_level = "info"                 # "error", "warn", "info", "debug", "trace"
# log_file = "waypoint.log"

# [document]
# location = "https://example.com/app.json"   # Or WAYPOINT_DOCUMENT env var; a path works too
# strict_links = false               # Refuse documents with links to missing screens

# [downloads]
# dir = "/tmp/waypoint"              # Or WAYPOINT_DOWNLOAD_DIR env var

# [http]
# timeout_secs = 30
# user_agent = "waypoint"

# [host]
# allow_calls = false                # Whether phone call actions can be placed
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &WaypointConfig, cli: &CliOverrides) -> ResolvedConfig {
    // Document: CLI → env → config → default
    let document_location = cli
        .document
        .clone()
        .or_else(|| std::env::var("WAYPOINT_DOCUMENT").ok())
        .or_else(|| config.document.location.clone())
        .unwrap_or_else(|| DEFAULT_DOCUMENT_LOCATION.to_string());

    // Download dir: CLI → env → config → cache dir
    let download_dir = cli
        .download_dir
        .clone()
        .or_else(|| std::env::var("WAYPOINT_DOWNLOAD_DIR").ok().map(PathBuf::from))
        .or_else(|| config.downloads.dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(default_download_dir);

    // Log level: CLI → env → config → default
    let log_level = cli
        .log_level
        .or_else(|| {
            std::env::var("WAYPOINT_LOG_LEVEL")
                .ok()
                .and_then(|s| s.parse().ok())
        })
        .or(config.general.log_level)
        .unwrap_or_default();

    ResolvedConfig {
        document_location,
        strict_links: cli.strict_links || config.document.strict_links.unwrap_or(false),
        download_dir,
        http: HttpSettings {
            timeout: Duration::from_secs(
                config.http.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            user_agent: config
                .http
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        },
        log_level,
        log_file: PathBuf::from(
            config
                .general
                .log_file
                .as_deref()
                .unwrap_or(DEFAULT_LOG_FILE),
        ),
        allow_calls: config.host.allow_calls.unwrap_or(false),
    }
}

/// `<cache dir>/waypoint/files`, or the temp dir when there's no cache dir.
fn default_download_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("waypoint")
        .join("files")
}
