//! Application configuration for progscout.
//!
//! User config lives at `~/.progscout/progscout.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ProgScoutError, Result};
use crate::keywords::KeywordTables;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "progscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".progscout";

// ---------------------------------------------------------------------------
// Config structs (matching progscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding per-program artifacts (relative to the CWD unless
    /// absolute).
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Network settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Study programs to ingest and serve.
    #[serde(default = "default_programs")]
    pub programs: Vec<ProgramEntry>,

    /// Keyword tables for link discovery, column classification, and
    /// elective scoring.
    #[serde(default)]
    pub keywords: KeywordTables,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            fetch: FetchConfig::default(),
            programs: default_programs(),
            keywords: KeywordTables::default(),
        }
    }
}

fn default_data_dir() -> String {
    "data".into()
}

fn default_programs() -> Vec<ProgramEntry> {
    vec![
        ProgramEntry {
            key: "ai".into(),
            url: "https://abit.itmo.ru/program/master/ai".into(),
        },
        ProgramEntry {
            key: "ai_product".into(),
            url: "https://abit.itmo.ru/program/master/ai_product".into(),
        },
    ]
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header sent with every request. The source site serves
    /// a stripped page to obvious bots, so this defaults to a desktop
    /// browser string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for program page fetches, in seconds.
    #[serde(default = "default_page_timeout")]
    pub page_timeout_secs: u64,

    /// Timeout for curriculum document downloads, in seconds.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            page_timeout_secs: default_page_timeout(),
            download_timeout_secs: default_download_timeout(),
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/123.0 Safari/537.36"
        .into()
}
fn default_page_timeout() -> u64 {
    30
}
fn default_download_timeout() -> u64 {
    60
}

/// `[[programs]]` entry: one study program to ingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramEntry {
    /// Program key (lowercase, used as directory name).
    pub key: String,
    /// Public program page URL.
    pub url: String,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.progscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ProgScoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.progscout/progscout.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| ProgScoutError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ProgScoutError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ProgScoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ProgScoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ProgScoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
