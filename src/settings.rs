//! Agent settings
//!
//! Loaded from settings.json, looked up next to the executable and then in
//! the user config directory (`~/.config/vm-snapshot-agent/settings.json`
//! on Linux). Missing or malformed files fall back to defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const SETTINGS_FILE: &str = "settings.json";
pub const CONFIG_DIR_NAME: &str = "vm-snapshot-agent";

/// Settings loaded from settings.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    /// API users; when empty a single admin key is generated
    #[serde(default)]
    pub users: Vec<UserSettings>,
    /// Optional JSON seed for the inventory
    #[serde(default)]
    pub inventory_file: Option<PathBuf>,
    /// Where the generated admin key is kept
    #[serde(default = "default_api_key_file")]
    pub api_key_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            server: ServerSettings::default(),
            users: Vec::new(),
            inventory_file: None,
            api_key_file: default_api_key_file(),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Prefix of every href handed out by the API
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind: default_bind(),
            port: default_port(),
            base_url: default_base_url(),
        }
    }
}

/// One API user and the permission identifiers granted to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    pub name: String,
    pub api_key: String,
    #[serde(default)]
    pub grants: Vec<String>,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9876
}

fn default_base_url() -> String {
    "http://localhost:9876".to_string()
}

fn default_api_key_file() -> PathBuf {
    PathBuf::from(".snapshot_agent_api")
}

/// Candidate settings.json locations, most specific first
pub fn settings_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        paths.push(dir.join(SETTINGS_FILE));
    }
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(CONFIG_DIR_NAME).join(SETTINGS_FILE));
    }
    paths
}

/// Load settings from the first existing settings.json or use defaults
pub fn load_settings() -> Settings {
    for path in settings_paths() {
        if path.exists() {
            return load_settings_from(&path);
        }
    }
    info!("No {} found, using default values", SETTINGS_FILE);
    Settings::default()
}

/// Load settings from `path`, falling back to defaults on any error
pub fn load_settings_from(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(settings) => {
                info!(path = %path.display(), "Settings loaded");
                settings
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to parse settings, using defaults");
                Settings::default()
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read settings, using defaults");
            Settings::default()
        }
    }
}
