use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::keybindings::KeybindingsConfig;
use crate::utils::paths::get_config_path;

pub const DEFAULT_SERVER_PORT: u16 = 48373;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,

    #[serde(default = "default_timeoutlen")]
    pub timeoutlen: u64,

    /// How long the "Copied!" acknowledgment stays visible.
    #[serde(default = "default_ack_duration_ms")]
    pub ack_duration_ms: u64,

    #[serde(default = "default_server_port")]
    pub server_port: u16,

    /// Seconds `qcp copy` keeps serving the clipboard on X11/Wayland before
    /// exiting. Ends early once another program takes the clipboard. `0`
    /// exits immediately.
    #[serde(default = "default_copy_hold_secs")]
    pub copy_hold_secs: u64,

    /// Command line run by the `openPopup` message, e.g. `"alacritty -e qcp"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popup_command: Option<String>,

    #[serde(default)]
    pub keybindings: KeybindingsConfig,
}

fn default_theme() -> String {
    "default".to_string()
}

fn default_timeoutlen() -> u64 {
    1000
}

fn default_ack_duration_ms() -> u64 {
    2000
}

fn default_server_port() -> u16 {
    DEFAULT_SERVER_PORT
}

fn default_copy_hold_secs() -> u64 {
    15
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            timeoutlen: default_timeoutlen(),
            ack_duration_ms: default_ack_duration_ms(),
            server_port: default_server_port(),
            copy_hold_secs: default_copy_hold_secs(),
            popup_command: None,
            keybindings: KeybindingsConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", config_path.display()))?;

        config.keybindings = config.keybindings.merge_with_defaults();

        Ok(config)
    }
}
