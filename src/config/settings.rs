use serde::{Deserialize, Serialize};

/// Environment variable overriding [`Config::api_key`]
pub const API_KEY_ENV: &str = "SOK_API_KEY";
/// Environment variable overriding [`Config::cx`]
pub const CX_ENV: &str = "SOK_CX";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Google API key
    #[serde(default)]
    pub api_key: String,

    /// Programmable search engine id
    #[serde(default)]
    pub cx: String,

    /// Site every query is restricted to
    #[serde(default = "default_site_search")]
    pub site_search: String,

    /// Optional custom API endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Write debug logs to a file
    #[serde(default)]
    pub debug: bool,

    /// Log file or directory (defaults next to the config file)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_log_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_log_rotation: Option<DebugLogRotation>,

    /// How many rotated log files to keep (0 keeps everything)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_log_keep: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            cx: String::new(),
            site_search: default_site_search(),
            endpoint: None,
            timeout_secs: default_timeout_secs(),
            debug: false,
            debug_log_path: None,
            debug_log_rotation: None,
            debug_log_keep: None,
        }
    }
}

impl Config {
    /// Apply `SOK_API_KEY` / `SOK_CX` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_key = key;
        }
        if let Some(cx) = lookup(CX_ENV).filter(|v| !v.trim().is_empty()) {
            self.cx = cx;
        }
    }

    /// Whether both search credentials are present
    pub fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.cx.trim().is_empty()
    }
}

/// How debug log files are rotated
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DebugLogRotation {
    /// Single file, appended to forever
    None,
    /// One file per day
    Daily,
    /// One file per run
    Session,
}

fn default_site_search() -> String {
    "storochliten.se/".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}
