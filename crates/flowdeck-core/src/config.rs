use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Days a card may sit untouched before hygiene detection flags it.
    #[serde(default = "default_stuck_threshold_days")]
    pub default_stuck_threshold_days: u32,
    /// How often the outbox worker polls for unconsumed events.
    #[serde(default = "default_worker_poll_interval_ms")]
    pub worker_poll_interval_ms: u64,
    /// Cap on fallback citations when the model cited nothing verifiable.
    #[serde(default = "default_max_fallback_citations")]
    pub max_fallback_citations: usize,
    /// Upper bound on grounded answer length, in characters.
    #[serde(default = "default_max_answer_chars")]
    pub max_answer_chars: usize,
}

fn default_stuck_threshold_days() -> u32 {
    7
}

fn default_worker_poll_interval_ms() -> u64 {
    500
}

fn default_max_fallback_citations() -> usize {
    3
}

fn default_max_answer_chars() -> usize {
    8000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_stuck_threshold_days: default_stuck_threshold_days(),
            worker_poll_interval_ms: default_worker_poll_interval_ms(),
            max_fallback_citations: default_max_fallback_citations(),
            max_answer_chars: default_max_answer_chars(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            dirs::home_dir().map(|home| home.join(".config/flowdeck/config.toml"))
        }
        #[cfg(target_os = "linux")]
        {
            dirs::config_dir().map(|config| config.join("flowdeck/config.toml"))
        }
        #[cfg(target_os = "windows")]
        {
            dirs::config_dir().map(|config| config.join("flowdeck\\config.toml"))
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }

    pub fn load() -> Self {
        if let Some(config_path) = Self::config_path() {
            if config_path.exists() {
                if let Ok(content) = std::fs::read_to_string(&config_path) {
                    if let Ok(config) = toml::from_str(&content) {
                        return config;
                    }
                }
            }
        }
        Self::default()
    }
}
