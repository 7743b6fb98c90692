use crate::filter::FilterPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const CONFIG_PATH: &str = "geofix.toml";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub filter: FilterPolicy,
    pub replay: ReplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    pub interval_ms: u64, // Pause between replayed fixes, 0 for as fast as possible
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub directory: String,
    pub file_name: String, // Rolled daily, date is appended
}

impl Default for Config {
    fn default() -> Self {
        Config {
            filter: FilterPolicy::default(),
            replay: ReplayConfig { interval_ms: 0 },
            logging: LoggingConfig {
                directory: "logs".to_string(),
                file_name: "geofix.log".to_string(),
            },
        }
    }
}

impl Config {
    /// Loads geofix.toml from the working directory.
    /// If it doesn't exist, creates a default one.
    pub fn load() -> Self {
        Self::load_from(CONFIG_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if let Ok(content) = fs::read_to_string(path) {
            match toml::from_str(&content) {
                Ok(config) => return config,
                Err(e) => {
                    warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    return Config::default();
                }
            }
        }

        let default_config = Config::default();

        // Save default config to disk for the user to edit later
        match toml::to_string_pretty(&default_config) {
            Ok(toml_string) => {
                if fs::write(path, toml_string).is_err() {
                    warn!("Could not write default {} to disk.", path.display());
                }
            }
            Err(e) => warn!("Could not serialize default config: {}", e),
        }

        info!("Loaded default configuration.");
        default_config
    }
}
