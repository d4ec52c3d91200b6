use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::dim::{Registry, UnitError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Unit '{name}' could not be defined: {source}")]
    Definition { name: String, source: UnitError },
}

/// Example:
///
/// ```toml
/// [units]
/// furlong = "660 ft"
/// fortnight = "14 day"
/// fpf = "furlong/fortnight"
///
/// [output]
/// units = ["m/s"]
/// json = false
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    // User unit definitions, name -> spec
    #[serde(default)]
    pub units: BTreeMap<String, String>,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    // Default for --unit
    #[serde(default)]
    pub units: Vec<String>,

    #[serde(default)]
    pub json: bool,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content)
    }

    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Define the configured units in `registry`, skipping entries that fail.
    ///
    /// Definitions may refer to each other in any order. Returns the skipped entries.
    pub fn apply(&self, registry: &mut Registry) -> Vec<ConfigError> {
        let mut pending: Vec<(&String, &String)> = self.units.iter().collect();
        let mut skipped = Vec::new();

        loop {
            let before = pending.len();
            let mut waiting = Vec::new();
            for (name, spec) in pending {
                match registry.define(name, spec) {
                    Ok(def) => debug!(unit = %name, spec = %spec, dims = %def.dims, "defined unit from config"),
                    // may depend on a definition not made yet
                    Err(UnitError::UnknownUnit(_)) => waiting.push((name, spec)),
                    Err(source) => skipped.push(ConfigError::Definition {
                        name: name.clone(),
                        source,
                    }),
                }
            }
            pending = waiting;
            if pending.is_empty() || pending.len() == before {
                break;
            }
        }

        for (name, spec) in pending {
            if let Err(source) = registry.define(name, spec) {
                skipped.push(ConfigError::Definition {
                    name: name.clone(),
                    source,
                });
            }
        }

        for e in &skipped {
            warn!("skipping config entry: {}", e);
        }
        skipped
    }
}
