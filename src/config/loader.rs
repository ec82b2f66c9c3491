//! Configuration loader with tier-based merging.
//!
//! Tiers are merged field by field, lowest to highest:
//! embedded defaults, the project file, environment variables, then
//! overrides supplied by the caller (usually the CLI).

use super::merge::merge_tiers;
use super::types::PackagerConfig;
use crate::error::{IoResultExt, PackagerError, Result};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Project configuration file name, looked up in the project directory.
pub const PROJECT_CONFIG_FILE: &str = "packager.yaml";

/// Environment variables read by the environment tier, with the
/// configuration field each one sets.
pub const ENV_OVERRIDES: &[(&str, &str, &str)] = &[
    ("CONFIG_PACKAGER_BUILD_DIR", "paths", "build_dir"),
    ("CONFIG_PACKAGER_LOCAL_REPOSITORY", "paths", "local_repository"),
    ("CONFIG_PACKAGER_SERVER_ID", "deploy", "server_id"),
    ("CONFIG_PACKAGER_SERVERS_DIR", "deploy", "servers_dir"),
    ("CONFIG_PACKAGER_DEBOUNCE_MS", "watch", "debounce_ms"),
    ("CONFIG_PACKAGER_WATCH_COMMAND", "watch", "command"),
];

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    Defaults = 0,
    /// `packager.yaml` in the project directory, or an explicit file.
    Project = 1,
    Environment = 2,
    Overrides = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::Environment => write!(f, "environment"),
            ConfigTier::Overrides => write!(f, "overrides"),
        }
    }
}

/// Loads a [`PackagerConfig`] for one project directory.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    project_dir: PathBuf,
    explicit_file: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            explicit_file: None,
        }
    }

    /// Use `file` for the project tier instead of `packager.yaml`.
    pub fn with_config_file(mut self, file: Option<PathBuf>) -> Self {
        self.explicit_file = file;
        self
    }

    /// Path the project tier is read from.
    pub fn project_file(&self) -> PathBuf {
        match &self.explicit_file {
            Some(file) if file.is_absolute() => file.clone(),
            Some(file) => self.project_dir.join(file),
            None => self.project_dir.join(PROJECT_CONFIG_FILE),
        }
    }

    /// Load every tier, reading the process environment.
    pub fn load(&self, overrides: Value) -> Result<PackagerConfig> {
        self.load_with_env(overrides, |name| std::env::var(name).ok())
    }

    /// Load every tier with an injectable environment lookup.
    pub fn load_with_env(
        &self,
        overrides: Value,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<PackagerConfig> {
        let defaults = serde_json::to_value(PackagerConfig::default())
            .map_err(|e| PackagerError::config(format!("unable to encode defaults: {e}")))?;

        let tiers = [
            (ConfigTier::Defaults, defaults),
            (ConfigTier::Project, self.project_tier()?),
            (ConfigTier::Environment, env_tier(lookup)),
            (ConfigTier::Overrides, overrides),
        ];
        for (tier, value) in &tiers {
            if !value.is_null() {
                debug!("Applying {} configuration tier", tier);
            }
        }

        let merged = merge_tiers(tiers.into_iter().map(|(_, value)| value));
        serde_json::from_value(merged)
            .map_err(|e| PackagerError::config(format!("invalid configuration: {e}")))
    }

    fn project_tier(&self) -> Result<Value> {
        let file = self.project_file();
        if !file.is_file() {
            if self.explicit_file.is_some() {
                return Err(PackagerError::config(format!(
                    "configuration file {} does not exist",
                    file.display()
                )));
            }
            return Ok(Value::Null);
        }
        read_yaml_tier(&file)
    }
}

fn read_yaml_tier(file: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(file).at_path(file)?;
    if content.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_yaml::from_str::<Value>(&content).map_err(|e| PackagerError::parse(file, e))
}

/// Build the environment tier from `CONFIG_PACKAGER_*` variables.
fn env_tier(lookup: impl Fn(&str) -> Option<String>) -> Value {
    let mut sections: Map<String, Value> = Map::new();
    for (var, section, field) in ENV_OVERRIDES {
        let Some(raw) = lookup(var) else { continue };
        let value = match *field {
            "debounce_ms" => match raw.trim().parse::<u64>() {
                Ok(ms) => json!(ms),
                Err(_) => {
                    warn!("Ignoring {}={:?}: not a number of milliseconds", var, raw);
                    continue;
                }
            },
            _ => Value::String(raw),
        };
        let entry = sections
            .entry(section.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(fields) = entry {
            fields.insert(field.to_string(), value);
        }
    }
    if sections.is_empty() {
        Value::Null
    } else {
        Value::Object(sections)
    }
}
