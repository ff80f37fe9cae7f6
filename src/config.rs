//! Runtime settings: defaults, then `starforge.yaml` (or `--config`), then `STARFORGE_*`
//! environment variables. Command-line flags are applied last by the CLI.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::convert::{ConvertOptions, DEFAULT_OUTPUT_PATH};
use crate::data::lookup::{DEFAULT_ALIASES_PATH, DEFAULT_NICKNAMES_PATH};
use crate::data::registry::DEFAULT_REGISTRY_PATH;
use crate::data::tournament::DEFAULT_TOURNAMENT_PATH;
use crate::error::{Result, StarforgeError};

pub const DEFAULT_CONFIG_PATH: &str = "starforge.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub aliases_path: PathBuf,
    pub nicknames_path: PathBuf,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// 0 = all cores.
    pub workers: usize,
    pub progress_step_percent: usize,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub registry_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            aliases_path: PathBuf::from(DEFAULT_ALIASES_PATH),
            nicknames_path: PathBuf::from(DEFAULT_NICKNAMES_PATH),
            input_path: PathBuf::from(DEFAULT_TOURNAMENT_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            workers: 0,
            progress_step_percent: 5,
            log_level: "info".to_string(),
            log_file: None,
            registry_path: Some(PathBuf::from(DEFAULT_REGISTRY_PATH)),
        }
    }
}

impl Settings {
    /// An explicit path must exist; the default path is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut settings = match explicit {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        settings.apply_env(|key| env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| StarforgeError::Config {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::from_yaml_str(&raw, &path.display().to_string())
    }

    pub fn from_yaml_str(raw: &str, source: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|err| StarforgeError::Config {
            path: source.to_string(),
            message: err.to_string(),
        })
    }

    /// `lookup` is injected so tests need not touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("STARFORGE_ALIASES") {
            self.aliases_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("STARFORGE_NICKNAMES") {
            self.nicknames_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("STARFORGE_WORKERS") {
            self.workers = value.trim().parse().map_err(|_| StarforgeError::Config {
                path: "STARFORGE_WORKERS".to_string(),
                message: format!("expected a non-negative integer, got '{value}'"),
            })?;
        }
        if let Some(value) = lookup("STARFORGE_LOG_LEVEL") {
            self.log_level = value;
        }
        if let Some(value) = lookup("STARFORGE_LOG_FILE") {
            self.log_file = (!value.trim().is_empty()).then(|| PathBuf::from(value));
        }
        Ok(())
    }

    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            input: self.input_path.clone(),
            output: self.output_path.clone(),
            workers: self.workers,
            progress_step_percent: self.progress_step_percent,
            registry_path: self.registry_path.clone(),
        }
    }
}
