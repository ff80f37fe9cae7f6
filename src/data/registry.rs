//! Dataset registry: where each generated file lives and when it was last produced.
//! Written by `convert` and `builds`; lets downstream tooling show "data as of".

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSetEntry {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    pub path: String,
}

pub type Registry = BTreeMap<String, DataSetEntry>;

pub const DEFAULT_REGISTRY_PATH: &str = "data/registry.json";

/// Missing file is an empty registry.
pub fn load_registry(path: &Path) -> Result<Registry> {
    if !path.exists() {
        return Ok(Registry::new());
    }
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn save_registry(path: &Path, registry: &Registry) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(registry)?)?;
    Ok(())
}

/// Insert or replace one dataset entry, stamped with today's UTC date.
pub fn record_dataset(
    registry_path: &Path,
    name: &str,
    source: &Path,
    output: &Path,
    rows: usize,
) -> Result<()> {
    let mut registry = load_registry(registry_path)?;
    registry.insert(
        name.to_string(),
        DataSetEntry {
            source: source.display().to_string(),
            rows: Some(rows),
            last_updated: Some(chrono::Utc::now().format("%Y-%m-%d").to_string()),
            path: output.display().to_string(),
        },
    );
    save_registry(registry_path, &registry)?;
    tracing::info!(registry = %registry_path.display(), dataset = name, "registry updated");
    Ok(())
}
