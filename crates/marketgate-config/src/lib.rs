//! Optional `.marketgate.toml` loader.
//!
//! Covers the *locations* the CLI reads from and writes to, and the clone
//! timeout. It deliberately has no fields for the hard resource caps
//! (`MAX_FILE_SIZE`, `MAX_REPO_SIZE`, `MAX_FILES`) — those are module
//! constants in `marketgate-walker` and are not configurable from here, by
//! construction: there is nowhere in this struct to put them, and unknown
//! keys in the TOML file (including ones named after those constants) are
//! silently ignored rather than honored.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = ".marketgate.toml";

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct IndexConfig {
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogConfig {
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CloneConfig {
    timeout_secs: Option<u64>,
}

/// Complete marketgate configuration. All fields optional; absent fields
/// fall back to the CLI's own defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    index: IndexConfig,
    #[serde(default)]
    catalog: CatalogConfig,
    #[serde(default)]
    clone: CloneConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index_path(&self) -> Option<&Path> {
        self.index.path.as_deref()
    }

    pub fn catalog_output(&self) -> Option<&Path> {
        self.catalog.output.as_deref()
    }

    pub fn clone_timeout(&self) -> Option<Duration> {
        self.clone.timeout_secs.map(Duration::from_secs)
    }

    /// Merge with `other`, which takes precedence field-by-field. Used so
    /// CLI flags can override a config-file value without discarding the
    /// rest of the file.
    pub fn merge(&self, other: &Config) -> Config {
        Config {
            index: IndexConfig {
                path: other.index.path.clone().or_else(|| self.index.path.clone()),
            },
            catalog: CatalogConfig {
                output: other.catalog.output.clone().or_else(|| self.catalog.output.clone()),
            },
            clone: CloneConfig {
                timeout_secs: other.clone.timeout_secs.or(self.clone.timeout_secs),
            },
        }
    }
}

/// Load `.marketgate.toml` from `dir`. A missing file yields
/// [`Config::default`]; a present-but-malformed file is an error.
pub fn load_config(dir: &Path) -> Result<Config> {
    let path = config_path(dir);
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}
