//! Radiator configuration.
//!
//! Loaded from `~/.radiator/config.toml`, or the file named by `RADIATOR_CONFIG`.
//! Every key is optional and a missing file means all defaults.
//! `RADIATOR_DATA_DIR` overrides `data-dir`.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;

/// Radiator configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Where state and investigations are kept.
    /// Defaults to `~/.radiator/data`.
    pub data_dir: Option<PathBuf>,

    /// Refs the radiator watches when `--branch` is not given.
    pub branches: Vec<String>,

    /// Statuses the radiator shows when `--status` is not given.
    pub statuses: Vec<String>,

    /// Statuses the current view shows when `--status` is not given.
    pub current_statuses: Vec<String>,

    /// Project exclusion regexes applied when `--project-filter` is not given.
    pub project_filters: Vec<String>,

    /// Default client refresh interval, in seconds.
    pub refresh: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            branches: vec!["master".into(), "develop".into()],
            statuses: vec!["failed".into()],
            current_statuses: vec!["running".into(), "pending".into()],
            project_filters: Vec::new(),
            refresh: 60,
        }
    }
}

impl Config {
    /// Load config, applying environment overrides.
    pub fn load() -> Result<Self, String> {
        let mut config = match Self::path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };

        if let Ok(dir) = env::var("RADIATOR_DATA_DIR")
            && !dir.is_empty()
        {
            config.data_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }

    /// Load config from a specific file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        toml::from_str(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// The config file path: `RADIATOR_CONFIG`, else `~/.radiator/config.toml`.
    pub fn path() -> Option<PathBuf> {
        if let Ok(path) = env::var("RADIATOR_CONFIG")
            && !path.is_empty()
        {
            return Some(PathBuf::from(path));
        }
        dirs::home_dir().map(|h| h.join(".radiator").join("config.toml"))
    }
}
