// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "places";
const CONFIG_FILE: &str = "config.toml";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LoggingLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub log_level: LoggingLevel,
    /// Also write logs to this file
    pub log_file: Option<PathBuf>,
    pub settings_path: PathBuf,
    /// JSON object holding centrally managed policy keys
    pub policy_path: Option<PathBuf>,
    pub smb_integration: bool,
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LoggingLevel::Info,
            log_file: None,
            settings_path: config_dir().join(SETTINGS_FILE),
            policy_path: None,
            smb_integration: false,
            poll_interval_ms: 1000,
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(APP_DIR)
}

pub fn default_config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

impl Config {
    /// Read the config at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading config {}", path.display()));
            }
        };
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load(&dir.path().join("config.toml")).expect("load");
        assert_eq!(config, Config::default());
        assert!(config.settings_path.ends_with("places/settings.json"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "log_level = \"debug\"\nsmb_integration = true\npolicy_path = \"/etc/places/policy.json\"\n",
        )
        .expect("write config");

        let config = Config::load(&path).expect("load");
        assert_eq!(config.log_level, LoggingLevel::Debug);
        assert!(config.smb_integration);
        assert_eq!(config.policy_path, Some(PathBuf::from("/etc/places/policy.json")));
        assert_eq!(config.poll_interval_ms, 1000);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "log_level = [").expect("write config");
        assert!(Config::load(&path).is_err());
    }
}
