//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{GaugeError, Result};
use crate::size::humanize::{DEFAULT_PRECISION, MAX_PRECISION};
use crate::size::unit::SizeBase;
use crate::usage::severity::DEFAULT_CRITICAL_ABOVE_PCT;

/// Full usage_gauge configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub humanize: HumanizeConfig,
    pub usage: UsageConfig,
    pub log: LogConfig,
    pub paths: PathsConfig,
}

/// Unit scale and display rounding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HumanizeConfig {
    pub base: SizeBase,
    /// Decimal places kept in display values.
    pub precision: u8,
}

/// Usage ratio and alarm tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UsageConfig {
    /// Percentages strictly above this are `Critical`.
    pub critical_above_pct: u8,
}

/// JSONL activity-log rotation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
    pub fallback_path: Option<PathBuf>,
}

/// Filesystem paths used by ugauge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub jsonl_log: PathBuf,
}

impl Default for HumanizeConfig {
    fn default() -> Self {
        Self {
            base: SizeBase::Decimal,
            precision: DEFAULT_PRECISION,
        }
    }
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            critical_above_pct: DEFAULT_CRITICAL_ABOVE_PCT,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
            fallback_path: None,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!("[UG-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        Self {
            config_file: home_dir.join(".config").join("ugauge").join("config.toml"),
            jsonl_log: home_dir
                .join(".local")
                .join("share")
                .join("ugauge")
                .join("activity.jsonl"),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| GaugeError::Io {
                path: path_buf.clone(),
                source,
            })?;
            toml::from_str::<Self>(&raw)?
        } else if path.is_some() {
            return Err(GaugeError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for log correlation.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    /// Render the effective config as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|error| GaugeError::Serialization {
            context: "toml",
            details: error.to_string(),
        })
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("UG_HUMANIZE_BASE") {
            self.humanize.base = raw.parse().map_err(|_| GaugeError::ConfigParse {
                context: "env",
                details: format!("UG_HUMANIZE_BASE={raw:?}: expected decimal or binary"),
            })?;
        }
        if let Some(raw) = lookup("UG_HUMANIZE_PRECISION") {
            self.humanize.precision = parse_env_u8("UG_HUMANIZE_PRECISION", &raw)?;
        }
        if let Some(raw) = lookup("UG_USAGE_CRITICAL_ABOVE_PCT") {
            self.usage.critical_above_pct = parse_env_u8("UG_USAGE_CRITICAL_ABOVE_PCT", &raw)?;
        }
        if let Some(raw) = lookup("UG_PATHS_JSONL_LOG") {
            self.paths.jsonl_log = PathBuf::from(raw);
        }
        Ok(())
    }

    /// Reject out-of-range knobs; run after every override layer.
    pub fn validate(&self) -> Result<()> {
        if self.humanize.precision > MAX_PRECISION {
            return Err(GaugeError::InvalidConfig {
                details: format!(
                    "humanize.precision must be in [0, {MAX_PRECISION}], got {}",
                    self.humanize.precision
                ),
            });
        }

        if self.usage.critical_above_pct > 100 {
            return Err(GaugeError::InvalidConfig {
                details: format!(
                    "usage.critical_above_pct must be in [0, 100], got {}",
                    self.usage.critical_above_pct
                ),
            });
        }

        if self.log.max_size_bytes == 0 || self.log.max_rotated_files == 0 {
            return Err(GaugeError::InvalidConfig {
                details: "log.max_size_bytes and log.max_rotated_files must be > 0".to_string(),
            });
        }

        if self.paths.jsonl_log.as_os_str().is_empty() {
            return Err(GaugeError::InvalidConfig {
                details: "paths.jsonl_log must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_u8(name: &str, raw: &str) -> Result<u8> {
    raw.trim()
        .parse::<u8>()
        .map_err(|error| GaugeError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}
