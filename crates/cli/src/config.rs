//! Configuration file loading
//!
//! Every key is optional; anything left out falls back to the defaults
//! below. Relative paths resolve against `base_dir`.

use anyhow::{Context, Result};
use hostwatch_journal::ReportPaths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Environment variable naming an alternative config file
pub const CONFIG_ENV: &str = "HOSTWATCH_CONFIG";

/// Allowed range for `watch.interval_secs`
pub const WATCH_INTERVAL_RANGE: std::ops::RangeInclusive<u64> = 1..=3600;

/// Allowed range for `sampler.interval_secs`
pub const SAMPLER_INTERVAL_RANGE: std::ops::RangeInclusive<u64> = 1..=86400;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be between {min} and {max} (got {value})")]
    OutOfRange {
        key: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("{key} must not be empty")]
    EmptyPath { key: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory that relative paths below resolve against
    pub base_dir: PathBuf,
    pub watch: WatchConfig,
    pub sampler: SamplerConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Directory to monitor (created if absent)
    pub root: PathBuf,
    /// Seconds between poll cycles
    pub interval_secs: u64,
    /// Change-event log
    pub log: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplerConfig {
    pub enabled: bool,
    /// Seconds between samples
    pub interval_secs: u64,
    /// Resource-metrics log
    pub log: PathBuf,
    /// Mount point whose usage is sampled
    pub disk_mount: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub path: PathBuf,
    /// Number of recent events listed in the report
    pub latest_events: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            watch: WatchConfig::default(),
            sampler: SamplerConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("monitored"),
            interval_secs: 2,
            log: PathBuf::from("output/logs/directory_events.csv"),
        }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 15,
            log: PathBuf::from("output/logs/system_metrics.csv"),
            disk_mount: PathBuf::from("/"),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("output/reports/final_report.txt"),
            latest_events: 5,
        }
    }
}

/// Fully resolved filesystem locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub watch_root: PathBuf,
    pub events_log: PathBuf,
    pub metrics_log: PathBuf,
    pub report: PathBuf,
}

impl ResolvedPaths {
    pub fn report_paths(&self) -> ReportPaths {
        ReportPaths {
            events_log: self.events_log.clone(),
            metrics_log: self.metrics_log.clone(),
            report: self.report.clone(),
        }
    }
}

impl Config {
    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "watch.interval_secs",
            self.watch.interval_secs,
            &WATCH_INTERVAL_RANGE,
        )?;
        check_range(
            "sampler.interval_secs",
            self.sampler.interval_secs,
            &SAMPLER_INTERVAL_RANGE,
        )?;

        for (key, path) in [
            ("watch.root", &self.watch.root),
            ("watch.log", &self.watch.log),
            ("sampler.log", &self.sampler.log),
            ("report.path", &self.report.path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::EmptyPath { key });
            }
        }

        Ok(())
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_secs(self.watch.interval_secs)
    }

    pub fn sampler_interval(&self) -> Duration {
        Duration::from_secs(self.sampler.interval_secs)
    }

    /// Resolve every configured path against `base_dir`
    pub fn paths(&self) -> ResolvedPaths {
        ResolvedPaths {
            watch_root: self.resolve(&self.watch.root),
            events_log: self.resolve(&self.watch.log),
            metrics_log: self.resolve(&self.sampler.log),
            report: self.resolve(&self.report.path),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

fn check_range(
    key: &'static str,
    value: u64,
    range: &std::ops::RangeInclusive<u64>,
) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            key,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// Default config location: `<config_dir>/hostwatch/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hostwatch").join("config.toml"))
}

/// Pick the config file: explicit flag, then `$HOSTWATCH_CONFIG`, then the default location
pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .or_else(config_file_path)
}

/// Load and validate the configuration.
///
/// Returns the config together with the file it came from, if any.
pub fn load(explicit: Option<&Path>) -> Result<(Config, Option<PathBuf>)> {
    let Some(path) = locate(explicit) else {
        debug!("No config location available, using defaults");
        return Ok((Config::default(), None));
    };

    if !path.exists() {
        debug!("No config file at {}, using defaults", path.display());
        return Ok((Config::default(), None));
    }

    let config = load_from(&path)?;
    Ok((config, Some(path)))
}

/// Parse and validate one config file
pub fn load_from(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: Config = toml::from_str(&text)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Commented example configuration listing every key with its default
pub fn example_config() -> String {
    let defaults = Config::default();
    format!(
        r#"# hostwatch configuration
# Every key is optional. Relative paths resolve against base_dir.

base_dir = "{base_dir}"

[watch]
# Directory to monitor (created if absent)
root = "{watch_root}"
# Seconds between poll cycles ({watch_min}-{watch_max})
interval_secs = {watch_interval}
log = "{watch_log}"

[sampler]
enabled = {sampler_enabled}
# Seconds between resource samples ({sampler_min}-{sampler_max})
interval_secs = {sampler_interval}
log = "{sampler_log}"
# Mount point whose disk usage is sampled
disk_mount = "{disk_mount}"

[report]
path = "{report_path}"
# Number of recent events listed in the report
latest_events = {latest_events}
"#,
        base_dir = defaults.base_dir.display(),
        watch_root = defaults.watch.root.display(),
        watch_min = WATCH_INTERVAL_RANGE.start(),
        watch_max = WATCH_INTERVAL_RANGE.end(),
        watch_interval = defaults.watch.interval_secs,
        watch_log = defaults.watch.log.display(),
        sampler_enabled = defaults.sampler.enabled,
        sampler_min = SAMPLER_INTERVAL_RANGE.start(),
        sampler_max = SAMPLER_INTERVAL_RANGE.end(),
        sampler_interval = defaults.sampler.interval_secs,
        sampler_log = defaults.sampler.log.display(),
        disk_mount = defaults.sampler.disk_mount.display(),
        report_path = defaults.report.path.display(),
        latest_events = defaults.report.latest_events,
    )
}
