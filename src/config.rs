use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no hosts to monitor")]
    NoTargets,

    #[error("file {} not found", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Unreadable { path: PathBuf, source: io::Error },
}

/// Startup configuration. Built once from the command line and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Hosts in display order. Duplicates are kept as separate rows.
    pub targets: Vec<String>,
    pub interval: Duration,
    pub probe_timeout: Duration,
}

pub fn default_interval() -> Duration {
    Duration::from_secs(DEFAULT_INTERVAL_SECS)
}

impl MonitorConfig {
    pub fn new(targets: Vec<String>, interval: Duration) -> Result<Self, ConfigError> {
        if targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        Ok(Self {
            targets,
            interval,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        })
    }

    /// Resolves the positional arguments into a configuration.
    ///
    /// `pings FILE [INTERVAL]` reads hosts from a file when the first argument
    /// exists on disk. Otherwise every argument is a host, except that a trailing
    /// integer (with at least one host before it) is taken as the interval.
    pub fn from_args(args: Vec<String>) -> Result<Self, ConfigError> {
        let Some(first) = args.first() else {
            return Err(ConfigError::NoTargets);
        };

        let path = Path::new(first);
        if path.exists() {
            let targets = load_targets(path)?;
            let interval = args
                .get(1)
                .and_then(|raw| parse_interval(raw))
                .unwrap_or_else(default_interval);
            if args.len() > 2 {
                warn!("Ignoring {} extra argument(s) after interval", args.len() - 2);
            }
            info!("Loaded {} host(s) from {}", targets.len(), path.display());
            return Self::new(targets, interval);
        }

        if looks_like_path(first) {
            return Err(ConfigError::FileNotFound { path: path.to_path_buf() });
        }

        let mut targets = args;
        let mut interval = default_interval();
        if targets.len() > 1 {
            if let Some(last) = targets.last().and_then(|raw| raw.parse::<i64>().ok()) {
                targets.pop();
                interval = positive_secs(last).unwrap_or_else(default_interval);
            }
        }
        targets.retain(|t| !t.trim().is_empty());
        Self::new(targets, interval)
    }
}

/// Parses an interval in whole seconds. Non-positive or non-numeric input yields `None`.
pub fn parse_interval(raw: &str) -> Option<Duration> {
    raw.parse::<i64>().ok().and_then(positive_secs)
}

fn positive_secs(secs: i64) -> Option<Duration> {
    u64::try_from(secs).ok().filter(|s| *s > 0).map(Duration::from_secs)
}

fn looks_like_path(arg: &str) -> bool {
    arg.contains('/') || arg.contains(std::path::MAIN_SEPARATOR)
}

/// Reads one host per line; surrounding whitespace is trimmed and blank lines skipped.
pub fn load_targets(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ConfigError::FileNotFound { path: path.to_path_buf() },
        _ => ConfigError::Unreadable { path: path.to_path_buf(), source },
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}
