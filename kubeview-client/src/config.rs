//! User settings: `$XDG_CONFIG_HOME/kubeview/config.yaml` overlaid by flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::cmd::log_session::LogSettings;

pub const CONFIG_DIR: &str = "kubeview";
pub const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config {}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Live terminal view of cluster resources and their logs.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "kubeview", version, about)]
pub struct Cli {
    /// Resource to open with, e.g. `pods`, `deploy`, `crds`.
    pub resource: Option<String>,

    /// Kubeconfig context to use.
    #[arg(long)]
    pub context: Option<String>,

    #[arg(short, long)]
    pub namespace: Option<String>,

    #[arg(short = 'A', long, conflicts_with = "namespace")]
    pub all_namespaces: bool,

    /// Seconds between refreshes.
    #[arg(long)]
    pub refresh: Option<u64>,

    #[arg(long, env = "KUBEVIEW_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub refresh_rate_secs: u64,
    pub log_buffer_size: usize,
    pub log_flush_ms: u64,
    pub log_tail_lines: i64,
    pub log_scrollback: usize,
    /// `None` uses the context's default namespace, `all` every namespace.
    pub namespace: Option<String>,
    pub context: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
    pub resource: String,
    pub otlp_endpoint: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_rate_secs: 2,
            log_buffer_size: 100,
            log_flush_ms: 200,
            log_tail_lines: 100,
            log_scrollback: 5000,
            namespace: None,
            context: None,
            log_dir: None,
            log_level: "info".into(),
            resource: "pods".into(),
            otlp_endpoint: "http://localhost:4317".into(),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Reads `path`, or the default location when `None`. A missing file
    /// yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Ok(Self::default());
        };

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        Self::from_yaml(&raw).map_err(|source| ConfigError::Yaml { path, source })
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Command-line flags win over the file.
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(resource) = &cli.resource {
            self.resource = resource.clone();
        }
        if let Some(context) = &cli.context {
            self.context = Some(context.clone());
        }
        if cli.all_namespaces {
            self.namespace = Some("all".into());
        } else if let Some(ns) = &cli.namespace {
            self.namespace = Some(ns.clone());
        }
        if let Some(secs) = cli.refresh {
            self.refresh_rate_secs = secs;
        }
        if let Some(dir) = &cli.log_dir {
            self.log_dir = Some(dir.clone());
        }
        self
    }

    pub fn refresh_rate(&self) -> Duration {
        Duration::from_secs(self.refresh_rate_secs.max(1))
    }

    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            capacity: self.log_buffer_size.max(1),
            period: Duration::from_millis(self.log_flush_ms.max(10)),
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn tail_lines(&self) -> Option<i64> {
        (self.log_tail_lines > 0).then_some(self.log_tail_lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg = Config::from_yaml("refreshRateSecs: 9\nlog_buffer_size: 10\n").expect("yaml");
        assert_eq!(cfg.log_buffer_size, 10);
        assert_eq!(cfg.refresh_rate_secs, 2);
        assert_eq!(cfg.log_flush_ms, 200);
        assert_eq!(cfg.resource, "pods");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("").expect("yaml"), Config::default());
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        assert!(Config::from_yaml("log_buffer_size: [1, 2]").is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let path = std::env::temp_dir()
            .join(format!("kubeview-test-{}", std::process::id()))
            .join(CONFIG_FILE);
        assert_eq!(Config::load(Some(&path)).expect("load"), Config::default());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from(["kubeview", "deploy", "-n", "prod", "--refresh", "5"]);
        let cfg = Config::default().with_overrides(&cli);
        assert_eq!(cfg.resource, "deploy");
        assert_eq!(cfg.namespace.as_deref(), Some("prod"));
        assert_eq!(cfg.refresh_rate(), Duration::from_secs(5));

        let cli = Cli::parse_from(["kubeview", "-A"]);
        let cfg = Config::default().with_overrides(&cli);
        assert_eq!(cfg.namespace.as_deref(), Some("all"));
    }

    #[test]
    fn test_log_settings() {
        let cfg = Config {
            log_buffer_size: 0,
            log_flush_ms: 250,
            ..Config::default()
        };
        let settings = cfg.log_settings();
        assert_eq!(settings.capacity, 1);
        assert_eq!(settings.period, Duration::from_millis(250));
    }
}
