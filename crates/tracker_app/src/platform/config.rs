use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracker_engine::ApiSettings;

use super::cli::Cli;
use super::logging::LogDestination;

const DEFAULT_CONFIG: &str = "./vtrack.ron";

/// Client settings, read from RON and overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server: String,
    pub upload_field: String,
    pub interval_ms: u64,
    pub connect_timeout_secs: u64,
    /// No timeout on status requests unless set.
    pub request_timeout_secs: Option<u64>,
    pub max_artifact_mb: u64,
    pub download_dir: Option<PathBuf>,
    pub html_report: Option<PathBuf>,
    /// Where `.vtrack_state.ron` is kept.
    pub state_dir: PathBuf,
    pub log: LogDestination,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let api = ApiSettings::default();
        Self {
            server: api.base_url,
            upload_field: api.upload_field,
            interval_ms: api.poll_interval.as_millis() as u64,
            connect_timeout_secs: api.connect_timeout.as_secs(),
            request_timeout_secs: api.request_timeout.map(|timeout| timeout.as_secs()),
            max_artifact_mb: api.max_artifact_bytes / (1024 * 1024),
            download_dir: None,
            html_report: None,
            state_dir: PathBuf::from("."),
            log: LogDestination::File,
        }
    }
}

impl ClientConfig {
    /// An explicit path must exist; the default path is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = ron::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) -> Result<()> {
        if let Some(server) = &cli.server {
            self.server = server.clone();
        }
        if let Some(interval_ms) = cli.interval_ms {
            self.interval_ms = interval_ms;
        }
        if let Some(dir) = &cli.download_dir {
            self.download_dir = Some(dir.clone());
        }
        if let Some(report) = &cli.html_report {
            self.html_report = Some(report.clone());
        }
        if let Some(log) = cli.log {
            self.log = log;
        }
        self.validate()
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.server.clone(),
            upload_field: self.upload_field.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            poll_interval: Duration::from_millis(self.interval_ms),
            max_artifact_bytes: self.max_artifact_mb.saturating_mul(1024 * 1024),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            bail!("interval_ms must be greater than zero");
        }
        if self.upload_field.trim().is_empty() {
            bail!("upload_field must not be empty");
        }
        Ok(())
    }
}
