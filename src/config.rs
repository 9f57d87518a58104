use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_LEVEL: &str = "info";

const CONFIG_FILE_NAME: &str = "config.toml";

pub const ENV_CONFIG: &str = "GRADEBOOKD_CONFIG";
pub const ENV_API_URL: &str = "GRADEBOOKD_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "GRADEBOOKD_TIMEOUT_SECS";
pub const ENV_WORKSPACE: &str = "GRADEBOOKD_WORKSPACE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the REST collaborator, including the `/api` prefix.
    pub base_url: String,
    /// Per-request transport timeout; 0 disables it.
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// env_logger filter (error, warn, info, debug, trace)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Workspace opened at startup for the session store.
    pub workspace: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// `<config dir>/gradebookd`, e.g. `~/.config/gradebookd` on Linux.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gradebookd")
    }

    pub fn default_path() -> PathBuf {
        std::env::var_os(ENV_CONFIG)
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load_file(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(s) => Self::from_toml(&s)
                .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// File settings with environment overrides applied on top.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = Self::load_file(&Self::default_path())?;
        cfg.apply_overrides(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    pub fn apply_overrides<F>(&mut self, get: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = get(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.remote.base_url = url.trim().to_string();
        }
        if let Some(secs) = get(ENV_TIMEOUT_SECS).filter(|v| !v.trim().is_empty()) {
            self.remote.timeout_secs = secs
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("{ENV_TIMEOUT_SECS} must be a whole number"))?;
        }
        if let Some(ws) = get(ENV_WORKSPACE).filter(|v| !v.trim().is_empty()) {
            self.storage.workspace = Some(PathBuf::from(ws));
        }
        Ok(())
    }
}
