use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Root application configuration, loaded from `~/.config/talkscope/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub upstream: UpstreamConfig,
}

/// Where the curated dataset lives on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub events_dir: String,
    pub manifest_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_log_path: Option<String>,
    pub site_base: String,
}

/// The llvm-www repository the meeting pages are read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub repo: String,
    pub git_ref: String,
    pub github_api_base: String,
    pub raw_base: String,
    pub page_base: String,
    pub user_agent: String,
    pub github_token_env: String,
    pub min_interval_ms: u64,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for CatalogConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("talkscope");
        let events_dir = data_dir.join("devmtg").join("events");

        Self {
            manifest_path: events_dir.join("index.json").to_string_lossy().to_string(),
            events_dir: events_dir.to_string_lossy().to_string(),
            update_log_path: None,
            site_base: String::new(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            repo: "llvm/llvm-www".to_string(),
            git_ref: "main".to_string(),
            github_api_base: "https://api.github.com".to_string(),
            raw_base: "https://raw.githubusercontent.com".to_string(),
            page_base: "https://llvm.org/devmtg".to_string(),
            user_agent: format!("talkscope-devmtg-sync/{}", env!("CARGO_PKG_VERSION")),
            github_token_env: "GITHUB_TOKEN".to_string(),
            min_interval_ms: 250,
            max_retries: 3,
            timeout_secs: 40,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/talkscope/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("TALKSCOPE_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("talkscope")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    // ─── Derived paths ─────────────────────────────────────

    pub fn events_dir(&self) -> PathBuf {
        PathBuf::from(&self.catalog.events_dir)
    }

    pub fn manifest_path(&self) -> PathBuf {
        PathBuf::from(&self.catalog.manifest_path)
    }

    pub fn update_log_path(&self) -> Option<PathBuf> {
        self.catalog
            .update_log_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
    }

    /// GitHub token read from the configured environment variable, if set.
    pub fn github_token(&self) -> Option<String> {
        std::env::var(&self.upstream.github_token_env)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}
