//! Configuration file management for grub.
//!
//! Provides a TOML-based config file at `~/.config/grub/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use grub_core::completion::{
    CompletionClient, CompletionConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAiClient,
};
use grub_db::config::DbConfig;

pub const ENV_BASE_URL: &str = "GRUB_COMPLETION_BASE_URL";
pub const ENV_MODEL: &str = "GRUB_COMPLETION_MODEL";
pub const ENV_API_KEY: &str = "GRUB_COMPLETION_API_KEY";
pub const ENV_API_KEY_FALLBACK: &str = "OPENAI_API_KEY";
pub const ENV_PORT: &str = "PORT";

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub completion: CompletionSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CompletionSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_backoff_ms: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the grub config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/grub` or `~/.config/grub`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("grub");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("grub")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// The file may hold an API key, so it is made owner-only on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Where the HTTP server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct GrubConfig {
    pub db_config: DbConfig,
    pub completion: CompletionConfig,
    pub server: ServerConfig,
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl GrubConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `GRUB_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - Completion: `GRUB_COMPLETION_*` env (API key also `OPENAI_API_KEY`) > `[completion]` > defaults
    /// - Server: `PORT` env > `[server]` > `0.0.0.0:3000`; `serve` flags are applied on top
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();
        let completion_file = file_config.as_ref().map(|c| &c.completion);
        let server_file = file_config.as_ref().map(|c| &c.server);

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Some(url) = env_nonempty(DbConfig::ENV_VAR) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };

        let base_url = env_nonempty(ENV_BASE_URL)
            .or_else(|| completion_file.and_then(|c| c.base_url.clone()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = env_nonempty(ENV_API_KEY)
            .or_else(|| env_nonempty(ENV_API_KEY_FALLBACK))
            .or_else(|| completion_file.and_then(|c| c.api_key.clone()));

        let mut completion = CompletionConfig::new(base_url, api_key);
        completion.default_model = env_nonempty(ENV_MODEL)
            .or_else(|| completion_file.and_then(|c| c.model.clone()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        if let Some(secs) = completion_file.and_then(|c| c.timeout_secs) {
            completion.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = completion_file.and_then(|c| c.max_retries) {
            completion.max_retries = retries;
        }
        if let Some(ms) = completion_file.and_then(|c| c.retry_backoff_ms) {
            completion.retry_backoff = Duration::from_millis(ms);
        }

        let port = match env_nonempty(ENV_PORT) {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_PORT} is not a valid port: {raw:?}"))?,
            None => server_file.and_then(|s| s.port).unwrap_or(DEFAULT_PORT),
        };
        let bind = server_file
            .and_then(|s| s.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        Ok(Self {
            db_config: DbConfig::new(db_url),
            completion,
            server: ServerConfig { bind, port },
        })
    }

    /// Build the completion client. Only commands that call the service need
    /// this, so a missing API key is reported here rather than in `resolve`.
    pub fn completion_client(&self) -> Result<Arc<dyn CompletionClient>> {
        if self.completion.api_key.is_none() && self.completion.base_url == DEFAULT_BASE_URL {
            bail!(
                "completion API key not found; set {ENV_API_KEY} (or {ENV_API_KEY_FALLBACK}) \
                 or add api_key under [completion] in {}",
                config_path().display()
            );
        }
        let client = OpenAiClient::new(self.completion.clone())
            .context("failed to build completion client")?;
        Ok(Arc::new(client))
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
