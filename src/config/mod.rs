//! Configuration management for cogbot
//!
//! The JSON file is parsed into [`file::ConfigFile`] and then resolved into a
//! [`Config`] with defaults applied and cross-field rules checked. A missing
//! file is not an error: it resolves to [`Config::default`], which has no
//! token and therefore never starts the gateway.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use self::file::{ConfigFile, DatabaseFileConfig};
use crate::{Error, Result};

/// Default config file location, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "datastores/config.json";

/// Default local plugin directory
pub const DEFAULT_PLUGIN_DIR: &str = "functions";

/// Default scratch directory for archive extraction
pub const DEFAULT_STAGING_DIR: &str = "repository_contents";

/// Presence text used when the database section has no `status`
pub const DEFAULT_STATUS: &str = "Online";

/// Default TikTok room info endpoint
pub const DEFAULT_LIVE_API_URL: &str = "https://www.tiktok.com/api-live/user/room/";

const DEFAULT_MYSQL_PORT: u16 = 3306;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 6000;

/// Resolved bot configuration
#[derive(Debug)]
pub struct Config {
    /// Discord bot token; `None` (also for a blank string) means the bot must not start
    pub token: Option<SecretString>,

    /// Discord application ID (`None` when unset or zero)
    pub application_id: Option<u64>,

    /// Remote bundle sync settings, present only when enabled
    pub bundle: Option<BundleConfig>,

    /// Database settings, present only when the section exists
    pub database: Option<DatabaseConfig>,

    /// Local plugin directory
    pub plugin_dir: PathBuf,

    /// Scratch directory for archive extraction
    pub staging_dir: PathBuf,

    /// Live status checker settings
    pub live: LiveConfig,
}

/// Remote bundle sync configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleConfig {
    /// Repository base URL, without the archive suffix
    pub repo_url: String,

    /// Top-level folder inside the archive that holds `functions/`
    pub repo_temp: String,
}

/// `MySQL` connection configuration
#[derive(Debug)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<SecretString>,
    pub database: String,

    /// Presence text shown once the gateway is ready
    pub status: String,

    /// Timeout for establishing a connection
    pub connect_timeout: Duration,
}

/// Live status checker configuration
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// Room info endpoint
    pub api_url: String,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_LIVE_API_URL.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            application_id: None,
            bundle: None,
            database: None,
            plugin_dir: PathBuf::from(DEFAULT_PLUGIN_DIR),
            staging_dir: PathBuf::from(DEFAULT_STAGING_DIR),
            live: LiveConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// A missing file yields [`Config::default`] and a warning.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read, is not valid
    /// JSON, contains unknown keys, or fails validation
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(Error::Config(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        let config = Self::from_json(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;

        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse and resolve configuration from a JSON string
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed or fails validation
    pub fn from_json(content: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(content)?;
        Self::from_file(file)
    }

    /// Resolve a parsed file into a validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if cross-field rules are violated
    pub fn from_file(file: ConfigFile) -> Result<Self> {
        let bundle = resolve_bundle(
            file.use_git.unwrap_or(false),
            file.repo_url,
            file.repo_temp,
        )?;

        Ok(Self {
            token: file
                .token
                .filter(|t| !t.expose_secret().trim().is_empty()),
            application_id: file.application_id.filter(|id| *id != 0),
            bundle,
            database: file.database.map(DatabaseConfig::from_file),
            plugin_dir: file
                .plugin_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PLUGIN_DIR)),
            staging_dir: file
                .staging_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STAGING_DIR)),
            live: file
                .live
                .and_then(|l| l.api_url)
                .map_or_else(LiveConfig::default, |api_url| LiveConfig { api_url }),
        })
    }

    /// Presence text shown once the gateway is ready
    #[must_use]
    pub fn status(&self) -> &str {
        self.database
            .as_ref()
            .map_or(DEFAULT_STATUS, |db| db.status.as_str())
    }
}

fn resolve_bundle(
    enabled: bool,
    repo_url: Option<String>,
    repo_temp: Option<String>,
) -> Result<Option<BundleConfig>> {
    let repo_url = repo_url.unwrap_or_default();
    if !enabled || repo_url.trim().is_empty() {
        return Ok(None);
    }

    let parsed = url::Url::parse(&repo_url)
        .map_err(|e| Error::Config(format!("repo_url is not a valid URL: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "repo_url must be http or https, got {}",
            parsed.scheme()
        )));
    }

    let repo_temp = repo_temp
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Error::Config("use_Git is enabled but repo_temp is missing".to_string()))?;

    Ok(Some(BundleConfig {
        repo_url: repo_url.trim_end_matches('/').to_string(),
        repo_temp,
    }))
}

impl DatabaseConfig {
    fn from_file(file: DatabaseFileConfig) -> Self {
        Self {
            host: file.host.unwrap_or_default(),
            port: file.port.unwrap_or(DEFAULT_MYSQL_PORT),
            user: file.user.unwrap_or_default(),
            password: file.password,
            database: file.database.unwrap_or_default(),
            status: file.status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            connect_timeout: Duration::from_secs(
                file.connect_timeout_secs
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("nope.json")).unwrap();

        assert!(config.token.is_none());
        assert!(config.bundle.is_none());
        assert!(config.database.is_none());
        assert_eq!(config.plugin_dir, PathBuf::from(DEFAULT_PLUGIN_DIR));
        assert_eq!(config.status(), DEFAULT_STATUS);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn full_file_resolves() {
        let config = Config::from_json(
            r#"{
                "token": "abc",
                "application_id": "42",
                "use_Git": true,
                "repo_url": "https://github.com/org/plugins/",
                "repo_temp": "plugins-main",
                "database": {
                    "host": "db.local",
                    "user": "bot",
                    "password": "pw",
                    "database": "botdb",
                    "status": "with cogs"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.application_id, Some(42));
        assert_eq!(
            config.bundle,
            Some(BundleConfig {
                repo_url: "https://github.com/org/plugins".to_string(),
                repo_temp: "plugins-main".to_string(),
            })
        );
        let db = config.database.as_ref().unwrap();
        assert_eq!(db.host, "db.local");
        assert_eq!(db.port, 3306);
        assert_eq!(db.connect_timeout, Duration::from_secs(6000));
        assert_eq!(config.status(), "with cogs");
    }

    #[test]
    fn bundle_disabled_without_flag() {
        let config =
            Config::from_json(r#"{"repo_url": "https://example.com/r", "repo_temp": "r-main"}"#)
                .unwrap();
        assert!(config.bundle.is_none());
    }

    #[test]
    fn bundle_skipped_with_empty_url() {
        let config = Config::from_json(r#"{"use_Git": true, "repo_url": ""}"#).unwrap();
        assert!(config.bundle.is_none());
    }

    #[test]
    fn bundle_requires_repo_temp() {
        let err = Config::from_json(r#"{"use_Git": true, "repo_url": "https://example.com/r"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("repo_temp"));
    }

    #[test]
    fn bundle_rejects_non_http_url() {
        let err = Config::from_json(
            r#"{"use_Git": true, "repo_url": "ftp://example.com/r", "repo_temp": "r"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn blank_token_is_unset() {
        assert!(Config::from_json(r#"{"token": ""}"#).unwrap().token.is_none());
        assert!(Config::from_json(r#"{"token": "  "}"#).unwrap().token.is_none());
        assert!(Config::from_json(r#"{"token": "t"}"#).unwrap().token.is_some());
    }

    #[test]
    fn zero_application_id_is_unset() {
        let config = Config::from_json(r#"{"application_id": 0}"#).unwrap();
        assert!(config.application_id.is_none());
    }
}
