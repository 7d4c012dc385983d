//! JSON configuration file schema
//!
//! Mirrors `datastores/config.json` key for key. Unknown keys are rejected so
//! typos surface at startup instead of silently falling back to defaults.

use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Top-level JSON configuration file schema
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Discord bot token
    #[serde(default, deserialize_with = "secret")]
    pub token: Option<SecretString>,

    /// Discord application ID, as a number or a numeric string
    #[serde(default, deserialize_with = "application_id")]
    pub application_id: Option<u64>,

    /// Refresh the plugin directory from the remote repository on startup
    #[serde(default, rename = "use_Git")]
    pub use_git: Option<bool>,

    /// Base URL of the remote plugin repository
    #[serde(default)]
    pub repo_url: Option<String>,

    /// Top-level folder name inside the downloaded archive (e.g. "plugins-main")
    #[serde(default)]
    pub repo_temp: Option<String>,

    /// `MySQL` connection settings
    #[serde(default)]
    pub database: Option<DatabaseFileConfig>,

    /// Local plugin directory
    #[serde(default)]
    pub plugin_dir: Option<PathBuf>,

    /// Scratch directory used while extracting the remote archive
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    /// Live status checker settings
    #[serde(default)]
    pub live: Option<LiveFileConfig>,
}

/// Database section
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    #[serde(default, deserialize_with = "secret")]
    pub password: Option<SecretString>,
    pub database: Option<String>,

    /// Presence text shown as "Playing <status>"
    pub status: Option<String>,

    /// Connection timeout in seconds
    pub connect_timeout_secs: Option<u64>,
}

/// Live status section
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LiveFileConfig {
    /// Room info endpoint queried with `uniqueId=<username>`
    pub api_url: Option<String>,
}

fn secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

fn application_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(id)) => Ok(Some(id)),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => text.trim().parse().map(Some).map_err(|_| {
            serde::de::Error::custom(format!("application_id is not an integer: {text:?}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn application_id_accepts_string_and_number() {
        let from_str: ConfigFile = serde_json::from_str(r#"{"application_id": "1234"}"#).unwrap();
        let from_num: ConfigFile = serde_json::from_str(r#"{"application_id": 1234}"#).unwrap();
        assert_eq!(from_str.application_id, Some(1234));
        assert_eq!(from_num.application_id, Some(1234));
    }

    #[test]
    fn application_id_rejects_garbage() {
        let err = serde_json::from_str::<ConfigFile>(r#"{"application_id": "abc"}"#).unwrap_err();
        assert!(err.to_string().contains("application_id"));
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = serde_json::from_str::<ConfigFile>(r#"{"tokn": "x"}"#).unwrap_err();
        assert!(err.to_string().contains("tokn"));
    }

    #[test]
    fn use_git_keeps_capitalised_key() {
        let file: ConfigFile = serde_json::from_str(r#"{"use_Git": true}"#).unwrap();
        assert_eq!(file.use_git, Some(true));
    }

    #[test]
    fn secrets_are_wrapped() {
        let file: ConfigFile = serde_json::from_str(
            r#"{"token": "abc", "database": {"password": "hunter2"}}"#,
        )
        .unwrap();
        assert_eq!(file.token.unwrap().expose_secret(), "abc");
        let db = file.database.unwrap();
        assert_eq!(db.password.unwrap().expose_secret(), "hunter2");
        assert!(!format!("{:?}", db.host).contains("hunter2"));
    }
}
