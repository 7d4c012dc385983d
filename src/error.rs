//! Error types for cogbot

use thiserror::Error;

/// Result type alias for cogbot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while starting or running the bot
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Remote bundle download or installation error
    #[error("bundle error: {0}")]
    Bundle(String),

    /// Plugin construction or registration error
    #[error("plugin error: {0}")]
    Plugin(String),

    /// Live status lookup error
    #[error("live status error: {0}")]
    LiveStatus(String),

    /// Gateway used out of order, e.g. served before it was connected
    #[error("gateway error: {0}")]
    Gateway(String),

    /// Database error not raised by the driver itself
    #[error("database error: {0}")]
    Database(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// `MySQL` driver error
    #[error("sql error: {0}")]
    Sql(#[from] sqlx::Error),

    /// Discord gateway or REST error
    #[error("discord error: {0}")]
    Discord(#[from] Box<serenity::Error>),

    /// ZIP archive error
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl From<serenity::Error> for Error {
    fn from(e: serenity::Error) -> Self {
        Self::Discord(Box::new(e))
    }
}
