//! `MySQL` connection shared with plugins
//!
//! A small pool stands in for the single shared connection so plugins do not
//! contend on one socket. Statements run in autocommit mode, the server
//! default that sqlx leaves untouched.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::Connection;

use crate::config::DatabaseConfig;
use crate::{Error, Result};

/// Maximum pooled connections
const MAX_CONNECTIONS: u32 = 4;

/// Shared database handle
#[derive(Debug, Clone)]
pub struct Database {
    pool: MySqlPool,
}

impl Database {
    /// Connect to the configured database
    ///
    /// Makes a single attempt bounded by the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the server is unreachable or rejects the credentials
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = pool_options(config)
            .connect_with(connect_options(config))
            .await?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "database connected"
        );
        Ok(Self { pool })
    }

    /// Build a handle that connects on first use
    #[must_use]
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let pool = pool_options(config).connect_lazy_with(connect_options(config));
        Self { pool }
    }

    /// Underlying connection pool
    #[must_use]
    pub const fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Ping the server once
    ///
    /// # Errors
    ///
    /// Returns error if no connection can be acquired or the ping fails
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }

    /// Ping the server, retrying up to `attempts` times with `delay` between tries
    ///
    /// # Errors
    ///
    /// Returns the last ping error once all attempts are exhausted, or an
    /// error immediately when `attempts` is zero
    pub async fn reconnect(&self, attempts: u32, delay: Duration) -> Result<()> {
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.ping().await {
                Ok(()) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "database reconnected");
                    }
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(attempt, attempts, error = %e, "database ping failed");
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::Database("reconnect called with zero attempts".to_string())))
    }

    /// Close all pooled connections
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn pool_options(config: &DatabaseConfig) -> MySqlPoolOptions {
    MySqlPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(config.connect_timeout)
        .test_before_acquire(true)
}

fn connect_options(config: &DatabaseConfig) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user);

    if let Some(password) = &config.password {
        options = options.password(password.expose_secret());
    }
    if !config.database.is_empty() {
        options = options.database(&config.database);
    }

    options
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn unreachable_config() -> DatabaseConfig {
        DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "bot".to_string(),
            password: None,
            database: "botdb".to_string(),
            status: "Online".to_string(),
            connect_timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn reconnect_with_zero_attempts_fails_fast() {
        let db = Database::connect_lazy(&unreachable_config());
        let err = db.reconnect(0, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }

    #[tokio::test]
    async fn reconnect_gives_up_after_attempts() {
        let db = Database::connect_lazy(&unreachable_config());
        let delay = Duration::from_millis(50);

        let started = Instant::now();
        let err = db.reconnect(3, delay).await.unwrap_err();

        assert!(started.elapsed() >= delay * 2);
        assert!(matches!(err, Error::Sql(_)));
    }

    #[tokio::test]
    async fn single_attempt_does_not_sleep() {
        let db = Database::connect_lazy(&unreachable_config());
        let delay = Duration::from_secs(30);

        let started = Instant::now();
        let err = db.reconnect(1, delay).await.unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(matches!(err, Error::Sql(_)));
    }

    #[tokio::test]
    async fn connect_fails_for_unreachable_server() {
        let result = Database::connect(&unreachable_config()).await;
        assert!(result.is_err());
    }
}
