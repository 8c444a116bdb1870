use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::SessionError;

const TOKEN_KEY: &str = "access_token";

/// Durable holder of the walker's bearer token.
///
/// The token lives in a local SQLite file and is mirrored into a watch
/// channel, so observers get the current value on subscription and every
/// later write or clear. Only login writes it and only logout clears it.
pub struct SessionStore {
    db: SqlitePool,
    token: watch::Sender<Option<String>>,
}

impl SessionStore {
    pub async fn open(database_url: &str) -> Result<Self, SessionError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // A single long-lived connection keeps `sqlite::memory:` databases alive.
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(db).await
    }

    pub async fn with_pool(db: SqlitePool) -> Result<Self, SessionError> {
        sqlx::migrate!("./migrations").run(&db).await?;

        let stored: Option<String> =
            sqlx::query_scalar("SELECT value FROM preferences WHERE key = ?")
                .bind(TOKEN_KEY)
                .fetch_optional(&db)
                .await?;
        debug!("session loaded, token present: {}", stored.is_some());

        let (token, _rx) = watch::channel(stored);
        Ok(Self { db, token })
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.token.subscribe()
    }

    pub fn token(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    pub async fn save_token(&self, token: &str) -> Result<(), SessionError> {
        sqlx::query(
            r#"
            INSERT INTO preferences (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(TOKEN_KEY)
        .bind(token)
        .execute(&self.db)
        .await?;

        self.token.send_replace(Some(token.to_string()));
        info!("session token stored");
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), SessionError> {
        sqlx::query("DELETE FROM preferences WHERE key = ?")
            .bind(TOKEN_KEY)
            .execute(&self.db)
            .await?;

        self.token.send_replace(None);
        info!("session cleared");
        Ok(())
    }
}
