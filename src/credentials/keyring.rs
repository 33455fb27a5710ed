use crate::error::CasicsError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;

/// SQLite DDL for the keyring table. One row per `(ring, field)`.
pub const KEYRING_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS keyring (
    ring TEXT NOT NULL,
    field TEXT NOT NULL,
    secret TEXT NOT NULL,
    updated_at TEXT NOT NULL, -- RFC3339
    PRIMARY KEY (ring, field)
);
"#;

/// Key/value secret storage addressed by ring name and field name.
pub trait SecretStore: Send + Sync {
    fn get(
        &self,
        ring: &str,
        field: &str,
    ) -> impl Future<Output = Result<Option<String>, CasicsError>> + Send;

    fn set(
        &self,
        ring: &str,
        field: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), CasicsError>> + Send;

    fn delete(
        &self,
        ring: &str,
        field: &str,
    ) -> impl Future<Output = Result<(), CasicsError>> + Send;
}

/// Keyring persisted in a SQLite file.
#[derive(Clone)]
pub struct SqliteKeyring {
    pool: Pool<Sqlite>,
}

impl SqliteKeyring {
    /// Open (creating if missing) the keyring database at `url`.
    pub async fn connect(url: &str) -> Result<Self, CasicsError> {
        let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;
        let keyring = Self::new(pool);
        keyring.init_schema().await?;
        Ok(keyring)
    }

    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<(), CasicsError> {
        sqlx::query(KEYRING_INIT.trim()).execute(&self.pool).await?;
        Ok(())
    }
}

impl SecretStore for SqliteKeyring {
    async fn get(&self, ring: &str, field: &str) -> Result<Option<String>, CasicsError> {
        let rec: Option<(String,)> =
            sqlx::query_as("SELECT secret FROM keyring WHERE ring = ? AND field = ?")
                .bind(ring)
                .bind(field)
                .fetch_optional(&self.pool)
                .await?;
        Ok(rec.map(|r| r.0))
    }

    async fn set(&self, ring: &str, field: &str, value: &str) -> Result<(), CasicsError> {
        sqlx::query(
            r#"
            INSERT INTO keyring (ring, field, secret, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(ring, field) DO UPDATE SET
                secret=excluded.secret,
                updated_at=excluded.updated_at
            "#,
        )
        .bind(ring)
        .bind(field)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, ring: &str, field: &str) -> Result<(), CasicsError> {
        sqlx::query("DELETE FROM keyring WHERE ring = ? AND field = ?")
            .bind(ring)
            .bind(field)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Process-local keyring; contents vanish with the value.
#[derive(Default)]
pub struct MemoryKeyring {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl MemoryKeyring {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SecretStore for MemoryKeyring {
    async fn get(&self, ring: &str, field: &str) -> Result<Option<String>, CasicsError> {
        Ok(self
            .entries()
            .get(&(ring.to_string(), field.to_string()))
            .cloned())
    }

    async fn set(&self, ring: &str, field: &str, value: &str) -> Result<(), CasicsError> {
        self.entries()
            .insert((ring.to_string(), field.to_string()), value.to_string());
        Ok(())
    }

    async fn delete(&self, ring: &str, field: &str) -> Result<(), CasicsError> {
        self.entries()
            .remove(&(ring.to_string(), field.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sqlite_keyring_round_trips_and_overwrites() {
        let keyring = SqliteKeyring::connect("sqlite::memory:")
            .await
            .expect("connect keyring");

        assert_eq!(keyring.get("org.casics.db", "host").await.unwrap(), None);

        keyring
            .set("org.casics.db", "host", "db1.casics.org")
            .await
            .unwrap();
        keyring
            .set("org.casics.db", "host", "db2.casics.org")
            .await
            .unwrap();
        keyring.set("other.ring", "host", "elsewhere").await.unwrap();

        assert_eq!(
            keyring.get("org.casics.db", "host").await.unwrap().as_deref(),
            Some("db2.casics.org")
        );

        keyring.delete("org.casics.db", "host").await.unwrap();
        assert_eq!(keyring.get("org.casics.db", "host").await.unwrap(), None);
        assert_eq!(
            keyring.get("other.ring", "host").await.unwrap().as_deref(),
            Some("elsewhere")
        );
    }

    #[tokio::test]
    async fn memory_keyring_separates_rings() {
        let keyring = MemoryKeyring::new();
        keyring.set("a", "username", "alice").await.unwrap();
        keyring.set("b", "username", "bob").await.unwrap();
        assert_eq!(
            keyring.get("a", "username").await.unwrap().as_deref(),
            Some("alice")
        );
        keyring.delete("a", "username").await.unwrap();
        assert_eq!(keyring.get("a", "username").await.unwrap(), None);
        assert_eq!(
            keyring.get("b", "username").await.unwrap().as_deref(),
            Some("bob")
        );
    }
}
