//! `SQLite` implementation of the `RegistryStorePort` trait.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use chapterkeep_core::{ItemId, PermissionRecord, RegistryStorePort, RepositoryError};

const PERMISSION_KEY: &str = "storage_permission";

fn storage_err(e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Storage(e.to_string())
}

/// `SQLite` implementation of the `RegistryStorePort` trait.
///
/// The id list lives in `offline_registry`, one row per id; the permission
/// record is a JSON value in `permission_kv`.
#[derive(Clone)]
pub struct SqliteRegistryStore {
    pool: SqlitePool,
}

impl SqliteRegistryStore {
    /// Create a store over a pool prepared by `setup_database`.
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistryStorePort for SqliteRegistryStore {
    async fn load_ids(&self) -> Result<Vec<ItemId>, RepositoryError> {
        let rows = sqlx::query("SELECT item_id FROM offline_registry ORDER BY position")
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;

        rows.iter()
            .map(|row| {
                let raw: i64 = row.get("item_id");
                ItemId::try_from(raw).map_err(|_| {
                    RepositoryError::Serialization(format!("item id out of range: {raw}"))
                })
            })
            .collect()
    }

    async fn save_ids(&self, ids: &[ItemId]) -> Result<(), RepositoryError> {
        // Replace the whole list in one transaction
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        sqlx::query("DELETE FROM offline_registry")
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;

        let mut position: i64 = 0;
        for id in ids {
            sqlx::query("INSERT INTO offline_registry (position, item_id) VALUES (?, ?)")
                .bind(position)
                .bind(i64::from(*id))
                .execute(&mut *tx)
                .await
                .map_err(storage_err)?;
            position += 1;
        }

        tx.commit().await.map_err(storage_err)?;
        tracing::trace!(target: "chapterkeep.db", count = ids.len(), "registry saved");
        Ok(())
    }

    async fn load_permission(&self) -> Result<Option<PermissionRecord>, RepositoryError> {
        let row = sqlx::query("SELECT value FROM permission_kv WHERE key = ?")
            .bind(PERMISSION_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        row.map(|r| {
            let json: String = r.get("value");
            serde_json::from_str(&json).map_err(|e| RepositoryError::Serialization(e.to_string()))
        })
        .transpose()
    }

    async fn save_permission(&self, record: &PermissionRecord) -> Result<(), RepositoryError> {
        let json =
            serde_json::to_string(record).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        let updated_at = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

        sqlx::query("INSERT OR REPLACE INTO permission_kv (key, value, updated_at) VALUES (?, ?, ?)")
            .bind(PERMISSION_KEY)
            .bind(&json)
            .bind(&updated_at)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(())
    }
}
