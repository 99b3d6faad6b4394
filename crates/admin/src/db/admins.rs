//! Admin allow-list management.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Row};

use lepestok_core::TelegramId;

use super::RepositoryError;

/// One allow-list entry.
#[derive(Debug, Clone, Serialize)]
pub struct AdminEntry {
    pub tg_id: String,
    pub added_at: DateTime<Utc>,
}

/// Repository for the admin allow-list.
pub struct AdminListRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminListRepository<'a> {
    /// Create a new repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Whether the given Telegram id is on the allow-list.
    ///
    /// Ids are stored as text and historical rows may carry either the
    /// string or numeric rendering, so both forms are tried.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_admin(&self, id: TelegramId) -> Result<bool, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT 1 AS present
            FROM admins
            WHERE tg_id = $1
               OR (tg_id ~ '^[0-9]+$' AND tg_id::bigint = $2)
            LIMIT 1
            ",
        )
        .bind(id.to_string())
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// List all allow-list entries, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<AdminEntry>, RepositoryError> {
        let rows = sqlx::query("SELECT tg_id, added_at FROM admins ORDER BY added_at")
            .fetch_all(self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(AdminEntry {
                    tg_id: row.try_get("tg_id")?,
                    added_at: row.try_get("added_at")?,
                })
            })
            .collect()
    }

    /// Add an id to the allow-list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the id is already listed.
    pub async fn add(&self, tg_id: &str) -> Result<AdminEntry, RepositoryError> {
        let row = sqlx::query(
            r"
            INSERT INTO admins (tg_id)
            VALUES ($1)
            RETURNING tg_id, added_at
            ",
        )
        .bind(tg_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("admin already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(AdminEntry {
            tg_id: row.try_get("tg_id")?,
            added_at: row.try_get("added_at")?,
        })
    }

    /// Remove an id from the allow-list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id is not listed.
    pub async fn remove(&self, tg_id: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM admins WHERE tg_id = $1")
            .bind(tg_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
