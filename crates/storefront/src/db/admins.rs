//! Admin allow-list lookups.

use sqlx::PgPool;

use lepestok_core::TelegramId;

use super::RepositoryError;

/// Repository for the admin allow-list.
pub struct AdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminRepository<'a> {
    /// Create a new admin repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Whether the given Telegram id is on the allow-list.
    ///
    /// The list stores ids as text and historical rows may carry either the
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
}
