//! Shop user listing.

use sqlx::{PgPool, Row};

use lepestok_core::User;

use super::RepositoryError;

/// Repository for user read operations.
pub struct UserAdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserAdminRepository<'a> {
    /// Create a new repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List users, most recently seen first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query(
            r"
            SELECT tg_id, salebot_client_id, username, firstname, lastname,
                   created_at, updated_at
            FROM users
            ORDER BY updated_at DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(User {
                    tg_id: row.try_get("tg_id")?,
                    salebot_client_id: row.try_get("salebot_client_id")?,
                    username: row.try_get("username")?,
                    firstname: row.try_get("firstname")?,
                    lastname: row.try_get("lastname")?,
                    created_at: row.try_get("created_at")?,
                    updated_at: row.try_get("updated_at")?,
                })
            })
            .collect()
    }
}
