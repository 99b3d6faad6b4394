//! Admin allow-list management commands.

use super::CommandError;

/// Add a Telegram id to the allow-list.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the insert fails.
pub async fn add(tg_id: &str) -> Result<(), CommandError> {
    let pool = super::connect().await?;

    sqlx::query("INSERT INTO admins (tg_id) VALUES ($1) ON CONFLICT (tg_id) DO NOTHING")
        .bind(tg_id)
        .execute(&pool)
        .await?;

    tracing::info!(%tg_id, "admin added");
    Ok(())
}

/// Remove a Telegram id from the allow-list.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the delete fails.
pub async fn remove(tg_id: &str) -> Result<(), CommandError> {
    let pool = super::connect().await?;

    let result = sqlx::query("DELETE FROM admins WHERE tg_id = $1")
        .bind(tg_id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        tracing::warn!(%tg_id, "admin not found");
    } else {
        tracing::info!(%tg_id, "admin removed");
    }
    Ok(())
}

/// List allow-list entries.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the query fails.
pub async fn list() -> Result<(), CommandError> {
    use sqlx::Row;

    let pool = super::connect().await?;

    let rows = sqlx::query("SELECT tg_id FROM admins ORDER BY added_at")
        .fetch_all(&pool)
        .await?;

    for row in &rows {
        let tg_id: String = row.try_get("tg_id")?;
        tracing::info!(%tg_id, "admin");
    }
    tracing::info!(count = rows.len(), "admins listed");
    Ok(())
}
