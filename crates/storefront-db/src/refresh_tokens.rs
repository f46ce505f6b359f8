use sqlx::PgPool;

use crate::DbError;

/// Deletes refresh tokens whose `expires_at` is in the past.
///
/// Returns the number of rows removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_expired_refresh_tokens(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < NOW()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
