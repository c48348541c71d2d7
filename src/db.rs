use sqlx::SqlitePool;

/// Creates the users table if it's missing. Rooms and messages live in
/// memory ([`crate::chat::ChatCore`]) and die with the process; accounts are
/// the only thing worth keeping across restarts.
pub async fn init(db_pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL
        )",
    )
    .execute(db_pool)
    .await?;

    Ok(())
}
