use axum::{
    Json, debug_handler,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, session::ClientSession};

#[derive(Debug, Deserialize)]
pub(crate) struct CreateAccountQuery {
    username: String,
    password: String,
    /// Checked against `password` when a client sends it along.
    confirm_password: Option<String>,
}

#[debug_handler]
pub(crate) async fn create_account(
    State(db_pool): State<SqlitePool>,
    session: Session,

    Json(CreateAccountQuery {
        username,
        password,
        confirm_password,
    }): Json<CreateAccountQuery>,
) -> AppResult<Response> {
    if confirm_password.is_some_and(|confirm| confirm != password) {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "passwords don't match" })),
        )
            .into_response());
    }

    let hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)?;

    let result = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?,?)")
        .bind(&username)
        .bind(&hash)
        .execute(&db_pool)
        .await;

    let uid = match result {
        Ok(done) => done.last_insert_rowid(),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Ok((
                StatusCode::CONFLICT,
                Json(json!({ "error": "username already taken" })),
            )
                .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(%username, uid, "account created");
    ClientSession::new(uid, username.clone())
        .save(&session)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "uid": uid, "username": username })),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sqlx::sqlite::SqlitePoolOptions;
    use tower_sessions::MemoryStore;

    use crate::db;

    async fn pool() -> SqlitePool {
        // One connection, or each pool checkout would get its own empty
        // in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::init(&pool).await.unwrap();
        pool
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn mismatched_confirmation_is_rejected() {
        let pool = pool().await;
        let session = session();

        let resp = create_account(
            State(pool.clone()),
            session.clone(),
            Json(CreateAccountQuery {
                username: "u1".to_owned(),
                password: "hunter2".to_owned(),
                confirm_password: Some("hunter3".to_owned()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // No account, nobody logged in.
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username=?")
            .bind("u1")
            .fetch_optional(&pool)
            .await
            .unwrap();
        assert!(row.is_none());
        assert!(ClientSession::load(&session).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn matching_confirmation_creates_and_logs_in() {
        let pool = pool().await;
        let session = session();

        let resp = create_account(
            State(pool),
            session.clone(),
            Json(CreateAccountQuery {
                username: "u1".to_owned(),
                password: "hunter2".to_owned(),
                confirm_password: Some("hunter2".to_owned()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let client = ClientSession::load(&session).await.unwrap().unwrap();
        assert_eq!(client.username, "u1");
    }
}
