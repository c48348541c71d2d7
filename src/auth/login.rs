use axum::{
    Json, debug_handler,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, session::ClientSession};

use super::bad_credentials;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginQuery {
    username: String,
    password: String,
}

#[debug_handler]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    session: Session,

    Json(LoginQuery { username, password }): Json<LoginQuery>,
) -> AppResult<Response> {
    let row: Option<(i64, String)> =
        sqlx::query_as("SELECT id,password_hash FROM users WHERE username=?")
            .bind(&username)
            .fetch_optional(&db_pool)
            .await?;

    // Same response for an unknown user and a wrong password; no probing
    // which usernames exist.
    let Some((uid, hash)) = row else {
        return Ok(bad_credentials());
    };
    if !bcrypt::verify(&password, &hash)? {
        return Ok(bad_credentials());
    }

    tracing::info!(%username, uid, "logged in");
    ClientSession::new(uid, username.clone())
        .save(&session)
        .await?;

    Ok(Json(json!({ "uid": uid, "username": username })).into_response())
}
