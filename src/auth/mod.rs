//! Account plumbing: registration, login, logout. The chat core trusts the
//! identity this module puts in the session and never re-checks it.

mod login;
mod logout;
mod register;

use axum::{
    Json, Router, debug_handler,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_sessions::Session;

use crate::{AppError, AppResult, AppState, session::ClientSession};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login::login))
        .route("/create-account", post(register::create_account))
        .route("/logout", get(logout::logout))
        .route("/me", get(me))
}

#[debug_handler]
async fn me(session: Session) -> AppResult<Response> {
    let client = ClientSession::load(&session)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(json!({ "uid": client.user_id, "username": client.username })).into_response())
}

pub(crate) fn bad_credentials() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "bad username or password" })),
    )
        .into_response()
}
