mod msg;
mod new;
mod room;

use std::sync::Arc;

use axum::{
    Json, Router, debug_handler,
    extract::State,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::json;
use tower_sessions::Session;

use crate::{AppError, AppResult, AppState, chat::ChatCore, session::ClientSession};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_rooms))
        .route("/new", post(new::new_room))
        .route("/{uuid}", delete(room::delete_room))
        .route("/{uuid}/join", post(room::join_room))
        .route("/leave", post(room::leave_room))
        .route("/send", post(msg::send_message))
        .route("/messages", get(msg::poll_full))
        .route("/messages/new", get(msg::poll_delta))
}

#[debug_handler]
async fn list_rooms(
    State(core): State<Arc<ChatCore>>,
    session: Session,
) -> AppResult<Response> {
    ClientSession::load(&session)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(json!({ "rooms": core.list_rooms() })).into_response())
}
