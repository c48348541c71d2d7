use std::sync::Arc;

use axum::{
    Json, debug_handler,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::{AppError, AppResult, chat::ChatCore, session::ClientSession};

#[debug_handler]
pub(crate) async fn join_room(
    Path(room_id): Path<Uuid>,
    State(core): State<Arc<ChatCore>>,
    session: Session,
) -> AppResult<Response> {
    let mut client = ClientSession::load(&session)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let room = core.join_room(&mut client, room_id)?;
    client.save(&session).await?;

    Ok(Json(room).into_response())
}

#[debug_handler]
pub(crate) async fn leave_room(
    State(core): State<Arc<ChatCore>>,
    session: Session,
) -> AppResult<Response> {
    let mut client = ClientSession::load(&session)
        .await?
        .ok_or(AppError::Unauthorized)?;

    core.leave_room(&mut client);
    client.save(&session).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Deletion never reports a missing room; deleting twice is fine. Sessions
/// still pointing at the room recover on their next send or poll.
#[debug_handler]
pub(crate) async fn delete_room(
    Path(room_id): Path<Uuid>,
    State(core): State<Arc<ChatCore>>,
    session: Session,
) -> AppResult<Response> {
    let client = ClientSession::load(&session)
        .await?
        .ok_or(AppError::Unauthorized)?;

    core.delete_room(room_id, &client.username);

    Ok(StatusCode::NO_CONTENT.into_response())
}
