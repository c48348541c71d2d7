use std::sync::Arc;

use axum::{
    Json, debug_handler,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{AppError, AppResult, chat::ChatCore, session::ClientSession};

#[derive(Debug, Deserialize)]
pub(crate) struct NewRoomQuery {
    name: String,
}

#[debug_handler]
pub(crate) async fn new_room(
    State(core): State<Arc<ChatCore>>,
    session: Session,

    Json(NewRoomQuery { name }): Json<NewRoomQuery>,
) -> AppResult<Response> {
    let mut client = ClientSession::load(&session)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let room = core.create_room(&mut client, &name)?;
    client.save(&session).await?;

    Ok(Json(room).into_response())
}
