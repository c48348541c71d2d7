use std::sync::Arc;

use axum::{
    Json, debug_handler,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;

use crate::{AppError, AppResult, chat::{ChatCore, Message}, session::ClientSession};

#[derive(Debug, Deserialize)]
pub(crate) struct SendMessageQuery {
    content: String,
}

/// Wire shape of a delivered message; ids and room references stay internal.
#[derive(Debug, Serialize)]
pub(crate) struct MessageView {
    sender: String,
    content: String,
}

impl From<Message> for MessageView {
    fn from(msg: Message) -> Self {
        Self {
            sender: msg.sender,
            content: msg.content,
        }
    }
}

#[debug_handler]
pub(crate) async fn send_message(
    State(core): State<Arc<ChatCore>>,
    session: Session,

    Json(SendMessageQuery { content }): Json<SendMessageQuery>,
) -> AppResult<Response> {
    let mut client = ClientSession::load(&session)
        .await?
        .ok_or(AppError::Unauthorized)?;

    // Save before bailing: a RoomGone clears the stale membership and that
    // has to stick even though the request fails.
    let sent = core.send_message(&mut client, &content);
    client.save(&session).await?;
    let msg = sent?;

    Ok(Json(json!({ "content": msg.content })).into_response())
}

#[debug_handler]
pub(crate) async fn poll_full(
    State(core): State<Arc<ChatCore>>,
    session: Session,
) -> AppResult<Response> {
    let mut client = ClientSession::load(&session)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let polled = core.poll_full(&mut client);
    client.save(&session).await?;
    let msgs = polled?;

    Ok(messages_response(msgs))
}

#[debug_handler]
pub(crate) async fn poll_delta(
    State(core): State<Arc<ChatCore>>,
    session: Session,
) -> AppResult<Response> {
    let mut client = ClientSession::load(&session)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let polled = core.poll_delta(&mut client);
    client.save(&session).await?;
    let msgs = polled?;

    Ok(messages_response(msgs))
}

fn messages_response(msgs: Vec<Message>) -> Response {
    let views: Vec<MessageView> = msgs.into_iter().map(MessageView::from).collect();
    Json(json!({ "messages": views })).into_response()
}
