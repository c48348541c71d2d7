use axum::{
    debug_handler,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::AppResult;

/// Drops the whole session record, membership and cursor included.
#[debug_handler]
pub(crate) async fn logout(session: Session) -> AppResult<Response> {
    session.clear().await;
    Ok(StatusCode::NO_CONTENT.into_response())
}
