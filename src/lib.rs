pub mod auth;
pub mod chat;
pub mod db;
pub mod rooms;
pub mod session;

use axum::{
    Json,
    extract::FromRef,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::chat::{ChatCore, ChatError};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub core: Arc<ChatCore>,
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    /// A domain failure; each kind gets its own status so clients can react.
    Chat(ChatError),
    /// Not logged in on this session.
    Unauthorized,
    /// Storage or session plumbing broke; masked as a plain 500.
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Chat(err) => {
                let status = match err {
                    ChatError::NameConflict(_) | ChatError::AlreadyInOtherRoom => {
                        StatusCode::CONFLICT
                    }
                    ChatError::RoomNotFound => StatusCode::NOT_FOUND,
                    ChatError::RoomGone => StatusCode::GONE,
                    ChatError::ContentTooLong => StatusCode::PAYLOAD_TOO_LARGE,
                    ChatError::NotInRoom => StatusCode::BAD_REQUEST,
                };
                (status, Json(json!({ "error": err.to_string() }))).into_response()
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "log in first" })),
            )
                .into_response(),
            AppError::Internal(err) => {
                tracing::error!("internal error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal error" })),
                )
                    .into_response()
            }
        }
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        Self::Chat(err)
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::Internal(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(serde_json::Error);
apperr_impl!(sqlx::Error);
apperr_impl!(tower_sessions::session::Error);
apperr_impl!(axum::Error);
apperr_impl!(bcrypt::BcryptError);
