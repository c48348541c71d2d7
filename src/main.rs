use std::sync::Arc;

use axum::{Router, debug_handler, response::IntoResponse, routing::get};
use parlor::{AppState, auth, chat::ChatCore, db, rooms};
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::cors::CorsLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::SameSite};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parlor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(30)));

    let database_url =
        dotenv::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:parlor.db?mode=rwc".to_owned());
    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(&database_url)
        .await?;
    db::init(&db_pool).await?;

    let app_state = AppState {
        db_pool,
        core: Arc::new(ChatCore::new()),
    };

    let app = Router::new()
        .route("/", get(hello))
        .merge(auth::router())
        .nest("/r", rooms::router())
        .with_state(app_state)
        .layer(session_layer)
        .layer(CorsLayer::permissive());

    let addr = dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

#[debug_handler]
async fn hello() -> impl IntoResponse {
    "parlor: log in, pick a room, start talking"
}
