use super::{MessageError, MessageHandler, MessageRequest, MessageResponse};
use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

impl IntoResponse for MessageError {
    fn into_response(self) -> Response {
        let status = match &self {
            MessageError::BadRequest(_) => StatusCode::BAD_REQUEST,
            MessageError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self, "Message failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(handler: MessageHandler) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/message", post(handle_message))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(handler)
}

async fn handle_message(
    State(handler): State<MessageHandler>,
    Json(raw): Json<Value>,
) -> Result<Json<MessageResponse>, MessageError> {
    let request = MessageRequest::parse(raw)?;
    let response = handler.handle(request).await?;
    Ok(Json(response))
}

async fn health() -> &'static str {
    "ok"
}

/// Serve until `shutdown` resolves.
pub async fn serve_router(
    listener: TcpListener,
    handler: MessageHandler,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    axum::serve(listener, router(handler))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")
}

/// Bind on localhost and serve until Ctrl-C.
pub async fn run(port: u16, handler: MessageHandler) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(%addr, "quick-copy message server listening");

    serve_router(listener, handler, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutting down");
    })
    .await
}
