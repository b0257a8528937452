//! Webhook HTTP server
//!
//! Routes:
//! - `POST <webhook path>`: Telegram updates
//! - `GET /` and `GET /health`: liveness probe
//!
//! A body that is not a Telegram update is answered with 400. That includes
//! bodies with a valid `update_id` whose payload does not decode into any
//! known update kind (teloxide keeps those as `UpdateKind::Error`). Anything
//! else is acknowledged with 200 once handled, even if the handler failed,
//! so Telegram never re-delivers an update that has already been processed.

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;
use teloxide::types::{Update, UpdateKind};
use tokio::net::TcpListener;

use rafflecore::error::{AppError, AppResult};

use crate::telegram::{handle_update, HandlerDeps};

/// Builds the application router.
pub fn router(deps: HandlerDeps, webhook_path: &str) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/health", get(health_handler))
        .route(webhook_path, post(webhook_handler))
        .with_state(deps)
}

/// Serves `router` on all interfaces until Ctrl+C or SIGTERM.
///
/// In-flight requests are allowed to finish before this returns.
pub async fn serve(router: Router, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr).await?;

    log::info!("Starting webhook server on http://{}", addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Webhook server stopped");
    Ok(())
}

/// Full webhook URL for `set-webhook`: base URL plus route.
pub fn webhook_url(base_url: &str, webhook_path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), webhook_path)
}

/// Decodes one webhook body.
///
/// # Errors
/// [`AppError::MalformedPayload`] when the body is not an update at all,
/// [`AppError::InvalidUpdate`] when no field decodes into a known kind.
pub fn parse_update(body: &[u8]) -> AppResult<Update> {
    let update: Update = serde_json::from_slice(body)?;

    if let UpdateKind::Error(raw) = &update.kind {
        let fields = raw
            .as_object()
            .map(|object| object.keys().cloned().collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        return Err(AppError::InvalidUpdate {
            update_id: update.id.0,
            reason: format!("undecodable update fields [{}]", fields),
        });
    }

    Ok(update)
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn webhook_handler(State(deps): State<HandlerDeps>, body: Bytes) -> impl IntoResponse {
    let update = match parse_update(&body) {
        Ok(update) => update,
        Err(e) => {
            log::warn!("Rejected malformed webhook payload ({} bytes): {}", body.len(), e);
            return (StatusCode::BAD_REQUEST, "Bad Request");
        }
    };

    handle_update(deps, update).await;
    (StatusCode::OK, "ok")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("Received Ctrl+C, shutting down gracefully..."),
        _ = terminate => log::info!("Received SIGTERM, shutting down gracefully..."),
    }
}
