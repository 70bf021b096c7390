use {
    axum::{
        Router,
        response::Json,
        routing::{get, post},
    },
    tracing::info,
};

use crate::{state::AppState, webhook::webhook_handler};

/// Build the gateway router (shared between production startup and tests).
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/webhook", post(webhook_handler))
        .with_state(state)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Bind and run the gateway until the process exits.
pub async fn serve(bind: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    info!(addr = %listener.local_addr()?, "liaison gateway listening");
    axum::serve(listener, build_app(state)).await?;
    Ok(())
}
