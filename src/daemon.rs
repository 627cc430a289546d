use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Serialize;

use crate::config::Config;
use crate::error::{RecallChatError, Result};
use crate::services::chat::{ChatRequest, ChatService};

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    build: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build: env!("RECALL_CHAT_GIT_SHA").to_string(),
    })
}

async fn chat(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::debug!("rejected chat body: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    match state.chat.handle(request).await {
        Ok(turn) => (StatusCode::OK, Json(turn.reply)).into_response(),
        Err(RecallChatError::InvalidInput(message)) => {
            error_response(StatusCode::BAD_REQUEST, &message)
        }
        Err(err) => {
            tracing::error!("chat request failed: {}", err.log_detail());
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

pub async fn run(config: Config) -> Result<()> {
    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!("could not listen for ctrl-c: {}", err);
            futures::future::pending::<()>().await;
        }
    };
    run_with_shutdown(config, shutdown).await
}

pub async fn run_with_shutdown<F>(config: Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let chat = ChatService::from_config(&config)?;
    let openai = config.openai();
    tracing::info!(
        model = %openai.model(),
        api_key = %crate::logging::mask_secret(openai.api_key.as_deref().unwrap_or_default()),
        search = config.search().is_some(),
        "chat service configured"
    );

    let state = AppState {
        chat: Arc::new(chat),
    };
    let app = build_router(state);

    let server = config.server();
    let addr = format!("{}:{}", server.host(), server.port());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RecallChatError::Runtime(e.to_string()))?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| RecallChatError::Runtime(e.to_string()))?;

    Ok(())
}
