//! HTTP surface: dashboard page, viewer WebSocket, section snapshot and the
//! claim endpoint.

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::JsonRejection,
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;

use orchboard_core::{apply_claim, document, ClaimError, ClaimRequest, SectionSet};

use crate::broadcast::{Broadcaster, UpdateEvent};
use crate::config::ServerConfig;
use crate::error::{io_err, DaemonError};
use crate::protocol::ClaimResponse;

const INDEX_HTML: &str = include_str!("../assets/index.html");

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub broadcaster: Broadcaster,
}

impl AppState {
    pub fn new(config: ServerConfig, broadcaster: Broadcaster) -> Self {
        Self {
            config: Arc::new(config),
            broadcaster,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/api/sections", get(current_sections))
        .route("/api/claim", post(submit_claim))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

/// Serve `state` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), DaemonError> {
    let addr = listener
        .local_addr()
        .map_err(|e| io_err("http listener", e))?;
    tracing::info!(addr = %addr, "dashboard listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| io_err(addr.to_string(), e))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn current_sections(
    State(state): State<AppState>,
) -> Result<Json<SectionSet>, (StatusCode, Json<ClaimResponse>)> {
    let path = state.config.file.clone();
    match tokio::task::spawn_blocking(move || document::snapshot(&path)).await {
        Ok(sections) => Ok(Json(sections)),
        Err(err) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ClaimResponse::error(format!("snapshot join error: {err}"))),
        )),
    }
}

/// HTTP status for each claim rejection.
pub fn status_for(err: &ClaimError) -> StatusCode {
    match err {
        ClaimError::Unauthorized => StatusCode::UNAUTHORIZED,
        ClaimError::InvalidTaskId | ClaimError::MissingFields => StatusCode::BAD_REQUEST,
        ClaimError::AlreadyClaimed => StatusCode::CONFLICT,
        ClaimError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn submit_claim(
    State(state): State<AppState>,
    payload: Result<Json<ClaimRequest>, JsonRejection>,
) -> (StatusCode, Json<ClaimResponse>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ClaimResponse::error(format!(
                    "invalid request JSON: {}",
                    rejection.body_text()
                ))),
            );
        }
    };

    let task_id = request.task_id.trim().to_string();
    let path = state.config.file.clone();
    let secret = state.config.claim_token.clone();
    let outcome =
        tokio::task::spawn_blocking(move || apply_claim(&path, &request, secret.as_deref()))
            .await
            .unwrap_or_else(|err| Err(ClaimError::Internal(format!("claim join error: {err}"))));

    match outcome {
        Ok(sections) => {
            let viewers = state.broadcaster.publish(sections);
            tracing::info!(task_id = %task_id, viewers, "claim accepted");
            (StatusCode::OK, Json(ClaimResponse::ok()))
        }
        Err(err) => {
            let status = status_for(&err);
            if status.is_server_error() {
                tracing::error!(task_id = %task_id, error = %err, "claim failed");
            } else {
                tracing::warn!(task_id = %task_id, error = %err, "claim rejected");
            }
            (status, Json(ClaimResponse::error(err.to_string())))
        }
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_viewer(socket, state))
}

async fn serve_viewer(socket: WebSocket, state: AppState) {
    // Subscribe before the snapshot so no change slips between the two.
    let mut updates = state.broadcaster.subscribe();
    let (mut sender, mut receiver) = socket.split();

    let path = state.config.file.clone();
    let current = match tokio::task::spawn_blocking(move || document::snapshot(&path)).await {
        Ok(sections) => sections,
        Err(err) => {
            tracing::error!(error = %err, "viewer snapshot join error");
            return;
        }
    };
    if !send_update(&mut sender, &current).await {
        return;
    }
    tracing::info!(
        viewers = state.broadcaster.viewer_count(),
        "viewer connected"
    );

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(sections) => {
                    if !send_update(&mut sender, &sections).await {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "viewer lagging, skipped updates");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::info!("viewer disconnected");
}

async fn send_update(sender: &mut SplitSink<WebSocket, Message>, sections: &SectionSet) -> bool {
    let payload = match UpdateEvent::new(sections).to_json() {
        Ok(payload) => payload,
        Err(err) => {
            tracing::error!(error = %err, "failed to encode orchestrator update");
            return false;
        }
    };
    match sender.send(Message::Text(payload)).await {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!(error = %err, "viewer send failed");
            false
        }
    }
}
