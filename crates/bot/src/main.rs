use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use paginator::{Delivery, LinePageSource, PaginatorError};
use shared::{
    domain::MessageId,
    error::{ApiError, ErrorCode},
    protocol::{
        InteractionPayload, MessageView, PlatformEvent, StartSessionRequest, StartSessionResponse,
    },
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod platform;

use app_state::AppState;
use crate::config::load_settings;

const MAX_ITEMS: usize = 1000;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[derive(Debug, Parser)]
#[command(name = "bot", about = "Chat bot with interactive paginated messages")]
struct Args {
    /// Settings file; defaults to ./bot.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured bind address.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        settings.bind_addr = bind;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let state = AppState::new(&settings);
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.bind_addr))?;
    info!(%addr, "bot listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/sessions", post(start_session))
        .route("/interactions", post(interaction))
        .route("/messages/:message_id", get(get_message))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

fn api_error(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ApiError>) {
    (status, Json(ApiError::new(code, message)))
}

async fn start_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartSessionRequest>,
) -> ApiResult<Json<StartSessionResponse>> {
    let per_page = req.per_page.unwrap_or(state.default_per_page);
    if per_page == 0 {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            ErrorCode::Validation,
            "per_page must be greater than zero",
        ));
    }
    if req.items.len() > MAX_ITEMS {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            ErrorCode::Validation,
            format!("at most {MAX_ITEMS} items can be paginated"),
        ));
    }

    let pages = LinePageSource::new(req.title, req.items, per_page);
    let message_id = state
        .paginator
        .start_session(req.channel_id, pages, req.owner_id, req.modality)
        .await
        .map_err(|err| {
            error!(channel_id = req.channel_id.0, %err, "failed to start paginator session");
            match err {
                PaginatorError::Registry(_) => api_error(
                    StatusCode::CONFLICT,
                    ErrorCode::Conflict,
                    "message already has an active session",
                ),
                PaginatorError::Render(_) | PaginatorError::Send(_) => api_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Internal,
                    "could not post the paginated message",
                ),
            }
        })?;

    Ok(Json(StartSessionResponse { message_id }))
}

async fn interaction(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<InteractionPayload>,
) -> ApiResult<StatusCode> {
    let message_id = payload.message_id;
    match state.paginator.dispatch(payload) {
        Delivery::Delivered => Ok(StatusCode::ACCEPTED),
        Delivery::NoSession => Err(api_error(
            StatusCode::NOT_FOUND,
            ErrorCode::NotFound,
            format!("message {} has no active session", message_id.0),
        )),
        Delivery::Dropped => Err(api_error(
            StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::RateLimited,
            "too many pending interactions for this message",
        )),
    }
}

async fn get_message(
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<i64>,
) -> ApiResult<Json<MessageView>> {
    state
        .platform
        .message(MessageId(message_id))
        .await
        .map(Json)
        .ok_or_else(|| {
            api_error(
                StatusCode::NOT_FOUND,
                ErrorCode::NotFound,
                format!("message {message_id} not found"),
            )
        })
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: Arc<AppState>, socket: axum::extract::ws::WebSocket) {
    use axum::extract::ws::Message;
    use futures::{SinkExt, StreamExt};

    let (mut sender, mut receiver) = socket.split();
    let mut events_rx = state.events.subscribe();

    let send_task = tokio::spawn(async move {
        while let Some(event) = next_event(&mut events_rx).await {
            let text = match serde_json::to_string(&event) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(_msg)) = receiver.next().await {}

    send_task.abort();
}

/// Next event for a ws subscriber. A lagging subscriber skips what it missed
/// instead of losing the stream.
async fn next_event(
    events_rx: &mut broadcast::Receiver<PlatformEvent>,
) -> Option<PlatformEvent> {
    loop {
        match events_rx.recv().await {
            Ok(event) => return Some(event),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "ws subscriber lagged; dropping events");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
