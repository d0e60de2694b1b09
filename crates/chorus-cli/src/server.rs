//! HTTP routes for the chat service.
//!
//! | Method | Path | Body | Success |
//! |--------|------|------|---------|
//! | POST | `/send_message` | [`TurnRequest`] | `{response, timestamp}` |
//! | POST | `/clear_chat` | none | `{status: "success"}` |
//! | GET | `/conversation` | none | `{messages: [...]}` |
//! | GET | `/health` | none | `{status: "ok"}` |
//! | GET | `/status` | none | `{sessions, max_sessions, moderation_fail_open}` |
//!
//! Sessions are keyed by the `chorus_session` cookie. A `/send_message`
//! without a valid cookie gets a fresh session id, and the `Set-Cookie`
//! header is sent only once a turn has actually created that session.
//! Rejected turns leave no session behind.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use chorus_core::{new_session_id, Chorus, Rejection, SessionStore, TurnOutcome, TurnRequest};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "chorus_session";

pub const SEND_MESSAGE_PATH: &str = "/send_message";
pub const CLEAR_CHAT_PATH: &str = "/clear_chat";
pub const CONVERSATION_PATH: &str = "/conversation";
pub const HEALTH_PATH: &str = "/health";
pub const STATUS_PATH: &str = "/status";

/// Shared state behind every route.
#[derive(Clone)]
pub struct AppState {
    pub chorus: Arc<Chorus>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    /// State with a default-bounded session store.
    pub fn new(chorus: Chorus) -> Self {
        Self::with_sessions(chorus, SessionStore::new())
    }

    pub fn with_sessions(chorus: Chorus, sessions: SessionStore) -> Self {
        Self {
            chorus: Arc::new(chorus),
            sessions: Arc::new(sessions),
        }
    }
}

/// Longest pause between idle-session sweeps.
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically drops idle sessions. `None` if the store never expires
/// them.
pub fn spawn_session_sweeper(sessions: Arc<SessionStore>) -> Option<JoinHandle<()>> {
    let ttl = sessions.idle_ttl()?;
    let every = ttl.min(MAX_SWEEP_INTERVAL).max(Duration::from_secs(1));

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let removed = sessions.evict_idle().await;
            if removed > 0 {
                let live = sessions.len().await;
                info!(removed, live, "Swept idle sessions");
            }
        }
    }))
}

/// Errors returned to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The turn was rejected by validation or moderation.
    #[error("{0}")]
    Rejected(Rejection),

    /// The request body could not be read.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            ApiError::Rejected(Rejection::Flagged { categories }) => json!({
                "error": self.to_string(),
                "categories": categories,
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// Builds the router with all routes and state attached.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(SEND_MESSAGE_PATH, post(send_message))
        .route(CLEAR_CHAT_PATH, post(clear_chat))
        .route(CONVERSATION_PATH, get(conversation))
        .route(HEALTH_PATH, get(health))
        .route(STATUS_PATH, get(status))
        .with_state(state)
}

/// The caller's session id and whether it was just issued.
struct Session {
    id: String,
    issued: bool,
}

impl Session {
    fn from_headers(headers: &HeaderMap) -> Self {
        match session_cookie(headers) {
            Some(id) => Self { id, issued: false },
            None => Self {
                id: new_session_id(),
                issued: true,
            },
        }
    }

    /// Attaches `Set-Cookie` to `response` when the id is new.
    fn attach(&self, mut response: Response) -> Response {
        if self.issued {
            let cookie = format!(
                "{}={}; Path=/; HttpOnly; SameSite=Lax",
                SESSION_COOKIE, self.id
            );
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => warn!("Could not encode session cookie: {}", e),
            }
        }
        response
    }
}

/// Session id from the request cookies, if present and well formed.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| uuid::Uuid::parse_str(value).is_ok())
        .map(str::to_string)
}

async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<TurnRequest>, JsonRejection>,
) -> Response {
    let session = Session::from_headers(&headers);

    match body {
        Err(rejection) => ApiError::BadRequest(rejection.body_text()).into_response(),
        Ok(Json(request)) => {
            match state
                .chorus
                .send_to_session(&state.sessions, &session.id, &request)
                .await
            {
                TurnOutcome::Reply(reply) => session.attach(Json(reply).into_response()),
                TurnOutcome::Rejected(rejection) => {
                    debug!(session = %session.id, "Turn rejected: {}", rejection);
                    ApiError::Rejected(rejection).into_response()
                }
            }
        }
    }
}

async fn clear_chat(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(id) = session_cookie(&headers) {
        if let Some(handle) = state.sessions.get(&id).await {
            state.chorus.clear(&mut *handle.lock().await);
        }
    }
    Json(json!({ "status": "success" })).into_response()
}

async fn conversation(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let handle = match session_cookie(&headers) {
        Some(id) => state.sessions.get(&id).await,
        None => None,
    };
    let messages = match handle {
        Some(handle) => handle.lock().await.messages().to_vec(),
        None => Vec::new(),
    };
    Json(json!({ "messages": messages })).into_response()
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "sessions": state.sessions.len().await,
        "max_sessions": state.sessions.max_sessions(),
        "moderation_fail_open": state.chorus.gate().fail_open_count(),
    }))
}
