//! In-memory key-value server.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::client::DEBUG_TOKEN;

/// Issued tokens and stored values.
#[derive(Debug, Clone, Default)]
pub struct KvState {
    tokens: Arc<Mutex<HashSet<String>>>,
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl KvState {
    pub fn new() -> Self {
        Self::default()
    }

    fn issue_token(&self) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.clone());
        token
    }

    fn accepts(&self, token: &str) -> bool {
        token == DEBUG_TOKEN
            || self
                .tokens
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(token)
    }

    fn store(&self, key: String, value: String) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }

    fn fetch(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    #[serde(rename = "API_TOKEN")]
    api_token: Option<String>,
}

pub fn router() -> Router {
    router_with_state(KvState::new())
}

pub fn router_with_state(state: KvState) -> Router {
    let protected = Router::new()
        .route("/save/{key}", post(save))
        .route("/load/{key}", get(load))
        .layer(middleware::from_fn_with_state(state.clone(), token_middleware));

    Router::new()
        .route("/register", get(register))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Rejects requests whose `API_TOKEN` was never issued.
async fn token_middleware(
    State(state): State<KvState>,
    Query(query): Query<TokenQuery>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    match query.api_token.as_deref() {
        Some(token) if state.accepts(token) => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!("Unknown API token");
            Err(StatusCode::FORBIDDEN)
        }
        None => {
            tracing::warn!("Missing API_TOKEN parameter");
            Err(StatusCode::FORBIDDEN)
        }
    }
}

async fn register(State(state): State<KvState>) -> String {
    let token = state.issue_token();
    tracing::info!("Issued API token");
    token
}

async fn save(State(state): State<KvState>, Path(key): Path<String>, body: String) -> StatusCode {
    tracing::debug!(key = %key, bytes = body.len(), "save");
    state.store(key, body);
    StatusCode::OK
}

async fn load(
    State(state): State<KvState>,
    Path(key): Path<String>,
) -> Result<String, (StatusCode, String)> {
    state
        .fetch(&key)
        .ok_or((StatusCode::NOT_FOUND, format!("No value for key {key}")))
}
