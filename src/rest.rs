// Copyright 2026 Imgharvest Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP REST API for imgharvest.
//!
//! Two operations: discover candidate images across a set of pages, and
//! bundle a selected set of image URLs into a zip download. Request bodies
//! are parsed leniently: malformed JSON reads as an empty request and gets
//! the matching input error, never a framework rejection.

use crate::bundle::{Bundle, Bundler};
use crate::config::{BundleLimits, DiscoveryLimits};
use crate::discover::Discovery;
use crate::fetch::Fetcher;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared per-process state: the two engines over one HTTP client.
pub struct AppState {
    pub discovery: Discovery,
    pub bundler: Bundler,
}

impl AppState {
    /// Engines wired with production limits over one shared client.
    pub fn new() -> Self {
        let fetcher = Fetcher::new();
        Self {
            discovery: Discovery::new(fetcher.clone(), DiscoveryLimits::default()),
            bundler: Bundler::new(fetcher, BundleLimits::default()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the axum Router with all REST endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/discover", post(handle_discover))
        .route("/api/v1/bundle", post(handle_bundle))
        .layer(cors)
        .with_state(state)
}

/// Start the REST API server on the given port, until ctrl-c.
pub async fn start(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("REST API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("received shutdown signal");
}

// ── Helpers ─────────────────────────────────────────────────────

/// Parse a request body as JSON, treating malformed input as an empty
/// request.
fn lenient_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

/// Page URLs from a discover body. `urls` may be an array of strings or a
/// bare string, and a singular `url` key is accepted as an alias. Entries
/// are trimmed; blanks and non-strings are dropped.
fn page_urls(payload: &Value) -> Vec<String> {
    let input = match payload.get("urls") {
        Some(v) if !v.is_null() => Some(v),
        _ => payload.get("url"),
    };

    match input {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            }
        }
        _ => Vec::new(),
    }
}

/// Item URLs from a bundle body. Non-string entries are lowered to empty
/// strings instead of dropped, so positions and the count cap match the
/// request as sent; the bundler skips the unusable slots.
fn bundle_urls(payload: &Value) -> Vec<String> {
    match payload.get("urls") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().unwrap_or_default().to_string())
            .collect(),
        _ => Vec::new(),
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Archive bytes with download headers. The content-length is set from the
/// archive so the interface advertises the exact payload size.
fn archive_response(bundle: Bundle) -> Response {
    let length = bundle.bytes.len().to_string();
    (
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"images.zip\"".to_string(),
            ),
            (header::CONTENT_LENGTH, length),
        ],
        bundle.bytes,
    )
        .into_response()
}

// ── Handlers ────────────────────────────────────────────────────

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Discover query parameters. `page` is parsed leniently: anything that is
/// not an integer reads as page one.
#[derive(serde::Deserialize, Default)]
struct DiscoverParams {
    page: Option<String>,
}

async fn handle_discover(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DiscoverParams>,
    body: Bytes,
) -> Response {
    let payload = lenient_json(&body);
    let pages = page_urls(&payload);
    if pages.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "urls are required");
    }

    let page = params
        .page
        .as_deref()
        .and_then(|p| p.trim().parse::<i64>().ok())
        .unwrap_or(1);

    let result = state.discovery.discover(&pages, page).await;
    Json(result).into_response()
}

async fn handle_bundle(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let payload = lenient_json(&body);
    let urls = bundle_urls(&payload);

    match state.bundler.bundle(&urls).await {
        Ok(bundle) => archive_response(bundle),
        Err(e) if e.is_input_error() => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
        Err(e) => {
            tracing::error!("bundle failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "archive assembly failed")
        }
    }
}
