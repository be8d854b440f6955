//! Web server for the check-cx admin console
//!
//! Serves the control plane API under `/api/v1` and the embedded console UI
//! for every other path.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rust_embed::RustEmbed;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::api;
use crate::config::{AuthSettings, ServerSettings};
use crate::db::Database;

/// Embedded UI assets (compiled WASM app, built with trunk)
#[derive(RustEmbed)]
#[folder = "../ui/dist/"]
#[allow_missing = true]
struct UiAssets;

/// Server state shared across all handlers
pub struct AppState {
    pub db: Database,
    pub auth: AuthSettings,
}

/// Build the full application router
pub fn build_router(state: Arc<AppState>, cors_allow_any: bool) -> Router {
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/info", get(api_info))
        .nest("/api/v1", api::create_api_router(state.clone()))
        .route("/", get(serve_index))
        // Static files and SPA routing
        .fallback(serve_static)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors_allow_any {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    }
}

/// Start the web server
pub async fn start_server(
    settings: &ServerSettings,
    db: Database,
) -> anyhow::Result<tokio::task::JoinHandle<anyhow::Result<()>>> {
    let state = Arc::new(AppState {
        db,
        auth: settings.auth.clone(),
    });
    let app = build_router(state, settings.cors_allow_any);

    let addr = format!("0.0.0.0:{}", settings.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Console listening on {}", addr);

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))
    });

    Ok(handle)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Version and UI availability
async fn api_info() -> impl IntoResponse {
    Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "ui_embedded": UiAssets::get("index.html").is_some(),
    }))
}

/// Serve index.html
async fn serve_index() -> Response {
    serve_file("index.html")
}

/// Serve static files from embedded assets (fallback handler)
async fn serve_static(req: Request<Body>) -> Response {
    let path = req.uri().path();
    debug!("Fallback handler called for path: {}", path);

    if path.starts_with("/api/") {
        return (StatusCode::NOT_FOUND, Json(serde_json::json!({
            "error": "Not Found"
        }))).into_response();
    }

    if let Some(response) = try_serve_file(path) {
        return response;
    }

    // For SPA routing, serve index.html for non-asset paths
    if !path.contains('.') {
        return serve_file("index.html");
    }

    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

fn try_serve_file(path: &str) -> Option<Response> {
    let path = path.trim_start_matches('/');
    UiAssets::get(path).map(|content| {
        let mime = mime_guess::from_path(path).first_or_octet_stream().to_string();
        (
            [
                (header::CONTENT_TYPE, mime),
                (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
            ],
            content.data.into_owned(),
        )
            .into_response()
    })
}

fn serve_file(path: &str) -> Response {
    match UiAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream().to_string();
            ([(header::CONTENT_TYPE, mime)], content.data.into_owned()).into_response()
        }
        None => (StatusCode::NOT_FOUND, "Console UI not built").into_response(),
    }
}
