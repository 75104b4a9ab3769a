use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, HeaderValue, Method, Request, StatusCode, Uri, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use include_dir::{Dir, include_dir};
use mime_guess::from_path;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::actions;
use crate::store::Store;

// Embed the dashboard assets into the binary
static ASSETS: Dir<'_> = include_dir!("web");

// App state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

fn asset_response(path: &str, cache_control: &'static str) -> Option<Response> {
    let file = ASSETS.get_file(path)?;

    let mut headers = HeaderMap::new();
    let content_type = from_path(path).first_or_octet_stream();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type.as_ref())
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );

    Some((StatusCode::OK, headers, file.contents()).into_response())
}

async fn handle_static_file(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    // The dashboard polls live data, so its shell must not be cached for long
    if (path.is_empty() || path == "index.html" || path == "dashboard")
        && let Some(response) = asset_response("index.html", "no-cache")
    {
        return response;
    }

    if let Some(response) = asset_response(path, "public, max-age=300") {
        return response;
    }

    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

/// One-line summary of a finished request, shared by the log and Sentry
fn request_summary(
    method: &Method,
    path: &str,
    request_id: &str,
    status: StatusCode,
) -> String {
    format!("{} {} [{}] {}", method, path, request_id, status.as_u16())
}

/// Time every request, log it under a short correlation id, and report
/// server errors to Sentry tagged with that id
async fn observe_request(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = Uuid::new_v4().simple().to_string()[..8].to_string();
    let start_time = Instant::now();

    let response = next.run(request).await;
    let elapsed = start_time.elapsed().as_secs_f64();
    let status = response.status();

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status.as_u16().to_string()
    )
    .record(elapsed);

    let summary = request_summary(&method, &path, &request_id, status);
    if status.is_server_error() {
        error!("{} in {:.2}ms", summary, elapsed * 1000.0);
        sentry::with_scope(
            |scope| {
                scope.set_tag("http.method", method.as_str());
                scope.set_tag("http.path", &path);
                scope.set_tag("http.status_code", status.as_u16().to_string());
                scope.set_tag("request_id", &request_id);
            },
            || sentry::capture_message(&summary, sentry::Level::Error),
        );
    } else {
        info!("{} in {:.2}ms", summary, elapsed * 1000.0);
    }

    response
}

/// Build the full application router over `state`
pub fn build_router(state: AppState) -> Router {
    let api_router = Router::new()
        .route("/health", get(actions::get_health))
        .route("/health/db", get(actions::get_db_health))
        .route("/observations/latest", get(actions::get_latest_observations))
        .with_state(state);

    Router::new()
        .nest("/api", api_router)
        .route("/metrics", get(crate::metrics::metrics_handler))
        .fallback(handle_static_file)
        .layer(middleware::from_fn(observe_request))
        .layer(CorsLayer::permissive())
}

pub async fn start_web_server(interface: String, port: u16, store: Arc<dyn Store>) -> Result<()> {
    sentry::configure_scope(|scope| {
        scope.set_tag("operation", "web-server");
    });
    info!("Starting web server on {}:{}", interface, port);

    let app = build_router(AppState::new(store));

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", interface, port)).await?;
    info!("Web server listening on http://{}:{}", interface, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
