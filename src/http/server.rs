//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the content handler
//! - Serve static assets ahead of the cascade when configured
//! - Wire up middleware (tracing, limits, request ID, CORS)
//! - Bind server to listener and drain on shutdown
//! - Record per-request metrics

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::cascade::{self, is_asset_path, Compositor};
use crate::cascade::resolver::FILE_NOT_FOUND;
use crate::config::ServerConfig;
use crate::http::request::{self, MakeRequestUuid};
use crate::http::response;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub compositor: Arc<Compositor>,
    pub max_body_size: usize,
}

/// HTTP server for the content cascade.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let state = AppState {
            compositor: Arc::new(Compositor::new(
                config.content.clone(),
                config.scripts.clone(),
            )),
            max_body_size: config.security.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        let content = Router::new()
            .route("/", any(content_handler))
            .route("/{*path}", any(content_handler))
            .with_state(state);

        let app = match config.content.static_dir.as_ref().filter(|dir| dir.is_dir()) {
            Some(dir) => {
                tracing::info!(static_dir = %dir.display(), "Serving static assets");
                let assets = ServeDir::new(dir)
                    .append_index_html_on_directories(false)
                    .call_fallback_on_method_not_allowed(true)
                    .fallback(content);
                Router::new().fallback_service(assets)
            }
            None => content,
        };

        let app = app
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections));

        let app = if config.security.cors_enabled {
            app.layer(CorsLayer::permissive())
        } else {
            app
        };

        app.layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            content_root = %self.config.content.root.display(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Run the cascade for one request and send whatever it resolves to.
async fn content_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request::request_id(request.headers());
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = serve_content(&state, request, &request_id).await;

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        "Request served"
    );
    metrics::record_request(&method, response.status().as_u16(), start_time);
    response
}

async fn serve_content(state: &AppState, request: Request<Body>, request_id: &str) -> Response {
    let path = request.uri().path().to_string();

    if is_asset_path(&path) {
        tracing::debug!(request_id = %request_id, path = %path, "Asset-like path, skipping layers");
        return (axum::http::StatusCode::NOT_FOUND, FILE_NOT_FOUND).into_response();
    }

    let (context, session) = match request::extract(request, state.max_body_size).await {
        Ok(extracted) => extracted,
        Err(e) => {
            tracing::warn!(request_id = %request_id, path = %path, error = %e, "Rejected request");
            return response::request_error(&e);
        }
    };

    match state.compositor.compose(&context, &session).await {
        Ok(composition) => {
            tracing::debug!(
                request_id = %request_id,
                path = %path,
                state = ?composition.state,
                dispatched = composition.trail.len(),
                "Cascade finished"
            );
            response::from_resolution(cascade::resolve(composition))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, path = %path, error = %e, "Cascade failed");
            response::internal_error()
        }
    }
}
