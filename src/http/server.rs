//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, metrics, CORS, timeout, body limit)
//! - Guard mutating endpoints with the admission controller
//! - Run the idle-window sweeper alongside the server
//! - Bind server to listener and shut down gracefully

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::backend::{FallbackDispatcher, TextBackend};
use crate::config::GatewayConfig;
use crate::content::{ContentStore, FileStore};
use crate::http::handlers::{generate_handler, health_handler};
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::lifecycle::Shutdown;
use crate::observability::metrics::track_requests;
use crate::security::cors::cors_middleware;
use crate::security::rate_limit::{rate_limit_middleware, RateLimitState};
use crate::security::AdmissionController;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<FallbackDispatcher>,
    pub store: Option<Arc<dyn ContentStore>>,
    pub shutdown: Shutdown,
}

/// HTTP server for the content gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    limiter: Arc<AdmissionController>,
    shutdown: Shutdown,
}

impl HttpServer {
    /// Create a new HTTP server generating text through `backend`.
    pub fn new(config: GatewayConfig, backend: Arc<dyn TextBackend>, shutdown: Shutdown) -> Self {
        let limiter = Arc::new(AdmissionController::from_config(&config.rate_limit));
        let dispatcher = Arc::new(FallbackDispatcher::from_config(backend, &config.backend));
        let store = config
            .storage
            .enabled
            .then(|| Arc::new(FileStore::new(&config.storage.output_dir)) as Arc<dyn ContentStore>);

        let state = AppState {
            dispatcher,
            store,
            shutdown: shutdown.clone(),
        };
        let rate_limit = RateLimitState {
            controller: limiter.clone(),
            trust_forwarded_for: config.rate_limit.trust_forwarded_for,
        };

        let router = Self::build_router(&config, state, rate_limit);
        Self {
            router,
            config,
            limiter,
            shutdown,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState, rate_limit: RateLimitState) -> Router {
        let guarded = Router::new()
            .route("/api/generate", post(generate_handler))
            .route_layer(middleware::from_fn_with_state(rate_limit, rate_limit_middleware));

        Router::new()
            .route("/health", get(health_handler))
            .merge(guarded)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            path = %request.uri().path(),
                            request_id = %request_id(request),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(middleware::from_fn(track_requests))
                    .layer(middleware::from_fn(cors_middleware))
                    .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The admission controller guarding `/api/generate`.
    pub fn limiter(&self) -> Arc<AdmissionController> {
        self.limiter.clone()
    }

    /// Run the server until the shutdown coordinator fires.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            window_secs = self.config.rate_limit.window_secs,
            max_requests = self.config.rate_limit.max_requests,
            models = ?self.config.backend.models,
            "HTTP server starting"
        );

        let sweeper = self.limiter.spawn_sweeper(
            Duration::from_secs(self.config.rate_limit.sweep_interval_secs.max(1)),
            self.shutdown.token(),
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let shutdown = self.shutdown.clone();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        self.shutdown.trigger();
        if let Err(e) = sweeper.await {
            tracing::error!(error = %e, "Rate limit sweeper terminated abnormally");
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
