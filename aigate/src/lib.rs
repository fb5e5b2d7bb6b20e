//! # aigate: HTTP gateway for a hosted inference API
//!
//! `aigate` exposes four AI operations over plain HTTP and forwards each one to a third-party,
//! account-scoped inference API (Cloudflare Workers AI shaped). The models themselves run
//! entirely upstream; this crate translates requests, marshals binary and base64 payloads,
//! falls back to default assets, and saves returned images to disk.
//!
//! ## Request Flow
//!
//! Every request walks the same linear pipeline, and the first failing stage short-circuits
//! the rest:
//!
//! 1. **Resolve** ([`assets`]): inpainting image and mask come from inline base64, a local file,
//!    or a remote URL, in that order
//! 2. **Build** ([`operations`]): the operation is turned into a model-specific request body with
//!    configured defaults filled in
//! 3. **Send** ([`upstream`]): one bearer-authenticated POST, no retries, non-2xx is an error
//! 4. **Persist** ([`artifacts`]): image results are written as `<prefix>_<millis>.png`
//! 5. **Respond**: a JSON body, or a JSON error envelope rendered from [`errors::Error`]
//!
//! Handlers share no mutable state. The configuration, HTTP client and artifact store are
//! built once at startup and cloned into each request through [`AppState`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use aigate::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = aigate::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     aigate::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config)?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod artifacts;
pub mod assets;
pub mod codec;
pub mod config;
pub mod errors;
mod openapi;
pub mod operations;
pub mod telemetry;
pub mod upstream;

#[cfg(test)]
mod test;
#[cfg(test)]
pub mod test_utils;

use crate::{
    artifacts::{ArtifactStore, LocalArtifactStore},
    assets::AssetResolver,
    config::CorsOrigin,
    openapi::ApiDoc,
    operations::RequestBuilder,
    upstream::UpstreamClient,
};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{self, HeaderValue},
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// Everything in here is read-only after startup; cloning is cheap.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(Arc::new(config))
///     .request_builder(Arc::new(request_builder))
///     .upstream(Arc::new(upstream_client))
///     .assets(asset_resolver)
///     .artifacts(Arc::new(LocalArtifactStore::new("./generated_images")))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Arc<Config>,
    pub request_builder: Arc<RequestBuilder>,
    pub upstream: Arc<UpstreamClient>,
    pub assets: AssetResolver,
    pub artifacts: Arc<dyn ArtifactStore>,
}

impl AppState {
    /// Wire up the production components from configuration.
    ///
    /// A single pooled HTTP client is shared by the upstream client and the asset resolver.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        let upstream = UpstreamClient::from_config(client.clone(), &config.upstream)?;
        let request_builder = RequestBuilder::new(config.models.clone(), config.defaults.clone());
        let artifacts = LocalArtifactStore::new(config.output_dir.clone());

        Ok(AppState::builder()
            .request_builder(Arc::new(request_builder))
            .upstream(Arc::new(upstream))
            .assets(AssetResolver::new(client))
            .artifacts(Arc::new(artifacts))
            .config(Arc::new(config))
            .build())
    }
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    // A wildcard anywhere in the list means any origin; tower-http rejects `*` inside a list
    let allow_origin = if config.cors.allowed_origins.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_credentials(config.cors.allow_credentials);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

async fn root() -> &'static str {
    "aigate is running"
}

/// Build the application router with all endpoints and middleware.
///
/// Includes the four operation routes, health and documentation routes, the request body limit,
/// CORS, optional Prometheus metrics and a tracing layer.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let max_body_bytes = state.config.limits.max_body_bytes;
    let cors_layer = create_cors_layer(&state.config)?;
    let enable_metrics = state.config.enable_metrics;

    let router = Router::new()
        .route("/", get(root))
        .route("/healthz", get(|| async { "OK" }))
        .route("/generate", post(api::handlers::images::generate))
        .route("/inpaint", post(api::handlers::images::inpaint))
        .route("/judge", post(api::handlers::classification::judge))
        .route("/summarize", post(api::handlers::summaries::summarize))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let mut router = router.layer(cors_layer);

    if enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The assembled HTTP application.
///
/// 1. **Create**: [`Application::new`] wires components from configuration and builds the router
/// 2. **Serve**: [`Application::serve`] binds to the configured address and handles requests
///    until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting aigate with configuration: {:#?}", config);
        let state = AppState::from_config(config.clone())?;
        let router = build_router(state)?;
        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "aigate listening on http://{}, writing images to {}",
            bind_addr,
            self.config.output_dir.display()
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("aigate stopped");
        Ok(())
    }
}
