use crate::config::{CorsPolicy, ProductConfig};
use crate::handlers;
use crate::services::{
    seed_database, Lifecycle, LifecycleState, MongoConnector, ProductStore, SeedOutcome,
    StoreConnector,
};
use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn;
use axum::{routing::get, Router};
use once_cell::sync::OnceCell;
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, RequestId,
    REQUEST_ID_HEADER,
};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: ProductConfig,
    pub lifecycle: Lifecycle,
    store: Arc<OnceCell<Arc<dyn ProductStore>>>,
}

impl AppState {
    pub fn new(config: ProductConfig) -> Self {
        Self {
            config,
            lifecycle: Lifecycle::new(),
            store: Arc::new(OnceCell::new()),
        }
    }

    /// The connected store, or `ServiceUnavailable` until the lifecycle is
    /// `Ready`.
    pub fn ready_store(&self) -> Result<Arc<dyn ProductStore>, AppError> {
        if !self.lifecycle.is_ready() {
            return Err(AppError::ServiceUnavailable);
        }
        self.store.get().cloned().ok_or(AppError::ServiceUnavailable)
    }

    fn install_store(&self, store: Arc<dyn ProductStore>) -> Result<(), AppError> {
        self.store
            .set(store)
            .map_err(|_| AppError::InvalidState("store already installed".to_string()))
    }
}

/// Connect, seed, then mark the service ready. Connection failure leaves the
/// service `Degraded`; seeding failure does not prevent `Ready`.
pub async fn bootstrap(state: AppState, connector: Arc<dyn StoreConnector>) -> LifecycleState {
    if let Err(e) = state.lifecycle.transition(LifecycleState::Connecting) {
        tracing::error!(error = %e, "Bootstrap started twice");
        return state.lifecycle.state();
    }

    let store = match connector.connect().await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to document store");
            return settle(&state, LifecycleState::Degraded);
        }
    };

    if let Err(e) = state.install_store(store.clone()) {
        tracing::error!(error = %e, "Failed to install document store");
        return settle(&state, LifecycleState::Degraded);
    }

    let outcome = if state.config.seed_on_startup {
        seed_database(store.as_ref()).await
    } else {
        SeedOutcome::Disabled
    };
    tracing::info!(outcome = ?outcome, "Seeding finished");

    settle(&state, LifecycleState::Ready)
}

fn settle(state: &AppState, next: LifecycleState) -> LifecycleState {
    if let Err(e) = state.lifecycle.transition(next) {
        tracing::error!(error = %e, "Unexpected lifecycle transition");
    }
    state.lifecycle.state()
}

/// One CORS policy, chosen by configuration.
pub fn cors_layer(policy: &CorsPolicy) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    match policy {
        CorsPolicy::Any => layer.allow_origin(Any),
        CorsPolicy::AllowList(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match o.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                        None
                    }
                })
                .collect();
            layer.allow_origin(origins)
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors.policy);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .route("/api/products", get(handlers::list_products))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .extensions()
                    .get::<RequestId>()
                    .map(|RequestId(id)| id.as_str())
                    .or_else(|| {
                        request
                            .headers()
                            .get(REQUEST_ID_HEADER)
                            .and_then(|value| value.to_str().ok())
                    })
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
        .with_state(state)
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
    bootstrap: JoinHandle<LifecycleState>,
}

impl Application {
    pub async fn build(config: ProductConfig) -> Result<Self, AppError> {
        let connector = Arc::new(MongoConnector::new(config.mongodb.clone()));
        Self::build_with_connector(config, connector).await
    }

    /// Binds the listener and starts the bootstrap task without waiting for
    /// it; requests to store-backed routes get 503 until it settles.
    pub async fn build_with_connector(
        config: ProductConfig,
        connector: Arc<dyn StoreConnector>,
    ) -> Result<Self, AppError> {
        let state = AppState::new(config.clone());
        let app = build_router(state.clone());

        let addr = config.common.bind_addr()?;
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Server is running on port {}", port);

        let bootstrap_task = tokio::spawn(bootstrap(state.clone(), connector));

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
            bootstrap: bootstrap_task,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let result = self.server.await;
        self.bootstrap.abort();
        result
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
