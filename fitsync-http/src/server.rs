use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use fitsync::{SyncConfig, SyncRuntime};
use fitsync_remote::{ConnectivityProbe, RemoteClient, RemoteConfig};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{
    clear_queue, complete_session, delete_session, enqueue, force_sync, get_session, health,
    list_queue, list_sessions, record_set, set_network, start_session, sync_status, AppState,
};
use crate::middleware::{allow_private_network, normalize_content_type};
use crate::openapi::ApiDoc;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:7800";

/// All routes over `state`, with the same layers `serve` uses.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route(
            "/1/queue",
            post(enqueue).get(list_queue).delete(clear_queue),
        )
        .route("/1/sync", post(force_sync))
        .route("/1/sync/status", get(sync_status))
        .route("/1/network", post(set_network))
        .route("/1/sessions", post(start_session).get(list_sessions))
        .route(
            "/1/sessions/:id",
            get(get_session).delete(delete_session),
        )
        .route("/1/sessions/:id/sets", post(record_set))
        .route("/1/sessions/:id/complete", post(complete_session))
        .with_state(state);

    let swagger = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(api)
        .merge(swagger)
        .layer(middleware::from_fn(normalize_content_type))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive().max_age(Duration::from_secs(86400)))
        .layer(middleware::from_fn(allow_private_network))
}

pub async fn serve() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SyncConfig::from_env();
    let bind_addr =
        std::env::var("FITSYNC_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

    let remote_config = RemoteConfig::load_or_default(&config.data_dir);
    let remote = Arc::new(RemoteClient::new(&remote_config));

    tracing::info!(
        data_dir = %config.data_dir.display(),
        queue_key = %config.queue_key,
        max_retries = config.max_retries,
        drain_interval_secs = config.drain_interval_secs,
        start_online = config.start_online,
        remote = %remote_config.base_url,
        "Sync configuration loaded"
    );

    let probe_interval = config.probe_interval_secs;
    let runtime = SyncRuntime::open(
        config,
        remote.clone(),
        tracing::info_span!("sync", device = %remote_config.device_id),
    )?;

    let background = tokio::spawn(runtime.manager.clone().run_background());

    let probe = if probe_interval > 0 {
        let probe = ConnectivityProbe::new(
            remote.clone(),
            runtime.network.clone(),
            Duration::from_secs(probe_interval),
        );
        tokio::spawn(probe.clone().run());
        Some(probe)
    } else {
        tracing::info!("[NET] connectivity probe disabled, waiting for POST /1/network");
        None
    };

    let state = Arc::new(AppState {
        manager: runtime.manager.clone(),
        sessions: runtime.sessions.clone(),
        network: runtime.network.clone(),
    });
    let app = build_router(state);

    tracing::info!("Starting fitsync server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(probe) = probe {
        probe.shutdown();
    }
    runtime.manager.shutdown().await;
    if let Err(e) = background.await {
        tracing::warn!("[SYNC] background task ended abnormally: {}", e);
    }
    tracing::info!("fitsync server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
