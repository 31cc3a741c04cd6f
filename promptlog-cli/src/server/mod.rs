pub mod config;
mod error;
mod routes;
mod state;

use std::process;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use promptlog_lib::Store;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use self::config::ServerSettings;
use self::routes::{
    handle_create, handle_delete, handle_get, handle_health, handle_list,
};
use self::state::AppState;

/// Build the HTTP router. The logs routes are served at the root and again
/// under `/api`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let logs: Router<Arc<AppState>> = Router::new()
        .route("/logs", get(handle_list).post(handle_create))
        .route("/logs/{id}", get(handle_get).delete(handle_delete));

    Router::new()
        .route("/healthz", get(handle_health))
        .merge(logs.clone())
        .nest("/api", logs)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .with_state(state)
}

pub async fn run_serve(settings: ServerSettings) {
    let store = match Store::open(&settings.db_path) {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "failed to open log store");
            process::exit(1);
        }
    };

    let db = store.path().display().to_string();
    let app = build_router(Arc::new(AppState::new(store)));

    let addr = settings.addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind");
            process::exit(1);
        }
    };

    info!(
        %addr,
        %db,
        "promptlog listening on http://{}",
        addr
    );

    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    error!(error = %e, "failed to install SIGTERM handler");
                    process::exit(1);
                }
            };

        #[cfg(unix)]
        tokio::select! {
            _ = ctrl_c => {},
            _ = sigterm.recv() => {},
        }

        #[cfg(not(unix))]
        ctrl_c.await.ok();

        info!("shutdown signal received, finishing in-flight requests");
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        error!(error = %e, "server error");
        process::exit(1);
    }

    info!("server stopped");
}
