mod app;
mod config;
mod leaflet;
mod routes;
mod services;
mod state;
#[cfg(test)]
mod test_support;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = Settings::from_env();
    if let Err(e) = services::assets::verify_assets(&settings) {
        tracing::error!(error = %e, "missing static asset, refusing to start");
        return;
    }

    let state = AppState::new(settings);
    match state.load_layers().await {
        Ok(layers) => {
            tracing::info!(
                boundary_features = layers.boundary.len(),
                facilities = layers.facilities.len(),
                name_field = %layers.facilities.name_field,
                "layer cache warmed"
            );
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to warm layer cache, renders will retry");
        }
    }

    let app = app::build_app(state);

    let addr = format!("0.0.0.0:{}", config::server_port());
    tracing::info!("UBS map server listening on {addr}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind TCP listener");
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server failed");
    }

    tracing::info!("Server shut down gracefully");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
