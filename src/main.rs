//! User Admin server
//!
//! Reads configuration from TOML (~/.config/user-admin/config.toml or
//! `$USER_ADMIN_CONFIG`), migrates the database, seeds the first admin and
//! serves the REST API until SIGTERM / Ctrl+C.

use tracing::{error, info, warn};

use user_admin::config::AppConfig;
use user_admin::infrastructure::database::run_migrations;
use user_admin::shared::ShutdownSignal;
use user_admin::{create_api_router, init_database, resolve_config_path, AppState, DatabaseConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = resolve_config_path();
    let app_cfg = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.logging.level)),
                )
                .init();
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .init();
            error!("Failed to load config: {}. Using defaults.", e);
            AppConfig::default()
        }
    };

    info!("Starting User Admin...");

    // ── Prometheus metrics recorder ────────────────────────────
    let prometheus_handle = match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            info!("Prometheus metrics recorder installed");
            Some(handle)
        }
        Err(e) => {
            warn!("Metrics disabled, could not install recorder: {}", e);
            None
        }
    };

    // ── Database ───────────────────────────────────────────────
    let db_config = DatabaseConfig {
        url: app_cfg.database.url.clone(),
    };
    let db = match init_database(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = run_migrations(&db).await {
        error!("Failed to run migrations: {}", e);
        return Err(e.into());
    }

    let state = AppState::new(db.clone(), app_cfg.listing.limits());

    if let Err(e) = state.user_service.seed_admin(&app_cfg.admin).await {
        error!("Failed to create default admin: {}", e);
    }

    // ── Shutdown handling ──────────────────────────────────────
    let shutdown = ShutdownSignal::new();
    shutdown.listen_for_os_signals();

    // ── REST API ───────────────────────────────────────────────
    let router = create_api_router(state, prometheus_handle);
    let api_addr = app_cfg.server.address();
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("REST API listening on http://{}", api_addr);
    info!("Swagger UI available at http://{}/docs/", api_addr);

    let api_shutdown = shutdown.clone();
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        api_shutdown.wait().await;
        info!("REST API received shutdown signal, draining requests");
    });
    let mut server_task = tokio::spawn(async move { server.await });

    let finished_early = tokio::select! {
        result = &mut server_task => Some(result),
        _ = shutdown.wait() => None,
    };

    let result = match finished_early {
        Some(result) => result,
        None => match tokio::time::timeout(app_cfg.server.shutdown_timeout(), server_task).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Requests still running after {}s, shutting down anyway",
                    app_cfg.server.shutdown_timeout
                );
                Ok(Ok(()))
            }
        },
    };

    match result {
        Ok(Ok(())) => info!("REST API server stopped"),
        Ok(Err(e)) => error!("REST API server error: {}", e),
        Err(e) => error!("REST API server task panicked: {}", e),
    }

    // ── Cleanup ────────────────────────────────────────────────
    if let Err(e) = db.close().await {
        warn!("Error closing database connection: {}", e);
    } else {
        info!("Database connection closed");
    }

    info!("User Admin shutdown complete");
    Ok(())
}
