use anyhow::Context;
use dotenvy::dotenv;
use tracing::{error, info};

use rollcall::logging::init_tracing;
use rollcall::metrics::{init_metrics, metrics_app};
use rollcall::router::init_router;
use rollcall::state::AppState;
use rollcall_cli::seeder::{SeedOutcome, seed_principal};
use rollcall_config::{SeedConfig, ServerConfig};
use rollcall_core::errors::set_expose_error_details;
use rollcall_db::{DatabaseConfig, init_db_pool, run_migrations};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let server_config = ServerConfig::from_env();
    let _log_guard = init_tracing(server_config.environment);
    set_expose_error_details(!server_config.environment.is_production());

    let db_config = DatabaseConfig::from_env();
    let db = init_db_pool(&db_config)
        .await
        .context("Failed to connect to database")?;

    if db_config.run_migrations {
        run_migrations(&db).await.context("Failed to run migrations")?;
        info!("Database migrations applied");
    }

    match seed_principal(&db, &SeedConfig::from_env()).await {
        Ok(SeedOutcome::Created(id)) => info!(principal_id = %id, "Principal seeded"),
        Ok(SeedOutcome::AlreadyExists) => info!("Principal already present"),
        Err(e) => error!(error = ?e.error, "Failed to seed principal, continuing without it"),
    }

    match init_metrics().context("Failed to install metrics recorder")? {
        Some(handle) => {
            let metrics_addr = format!("{}:{}", server_config.host, server_config.metrics_port);
            let listener = tokio::net::TcpListener::bind(&metrics_addr)
                .await
                .with_context(|| format!("Failed to bind metrics listener on {metrics_addr}"))?;
            info!(address = %metrics_addr, "Metrics available at /metrics");
            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                    error!(error = %e, "Metrics server stopped");
                }
            });
        }
        None => info!("Observability disabled, metrics exporter not started"),
    }

    let state = AppState::from_env(db);
    let app = init_router(state);

    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    info!(%address, environment = ?server_config.environment, "Server running");
    info!("Swagger UI available at http://{address}/swagger-ui");
    info!("Scalar UI available at http://{address}/scalar");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
