//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! This binary is useful for development and debugging when you only want the REST server (with
//! OpenAPI/Swagger UI). The workspace's main `ward-run` binary runs both gRPC and REST
//! concurrently over one shared ward service.

use api_rest::{router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ward_core::config::{
    patient_data_dir_from_env_value, store_kind_from_env_value, system_user_from_env_value,
};
use ward_core::{open_store, CoreConfig, WardService};

/// Main entry point for the ward REST API server.
///
/// # Environment Variables
/// - `WARD_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `PATIENT_DATA_DIR`: Root of the file record store (default: "patient_data")
/// - `WARD_STORE`: `file` or `memory` (default: "file")
/// - `WARD_SYSTEM_USER`: Author of discharge notes (default: "System")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the record store cannot be opened,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("ward_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("WARD_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = CoreConfig::new(
        patient_data_dir_from_env_value(std::env::var("PATIENT_DATA_DIR").ok()),
        store_kind_from_env_value(std::env::var("WARD_STORE").ok())?,
        system_user_from_env_value(std::env::var("WARD_SYSTEM_USER").ok())?,
    )?;
    let ward = WardService::load(&cfg, open_store(&cfg)?).await?;

    tracing::info!("-- Starting ward REST API on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(AppState { ward })).await?;

    Ok(())
}
