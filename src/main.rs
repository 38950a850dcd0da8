use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ward_core::config::{
    patient_data_dir_from_env_value, store_kind_from_env_value, system_user_from_env_value,
};
use ward_core::{CoreConfig, WardService, open_store};

/// Main entry point for the ward application
///
/// Starts both gRPC and REST servers concurrently over one shared ward service:
/// - gRPC server on port 50051 (configurable via WARD_ADDR)
/// - REST server on port 3000 (configurable via WARD_REST_ADDR)
///
/// The gRPC server requires authentication via x-api-key header.
///
/// # Environment Variables
/// - `WARD_ADDR`: gRPC server address (default: "0.0.0.0:50051")
/// - `WARD_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `PATIENT_DATA_DIR`: Directory for patient data storage (default: "patient_data")
/// - `WARD_STORE`: `file` or `memory` (default: "file")
/// - `WARD_SYSTEM_USER`: Author of discharge notes (default: "System")
/// - `API_KEY`: API key for gRPC authentication
/// - `WARD_ENABLE_REFLECTION`: `true` to expose gRPC reflection
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ward_run=info".parse()?)
                .add_directive("ward_core=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("api_grpc=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let grpc_addr: SocketAddr = std::env::var("WARD_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:50051".into())
        .parse()?;
    let rest_addr = std::env::var("WARD_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let api_key = std::env::var("API_KEY")
        .map_err(|_| anyhow::anyhow!("API_KEY must be set for the gRPC server"))?;
    let enable_reflection =
        api_grpc::reflection_from_env_value(std::env::var("WARD_ENABLE_REFLECTION").ok());

    let cfg = CoreConfig::new(
        patient_data_dir_from_env_value(std::env::var("PATIENT_DATA_DIR").ok()),
        store_kind_from_env_value(std::env::var("WARD_STORE").ok())?,
        system_user_from_env_value(std::env::var("WARD_SYSTEM_USER").ok())?,
    )?;
    let ward = WardService::load(&cfg, open_store(&cfg)?).await?;
    tracing::info!(
        "loaded {} patients from the {} store",
        ward.patients().await.len(),
        cfg.store_kind()
    );

    tracing::info!("++ Starting ward gRPC on {}", grpc_addr);
    tracing::info!("++ Starting ward REST on {}", rest_addr);

    let rest_app = api_rest::router(api_rest::AppState { ward: ward.clone() });
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    let rest_server = async move {
        axum::serve(listener, rest_app)
            .await
            .map_err(anyhow::Error::from)
    };

    let grpc_server = api_grpc::serve(grpc_addr, ward, api_key, enable_reflection);

    // Either server failing stops the process.
    tokio::try_join!(rest_server, grpc_server)?;

    Ok(())
}
