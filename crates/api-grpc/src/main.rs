//! Standalone gRPC server binary.
//!
//! Runs only the gRPC API. The workspace's main `ward-run` binary runs gRPC and REST together
//! over one shared ward service.

use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ward_core::config::{
    patient_data_dir_from_env_value, store_kind_from_env_value, system_user_from_env_value,
};
use ward_core::{open_store, CoreConfig, WardService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_grpc=info".parse()?)
                .add_directive("ward_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr: SocketAddr = std::env::var("WARD_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:50051".into())
        .parse()?;
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

    tracing::info!("-- Starting ward gRPC on {}", addr);
    api_grpc::serve(addr, ward, api_key, enable_reflection).await
}
