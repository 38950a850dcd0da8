//! # API gRPC
//!
//! gRPC server implementation for the ward.
//!
//! Handles:
//! - gRPC service setup and API-key authentication
//! - The `Ward` service, backed by a shared `ward_core::WardService`
//! - Mapping of ward errors onto gRPC status codes
//!
//! Uses `api-shared` for wire types and conversions.

#![warn(rust_2018_idioms)]

pub use service::{pb, status_from, ApiKeyInterceptor, WardGrpcService};

pub mod service;

use api_shared::pb::ward_server::WardServer;
use api_shared::FILE_DESCRIPTOR_SET;
use std::net::SocketAddr;
use tonic::transport::Server;
use ward_core::WardService;

/// Serves the `Ward` gRPC service on `addr` until the server fails.
pub async fn serve(
    addr: SocketAddr,
    ward: WardService,
    api_key: String,
    enable_reflection: bool,
) -> anyhow::Result<()> {
    let svc = WardServer::with_interceptor(
        WardGrpcService::new(ward),
        ApiKeyInterceptor::new(api_key),
    );
    let mut server_builder = Server::builder().add_service(svc);

    if enable_reflection {
        let reflection_service = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()?;
        server_builder = server_builder.add_service(reflection_service);
        tracing::info!("gRPC server reflection enabled");
    } else {
        tracing::info!("gRPC server reflection disabled");
    }

    server_builder.serve(addr).await?;
    Ok(())
}

/// Reads `WARD_ENABLE_REFLECTION`; only `true` (any case) enables it.
pub fn reflection_from_env_value(value: Option<String>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}
