//! Catalog API Server Entry Point
//!
//! Bootstraps configuration, connects the configured store and cache, and
//! serves REST (and gRPC with the `grpc` feature) until Ctrl-C.

use std::net::SocketAddr;

use catalog_api::telemetry::{init_tracing, TelemetryConfig};
use catalog_api::{build_state, create_api_router, ApiConfig, ApiError, ApiResult};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracing(&telemetry_config)?;

    let api_config = ApiConfig::from_env();
    tracing::info!(
        store = %api_config.store,
        cache = %api_config.cache,
        "Starting catalog service"
    );

    let state = build_state(&api_config, &telemetry_config.service_name).await?;

    #[cfg(feature = "grpc")]
    let grpc_service = catalog_api::create_services(state.service.clone());

    let app = create_api_router(state, &api_config);

    let addr = resolve_bind_addr(&api_config.bind_host, api_config.http_port).await?;
    tracing::info!("REST API listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;
    let rest = async move {
        axum::serve(listener, app)
            .await
            .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))
    };

    #[cfg(feature = "grpc")]
    let servers = {
        let grpc_addr = resolve_bind_addr(&api_config.bind_host, api_config.grpc_port).await?;
        tracing::info!("gRPC API listening on {}", grpc_addr);
        let grpc = async move {
            tonic::transport::Server::builder()
                .add_service(grpc_service)
                .serve(grpc_addr)
                .await
                .map_err(|e| ApiError::internal_error(format!("gRPC server error: {}", e)))
        };
        async move { tokio::try_join!(rest, grpc).map(|_| ()) }
    };

    #[cfg(not(feature = "grpc"))]
    let servers = rest;

    tokio::select! {
        result = servers => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

/// Resolve the bind host (IP literal or hostname) to the first address it names.
async fn resolve_bind_addr(host: &str, port: u16) -> ApiResult<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| {
            ApiError::internal_error(format!("Failed to resolve bind address {}:{}: {}", host, port, e))
        })?
        .next()
        .ok_or_else(|| {
            ApiError::internal_error(format!("Bind address {}:{} resolved to nothing", host, port))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_api::ErrorCode;

    #[tokio::test]
    async fn test_resolve_bind_addr_accepts_ip_literals() {
        let addr = resolve_bind_addr("0.0.0.0", 8080).await.unwrap();
        assert_eq!(addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
    }

    #[tokio::test]
    async fn test_resolve_bind_addr_accepts_hostnames() {
        let addr = resolve_bind_addr("localhost", 8081).await.unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 8081);
    }

    #[tokio::test]
    async fn test_unresolvable_bind_host_is_internal_error() {
        let err = resolve_bind_addr("not a host", 8080).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalError);
    }
}
