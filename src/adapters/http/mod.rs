//! Salesdesk REST API.
//!
//! Every business route lives under `/api` and answers with the
//! [`ApiResponse`] envelope. `/health` and `/api` are plain text probes.

mod auth;
mod banks;
mod catalog;
mod clients;
mod companies;
mod devices;
pub mod error;
mod invoices;
pub mod response;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::{middleware, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domain::models::{PageRequest, SearchFilter, ServerConfig};

pub use error::{ApiError, ApiResult};
pub use response::ApiResponse;
pub use state::AppState;

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Whether to enable CORS.
    pub enable_cors: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for HttpConfig {
    fn from(server: &ServerConfig) -> Self {
        Self {
            host: server.host.clone(),
            port: server.port,
            enable_cors: server.enable_cors,
        }
    }
}

/// Paging and filter parameters shared by list endpoints, read from the
/// body or the query string. `filerValue` is accepted as an alias.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default, rename = "filterValue", alias = "filerValue")]
    pub filter_value: Option<String>,
}

impl ListParams {
    pub fn into_parts(self) -> ApiResult<(PageRequest, SearchFilter)> {
        let page = PageRequest::new(self.page, self.limit)?;
        Ok((page, SearchFilter::new(self.filter_value.as_deref())))
    }
}

/// Build the full router over `state`.
pub fn build_router(state: Arc<AppState>, enable_cors: bool) -> Router {
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api", get(api_root))
        .merge(auth::routes())
        .merge(clients::routes())
        .merge(companies::routes())
        .merge(catalog::routes())
        .merge(banks::routes())
        .merge(invoices::routes())
        .merge(devices::routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer))
        .with_state(state);

    if enable_cors {
        app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
            .layer(TraceLayer::new_for_http())
    } else {
        app.layer(TraceLayer::new_for_http())
    }
}

/// Salesdesk HTTP server.
pub struct HttpServer {
    config: HttpConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    pub fn new(state: Arc<AppState>, config: HttpConfig) -> Self {
        Self { config, state }
    }

    /// Start the server, stopping gracefully when `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let router = build_router(self.state, self.config.enable_cors);

        tracing::info!("salesdesk HTTP server listening on {}", addr);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

async fn health_check() -> &'static str {
    "OK"
}

async fn api_root() -> &'static str {
    "API is running"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_alias() {
        let params: ListParams = serde_json::from_str(r#"{"page": 2, "filerValue": " Acme "}"#).unwrap();
        let (page, filter) = params.into_parts().unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(page.limit, 10);
        assert_eq!(filter.value(), Some("acme"));

        let params: ListParams = serde_json::from_str(r#"{"limit": 0}"#).unwrap();
        assert!(params.into_parts().is_err());
    }
}
