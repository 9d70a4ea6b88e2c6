//! HTTP server: binds the listener and wraps the route table in the
//! cross-cutting layers.

use std::any::Any;
use std::future::Future;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as CorsAny, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::api::middleware::track_metrics;
use crate::config::{CorsPolicy, ServerConfig};
use crate::error::{ApiError, ErrorBody, Result, ServiceError};
use crate::utils::shutdown_signal;

/// The service's HTTP server.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    router: Router,
}

impl Server {
    /// Create a server for an already built route table.
    pub fn new(config: ServerConfig, router: Router) -> Self {
        Self { config, router }
    }

    /// Resolved settings this server runs with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener> {
        TcpListener::bind((self.config.host.as_str(), self.config.port))
            .await
            .map_err(|source| ServiceError::Bind {
                addr: self.config.address(),
                source,
            })
    }

    /// The route table with CORS, tracing, metrics and panic recovery applied.
    pub fn into_service(self) -> Router {
        let debug = self.config.debug;

        self.router
            .layer(CatchPanicLayer::custom(
                move |panic: Box<dyn Any + Send + 'static>| panic_response(panic, debug),
            ))
            .layer(middleware::from_fn(track_metrics))
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&self.config.cors))
    }

    /// Serve on `listener` until `signal` resolves, then drain in-flight requests.
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        info!(debug = self.config.debug, "HTTP server listening on {}", addr);

        axum::serve(listener, self.into_service())
            .with_graceful_shutdown(signal)
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Bind and serve until Ctrl-C or SIGTERM.
    pub async fn run(self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve_with_shutdown(listener, shutdown_signal()).await
    }
}

fn cors_layer(policy: &CorsPolicy) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    match policy {
        CorsPolicy::Any => CorsLayer::new()
            .allow_origin(CorsAny)
            .allow_methods(methods)
            .allow_headers(CorsAny),
        CorsPolicy::Origins(origins) => {
            // Validated by Config::validate.
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok())
                .collect();

            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(methods)
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_credentials(true)
        }
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>, debug: bool) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!(panic = %detail, "request handler panicked");

    let mut body = ErrorBody::new(ApiError::Internal(String::new()).to_string());
    if debug {
        body.details = Some(detail);
    }
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
