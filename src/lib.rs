//! DMIQ Core Service.
//!
//! A small JSON REST service: service info, health and status endpoints plus
//! a sample data resource that lists a fixed fixture and echoes posted JSON.
//! Nothing is persisted and no handler shares state.
//!
//! # Routes
//!
//! ```text
//! GET  /               service info
//! GET  /health         health check
//! GET  /api/v1/status  API status
//! GET  /api/v1/data    sample data fixture
//! POST /api/v1/data    echo submitted JSON
//! ```
//!
//! Every response, errors included, carries a JSON body.
//!
//! # Modules
//!
//! - [`api`]: Route table, handlers and response middleware
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`metrics`]: Request metrics and Prometheus exporter
//! - [`server`]: Listener binding, cross-cutting layers, graceful shutdown
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod server;
pub mod utils;

pub use config::{Config, ServerConfig};
pub use error::{ApiError, Result, ServiceError};
pub use server::Server;
