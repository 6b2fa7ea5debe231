//! hwtail-core — log tailing and snapshot publishing for hwtail.
//!
//! Provides:
//! - `collector` — log discovery, header mapping, value normalization, the tailer
//!   and the monitor state machine driving them
//! - `store` — the concurrency-safe holder of the latest published snapshot
//! - `model` — the published snapshot schema
//! - `config` — monitor configuration and defaults
//! - `error` — error taxonomy of the tailer
//!
//! With `api` feature:
//! - OpenAPI schemas (`utoipa::ToSchema`) for every `model` type

pub mod collector;
pub mod config;
pub mod error;
pub mod model;
pub mod store;

pub use config::{LogSource, MonitorConfig};
pub use error::TailError;
pub use model::{MetricSnapshot, Status};
pub use store::SnapshotStore;

/// Crate version, shared by the binaries.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
