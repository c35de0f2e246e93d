//! Prometheus metrics backend for the todo repositories.
//!
//! This crate provides a [`PrometheusMetrics`] implementation of [`todo_core::MetricsBackend`] that exposes metrics in Prometheus format.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use todo_core::{MemoryStore, TaskRepository};
//! use todo_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let repo = TaskRepository::new(Arc::new(MemoryStore::new()))
//!     .with_metrics(Arc::new(metrics.clone()));
//!
//! // Render for a `/metrics` endpoint.
//! let body = metrics.encode_text()?;
//! # let _ = (repo, body);
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `todo_repository_operations_total{operation, outcome}` - Counter
//! - `todo_decode_failures_total{namespace}` - Counter
//! - `todo_query_duration_seconds{operation}` - Histogram
//!
//! ## HTTP Server
//! This crate does NOT provide an HTTP server; mount [`PrometheusMetrics::encode_text`] in your router.

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
