//! HTTP plumbing for the KISSmetrics tracking client.
//!
//! This crate wraps a [`reqwest::Client`] in a [`tower::Service`] that speaks
//! `http::Request<Option<Bytes>>` / `http::Response<Bytes>`, so the client crate
//! can be driven by any service with the same shape (a mock in tests, a
//! layered stack in production).
//!
//! # Basic Usage
//! ```no_run
//! use bytes::Bytes;
//! use kissmetrics_transport::reqwest_integration::ReqwestService;
//! use tower::{Service, ServiceExt};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let mut service = ReqwestService::new();
//! let request = http::Request::get("http://trk.kissmetrics.com/e?_k=key&_p=bob&_n=signed_up")
//!     .body(None::<Bytes>)?;
//! let response = service.ready().await?.call(request).await?;
//! assert!(response.status().is_success());
//! # Ok(())
//! # }
//! ```
//!
//! # Metrics
//! Emits counters and histograms via the [`internal_event::InternalEvent`] trait.
pub mod http;
pub mod internal_event;
pub mod reqwest_integration;

#[macro_use]
extern crate tracing;

pub use crate::http::HttpError;
pub use crate::reqwest_integration::ReqwestService;

pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;
