//! Client for the KISSmetrics event tracking API.
//!
//! Three calls are supported, each sent as an HTTP GET with the parameters in the
//! query string:
//!
//! | call | resource | adds |
//! |------|----------|------|
//! | [`Client::record`] | `e` | `_n` = event name, properties |
//! | [`Client::set`] | `s` | properties |
//! | [`Client::alias`] | `a` | `_n` = second identity |
//!
//! Every call carries `_k` (API key) and `_p` (person). A timestamp adds `_d=1`
//! and `_t=<unix seconds>`. The resource may be overridden per call.
//!
//! [`Client`] is async and generic over its `tower::Service` transport;
//! [`blocking::Client`] drives it on a private runtime for synchronous callers.
//! The pure builders in [`query_string`] and [`request`] produce the same paths
//! without any I/O.
pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod internal_event;
pub mod properties;
pub mod query_string;
pub mod request;

#[macro_use]
extern crate tracing;

pub use client::{Client, TrackResponse};
pub use config::{ClientConfig, DEFAULT_TRACKING_HOST, Protocol};
pub use error::ClientError;
pub use properties::Properties;
pub use request::{AliasIdentity, RecordEvent, SetProperties, TrackingCall};
