//! A synchronous client.
//!
//! Wraps the async [`Client`](crate::Client) together with a current-thread
//! `tokio` runtime and blocks on each call. Do not use it from inside an async
//! context: building or calling it there panics, as with any nested runtime.

use snafu::ResultExt;
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};

use crate::client::{Client as AsyncClient, TrackResponse};
use crate::config::ClientConfig;
use crate::error::{Result, RuntimeSnafu};
use crate::request::{AliasIdentity, RecordEvent, SetProperties, TrackingCall};

/// Blocking counterpart of [`crate::Client`].
///
/// ```no_run
/// use kissmetrics_client::blocking::Client;
/// use kissmetrics_client::{AliasIdentity, ClientConfig};
///
/// let mut client = Client::new(ClientConfig::builder().api_key("my-api-key").build())?;
/// client.alias(AliasIdentity::builder().person("anon-42").identity("bob@example.com").build())?;
/// # Ok::<(), kissmetrics_client::ClientError>(())
/// ```
#[derive(Debug)]
pub struct Client {
    inner: AsyncClient,
    runtime: Runtime,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let runtime = RuntimeBuilder::new_current_thread()
            .enable_all()
            .build()
            .context(RuntimeSnafu)?;
        let inner = {
            let _guard = runtime.enter();
            AsyncClient::new(config)?
        };
        Ok(Self { inner, runtime })
    }

    pub fn key(&self) -> &str {
        self.inner.key()
    }

    pub fn config(&self) -> &ClientConfig {
        self.inner.config()
    }

    pub fn url(&self, path_and_query: &str) -> String {
        self.inner.url(path_and_query)
    }

    pub fn record(&mut self, call: RecordEvent) -> Result<TrackResponse> {
        self.runtime.block_on(self.inner.record(call))
    }

    pub fn set(&mut self, call: SetProperties) -> Result<TrackResponse> {
        self.runtime.block_on(self.inner.set(call))
    }

    pub fn alias(&mut self, call: AliasIdentity) -> Result<TrackResponse> {
        self.runtime.block_on(self.inner.alias(call))
    }

    pub fn send(&mut self, call: TrackingCall) -> Result<TrackResponse> {
        self.runtime.block_on(self.inner.send(call))
    }

    pub fn request(&mut self, path_and_query: &str) -> Result<TrackResponse> {
        self.runtime.block_on(self.inner.request(path_and_query))
    }
}
