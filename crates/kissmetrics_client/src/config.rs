use std::{fmt, str::FromStr, time::Duration};

use bon::Builder;
use http::uri::Authority;
use snafu::{OptionExt, ensure};
use url::Url;

use crate::error::{
    ClientError, InvalidHostSnafu, MissingApiKeySnafu, MissingEnvVarSnafu, Result,
    UnsupportedProtocolSnafu,
};

// --- Constants ---
pub const DEFAULT_TRACKING_HOST: &str = "trk.kissmetrics.com";
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

// --- Configuration Environment Variable Names ---
pub const ENV_API_KEY: &str = "KISSMETRICS_API_KEY";
pub const ENV_HOST: &str = "KISSMETRICS_HOST"; // Optional
pub const ENV_PROTOCOL: &str = "KISSMETRICS_PROTOCOL"; // Optional

/// Scheme used to reach the tracking host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl Protocol {
    pub const fn as_str(self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            other => UnsupportedProtocolSnafu { protocol: other }.fail(),
        }
    }
}

/// Configuration for [`Client`](crate::Client).
///
/// Nothing is checked until the client is constructed; see [`ClientConfig::base_url`].
///
/// ```
/// use kissmetrics_client::{ClientConfig, Protocol};
///
/// let config = ClientConfig::builder()
///     .api_key("my-api-key")
///     .protocol(Protocol::Https)
///     .build();
/// assert_eq!(config.base_url().unwrap(), "https://trk.kissmetrics.com");
/// ```
#[derive(Clone, Builder)]
pub struct ClientConfig {
    #[builder(into)]
    pub api_key: String,

    /// Host name with an optional port, e.g. `trk.kissmetrics.com` or `localhost:8080`.
    #[builder(into, default = DEFAULT_TRACKING_HOST.to_string())]
    pub host: String,

    #[builder(default)]
    pub protocol: Protocol,

    /// Sent as the `User-Agent` header. An empty string suppresses the header.
    #[builder(into, default = DEFAULT_USER_AGENT.to_string())]
    pub user_agent: String,

    /// Whole-request timeout for the default HTTP client. Ignored when
    /// `reqwest_client` is supplied.
    pub timeout: Option<Duration>,

    pub reqwest_client: Option<reqwest::Client>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            host: DEFAULT_TRACKING_HOST.to_string(),
            protocol: Protocol::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
            reqwest_client: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("host", &self.host)
            .field("protocol", &self.protocol)
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .field("custom_reqwest_client", &self.reqwest_client.is_some())
            .finish()
    }
}

impl ClientConfig {
    /// Builds a configuration from loosely typed parts, parsing the protocol name.
    pub fn from_parts(
        api_key: impl Into<String>,
        host: impl Into<String>,
        protocol: &str,
    ) -> Result<Self> {
        Ok(Self::builder()
            .api_key(api_key)
            .host(host)
            .protocol(protocol.parse()?)
            .build())
    }

    /// Reads `KISSMETRICS_API_KEY` (required), `KISSMETRICS_HOST` and
    /// `KISSMETRICS_PROTOCOL` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ClientConfig::from_env`] with a caller-supplied variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY)
            .filter(|value| !value.is_empty())
            .context(MissingEnvVarSnafu { name: ENV_API_KEY })?;
        let host = lookup(ENV_HOST).unwrap_or_else(|| DEFAULT_TRACKING_HOST.to_string());
        let protocol = match lookup(ENV_PROTOCOL) {
            Some(value) => value.parse()?,
            None => Protocol::default(),
        };

        Ok(Self::builder()
            .api_key(api_key)
            .host(host)
            .protocol(protocol)
            .build())
    }

    /// Validates the configuration and returns `<protocol>://<host>`.
    pub fn base_url(&self) -> Result<String> {
        ensure!(!self.api_key.is_empty(), MissingApiKeySnafu);
        validate_host(&self.host, self.protocol)?;
        Ok(format!("{}://{}", self.protocol, self.host))
    }
}

fn validate_host(host: &str, protocol: Protocol) -> Result<()> {
    ensure!(
        !host.is_empty(),
        InvalidHostSnafu {
            host,
            reason: "host is empty"
        }
    );
    ensure!(
        !host.contains(['/', '?', '#', '@']) && !host.chars().any(char::is_whitespace),
        InvalidHostSnafu {
            host,
            reason: "expected a bare host name with an optional port"
        }
    );

    // Requests are built with `http`, which takes the host verbatim.
    Authority::from_str(host).map_err(|e| {
        InvalidHostSnafu {
            host,
            reason: e.to_string(),
        }
        .build()
    })?;

    let parsed = Url::parse(&format!("{protocol}://{host}")).map_err(|e| {
        InvalidHostSnafu {
            host,
            reason: e.to_string(),
        }
        .build()
    })?;
    ensure!(
        parsed.host_str().is_some_and(|name| !name.is_empty()),
        InvalidHostSnafu {
            host,
            reason: "missing host name"
        }
    );
    Ok(())
}
