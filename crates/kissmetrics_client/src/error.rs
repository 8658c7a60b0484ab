use kissmetrics_transport::{Error as TransportError, HttpError};
use snafu::Snafu;

// --- Error Definition ---
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ClientError {
    #[snafu(display("API key cannot be empty"))]
    MissingApiKey,

    #[snafu(display("Unsupported tracking protocol '{protocol}', expected one of (http, https)"))]
    UnsupportedProtocol { protocol: String },

    #[snafu(display("Invalid tracking host '{host}': {reason}"))]
    InvalidHost { host: String, reason: String },

    #[snafu(display("Property key '{key}' collides with a reserved query parameter"))]
    ReservedProperty { key: String },

    #[snafu(display("Invalid resource '{resource}': {reason}"))]
    InvalidResource { resource: String, reason: String },

    #[snafu(display("Required environment variable '{name}' not set"))]
    MissingEnvVar { name: &'static str },

    #[snafu(display("Failed to build HTTP client: {source}"))]
    HttpClientBuild { source: reqwest::Error },

    #[snafu(display("HTTP request construction error: {source}"))]
    RequestConstruction { source: http::Error },

    #[snafu(display("Tracking request failed: {source}"))]
    Transport { source: TransportError },

    #[snafu(display("Failed to start blocking runtime: {source}"))]
    Runtime { source: std::io::Error },
}

impl ClientError {
    /// The transport failure behind a [`ClientError::Transport`], when the transport
    /// reported one of the generic [`HttpError`] kinds.
    pub fn http_error(&self) -> Option<&HttpError> {
        match self {
            ClientError::Transport { source } => source.downcast_ref::<HttpError>(),
            _ => None,
        }
    }

    /// True for failures raised while validating configuration, before any request is sent.
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            ClientError::MissingApiKey
                | ClientError::UnsupportedProtocol { .. }
                | ClientError::InvalidHost { .. }
                | ClientError::MissingEnvVar { .. }
        )
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
