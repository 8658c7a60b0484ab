// src/http.rs
use crate::Error as CrateError;
use snafu::Snafu;

/// A generic error enumeration for HTTP-related issues.
///
/// [`ReqwestService`](crate::ReqwestService) maps every `reqwest` failure onto one
/// of these variants. Other transports are expected to do the same so callers
/// can match on the failure kind without knowing which client sent the request.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum HttpError {
    /// An error occurred during the transport of the request (e.g., network issue, DNS).
    #[snafu(display("HTTP transport error: {}", source))]
    Transport { source: CrateError },

    /// The request itself was malformed or invalid before sending.
    #[snafu(display("Invalid HTTP request: {}", details))]
    InvalidRequest { details: String },

    /// The server responded with a non-success status code.
    #[snafu(display("HTTP server error response (status {}): {}", status, body))]
    ServerError { status: u16, body: String },

    /// A timeout occurred.
    #[snafu(display("HTTP request timed out"))]
    Timeout,

    /// Other, unspecified HTTP client errors.
    #[snafu(display("Generic HTTP client error: {}", source))]
    ClientError { source: CrateError },
}

impl HttpError {
    /// Status code returned by the server, when the failure was an error response.
    pub const fn status(&self) -> Option<u16> {
        match self {
            HttpError::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short label used for metrics and log fields.
    pub const fn kind(&self) -> &'static str {
        match self {
            HttpError::Transport { .. } => "transport",
            HttpError::InvalidRequest { .. } => "invalid_request",
            HttpError::ServerError { .. } => "server_error",
            HttpError::Timeout => "timeout",
            HttpError::ClientError { .. } => "client_error",
        }
    }
}
