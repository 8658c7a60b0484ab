// src/reqwest_integration.rs
use crate::http::HttpError;
use crate::internal_event::{HttpRequestCompleted, HttpRequestFailed, InternalEvent};
use bytes::Bytes;
use futures::future::BoxFuture;
use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
use std::task::{Context, Poll};
use std::time::Instant;
use tower::Service;

/// A `tower::Service` wrapper for `reqwest::Client`.
///
/// Accepts `http::Request<Option<Bytes>>` and resolves to the fully buffered
/// `http::Response<Bytes>`. Any non-2xx status is turned into
/// [`HttpError::ServerError`] carrying the response body.
#[derive(Clone, Debug)]
pub struct ReqwestService {
    client: reqwest::Client,
}

impl ReqwestService {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn new_with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestService {
    fn default() -> Self {
        Self::new()
    }
}

fn record_failure(error: HttpError, started: Instant) -> HttpError {
    HttpRequestFailed {
        kind: error.kind(),
        elapsed: started.elapsed(),
    }
    .emit();
    error
}

impl Service<HttpRequest<Option<Bytes>>> for ReqwestService {
    type Response = HttpResponse<Bytes>;
    type Error = HttpError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, http_request: HttpRequest<Option<Bytes>>) -> Self::Future {
        let started = Instant::now();
        let (parts, body_option) = http_request.into_parts();

        let url_str = parts.uri.to_string();
        let url = match reqwest::Url::parse(&url_str) {
            Ok(u) => u,
            Err(parse_err) => {
                let ge = HttpError::InvalidRequest {
                    details: format!("Invalid URL '{}': {}", url_str, parse_err),
                };
                return Box::pin(async move { Err(record_failure(ge, started)) });
            }
        };

        let mut request_builder = self.client.request(parts.method, url);

        for (header_name, header_value) in parts.headers.iter() {
            request_builder = request_builder.header(header_name, header_value);
        }

        if let Some(body) = body_option {
            request_builder = request_builder.body(body);
        }

        let request_future = request_builder.send();
        Box::pin(async move {
            let response = match request_future.await {
                Ok(response) => response,
                Err(e) => {
                    // The URL carries the API key in its query string.
                    let e = e.without_url();
                    let error = if e.is_timeout() {
                        warn!(target: "kissmetrics_transport", error = %e, "Request timed out");
                        HttpError::Timeout
                    } else if e.is_connect() {
                        error!(target: "kissmetrics_transport", error = %e, "Connection error");
                        HttpError::Transport {
                            source: Box::new(e),
                        }
                    } else {
                        error!(target: "kissmetrics_transport", error = %e, "Other reqwest error");
                        HttpError::ClientError {
                            source: Box::new(e),
                        }
                    };
                    return Err(record_failure(error, started));
                }
            };

            let status = response.status();
            let version = response.version();
            let headers = response.headers().clone();

            if !status.is_success() {
                let error_body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Could not read error body".to_string());

                if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                    warn!(
                        target: "kissmetrics_transport",
                        status = %status,
                        error_body = %error_body,
                        "Server error or rate limited"
                    );
                } else {
                    error!(
                        target: "kissmetrics_transport",
                        status = %status,
                        error_body = %error_body,
                        "Client error"
                    );
                }

                return Err(record_failure(
                    HttpError::ServerError {
                        status: status.as_u16(),
                        body: error_body,
                    },
                    started,
                ));
            }

            let body = match response.bytes().await {
                Ok(body) => body,
                Err(e) => {
                    let e = e.without_url();
                    error!(target: "kissmetrics_transport", error = %e, "Failed to read response body");
                    return Err(record_failure(
                        HttpError::ClientError {
                            source: Box::new(e),
                        },
                        started,
                    ));
                }
            };

            HttpRequestCompleted {
                status: status.as_u16(),
                elapsed: started.elapsed(),
            }
            .emit();

            let mut http_response = HttpResponse::new(body);
            *http_response.status_mut() = status;
            *http_response.version_mut() = version;
            *http_response.headers_mut() = headers;
            Ok(http_response)
        })
    }
}
