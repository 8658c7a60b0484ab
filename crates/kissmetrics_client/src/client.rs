use std::fmt::{self, Debug};
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, Request as HttpRequest, Response as HttpResponse, StatusCode, header};
use snafu::ResultExt;
use tower::Service;

use kissmetrics_transport::Error as TransportError;
use kissmetrics_transport::internal_event::InternalEvent;
use kissmetrics_transport::reqwest_integration::ReqwestService;

use crate::config::ClientConfig;
use crate::error::{
    HttpClientBuildSnafu, RequestConstructionSnafu, Result, TransportSnafu,
};
use crate::internal_event::TrackingCallIssued;
use crate::request::{AliasIdentity, RecordEvent, SetProperties, TrackingCall};

/// The outcome of a tracking request that the server accepted.
#[derive(Debug, Clone)]
pub struct TrackResponse {
    /// Full URL the request was sent to, including the API key.
    pub url: String,
    pub status: StatusCode,
    pub body: Bytes,
}

/// Client for the KISSmetrics tracking API.
///
/// Each operation builds a request path, prefixes it with the configured host and
/// issues an HTTP GET through the transport service `S`.
///
/// ```no_run
/// use kissmetrics_client::{Client, ClientConfig, Properties, RecordEvent};
///
/// # async fn run() -> Result<(), kissmetrics_client::ClientError> {
/// let mut client = Client::new(ClientConfig::builder().api_key("my-api-key").build())?;
/// client
///     .record(
///         RecordEvent::builder()
///             .person("bob@example.com")
///             .event("Signed Up")
///             .properties(Properties::new().insert("plan", "pro"))
///             .build(),
///     )
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client<S = ReqwestService> {
    service: S,
    config: Arc<ClientConfig>,
    base_url: String,
}

impl<S> Debug for Client<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Client<ReqwestService> {
    /// Creates a client backed by `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the API key is empty or the host is not a
    /// bare host name, and `HttpClientBuild` if the default HTTP client cannot be
    /// created.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let reqwest_client = match config.reqwest_client.clone() {
            Some(client) => client,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = config.timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build().context(HttpClientBuildSnafu)?
            }
        };

        Self::with_service(config, ReqwestService::new_with_client(reqwest_client))
    }
}

impl<S> Client<S>
where
    S: Service<HttpRequest<Option<Bytes>>, Response = HttpResponse<Bytes>>,
    S::Error: Into<TransportError>,
{
    /// Creates a client that sends requests through `service`.
    pub fn with_service(config: ClientConfig, service: S) -> Result<Self> {
        let base_url = config.base_url()?;

        info!(target: "kissmetrics_client", %base_url, "KISSmetrics client initialized");
        debug!(target: "kissmetrics_client", client_config = ?config, "Full client configuration");

        Ok(Self {
            service,
            config: Arc::new(config),
            base_url,
        })
    }

    pub fn key(&self) -> &str {
        &self.config.api_key
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Prefixes a request path with `<protocol>://<host>/`.
    pub fn url(&self, path_and_query: &str) -> String {
        format!("{}/{}", self.base_url, path_and_query)
    }

    /// Records an event for a person.
    pub async fn record(&mut self, call: RecordEvent) -> Result<TrackResponse> {
        self.send(call.into()).await
    }

    /// Sets properties on a person.
    pub async fn set(&mut self, call: SetProperties) -> Result<TrackResponse> {
        self.send(call.into()).await
    }

    /// Aliases one person identifier to another.
    pub async fn alias(&mut self, call: AliasIdentity) -> Result<TrackResponse> {
        self.send(call.into()).await
    }

    /// Sends any tracking call.
    pub async fn send(&mut self, call: TrackingCall) -> Result<TrackResponse> {
        let path_and_query = call.path_and_query(&self.config.api_key)?;
        debug!(
            target: "kissmetrics_client",
            resource = call.resource(),
            person = call.person(),
            "Dispatching tracking call"
        );
        TrackingCallIssued {
            resource: call.resource_label(),
        }
        .emit();
        self.request(&path_and_query).await
    }

    /// Issues a GET for an already built `<resource>?<query>` path.
    pub async fn request(&mut self, path_and_query: &str) -> Result<TrackResponse> {
        let url = self.url(path_and_query);

        let mut http_request_builder = HttpRequest::builder().method(Method::GET).uri(url.as_str());
        if !self.config.user_agent.is_empty() {
            http_request_builder =
                http_request_builder.header(header::USER_AGENT, self.config.user_agent.as_str());
        }
        let http_request = http_request_builder
            .body(None)
            .context(RequestConstructionSnafu)?;

        futures::future::poll_fn(|cx| self.service.poll_ready(cx))
            .await
            .map_err(Into::into)
            .context(TransportSnafu)?;

        let response = self
            .service
            .call(http_request)
            .await
            .map_err(Into::into)
            .context(TransportSnafu)?;

        let status = response.status();
        debug!(target: "kissmetrics_client", %status, "Tracking request accepted");

        Ok(TrackResponse {
            url,
            status,
            body: response.into_body(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use kissmetrics_transport::HttpError;
    use tokio_test::{assert_pending, assert_ready_ok, task};
    use tower_test::mock;
    use url::form_urlencoded;

    use super::*;
    use crate::{ClientError, Properties};

    type Mock = mock::Mock<HttpRequest<Option<Bytes>>, HttpResponse<Bytes>>;
    type Handle = mock::Handle<HttpRequest<Option<Bytes>>, HttpResponse<Bytes>>;

    fn mock_client() -> (Client<Mock>, Handle) {
        let (service, handle) = mock::pair();
        let client =
            Client::with_service(ClientConfig::builder().api_key("foo").build(), service).unwrap();
        (client, handle)
    }

    fn query_fields(request: &HttpRequest<Option<Bytes>>) -> HashMap<String, String> {
        let query = request.uri().query().unwrap_or_default();
        form_urlencoded::parse(query.as_bytes()).into_owned().collect()
    }

    #[test]
    fn client_url_uses_default_host() {
        let (client, _handle) = mock_client();
        assert_eq!(client.key(), "foo");
        assert_eq!(
            client.url("e?_k=foo&_p=bar"),
            "http://trk.kissmetrics.com/e?_k=foo&_p=bar"
        );
    }

    #[test]
    fn unsupported_protocol_fails_construction() {
        let error = ClientConfig::from_parts("foo", "trk.kissmetrics.com", "ssh")
            .and_then(Client::new)
            .unwrap_err();
        assert!(matches!(error, ClientError::UnsupportedProtocol { .. }));
    }

    #[test]
    fn empty_key_fails_construction() {
        let error = Client::new(ClientConfig::default()).unwrap_err();
        assert!(matches!(error, ClientError::MissingApiKey));
    }

    #[test]
    fn hosts_outside_uri_grammar_fail_construction() {
        for host in ["münchen.de", "trk.kissmetrics.com\\x"] {
            let (service, _handle) = mock::pair::<HttpRequest<Option<Bytes>>, HttpResponse<Bytes>>();
            let error = Client::with_service(
                ClientConfig::builder().api_key("foo").host(host).build(),
                service,
            )
            .unwrap_err();
            assert!(
                matches!(error, ClientError::InvalidHost { .. }),
                "host {host:?} should fail construction"
            );
        }
    }

    #[tokio::test]
    async fn record_sends_get_to_event_resource() {
        let (mut client, mut handle) = mock_client();

        let call = tokio::spawn(async move {
            client
                .record(
                    RecordEvent::builder()
                        .person("bar")
                        .event("fizzed")
                        .timestamp(1381849312)
                        .build(),
                )
                .await
        });

        let (request, send_response) = handle.next_request().await.expect("request sent");
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.uri().host(), Some("trk.kissmetrics.com"));
        assert_eq!(request.uri().path(), "/e");
        assert!(request.body().is_none());
        assert_eq!(
            request.headers()[header::USER_AGENT],
            crate::config::DEFAULT_USER_AGENT
        );

        let fields = query_fields(&request);
        assert_eq!(fields["_k"], "foo");
        assert_eq!(fields["_p"], "bar");
        assert_eq!(fields["_n"], "fizzed");
        assert_eq!(fields["_d"], "1");
        assert_eq!(fields["_t"], "1381849312");

        send_response.send_response(HttpResponse::new(Bytes::from_static(b"GIF89a")));

        let response = call.await.unwrap().unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body.as_ref(), b"GIF89a");
        assert!(response.url.starts_with("http://trk.kissmetrics.com/e?"));
    }

    #[tokio::test]
    async fn set_sends_properties_to_set_resource() {
        let (mut client, mut handle) = mock_client();

        let call = tokio::spawn(async move {
            client
                .set(
                    SetProperties::builder()
                        .person("bar")
                        .properties(Properties::new().insert("cool", "1"))
                        .build(),
                )
                .await
        });

        let (request, send_response) = handle.next_request().await.expect("request sent");
        assert_eq!(request.uri().path(), "/s");
        let fields = query_fields(&request);
        assert_eq!(fields["_p"], "bar");
        assert_eq!(fields["cool"], "1");

        send_response.send_response(HttpResponse::new(Bytes::new()));
        call.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn alias_with_custom_resource() {
        let (mut client, mut handle) = mock_client();

        let call = tokio::spawn(async move {
            client
                .alias(
                    AliasIdentity::builder()
                        .person("bar")
                        .identity("baz")
                        .uri("get")
                        .build(),
                )
                .await
        });

        let (request, send_response) = handle.next_request().await.expect("request sent");
        assert_eq!(request.uri().path(), "/get");
        let fields = query_fields(&request);
        assert_eq!(fields["_k"], "foo");
        assert_eq!(fields["_p"], "bar");
        assert_eq!(fields["_n"], "baz");

        send_response.send_response(HttpResponse::new(Bytes::new()));
        call.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn invalid_resource_is_rejected_before_sending() {
        let (mut client, mut handle) = mock_client();

        let error = client
            .record(
                RecordEvent::builder()
                    .person("bar")
                    .event("fizzed")
                    .uri("my events")
                    .build(),
            )
            .await
            .unwrap_err();

        assert!(matches!(error, ClientError::InvalidResource { .. }));

        drop(client);
        assert!(handle.next_request().await.is_none());
    }

    #[tokio::test]
    async fn transport_errors_propagate_unchanged() {
        let (mut client, mut handle) = mock_client();

        let call = tokio::spawn(async move {
            client
                .record(RecordEvent::builder().person("bar").event("fizzed").build())
                .await
        });

        let (_request, send_response) = handle.next_request().await.expect("request sent");
        send_response.send_error(HttpError::ServerError {
            status: 500,
            body: "boom".to_string(),
        });

        let error = call.await.unwrap().unwrap_err();
        let http_error = error.http_error().expect("http error preserved");
        assert_eq!(http_error.status(), Some(500));
    }

    #[tokio::test]
    async fn reserved_property_is_rejected_before_sending() {
        let (mut client, mut handle) = mock_client();

        let error = client
            .set(
                SetProperties::builder()
                    .person("bar")
                    .properties(Properties::new().insert("_k", "other"))
                    .build(),
            )
            .await
            .unwrap_err();

        assert!(matches!(error, ClientError::ReservedProperty { .. }));

        drop(client);
        assert!(handle.next_request().await.is_none());
    }

    #[test]
    fn tracking_calls_are_counted_by_resource() {
        use metrics_util::debugging::{DebugValue, DebuggingRecorder};

        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        let transport = tower::service_fn(|_request: HttpRequest<Option<Bytes>>| async {
            Ok::<_, HttpError>(HttpResponse::new(Bytes::new()))
        });
        let mut client =
            Client::with_service(ClientConfig::builder().api_key("foo").build(), transport)
                .unwrap();

        metrics::with_local_recorder(&recorder, || {
            tokio_test::block_on(async {
                client
                    .record(RecordEvent::builder().person("bar").event("fizzed").build())
                    .await
                    .unwrap();
                client
                    .alias(
                        AliasIdentity::builder()
                            .person("bar")
                            .identity("baz")
                            .uri("custom/alias")
                            .build(),
                    )
                    .await
                    .unwrap();
            })
        });

        let mut labels: Vec<String> = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter(|(key, _, _, value)| {
                key.key().name() == "kissmetrics_tracking_calls_total"
                    && *value == DebugValue::Counter(1)
            })
            .flat_map(|(key, _, _, _)| {
                key.key()
                    .labels()
                    .map(|label| label.value().to_string())
                    .collect::<Vec<_>>()
            })
            .collect();
        labels.sort();
        assert_eq!(labels, ["custom", "e"]);
    }

    #[tokio::test]
    #[ignore]
    async fn records_against_live_tracking_host() {
        let config =
            ClientConfig::from_env().expect("KISSMETRICS_API_KEY must be set for this test");
        let mut client = Client::new(config).expect("Failed to create client");

        let response = client
            .record(
                RecordEvent::builder()
                    .person("kissmetrics_client-test")
                    .event("Ran Live Test")
                    .build(),
            )
            .await
            .expect("live tracking call failed");
        assert!(response.status.is_success());
    }

    #[tokio::test]
    async fn waits_for_transport_readiness() {
        let (mut client, mut handle) = mock_client();
        handle.allow(0);

        let mut call = task::spawn(client.request("e?_k=foo&_p=bar"));
        assert_pending!(call.poll());

        handle.allow(1);
        assert_pending!(call.poll());

        let (request, send_response) = handle.next_request().await.expect("request sent");
        assert_eq!(request.uri().path(), "/e");
        send_response.send_response(HttpResponse::new(Bytes::new()));

        let response = assert_ready_ok!(call.poll());
        assert_eq!(response.status, StatusCode::OK);
    }
}
