//! Tracking calls and their request paths.
//!
//! A request path is `<resource>?<query>`, where the resource defaults to `e`
//! (record), `s` (set) or `a` (alias) and may be overridden per call. An
//! override is a relative path such as `get` or `tracking/v2/e`: no leading
//! `/`, no query or fragment, only characters valid in a URI path.

use std::str::FromStr;

use bon::Builder;
use http::uri::PathAndQuery;
use snafu::ensure;

use crate::Properties;
use crate::error::{InvalidResourceSnafu, Result};
use crate::query_string::{QueryParams, create_query};

pub const RECORD_URI: &str = "e";
pub const SET_URI: &str = "s";
pub const ALIAS_URI: &str = "a";

/// Records that `person` performed `event`.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct RecordEvent {
    #[builder(into)]
    pub person: String,
    #[builder(into)]
    pub event: String,
    #[builder(default)]
    pub properties: Properties,
    /// Unix timestamp in seconds; the server time is used when absent.
    pub timestamp: Option<i64>,
    /// Resource override; defaults to [`RECORD_URI`].
    #[builder(into)]
    pub uri: Option<String>,
}

/// Sets properties on `person`.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct SetProperties {
    #[builder(into)]
    pub person: String,
    pub properties: Properties,
    pub timestamp: Option<i64>,
    /// Resource override; defaults to [`SET_URI`].
    #[builder(into)]
    pub uri: Option<String>,
}

/// Declares `person` and `identity` to be the same user.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct AliasIdentity {
    #[builder(into)]
    pub person: String,
    #[builder(into)]
    pub identity: String,
    /// Resource override; defaults to [`ALIAS_URI`].
    #[builder(into)]
    pub uri: Option<String>,
}

/// Any of the three tracking calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingCall {
    Record(RecordEvent),
    Set(SetProperties),
    Alias(AliasIdentity),
}

impl TrackingCall {
    pub fn person(&self) -> &str {
        match self {
            TrackingCall::Record(call) => &call.person,
            TrackingCall::Set(call) => &call.person,
            TrackingCall::Alias(call) => &call.person,
        }
    }

    /// The resource this call is sent to, honouring any override.
    pub fn resource(&self) -> &str {
        match self {
            TrackingCall::Record(call) => call.uri.as_deref().unwrap_or(RECORD_URI),
            TrackingCall::Set(call) => call.uri.as_deref().unwrap_or(SET_URI),
            TrackingCall::Alias(call) => call.uri.as_deref().unwrap_or(ALIAS_URI),
        }
    }

    /// Metric label for the resource. Overrides collapse to `custom`.
    pub(crate) fn resource_label(&self) -> &'static str {
        match self.resource() {
            RECORD_URI => RECORD_URI,
            SET_URI => SET_URI,
            ALIAS_URI => ALIAS_URI,
            _ => "custom",
        }
    }

    /// Builds `<resource>?<query>` for this call under `key`.
    pub fn path_and_query(&self, key: &str) -> Result<String> {
        match self {
            TrackingCall::Record(call) => record(key, call),
            TrackingCall::Set(call) => set(key, call),
            TrackingCall::Alias(call) => alias(key, call),
        }
    }
}

impl From<RecordEvent> for TrackingCall {
    fn from(call: RecordEvent) -> Self {
        TrackingCall::Record(call)
    }
}

impl From<SetProperties> for TrackingCall {
    fn from(call: SetProperties) -> Self {
        TrackingCall::Set(call)
    }
}

impl From<AliasIdentity> for TrackingCall {
    fn from(call: AliasIdentity) -> Self {
        TrackingCall::Alias(call)
    }
}

fn validate_resource(resource: &str) -> Result<()> {
    let invalid = |reason: &str| InvalidResourceSnafu {
        resource,
        reason: reason.to_string(),
    };
    ensure!(!resource.is_empty(), invalid("resource is empty"));
    ensure!(
        !resource.starts_with('/'),
        invalid("resource must be relative to the host")
    );
    ensure!(
        !resource.contains(['?', '#']),
        invalid("resource cannot carry a query or fragment")
    );
    PathAndQuery::from_str(resource).map_err(|e| invalid(&e.to_string()).build())?;
    Ok(())
}

fn join(uri: &str, query: String) -> Result<String> {
    validate_resource(uri)?;
    Ok(format!("{uri}?{query}"))
}

pub fn record(key: &str, call: &RecordEvent) -> Result<String> {
    let query = create_query(QueryParams {
        key,
        person: &call.person,
        event: Some(call.event.as_str()),
        identity: None,
        properties: Some(&call.properties),
        timestamp: call.timestamp,
    })?;
    join(call.uri.as_deref().unwrap_or(RECORD_URI), query)
}

pub fn set(key: &str, call: &SetProperties) -> Result<String> {
    let query = create_query(QueryParams {
        key,
        person: &call.person,
        event: None,
        identity: None,
        properties: Some(&call.properties),
        timestamp: call.timestamp,
    })?;
    join(call.uri.as_deref().unwrap_or(SET_URI), query)
}

pub fn alias(key: &str, call: &AliasIdentity) -> Result<String> {
    let query = create_query(QueryParams {
        key,
        person: &call.person,
        event: None,
        identity: Some(call.identity.as_str()),
        properties: None,
        timestamp: None,
    })?;
    join(call.uri.as_deref().unwrap_or(ALIAS_URI), query)
}
