//! Query string construction for tracking requests.
//!
//! Every request carries the API key (`_k`) and the person (`_p`). Event and
//! alias requests add `_n`; timestamped requests add `_d=1` and `_t`. User
//! properties follow the reserved fields.

use bon::Builder;
use snafu::ensure;
use url::form_urlencoded;

use crate::Properties;
use crate::error::{ReservedPropertySnafu, Result};

pub const KEY_KEY: &str = "_k";
pub const PERSON_KEY: &str = "_p";
pub const EVENT_NAME_KEY: &str = "_n";
pub const ALIAS_KEY: &str = "_n";
pub const TIME_KEY: &str = "_t";
pub const TIME_FLAG_KEY: &str = "_d";

/// Keys owned by the tracking API. Properties may not use them.
pub const RESERVED_KEYS: [&str; 5] = [KEY_KEY, PERSON_KEY, EVENT_NAME_KEY, TIME_KEY, TIME_FLAG_KEY];

/// Parameters for [`create_query`].
///
/// `event` and `identity` both map to `_n`; when both are set the event wins.
#[derive(Debug, Clone, Copy, Builder)]
pub struct QueryParams<'a> {
    pub key: &'a str,
    pub person: &'a str,
    pub event: Option<&'a str>,
    pub identity: Option<&'a str>,
    pub properties: Option<&'a Properties>,
    /// Unix timestamp in seconds.
    pub timestamp: Option<i64>,
}

/// Encodes `params` as an `application/x-www-form-urlencoded` query string.
///
/// Fails with [`ClientError::ReservedProperty`](crate::ClientError::ReservedProperty)
/// when a property key is one of [`RESERVED_KEYS`].
pub fn create_query(params: QueryParams<'_>) -> Result<String> {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer
        .append_pair(KEY_KEY, params.key)
        .append_pair(PERSON_KEY, params.person);

    if let Some(timestamp) = params.timestamp {
        serializer
            .append_pair(TIME_FLAG_KEY, "1")
            .append_pair(TIME_KEY, &timestamp.to_string());
    }

    if let Some(event) = params.event {
        serializer.append_pair(EVENT_NAME_KEY, event);
    } else if let Some(identity) = params.identity {
        serializer.append_pair(ALIAS_KEY, identity);
    }

    if let Some(properties) = params.properties {
        for (name, value) in properties {
            ensure!(
                !RESERVED_KEYS.contains(&name),
                ReservedPropertySnafu { key: name }
            );
            serializer.append_pair(name, value);
        }
    }

    Ok(serializer.finish())
}
