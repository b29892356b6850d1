//! Parameter DTOs for building requests and responses.
//!
//! # Design
//! `RequestParams` is the typed form of the option map a `Request` is built
//! from: every field is optional and a present field is applied through the
//! matching setter. Merging two parameter sets is therefore field-wise with
//! the right-hand side winning, which is how per-call overrides sit on top
//! of a handler's common template.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::{ContentType, Method};
use crate::transport::TransportOption;

/// Ordered string-keyed JSON object. Request bodies and transport info use
/// it so iteration follows insertion order.
pub type Data = serde_json::Map<String, Value>;

/// Transport overrides keyed by option.
pub type TransportOptions = BTreeMap<TransportOption, Value>;

/// Parameters a `Request` is constructed from or updated with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<(String, String)>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_options: Option<TransportOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_info: Option<Data>,
}

impl RequestParams {
    pub fn is_empty(&self) -> bool {
        *self == RequestParams::default()
    }

    /// Field-wise merge where values present in `overrides` win.
    pub fn merged_with(&self, overrides: &RequestParams) -> RequestParams {
        RequestParams {
            protocol: overrides.protocol.clone().or_else(|| self.protocol.clone()),
            host: overrides.host.clone().or_else(|| self.host.clone()),
            method: overrides.method.or(self.method),
            content_type: overrides.content_type.or(self.content_type),
            headers: overrides.headers.clone().or_else(|| self.headers.clone()),
            data: overrides.data.clone().or_else(|| self.data.clone()),
            transport_options: overrides
                .transport_options
                .clone()
                .or_else(|| self.transport_options.clone()),
            transport_info: overrides
                .transport_info
                .clone()
                .or_else(|| self.transport_info.clone()),
        }
    }
}

/// Payload a `Response` is constructed from. Also used as the fake response
/// that replaces a network call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_code: Option<u16>,
}

impl ResponseParams {
    pub fn new(http_code: u16, content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            http_code: Some(http_code),
        }
    }

    /// True when neither field is present.
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.http_code.is_none()
    }
}
