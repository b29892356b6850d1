//! Immutable result of a dispatched request.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::KnockError;
use crate::request::Request;
use crate::types::ResponseParams;

/// Status code, body and the request that produced them.
///
/// The originating request is complete by the time it is attached, so it
/// is shared read-only rather than owned.
#[derive(Debug, Clone)]
pub struct Response {
    http_code: u16,
    content: String,
    request: Option<Arc<Request>>,
}

impl Response {
    pub const OK: u16 = 200;

    pub fn new(content: impl Into<String>, http_code: u16, request: Option<Arc<Request>>) -> Self {
        Self {
            http_code,
            content: content.into(),
            request,
        }
    }

    /// Missing content becomes an empty body, a missing code becomes `OK`.
    pub fn from_params(params: ResponseParams, request: Option<Arc<Request>>) -> Self {
        Self::new(
            params.content.unwrap_or_default(),
            params.http_code.unwrap_or(Self::OK),
            request,
        )
    }

    pub fn http_code(&self) -> u16 {
        self.http_code
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn request(&self) -> Option<&Request> {
        self.request.as_deref()
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.http_code)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, KnockError> {
        serde_json::from_str(&self.content).map_err(|e| KnockError::Deserialization(e.to_string()))
    }
}
