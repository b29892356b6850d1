//! The boundary between the knock client and the network.
//!
//! # Design
//! `Handler` never talks to sockets. It turns a `Request` into a
//! `TransportCall` (plain data, like the rest of this crate) and hands it to
//! a `Transport`. The only contract is
//! `execute(call) -> {status, body, info}`; everything else about the round
//! trip belongs to the implementation.
//!
//! `UreqTransport` is the default implementation. HTTP status codes always
//! come back as data so the handler can pass 4xx/5xx through untouched.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::http::Method;
use crate::query::build_query;
use crate::types::{Data, TransportOptions};

/// Transport-specific override keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportOption {
    /// Total timeout in seconds.
    Timeout,
    /// Connect timeout in seconds.
    ConnectTimeout,
    /// `false` disables certificate verification.
    SslVerifyPeer,
    /// `0` disables host name verification, `2` enforces it.
    SslVerifyHost,
    FollowLocation,
    MaxRedirects,
    UserAgent,
    /// Request body, either an encoded string or the raw data fields.
    PostFields,
}

/// Request body as handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportBody {
    /// Already encoded, sent verbatim.
    Text(String),
    /// Unencoded data fields; the transport picks the wire encoding.
    Fields(Data),
}

impl TransportBody {
    pub(crate) fn from_post_fields(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(TransportBody::Text(s.clone())),
            Value::Object(map) if !map.is_empty() => Some(TransportBody::Fields(map.clone())),
            _ => None,
        }
    }
}

/// One outgoing HTTP call described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportCall {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<TransportBody>,
    pub options: TransportOptions,
}

impl TransportCall {
    pub fn option(&self, key: TransportOption) -> Option<&Value> {
        self.options.get(&key)
    }
}

/// What came back from the network.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportReply {
    pub status: u16,
    pub body: String,
    /// Diagnostic metadata, copied onto the request's transport info.
    pub info: Data,
}

/// Failures below the HTTP layer: no status code was received.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("reading response body failed: {0}")]
    Body(String),
}

/// Executes a `TransportCall`. Implementations block until the round trip
/// finishes.
pub trait Transport: Send + Sync {
    fn execute(&self, call: &TransportCall) -> Result<TransportReply, TransportError>;
}

/// Blocking transport backed by `ureq`.
///
/// A fresh agent is configured per call because timeouts and TLS
/// verification are per-request options.
#[derive(Debug, Clone, Default)]
pub struct UreqTransport;

impl UreqTransport {
    pub fn new() -> Self {
        Self
    }

    fn agent(call: &TransportCall) -> Result<ureq::Agent, TransportError> {
        let mut config = ureq::Agent::config_builder().http_status_as_error(false);

        if let Some(timeout) = seconds(call, TransportOption::Timeout)? {
            config = config.timeout_global(Some(timeout));
        }
        if let Some(timeout) = seconds(call, TransportOption::ConnectTimeout)? {
            config = config.timeout_connect(Some(timeout));
        }
        if let Some(max) = redirect_limit(call) {
            config = config.max_redirects(max);
        }
        if !verifies_tls(call) {
            config = config.tls_config(
                ureq::tls::TlsConfig::builder()
                    .disable_verification(true)
                    .build(),
            );
        }

        Ok(config.build().new_agent())
    }

    fn headers(call: &TransportCall) -> Vec<(String, String)> {
        let mut headers = call.headers.clone();
        if let Some(agent) = call.option(TransportOption::UserAgent).and_then(Value::as_str) {
            if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("user-agent")) {
                headers.push(("User-Agent".to_string(), agent.to_string()));
            }
        }
        headers
    }

    fn body_bytes(call: &TransportCall) -> Result<Option<Vec<u8>>, TransportError> {
        match &call.body {
            None => Ok(None),
            Some(TransportBody::Text(text)) => Ok(Some(text.clone().into_bytes())),
            Some(TransportBody::Fields(data)) => build_query(data)
                .map(|q| Some(q.into_bytes()))
                .map_err(|e| TransportError::Request(e.to_string())),
        }
    }
}

/// A duration option in seconds. Values that are not a finite,
/// non-negative number of seconds fail the call.
fn seconds(call: &TransportCall, key: TransportOption) -> Result<Option<Duration>, TransportError> {
    let Some(value) = call.option(key) else {
        return Ok(None);
    };
    value
        .as_f64()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .map(Some)
        .ok_or_else(|| TransportError::Request(format!("invalid {key:?} option: {value}")))
}

/// `Some(0)` when redirects are switched off, the clamped `MaxRedirects`
/// when given, otherwise `None` for the agent default.
fn redirect_limit(call: &TransportCall) -> Option<u32> {
    let follow = call
        .option(TransportOption::FollowLocation)
        .and_then(Value::as_bool)
        .unwrap_or(true);
    if !follow {
        return Some(0);
    }
    call.option(TransportOption::MaxRedirects)
        .and_then(Value::as_u64)
        .map(|max| u32::try_from(max).unwrap_or(u32::MAX))
}

/// Certificate verification stays on unless `SslVerifyPeer` is `false` or
/// `SslVerifyHost` is `0`.
fn verifies_tls(call: &TransportCall) -> bool {
    let verify_peer = call
        .option(TransportOption::SslVerifyPeer)
        .and_then(Value::as_bool)
        .unwrap_or(true);
    let verify_host = call
        .option(TransportOption::SslVerifyHost)
        .and_then(Value::as_u64)
        .map_or(true, |v| v != 0);
    verify_peer && verify_host
}

fn apply_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (key, value) in headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    builder
}

fn send_with_body(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<Vec<u8>>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(bytes) => builder.send(&bytes[..]),
        None => builder.send_empty(),
    }
}

/// Methods without a conventional body still send one when the call has it.
fn send_forced(
    builder: ureq::RequestBuilder<ureq::typestate::WithoutBody>,
    body: Option<Vec<u8>>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(bytes) => builder.force_send_body().send(&bytes[..]),
        None => builder.call(),
    }
}

impl Transport for UreqTransport {
    fn execute(&self, call: &TransportCall) -> Result<TransportReply, TransportError> {
        let agent = Self::agent(call)?;
        let headers = Self::headers(call);
        let body = Self::body_bytes(call)?;
        let url = call.url.as_str();
        let started = Instant::now();

        let result = match call.method {
            Method::Get => send_forced(apply_headers(agent.get(url), &headers), body),
            Method::Head => send_forced(apply_headers(agent.head(url), &headers), body),
            Method::Delete => send_forced(apply_headers(agent.delete(url), &headers), body),
            Method::Options => send_forced(apply_headers(agent.options(url), &headers), body),
            Method::Post => send_with_body(apply_headers(agent.post(url), &headers), body),
            Method::Put => send_with_body(apply_headers(agent.put(url), &headers), body),
            Method::Patch => send_with_body(apply_headers(agent.patch(url), &headers), body),
        };
        let mut response = result.map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = if call.method == Method::Head {
            String::new()
        } else {
            response
                .body_mut()
                .read_to_string()
                .map_err(|e| TransportError::Body(e.to_string()))?
        };

        let mut info = Data::new();
        info.insert("http_code".to_string(), Value::from(status));
        info.insert("url".to_string(), Value::from(call.url.clone()));
        info.insert(
            "content_type".to_string(),
            content_type.map(Value::from).unwrap_or(Value::Null),
        );
        info.insert(
            "total_time".to_string(),
            Value::from(started.elapsed().as_secs_f64()),
        );
        info.insert("size_download".to_string(), Value::from(body.len()));

        Ok(TransportReply { status, body, info })
    }
}
