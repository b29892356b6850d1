//! A single outgoing call and its one-way status machine.
//!
//! # Design
//! A `Request` moves `Prepare -> Processing -> Complete` and never back.
//! While it is not `Complete` every parameter can be changed through the
//! setters; once `Complete` each setter fails with `MutationAfterComplete`,
//! which lets a finished request be shared read-only (a `Response` holds it
//! behind an `Arc`).
//!
//! The URL is never stored. `url()` recomputes it from protocol, host and
//! endpoint each time so it cannot drift from the fields it is made of.

use serde_json::Value;

use crate::error::KnockError;
use crate::http::{ContentType, Method};
use crate::query::build_query;
use crate::transport::TransportOption;
use crate::types::{Data, RequestParams, ResponseParams, TransportOptions};

pub const DEFAULT_PROTOCOL: &str = "https";

/// Position of a request in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum RequestStatus {
    #[default]
    Prepare = 1,
    Processing = 2,
    Complete = 3,
}

impl RequestStatus {
    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            RequestStatus::Prepare => "prepare",
            RequestStatus::Processing => "processing",
            RequestStatus::Complete => "complete",
        }
    }
}

impl TryFrom<u8> for RequestStatus {
    type Error = KnockError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(RequestStatus::Prepare),
            2 => Ok(RequestStatus::Processing),
            3 => Ok(RequestStatus::Complete),
            other => Err(KnockError::StatusNotFound(other)),
        }
    }
}

/// Mutable description of one HTTP call.
#[derive(Debug, PartialEq)]
pub struct Request {
    protocol: String,
    host: String,
    endpoint: String,
    method: Method,
    headers: Vec<(String, String)>,
    content_type: ContentType,
    data: Data,
    transport_options: TransportOptions,
    transport_info: Data,
    status: RequestStatus,
    errors: Vec<(String, String)>,
    fake_response: Option<ResponseParams>,
    /// Query suffix (with its `?` or `&`) written by `prepare_endpoint`.
    baked_query: Option<String>,
}

impl Request {
    /// Empty request for `endpoint`. Host is unset, protocol is `https`.
    pub fn new(endpoint: &str) -> Result<Self, KnockError> {
        let mut request = Request {
            protocol: DEFAULT_PROTOCOL.to_string(),
            host: String::new(),
            endpoint: String::new(),
            method: Method::default(),
            headers: Vec::new(),
            content_type: ContentType::default(),
            data: Data::new(),
            transport_options: TransportOptions::new(),
            transport_info: Data::new(),
            status: RequestStatus::Prepare,
            errors: Vec::new(),
            fake_response: None,
            baked_query: None,
        };
        request.set_endpoint(endpoint)?;
        Ok(request)
    }

    pub fn from_params(endpoint: &str, params: &RequestParams) -> Result<Self, KnockError> {
        let mut request = Request::new(endpoint)?;
        request.apply(params)?;
        Ok(request)
    }

    /// Route every present field of `params` through its setter.
    ///
    /// Protocol is applied after host so an explicit protocol beats one
    /// embedded in a `scheme://host` value.
    pub fn apply(&mut self, params: &RequestParams) -> Result<&mut Self, KnockError> {
        if let Some(options) = &params.transport_options {
            self.set_transport_options(options.clone())?;
        }
        if let Some(info) = &params.transport_info {
            self.set_transport_info(info.clone())?;
        }
        if let Some(headers) = &params.headers {
            self.set_headers(headers.clone())?;
        }
        if let Some(data) = &params.data {
            self.set_data(data.clone())?;
        }
        if let Some(method) = params.method {
            self.set_method(method)?;
        }
        if let Some(content_type) = params.content_type {
            self.set_content_type(content_type)?;
        }
        if let Some(host) = &params.host {
            self.set_host(host)?;
        }
        if let Some(protocol) = &params.protocol {
            self.set_protocol(protocol)?;
        }
        Ok(self)
    }

    /// Snapshot of the current parameters. Host is omitted while unset.
    pub fn params(&self) -> RequestParams {
        RequestParams {
            protocol: Some(self.protocol.clone()),
            host: (!self.host.is_empty()).then(|| self.host.clone()),
            method: Some(self.method),
            content_type: Some(self.content_type),
            headers: Some(self.headers.clone()),
            data: Some(self.data.clone()),
            transport_options: Some(self.transport_options.clone()),
            transport_info: Some(self.transport_info.clone()),
        }
    }

    // --- accessors ---

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn transport_options(&self) -> &TransportOptions {
        &self.transport_options
    }

    pub fn transport_option(&self, key: TransportOption) -> Option<&Value> {
        self.transport_options.get(&key)
    }

    pub fn transport_info(&self) -> &Data {
        &self.transport_info
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn status_label(&self) -> &'static str {
        self.status.label()
    }

    pub fn errors(&self) -> &[(String, String)] {
        &self.errors
    }

    pub fn error(&self, key: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn fake_response(&self) -> Option<&ResponseParams> {
        self.fake_response.as_ref()
    }

    // --- status ---

    pub fn status_is_prepare(&self) -> bool {
        self.status == RequestStatus::Prepare
    }

    pub fn status_is_processing(&self) -> bool {
        self.status == RequestStatus::Processing
    }

    pub fn status_is_complete(&self) -> bool {
        self.status == RequestStatus::Complete
    }

    pub fn setup_status_processing(&mut self) -> Result<&mut Self, KnockError> {
        self.guard("status")?;
        self.status = RequestStatus::Processing;
        Ok(self)
    }

    /// Terminal. Calling it again is a no-op.
    pub fn setup_status_complete(&mut self) -> &mut Self {
        self.status = RequestStatus::Complete;
        self
    }

    fn guard(&self, field: &'static str) -> Result<(), KnockError> {
        if self.status_is_complete() {
            return Err(KnockError::MutationAfterComplete(field));
        }
        Ok(())
    }

    // --- setters ---

    pub fn set_protocol(&mut self, protocol: &str) -> Result<&mut Self, KnockError> {
        self.guard("protocol")?;
        if !is_valid_scheme(protocol) {
            return Err(KnockError::InvalidProtocol(protocol.to_string()));
        }
        self.protocol = protocol.to_ascii_lowercase();
        Ok(self)
    }

    /// Accepts `example.com`, `example.com:8080` or `scheme://example.com`.
    /// A scheme prefix also sets the protocol.
    pub fn set_host(&mut self, host: &str) -> Result<&mut Self, KnockError> {
        self.guard("host")?;
        let (protocol, bare) = match host.split_once("://") {
            Some((scheme, rest)) => (Some(scheme), rest.trim_end_matches('/')),
            None => (None, host),
        };
        if let Some(scheme) = protocol {
            if !is_valid_scheme(scheme) {
                return Err(KnockError::InvalidProtocol(scheme.to_string()));
            }
        }
        let invalid = bare.is_empty()
            || bare
                .chars()
                .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '?' | '#'));
        if invalid {
            return Err(KnockError::InvalidHost(host.to_string()));
        }
        if let Some(scheme) = protocol {
            self.protocol = scheme.to_ascii_lowercase();
        }
        self.host = bare.to_string();
        Ok(self)
    }

    pub fn set_endpoint(&mut self, endpoint: &str) -> Result<&mut Self, KnockError> {
        self.guard("endpoint")?;
        if endpoint.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(KnockError::InvalidEndpoint(endpoint.to_string()));
        }
        self.endpoint = endpoint.to_string();
        self.baked_query = None;
        Ok(self)
    }

    pub fn set_method(&mut self, method: Method) -> Result<&mut Self, KnockError> {
        self.guard("method")?;
        self.method = method;
        Ok(self)
    }

    pub fn set_content_type(&mut self, content_type: ContentType) -> Result<&mut Self, KnockError> {
        self.guard("content_type")?;
        self.content_type = content_type;
        Ok(self)
    }

    /// Set one header, replacing any existing value under the same name.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<&mut Self, KnockError> {
        self.guard("headers")?;
        validate_header(name, value)?;
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
        Ok(self)
    }

    /// Merge `headers` into the current set. Nothing is written if any
    /// header is invalid.
    pub fn add_headers<I, K, V>(&mut self, headers: I) -> Result<&mut Self, KnockError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.guard("headers")?;
        let headers: Vec<(K, V)> = headers.into_iter().collect();
        for (name, value) in &headers {
            validate_header(name.as_ref(), value.as_ref())?;
        }
        for (name, value) in headers {
            self.set_header(name.as_ref(), value.as_ref())?;
        }
        Ok(self)
    }

    /// Replace every header. Names repeated case-insensitively collapse
    /// into one entry holding the last value.
    pub fn set_headers(&mut self, headers: Vec<(String, String)>) -> Result<&mut Self, KnockError> {
        self.guard("headers")?;
        for (name, value) in &headers {
            validate_header(name, value)?;
        }
        self.headers.clear();
        for (name, value) in &headers {
            self.set_header(name, value)?;
        }
        Ok(self)
    }

    pub fn set_data(&mut self, data: Data) -> Result<&mut Self, KnockError> {
        self.guard("data")?;
        self.data = data;
        Ok(self)
    }

    pub fn set_transport_options(&mut self, options: TransportOptions) -> Result<&mut Self, KnockError> {
        self.guard("transport_options")?;
        self.transport_options = options;
        Ok(self)
    }

    /// Insert or overwrite a single option.
    pub fn add_transport_option(
        &mut self,
        key: TransportOption,
        value: impl Into<Value>,
    ) -> Result<&mut Self, KnockError> {
        self.guard("transport_options")?;
        self.transport_options.insert(key, value.into());
        Ok(self)
    }

    pub fn add_transport_options(&mut self, options: TransportOptions) -> Result<&mut Self, KnockError> {
        self.guard("transport_options")?;
        self.transport_options.extend(options);
        Ok(self)
    }

    pub fn set_transport_info(&mut self, info: Data) -> Result<&mut Self, KnockError> {
        self.guard("transport_info")?;
        self.transport_info = info;
        Ok(self)
    }

    pub fn set_fake_response(&mut self, response: ResponseParams) -> Result<&mut Self, KnockError> {
        self.guard("fake_response")?;
        self.fake_response = Some(response);
        Ok(self)
    }

    /// Record a diagnostic note. Without a key the note gets the next
    /// numeric key; with a key it replaces any note under that key.
    pub fn add_error(&mut self, message: &str, key: Option<&str>) -> Result<&mut Self, KnockError> {
        self.guard("errors")?;
        let key = match key {
            Some(k) => k.to_string(),
            None => self.next_error_index().to_string(),
        };
        match self.errors.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = message.to_string(),
            None => self.errors.push((key, message.to_string())),
        }
        Ok(self)
    }

    fn next_error_index(&self) -> u64 {
        self.errors
            .iter()
            .filter_map(|(k, _)| k.parse::<u64>().ok())
            .max()
            .map(|n| n + 1)
            .unwrap_or(0)
    }

    // --- TLS ---

    pub fn disable_ssl(&mut self) -> Result<&mut Self, KnockError> {
        self.add_transport_option(TransportOption::SslVerifyPeer, false)?;
        self.add_transport_option(TransportOption::SslVerifyHost, 0)
    }

    pub fn enable_ssl(&mut self) -> Result<&mut Self, KnockError> {
        self.add_transport_option(TransportOption::SslVerifyPeer, true)?;
        self.add_transport_option(TransportOption::SslVerifyHost, 2)
    }

    // --- URL ---

    /// Endpoint with the data appended as a query string for GET requests.
    /// Any other method returns the endpoint unchanged.
    ///
    /// A query stored by an earlier `prepare_endpoint` is replaced by one
    /// built from the current data.
    pub fn prepared_endpoint(&self) -> Result<String, KnockError> {
        if self.method != Method::Get || self.data.is_empty() {
            return Ok(self.endpoint.clone());
        }
        let base = self.unprepared_endpoint();
        let query = build_query(&self.data)?;
        if query.is_empty()
            || base.ends_with(&format!("?{query}"))
            || base.ends_with(&format!("&{query}"))
        {
            return Ok(base.to_string());
        }
        let separator = if base.contains('?') { '&' } else { '?' };
        Ok(format!("{base}{separator}{query}"))
    }

    /// Store `prepared_endpoint()` as the endpoint. Repeated calls do not
    /// append the query again, and a call after `set_data` swaps the old
    /// query for the new one.
    pub fn prepare_endpoint(&mut self) -> Result<&mut Self, KnockError> {
        self.guard("endpoint")?;
        let prepared = self.prepared_endpoint()?;
        let baked = prepared
            .strip_prefix(self.unprepared_endpoint())
            .filter(|suffix| !suffix.is_empty())
            .map(str::to_string);
        self.baked_query = baked;
        self.endpoint = prepared;
        Ok(self)
    }

    fn unprepared_endpoint(&self) -> &str {
        match &self.baked_query {
            Some(suffix) => self.endpoint.strip_suffix(suffix.as_str()).unwrap_or(&self.endpoint),
            None => &self.endpoint,
        }
    }

    /// `protocol://host` followed by the prepared endpoint.
    pub fn url(&self) -> Result<String, KnockError> {
        if self.host.is_empty() {
            return Err(KnockError::ParamNotFound("host"));
        }
        Ok(format!("{}://{}{}", self.protocol, self.host, self.prepared_endpoint()?))
    }

    /// A new `Prepare` request with the same parameters. Errors and the
    /// fake response are not carried over.
    pub fn clone_prepared(&self) -> Request {
        Request {
            protocol: self.protocol.clone(),
            host: self.host.clone(),
            endpoint: self.endpoint.clone(),
            method: self.method,
            headers: self.headers.clone(),
            content_type: self.content_type,
            data: self.data.clone(),
            transport_options: self.transport_options.clone(),
            transport_info: self.transport_info.clone(),
            status: RequestStatus::Prepare,
            errors: Vec::new(),
            fake_response: None,
            baked_query: self.baked_query.clone(),
        }
    }
}

fn is_valid_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

fn validate_header(name: &str, value: &str) -> Result<(), KnockError> {
    let token = |c: char| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c);
    if name.is_empty() || !name.chars().all(token) {
        return Err(KnockError::InvalidHeader(name.to_string()));
    }
    if value.chars().any(|c| c == '\r' || c == '\n' || c == '\0') {
        return Err(KnockError::InvalidHeader(format!("{name}: {value}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(v: Value) -> Data {
        match v {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn request() -> Request {
        let params = RequestParams {
            host: Some("api.example.com".to_string()),
            method: Some(Method::Post),
            headers: Some(vec![("Accept".to_string(), "application/json".to_string())]),
            data: Some(data(json!({"a": 1, "b": 2}))),
            ..Default::default()
        };
        Request::from_params("/x", &params).unwrap()
    }

    fn assert_locked<T: std::fmt::Debug>(result: Result<T, KnockError>) {
        assert!(
            matches!(result, Err(KnockError::MutationAfterComplete(_))),
            "expected MutationAfterComplete, got {result:?}"
        );
    }

    #[test]
    fn new_request_is_prepare_with_defaults() {
        let req = Request::new("/x").unwrap();
        assert!(req.status_is_prepare());
        assert_eq!(req.status_label(), "prepare");
        assert_eq!(req.protocol(), "https");
        assert_eq!(req.method(), Method::Get);
        assert_eq!(req.content_type(), ContentType::Json);
        assert!(req.errors().is_empty());
    }

    #[test]
    fn from_params_applies_every_field() {
        let req = request();
        assert_eq!(req.host(), "api.example.com");
        assert_eq!(req.endpoint(), "/x");
        assert_eq!(req.method(), Method::Post);
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.data()["b"], 2);
    }

    #[test]
    fn params_roundtrip_through_from_params() {
        let req = request();
        let copy = Request::from_params(req.endpoint(), &req.params()).unwrap();
        assert_eq!(copy, req);
    }

    #[test]
    fn every_setter_fails_once_complete() {
        let mut req = request();
        req.setup_status_complete();
        assert!(req.status_is_complete());
        assert!(!req.status_is_prepare());

        assert_locked(req.set_protocol("http"));
        assert_locked(req.set_host("other.host"));
        assert_locked(req.set_endpoint("/y"));
        assert_locked(req.set_method(Method::Patch));
        assert_locked(req.set_content_type(ContentType::Multipart));
        assert_locked(req.set_header("k", "v"));
        assert_locked(req.add_headers([("k", "v")]));
        assert_locked(req.set_headers(Vec::new()));
        assert_locked(req.set_data(Data::new()));
        assert_locked(req.set_transport_options(TransportOptions::new()));
        assert_locked(req.add_transport_option(TransportOption::Timeout, 60));
        assert_locked(req.add_transport_options(TransportOptions::new()));
        assert_locked(req.set_transport_info(Data::new()));
        assert_locked(req.set_fake_response(ResponseParams::new(200, "x")));
        assert_locked(req.add_error("boom", None));
        assert_locked(req.disable_ssl());
        assert_locked(req.enable_ssl());
        assert_locked(req.prepare_endpoint());
        assert_locked(req.setup_status_processing());

        assert_eq!(req.host(), "api.example.com");
    }

    #[test]
    fn setters_work_while_processing() {
        let mut req = request();
        req.setup_status_processing().unwrap();
        assert!(req.status_is_processing());
        assert_eq!(req.status_label(), "processing");
        req.set_endpoint("/y").unwrap();
        assert_eq!(req.endpoint(), "/y");
    }

    #[test]
    fn status_moves_forward_only() {
        let mut req = request();
        req.setup_status_processing().unwrap();
        req.setup_status_complete();
        req.setup_status_complete();
        assert_eq!(req.status(), RequestStatus::Complete);
        assert_eq!(req.status_label(), "complete");
        assert!(req.setup_status_processing().is_err());
    }

    #[test]
    fn status_lookup_by_id() {
        assert_eq!(RequestStatus::try_from(2).unwrap(), RequestStatus::Processing);
        assert_eq!(RequestStatus::Complete.id(), 3);
        assert!(matches!(
            RequestStatus::try_from(9),
            Err(KnockError::StatusNotFound(9))
        ));
    }

    #[test]
    fn clone_prepared_resets_status_and_drops_errors() {
        let mut req = request();
        req.add_error("boom", Some("k")).unwrap();
        req.set_fake_response(ResponseParams::new(200, "X")).unwrap();
        req.add_transport_option(TransportOption::Timeout, 5).unwrap();
        req.setup_status_complete();

        let copy = req.clone_prepared();
        assert!(copy.status_is_prepare());
        assert!(copy.errors().is_empty());
        assert!(copy.fake_response().is_none());
        assert_eq!(copy.protocol(), req.protocol());
        assert_eq!(copy.host(), req.host());
        assert_eq!(copy.endpoint(), req.endpoint());
        assert_eq!(copy.method(), req.method());
        assert_eq!(copy.headers(), req.headers());
        assert_eq!(copy.content_type(), req.content_type());
        assert_eq!(copy.data(), req.data());
        assert_eq!(copy.transport_options(), req.transport_options());
        assert_eq!(copy.transport_info(), req.transport_info());
    }

    #[test]
    fn get_prepare_endpoint_appends_query() {
        let mut req = Request::new("/x").unwrap();
        req.set_data(data(json!({"a": 1, "b": 2}))).unwrap();
        req.prepare_endpoint().unwrap();
        assert_eq!(req.endpoint(), "/x?a=1&b=2");
    }

    #[test]
    fn prepare_endpoint_is_idempotent() {
        let mut req = Request::new("/x").unwrap();
        req.set_data(data(json!({"a": 1}))).unwrap();
        req.prepare_endpoint().unwrap();
        req.prepare_endpoint().unwrap();
        assert_eq!(req.endpoint(), "/x?a=1");
    }

    #[test]
    fn prepare_endpoint_after_data_change_replaces_query() {
        let mut req = Request::new("/x").unwrap();
        req.set_host("api.example.com").unwrap();
        req.set_data(data(json!({"a": 1}))).unwrap();
        req.prepare_endpoint().unwrap();

        req.set_data(data(json!({"a": 2}))).unwrap();
        assert_eq!(req.url().unwrap(), "https://api.example.com/x?a=2");
        req.prepare_endpoint().unwrap();
        assert_eq!(req.endpoint(), "/x?a=2");

        req.set_endpoint("/y").unwrap();
        assert_eq!(req.prepared_endpoint().unwrap(), "/y?a=2");
    }

    #[test]
    fn prepare_endpoint_keeps_caller_query_when_data_changes() {
        let mut req = Request::new("/x?page=2").unwrap();
        req.set_data(data(json!({"a": 1}))).unwrap();
        req.prepare_endpoint().unwrap();
        assert_eq!(req.endpoint(), "/x?page=2&a=1");

        req.set_data(data(json!({"b": 3}))).unwrap();
        req.prepare_endpoint().unwrap();
        assert_eq!(req.endpoint(), "/x?page=2&b=3");
    }

    #[test]
    fn prepare_endpoint_joins_existing_query_with_ampersand() {
        let mut req = Request::new("/x?page=2").unwrap();
        req.set_data(data(json!({"a": 1}))).unwrap();
        assert_eq!(req.prepared_endpoint().unwrap(), "/x?page=2&a=1");
    }

    #[test]
    fn post_prepare_endpoint_leaves_endpoint() {
        let mut req = request();
        req.prepare_endpoint().unwrap();
        assert_eq!(req.endpoint(), "/x");
    }

    #[test]
    fn url_includes_query_for_get_only() {
        let mut req = request();
        assert_eq!(req.url().unwrap(), "https://api.example.com/x");
        req.set_method(Method::Get).unwrap();
        assert_eq!(req.url().unwrap(), "https://api.example.com/x?a=1&b=2");
        assert_eq!(req.endpoint(), "/x");
    }

    #[test]
    fn url_requires_host() {
        let req = Request::new("/x").unwrap();
        assert!(matches!(req.url(), Err(KnockError::ParamNotFound("host"))));
    }

    #[test]
    fn set_host_splits_scheme() {
        let mut req = Request::new("/").unwrap();
        req.set_host("http://first.host").unwrap();
        assert_eq!(req.protocol(), "http");
        assert_eq!(req.host(), "first.host");

        req.set_host("wss://second.host").unwrap();
        assert_eq!(req.protocol(), "wss");
        assert_eq!(req.host(), "second.host");

        req.set_host("localhost:3000").unwrap();
        assert_eq!(req.protocol(), "wss");
        assert_eq!(req.host(), "localhost:3000");
    }

    #[test]
    fn malformed_values_are_rejected() {
        let mut req = Request::new("/").unwrap();
        assert!(matches!(req.set_host(""), Err(KnockError::InvalidHost(_))));
        assert!(matches!(req.set_host("a b"), Err(KnockError::InvalidHost(_))));
        assert!(matches!(req.set_host("a/b"), Err(KnockError::InvalidHost(_))));
        assert!(matches!(req.set_host("9x://a"), Err(KnockError::InvalidProtocol(_))));
        assert!(matches!(req.set_protocol(""), Err(KnockError::InvalidProtocol(_))));
        assert!(matches!(req.set_protocol("ht tp"), Err(KnockError::InvalidProtocol(_))));
        assert!(matches!(req.set_endpoint("/a b"), Err(KnockError::InvalidEndpoint(_))));
        assert!(matches!(req.set_header("", "v"), Err(KnockError::InvalidHeader(_))));
        assert!(matches!(req.set_header("bad name", "v"), Err(KnockError::InvalidHeader(_))));
        assert!(matches!(req.set_header("x", "a\r\nb"), Err(KnockError::InvalidHeader(_))));
        assert_eq!(req.host(), "");
        assert!(req.headers().is_empty());
    }

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut req = Request::new("/").unwrap();
        req.set_header("X-Token", "a").unwrap();
        req.set_header("x-token", "b").unwrap();
        assert_eq!(req.headers().len(), 1);
        assert_eq!(req.header("X-TOKEN"), Some("b"));
    }

    #[test]
    fn set_headers_collapses_names_that_differ_in_case() {
        let mut req = Request::new("/").unwrap();
        req.set_header("Stale", "x").unwrap();
        req.set_headers(vec![
            ("A".to_string(), "1".to_string()),
            ("a".to_string(), "2".to_string()),
        ])
        .unwrap();
        assert_eq!(req.headers(), &[("A".to_string(), "2".to_string())]);
        assert_eq!(req.header("a"), Some("2"));
        assert!(req.header("Stale").is_none());

        let params = RequestParams {
            headers: Some(vec![
                ("X-Id".to_string(), "1".to_string()),
                ("x-id".to_string(), "2".to_string()),
            ]),
            ..Default::default()
        };
        let req = Request::from_params("/", &params).unwrap();
        assert_eq!(req.headers().len(), 1);
        assert_eq!(req.header("X-ID"), Some("2"));
    }

    #[test]
    fn add_headers_merges_and_is_all_or_nothing() {
        let mut req = Request::new("/").unwrap();
        req.add_headers([("a", "c"), ("b", "d")]).unwrap();
        assert_eq!(req.header("a"), Some("c"));
        assert_eq!(req.header("b"), Some("d"));

        let err = req.add_headers([("e", "f"), ("bad name", "g")]);
        assert!(err.is_err());
        assert!(req.header("e").is_none());
    }

    #[test]
    fn ssl_toggles_are_last_call_wins() {
        let mut req = Request::new("/").unwrap();
        assert!(req.transport_option(TransportOption::SslVerifyPeer).is_none());

        req.disable_ssl().unwrap();
        assert_eq!(req.transport_option(TransportOption::SslVerifyPeer), Some(&json!(false)));
        assert_eq!(req.transport_option(TransportOption::SslVerifyHost), Some(&json!(0)));

        req.enable_ssl().unwrap();
        assert_eq!(req.transport_option(TransportOption::SslVerifyPeer), Some(&json!(true)));
        assert_eq!(req.transport_option(TransportOption::SslVerifyHost), Some(&json!(2)));
    }

    #[test]
    fn add_transport_options_merges() {
        let mut req = Request::new("/").unwrap();
        req.add_transport_option(TransportOption::Timeout, 60).unwrap();
        let mut more = TransportOptions::new();
        more.insert(TransportOption::ConnectTimeout, json!(30));
        req.add_transport_options(more).unwrap();
        assert_eq!(req.transport_options().len(), 2);
    }

    #[test]
    fn errors_keep_insertion_order_and_keys() {
        let mut req = Request::new("/").unwrap();
        req.add_error("boom", None).unwrap();
        req.add_error("boom2", Some("k")).unwrap();
        req.add_error("boom3", None).unwrap();
        assert_eq!(
            req.errors(),
            &[
                ("0".to_string(), "boom".to_string()),
                ("k".to_string(), "boom2".to_string()),
                ("1".to_string(), "boom3".to_string()),
            ]
        );
        assert_eq!(req.error("k"), Some("boom2"));
    }

    #[test]
    fn fake_response_is_stored() {
        let mut req = Request::new("/").unwrap();
        req.set_fake_response(ResponseParams::new(200, "X")).unwrap();
        assert_eq!(req.fake_response(), Some(&ResponseParams::new(200, "X")));
    }
}
