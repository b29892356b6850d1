//! Orchestrates request construction, dispatch and lifecycle events.
//!
//! # Design
//! A `Handler` owns three things: a common request template merged into
//! every request it builds, at most one active request, and a table with at
//! most one callback per `Event`. Dispatch goes through a `Transport`, so
//! the handler itself does no I/O and can be driven entirely by fake
//! responses in tests.
//!
//! There is no global instance. Callers construct a handler and keep it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::HandlerConfig;
use crate::error::KnockError;
use crate::event::{Callback, Event, EventPayload};
use crate::http::{ContentType, Method};
use crate::request::Request;
use crate::response::Response;
use crate::transport::{Transport, TransportBody, TransportCall, TransportOption, UreqTransport};
use crate::types::{Data, RequestParams, ResponseParams};

pub struct Handler {
    common: Request,
    request: Option<Request>,
    callbacks: HashMap<Event, Callback>,
    transport: Box<dyn Transport>,
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events: Vec<&str> = Event::ALL
            .iter()
            .filter(|e| self.callbacks.contains_key(*e))
            .map(Event::as_str)
            .collect();
        f.debug_struct("Handler")
            .field("common", &self.common)
            .field("request", &self.request)
            .field("callbacks", &events)
            .finish_non_exhaustive()
    }
}

impl Handler {
    /// Handler for `host` (bare or `scheme://host`) using `UreqTransport`.
    pub fn new(host: &str) -> Result<Self, KnockError> {
        Self::with_params(host, &RequestParams::default())
    }

    /// Handler whose common template also carries `params`. The `host`
    /// argument takes precedence over `params.host`.
    pub fn with_params(host: &str, params: &RequestParams) -> Result<Self, KnockError> {
        let mut common = Request::from_params("/", params)?;
        common.set_host(host)?;
        Ok(Self {
            common,
            request: None,
            callbacks: HashMap::new(),
            transport: Box::new(UreqTransport::new()),
        })
    }

    pub fn from_config(config: &HandlerConfig) -> Result<Self, KnockError> {
        Self::with_params(&config.host, &config.common)
    }

    /// Replace the transport used by `send`.
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Box::new(transport);
        self
    }

    pub fn common_request(&self) -> &Request {
        &self.common
    }

    pub fn common_request_mut(&mut self) -> &mut Request {
        &mut self.common
    }

    /// The active request, if one has been set up and not yet sent.
    pub fn request(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    pub fn request_mut(&mut self) -> Option<&mut Request> {
        self.request.as_mut()
    }

    // --- construct ---

    /// Build a request for `endpoint` from the common template with
    /// `overrides` applied on top. Fires `ConstructRequest`.
    pub fn construct_request(
        &self,
        endpoint: &str,
        overrides: &RequestParams,
    ) -> Result<Request, KnockError> {
        let mut request = self.common.clone_prepared();
        request.set_endpoint(endpoint)?;
        request.apply(overrides)?;

        self.event(Event::ConstructRequest, EventPayload::Request(&request));
        Ok(request)
    }

    /// Build a response from `params`, defaulting the code to `OK`. Fires
    /// `ConstructResponse`.
    pub fn construct_response(
        &self,
        params: ResponseParams,
        request: Option<Arc<Request>>,
    ) -> Response {
        let response = Response::from_params(params, request);
        self.event(Event::ConstructResponse, EventPayload::Response(&response));
        response
    }

    // --- setup ---

    /// Apply `options` to `request` and make it the active request.
    pub fn setup_request(
        &mut self,
        mut request: Request,
        options: &RequestParams,
    ) -> Result<&mut Self, KnockError> {
        if !options.is_empty() {
            request.apply(options)?;
        }
        self.request = Some(request);
        Ok(self)
    }

    // --- send ---

    /// Dispatch the active request and consume it.
    ///
    /// A non-empty `fake` payload, or a fake response set on the request
    /// itself, short-circuits the transport and becomes the response.
    pub fn send(&mut self, fake: Option<ResponseParams>) -> Result<Response, KnockError> {
        let mut request = self
            .request
            .take()
            .ok_or(KnockError::ParamNotFound("request"))?;
        if let Err(e) = request.setup_status_processing() {
            self.request = Some(request);
            return Err(e);
        }

        self.event(Event::BeforeSend, EventPayload::Request(&request));

        let fake = fake
            .filter(|f| !f.is_empty())
            .or_else(|| request.fake_response().filter(|f| !f.is_empty()).cloned());

        match fake {
            Some(params) => {
                debug!(endpoint = request.endpoint(), "using fake response");
                request.setup_status_complete();
                Ok(self.construct_response(params, Some(Arc::new(request))))
            }
            None => self.dispatch(request),
        }
    }

    fn dispatch(&self, mut request: Request) -> Result<Response, KnockError> {
        setup_post_fields(&mut request)?;
        let call = transport_call(&request)?;

        debug!(method = %call.method, url = %call.url, "dispatching request");
        let (status, content, info) = match self.transport.execute(&call) {
            Ok(reply) => (reply.status, reply.body, reply.info),
            Err(e) => {
                warn!(method = %call.method, url = %call.url, error = %e, "transport failed");
                let mut info = Data::new();
                info.insert("http_code".to_string(), Value::from(0));
                info.insert("url".to_string(), Value::from(call.url.clone()));
                info.insert("error".to_string(), Value::from(e.to_string()));
                (0, String::new(), info)
            }
        };
        info!(method = %call.method, url = %call.url, status, "response received");

        request.set_transport_info(info)?;
        request.setup_status_complete();

        let response = self.construct_response(
            ResponseParams {
                content: Some(content),
                http_code: Some(status),
            },
            Some(Arc::new(request)),
        );
        self.event(Event::AfterSend, EventPayload::Response(&response));
        Ok(response)
    }

    // --- events ---

    /// Register `callback` for the event named `event`, replacing any
    /// previous one. Returns false for an unknown event name.
    pub fn on<F>(&mut self, event: &str, callback: F) -> bool
    where
        F: Fn(&Handler, EventPayload<'_>) -> Option<Value> + Send + Sync + 'static,
    {
        match event.parse::<Event>() {
            Ok(event) => {
                debug!(%event, "callback registered");
                self.callbacks.insert(event, Box::new(callback));
                true
            }
            Err(_) => false,
        }
    }

    /// Remove the callback for `event`. Returns false if the name is
    /// unknown or nothing was registered.
    pub fn off(&mut self, event: &str) -> bool {
        match event.parse::<Event>() {
            Ok(event) => self.callbacks.remove(&event).is_some(),
            Err(_) => false,
        }
    }

    /// Run the callback registered for `event`, returning its result.
    pub fn event(&self, event: Event, payload: EventPayload<'_>) -> Option<Value> {
        self.callbacks
            .get(&event)
            .and_then(|callback| callback(self, payload))
    }
}

/// Encode the body into the `PostFields` option. GET requests and empty
/// data carry no body. Only JSON is serialized here; every other content
/// type passes the raw fields to the transport.
fn setup_post_fields(request: &mut Request) -> Result<(), KnockError> {
    if request.method() == Method::Get || request.data().is_empty() {
        return Ok(());
    }
    let fields = match request.content_type() {
        ContentType::Json => {
            let encoded = serde_json::to_string(request.data())
                .map_err(|e| KnockError::Serialization(e.to_string()))?;
            Value::String(encoded)
        }
        _ => Value::Object(request.data().clone()),
    };
    request.add_transport_option(TransportOption::PostFields, fields)?;
    Ok(())
}

fn transport_call(request: &Request) -> Result<TransportCall, KnockError> {
    let mut options = request.transport_options().clone();
    let body = options
        .remove(&TransportOption::PostFields)
        .as_ref()
        .and_then(TransportBody::from_post_fields);

    let mut headers = request.headers().to_vec();
    if let Some(body) = &body {
        if request.header("content-type").is_none() {
            let mime = match body {
                TransportBody::Text(_) => request.content_type().mime(),
                TransportBody::Fields(_) => ContentType::Form.mime(),
            };
            headers.push(("Content-Type".to_string(), mime.to_string()));
        }
    }

    Ok(TransportCall {
        url: request.url()?,
        method: request.method(),
        headers,
        body,
        options,
    })
}
