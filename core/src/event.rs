//! Lifecycle events a `Handler` fires, and their payloads.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::KnockError;
use crate::handler::Handler;
use crate::request::Request;
use crate::response::Response;

/// The four points in a send where a callback may run, in firing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// A request was built. Payload: the request.
    ConstructRequest,
    /// Dispatch is about to start. Payload: the request.
    BeforeSend,
    /// A response was built, real or fake. Payload: the response.
    ConstructResponse,
    /// A real dispatch finished. Payload: the response.
    AfterSend,
}

impl Event {
    pub const ALL: [Event; 4] = [
        Event::ConstructRequest,
        Event::BeforeSend,
        Event::ConstructResponse,
        Event::AfterSend,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConstructRequest => "constructRequest",
            Event::BeforeSend => "beforeSend",
            Event::ConstructResponse => "constructResponse",
            Event::AfterSend => "afterSend",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Event {
    type Err = KnockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Event::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| KnockError::InvalidEvent(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy)]
pub enum EventPayload<'a> {
    Request(&'a Request),
    Response(&'a Response),
}

impl<'a> EventPayload<'a> {
    pub fn request(&self) -> Option<&'a Request> {
        match self {
            EventPayload::Request(r) => Some(r),
            EventPayload::Response(r) => r.request(),
        }
    }

    pub fn response(&self) -> Option<&'a Response> {
        match self {
            EventPayload::Response(r) => Some(r),
            EventPayload::Request(_) => None,
        }
    }
}

/// Callback registered for an event. Its return value is handed back from
/// `Handler::event`.
pub type Callback = Box<dyn Fn(&Handler, EventPayload<'_>) -> Option<Value> + Send + Sync>;
