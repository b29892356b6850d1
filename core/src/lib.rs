//! Small object-oriented HTTP client with a guarded request lifecycle.
//!
//! # Overview
//! A `Handler` builds `Request` values from a common template, dispatches
//! them through a `Transport` (or substitutes a fake response), and wraps
//! what comes back in a `Response`. Callbacks can hook four lifecycle
//! events along the way.
//!
//! # Design
//! - `Request` is a one-way state machine: `Prepare -> Processing ->
//!   Complete`. A complete request rejects every mutation.
//! - The network sits behind the `Transport` trait; `UreqTransport` is the
//!   default. Non-2xx codes and connection failures come back as responses,
//!   not errors.
//! - Requests, transport calls and replies are plain data, so the whole
//!   lifecycle can be exercised without a socket.

pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod http;
pub mod query;
pub mod request;
pub mod response;
pub mod transport;
pub mod types;

pub use config::HandlerConfig;
pub use error::KnockError;
pub use event::{Callback, Event, EventPayload};
pub use handler::Handler;
pub use http::{ContentType, Method};
pub use request::{Request, RequestStatus};
pub use response::Response;
pub use transport::{
    Transport, TransportBody, TransportCall, TransportError, TransportOption, TransportReply,
    UreqTransport,
};
pub use types::{Data, RequestParams, ResponseParams, TransportOptions};
