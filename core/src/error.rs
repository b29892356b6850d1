//! Error types for the knock client.
//!
//! # Design
//! Every variant is raised locally and synchronously; nothing is retried.
//! HTTP-level failures (non-2xx codes, refused connections) are not errors
//! at this layer. They come back as a `Response` whose `http_code` tells the
//! caller what happened.

use thiserror::Error;

/// Errors returned by `Request`, `Handler` and the configuration loaders.
#[derive(Debug, Error)]
pub enum KnockError {
    /// A setter was called after the request reached `Complete`.
    #[error("cannot modify `{0}`: request is complete")]
    MutationAfterComplete(&'static str),

    /// The event name is not one of the four lifecycle events.
    #[error("unknown event `{0}`")]
    InvalidEvent(String),

    #[error("invalid host `{0}`")]
    InvalidHost(String),

    #[error("invalid endpoint `{0}`")]
    InvalidEndpoint(String),

    #[error("invalid protocol `{0}`")]
    InvalidProtocol(String),

    #[error("invalid method `{0}`")]
    InvalidMethod(String),

    #[error("invalid header `{0}`")]
    InvalidHeader(String),

    #[error("invalid content type `{0}`")]
    InvalidContentType(String),

    /// No status is registered under this numeric id.
    #[error("status {0} not found")]
    StatusNotFound(u8),

    /// A required parameter has not been set.
    #[error("parameter `{0}` is not set")]
    ParamNotFound(&'static str),

    /// Request data could not be serialized for the transport.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Response content could not be deserialized into the requested type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
