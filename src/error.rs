//! Error definitions for dispatching requests.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by a transport object.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The factory could not produce a transport on this platform.
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    /// An operation was called in the wrong ready state.
    #[error("invalid transport state: {0}")]
    InvalidState(&'static str),

    /// The URL scheme cannot be served by this transport.
    #[error("unsupported url scheme `{0}`")]
    UnsupportedScheme(String),

    /// Header name or value rejected by the transport.
    #[error("invalid header `{name}`")]
    InvalidHeader { name: String },

    /// Connection, DNS or protocol failure below HTTP.
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Errors that can occur while dispatching a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The configuration value is not an object.
    #[error("options must be an object")]
    OptionsNotObject,

    /// No request URL was supplied.
    #[error("options must contain a url")]
    MissingUrl,

    /// The headers option was supplied but is not an object.
    #[error("headers option must be an object")]
    HeadersNotObject,

    /// An option has the wrong shape.
    #[error("invalid option `{field}`: {reason}")]
    InvalidOption { field: &'static str, reason: String },

    /// Method is not a valid HTTP token.
    #[error("invalid request method `{0}`")]
    InvalidMethod(String),

    /// URL could not be parsed or resolved.
    #[error("invalid request url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Payload shape cannot be serialized for the chosen target.
    #[error("cannot send {data} data as {target}")]
    UnserializableBody { data: &'static str, target: String },

    /// Every transport factory failed.
    #[error("no transport available (tried {tried})")]
    Unsupported { tried: usize },

    /// Transport failure, either while configuring or after send.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// A json data type was requested but the response is not valid JSON.
    #[error("failed to decode json response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The dispatch task ended without reporting a result.
    #[error("dispatch terminated before completion")]
    Aborted,
}

impl DispatchError {
    /// Whether this error was raised before the request was sent.
    pub fn is_precondition(&self) -> bool {
        !matches!(
            self,
            DispatchError::Transport(TransportError::Network(_))
                | DispatchError::Transport(TransportError::Body(_))
                | DispatchError::Timeout(_)
                | DispatchError::Decode(_)
                | DispatchError::Aborted
        )
    }
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
