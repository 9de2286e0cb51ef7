//! Transport subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher
//!     → factory.rs (ordered factories, first success wins)
//!     → Box<dyn Transport>
//!         open → set headers / response type → send → Done
//!     → completion reads status, status text and response
//! ```
//!
//! # Implementations
//! - modern.rs: reqwest client, TLS, cookie store for credentialed requests
//! - legacy.rs: hyper-util legacy client, plain HTTP only
//! - scripted.rs: canned responses, records every call

pub mod factory;
pub mod legacy;
pub mod modern;
pub mod scripted;

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use url::Url;

use crate::error::TransportError;
use crate::request::response::{ResponseType, ResponseValue};

pub use factory::{FactoryChain, TransportFactory};
pub use legacy::{LegacyFactory, LegacyTransport};
pub use modern::{ModernFactory, ModernTransport};
pub use scripted::{ScriptedFactory, ScriptedResponse, ScriptedTransport};

/// Lifecycle of a transport object.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    Unsent = 0,
    Opened = 1,
    HeadersReceived = 2,
    Loading = 3,
    Done = 4,
}

/// Parameters passed to [`Transport::open`].
#[derive(Debug, Clone, PartialEq)]
pub struct OpenRequest {
    pub method: Method,
    pub url: Url,
    /// False when the caller waits for completion.
    pub is_async: bool,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// A request/response handle.
///
/// A transport is used for exactly one request: it is opened, configured,
/// sent, and then inspected once it reaches [`ReadyState::Done`].
#[async_trait]
pub trait Transport: Send + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Initialize the request. Resets any previous state.
    fn open(&mut self, request: OpenRequest) -> Result<(), TransportError>;

    /// Send cookies and other ambient credentials.
    fn set_with_credentials(&mut self, enabled: bool);

    /// Append a request header. Only valid once opened.
    fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), TransportError>;

    /// Select how the response body is interpreted.
    ///
    /// Rejected for synchronous requests.
    fn set_response_type(&mut self, response_type: ResponseType) -> Result<(), TransportError>;

    /// Treat the response as `mime` regardless of its Content-Type.
    ///
    /// Returns false if the transport has no such override.
    fn override_mime_type(&mut self, _mime: &str) -> bool {
        false
    }

    /// Send the request and wait until the response is fully read.
    async fn send(&mut self, body: Option<Bytes>) -> Result<(), TransportError>;

    fn ready_state(&self) -> ReadyState;

    /// Response status code, 0 until headers are received.
    fn status(&self) -> u16;

    fn status_text(&self) -> &str;

    fn response_header(&self, name: &str) -> Option<&str>;

    /// Move the interpreted response body out of the transport.
    fn take_response(&mut self) -> ResponseValue;
}

/// Ensure the transport is in `expected` state.
pub(crate) fn expect_state(
    current: ReadyState,
    expected: ReadyState,
    message: &'static str,
) -> Result<(), TransportError> {
    if current == expected {
        Ok(())
    } else {
        Err(TransportError::InvalidState(message))
    }
}

pub(crate) fn body_limit_exceeded(limit: usize) -> TransportError {
    TransportError::Body(format!("response body exceeds {} bytes", limit))
}

/// Value for an `Authorization: Basic` header.
pub(crate) fn basic_auth_value(username: &str, password: Option<&str>) -> String {
    use base64::Engine;

    let credentials = format!("{}:{}", username, password.unwrap_or_default());
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(credentials)
    )
}
