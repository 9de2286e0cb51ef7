//! Modern transport backed by `reqwest`.
//!
//! # Design Decisions
//! - Two clients per factory: one without a cookie store for anonymous
//!   requests, one with a cookie store used when credentials are requested
//! - Bodies are read chunk by chunk and abandoned past the configured limit
//! - Text is always decoded as UTF-8, the charset implied by the `text/plain`
//!   override the dispatcher applies

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::schema::HttpSettings;
use crate::error::TransportError;
use crate::request::response::{ResponseType, ResponseValue};
use crate::transport::factory::TransportFactory;
use crate::transport::{body_limit_exceeded, expect_state, OpenRequest, ReadyState, Transport};

#[derive(Debug, Clone)]
struct Clients {
    anonymous: reqwest::Client,
    credentialed: reqwest::Client,
    max_response_bytes: usize,
}

/// Factory for [`ModernTransport`].
///
/// Client construction happens once; if it failed, every `create` fails.
#[derive(Debug, Clone)]
pub struct ModernFactory {
    clients: Result<Clients, String>,
}

impl ModernFactory {
    pub fn new(settings: &HttpSettings) -> Self {
        let clients = build_client(settings, false)
            .and_then(|anonymous| {
                Ok(Clients {
                    anonymous,
                    credentialed: build_client(settings, true)?,
                    max_response_bytes: settings.max_response_bytes,
                })
            })
            .map_err(|e| e.to_string());

        if let Err(e) = &clients {
            tracing::warn!(error = %e, "Failed to build reqwest clients, modern transport disabled");
        }
        Self { clients }
    }
}

fn build_client(settings: &HttpSettings, cookies: bool) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(settings.user_agent.clone())
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .cookie_store(cookies);
    if !settings.use_system_proxy {
        builder = builder.no_proxy();
    }
    builder.build()
}

impl TransportFactory for ModernFactory {
    fn name(&self) -> &'static str {
        "modern"
    }

    fn create(&self) -> Result<Box<dyn Transport>, TransportError> {
        let clients = self
            .clients
            .clone()
            .map_err(TransportError::Unavailable)?;
        Ok(Box::new(ModernTransport::new(clients)))
    }
}

/// Transport issuing requests through `reqwest`.
#[derive(Debug)]
pub struct ModernTransport {
    clients: Clients,
    state: ReadyState,
    request: Option<OpenRequest>,
    with_credentials: bool,
    headers: HeaderMap,
    response_type: ResponseType,
    status: u16,
    status_text: String,
    response_headers: HeaderMap,
    response: ResponseValue,
}

impl ModernTransport {
    fn new(clients: Clients) -> Self {
        Self {
            clients,
            state: ReadyState::Unsent,
            request: None,
            with_credentials: false,
            headers: HeaderMap::new(),
            response_type: ResponseType::Default,
            status: 0,
            status_text: String::new(),
            response_headers: HeaderMap::new(),
            response: ResponseValue::default(),
        }
    }
}

#[async_trait]
impl Transport for ModernTransport {
    fn name(&self) -> &'static str {
        "modern"
    }

    fn open(&mut self, request: OpenRequest) -> Result<(), TransportError> {
        match request.url.scheme() {
            "http" | "https" => {}
            other => return Err(TransportError::UnsupportedScheme(other.to_string())),
        }

        let clients = self.clients.clone();
        *self = Self::new(clients);
        self.request = Some(request);
        self.state = ReadyState::Opened;
        Ok(())
    }

    fn set_with_credentials(&mut self, enabled: bool) {
        self.with_credentials = enabled;
    }

    fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), TransportError> {
        expect_state(self.state, ReadyState::Opened, "headers can only be set after open")?;
        let invalid = || TransportError::InvalidHeader {
            name: name.to_string(),
        };
        let header = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        self.headers.append(header, value);
        Ok(())
    }

    fn set_response_type(&mut self, response_type: ResponseType) -> Result<(), TransportError> {
        let is_async = self.request.as_ref().map_or(true, |request| request.is_async);
        if !is_async {
            return Err(TransportError::InvalidState(
                "response type cannot be set for synchronous requests",
            ));
        }
        self.response_type = response_type;
        Ok(())
    }

    fn override_mime_type(&mut self, _mime: &str) -> bool {
        true
    }

    async fn send(&mut self, body: Option<Bytes>) -> Result<(), TransportError> {
        expect_state(self.state, ReadyState::Opened, "send called before open")?;
        let request = self
            .request
            .as_ref()
            .ok_or(TransportError::InvalidState("send called before open"))?;

        let client = if self.with_credentials {
            &self.clients.credentialed
        } else {
            &self.clients.anonymous
        };

        let mut builder = client
            .request(request.method.clone(), request.url.clone())
            .headers(self.headers.clone());
        if let Some(username) = &request.username {
            builder = builder.basic_auth(username, request.password.as_deref());
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let mut response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        self.status = status.as_u16();
        self.status_text = status.canonical_reason().unwrap_or_default().to_string();
        self.response_headers = response.headers().clone();
        self.state = ReadyState::Loading;

        let limit = self.clients.max_response_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(body_limit_exceeded(limit));
        }
        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?
        {
            if body.len() + chunk.len() > limit {
                return Err(body_limit_exceeded(limit));
            }
            body.extend_from_slice(&chunk);
        }
        self.response = ResponseValue::decode(body.freeze(), self.response_type);
        self.state = ReadyState::Done;

        tracing::trace!(status = self.status, "Modern transport completed");
        Ok(())
    }

    fn ready_state(&self) -> ReadyState {
        self.state
    }

    fn status(&self) -> u16 {
        self.status
    }

    fn status_text(&self) -> &str {
        &self.status_text
    }

    fn response_header(&self, name: &str) -> Option<&str> {
        self.response_headers
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    fn take_response(&mut self) -> ResponseValue {
        std::mem::take(&mut self.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use url::Url;

    fn transport() -> Box<dyn Transport> {
        ModernFactory::new(&HttpSettings::default()).create().unwrap()
    }

    fn open_request(url: &str, is_async: bool) -> OpenRequest {
        OpenRequest {
            method: Method::GET,
            url: Url::parse(url).unwrap(),
            is_async,
            username: None,
            password: None,
        }
    }

    #[test]
    fn test_rejects_unknown_scheme() {
        let mut transport = transport();
        let err = transport
            .open(open_request("ftp://example.com/file", true))
            .unwrap_err();
        assert!(matches!(err, TransportError::UnsupportedScheme(s) if s == "ftp"));
    }

    #[test]
    fn test_headers_require_open() {
        let mut transport = transport();
        assert!(transport.set_request_header("X-Test", "1").is_err());

        transport.open(open_request("http://example.com/", true)).unwrap();
        assert!(transport.set_request_header("X-Test", "1").is_ok());
        assert!(matches!(
            transport.set_request_header("bad header", "1"),
            Err(TransportError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_sync_rejects_response_type() {
        let mut transport = transport();
        transport.open(open_request("http://example.com/", false)).unwrap();
        assert!(transport.set_response_type(ResponseType::Json).is_err());
        assert_eq!(transport.ready_state(), ReadyState::Opened);
    }
}
