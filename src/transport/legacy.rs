//! Legacy transport backed by the hyper-util legacy client.
//!
//! Plain HTTP only, no cookie store, no MIME override. Kept as the fallback
//! when the modern client cannot be built.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use http::Request;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::schema::HttpSettings;
use crate::error::TransportError;
use crate::request::response::{ResponseType, ResponseValue};
use crate::transport::factory::TransportFactory;
use crate::transport::{
    basic_auth_value, body_limit_exceeded, expect_state, OpenRequest, ReadyState, Transport,
};

/// Factory for [`LegacyTransport`].
#[derive(Debug, Clone)]
pub struct LegacyFactory {
    client: Client<HttpConnector, Body>,
    user_agent: String,
    max_response_bytes: usize,
}

impl LegacyFactory {
    pub fn new(settings: &HttpSettings) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(settings.connect_timeout_secs)));

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self {
            client,
            user_agent: settings.user_agent.clone(),
            max_response_bytes: settings.max_response_bytes,
        }
    }
}

impl TransportFactory for LegacyFactory {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn create(&self) -> Result<Box<dyn Transport>, TransportError> {
        // The connector spawns onto the current runtime.
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(TransportError::Unavailable(
                "legacy transport requires a tokio runtime".to_string(),
            ));
        }
        Ok(Box::new(LegacyTransport::new(
            self.client.clone(),
            self.user_agent.clone(),
            self.max_response_bytes,
        )))
    }
}

/// Transport issuing plain HTTP requests through hyper.
#[derive(Debug)]
pub struct LegacyTransport {
    client: Client<HttpConnector, Body>,
    user_agent: String,
    max_response_bytes: usize,
    state: ReadyState,
    request: Option<OpenRequest>,
    headers: HeaderMap,
    response_type: ResponseType,
    status: u16,
    status_text: String,
    response_headers: HeaderMap,
    response: ResponseValue,
}

impl LegacyTransport {
    fn new(client: Client<HttpConnector, Body>, user_agent: String, max_response_bytes: usize) -> Self {
        Self {
            client,
            user_agent,
            max_response_bytes,
            state: ReadyState::Unsent,
            request: None,
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
impl Transport for LegacyTransport {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn open(&mut self, request: OpenRequest) -> Result<(), TransportError> {
        if request.url.scheme() != "http" {
            return Err(TransportError::UnsupportedScheme(
                request.url.scheme().to_string(),
            ));
        }

        let client = self.client.clone();
        let user_agent = std::mem::take(&mut self.user_agent);
        *self = Self::new(client, user_agent, self.max_response_bytes);
        self.request = Some(request);
        self.state = ReadyState::Opened;
        Ok(())
    }

    fn set_with_credentials(&mut self, enabled: bool) {
        // No cookie store to attach.
        if enabled {
            tracing::debug!("Legacy transport ignores withCredentials");
        }
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

    async fn send(&mut self, body: Option<Bytes>) -> Result<(), TransportError> {
        expect_state(self.state, ReadyState::Opened, "send called before open")?;
        let open = self
            .request
            .as_ref()
            .ok_or(TransportError::InvalidState("send called before open"))?;

        let mut request = Request::builder()
            .method(open.method.clone())
            .uri(open.url.as_str())
            .body(body.map(Body::from).unwrap_or_else(Body::empty))
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let headers = request.headers_mut();
        *headers = self.headers.clone();
        if let (Some(username), false) = (&open.username, headers.contains_key(AUTHORIZATION)) {
            let value = basic_auth_value(username, open.password.as_deref());
            let value = HeaderValue::from_str(&value).map_err(|_| TransportError::InvalidHeader {
                name: AUTHORIZATION.to_string(),
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        if !headers.contains_key(http::header::USER_AGENT) {
            if let Ok(value) = HeaderValue::from_str(&self.user_agent) {
                headers.insert(http::header::USER_AGENT, value);
            }
        }

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        self.status = status.as_u16();
        self.status_text = response
            .extensions()
            .get::<hyper::ext::ReasonPhrase>()
            .and_then(|reason| std::str::from_utf8(reason.as_bytes()).ok())
            .or_else(|| status.canonical_reason())
            .unwrap_or_default()
            .to_string();
        self.response_headers = response.headers().clone();
        self.state = ReadyState::Loading;

        let limit = self.max_response_bytes;
        let declared = self
            .response_headers
            .get(http::header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());
        if declared.is_some_and(|len| len > limit as u64) {
            return Err(body_limit_exceeded(limit));
        }
        // Undeclared lengths are cut off by `to_bytes` itself.
        let bytes = axum::body::to_bytes(Body::new(response.into_body()), limit)
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;
        self.response = ResponseValue::decode(bytes, self.response_type);
        self.state = ReadyState::Done;

        tracing::trace!(status = self.status, "Legacy transport completed");
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

    #[test]
    fn test_requires_runtime() {
        let factory = LegacyFactory::new(&HttpSettings::default());
        assert!(matches!(
            factory.create(),
            Err(TransportError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_https() {
        let factory = LegacyFactory::new(&HttpSettings::default());
        let mut transport = factory.create().unwrap();
        let err = transport
            .open(OpenRequest {
                method: Method::GET,
                url: Url::parse("https://example.com/").unwrap(),
                is_async: true,
                username: None,
                password: None,
            })
            .unwrap_err();
        assert!(matches!(err, TransportError::UnsupportedScheme(s) if s == "https"));
        assert!(!transport.override_mime_type("text/plain"));
    }
}
