//! Transport returning canned responses.
//!
//! Every transport created by a [`ScriptedFactory`] records what it was asked
//! to do, so callers can stub the network and inspect the configured request.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransportError;
use crate::request::response::{ResponseType, ResponseValue};
use crate::transport::factory::TransportFactory;
use crate::transport::{expect_state, OpenRequest, ReadyState, Transport};

/// Response a scripted transport replies with.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ScriptedResponse {
    /// `200 OK` with `body`.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::with_status(200, "OK", body)
    }

    pub fn with_status(status: u16, status_text: &str, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: status_text.to_string(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Everything a scripted transport was asked to do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedRequest {
    pub opened: Option<OpenRequest>,
    pub with_credentials: bool,
    pub headers: Vec<(String, String)>,
    pub response_type: Option<ResponseType>,
    pub mime_override: Option<String>,
    pub body: Option<Bytes>,
    pub sent: bool,
}

impl RecordedRequest {
    /// Last value set for header `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Respond(ScriptedResponse),
    Fail(String),
}

type Journal = Arc<Mutex<Vec<Arc<Mutex<RecordedRequest>>>>>;

/// Factory producing [`ScriptedTransport`]s. Clones share their journal.
#[derive(Debug, Clone)]
pub struct ScriptedFactory {
    reply: Option<Reply>,
    unavailable: Option<String>,
    created: Arc<AtomicUsize>,
    journal: Journal,
}

impl ScriptedFactory {
    /// Transports reply with `response`.
    pub fn new(response: ScriptedResponse) -> Self {
        Self::with_reply(Some(Reply::Respond(response)), None)
    }

    /// Transports fail at send with a network error.
    pub fn failing(message: &str) -> Self {
        Self::with_reply(Some(Reply::Fail(message.to_string())), None)
    }

    /// Transports never complete.
    pub fn stalled() -> Self {
        Self::with_reply(None, None)
    }

    /// The factory itself cannot create transports.
    pub fn unavailable(message: &str) -> Self {
        Self::with_reply(None, Some(message.to_string()))
    }

    fn with_reply(reply: Option<Reply>, unavailable: Option<String>) -> Self {
        Self {
            reply,
            unavailable,
            created: Arc::new(AtomicUsize::new(0)),
            journal: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of transports handed out.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Snapshot of every transport's recorded activity, in creation order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|entry| entry.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .collect()
    }
}

impl TransportFactory for ScriptedFactory {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn create(&self) -> Result<Box<dyn Transport>, TransportError> {
        if let Some(message) = &self.unavailable {
            return Err(TransportError::Unavailable(message.clone()));
        }

        let record = Arc::new(Mutex::new(RecordedRequest::default()));
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        self.created.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(ScriptedTransport {
            reply: self.reply.clone(),
            record,
            state: ReadyState::Unsent,
            is_async: true,
            response_type: ResponseType::Default,
            status: 0,
            status_text: String::new(),
            response_headers: Vec::new(),
            response: ResponseValue::default(),
        }))
    }
}

/// Transport replying from a script instead of the network.
#[derive(Debug)]
pub struct ScriptedTransport {
    reply: Option<Reply>,
    record: Arc<Mutex<RecordedRequest>>,
    state: ReadyState,
    is_async: bool,
    response_type: ResponseType,
    status: u16,
    status_text: String,
    response_headers: Vec<(String, String)>,
    response: ResponseValue,
}

impl ScriptedTransport {
    fn record<F: FnOnce(&mut RecordedRequest)>(&self, update: F) {
        update(&mut self.record.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn open(&mut self, request: OpenRequest) -> Result<(), TransportError> {
        self.is_async = request.is_async;
        self.state = ReadyState::Opened;
        self.record(|r| {
            *r = RecordedRequest {
                opened: Some(request),
                ..RecordedRequest::default()
            }
        });
        Ok(())
    }

    fn set_with_credentials(&mut self, enabled: bool) {
        self.record(|r| r.with_credentials = enabled);
    }

    fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), TransportError> {
        expect_state(self.state, ReadyState::Opened, "headers can only be set after open")?;
        self.record(|r| r.headers.push((name.to_string(), value.to_string())));
        Ok(())
    }

    fn set_response_type(&mut self, response_type: ResponseType) -> Result<(), TransportError> {
        if !self.is_async {
            return Err(TransportError::InvalidState(
                "response type cannot be set for synchronous requests",
            ));
        }
        self.response_type = response_type;
        self.record(|r| r.response_type = Some(response_type));
        Ok(())
    }

    fn override_mime_type(&mut self, mime: &str) -> bool {
        self.record(|r| r.mime_override = Some(mime.to_string()));
        true
    }

    async fn send(&mut self, body: Option<Bytes>) -> Result<(), TransportError> {
        expect_state(self.state, ReadyState::Opened, "send called before open")?;
        self.record(|r| {
            r.body = body;
            r.sent = true;
        });

        match self.reply.clone() {
            Some(Reply::Respond(response)) => {
                self.status = response.status;
                self.status_text = response.status_text;
                self.response_headers = response.headers;
                self.state = ReadyState::Loading;
                self.response = ResponseValue::decode(response.body, self.response_type);
                self.state = ReadyState::Done;
                Ok(())
            }
            Some(Reply::Fail(message)) => {
                self.state = ReadyState::Done;
                Err(TransportError::Network(message))
            }
            None => std::future::pending().await,
        }
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
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn take_response(&mut self) -> ResponseValue {
        std::mem::take(&mut self.response)
    }
}
