//! Completion handling once a transport reaches `Done`.

use crate::error::{DispatchError, DispatchResult, TransportError};
use crate::request::options::{ErrorCallback, SuccessCallback};
use crate::request::response::ResponseValue;
use crate::transport::{ReadyState, Transport};

/// Result of a dispatch that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Status below 400, with the interpreted body.
    Success(ResponseValue),
    /// Status 400 or above.
    Failed { status: u16, status_text: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn value(&self) -> Option<&ResponseValue> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failed { .. } => None,
        }
    }
}

/// Callbacks and hints carried from the request to its completion.
pub(crate) struct Completion {
    pub data_type: Option<String>,
    pub success: Option<SuccessCallback>,
    pub error: Option<ErrorCallback>,
}

impl Completion {
    /// Inspect the finished transport and invoke at most one callback.
    pub fn complete(self, transport: &mut dyn Transport) -> DispatchResult<Outcome> {
        if transport.ready_state() != ReadyState::Done {
            return Err(TransportError::InvalidState("completion before the transport is done").into());
        }

        let status = transport.status();
        if status >= 400 {
            let status_text = transport.status_text().to_string();
            if let Some(callback) = self.error {
                callback(&*transport, status, &status_text);
            }
            return Ok(Outcome::Failed { status, status_text });
        }

        let mut value = transport.take_response();
        let wants_json = self
            .data_type
            .as_deref()
            .is_some_and(|data_type| data_type.eq_ignore_ascii_case("json"));
        if wants_json {
            if let ResponseValue::Text(text) = &value {
                value = ResponseValue::Json(serde_json::from_str(text).map_err(DispatchError::Decode)?);
            }
        }

        if let Some(callback) = self.success {
            callback(value.clone());
        }
        Ok(Outcome::Success(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use http::Method;
    use serde_json::json;
    use url::Url;

    use crate::transport::factory::TransportFactory;
    use crate::transport::scripted::{ScriptedFactory, ScriptedResponse};
    use crate::transport::OpenRequest;

    async fn finished(response: ScriptedResponse) -> Box<dyn Transport> {
        let mut transport = ScriptedFactory::new(response).create().unwrap();
        transport
            .open(OpenRequest {
                method: Method::GET,
                url: Url::parse("http://example.com/").unwrap(),
                is_async: true,
                username: None,
                password: None,
            })
            .unwrap();
        transport.send(None).await.unwrap();
        transport
    }

    #[tokio::test]
    async fn test_json_data_type_parses_text() {
        let mut transport = finished(ScriptedResponse::ok("{\"ok\":true}")).await;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let outcome = Completion {
            data_type: Some("JSON".into()),
            success: Some(Box::new(move |value: ResponseValue| sink.lock().unwrap().push(value))),
            error: None,
        }
        .complete(transport.as_mut())
        .unwrap();

        assert_eq!(outcome, Outcome::Success(ResponseValue::Json(json!({"ok": true}))));
        assert_eq!(*seen.lock().unwrap(), vec![ResponseValue::Json(json!({"ok": true}))]);
    }

    #[tokio::test]
    async fn test_other_data_types_pass_through() {
        let mut transport = finished(ScriptedResponse::ok("{\"ok\":true}")).await;
        let outcome = Completion {
            data_type: Some("text".into()),
            success: None,
            error: None,
        }
        .complete(transport.as_mut())
        .unwrap();
        assert_eq!(outcome, Outcome::Success(ResponseValue::Text("{\"ok\":true}".into())));
    }

    #[tokio::test]
    async fn test_error_status_skips_success() {
        let mut transport =
            finished(ScriptedResponse::with_status(500, "Internal Server Error", "boom")).await;
        let calls = Arc::new(Mutex::new(Vec::new()));
        let on_error = calls.clone();
        let on_success = calls.clone();

        let outcome = Completion {
            data_type: Some("json".into()),
            success: Some(Box::new(move |_: ResponseValue| on_success.lock().unwrap().push("success".to_string()))),
            error: Some(Box::new(move |transport: &dyn Transport, status: u16, text: &str| {
                on_error
                    .lock()
                    .unwrap()
                    .push(format!("{} {} {}", transport.name(), status, text))
            })),
        }
        .complete(transport.as_mut())
        .unwrap();

        assert!(!outcome.is_success());
        assert_eq!(*calls.lock().unwrap(), vec!["scripted 500 Internal Server Error".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let mut transport = finished(ScriptedResponse::ok("not json")).await;
        let err = Completion {
            data_type: Some("json".into()),
            success: Some(Box::new(|_: ResponseValue| panic!("success must not run"))),
            error: None,
        }
        .complete(transport.as_mut())
        .unwrap_err();
        assert!(matches!(err, DispatchError::Decode(_)));
    }

    #[test]
    fn test_requires_done_state() {
        let mut transport = ScriptedFactory::new(ScriptedResponse::ok("")).create().unwrap();
        let err = Completion {
            data_type: None,
            success: None,
            error: None,
        }
        .complete(transport.as_mut())
        .unwrap_err();
        assert!(matches!(err, DispatchError::Transport(TransportError::InvalidState(_))));
    }
}
