//! Per-call request configuration.

use std::fmt;

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::error::{DispatchError, DispatchResult};
use crate::request::response::ResponseValue;
use crate::transport::Transport;

/// Invoked with the interpreted response body when status < 400.
pub type SuccessCallback = Box<dyn FnOnce(ResponseValue) + Send + 'static>;

/// Invoked with the transport, status code and status text when status >= 400.
pub type ErrorCallback = Box<dyn FnOnce(&dyn Transport, u16, &str) + Send + 'static>;

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestData {
    /// Sent verbatim (appended to the url for GET/HEAD).
    Text(String),
    /// Key/value mapping, serialized according to method and content type.
    Params(Map<String, Value>),
    /// Raw bytes, never transformed.
    Bytes(Bytes),
}

impl RequestData {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            RequestData::Text(_) => "text",
            RequestData::Params(_) => "mapping",
            RequestData::Bytes(_) => "binary",
        }
    }
}

impl From<&str> for RequestData {
    fn from(text: &str) -> Self {
        RequestData::Text(text.to_string())
    }
}

impl From<String> for RequestData {
    fn from(text: String) -> Self {
        RequestData::Text(text)
    }
}

impl From<Map<String, Value>> for RequestData {
    fn from(params: Map<String, Value>) -> Self {
        RequestData::Params(params)
    }
}

impl From<Bytes> for RequestData {
    fn from(bytes: Bytes) -> Self {
        RequestData::Bytes(bytes)
    }
}

impl From<Vec<u8>> for RequestData {
    fn from(bytes: Vec<u8>) -> Self {
        RequestData::Bytes(Bytes::from(bytes))
    }
}

/// Configuration for a single dispatch.
pub struct RequestConfig {
    /// Request target, absolute or relative to the dispatcher base url.
    pub url: String,

    /// HTTP method, defaults to GET.
    pub method: Option<String>,

    /// Optional payload.
    pub data: Option<RequestData>,

    /// Content-Type header; the dispatcher default applies when unset.
    pub content_type: Option<String>,

    /// Extra request headers, applied in order.
    pub headers: Vec<(String, String)>,

    /// Hint for interpreting the response body ("json", "text", ...).
    pub data_type: Option<String>,

    /// Return before completion (default) or wait for it.
    pub asynchronous: bool,

    pub username: Option<String>,
    pub password: Option<String>,

    /// Carry cookies and other ambient credentials.
    pub with_credentials: bool,

    pub success: Option<SuccessCallback>,
    pub error: Option<ErrorCallback>,
}

impl RequestConfig {
    /// Create a GET configuration for `url` with every option at its default.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: None,
            data: None,
            content_type: None,
            headers: Vec::new(),
            data_type: None,
            asynchronous: true,
            username: None,
            password: None,
            with_credentials: false,
            success: None,
            error: None,
        }
    }

    /// Build a configuration from a loosely-typed JSON options object.
    ///
    /// Keys follow the common option names (`url`, `method`, `data`,
    /// `contentType`, `headers`, `dataType`, `async`, `username`, `password`,
    /// `withCredentials`). Callback keys cannot hold functions in JSON and are
    /// ignored; attach callbacks with [`RequestConfig::on_success`] and
    /// [`RequestConfig::on_error`].
    pub fn from_value(value: Value) -> DispatchResult<Self> {
        let Value::Object(mut opts) = value else {
            return Err(DispatchError::OptionsNotObject);
        };

        let url = match opts.remove("url") {
            Some(Value::String(url)) if !url.is_empty() => url,
            None | Some(Value::Null) | Some(Value::String(_)) => {
                return Err(DispatchError::MissingUrl)
            }
            Some(other) => return Err(wrong_type("url", "a string", &other)),
        };

        let mut config = RequestConfig::new(url);
        config.method = take_string(&mut opts, "method")?;
        config.content_type = take_string(&mut opts, "contentType")?;
        config.data_type = take_string(&mut opts, "dataType")?;
        config.username = take_string(&mut opts, "username")?;
        config.password = take_string(&mut opts, "password")?;

        let data = opts.remove("data");
        let data_truthy = data.as_ref().is_some_and(is_truthy);
        config.data = match data {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(RequestData::Text(text)),
            Some(Value::Object(params)) => Some(RequestData::Params(params)),
            Some(Value::Bool(flag)) => Some(RequestData::Text(flag.to_string())),
            Some(Value::Number(number)) => Some(RequestData::Text(number.to_string())),
            Some(other) => return Err(wrong_type("data", "a string or an object", &other)),
        };
        // A falsy scalar means "no data" for methods that carry it in the url.
        let in_url = matches!(config.normalized_method().as_str(), "GET" | "HEAD");
        if in_url && matches!(config.data, Some(RequestData::Text(_))) && !data_truthy {
            config.data = None;
        }

        config.headers = match opts.remove("headers") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Object(headers)) => headers
                .into_iter()
                .map(|(name, value)| match value {
                    Value::String(value) => (name, value),
                    other => (name, other.to_string()),
                })
                .collect(),
            Some(_) => return Err(DispatchError::HeadersNotObject),
        };

        // Only a real boolean overrides the default.
        if let Some(Value::Bool(asynchronous)) = opts.get("async") {
            config.asynchronous = *asynchronous;
        }
        config.with_credentials = opts.get("withCredentials").is_some_and(is_truthy);

        Ok(config)
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn data(mut self, data: impl Into<RequestData>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set a key/value payload.
    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let map = params
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect::<Map<String, Value>>();
        self.data = Some(RequestData::Params(map));
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    /// Wait for completion inside `dispatch` instead of returning early.
    pub fn synchronous(mut self) -> Self {
        self.asynchronous = false;
        self
    }

    pub fn credentials(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }

    pub fn with_credentials(mut self, enabled: bool) -> Self {
        self.with_credentials = enabled;
        self
    }

    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(ResponseValue) + Send + 'static,
    {
        self.success = Some(Box::new(callback));
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&dyn Transport, u16, &str) + Send + 'static,
    {
        self.error = Some(Box::new(callback));
        self
    }

    /// Upper-cased method, GET when unset or empty.
    pub fn normalized_method(&self) -> String {
        self.method
            .as_deref()
            .filter(|method| !method.is_empty())
            .map(str::to_ascii_uppercase)
            .unwrap_or_else(|| "GET".to_string())
    }

    /// Check the invariants the typed builder cannot enforce.
    pub fn validate(&self) -> DispatchResult<()> {
        if self.url.trim().is_empty() {
            return Err(DispatchError::MissingUrl);
        }
        if self.headers.iter().any(|(name, _)| name.trim().is_empty()) {
            return Err(DispatchError::InvalidOption {
                field: "headers",
                reason: "header names must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("data", &self.data)
            .field("content_type", &self.content_type)
            .field("headers", &self.headers)
            .field("data_type", &self.data_type)
            .field("asynchronous", &self.asynchronous)
            .field("username", &self.username)
            .field("with_credentials", &self.with_credentials)
            .field("success", &self.success.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

/// JavaScript-style truthiness: `false`, `0`, `""` and `null` are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn take_string(opts: &mut Map<String, Value>, field: &'static str) -> DispatchResult<Option<String>> {
    match opts.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(other) => Err(wrong_type(field, "a string", &other)),
    }
}

fn wrong_type(field: &'static str, expected: &str, found: &Value) -> DispatchError {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    DispatchError::InvalidOption {
        field,
        reason: format!("expected {}, found {}", expected, found),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_object_options_rejected() {
        for value in [json!(null), json!("http://example.com"), json!(42), json!([1, 2])] {
            let err = RequestConfig::from_value(value).unwrap_err();
            assert!(matches!(err, DispatchError::OptionsNotObject));
        }
    }

    #[test]
    fn test_missing_url_rejected() {
        let err = RequestConfig::from_value(json!({"method": "post"})).unwrap_err();
        assert!(matches!(err, DispatchError::MissingUrl));

        let err = RequestConfig::from_value(json!({"url": ""})).unwrap_err();
        assert!(matches!(err, DispatchError::MissingUrl));

        assert!(matches!(
            RequestConfig::new("  ").validate(),
            Err(DispatchError::MissingUrl)
        ));
    }

    #[test]
    fn test_headers_must_be_object() {
        let err = RequestConfig::from_value(json!({
            "url": "http://example.com/",
            "headers": "not-an-object",
        }))
        .unwrap_err();
        assert!(matches!(err, DispatchError::HeadersNotObject));
    }

    #[test]
    fn test_from_value_fields() {
        let config = RequestConfig::from_value(json!({
            "url": "http://example.com/items",
            "method": "post",
            "data": {"x": 1},
            "contentType": "application/json",
            "headers": {"X-Trace": "abc", "X-Count": 3},
            "dataType": "json",
            "async": false,
            "withCredentials": true,
            "success": "not a function",
        }))
        .unwrap();

        assert_eq!(config.normalized_method(), "POST");
        assert_eq!(config.content_type.as_deref(), Some("application/json"));
        assert_eq!(
            config.headers,
            vec![("X-Trace".to_string(), "abc".to_string()), ("X-Count".to_string(), "3".to_string())]
        );
        assert!(!config.asynchronous);
        assert!(config.with_credentials);
        assert!(config.success.is_none());
        assert!(matches!(config.data, Some(RequestData::Params(_))));
    }

    #[test]
    fn test_non_boolean_async_ignored() {
        let config = RequestConfig::from_value(json!({"url": "/x", "async": "no"})).unwrap();
        assert!(config.asynchronous);
    }

    #[test]
    fn test_falsy_data_dropped_for_get() {
        for data in [json!(false), json!(0), json!("")] {
            let config =
                RequestConfig::from_value(json!({"url": "http://example.com/a", "data": data})).unwrap();
            assert!(config.data.is_none());
        }

        let config = RequestConfig::from_value(json!({"url": "/a", "method": "head", "data": 0})).unwrap();
        assert!(config.data.is_none());

        let config = RequestConfig::from_value(json!({"url": "/a", "data": "?q=1"})).unwrap();
        assert_eq!(config.data, Some(RequestData::Text("?q=1".to_string())));

        let config = RequestConfig::from_value(json!({"url": "/a", "method": "POST", "data": false})).unwrap();
        assert_eq!(config.data, Some(RequestData::Text("false".to_string())));
    }

    #[test]
    fn test_truthy_with_credentials() {
        for (flag, expected) in [
            (json!(true), true),
            (json!(1), true),
            (json!("yes"), true),
            (json!(false), false),
            (json!(0), false),
            (json!(""), false),
            (json!(null), false),
        ] {
            let config =
                RequestConfig::from_value(json!({"url": "/a", "withCredentials": flag})).unwrap();
            assert_eq!(config.with_credentials, expected);
        }
    }

    #[test]
    fn test_method_defaults_to_get() {
        assert_eq!(RequestConfig::new("/x").normalized_method(), "GET");
        assert_eq!(RequestConfig::new("/x").method("").normalized_method(), "GET");
        assert_eq!(RequestConfig::new("/x").method("patch").normalized_method(), "PATCH");
    }
}
