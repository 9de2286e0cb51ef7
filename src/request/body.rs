//! Query string and request body construction.
//!
//! # Responsibilities
//! - Percent-encode key/value payloads into query strings and form bodies
//! - Serialize key/value payloads to JSON for JSON content types
//! - Pass strings and bytes through untouched

use std::borrow::Cow;

use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

use crate::error::{DispatchError, DispatchResult};
use crate::request::options::RequestData;

/// Characters left unescaped by URI component encoding.
const COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const FORM_MARKER: &str = "x-www-form-urlencoded";
const JSON_MARKER: &str = "application/json";

/// Target and body ready to hand to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    /// Upper-cased method.
    pub method: String,
    /// Url with any query string appended.
    pub target: String,
    pub content_type: String,
    pub body: Option<Bytes>,
}

/// Percent-encode a single URI component.
pub fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT_ENCODE_SET).to_string()
}

/// Encode a mapping as `key=value` pairs joined by `&`.
pub fn parameterize(params: &Map<String, Value>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(&param_text(value))))
        .collect::<Vec<_>>()
        .join("&")
}

fn param_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(text) => Cow::Borrowed(text),
        other => Cow::Owned(other.to_string()),
    }
}

/// Build the request target and body for `method`.
///
/// GET and HEAD carry their data in the url and never send a body.
pub fn prepare(
    method: &str,
    url: &str,
    data: Option<&RequestData>,
    content_type: &str,
) -> DispatchResult<PreparedRequest> {
    let mut target = url.to_string();
    let body = if method == "GET" || method == "HEAD" {
        match data {
            Some(RequestData::Params(params)) => {
                target.push('?');
                target.push_str(&parameterize(params));
            }
            Some(RequestData::Text(text)) => target.push_str(text),
            Some(RequestData::Bytes(_)) => {
                return Err(DispatchError::UnserializableBody {
                    data: "binary",
                    target: "query string".to_string(),
                })
            }
            None => {}
        }
        None
    } else {
        match data {
            None => None,
            Some(RequestData::Text(text)) => Some(Bytes::from(text.clone())),
            Some(RequestData::Bytes(bytes)) => Some(bytes.clone()),
            Some(RequestData::Params(params)) => Some(serialize_params(params, content_type)?),
        }
    };

    Ok(PreparedRequest {
        method: method.to_string(),
        target,
        content_type: content_type.to_string(),
        body,
    })
}

fn serialize_params(params: &Map<String, Value>, content_type: &str) -> DispatchResult<Bytes> {
    if content_type.contains(FORM_MARKER) {
        Ok(Bytes::from(parameterize(params)))
    } else if content_type.contains(JSON_MARKER) {
        serde_json::to_vec(params)
            .map(Bytes::from)
            .map_err(|e| DispatchError::InvalidOption {
                field: "data",
                reason: e.to_string(),
            })
    } else {
        Err(DispatchError::UnserializableBody {
            data: "mapping",
            target: content_type.to_string(),
        })
    }
}
