//! Response interpretation.

use bytes::Bytes;
use serde_json::Value;

/// How the transport should interpret the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseType {
    /// Text, same as [`ResponseType::Text`].
    #[default]
    Default,
    Text,
    ArrayBuffer,
    Blob,
    Document,
    Json,
}

impl ResponseType {
    /// Map a caller data type to a response type.
    ///
    /// Unrecognized values fall back to [`ResponseType::Default`].
    pub fn from_data_type(data_type: &str) -> Self {
        match data_type {
            "text" => ResponseType::Text,
            "arraybuffer" | "arrayBuffer" => ResponseType::ArrayBuffer,
            "blob" => ResponseType::Blob,
            "document" => ResponseType::Document,
            "json" => ResponseType::Json,
            _ => ResponseType::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Default => "",
            ResponseType::Text => "text",
            ResponseType::ArrayBuffer => "arraybuffer",
            ResponseType::Blob => "blob",
            ResponseType::Document => "document",
            ResponseType::Json => "json",
        }
    }
}

/// A response body after interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseValue {
    Text(String),
    Binary(Bytes),
    Json(Value),
}

impl ResponseValue {
    /// Decode raw body bytes according to the response type.
    ///
    /// Invalid or empty JSON decodes to `null`.
    pub fn decode(body: Bytes, response_type: ResponseType) -> Self {
        match response_type {
            ResponseType::Default | ResponseType::Text | ResponseType::Document => {
                ResponseValue::Text(String::from_utf8_lossy(&body).into_owned())
            }
            ResponseType::ArrayBuffer | ResponseType::Blob => ResponseValue::Binary(body),
            ResponseType::Json => {
                ResponseValue::Json(serde_json::from_slice(&body).unwrap_or(Value::Null))
            }
        }
    }

    /// Borrow the text, if this is a textual response.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Borrow the JSON value, if this response was decoded as JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseValue::Json(value) => Some(value),
            _ => None,
        }
    }
}

impl Default for ResponseValue {
    fn default() -> Self {
        ResponseValue::Text(String::new())
    }
}
