//! Configuration schema definitions.
//!
//! This module defines the settings shared by every dispatch.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Content type used when a request does not name one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Root settings for a dispatcher.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatcherSettings {
    /// Transport factories in preference order.
    pub transports: Vec<TransportKind>,

    /// Content-Type applied when the request has none.
    pub default_content_type: String,

    /// Base against which relative request urls are resolved.
    pub base_url: Option<String>,

    /// Client settings shared by the network transports.
    pub http: HttpSettings,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            transports: vec![TransportKind::Modern, TransportKind::Legacy],
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
            base_url: None,
            http: HttpSettings::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Available transport implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// reqwest client with TLS and cookies.
    Modern,
    /// hyper-util legacy client, plain HTTP.
    Legacy,
}

/// Response body limit when none is configured (10 MiB).
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 10 * 1024 * 1024;

/// Network client settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpSettings {
    /// User-Agent header sent by the network transports.
    pub user_agent: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Whole-request deadline in seconds. No deadline when unset.
    pub request_timeout_secs: Option<u64>,

    /// Honor HTTP(S)_PROXY environment variables.
    pub use_system_proxy: bool,

    /// Largest response body the network transports will buffer.
    pub max_response_bytes: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: concat!("ajax-dispatch/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: None,
            use_system_proxy: true,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when RUST_LOG is unset.
    pub log_level: String,

    /// Output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "ajax_dispatch=info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}
