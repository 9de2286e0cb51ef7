//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! RequestConfig
//!     → validate, normalize method, build target/body (request::body)
//!     → resolve url against the base url
//!     → FactoryChain::acquire → Box<dyn Transport>
//!     → open, credentials flag, Content-Type, response type, MIME override, headers
//!     → async:  spawn send + completion, result over oneshot
//!       sync:   await send + completion before returning
//!     → completion.rs (status check, JSON decode, callback)
//! ```
//!
//! # Design Decisions
//! - Every precondition is checked before a transport is acquired, except
//!   what only the transport can judge (scheme, header syntax)
//! - Transport failures after send resolve the handle with an error and run
//!   no callback; only HTTP statuses reach the error callback

pub mod completion;
pub mod handle;

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::Method;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use crate::config::schema::DispatcherSettings;
use crate::error::{DispatchError, DispatchResult};
use crate::observability::metrics;
use crate::request::body::prepare;
use crate::request::options::RequestConfig;
use crate::request::response::ResponseType;
use crate::transport::factory::FactoryChain;
use crate::transport::{OpenRequest, Transport};

pub use completion::Outcome;
use completion::Completion;
pub use handle::DispatchHandle;

/// MIME type forced on responses so they are never parsed as markup.
const RESPONSE_MIME_OVERRIDE: &str = "text/plain";

/// Configures transports and delivers request results.
#[derive(Debug)]
pub struct Dispatcher {
    settings: DispatcherSettings,
    factories: FactoryChain,
    base_url: Option<Url>,
    request_timeout: Option<Duration>,
}

impl Dispatcher {
    /// Create a dispatcher using the transports named in `settings`.
    pub fn new(settings: DispatcherSettings) -> DispatchResult<Self> {
        let factories = FactoryChain::from_settings(&settings);
        Self::with_factories(settings, factories)
    }

    /// Create a dispatcher with an explicit factory chain.
    pub fn with_factories(settings: DispatcherSettings, factories: FactoryChain) -> DispatchResult<Self> {
        let base_url = settings
            .base_url
            .as_deref()
            .map(|base| {
                Url::parse(base).map_err(|e| DispatchError::InvalidUrl {
                    url: base.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;
        let request_timeout = settings.http.request_timeout_secs.map(Duration::from_secs);

        tracing::debug!(
            transports = ?factories.names(),
            base_url = ?settings.base_url,
            "Dispatcher created"
        );

        Ok(Self {
            settings,
            factories,
            base_url,
            request_timeout,
        })
    }

    pub fn settings(&self) -> &DispatcherSettings {
        &self.settings
    }

    pub fn factories(&self) -> &FactoryChain {
        &self.factories
    }

    /// Dispatch from a loosely-typed JSON options object.
    pub async fn dispatch_value(&self, options: Value) -> DispatchResult<DispatchHandle> {
        self.dispatch(RequestConfig::from_value(options)?).await
    }

    /// Configure and send one request.
    ///
    /// Precondition failures are returned before anything is sent. For
    /// asynchronous requests the returned handle resolves later; for
    /// synchronous ones the request has completed, and its callback has run,
    /// by the time this returns.
    pub async fn dispatch(&self, config: RequestConfig) -> DispatchResult<DispatchHandle> {
        let id = Uuid::new_v4();
        config.validate()?;

        let method_name = config.normalized_method();
        let method = Method::from_bytes(method_name.as_bytes())
            .map_err(|_| DispatchError::InvalidMethod(method_name.clone()))?;
        let content_type = config
            .content_type
            .clone()
            .unwrap_or_else(|| self.settings.default_content_type.clone());
        let prepared = prepare(&method_name, &config.url, config.data.as_ref(), &content_type)?;
        let url = self.resolve(&prepared.target)?;

        let mut transport = self.factories.acquire().inspect_err(|e| {
            metrics::record_transport_unavailable();
            tracing::error!(error = %e, "No transport available");
        })?;

        let RequestConfig {
            asynchronous,
            username,
            password,
            with_credentials,
            headers,
            data_type,
            success,
            error,
            data,
            ..
        } = config;

        transport.open(OpenRequest {
            method,
            url: url.clone(),
            is_async: asynchronous,
            username,
            password,
        })?;
        transport.set_with_credentials(with_credentials);
        transport.set_request_header("Content-Type", &prepared.content_type)?;
        if asynchronous {
            let response_type = ResponseType::from_data_type(data_type.as_deref().unwrap_or_default());
            transport.set_response_type(response_type)?;
        }
        if !transport.override_mime_type(RESPONSE_MIME_OVERRIDE) {
            tracing::trace!(transport = transport.name(), "MIME override not supported");
        }
        for (name, value) in &headers {
            transport.set_request_header(name, value)?;
        }

        let span = tracing::info_span!(
            "dispatch",
            id = %id,
            method = %method_name,
            url = %url,
            transport = transport.name(),
            data = data.as_ref().map(|data| data.kind()),
        );
        let in_flight = InFlight {
            transport,
            body: prepared.body,
            method: method_name,
            timeout: self.request_timeout,
            completion: Completion {
                data_type,
                success,
                error,
            },
        };

        if asynchronous {
            let (tx, rx) = oneshot::channel();
            tokio::spawn(
                async move {
                    // Receiver may be gone; callbacks already ran.
                    let _ = tx.send(in_flight.run().await);
                }
                .instrument(span),
            );
            Ok(DispatchHandle::pending(id, rx))
        } else {
            let result = in_flight.run().instrument(span).await;
            Ok(DispatchHandle::ready(id, result))
        }
    }

    fn resolve(&self, target: &str) -> DispatchResult<Url> {
        let invalid = |reason: String| DispatchError::InvalidUrl {
            url: target.to_string(),
            reason,
        };
        match Url::parse(target) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base.join(target).map_err(|e| invalid(e.to_string())),
                None => Err(invalid("relative url without a base url".to_string())),
            },
            Err(e) => Err(invalid(e.to_string())),
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        let settings = DispatcherSettings::default();
        Self {
            factories: FactoryChain::from_settings(&settings),
            base_url: None,
            request_timeout: None,
            settings,
        }
    }
}

/// Dispatch `options` through a process-wide dispatcher with default settings.
pub async fn ajax(options: Value) -> DispatchResult<DispatchHandle> {
    static SHARED: OnceLock<Dispatcher> = OnceLock::new();
    SHARED.get_or_init(Dispatcher::default).dispatch_value(options).await
}

/// A configured transport waiting to be sent.
struct InFlight {
    transport: Box<dyn Transport>,
    body: Option<Bytes>,
    method: String,
    timeout: Option<Duration>,
    completion: Completion,
}

impl InFlight {
    async fn run(mut self) -> DispatchResult<Outcome> {
        let start = Instant::now();

        let sent = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.transport.send(self.body)).await {
                Ok(sent) => sent.map_err(DispatchError::from),
                Err(_) => Err(DispatchError::Timeout(limit)),
            },
            None => self.transport.send(self.body).await.map_err(DispatchError::from),
        };

        let result = match sent {
            Ok(()) => self.completion.complete(self.transport.as_mut()),
            Err(e) => Err(e),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(Outcome::Success(_)) => {
                tracing::debug!(status = self.transport.status(), elapsed_ms, "Request completed");
                metrics::record_dispatch(&self.method, metrics::OUTCOME_SUCCESS, start);
            }
            Ok(Outcome::Failed { status, status_text }) => {
                tracing::info!(status, status_text = %status_text, elapsed_ms, "Request failed with error status");
                metrics::record_dispatch(&self.method, metrics::OUTCOME_HTTP_ERROR, start);
            }
            Err(e) => {
                tracing::warn!(error = %e, elapsed_ms, "Request did not complete");
                metrics::record_dispatch(&self.method, metrics::OUTCOME_FAILED, start);
            }
        }

        result
    }
}
