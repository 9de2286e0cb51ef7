//! Small HTTP request helper.
//!
//! Describe a request with [`RequestConfig`], hand it to a [`Dispatcher`], and
//! receive the result through callbacks or by awaiting the returned
//! [`DispatchHandle`]. Transports are obtained from an ordered
//! [`FactoryChain`]: the first factory that can produce one wins.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod observability;
pub mod request;
pub mod transport;

pub use config::DispatcherSettings;
pub use dispatch::{ajax, DispatchHandle, Dispatcher, Outcome};
pub use error::{DispatchError, DispatchResult, TransportError};
pub use request::{RequestConfig, RequestData, ResponseType, ResponseValue};
pub use transport::{FactoryChain, ReadyState, Transport, TransportFactory};
