//! Request description subsystem.
//!
//! # Data Flow
//! ```text
//! caller options (typed builder or JSON value)
//!     → options.rs (shape checks, defaults, method normalization)
//!     → body.rs (query string / form / JSON body construction)
//!     → PreparedRequest handed to the dispatcher
//!
//! transport response
//!     → response.rs (response type, decoded value)
//! ```
//!
//! # Design Decisions
//! - Options are consumed by the call; nothing is persisted
//! - All shape errors are reported before a transport is acquired

pub mod body;
pub mod options;
pub mod response;

pub use body::{encode_component, parameterize, prepare, PreparedRequest};
pub use options::{ErrorCallback, RequestConfig, RequestData, SuccessCallback};
pub use response::{ResponseType, ResponseValue};
