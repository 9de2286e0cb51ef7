//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DispatcherSettings (validated, immutable)
//!     → owned by the Dispatcher for its lifetime
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once loaded
//! - All fields have defaults to allow minimal files
//! - Validation separates syntactic (serde) from semantic checks
//! - Per-request options live in `request::options`, not here

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_settings, parse_settings, ConfigError};
pub use schema::DispatcherSettings;
pub use schema::HttpSettings;
pub use schema::{LogFormat, ObservabilityConfig, TransportKind};
pub use validation::{validate_settings, ValidationError};
