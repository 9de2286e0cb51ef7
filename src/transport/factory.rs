//! Ordered transport factories.
//!
//! # Responsibilities
//! - Hold factories in preference order
//! - Hand out the first transport that can be constructed
//!
//! # Design Decisions
//! - Factory failures are logged and skipped, never surfaced individually
//! - A factory is asked again on every dispatch; nothing is cached here

use std::fmt;
use std::sync::Arc;

use crate::config::schema::{DispatcherSettings, TransportKind};
use crate::error::{DispatchError, DispatchResult, TransportError};
use crate::transport::legacy::LegacyFactory;
use crate::transport::modern::ModernFactory;
use crate::transport::Transport;

/// Creates transport objects.
pub trait TransportFactory: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn create(&self) -> Result<Box<dyn Transport>, TransportError>;
}

/// Factory backed by a closure.
struct FnFactory<F> {
    name: &'static str,
    create: F,
}

impl<F> fmt::Debug for FnFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFactory").field("name", &self.name).finish()
    }
}

impl<F> TransportFactory for FnFactory<F>
where
    F: Fn() -> Result<Box<dyn Transport>, TransportError> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn create(&self) -> Result<Box<dyn Transport>, TransportError> {
        (self.create)()
    }
}

/// Factories tried in order until one succeeds.
#[derive(Debug, Clone, Default)]
pub struct FactoryChain {
    factories: Vec<Arc<dyn TransportFactory>>,
}

impl FactoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the chain named by `settings.transports`.
    pub fn from_settings(settings: &DispatcherSettings) -> Self {
        let mut chain = Self::new();
        for kind in &settings.transports {
            match kind {
                TransportKind::Modern => chain.push(ModernFactory::new(&settings.http)),
                TransportKind::Legacy => chain.push(LegacyFactory::new(&settings.http)),
            }
        }
        chain
    }

    /// Append a factory with the lowest preference so far.
    pub fn push<T: TransportFactory + 'static>(&mut self, factory: T) {
        self.factories.push(Arc::new(factory));
    }

    /// Append a closure factory.
    pub fn push_fn<F>(&mut self, name: &'static str, create: F)
    where
        F: Fn() -> Result<Box<dyn Transport>, TransportError> + Send + Sync + 'static,
    {
        self.push(FnFactory { name, create });
    }

    pub fn with<T: TransportFactory + 'static>(mut self, factory: T) -> Self {
        self.push(factory);
        self
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Names in preference order.
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.iter().map(|factory| factory.name()).collect()
    }

    /// Return a transport from the first factory that produces one.
    pub fn acquire(&self) -> DispatchResult<Box<dyn Transport>> {
        for (i, factory) in self.factories.iter().enumerate() {
            match factory.create() {
                Ok(transport) => {
                    tracing::trace!(factory = factory.name(), index = i, "Transport acquired");
                    return Ok(transport);
                }
                Err(e) => {
                    tracing::debug!(factory = factory.name(), index = i, error = %e, "Transport factory failed, trying next");
                }
            }
        }
        Err(DispatchError::Unsupported {
            tried: self.factories.len(),
        })
    }
}
