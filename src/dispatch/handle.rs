//! Single-shot handle to a dispatch result.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use uuid::Uuid;

use crate::dispatch::completion::Outcome;
use crate::error::{DispatchError, DispatchResult};

#[derive(Debug)]
enum HandleState {
    /// Result arrives from the dispatch task.
    Pending(oneshot::Receiver<DispatchResult<Outcome>>),
    /// Synchronous dispatch, already finished. `None` once taken.
    Ready(Option<DispatchResult<Outcome>>),
}

/// Resolves once the request completed and its callback ran.
///
/// Dropping the handle does not cancel the request.
#[derive(Debug)]
pub struct DispatchHandle {
    id: Uuid,
    state: HandleState,
}

impl DispatchHandle {
    pub(crate) fn pending(id: Uuid, receiver: oneshot::Receiver<DispatchResult<Outcome>>) -> Self {
        Self {
            id,
            state: HandleState::Pending(receiver),
        }
    }

    pub(crate) fn ready(id: Uuid, result: DispatchResult<Outcome>) -> Self {
        Self {
            id,
            state: HandleState::Ready(Some(result)),
        }
    }

    /// Correlation id, also present on the dispatch log span.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// True when the dispatch ran synchronously and its result is held here.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, HandleState::Ready(Some(_)))
    }
}

impl Future for DispatchHandle {
    type Output = DispatchResult<Outcome>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.state {
            HandleState::Pending(receiver) => Pin::new(receiver)
                .poll(cx)
                .map(|received| received.unwrap_or_else(|_| Err(DispatchError::Aborted))),
            HandleState::Ready(result) => {
                Poll::Ready(result.take().unwrap_or(Err(DispatchError::Aborted)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::response::ResponseValue;

    #[tokio::test]
    async fn test_ready_handle() {
        let handle = DispatchHandle::ready(
            Uuid::new_v4(),
            Ok(Outcome::Success(ResponseValue::Text("hi".into()))),
        );
        assert!(handle.is_ready());
        let outcome = handle.await.unwrap();
        assert_eq!(outcome.value().and_then(ResponseValue::as_text), Some("hi"));
    }

    #[tokio::test]
    async fn test_dropped_sender_is_aborted() {
        let (tx, rx) = oneshot::channel();
        let handle = DispatchHandle::pending(Uuid::new_v4(), rx);
        assert!(!handle.is_ready());
        drop(tx);
        assert!(matches!(handle.await, Err(DispatchError::Aborted)));
    }
}
