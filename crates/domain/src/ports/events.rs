use std::time::Duration;

use thiserror::Error;

use crate::DomainResult;
use crate::ports::BoxFuture;
use crate::sync::IdentityEvent;

/// Outbound interest/history pipeline. Fire-and-forget: the caller never
/// fails an operation because a publish did not go through.
pub trait TagActivityPublisher: Send + Sync {
    fn publish(&self, poster_id: &str, tags: &[String]) -> BoxFuture<'_, DomainResult<()>>;
}

#[derive(Debug, Error)]
pub enum EventQueueError {
    #[error("event queue unavailable: {0}")]
    Unavailable(String),
    #[error("event serialization failed: {0}")]
    Serialization(String),
    #[error("event queue operation failed: {0}")]
    Operation(String),
}

/// Transport for inbound identity-change events. Delivery is
/// at-least-once; the handler side is idempotent to compensate.
pub trait IdentityEventQueue: Send + Sync {
    fn enqueue(&self, event: &IdentityEvent) -> BoxFuture<'_, Result<(), EventQueueError>>;

    fn dequeue(
        &self,
        timeout: Duration,
    ) -> BoxFuture<'_, Result<Option<IdentityEvent>, EventQueueError>>;
}
