//! Event bus ports: publish/subscribe for state-change events.

use std::future::Future;

use tokio::sync::broadcast;

use mitmlight_domain::error::MitmLightError;
use mitmlight_domain::event::Event;

/// Publishes events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), MitmLightError>> + Send;
}

/// Hands out receivers for every event published from now on.
pub trait EventSubscriber: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<Event>;
}
