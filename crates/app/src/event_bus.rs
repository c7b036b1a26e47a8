//! In-process event bus backed by a tokio broadcast channel, and the
//! per-entity subscriptions entities use to track each other.

use std::collections::HashSet;
use std::future::Future;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use mitmlight_domain::error::MitmLightError;
use mitmlight_domain::event::Event;

use crate::ports::{EventPublisher, EventSubscriber};

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped).
pub struct InProcessEventBus {
    sender: broadcast::Sender<Event>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }
}

impl EventSubscriber for InProcessEventBus {
    /// Returns a receiver that will get all events published *after*
    /// the subscription is created.
    fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), MitmLightError>> + Send {
        // broadcast::send fails only when there are zero receivers.
        let _ = self.sender.send(event);
        async { Ok(()) }
    }
}

/// Subscribe to state changes of the given entities.
pub fn track_state_change<S, I>(bus: &S, entity_ids: I) -> StateChangeSubscription
where
    S: EventSubscriber + ?Sized,
    I: IntoIterator,
    I::Item: Into<String>,
{
    StateChangeSubscription {
        entity_ids: entity_ids.into_iter().map(Into::into).collect(),
        receiver: bus.subscribe(),
    }
}

/// Events of a fixed set of entities, filtered out of the shared bus.
pub struct StateChangeSubscription {
    entity_ids: HashSet<String>,
    receiver: broadcast::Receiver<Event>,
}

impl StateChangeSubscription {
    #[must_use]
    pub fn tracks(&self, entity_id: &str) -> bool {
        self.entity_ids.contains(entity_id)
    }

    /// Next already-published matching event, without waiting.
    pub fn try_next(&mut self) -> Option<Event> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.tracks(&event.entity_id) => return Some(event),
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "state change subscription lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}
