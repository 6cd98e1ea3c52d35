use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use parking_lot::RwLock;
/// Event bus for pub/sub messaging
///
/// Lets consumers on other threads follow the engine. Publishing never
/// blocks the engine thread.
use std::sync::Arc;

use super::events::EngineEvent;

/// Subscriber ID for tracking subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(usize);

struct Subscriber {
    id: SubscriberId,
    sender: Sender<EngineEvent>,
}

/// Event bus for broadcasting events to subscribers
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
    next_id: Arc<RwLock<usize>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(RwLock::new(0)),
        }
    }

    /// Subscribe to events, returns a receiver and subscription ID
    pub fn subscribe(&self) -> (Receiver<EngineEvent>, SubscriberId) {
        let (tx, rx) = unbounded();
        (rx, self.add(tx))
    }

    /// Subscribe with a bounded queue; events are dropped for this
    /// subscriber while its queue is full
    pub fn subscribe_bounded(&self, capacity: usize) -> (Receiver<EngineEvent>, SubscriberId) {
        let (tx, rx) = bounded(capacity);
        (rx, self.add(tx))
    }

    fn add(&self, sender: Sender<EngineEvent>) -> SubscriberId {
        let mut next_id = self.next_id.write();
        let id = SubscriberId(*next_id);
        *next_id += 1;
        drop(next_id);

        self.subscribers.write().push(Subscriber { id, sender });
        id
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.write().retain(|s| s.id != id);
    }

    /// Publish an event to all subscribers
    ///
    /// Returns how many subscribers accepted it. Subscribers whose receiver
    /// was dropped are removed.
    pub fn publish(&self, event: EngineEvent) -> usize {
        let mut delivered = 0;
        let mut disconnected = Vec::new();

        for subscriber in self.subscribers.read().iter() {
            match subscriber.sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::debug!("Subscriber {:?} is full, dropping event", subscriber.id);
                }
                Err(TrySendError::Disconnected(_)) => disconnected.push(subscriber.id),
            }
        }

        if !disconnected.is_empty() {
            self.subscribers
                .write()
                .retain(|s| !disconnected.contains(&s.id));
        }

        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn clear(&self) {
        self.subscribers.write().clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
