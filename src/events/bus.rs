// Event bus - Synchronous publish/subscribe between conductor, container and listeners

use super::queue::{EventConsumer, EventProducer, create_event_queue};
use super::{ConductorEvent, EventKind};
use ringbuf::traits::{Observer, Producer};

/// Callback invoked for each matching event
pub type EventHandler = Box<dyn FnMut(&ConductorEvent)>;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    kind: Option<EventKind>,
    handler: EventHandler,
}

/// Delivers events to handlers in subscription order, then to queues
///
/// Handlers run synchronously inside [`EventBus::emit`]. They only receive a
/// shared reference to the event, so they cannot edit the schedule mid-tick.
#[derive(Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    queues: Vec<EventProducer>,
    next_id: u64,
    dropped: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&ConductorEvent) + 'static,
    {
        self.register(Some(kind), Box::new(handler))
    }

    /// Register a handler receiving every event
    pub fn subscribe_all<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&ConductorEvent) + 'static,
    {
        self.register(None, Box::new(handler))
    }

    fn register(&mut self, kind: Option<EventKind>, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription { id, kind, handler });
        id
    }

    /// Remove a handler. Returns false if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Open a queue receiving a copy of every event
    pub fn queue(&mut self, capacity: usize) -> EventConsumer {
        let (producer, consumer) = create_event_queue(capacity);
        self.queues.push(producer);
        consumer
    }

    /// Number of registered handlers
    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Number of open queues
    pub fn queue_count(&self) -> usize {
        self.queues.len()
    }

    /// Events that could not be pushed to a full queue
    pub fn dropped_events(&self) -> u64 {
        self.dropped
    }

    /// Deliver `event` to every matching handler and queue
    pub fn emit(&mut self, event: &ConductorEvent) {
        let kind = event.kind();
        for subscription in self.subscriptions.iter_mut() {
            if subscription.kind.is_none_or(|k| k == kind) {
                (subscription.handler)(event);
            }
        }

        // A queue whose consumer is gone has no reader left
        self.queues.retain(|queue| queue.read_is_held());
        for queue in self.queues.iter_mut() {
            if queue.try_push(event.clone()).is_err() {
                self.dropped += 1;
                log::warn!("Event queue full, dropping {}", kind);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::Consumer;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_subscribe_filters_by_kind() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        bus.subscribe(EventKind::StepChange, move |e| {
            sink.borrow_mut().push(e.name())
        });

        bus.emit(&ConductorEvent::BpmChange { bpm: 120, measure: 4 });
        bus.emit(&ConductorEvent::StepChange);

        assert_eq!(*seen.borrow(), vec!["stepChange"]);
    }

    #[test]
    fn test_subscribe_all_and_unsubscribe() {
        let mut bus = EventBus::new();
        let count = Rc::new(RefCell::new(0));

        let counter = Rc::clone(&count);
        let id = bus.subscribe_all(move |_| *counter.borrow_mut() += 1);
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit(&ConductorEvent::StepChange);
        bus.emit(&ConductorEvent::BpmChange { bpm: 1, measure: 1 });
        assert_eq!(*count.borrow(), 2);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&ConductorEvent::StepChange);
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_queue_receives_copies() {
        let mut bus = EventBus::new();
        let mut rx = bus.queue(2);

        bus.emit(&ConductorEvent::StepChange);
        bus.emit(&ConductorEvent::BpmChange { bpm: 90, measure: 3 });
        bus.emit(&ConductorEvent::StepChange);

        assert_eq!(bus.dropped_events(), 1);
        assert_eq!(rx.try_pop(), Some(ConductorEvent::StepChange));
        assert_eq!(
            rx.try_pop(),
            Some(ConductorEvent::BpmChange { bpm: 90, measure: 3 })
        );
        assert_eq!(rx.try_pop(), None);
    }

    #[test]
    fn test_dropped_consumer_releases_queue() {
        let mut bus = EventBus::new();
        let mut kept = bus.queue(8);
        let gone = bus.queue(1);
        drop(gone);

        for _ in 0..5 {
            bus.emit(&ConductorEvent::StepChange);
        }

        assert_eq!(bus.queue_count(), 1);
        assert_eq!(bus.dropped_events(), 0);
        assert_eq!(kept.try_pop(), Some(ConductorEvent::StepChange));
    }
}
