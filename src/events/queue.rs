// Event queues - Lock-free hand-off of events to another thread
// A UI or render thread drains the consumer at its own pace

use super::ConductorEvent;
use ringbuf::{HeapRb, traits::Split};

pub type EventProducer = ringbuf::HeapProd<ConductorEvent>;
pub type EventConsumer = ringbuf::HeapCons<ConductorEvent>;

pub fn create_event_queue(capacity: usize) -> (EventProducer, EventConsumer) {
    let rb = HeapRb::<ConductorEvent>::new(capacity.max(1));
    rb.split()
}
