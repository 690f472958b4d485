// Communication channels lock-free
// One SPSC ring buffer per subscriber; the engine keeps the producers

use crate::messaging::notification::StateChange;
use crate::sequencer::note_queue::ScheduledNote;
use ringbuf::traits::{Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

pub type StateChangeConsumer = HeapCons<StateChange>;
pub type BeatConsumer = HeapCons<ScheduledNote>;

struct Subscriber<T> {
    tx: HeapProd<T>,
    overflowed: bool,
}

/// Fan-out of events to any number of ring-buffer subscribers
///
/// Publishing never blocks: if a subscriber's buffer is full the event is
/// dropped for that subscriber only (and a warning logged once).
pub struct Broadcaster<T> {
    name: &'static str,
    subscribers: Vec<Subscriber<T>>,
}

impl<T: Clone> Broadcaster<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            subscribers: Vec::new(),
        }
    }

    /// Register a new subscriber and return its receiving end
    pub fn subscribe(&mut self, capacity: usize) -> HeapCons<T> {
        let rb = HeapRb::<T>::new(capacity.max(1));
        let (tx, rx) = rb.split();
        self.subscribers.push(Subscriber {
            tx,
            overflowed: false,
        });
        rx
    }

    /// Deliver `event` to every subscriber, in publication order
    pub fn publish(&mut self, event: T) {
        for subscriber in &mut self.subscribers {
            match subscriber.tx.try_push(event.clone()) {
                Ok(()) => subscriber.overflowed = false,
                Err(_) => {
                    if !subscriber.overflowed {
                        log::warn!("{} subscriber is full, dropping events", self.name);
                        subscriber.overflowed = true;
                    }
                }
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<T> std::fmt::Debug for Broadcaster<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("name", &self.name)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
