//! Fixed capacity single-producer / single-consumer event ring.
//!
//! The poll loop owns the [`EventProducer`], the bus interrupt owns the
//! [`EventConsumer`]. Neither side takes a lock: the ring sits on
//! [`heapless::spsc::Queue`], where each end only stores its own index after
//! it is done with the slot, using plain atomic loads and stores.
//!
//! `N` counts slots. One is always kept free, so the ring holds `N - 1`
//! events.

use heapless::spsc::{Consumer, Producer, Queue};

use crate::event::KeyboardEvent;

pub struct EventRing<const N: usize> {
    queue: Queue<KeyboardEvent, N>,
}

impl<const N: usize> Default for EventRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EventRing<N> {
    pub const fn new() -> Self {
        Self {
            queue: Queue::new(),
        }
    }

    pub const fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Split into the two ends. Borrowing mutably guarantees there is only
    /// ever one of each.
    pub fn split(&mut self) -> (EventProducer<'_, N>, EventConsumer<'_, N>) {
        let (producer, consumer) = self.queue.split();
        (EventProducer { producer }, EventConsumer { consumer })
    }
}

/// Push end, owned by the poll loop
pub struct EventProducer<'a, const N: usize> {
    producer: Producer<'a, KeyboardEvent, N>,
}

impl<const N: usize> EventProducer<'_, N> {
    /// Queue an event, handing it back when the ring is full
    pub fn push(&mut self, event: KeyboardEvent) -> Result<(), KeyboardEvent> {
        self.producer.enqueue(event)
    }

    pub fn len(&self) -> usize {
        self.producer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        !self.producer.ready()
    }

    pub fn capacity(&self) -> usize {
        self.producer.capacity()
    }
}

/// Pop end, owned by the bus interrupt
pub struct EventConsumer<'a, const N: usize> {
    consumer: Consumer<'a, KeyboardEvent, N>,
}

impl<const N: usize> EventConsumer<'_, N> {
    pub fn pop(&mut self) -> Option<KeyboardEvent> {
        self.consumer.dequeue()
    }

    /// Next event without consuming it
    pub fn peek(&self) -> Option<KeyboardEvent> {
        self.consumer.peek().copied()
    }

    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.consumer.ready()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.consumer.capacity()
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FIFO_CAPACITY, RING_SLOTS};
    use crate::event::EventType;

    fn key_down(code: u8) -> KeyboardEvent {
        KeyboardEvent {
            kind: EventType::KeyDown,
            code,
            mod_mask: 0,
            timestamp_low: 0,
        }
    }

    #[test]
    fn one_slot_stays_free() {
        let ring: EventRing<RING_SLOTS> = EventRing::new();
        assert_eq!(ring.capacity(), FIFO_CAPACITY);
    }

    #[test]
    fn fifo_order() {
        let mut ring: EventRing<8> = EventRing::new();
        let (mut producer, mut consumer) = ring.split();

        for code in 4..7 {
            producer.push(key_down(code)).unwrap();
        }
        assert_eq!(consumer.len(), 3);
        assert_eq!(consumer.peek(), Some(key_down(4)));
        assert_eq!(consumer.pop(), Some(key_down(4)));
        assert_eq!(consumer.pop(), Some(key_down(5)));
        assert_eq!(consumer.pop(), Some(key_down(6)));
        assert_eq!(consumer.pop(), None);
        assert!(producer.is_empty());
    }

    #[test]
    fn push_fails_when_full() {
        let mut ring: EventRing<5> = EventRing::new();
        let (mut producer, mut consumer) = ring.split();

        for code in 0..4 {
            assert!(producer.push(key_down(code)).is_ok());
        }
        assert!(producer.is_full());
        assert_eq!(producer.push(key_down(9)), Err(key_down(9)));
        assert_eq!(consumer.len(), 4);

        // one slot frees up, the next push lands behind the old ones
        assert_eq!(consumer.pop(), Some(key_down(0)));
        assert!(!consumer.is_full());
        producer.push(key_down(10)).unwrap();
        let drained: Vec<u8> = core::iter::from_fn(|| consumer.pop()).map(|e| e.code).collect();
        assert_eq!(drained, vec![1, 2, 3, 10]);
    }

    #[test]
    fn indices_wrap() {
        let mut ring: EventRing<4> = EventRing::new();
        let (mut producer, mut consumer) = ring.split();

        for round in 0..100u8 {
            producer.push(key_down(round)).unwrap();
            producer.push(key_down(round.wrapping_add(1))).unwrap();
            assert_eq!(consumer.pop().map(|e| e.code), Some(round));
            assert_eq!(consumer.pop().map(|e| e.code), Some(round.wrapping_add(1)));
            assert!(consumer.is_empty());
        }
    }

    #[test]
    fn concurrent_producer_and_consumer() {
        let mut ring: EventRing<64> = EventRing::new();
        let (mut producer, mut consumer) = ring.split();
        const TOTAL: usize = 20_000;

        std::thread::scope(|s| {
            s.spawn(move || {
                let mut sent = 0usize;
                while sent < TOTAL {
                    if producer.push(key_down(sent as u8)).is_ok() {
                        sent += 1;
                    }
                }
            });
            s.spawn(move || {
                let mut received = 0usize;
                while received < TOTAL {
                    if let Some(event) = consumer.pop() {
                        assert_eq!(event.code, received as u8);
                        received += 1;
                    }
                }
            });
        });
    }
}
