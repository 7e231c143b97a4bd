//! Event bus shared by bitquiz components
//!
//! The bus is generic over the event type so each crate can define its own
//! event enum while sharing the distribution mechanics.

use tokio::sync::broadcast;

/// Broadcast channel wrapper
///
/// Producers never block: a subscriber that falls more than `capacity`
/// events behind sees `RecvError::Lagged` and skips ahead. Dropped
/// receivers unsubscribe themselves.
///
/// # Examples
///
/// ```
/// use bitquiz_common::events::EventBus;
///
/// let bus: EventBus<String> = EventBus::new(16);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy("converted".to_string());
/// assert_eq!(rx.try_recv().unwrap(), "converted");
/// ```
#[derive(Debug)]
pub struct EventBus<E> {
    tx: broadcast::Sender<E>,
    capacity: usize,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            capacity: self.capacity,
        }
    }
}

impl<E: Clone> EventBus<E> {
    /// Bus buffering up to `capacity` events per subscriber (at least one)
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            capacity: capacity.max(1),
        }
    }

    /// Receiver for events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.tx.subscribe()
    }

    /// Publish `event`, returning how many receivers got it
    ///
    /// Fails (handing the event back) when nobody is subscribed.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: E) -> Result<usize, broadcast::error::SendError<E>> {
        self.tx.send(event)
    }

    /// Publish `event` whether or not anyone listens
    pub fn emit_lossy(&self, event: E) {
        let _ = self.tx.send(event);
    }

    /// Live receivers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
