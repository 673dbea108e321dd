//! Observable value container used as the reactive state primitive.
//!
//! A [`Signal`] wraps a value in a watch channel: readers take cheap
//! snapshots with [`Signal::get`], writers replace or modify the value in
//! place, and consumers that want change notifications subscribe for a
//! receiver. Writes are last-wins; there is no cancellation of whatever
//! computation produced the value being written.

use std::fmt;
use tokio::sync::watch;

/// An observable mutable value with get/set access.
///
/// Cloning the signal is not supported; share it by reference from its
/// owner and hand out receivers via [`Signal::subscribe`].
pub struct Signal<T> {
    tx: watch::Sender<T>,
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal").finish_non_exhaustive()
    }
}

impl<T: Clone> Signal<T> {
    /// Creates a new signal holding `initial`.
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Returns a snapshot of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Replaces the current value and notifies subscribers.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Modifies the current value in place and notifies subscribers.
    pub fn update<F: FnOnce(&mut T)>(&self, f: F) {
        self.tx.send_modify(f);
    }

    /// Returns a receiver that observes every subsequent write.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone + Default> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_snapshot() {
        let signal = Signal::new(7);
        let before = signal.get();
        signal.set(8);
        assert_eq!(before, 7);
        assert_eq!(signal.get(), 8);
    }

    #[test]
    fn test_update_modifies_in_place() {
        let signal = Signal::new(vec![1, 2]);
        signal.update(|v| v.push(3));
        assert_eq!(signal.get(), vec![1, 2, 3]);
    }

    #[test]
    fn test_subscribe_sees_writes() {
        let signal = Signal::new(0);
        let rx = signal.subscribe();
        assert!(!rx.has_changed().unwrap());

        signal.set(1);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let signal = Signal::new("first".to_string());
        signal.set("second".to_string());
        signal.set("third".to_string());
        assert_eq!(signal.get(), "third");
    }
}
