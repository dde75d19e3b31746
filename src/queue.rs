use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};

/// Bounded single-producer/single-consumer queue where the producer never
/// waits on a slow consumer.
pub fn drop_queue<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    bounded(capacity)
}

/// Non-blocking put. On a full queue the new item is dropped and the queued
/// items stay untouched. Returns whether the item was accepted.
pub fn offer<T>(tx: &Sender<T>, item: T) -> bool {
    match tx.try_send(item) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            log::trace!("queue full, dropping newest item");
            false
        }
        Err(TrySendError::Disconnected(_)) => false,
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Poll<T> {
    Item(T),
    Empty,
    Disconnected,
}

/// Waits at most `timeout` for the next item.
pub fn poll<T>(rx: &Receiver<T>, timeout: Duration) -> Poll<T> {
    match rx.recv_timeout(timeout) {
        Ok(item) => Poll::Item(item),
        Err(RecvTimeoutError::Timeout) => Poll::Empty,
        Err(RecvTimeoutError::Disconnected) => Poll::Disconnected,
    }
}
