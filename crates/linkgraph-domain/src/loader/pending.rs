//! Key collection and pending load handles.
//!
//! Every distinct key gets one broadcast channel when it is first registered.
//! Later registrations of the same key, whether it is still queued or already
//! in flight, subscribe to that channel, so the key is fetched once and every
//! caller receives the same outcome.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::IntoFuture;
use std::hash::Hash;
use std::mem;

use futures::future::BoxFuture;
use tokio::sync::broadcast;

use crate::error::{DomainError, DomainResult};

type Outcome<V> = DomainResult<V>;

/// Keys registered during the current collect phase plus the waiters of
/// every key that has not been delivered yet.
#[derive(Debug)]
pub(crate) struct KeyCollector<K, V> {
    /// Distinct keys awaiting dispatch, in first-registration order.
    queued: Vec<K>,
    /// One sender per queued or in-flight key.
    waiting: HashMap<K, broadcast::Sender<Outcome<V>>>,
}

impl<K, V> KeyCollector<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            queued: Vec::new(),
            waiting: HashMap::new(),
        }
    }

    /// Registers interest in `key`. Never touches storage.
    pub(crate) fn register(&mut self, key: K) -> broadcast::Receiver<Outcome<V>> {
        match self.waiting.entry(key) {
            Entry::Occupied(entry) => entry.get().subscribe(),
            Entry::Vacant(entry) => {
                let (tx, rx) = broadcast::channel(1);
                self.queued.push(entry.key().clone());
                entry.insert(tx);
                rx
            }
        }
    }

    /// Takes every queued key, leaving their waiters registered as in flight.
    pub(crate) fn take_batch(&mut self) -> Vec<K> {
        mem::take(&mut self.queued)
    }

    /// Removes a key's sender so its outcome can be broadcast.
    pub(crate) fn complete(&mut self, key: &K) -> Option<broadcast::Sender<Outcome<V>>> {
        self.waiting.remove(key)
    }

    pub(crate) fn queued_len(&self) -> usize {
        self.queued.len()
    }

    pub(crate) fn in_flight_len(&self) -> usize {
        self.waiting.len() - self.queued.len()
    }
}

enum PendingState<V> {
    Ready(Outcome<V>),
    Waiting(broadcast::Receiver<Outcome<V>>),
}

/// Handle for one registered key.
///
/// Awaiting the handle yields the key's value once its batch has been
/// dispatched. A handle created from a cache hit is already resolved.
pub struct PendingLoad<V> {
    loader: &'static str,
    state: PendingState<V>,
}

impl<V> PendingLoad<V>
where
    V: Clone + Send + 'static,
{
    pub(crate) fn ready(loader: &'static str, outcome: Outcome<V>) -> Self {
        Self {
            loader,
            state: PendingState::Ready(outcome),
        }
    }

    pub(crate) fn waiting(loader: &'static str, receiver: broadcast::Receiver<Outcome<V>>) -> Self {
        Self {
            loader,
            state: PendingState::Waiting(receiver),
        }
    }

    /// True if the value is available without a dispatch.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, PendingState::Ready(_))
    }

    /// Waits for the key's value.
    ///
    /// Returns [`DomainError::LoadCancelled`] if the key's batch was dropped
    /// without delivering an outcome.
    pub async fn wait(self) -> DomainResult<V> {
        match self.state {
            PendingState::Ready(outcome) => outcome,
            PendingState::Waiting(mut receiver) => match receiver.recv().await {
                Ok(outcome) => outcome,
                Err(_) => Err(DomainError::LoadCancelled {
                    loader: self.loader,
                }),
            },
        }
    }
}

impl<V> IntoFuture for PendingLoad<V>
where
    V: Clone + Send + 'static,
{
    type Output = DomainResult<V>;
    type IntoFuture = BoxFuture<'static, DomainResult<V>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}

impl<V> std::fmt::Debug for PendingLoad<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingLoad")
            .field("loader", &self.loader)
            .field("ready", &matches!(self.state, PendingState::Ready(_)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_deduplicates_keys_in_order() {
        let mut collector: KeyCollector<u64, u64> = KeyCollector::new();
        let _a = collector.register(3);
        let _b = collector.register(1);
        let _c = collector.register(3);
        let _d = collector.register(2);

        assert_eq!(collector.queued_len(), 3);
        assert_eq!(collector.take_batch(), vec![3, 1, 2]);
        assert_eq!(collector.queued_len(), 0);
        assert_eq!(collector.in_flight_len(), 3);
    }

    #[test]
    fn test_in_flight_key_is_joined_not_requeued() {
        let mut collector: KeyCollector<u64, u64> = KeyCollector::new();
        let _a = collector.register(7);
        let batch = collector.take_batch();
        assert_eq!(batch, vec![7]);

        let _b = collector.register(7);
        assert_eq!(collector.queued_len(), 0);
        assert_eq!(collector.in_flight_len(), 1);
    }

    #[tokio::test]
    async fn test_every_waiter_receives_the_outcome() {
        let mut collector: KeyCollector<u64, String> = KeyCollector::new();
        let first = PendingLoad::waiting("test", collector.register(1));
        let second = PendingLoad::waiting("test", collector.register(1));

        collector.take_batch();
        let tx = collector.complete(&1).unwrap();
        tx.send(Ok("alice".to_string())).unwrap();

        assert_eq!(first.await.unwrap(), "alice");
        assert_eq!(second.await.unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_dropped_sender_cancels_waiter() {
        let mut collector: KeyCollector<u64, u64> = KeyCollector::new();
        let pending = PendingLoad::waiting("users", collector.register(1));
        drop(collector);

        let err = pending.await.unwrap_err();
        assert!(matches!(err, DomainError::LoadCancelled { loader: "users" }));
    }

    #[tokio::test]
    async fn test_ready_handle_resolves_immediately() {
        let pending = PendingLoad::ready("users", Ok(5u64));
        assert!(pending.is_ready());
        assert_eq!(pending.await.unwrap(), 5);
    }
}
