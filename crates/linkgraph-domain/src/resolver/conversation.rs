//! Conversation loader keyed by a pair of users.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use linkgraph_storage::{fetch_records_by_filter, DataStore, DisjunctiveFilter, Field, Message, RecordId};

use super::filters::pair_both_orientations;
use crate::error::DomainResult;
use crate::loader::BatchFn;

/// Two users whose conversation is requested.
///
/// The order of the ids does not change which messages belong to the
/// conversation: `(5, 6)` and `(6, 5)` resolve to the same thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserPair {
    pub first: RecordId,
    pub second: RecordId,
}

impl UserPair {
    pub fn new(first: RecordId, second: RecordId) -> Self {
        Self { first, second }
    }

    /// The pair with the smaller id first.
    pub fn unordered(&self) -> (RecordId, RecordId) {
        if self.first <= self.second {
            (self.first, self.second)
        } else {
            (self.second, self.first)
        }
    }
}

/// All messages exchanged between each pair, oldest first.
///
/// Messages with equal timestamps keep the order storage returned them in.
pub struct ConversationByPair<S> {
    store: Arc<S>,
}

impl<S: DataStore> ConversationByPair<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: DataStore> BatchFn for ConversationByPair<S> {
    type Key = UserPair;
    type Value = Vec<Message>;

    fn name(&self) -> &'static str {
        "conversation_by_pair"
    }

    async fn load(&self, keys: &[UserPair]) -> DomainResult<Vec<Vec<Message>>> {
        let pairs: BTreeSet<(RecordId, RecordId)> = keys.iter().map(UserPair::unordered).collect();
        let filter = pairs.iter().fold(DisjunctiveFilter::new(), |filter, &(a, b)| {
            pair_both_orientations(filter, Field::SenderId, Field::ReceiverId, a, b)
        });

        let messages: Vec<Message> =
            fetch_records_by_filter(self.store.as_ref(), &filter).await?;

        let mut threads: HashMap<(RecordId, RecordId), Vec<Message>> = HashMap::new();
        for message in messages {
            let key = UserPair::new(message.sender_id, message.receiver_id).unordered();
            threads.entry(key).or_default().push(message);
        }
        for thread in threads.values_mut() {
            // Stable: ties keep storage order
            thread.sort_by_key(|m| m.created_at);
        }

        Ok(keys
            .iter()
            .map(|pair| threads.get(&pair.unordered()).cloned().unwrap_or_default())
            .collect())
    }
}
