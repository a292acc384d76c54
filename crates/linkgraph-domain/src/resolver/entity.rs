//! Entity-by-id and one-to-many loaders.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use linkgraph_storage::{
    fetch_records_by_filter, fetch_records_by_ids, Condition, DataStore, DisjunctiveFilter,
    EntityKind, Field, Record, RecordId,
};

use crate::error::DomainResult;
use crate::loader::BatchFn;

/// Direct single-entity lookup: one set-membership fetch per batch.
///
/// Ids with no record resolve to `None`.
pub struct EntityById<R, S> {
    store: Arc<S>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record, S: DataStore> EntityById<R, S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Record, S: DataStore> BatchFn for EntityById<R, S> {
    type Key = RecordId;
    type Value = Option<R>;

    fn name(&self) -> &'static str {
        match R::KIND {
            EntityKind::User => "user_by_id",
            EntityKind::Connection => "connection_by_id",
            EntityKind::Post => "post_by_id",
            EntityKind::Comment => "comment_by_id",
            EntityKind::Like => "like_by_id",
            EntityKind::Message => "message_by_id",
        }
    }

    async fn load(&self, keys: &[RecordId]) -> DomainResult<Vec<Option<R>>> {
        let records: Vec<R> = fetch_records_by_ids(self.store.as_ref(), keys).await?;
        let by_id: HashMap<RecordId, R> = records.into_iter().map(|r| (r.id(), r)).collect();

        Ok(keys.iter().map(|id| by_id.get(id).cloned()).collect())
    }
}

/// One-to-many lookup by a foreign key column.
///
/// Each key resolves to every record whose `field` equals it, in storage
/// order; keys with no match resolve to an empty list.
pub struct EntitiesByForeignKey<R, S> {
    store: Arc<S>,
    field: Field,
    name: &'static str,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record, S: DataStore> EntitiesByForeignKey<R, S> {
    pub fn new(store: Arc<S>, field: Field, name: &'static str) -> Self {
        Self {
            store,
            field,
            name,
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Record, S: DataStore> BatchFn for EntitiesByForeignKey<R, S> {
    type Key = RecordId;
    type Value = Vec<R>;

    fn name(&self) -> &'static str {
        self.name
    }

    async fn load(&self, keys: &[RecordId]) -> DomainResult<Vec<Vec<R>>> {
        let filter =
            DisjunctiveFilter::new().or(Condition::in_set(self.field, keys.iter().copied()));
        let records: Vec<R> = fetch_records_by_filter(self.store.as_ref(), &filter).await?;

        let mut groups: HashMap<RecordId, Vec<R>> = HashMap::new();
        for record in records {
            if let Some(owner) = record.field(self.field) {
                groups.entry(owner).or_default().push(record);
            }
        }

        Ok(keys
            .iter()
            .map(|key| groups.get(key).cloned().unwrap_or_default())
            .collect())
    }
}
