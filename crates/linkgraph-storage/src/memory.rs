//! In-memory storage implementation.
//!
//! Records live in one `BTreeMap<RecordId, StoredRecord>` per entity kind, so
//! reads come back in ascending id order and ids are handed out from a
//! per-kind counter starting at 1.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::instrument;

use crate::error::{StorageError, StorageResult};
use crate::filter::DisjunctiveFilter;
use crate::records::{
    Comment, Connection, EntityKind, Like, Message, NewRecord, Post, RecordId, StoredRecord, User,
};
use crate::traits::{record_references, validate_new_record, DataStore};

/// Records of one entity kind plus its id counter.
#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<RecordId, StoredRecord>,
    last_id: RecordId,
}

/// In-memory implementation of DataStore.
///
/// # Performance Characteristics
///
/// - **Insert**: O(log N) (BTreeMap insert) plus one lookup per reference
/// - **Fetch by ids**: O(K log N) for K requested ids
/// - **Fetch by filter**: O(N) linear scan of the kind's table
///
/// Uses DashMap so concurrent passes can read while mutations write.
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    tables: DashMap<EntityKind, Table>,
}

impl MemoryDataStore {
    /// Creates a new in-memory data store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory data store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of records stored for `kind`.
    pub fn len(&self, kind: EntityKind) -> usize {
        self.tables.get(&kind).map_or(0, |t| t.rows.len())
    }

    /// Returns true if no record of any kind is stored.
    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(|t| t.rows.is_empty())
    }

    fn contains(&self, kind: EntityKind, id: RecordId) -> bool {
        self.tables
            .get(&kind)
            .map_or(false, |t| t.rows.contains_key(&id))
    }
}

#[async_trait]
impl DataStore for MemoryDataStore {
    #[instrument(skip(self, ids), fields(kind = %kind, requested = ids.len()))]
    async fn fetch_by_ids(
        &self,
        kind: EntityKind,
        ids: &[RecordId],
    ) -> StorageResult<Vec<StoredRecord>> {
        let Some(table) = self.tables.get(&kind) else {
            return Ok(Vec::new());
        };

        // Deduplicate so repeated ids do not return repeated rows
        let mut seen = HashSet::with_capacity(ids.len());
        Ok(ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| table.rows.get(id).cloned())
            .collect())
    }

    #[instrument(skip(self, filter), fields(kind = %kind, clauses = filter.clauses.len()))]
    async fn fetch_by_filter(
        &self,
        kind: EntityKind,
        filter: &DisjunctiveFilter,
    ) -> StorageResult<Vec<StoredRecord>> {
        if filter.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .tables
            .get(&kind)
            .map(|table| {
                table
                    .rows
                    .values()
                    .filter(|r| filter.matches(r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    #[instrument(skip(self), fields(kind = %kind))]
    async fn fetch_all(&self, kind: EntityKind) -> StorageResult<Vec<StoredRecord>> {
        Ok(self
            .tables
            .get(&kind)
            .map(|table| table.rows.values().cloned().collect())
            .unwrap_or_default())
    }

    #[instrument(skip(self, record), fields(kind = %record.kind()))]
    async fn insert(&self, record: NewRecord) -> StorageResult<StoredRecord> {
        validate_new_record(&record)?;

        // Check references before taking the write guard: a DashMap write guard
        // on this kind's shard must not be held while reading other kinds.
        for (kind, id) in record_references(&record) {
            if !self.contains(kind, id) {
                return Err(StorageError::RecordNotFound { kind, id });
            }
        }

        let now = Utc::now();
        let kind = record.kind();
        let mut table = self.tables.entry(kind).or_default();
        let id = table.last_id + 1;

        let stored = match record {
            NewRecord::User(u) => StoredRecord::User(User {
                id,
                first_name: u.first_name,
                last_name: u.last_name,
                email: u.email,
            }),
            NewRecord::Connection(c) => StoredRecord::Connection(Connection {
                id,
                user1_id: c.user1_id,
                user2_id: c.user2_id,
            }),
            NewRecord::Post(p) => StoredRecord::Post(Post {
                id,
                content: p.content,
                created_at: p.created_at.unwrap_or(now),
                author_id: p.author_id,
            }),
            NewRecord::Comment(c) => StoredRecord::Comment(Comment {
                id,
                content: c.content,
                created_at: c.created_at.unwrap_or(now),
                post_id: c.post_id,
                author_id: c.author_id,
            }),
            NewRecord::Like(l) => StoredRecord::Like(Like {
                id,
                user_id: l.user_id,
                post_id: l.post_id,
            }),
            NewRecord::Message(m) => StoredRecord::Message(Message {
                id,
                content: m.content,
                created_at: m.created_at.unwrap_or(now),
                sender_id: m.sender_id,
                receiver_id: m.receiver_id,
            }),
        };

        table.last_id = id;
        table.rows.insert(id, stored.clone());

        Ok(stored)
    }
}
