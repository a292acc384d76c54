//! DataStore trait definition.

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};
use crate::filter::DisjunctiveFilter;
use crate::records::{EntityKind, NewRecord, Record, RecordId, StoredRecord};

/// Abstract storage interface for social graph records.
///
/// Implementations must be thread-safe (Send + Sync) and support
/// async operations. Reads make no promise about result order; callers that
/// need an order must impose it themselves.
#[async_trait]
pub trait DataStore: Send + Sync + 'static {
    /// Returns every record of `kind` whose id is in `ids`.
    ///
    /// Unknown ids are skipped, not reported.
    async fn fetch_by_ids(
        &self,
        kind: EntityKind,
        ids: &[RecordId],
    ) -> StorageResult<Vec<StoredRecord>>;

    /// Returns every record of `kind` matching any clause of `filter`.
    async fn fetch_by_filter(
        &self,
        kind: EntityKind,
        filter: &DisjunctiveFilter,
    ) -> StorageResult<Vec<StoredRecord>>;

    /// Returns every record of `kind`.
    async fn fetch_all(&self, kind: EntityKind) -> StorageResult<Vec<StoredRecord>>;

    /// Creates a single record. Storage assigns the id and, unless supplied,
    /// the creation timestamp.
    async fn insert(&self, record: NewRecord) -> StorageResult<StoredRecord>;
}

/// Fetches records by id and converts them to `R`.
pub async fn fetch_records_by_ids<R, S>(store: &S, ids: &[RecordId]) -> StorageResult<Vec<R>>
where
    R: Record,
    S: DataStore + ?Sized,
{
    store
        .fetch_by_ids(R::KIND, ids)
        .await?
        .into_iter()
        .map(R::from_stored)
        .collect()
}

/// Fetches records matching `filter` and converts them to `R`.
pub async fn fetch_records_by_filter<R, S>(
    store: &S,
    filter: &DisjunctiveFilter,
) -> StorageResult<Vec<R>>
where
    R: Record,
    S: DataStore + ?Sized,
{
    store
        .fetch_by_filter(R::KIND, filter)
        .await?
        .into_iter()
        .map(R::from_stored)
        .collect()
}

/// Fetches every record of type `R`.
pub async fn fetch_all_records<R, S>(store: &S) -> StorageResult<Vec<R>>
where
    R: Record,
    S: DataStore + ?Sized,
{
    store
        .fetch_all(R::KIND)
        .await?
        .into_iter()
        .map(R::from_stored)
        .collect()
}

/// Inserts a record and converts the stored result to `R`.
pub async fn insert_record<R, S>(store: &S, record: NewRecord) -> StorageResult<R>
where
    R: Record,
    S: DataStore + ?Sized,
{
    R::from_stored(store.insert(record).await?)
}

/// Validates that a required text field is not blank.
pub fn validate_text(field: &str, value: &str) -> StorageResult<()> {
    if value.trim().is_empty() {
        return Err(StorageError::InvalidInput {
            message: format!("{field} cannot be empty"),
        });
    }
    Ok(())
}

/// Validates the field-level shape of a create request.
///
/// Reference checks (does the author exist?) need storage access and are
/// left to the implementation.
pub fn validate_new_record(record: &NewRecord) -> StorageResult<()> {
    match record {
        NewRecord::User(user) => {
            validate_text("first_name", &user.first_name)?;
            validate_text("last_name", &user.last_name)?;
            validate_text("email", &user.email)?;
            if !user.email.contains('@') {
                return Err(StorageError::InvalidInput {
                    message: format!("email '{}' is not a valid address", user.email),
                });
            }
        }
        NewRecord::Connection(conn) => {
            if conn.user1_id == conn.user2_id {
                return Err(StorageError::InvalidInput {
                    message: format!("user {} cannot be connected to themselves", conn.user1_id),
                });
            }
        }
        NewRecord::Post(post) => validate_text("content", &post.content)?,
        NewRecord::Comment(comment) => validate_text("content", &comment.content)?,
        NewRecord::Message(message) => validate_text("content", &message.content)?,
        NewRecord::Like(_) => {}
    }
    Ok(())
}

/// Identifier references a create request depends on, as (kind, id) pairs.
pub fn record_references(record: &NewRecord) -> Vec<(EntityKind, RecordId)> {
    match record {
        NewRecord::User(_) => vec![],
        NewRecord::Connection(c) => vec![
            (EntityKind::User, c.user1_id),
            (EntityKind::User, c.user2_id),
        ],
        NewRecord::Post(p) => vec![(EntityKind::User, p.author_id)],
        NewRecord::Comment(c) => vec![(EntityKind::Post, c.post_id), (EntityKind::User, c.author_id)],
        NewRecord::Like(l) => vec![(EntityKind::User, l.user_id), (EntityKind::Post, l.post_id)],
        NewRecord::Message(m) => vec![
            (EntityKind::User, m.sender_id),
            (EntityKind::User, m.receiver_id),
        ],
    }
}
