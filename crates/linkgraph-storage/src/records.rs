//! Typed records of the social graph.
//!
//! The facade hands out [`StoredRecord`] values tagged with their
//! [`EntityKind`]. Callers convert them into the concrete record type through
//! the [`Record`] trait, which rejects a record of the wrong kind instead of
//! guessing at its shape.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// Identifier assigned by storage on creation. Unique within one entity kind.
pub type RecordId = u64;

/// The entity types known to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Connection,
    Post,
    Comment,
    Like,
    Message,
}

impl EntityKind {
    /// All entity kinds, in a stable order.
    pub const ALL: [EntityKind; 6] = [
        EntityKind::User,
        EntityKind::Connection,
        EntityKind::Post,
        EntityKind::Comment,
        EntityKind::Like,
        EntityKind::Message,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Connection => "connection",
            EntityKind::Post => "post",
            EntityKind::Comment => "comment",
            EntityKind::Like => "like",
            EntityKind::Message => "message",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier-valued columns that filters can match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    AuthorId,
    PostId,
    UserId,
    User1Id,
    User2Id,
    SenderId,
    ReceiverId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    /// Expected to be unique, not enforced by storage.
    pub email: String,
}

/// Undirected edge between two distinct users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: RecordId,
    pub user1_id: RecordId,
    pub user2_id: RecordId,
}

impl Connection {
    /// Returns the endpoint opposite to `user_id`, if `user_id` is an endpoint.
    pub fn other_endpoint(&self, user_id: RecordId) -> Option<RecordId> {
        if self.user1_id == user_id {
            Some(self.user2_id)
        } else if self.user2_id == user_id {
            Some(self.user1_id)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: RecordId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author_id: RecordId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: RecordId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub post_id: RecordId,
    pub author_id: RecordId,
}

/// A user liking a post. The same pair may appear more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub id: RecordId,
    pub user_id: RecordId,
    pub post_id: RecordId,
}

/// Directional message from `sender_id` to `receiver_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: RecordId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub sender_id: RecordId,
    pub receiver_id: RecordId,
}

/// A record as handed out by the storage facade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoredRecord {
    User(User),
    Connection(Connection),
    Post(Post),
    Comment(Comment),
    Like(Like),
    Message(Message),
}

impl StoredRecord {
    pub fn kind(&self) -> EntityKind {
        match self {
            StoredRecord::User(_) => EntityKind::User,
            StoredRecord::Connection(_) => EntityKind::Connection,
            StoredRecord::Post(_) => EntityKind::Post,
            StoredRecord::Comment(_) => EntityKind::Comment,
            StoredRecord::Like(_) => EntityKind::Like,
            StoredRecord::Message(_) => EntityKind::Message,
        }
    }

    pub fn id(&self) -> RecordId {
        match self {
            StoredRecord::User(r) => r.id,
            StoredRecord::Connection(r) => r.id,
            StoredRecord::Post(r) => r.id,
            StoredRecord::Comment(r) => r.id,
            StoredRecord::Like(r) => r.id,
            StoredRecord::Message(r) => r.id,
        }
    }

    /// Value of an identifier column, or `None` if this kind has no such column.
    pub fn field(&self, field: Field) -> Option<RecordId> {
        match self {
            StoredRecord::User(r) => r.field(field),
            StoredRecord::Connection(r) => r.field(field),
            StoredRecord::Post(r) => r.field(field),
            StoredRecord::Comment(r) => r.field(field),
            StoredRecord::Like(r) => r.field(field),
            StoredRecord::Message(r) => r.field(field),
        }
    }
}

/// Conversion between [`StoredRecord`] and a typed record.
pub trait Record: Clone + Send + Sync + 'static {
    /// The entity kind this record type represents.
    const KIND: EntityKind;

    fn id(&self) -> RecordId;

    /// Value of an identifier column, or `None` if this kind has no such column.
    fn field(&self, field: Field) -> Option<RecordId>;

    /// Converts a stored record, failing if it is of another kind.
    fn from_stored(record: StoredRecord) -> StorageResult<Self>;

    fn into_stored(self) -> StoredRecord;
}

macro_rules! impl_record {
    ($ty:ident, $kind:ident, { $($field:ident => $column:ident),* $(,)? }) => {
        impl Record for $ty {
            const KIND: EntityKind = EntityKind::$kind;

            fn id(&self) -> RecordId {
                self.id
            }

            fn field(&self, field: Field) -> Option<RecordId> {
                match field {
                    Field::Id => Some(self.id),
                    $(Field::$field => Some(self.$column),)*
                    _ => None,
                }
            }

            fn from_stored(record: StoredRecord) -> StorageResult<Self> {
                match record {
                    StoredRecord::$kind(r) => Ok(r),
                    other => Err(StorageError::RecordKindMismatch {
                        expected: EntityKind::$kind,
                        actual: other.kind(),
                    }),
                }
            }

            fn into_stored(self) -> StoredRecord {
                StoredRecord::$kind(self)
            }
        }
    };
}

impl_record!(User, User, {});
impl_record!(Connection, Connection, { User1Id => user1_id, User2Id => user2_id });
impl_record!(Post, Post, { AuthorId => author_id });
impl_record!(Comment, Comment, { PostId => post_id, AuthorId => author_id });
impl_record!(Like, Like, { UserId => user_id, PostId => post_id });
impl_record!(Message, Message, { SenderId => sender_id, ReceiverId => receiver_id });

/// Input for creating a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Input for creating a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConnection {
    pub user1_id: RecordId,
    pub user2_id: RecordId,
}

/// Input for creating a post. `created_at` defaults to the insert time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub author_id: RecordId,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input for creating a comment. `created_at` defaults to the insert time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub post_id: RecordId,
    pub author_id: RecordId,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input for creating a like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLike {
    pub user_id: RecordId,
    pub post_id: RecordId,
}

/// Input for creating a message. `created_at` defaults to the insert time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub sender_id: RecordId,
    pub receiver_id: RecordId,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A single-record create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewRecord {
    User(NewUser),
    Connection(NewConnection),
    Post(NewPost),
    Comment(NewComment),
    Like(NewLike),
    Message(NewMessage),
}

impl NewRecord {
    pub fn kind(&self) -> EntityKind {
        match self {
            NewRecord::User(_) => EntityKind::User,
            NewRecord::Connection(_) => EntityKind::Connection,
            NewRecord::Post(_) => EntityKind::Post,
            NewRecord::Comment(_) => EntityKind::Comment,
            NewRecord::Like(_) => EntityKind::Like,
            NewRecord::Message(_) => EntityKind::Message,
        }
    }
}
