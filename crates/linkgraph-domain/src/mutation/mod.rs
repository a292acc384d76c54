//! Single-record writes for the social graph.
//!
//! Mutations bypass the loaders entirely: they go straight to
//! [`DataStore::insert`] and are never cached. A pass that already loaded a
//! relation keeps its snapshot; the next pass sees the write.

use std::sync::Arc;

use linkgraph_storage::{
    fetch_records_by_filter, insert_record, Comment, Connection, DataStore, DisjunctiveFilter,
    Field, Like, Message, NewComment, NewConnection, NewLike, NewMessage, NewPost, NewRecord,
    NewUser, Post, RecordId, User,
};
use tracing::{debug, instrument, warn};

use crate::error::{DomainError, DomainResult};
use crate::resolver::pair_both_orientations;

/// Handles the create operations of the graph API.
pub struct MutationHandler<S> {
    store: Arc<S>,
}

impl<S: DataStore> MutationHandler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: NewUser) -> DomainResult<User> {
        let user: User = insert_record(self.store.as_ref(), NewRecord::User(input)).await?;
        debug!(user_id = user.id, "user created");
        Ok(user)
    }

    #[instrument(skip(self, input), fields(author_id = input.author_id))]
    pub async fn create_post(&self, input: NewPost) -> DomainResult<Post> {
        Ok(insert_record(self.store.as_ref(), NewRecord::Post(input)).await?)
    }

    #[instrument(skip(self, input), fields(post_id = input.post_id, author_id = input.author_id))]
    pub async fn create_comment(&self, input: NewComment) -> DomainResult<Comment> {
        Ok(insert_record(self.store.as_ref(), NewRecord::Comment(input)).await?)
    }

    /// Records that `user_id` likes `post_id`. Repeated likes are kept.
    #[instrument(skip(self))]
    pub async fn like_post(&self, user_id: RecordId, post_id: RecordId) -> DomainResult<Like> {
        Ok(insert_record(
            self.store.as_ref(),
            NewRecord::Like(NewLike { user_id, post_id }),
        )
        .await?)
    }

    #[instrument(
        skip(self, input),
        fields(sender_id = input.sender_id, receiver_id = input.receiver_id)
    )]
    pub async fn send_message(&self, input: NewMessage) -> DomainResult<Message> {
        Ok(insert_record(self.store.as_ref(), NewRecord::Message(input)).await?)
    }

    /// Connects two users.
    ///
    /// Connections are undirected, so an existing `(b, a)` edge blocks
    /// `connect(a, b)` just like `(a, b)` does. Nothing is written when the
    /// check fails.
    ///
    /// # Errors
    ///
    /// - [`DomainError::InvalidInput`] if both ids name the same user
    /// - [`DomainError::DuplicateRelationship`] if the users are already connected
    /// - [`DomainError::StorageFailure`] if either user does not exist or the
    ///   store fails
    ///
    /// The duplicate check and the insert are separate store calls and the
    /// `DataStore` facade has no uniqueness constraint on edges. Concurrent
    /// `connect(a, b)` and `connect(b, a)` calls can both pass the check
    /// against a store that yields between them, so callers that race on the
    /// same pair must serialize those calls themselves.
    #[instrument(skip(self))]
    pub async fn connect(&self, user1_id: RecordId, user2_id: RecordId) -> DomainResult<Connection> {
        if user1_id == user2_id {
            return Err(DomainError::InvalidInput {
                message: format!("user {user1_id} cannot connect to themselves"),
            });
        }

        let existing = pair_both_orientations(
            DisjunctiveFilter::new(),
            Field::User1Id,
            Field::User2Id,
            user1_id,
            user2_id,
        );
        let found: Vec<Connection> = fetch_records_by_filter(self.store.as_ref(), &existing).await?;
        if !found.is_empty() {
            warn!(existing = found.len(), "rejecting duplicate connection");
            return Err(DomainError::DuplicateRelationship { user1_id, user2_id });
        }

        Ok(insert_record(
            self.store.as_ref(),
            NewRecord::Connection(NewConnection { user1_id, user2_id }),
        )
        .await?)
    }
}

impl<S> Clone for MutationHandler<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}
