//! Per-pass loader context.

use std::sync::Arc;

use futures::future::join_all;
use linkgraph_storage::{Comment, DataStore, Field, Like, Post, User};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::adjacency::{ConnectionsByUser, FriendsOfFriends};
use super::conversation::ConversationByPair;
use super::entity::{EntitiesByForeignKey, EntityById};
use crate::loader::{Dispatch, Loader, LoaderConfig};

/// Loaders for one resolution pass.
///
/// Built fresh by the resolution engine for every client query and dropped
/// when the response is assembled, taking every cached value and queued key
/// with it. Nothing here is shared between passes.
///
/// # Usage
///
/// ```ignore
/// let pass = RequestPass::new(store, &LoaderConfig::default());
///
/// // Collect: register every key the current wave of resolvers needs
/// let authors: Vec<_> = posts.iter().map(|p| fields::post_author(&pass, p)).collect();
///
/// // Flush: one fetch per loader with queued keys
/// pass.flush().await;
///
/// for author in authors {
///     let author = author.await?;
/// }
/// ```
pub struct RequestPass<S: DataStore> {
    id: Uuid,
    pub users: Loader<EntityById<User, S>>,
    pub posts: Loader<EntityById<Post, S>>,
    pub posts_by_author: Loader<EntitiesByForeignKey<Post, S>>,
    pub comments_by_post: Loader<EntitiesByForeignKey<Comment, S>>,
    pub likes_by_post: Loader<EntitiesByForeignKey<Like, S>>,
    pub connections: Loader<ConnectionsByUser<S>>,
    pub friends_of_friends: Loader<FriendsOfFriends<S>>,
    pub conversations: Loader<ConversationByPair<S>>,
}

impl<S: DataStore> RequestPass<S> {
    /// Creates a pass with empty caches and queues.
    pub fn new(store: Arc<S>, config: &LoaderConfig) -> Self {
        let id = Uuid::new_v4();
        debug!(pass_id = %id, cache_enabled = config.cache_enabled, "resolution pass started");

        Self {
            id,
            users: Loader::new(EntityById::new(Arc::clone(&store)), config),
            posts: Loader::new(EntityById::new(Arc::clone(&store)), config),
            posts_by_author: Loader::new(
                EntitiesByForeignKey::new(Arc::clone(&store), Field::AuthorId, "posts_by_author"),
                config,
            ),
            comments_by_post: Loader::new(
                EntitiesByForeignKey::new(Arc::clone(&store), Field::PostId, "comments_by_post"),
                config,
            ),
            likes_by_post: Loader::new(
                EntitiesByForeignKey::new(Arc::clone(&store), Field::PostId, "likes_by_post"),
                config,
            ),
            connections: Loader::new(ConnectionsByUser::new(Arc::clone(&store)), config),
            friends_of_friends: Loader::new(FriendsOfFriends::new(Arc::clone(&store)), config),
            conversations: Loader::new(ConversationByPair::new(store), config),
        }
    }

    /// Identifier of this pass, attached to its log spans.
    pub fn id(&self) -> Uuid {
        self.id
    }

    fn loaders(&self) -> [&dyn Dispatch; 8] {
        [
            &self.users,
            &self.posts,
            &self.posts_by_author,
            &self.comments_by_post,
            &self.likes_by_post,
            &self.connections,
            &self.friends_of_friends,
            &self.conversations,
        ]
    }

    /// True if any loader has keys waiting for a flush.
    pub fn has_queued(&self) -> bool {
        self.loaders().iter().any(|l| l.has_queued())
    }

    /// Flush phase of a tick: dispatches every loader with queued keys.
    ///
    /// Loaders are dispatched concurrently, each with one batch call. The
    /// flush repeats until no loader has queued keys and returns the total
    /// number of keys dispatched.
    #[instrument(skip(self), fields(pass_id = %self.id))]
    pub async fn flush(&self) -> usize {
        let mut dispatched = 0;
        loop {
            let queued: Vec<&dyn Dispatch> = self
                .loaders()
                .into_iter()
                .filter(|l| l.has_queued())
                .collect();
            if queued.is_empty() {
                break;
            }

            let names: Vec<&'static str> = queued.iter().map(|l| l.name()).collect();
            debug!(loaders = ?names, "flushing loaders");
            dispatched += join_all(queued.iter().map(|l| l.dispatch()))
                .await
                .into_iter()
                .sum::<usize>();
        }
        dispatched
    }
}

impl<S: DataStore> std::fmt::Debug for RequestPass<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPass")
            .field("id", &self.id)
            .field("users", &self.users)
            .field("posts", &self.posts)
            .field("connections", &self.connections)
            .finish_non_exhaustive()
    }
}
