//! Graph query service.
//!
//! Stands in for the query engine's root resolvers: it opens a resolution
//! pass per client query, answers the root list queries, and drives the
//! field resolvers through explicit collect/flush ticks.

use std::sync::Arc;

use linkgraph_domain::{fields, DomainResult, LoaderConfig, MutationHandler, RequestPass};
use linkgraph_storage::{fetch_all_records, DataStore, Like, Message, Post, RecordId, User};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// One user with the relations the overview query asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserOverview {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    /// Ids of directly connected users.
    pub connections: Vec<RecordId>,
    /// Content of every post the user wrote.
    pub posts: Vec<String>,
    pub friends_of_friends: Vec<RecordId>,
}

/// Root of the graph API over one store.
pub struct GraphService<S> {
    store: Arc<S>,
    loader_config: LoaderConfig,
}

impl<S: DataStore> GraphService<S> {
    pub fn new(store: Arc<S>, loader_config: LoaderConfig) -> Self {
        Self {
            store,
            loader_config,
        }
    }

    /// Opens a resolution pass for one client query.
    pub fn begin_pass(&self) -> RequestPass<S> {
        RequestPass::new(Arc::clone(&self.store), &self.loader_config)
    }

    pub fn mutations(&self) -> MutationHandler<S> {
        MutationHandler::new(Arc::clone(&self.store))
    }

    /// `Query.users`. Listed users are primed into the pass so that later
    /// `Post.author` style lookups for them never reach storage.
    #[instrument(skip(self, pass), fields(pass_id = %pass.id()))]
    pub async fn users(&self, pass: &RequestPass<S>) -> DomainResult<Vec<User>> {
        let users: Vec<User> = fetch_all_records(self.store.as_ref()).await?;
        for user in &users {
            pass.users.prime(user.id, Some(user.clone()));
        }
        debug!(count = users.len(), "listed users");
        Ok(users)
    }

    /// `Query.posts`, priming the pass's post cache.
    #[instrument(skip(self, pass), fields(pass_id = %pass.id()))]
    pub async fn posts(&self, pass: &RequestPass<S>) -> DomainResult<Vec<Post>> {
        let posts: Vec<Post> = fetch_all_records(self.store.as_ref()).await?;
        for post in &posts {
            pass.posts.prime(post.id, Some(post.clone()));
        }
        debug!(count = posts.len(), "listed posts");
        Ok(posts)
    }

    /// `Query.messages`
    #[instrument(skip(self))]
    pub async fn messages(&self) -> DomainResult<Vec<Message>> {
        Ok(fetch_all_records(self.store.as_ref()).await?)
    }

    /// `Query.likes`
    #[instrument(skip(self))]
    pub async fn likes(&self) -> DomainResult<Vec<Like>> {
        Ok(fetch_all_records(self.store.as_ref()).await?)
    }

    /// Connections, posts and friends-of-friends for every user.
    ///
    /// Resolves in one tick: every field of every user is registered first,
    /// then a single flush issues one fetch per loader.
    #[instrument(skip(self, pass), fields(pass_id = %pass.id()))]
    pub async fn network_overview(&self, pass: &RequestPass<S>) -> DomainResult<Vec<UserOverview>> {
        let users = self.users(pass).await?;

        // Collect
        let pending: Vec<_> = users
            .iter()
            .map(|user| {
                (
                    fields::user_connections(pass, user),
                    fields::user_posts(pass, user),
                    fields::user_friends_of_friends(pass, user),
                )
            })
            .collect();

        // Flush
        let dispatched = pass.flush().await;
        info!(users = users.len(), dispatched, "overview tick flushed");

        // Every handle is resolved by now
        let mut overview = Vec::with_capacity(users.len());
        for (user, (connections, posts, fof)) in users.into_iter().zip(pending) {
            overview.push(UserOverview {
                id: user.id,
                name: format!("{} {}", user.first_name, user.last_name),
                email: user.email,
                connections: connections.await?.into_iter().map(|u| u.id).collect(),
                posts: posts.await?.into_iter().map(|p| p.content).collect(),
                friends_of_friends: fof.await?,
            });
        }
        Ok(overview)
    }
}

impl<S> Clone for GraphService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            loader_config: self.loader_config.clone(),
        }
    }
}
