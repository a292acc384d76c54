//! Connection graph loaders.
//!
//! Connections are undirected: an edge `(user1, user2)` makes each endpoint a
//! neighbor of the other. Both loaders fetch every edge touching the
//! requested users with one filter query and build the adjacency in memory.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use linkgraph_storage::{
    fetch_records_by_filter, fetch_records_by_ids, Connection, DataStore, RecordId, User,
};
use tracing::trace;

use super::filters::either_endpoint;
use crate::error::DomainResult;
use crate::loader::BatchFn;

/// Fetches every connection with an endpoint in `ids`.
async fn fetch_edges<S: DataStore>(
    store: &S,
    ids: impl IntoIterator<Item = RecordId> + Clone,
) -> DomainResult<Vec<Connection>> {
    Ok(fetch_records_by_filter(store, &either_endpoint(ids)).await?)
}

/// Neighbor ids of each user in `users`, following edge order.
///
/// For every edge, each endpoint that belongs to `users` gets the other
/// endpoint appended to its list.
fn neighbors_of(edges: &[Connection], users: &HashSet<RecordId>) -> HashMap<RecordId, Vec<RecordId>> {
    let mut adjacency: HashMap<RecordId, Vec<RecordId>> = HashMap::new();
    for edge in edges {
        for endpoint in [edge.user1_id, edge.user2_id] {
            if !users.contains(&endpoint) {
                continue;
            }
            if let Some(other) = edge.other_endpoint(endpoint) {
                adjacency.entry(endpoint).or_default().push(other);
            }
        }
    }
    adjacency
}

/// One-hop adjacency: the connected users of each requested user.
pub struct ConnectionsByUser<S> {
    store: Arc<S>,
}

impl<S: DataStore> ConnectionsByUser<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: DataStore> BatchFn for ConnectionsByUser<S> {
    type Key = RecordId;
    type Value = Vec<User>;

    fn name(&self) -> &'static str {
        "connections_by_user"
    }

    async fn load(&self, keys: &[RecordId]) -> DomainResult<Vec<Vec<User>>> {
        let store = self.store.as_ref();
        let requested: HashSet<RecordId> = keys.iter().copied().collect();
        let edges = fetch_edges(store, keys.iter().copied()).await?;
        let adjacency = neighbors_of(&edges, &requested);

        // Endpoint records for the matched edges
        let endpoint_ids: BTreeSet<RecordId> = adjacency.values().flatten().copied().collect();
        let users: HashMap<RecordId, User> = if endpoint_ids.is_empty() {
            HashMap::new()
        } else {
            let ids: Vec<RecordId> = endpoint_ids.into_iter().collect();
            fetch_records_by_ids::<User, _>(store, &ids)
                .await?
                .into_iter()
                .map(|u| (u.id, u))
                .collect()
        };

        Ok(keys
            .iter()
            .map(|key| {
                adjacency
                    .get(key)
                    .map(|ids| {
                        ids.iter()
                            .filter_map(|id| users.get(id).cloned())
                            .collect::<Vec<User>>()
                    })
                    .unwrap_or_default()
            })
            .collect())
    }
}

/// Two-hop adjacency: users reachable through a direct connection, minus the
/// direct connections themselves and the origin user.
///
/// Each candidate appears once, in the order it was first reached.
pub struct FriendsOfFriends<S> {
    store: Arc<S>,
}

impl<S: DataStore> FriendsOfFriends<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: DataStore> BatchFn for FriendsOfFriends<S> {
    type Key = RecordId;
    type Value = Vec<RecordId>;

    fn name(&self) -> &'static str {
        "friends_of_friends"
    }

    async fn load(&self, keys: &[RecordId]) -> DomainResult<Vec<Vec<RecordId>>> {
        let store = self.store.as_ref();

        // Phase 1: first-degree neighbors of every requested user
        let requested: HashSet<RecordId> = keys.iter().copied().collect();
        let first_edges = fetch_edges(store, keys.iter().copied()).await?;
        let first_degree = neighbors_of(&first_edges, &requested);

        let frontier: BTreeSet<RecordId> = first_degree.values().flatten().copied().collect();
        if frontier.is_empty() {
            return Ok(vec![Vec::new(); keys.len()]);
        }

        // Phase 2: neighbors of the whole frontier, one query for the batch
        let second_edges = fetch_edges(store, frontier.iter().copied()).await?;
        let frontier: HashSet<RecordId> = frontier.into_iter().collect();
        let second_degree = neighbors_of(&second_edges, &frontier);
        trace!(
            first_edges = first_edges.len(),
            second_edges = second_edges.len(),
            "built two-hop adjacency"
        );

        Ok(keys
            .iter()
            .map(|&origin| {
                let Some(direct) = first_degree.get(&origin) else {
                    return Vec::new();
                };
                let excluded: HashSet<RecordId> = direct.iter().copied().collect();
                let mut seen = HashSet::new();
                let mut candidates = Vec::new();

                for friend in direct {
                    let Some(reachable) = second_degree.get(friend) else {
                        continue;
                    };
                    for &candidate in reachable {
                        // A path back through a mutual friend must not
                        // reintroduce the origin or a direct friend
                        if candidate == origin || excluded.contains(&candidate) {
                            continue;
                        }
                        if seen.insert(candidate) {
                            candidates.push(candidate);
                        }
                    }
                }
                candidates
            })
            .collect())
    }
}
