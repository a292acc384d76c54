//! Resolver test suite.
//!
//! Covers the batching contract of every relational loader:
//! - one storage call per loader per flush
//! - result order follows key order, not storage order
//! - one-to-many completeness and undirected adjacency
//! - friends-of-friends exclusions
//! - conversation threading across both orientations
//! - cache scope and failure propagation

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use linkgraph_storage::{
    fetch_all_records, Connection, DataStore, EntityKind, MemoryDataStore, Message, Post, RecordId,
    User,
};
use proptest::prelude::*;

use super::mocks::*;
use crate::error::DomainError;
use crate::loader::LoaderConfig;
use crate::resolver::{fields, RequestPass, UserPair};

fn pass_over<S: DataStore>(store: &Arc<S>) -> RequestPass<S> {
    RequestPass::new(Arc::clone(store), &LoaderConfig::default())
}

fn ids_of(users: &[User]) -> Vec<RecordId> {
    users.iter().map(|u| u.id).collect()
}

// ========== Section 1: Entity by id ==========

#[tokio::test]
async fn test_duplicate_keys_share_one_fetch() {
    let memory = MemoryDataStore::new();
    add_users(&memory, 3).await;
    let store = Arc::new(CountingDataStore::new(memory));
    let pass = pass_over(&store);

    let pending: Vec<_> = [3, 1, 3, 2, 1]
        .into_iter()
        .map(|id| pass.users.register(id))
        .collect();
    assert_eq!(store.calls(), 0, "registration must not touch storage");

    let dispatched = pass.flush().await;
    assert_eq!(dispatched, 3, "only distinct keys are dispatched");
    assert_eq!(store.calls(), 1);

    let mut resolved = Vec::new();
    for p in pending {
        resolved.push(p.await.unwrap().map(|u| u.id));
    }
    assert_eq!(resolved, vec![Some(3), Some(1), Some(3), Some(2), Some(1)]);
}

#[tokio::test]
async fn test_results_follow_key_order_not_storage_order() {
    let memory = MemoryDataStore::new();
    add_users(&memory, 3).await;
    let store = Arc::new(ReversingDataStore::new(memory));
    let pass = pass_over(&store);

    let users = pass.users.load_many([3, 1, 2]).await.unwrap();
    let ids: Vec<_> = users.into_iter().map(|u| u.map(|u| u.id)).collect();
    assert_eq!(ids, vec![Some(3), Some(1), Some(2)]);
}

#[tokio::test]
async fn test_missing_entity_resolves_to_none() {
    let memory = MemoryDataStore::new();
    add_users(&memory, 2).await;
    let store = Arc::new(memory);
    let pass = pass_over(&store);

    let users = pass.users.load_many([2, 99]).await.unwrap();
    assert_eq!(users[0].as_ref().map(|u| u.id), Some(2));
    assert!(users[1].is_none());
}

// ========== Section 2: One-to-many ==========

#[tokio::test]
async fn test_posts_by_author_is_complete_for_every_key() {
    let memory = MemoryDataStore::new();
    add_users(&memory, 3).await;
    add_post(&memory, 2, "first").await;
    add_post(&memory, 3, "a").await;
    add_post(&memory, 3, "b").await;
    add_post(&memory, 3, "c").await;
    let store = Arc::new(CountingDataStore::new(memory));
    let pass = pass_over(&store);

    let posts = pass.posts_by_author.load_many([1, 2, 3]).await.unwrap();
    assert_eq!(store.calls(), 1);

    let counts: Vec<usize> = posts.iter().map(Vec::len).collect();
    assert_eq!(counts, vec![0, 1, 3]);
    assert!(posts[2].iter().all(|p| p.author_id == 3));
}

#[tokio::test]
async fn test_post_field_wave_costs_one_call_per_loader() {
    let memory = MemoryDataStore::new();
    add_users(&memory, 4).await;
    for author in 1..=4 {
        let post = add_post(&memory, author, "hello").await;
        add_comment(&memory, post, (author % 4) + 1, "nice").await;
        add_like(&memory, (author % 4) + 1, post).await;
        add_like(&memory, ((author + 1) % 4) + 1, post).await;
    }
    let store = Arc::new(CountingDataStore::new(memory));
    let pass = pass_over(&store);

    let posts: Vec<Post> = pass
        .posts
        .load_many([1, 2, 3, 4])
        .await
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(posts.len(), 4);
    store.reset();

    // Collect phase for every post, then a single flush
    let authors: Vec<_> = posts.iter().map(|p| fields::post_author(&pass, p)).collect();
    let comments: Vec<_> = posts.iter().map(|p| fields::post_comments(&pass, p)).collect();
    let likes: Vec<_> = posts.iter().map(|p| fields::post_likes(&pass, p)).collect();
    pass.flush().await;

    assert_eq!(store.calls(), 3, "users, comments and likes: one call each");
    assert_eq!(store.calls_for(EntityKind::User), 1);
    assert_eq!(store.calls_for(EntityKind::Comment), 1);
    assert_eq!(store.calls_for(EntityKind::Like), 1);

    for ((post, author), (comments, likes)) in posts
        .iter()
        .zip(authors)
        .zip(comments.into_iter().zip(likes))
    {
        assert_eq!(author.await.unwrap().map(|u| u.id), Some(post.author_id));
        let comments = comments.await.unwrap();
        assert_eq!(comments.len(), 1);
        assert!(comments.iter().all(|c| c.post_id == post.id));
        let likes = likes.await.unwrap();
        assert_eq!(likes.len(), 2);
        assert!(likes.iter().all(|l| l.post_id == post.id));
    }
}

#[tokio::test]
async fn test_like_and_comment_back_references() {
    let memory = MemoryDataStore::new();
    add_users(&memory, 2).await;
    let post = add_post(&memory, 1, "post").await;
    add_comment(&memory, post, 2, "comment").await;
    add_like(&memory, 2, post).await;
    let store = Arc::new(memory);
    let pass = pass_over(&store);

    let like = pass.likes_by_post.load(post).await.unwrap().remove(0);
    let comment = pass.comments_by_post.load(post).await.unwrap().remove(0);

    let liker = fields::like_linking_user(&pass, &like);
    let liked = fields::like_post_linked(&pass, &like);
    let commenter = fields::comment_posted_by(&pass, &comment);
    let commented = fields::comment_post_commented(&pass, &comment);
    pass.flush().await;

    assert_eq!(liker.await.unwrap().map(|u| u.id), Some(2));
    assert_eq!(liked.await.unwrap().map(|p| p.id), Some(post));
    assert_eq!(commenter.await.unwrap().map(|u| u.id), Some(2));
    assert_eq!(commented.await.unwrap().map(|p| p.id), Some(post));
}

// ========== Section 3: Adjacency ==========

#[tokio::test]
async fn test_connections_are_symmetric() {
    let memory = MemoryDataStore::new();
    add_users(&memory, 3).await;
    connect(&memory, 1, 2).await;
    let store = Arc::new(CountingDataStore::new(memory));
    let pass = pass_over(&store);

    let connections = pass.connections.load_many([1, 2, 3]).await.unwrap();
    assert_eq!(ids_of(&connections[0]), vec![2]);
    assert_eq!(ids_of(&connections[1]), vec![1]);
    assert!(connections[2].is_empty());
    assert_eq!(store.calls_for(EntityKind::Connection), 1);
}

#[tokio::test]
async fn test_connection_endpoint_fields() {
    let memory = MemoryDataStore::new();
    add_users(&memory, 2).await;
    connect(&memory, 2, 1).await;
    let store = Arc::new(memory);
    let pass = pass_over(&store);

    let edge = fetch_all_records::<Connection, _>(store.as_ref())
        .await
        .unwrap()
        .remove(0);
    let first = fields::connection_user1(&pass, &edge);
    let second = fields::connection_user2(&pass, &edge);
    pass.flush().await;

    assert_eq!(first.await.unwrap().map(|u| u.id), Some(2));
    assert_eq!(second.await.unwrap().map(|u| u.id), Some(1));
}

#[tokio::test]
async fn test_friends_of_friends_in_a_triangle_is_empty() {
    let memory = MemoryDataStore::new();
    add_users(&memory, 3).await;
    connect(&memory, 1, 2).await;
    connect(&memory, 2, 3).await;
    connect(&memory, 1, 3).await;
    let store = Arc::new(memory);
    let pass = pass_over(&store);

    let fof = pass.friends_of_friends.load_many([1, 2, 3]).await.unwrap();
    assert!(fof.iter().all(Vec::is_empty), "got {fof:?}");
}

#[tokio::test]
async fn test_friends_of_friends_along_a_chain() {
    let memory = MemoryDataStore::new();
    add_users(&memory, 4).await;
    connect(&memory, 1, 2).await;
    connect(&memory, 2, 3).await;
    connect(&memory, 3, 4).await;
    let store = Arc::new(CountingDataStore::new(memory));
    let pass = pass_over(&store);

    let fof = pass.friends_of_friends.load_many([1, 2, 3, 4]).await.unwrap();
    assert_eq!(fof, vec![vec![3], vec![4], vec![1], vec![2]]);
    assert_eq!(store.calls(), 2, "one edge query per hop");
}

#[tokio::test]
async fn test_friends_of_friends_reached_twice_appears_once() {
    let memory = MemoryDataStore::new();
    add_users(&memory, 4).await;
    connect(&memory, 1, 2).await;
    connect(&memory, 1, 3).await;
    connect(&memory, 2, 4).await;
    connect(&memory, 4, 3).await;
    let store = Arc::new(memory);
    let pass = pass_over(&store);

    assert_eq!(pass.friends_of_friends.load(1).await.unwrap(), vec![4]);
}

#[tokio::test]
async fn test_friends_of_friends_without_connections_skips_second_hop() {
    let memory = MemoryDataStore::new();
    add_users(&memory, 2).await;
    let store = Arc::new(CountingDataStore::new(memory));
    let pass = pass_over(&store);

    let user = pass.users.load(1).await.unwrap().unwrap();
    store.reset();
    let fof = fields::user_friends_of_friends(&pass, &user);
    pass.flush().await;

    assert!(fof.await.unwrap().is_empty());
    assert_eq!(store.calls(), 1);
}

// ========== Section 4: Conversations ==========

async fn conversation_fixture() -> MemoryDataStore {
    let memory = MemoryDataStore::new();
    add_users(&memory, 6).await;
    send(&memory, 5, 6, "hi", at(1)).await;
    send(&memory, 6, 5, "later", at(3)).await;
    send(&memory, 5, 6, "hello again", at(2)).await;
    send(&memory, 5, 1, "elsewhere", at(0)).await;
    memory
}

#[tokio::test]
async fn test_conversation_is_ordered_and_orientation_independent() {
    let store = Arc::new(CountingDataStore::new(conversation_fixture().await));
    let pass = pass_over(&store);

    let forward = pass.conversations.register(UserPair::new(5, 6));
    let backward = pass.conversations.register(UserPair::new(6, 5));
    let empty = pass.conversations.register(UserPair::new(2, 3));
    pass.flush().await;
    assert_eq!(store.calls(), 1);

    let contents = |messages: Vec<Message>| -> Vec<String> {
        messages.into_iter().map(|m| m.content).collect()
    };
    let expected = vec!["hi", "hello again", "later"];
    assert_eq!(contents(forward.await.unwrap()), expected);
    assert_eq!(contents(backward.await.unwrap()), expected);
    assert!(empty.await.unwrap().is_empty());
}

#[tokio::test]
async fn test_conversation_order_ignores_storage_order() {
    let store = Arc::new(ReversingDataStore::new(conversation_fixture().await));
    let pass = pass_over(&store);

    let thread = pass.conversations.load(UserPair::new(6, 5)).await.unwrap();
    let stamps: Vec<_> = thread.iter().map(|m| m.created_at).collect();
    assert_eq!(stamps, vec![at(1), at(2), at(3)]);
}

#[tokio::test]
async fn test_message_endpoint_fields() {
    let store = Arc::new(conversation_fixture().await);
    let pass = pass_over(&store);

    let user = pass.users.load(5).await.unwrap().unwrap();
    let thread = fields::user_conversation_with(&pass, &user, 6);
    pass.flush().await;
    let first = thread.await.unwrap().remove(0);

    let from = fields::message_from_user(&pass, &first);
    let to = fields::message_to_user(&pass, &first);
    pass.flush().await;
    assert_eq!(from.await.unwrap().map(|u| u.id), Some(5));
    assert_eq!(to.await.unwrap().map(|u| u.id), Some(6));
}

// ========== Section 5: Cache scope ==========

#[tokio::test]
async fn test_cache_lives_for_exactly_one_pass() {
    let memory = MemoryDataStore::new();
    add_users(&memory, 1).await;
    let store = Arc::new(CountingDataStore::new(memory));

    let first = pass_over(&store);
    assert!(first.posts_by_author.load(1).await.unwrap().is_empty());
    assert_eq!(store.calls(), 1);

    add_post(store.inner(), 1, "new").await;

    // Same pass: served from cache, still stale
    assert!(first.posts_by_author.load(1).await.unwrap().is_empty());
    assert_eq!(store.calls(), 1);

    // New pass: sees the write
    let second = pass_over(&store);
    assert_eq!(second.posts_by_author.load(1).await.unwrap().len(), 1);
    assert_eq!(store.calls(), 2);
    assert_ne!(first.id(), second.id());
}

#[tokio::test]
async fn test_disabled_cache_refetches_within_a_pass() {
    let memory = MemoryDataStore::new();
    add_users(&memory, 1).await;
    let store = Arc::new(CountingDataStore::new(memory));
    let pass = RequestPass::new(
        Arc::clone(&store),
        &LoaderConfig::default().with_cache_enabled(false),
    );

    pass.users.load(1).await.unwrap();
    pass.users.load(1).await.unwrap();
    assert_eq!(store.calls(), 2);
}

#[tokio::test]
async fn test_flush_drains_every_loader() {
    let memory = MemoryDataStore::new();
    add_users(&memory, 2).await;
    let store = Arc::new(memory);
    let pass = pass_over(&store);

    let user = pass.users.load(1).await.unwrap().unwrap();
    let _connections = fields::user_connections(&pass, &user);
    let _posts = fields::user_posts(&pass, &user);
    let _second = pass.users.register(2);
    assert!(pass.has_queued());

    assert_eq!(pass.flush().await, 3);
    assert!(!pass.has_queued());
    assert_eq!(pass.flush().await, 0);
}

// ========== Section 6: Failures ==========

#[tokio::test]
async fn test_storage_failure_reaches_every_waiter() {
    let store = Arc::new(FailingDataStore::new());
    let pass = pass_over(&store);

    let pending: Vec<_> = [1, 2, 3].into_iter().map(|id| pass.users.register(id)).collect();
    pass.flush().await;
    assert_eq!(store.calls.load(Ordering::SeqCst), 1);

    for p in pending {
        assert!(matches!(p.await, Err(DomainError::StorageFailure(_))));
    }

    // Failures are not cached
    assert!(pass.users.load(1).await.is_err());
    assert_eq!(store.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failure_in_one_loader_leaves_others_intact() {
    let memory = MemoryDataStore::new();
    add_users(&memory, 1).await;
    let store = Arc::new(memory);
    let pass = pass_over(&store);
    let failing = Arc::new(FailingDataStore::new());
    let broken = pass_over(&failing);

    let ok = pass.users.register(1);
    let err = broken.users.register(1);
    futures::join!(pass.flush(), broken.flush());

    assert!(ok.await.unwrap().is_some());
    assert!(err.await.is_err());
}

// ========== Section 7: Properties ==========

fn edge_strategy() -> impl Strategy<Value = Vec<(RecordId, RecordId)>> {
    prop::collection::vec((1u64..=8, 1u64..=8), 0..20)
        .prop_map(|edges| edges.into_iter().filter(|(a, b)| a != b).collect())
}

proptest! {
    #[test]
    fn prop_friends_of_friends_are_exactly_the_two_hop_neighbors(edges in edge_strategy()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let (fof, adjacency) = runtime.block_on(async {
            let memory = MemoryDataStore::new();
            add_users(&memory, 8).await;
            for &(a, b) in &edges {
                connect(&memory, a, b).await;
            }
            let store = Arc::new(memory);
            let pass = pass_over(&store);
            let keys: Vec<RecordId> = (1..=8).collect();
            let fof = pass.friends_of_friends.load_many(keys).await.unwrap();
            (fof, adjacency_of(&edges))
        });

        for (index, candidates) in fof.iter().enumerate() {
            let origin = index as RecordId + 1;
            let direct = adjacency.get(&origin).cloned().unwrap_or_default();
            let unique: HashSet<_> = candidates.iter().collect();
            prop_assert_eq!(unique.len(), candidates.len(), "duplicates for {}", origin);

            for candidate in candidates {
                prop_assert_ne!(*candidate, origin);
                prop_assert!(!direct.contains(candidate));
                let via_friend = direct.iter().any(|friend| {
                    adjacency.get(friend).map_or(false, |n| n.contains(candidate))
                });
                prop_assert!(via_friend, "{} is not two hops from {}", candidate, origin);
            }

            // Every two-hop node outside self and direct friends is present
            let expected: BTreeSet<RecordId> = direct
                .iter()
                .filter_map(|friend| adjacency.get(friend))
                .flatten()
                .copied()
                .filter(|n| *n != origin && !direct.contains(n))
                .collect();
            let found: BTreeSet<RecordId> = candidates.iter().copied().collect();
            prop_assert_eq!(found, expected, "incomplete for {}", origin);
        }
    }
}

fn adjacency_of(edges: &[(RecordId, RecordId)]) -> HashMap<RecordId, BTreeSet<RecordId>> {
    let mut adjacency: HashMap<RecordId, BTreeSet<RecordId>> = HashMap::new();
    for &(a, b) in edges {
        adjacency.entry(a).or_default().insert(b);
        adjacency.entry(b).or_default().insert(a);
    }
    adjacency
}
