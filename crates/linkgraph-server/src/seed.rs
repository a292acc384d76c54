//! Demo social graph.

use chrono::{Duration, Utc};
use linkgraph_domain::{DomainResult, MutationHandler};
use linkgraph_storage::{DataStore, NewComment, NewMessage, NewPost, NewUser, RecordId};
use serde::Serialize;
use tracing::info;

const USERS: [(&str, &str, &str); 5] = [
    ("Alice", "Johnson", "alice@example.com"),
    ("Bob", "Smith", "bob@example.com"),
    ("Clara", "Brown", "clara@example.com"),
    ("David", "Wilson", "david@example.com"),
    ("Eva", "Taylor", "eva@example.com"),
];

const CONNECTIONS: [(RecordId, RecordId); 5] = [(1, 2), (1, 3), (2, 4), (3, 5), (4, 1)];

/// (author, content)
const POSTS: [(RecordId, &str); 5] = [
    (1, "First post by Alice!"),
    (2, "Bob is sharing his first post."),
    (3, "Clara is loving Prisma!"),
    (4, "David is working on a new project."),
    (5, "Eva just finished her first marathon."),
];

/// (post, author, content)
const COMMENTS: [(RecordId, RecordId, &str); 4] = [
    (1, 2, "Great post, Alice!"),
    (1, 1, "Thanks, Bob!"),
    (3, 4, "Prisma is awesome indeed!"),
    (5, 3, "Congrats on the marathon, Eva!"),
];

/// (user, post)
const LIKES: [(RecordId, RecordId); 5] = [(2, 1), (1, 2), (5, 3), (3, 4), (4, 5)];

/// (sender, receiver, content)
const MESSAGES: [(RecordId, RecordId, &str); 4] = [
    (1, 2, "Hey Bob, how are you?"),
    (2, 1, "I'm good, thanks Alice!"),
    (4, 3, "Clara, do you want to grab coffee?"),
    (3, 4, "Sure, let's meet tomorrow!"),
];

/// Record counts written by [`seed_demo_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub users: usize,
    pub connections: usize,
    pub posts: usize,
    pub comments: usize,
    pub likes: usize,
    pub messages: usize,
}

/// Writes the demo graph through `handler` into an empty store.
///
/// Ids are assigned by the store, so the references above only hold when
/// the store starts empty. Messages get increasing timestamps one minute
/// apart so conversations have a stable order.
pub async fn seed_demo_data<S: DataStore>(handler: &MutationHandler<S>) -> DomainResult<SeedSummary> {
    let mut summary = SeedSummary::default();

    for (first_name, last_name, email) in USERS {
        handler
            .create_user(NewUser {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: email.to_string(),
            })
            .await?;
        summary.users += 1;
    }

    for (user1_id, user2_id) in CONNECTIONS {
        handler.connect(user1_id, user2_id).await?;
        summary.connections += 1;
    }

    for (author_id, content) in POSTS {
        handler
            .create_post(NewPost {
                author_id,
                content: content.to_string(),
                created_at: None,
            })
            .await?;
        summary.posts += 1;
    }

    for (post_id, author_id, content) in COMMENTS {
        handler
            .create_comment(NewComment {
                post_id,
                author_id,
                content: content.to_string(),
                created_at: None,
            })
            .await?;
        summary.comments += 1;
    }

    for (user_id, post_id) in LIKES {
        handler.like_post(user_id, post_id).await?;
        summary.likes += 1;
    }

    let start = Utc::now();
    for (offset, (sender_id, receiver_id, content)) in (0i64..).zip(MESSAGES) {
        handler
            .send_message(NewMessage {
                sender_id,
                receiver_id,
                content: content.to_string(),
                created_at: Some(start + Duration::minutes(offset)),
            })
            .await?;
        summary.messages += 1;
    }

    info!(?summary, "demo data seeded");
    Ok(summary)
}
