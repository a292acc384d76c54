//! Field resolvers for the graph schema.
//!
//! Each function resolves one relational field of a parent record by
//! registering the right key with the right loader of the pass. None of them
//! touch storage; the values arrive once the pass is flushed.

use linkgraph_storage::{
    Comment, Connection, DataStore, Like, Message, Post, RecordId, User,
};

use super::conversation::UserPair;
use super::pass::RequestPass;
use crate::loader::PendingLoad;

/// `User.connections`: every user connected to `user`.
pub fn user_connections<S: DataStore>(pass: &RequestPass<S>, user: &User) -> PendingLoad<Vec<User>> {
    pass.connections.register(user.id)
}

/// `User.posts`: every post authored by `user`.
pub fn user_posts<S: DataStore>(pass: &RequestPass<S>, user: &User) -> PendingLoad<Vec<Post>> {
    pass.posts_by_author.register(user.id)
}

/// `User.friendsOfFriends`: ids of users two hops away.
pub fn user_friends_of_friends<S: DataStore>(
    pass: &RequestPass<S>,
    user: &User,
) -> PendingLoad<Vec<RecordId>> {
    pass.friends_of_friends.register(user.id)
}

/// `User.conversationWith(other)`: messages between `user` and `other_id`, oldest first.
pub fn user_conversation_with<S: DataStore>(
    pass: &RequestPass<S>,
    user: &User,
    other_id: RecordId,
) -> PendingLoad<Vec<Message>> {
    pass.conversations.register(UserPair::new(user.id, other_id))
}

/// `Message.fromUser`
pub fn message_from_user<S: DataStore>(
    pass: &RequestPass<S>,
    message: &Message,
) -> PendingLoad<Option<User>> {
    pass.users.register(message.sender_id)
}

/// `Message.toUser`
pub fn message_to_user<S: DataStore>(
    pass: &RequestPass<S>,
    message: &Message,
) -> PendingLoad<Option<User>> {
    pass.users.register(message.receiver_id)
}

/// `Post.author`
pub fn post_author<S: DataStore>(pass: &RequestPass<S>, post: &Post) -> PendingLoad<Option<User>> {
    pass.users.register(post.author_id)
}

/// `Post.comments`
pub fn post_comments<S: DataStore>(pass: &RequestPass<S>, post: &Post) -> PendingLoad<Vec<Comment>> {
    pass.comments_by_post.register(post.id)
}

/// `Post.likes`
pub fn post_likes<S: DataStore>(pass: &RequestPass<S>, post: &Post) -> PendingLoad<Vec<Like>> {
    pass.likes_by_post.register(post.id)
}

/// `Like.linkingUser`
pub fn like_linking_user<S: DataStore>(pass: &RequestPass<S>, like: &Like) -> PendingLoad<Option<User>> {
    pass.users.register(like.user_id)
}

/// `Like.postLinked`
pub fn like_post_linked<S: DataStore>(pass: &RequestPass<S>, like: &Like) -> PendingLoad<Option<Post>> {
    pass.posts.register(like.post_id)
}

/// `Comment.postedBy`
pub fn comment_posted_by<S: DataStore>(
    pass: &RequestPass<S>,
    comment: &Comment,
) -> PendingLoad<Option<User>> {
    pass.users.register(comment.author_id)
}

/// `Comment.postCommented`
pub fn comment_post_commented<S: DataStore>(
    pass: &RequestPass<S>,
    comment: &Comment,
) -> PendingLoad<Option<Post>> {
    pass.posts.register(comment.post_id)
}

/// `Connection.user1`
pub fn connection_user1<S: DataStore>(
    pass: &RequestPass<S>,
    connection: &Connection,
) -> PendingLoad<Option<User>> {
    pass.users.register(connection.user1_id)
}

/// `Connection.user2`
pub fn connection_user2<S: DataStore>(
    pass: &RequestPass<S>,
    connection: &Connection,
) -> PendingLoad<Option<User>> {
    pass.users.register(connection.user2_id)
}
