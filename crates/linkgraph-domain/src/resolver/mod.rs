//! Relational resolvers built on the batching loader.
//!
//! # Loaders
//!
//! | Loader | Key | Value | Storage calls per batch |
//! |--------|-----|-------|-------------------------|
//! | [`EntityById`] | id | `Option<R>` | 1 set-membership fetch |
//! | [`EntitiesByForeignKey`] | owner id | `Vec<R>` | 1 filter fetch on the foreign key |
//! | [`ConnectionsByUser`] | user id | `Vec<User>` | 1 edge fetch + 1 endpoint fetch |
//! | [`FriendsOfFriends`] | user id | `Vec<RecordId>` | 2 edge fetches |
//! | [`ConversationByPair`] | [`UserPair`] | `Vec<Message>` | 1 filter fetch |
//!
//! [`RequestPass`] bundles one loader per relation for a single resolution
//! pass, and [`fields`] maps each graph field to the loader that serves it.
//!
//! [`RecordId`]: linkgraph_storage::RecordId

mod adjacency;
mod conversation;
mod entity;
pub mod fields;
mod filters;
mod pass;

pub(crate) use filters::pair_both_orientations;

pub use adjacency::{ConnectionsByUser, FriendsOfFriends};
pub use conversation::{ConversationByPair, UserPair};
pub use entity::{EntitiesByForeignKey, EntityById};
pub use pass::RequestPass;

#[cfg(test)]
mod tests;
