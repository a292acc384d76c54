//! linkgraph-storage: Storage access facade
//!
//! This crate provides the storage abstraction for linkgraph, including:
//! - Typed social graph records and their boundary conversion
//! - Disjunctive filter model (OR of AND-ed id conditions)
//! - DataStore trait for set-membership and filter fetches
//! - In-memory implementation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             linkgraph-storage                │
//! ├─────────────────────────────────────────────┤
//! │  records.rs - Typed records, StoredRecord   │
//! │  filter.rs  - Disjunctive filters           │
//! │  traits.rs  - DataStore trait definition    │
//! │  memory.rs  - In-memory implementation      │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod filter;
pub mod memory;
pub mod records;
pub mod traits;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use filter::{Clause, Condition, DisjunctiveFilter};
pub use memory::MemoryDataStore;
pub use records::{
    Comment, Connection, EntityKind, Field, Like, Message, NewComment, NewConnection, NewLike,
    NewMessage, NewPost, NewRecord, NewUser, Post, Record, RecordId, StoredRecord, User,
};
pub use traits::{
    fetch_all_records, fetch_records_by_filter, fetch_records_by_ids, insert_record, DataStore,
};
