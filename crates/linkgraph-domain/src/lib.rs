//! linkgraph-domain: Request-scoped batched loading for the social graph
//!
//! This crate contains the data-loading logic between the query resolution
//! engine and storage, including:
//! - Per-pass loaders that collect keys, dedupe them and fetch in one call
//! - Relational resolvers for entities, foreign keys, adjacency and
//!   conversations
//! - Single-record mutations
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              linkgraph-domain                │
//! ├─────────────────────────────────────────────┤
//! │  loader/   - Collect/flush batching, cache  │
//! │  resolver/ - Relational batch functions     │
//! │  mutation/ - Single-record writes           │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod loader;
pub mod mutation;
pub mod resolver;

// Re-export commonly used types at the crate root
pub use error::{DomainError, DomainResult};
pub use loader::{BatchFn, Dispatch, Loader, LoaderConfig, PendingLoad};
pub use mutation::MutationHandler;
pub use resolver::{fields, RequestPass, UserPair};
