//! linkgraph-server: Service layer for the social graph
//!
//! This crate wires storage and the batching layer into a runnable service:
//! - Root queries and explicit collect/flush resolution ticks
//! - Demo data seeding
//! - Configuration management
//! - Structured logging
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             linkgraph-server                 │
//! ├─────────────────────────────────────────────┤
//! │  service.rs - GraphService, root queries    │
//! │  seed.rs    - Demo social graph             │
//! │  config.rs  - Configuration management      │
//! │  logging.rs - tracing-subscriber setup      │
//! │  main.rs    - `linkgraph` binary            │
//! └─────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod logging;
pub mod seed;
pub mod service;

// Re-exports for convenience
pub use config::{ConfigLoadError, ServerConfig};
pub use logging::{init_logging, LoggingConfig};
pub use seed::{seed_demo_data, SeedSummary};
pub use service::{GraphService, UserOverview};
