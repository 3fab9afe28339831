//! Storage Adapters
//!
//! Implementations of the SessionStore port.
//!
//! - **InMemorySessionStore** - Process-local map (testing/development)
//! - **FileSessionStore** - One YAML file per session
//! - **RedisSessionStore** - JSON values in Redis with optional TTL
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileSessionStore, InMemorySessionStore};
//!
//! let store = FileSessionStore::new("./data/sessions");
//! let store = InMemorySessionStore::new();
//! ```

mod file_session_store;
mod in_memory_session_store;
mod redis_session_store;

pub use file_session_store::FileSessionStore;
pub use in_memory_session_store::InMemorySessionStore;
pub use redis_session_store::{RedisSessionStore, DEFAULT_KEY_PREFIX};
