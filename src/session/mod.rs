//! Session identity and local profile storage.
//!
//! Each profile carries one opaque identity (`User_<n>`) that is sent with
//! every request so the service can keep one user's documents and graph
//! apart from another's. The identity is generated on first start, stored
//! in the profile, and reused afterwards. It is not a credential.
//!
//! # Architecture
//!
//! - [`SessionId`]: The identity token
//! - [`SessionContext`]: Built once at startup and passed to every operation
//! - [`IdentityStore`]: Key/value persistence ([`FileStore`], [`MemoryStore`])
//!
//! # Example
//!
//! ```rust
//! use graphrag_chat_client::render::RecordingSink;
//! use graphrag_chat_client::session::{MemoryStore, get_or_create_session_id};
//!
//! let store = MemoryStore::new();
//! let sink = RecordingSink::new();
//! let first = get_or_create_session_id(&store, &sink);
//! let second = get_or_create_session_id(&store, &sink);
//! assert_eq!(first.id(), second.id());
//! ```

mod identity;
mod store;

pub use identity::{IDENTITY_KEY, SessionContext, SessionId, get_or_create_session_id};
pub use store::{FileStore, IdentityStore, MemoryStore};
