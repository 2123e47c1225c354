//! Session identity generation and lookup.

use std::fmt;

use rand::Rng;
use tracing::{info, warn};

use super::store::IdentityStore;
use crate::render::RenderSink;

/// Key under which the identity is persisted in the profile store.
pub const IDENTITY_KEY: &str = "rag_username";

const IDENTITY_PREFIX: &str = "User_";

/// Exclusive upper bound of the numeric identity suffix.
const IDENTITY_RANGE: u32 = 10_000;

/// Opaque per-profile identity sent as `X-User-ID`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh `User_<0..9999>` identity.
    pub fn generate() -> Self {
        let n = rand::thread_rng().gen_range(0..IDENTITY_RANGE);
        Self(format!("{IDENTITY_PREFIX}{n}"))
    }

    /// Wrap a previously stored value verbatim.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identity has the shape the client generates.
    pub fn is_generated_form(&self) -> bool {
        self.0
            .strip_prefix(IDENTITY_PREFIX)
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<u32>().ok())
            .is_some_and(|n| n < IDENTITY_RANGE)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-run session state threaded through every client call.
#[derive(Debug, Clone)]
pub struct SessionContext {
    id: SessionId,
}

impl SessionContext {
    pub fn new(id: SessionId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }
}

/// Read the stored identity, creating and storing one if absent, and show it.
///
/// Never fails: if the store cannot be written the fresh identity is still
/// used for this run.
pub fn get_or_create_session_id(store: &dyn IdentityStore, sink: &dyn RenderSink) -> SessionContext {
    let id = if let Some(stored) = store.get(IDENTITY_KEY) {
        SessionId::from_stored(stored)
    } else {
        let id = SessionId::generate();
        match store.set(IDENTITY_KEY, id.as_str()) {
            Ok(()) => info!(name: "session.created", user_id = %id, "Session identity created"),
            Err(e) => warn!(
                name: "session.persist_failed",
                user_id = %id,
                error = %e,
                "Could not persist session identity"
            ),
        }
        id
    };

    sink.show_identity(&id);
    SessionContext::new(id)
}
