//! In-memory adapters.
//!
//! Process-local implementations of the identity and document store ports
//! for tests and offline runs. State lives behind a shared mutex, so clones
//! observe the same accounts and documents.

use std::sync::Arc;

use mockable::Clock;

mod documents;
mod identity;

pub use documents::{InMemoryDocumentStore, StoreOperation};
pub use identity::{IdentityOperation, InMemoryIdentityService};

/// Clock shared by the in-memory adapters.
pub type SharedClock = Arc<dyn Clock + Send + Sync>;
