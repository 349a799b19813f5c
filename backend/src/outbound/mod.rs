//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **appwrite**: the hosted identity service and document store
//! - **memory**: process-local stand-ins used by tests and offline runs
//!
//! Adapters are thin translators between domain types and the backend's
//! representation. They contain no business logic.

pub mod appwrite;
pub mod memory;
