//! Skill exchange client library.
//!
//! Members publish a profile listing the skills they can teach and the
//! skills they want to learn, backed by a hosted identity service and
//! document store. The crate follows a hexagonal layout:
//!
//! - [`domain`]: model, ports and services.
//! - [`outbound`]: Appwrite REST adapters and in-memory adapters.
//! - [`inbound`]: the `skillx` command-line surface.
//! - [`config`]: layered settings.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
