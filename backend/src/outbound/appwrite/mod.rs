//! Appwrite outbound adapters.
//!
//! Thin reqwest implementations of the identity and document store ports
//! against the Appwrite REST API (v1).

mod client;
mod documents;
mod dto;
mod identity;

pub use client::{AppwriteClient, AppwriteConnection};
pub use documents::AppwriteDocumentStore;
pub use identity::AppwriteIdentityService;
