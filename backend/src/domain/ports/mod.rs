//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod document_store;
mod identity_service;

#[cfg(test)]
pub use document_store::MockDocumentStore;
pub use document_store::{
    Document, DocumentFields, DocumentFilter, DocumentStore, DocumentStoreError, FieldEquals,
    NewDocument, NewDocumentId, Permission, Role,
};
#[cfg(test)]
pub use identity_service::MockIdentityService;
pub use identity_service::{IdentityService, IdentityServiceError};
