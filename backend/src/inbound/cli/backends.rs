//! Adapter wiring for the CLI.

use std::sync::Arc;

use crate::config::{ConfigError, SkillExchangeSettings};
use crate::domain::Session;
use crate::domain::ports::{DocumentStore, IdentityService};
use crate::outbound::appwrite::{AppwriteClient, AppwriteDocumentStore, AppwriteIdentityService};
use crate::outbound::memory::{InMemoryDocumentStore, InMemoryIdentityService, SharedClock};

/// Source of the port implementations a command runs against.
pub trait CliBackend: Send + Sync {
    /// Identity service.
    fn identity(&self) -> Arc<dyn IdentityService>;

    /// Document store acting as `session`, or anonymously.
    fn documents(&self, session: Option<&Session>) -> Arc<dyn DocumentStore>;
}

/// Hosted Appwrite backend.
pub struct AppwriteBackend {
    identity: Arc<AppwriteIdentityService>,
    documents: AppwriteDocumentStore,
}

/// Errors raised while building the Appwrite backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl AppwriteBackend {
    /// Build the adapters from `settings`.
    pub fn from_settings(settings: &SkillExchangeSettings) -> Result<Self, BackendError> {
        let client = Arc::new(AppwriteClient::new(
            settings.appwrite_connection()?,
            settings.request_timeout(),
        )?);
        Ok(Self {
            identity: Arc::new(AppwriteIdentityService::new(Arc::clone(&client))),
            documents: AppwriteDocumentStore::new(
                client,
                settings.database_id()?,
                settings.collection_id()?,
            ),
        })
    }
}

impl CliBackend for AppwriteBackend {
    fn identity(&self) -> Arc<dyn IdentityService> {
        self.identity.clone()
    }

    fn documents(&self, session: Option<&Session>) -> Arc<dyn DocumentStore> {
        match session {
            Some(session) => Arc::new(self.documents.with_session(session)),
            None => Arc::new(self.documents.clone()),
        }
    }
}

/// Process-local backend; state lasts for the life of the value.
#[derive(Clone)]
pub struct MemoryBackend {
    identity: InMemoryIdentityService,
    documents: InMemoryDocumentStore,
}

impl MemoryBackend {
    /// Empty backend whose adapters share `clock`.
    pub fn new(clock: SharedClock) -> Self {
        Self {
            identity: InMemoryIdentityService::new(Arc::clone(&clock)),
            documents: InMemoryDocumentStore::new(clock),
        }
    }

    /// Shared identity service, for seeding and inspection.
    pub fn identity_service(&self) -> &InMemoryIdentityService {
        &self.identity
    }

    /// Shared document store, for seeding and inspection.
    pub fn document_store(&self) -> &InMemoryDocumentStore {
        &self.documents
    }
}

impl CliBackend for MemoryBackend {
    fn identity(&self) -> Arc<dyn IdentityService> {
        Arc::new(self.identity.clone())
    }

    fn documents(&self, session: Option<&Session>) -> Arc<dyn DocumentStore> {
        Arc::new(
            self.documents
                .acting_as(session.map(Session::account_id)),
        )
    }
}
