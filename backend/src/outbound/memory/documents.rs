//! Process-local document store.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mockable::DefaultClock;
use uuid::Uuid;

use super::SharedClock;
use crate::domain::ports::{
    Document, DocumentFields, DocumentFilter, DocumentStore, DocumentStoreError, NewDocument,
    NewDocumentId, Permission, Role,
};
use crate::domain::{DocumentId, UserId};

/// Store operation, used to count calls and inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Find,
    Get,
    Create,
    Update,
    Delete,
}

struct StoredDocument {
    document: Document,
    permissions: Vec<Permission>,
}

#[derive(Default)]
struct Collection {
    documents: Vec<StoredDocument>,
    calls: HashMap<StoreOperation, usize>,
    failures: HashMap<StoreOperation, VecDeque<DocumentStoreError>>,
}

/// Who a store handle acts as.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Principal {
    /// Writes are not checked.
    Unchecked,
    /// Writes must be granted by the document's permissions.
    Anonymous,
    User(UserId),
}

/// Document store kept in memory, in insertion order.
///
/// Handles created with [`InMemoryDocumentStore::acting_as`] share the same
/// documents and enforce per-document write permissions the way the hosted
/// store does.
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    collection: Arc<Mutex<Collection>>,
    clock: SharedClock,
    principal: Principal,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClock))
    }
}

impl InMemoryDocumentStore {
    /// Empty store stamping documents with `clock`.
    pub fn new(clock: SharedClock) -> Self {
        Self {
            collection: Arc::new(Mutex::new(Collection::default())),
            clock,
            principal: Principal::Unchecked,
        }
    }

    /// Handle over the same documents that writes as `user`, or anonymously
    /// when `user` is `None`.
    #[must_use]
    pub fn acting_as(&self, user: Option<&UserId>) -> Self {
        Self {
            principal: user.map_or(Principal::Anonymous, |id| Principal::User(id.clone())),
            ..self.clone()
        }
    }

    /// Queue `error` to be returned by the next call of `operation`.
    pub fn fail_next(&self, operation: StoreOperation, error: DocumentStoreError) {
        self.lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Number of calls of `operation` so far, including failed ones.
    pub fn calls(&self, operation: StoreOperation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or_default()
    }

    /// Snapshot of every stored document.
    pub fn documents(&self) -> Vec<Document> {
        self.lock()
            .documents
            .iter()
            .map(|stored| stored.document.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Collection> {
        self.collection
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn begin(
        &self,
        operation: StoreOperation,
    ) -> Result<MutexGuard<'_, Collection>, DocumentStoreError> {
        let mut collection = self.lock();
        *collection.calls.entry(operation).or_default() += 1;
        match collection
            .failures
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            Some(error) => Err(error),
            None => Ok(collection),
        }
    }

    fn ensure_write_access(&self, stored: &StoredDocument) -> Result<(), DocumentStoreError> {
        let role = match &self.principal {
            Principal::Unchecked => return Ok(()),
            Principal::Anonymous => Role::Any,
            Principal::User(id) => Role::User(id.clone()),
        };
        if stored
            .permissions
            .iter()
            .any(|permission| permission.grants_write_to(&role))
        {
            Ok(())
        } else {
            Err(DocumentStoreError::unauthorized(format!(
                "The current user is not authorized to perform the requested action on {}.",
                stored.document.id
            )))
        }
    }
}

fn position(collection: &Collection, id: &DocumentId) -> Option<usize> {
    collection
        .documents
        .iter()
        .position(|stored| stored.document.id == *id)
}

fn not_found(id: &DocumentId) -> DocumentStoreError {
    DocumentStoreError::not_found(format!(
        "Document with the requested ID {id} could not be found."
    ))
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find(&self, filter: &DocumentFilter) -> Result<Vec<Document>, DocumentStoreError> {
        let collection = self.begin(StoreOperation::Find)?;
        Ok(collection
            .documents
            .iter()
            .filter(|stored| filter.matches(&stored.document.fields))
            .map(|stored| stored.document.clone())
            .collect())
    }

    async fn get(&self, id: &DocumentId) -> Result<Option<Document>, DocumentStoreError> {
        let collection = self.begin(StoreOperation::Get)?;
        Ok(position(&collection, id).map(|index| collection.documents[index].document.clone()))
    }

    async fn create(&self, document: NewDocument) -> Result<Document, DocumentStoreError> {
        let mut collection = self.begin(StoreOperation::Create)?;
        if self.principal == Principal::Anonymous {
            return Err(DocumentStoreError::unauthorized(
                "The current user is not authorized to perform the requested action.",
            ));
        }
        let id = match document.id {
            NewDocumentId::Explicit(id) => id,
            NewDocumentId::Unique => unique_document_id()?,
        };
        if position(&collection, &id).is_some() {
            return Err(DocumentStoreError::conflict(format!(
                "Document with the requested ID {id} already exists."
            )));
        }
        let now = self.clock.utc();
        let stored = StoredDocument {
            document: Document {
                id,
                fields: document.fields,
                permissions: document
                    .permissions
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
                created_at: Some(now),
                updated_at: Some(now),
            },
            permissions: document.permissions,
        };
        let created = stored.document.clone();
        collection.documents.push(stored);
        Ok(created)
    }

    async fn update(
        &self,
        id: &DocumentId,
        fields: DocumentFields,
    ) -> Result<Document, DocumentStoreError> {
        let mut collection = self.begin(StoreOperation::Update)?;
        let index = position(&collection, id).ok_or_else(|| not_found(id))?;
        self.ensure_write_access(&collection.documents[index])?;
        let now = self.clock.utc();
        let document = &mut collection.documents[index].document;
        document.fields.extend(fields);
        document.updated_at = Some(now);
        Ok(document.clone())
    }

    async fn delete(&self, id: &DocumentId) -> Result<(), DocumentStoreError> {
        let mut collection = self.begin(StoreOperation::Delete)?;
        let index = position(&collection, id).ok_or_else(|| not_found(id))?;
        self.ensure_write_access(&collection.documents[index])?;
        collection.documents.remove(index);
        Ok(())
    }
}

/// Twenty hex characters, matching the hosted store's generated ids.
fn unique_document_id() -> Result<DocumentId, DocumentStoreError> {
    let raw = Uuid::new_v4().simple().to_string();
    DocumentId::new(raw.chars().take(20).collect::<String>())
        .map_err(|err| DocumentStoreError::decode(err.to_string()))
}
