//! Appwrite databases API adapter for the document store port.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use zeroize::Zeroizing;

use super::client::{ApiFailure, AppwriteClient, FailureKind};
use super::dto::{CreateDocumentBody, DocumentDto, DocumentListDto, UpdateDocumentBody};
use crate::domain::ports::{
    Document, DocumentFields, DocumentFilter, DocumentStore, DocumentStoreError, NewDocument,
    NewDocumentId,
};
use crate::domain::{DocumentId, Session};

/// Page size used when listing documents.
const LIST_PAGE_SIZE: u64 = 100;

/// Document store adapter bound to one database collection.
///
/// Reads work anonymously when the collection grants `read("any")`; writes
/// need a store returned by [`AppwriteDocumentStore::with_session`].
#[derive(Clone)]
pub struct AppwriteDocumentStore {
    client: Arc<AppwriteClient>,
    database_id: String,
    collection_id: String,
    session: Option<Zeroizing<String>>,
}

impl AppwriteDocumentStore {
    /// Anonymous store for `database_id`/`collection_id`.
    pub fn new(
        client: Arc<AppwriteClient>,
        database_id: impl Into<String>,
        collection_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            database_id: database_id.into(),
            collection_id: collection_id.into(),
            session: None,
        }
    }

    /// Copy of this store that authenticates as `session`.
    #[must_use]
    pub fn with_session(&self, session: &Session) -> Self {
        Self {
            session: Some(Zeroizing::new(session.secret().to_owned())),
            ..self.clone()
        }
    }

    fn documents_path<'a>(&'a self, id: Option<&'a str>) -> Vec<&'a str> {
        let mut path = vec![
            "databases",
            self.database_id.as_str(),
            "collections",
            self.collection_id.as_str(),
            "documents",
        ];
        path.extend(id);
        path
    }

    fn session(&self) -> Option<&str> {
        self.session.as_deref().map(String::as_str)
    }

    async fn list_page(
        &self,
        filter: &DocumentFilter,
        offset: u64,
    ) -> Result<DocumentListDto, DocumentStoreError> {
        let request = self
            .client
            .request(Method::GET, &self.documents_path(None), self.session())
            .map_err(map_failure)?
            .query(&encode_queries(filter, offset));
        self.client
            .send_json::<DocumentListDto>(request)
            .await
            .map(|response| response.body)
            .map_err(map_failure)
    }
}

impl std::fmt::Debug for AppwriteDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppwriteDocumentStore")
            .field("database_id", &self.database_id)
            .field("collection_id", &self.collection_id)
            .field("authenticated", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

/// Render `filter` plus paging as `queries[]` parameters in Appwrite's JSON
/// query syntax.
fn encode_queries(filter: &DocumentFilter, offset: u64) -> Vec<(&'static str, String)> {
    filter
        .conditions()
        .iter()
        .map(|condition| {
            json!({
                "method": "equal",
                "attribute": condition.attribute,
                "values": condition.values,
            })
        })
        .chain([
            json!({ "method": "limit", "values": [LIST_PAGE_SIZE] }),
            json!({ "method": "offset", "values": [offset] }),
        ])
        .map(|query| ("queries[]", query.to_string()))
        .collect()
}

fn map_failure(failure: ApiFailure) -> DocumentStoreError {
    let ApiFailure { kind, message, .. } = failure;
    match kind {
        FailureKind::Transport => DocumentStoreError::transport(message),
        FailureKind::Timeout => DocumentStoreError::timeout(message),
        FailureKind::RateLimited => DocumentStoreError::rate_limited(message),
        FailureKind::Unauthorized => DocumentStoreError::unauthorized(message),
        FailureKind::NotFound => DocumentStoreError::not_found(message),
        FailureKind::Conflict => DocumentStoreError::conflict(message),
        FailureKind::Rejected => DocumentStoreError::rejected(message),
        FailureKind::Decode => DocumentStoreError::decode(message),
    }
}

fn decode(dto: DocumentDto) -> Result<Document, DocumentStoreError> {
    dto.into_domain().map_err(DocumentStoreError::decode)
}

#[async_trait]
impl DocumentStore for AppwriteDocumentStore {
    async fn find(&self, filter: &DocumentFilter) -> Result<Vec<Document>, DocumentStoreError> {
        let mut documents = Vec::new();
        loop {
            let offset = documents.len() as u64;
            let page = self.list_page(filter, offset).await?;
            let received = page.documents.len();
            for dto in page.documents {
                documents.push(decode(dto)?);
            }
            if received == 0 || documents.len() as u64 >= page.total {
                return Ok(documents);
            }
        }
    }

    async fn get(&self, id: &DocumentId) -> Result<Option<Document>, DocumentStoreError> {
        let request = self
            .client
            .request(
                Method::GET,
                &self.documents_path(Some(id.as_ref())),
                self.session(),
            )
            .map_err(map_failure)?;
        match self.client.send_json::<DocumentDto>(request).await {
            Ok(response) => decode(response.body).map(Some),
            Err(failure) if failure.kind == FailureKind::NotFound => Ok(None),
            Err(failure) => Err(map_failure(failure)),
        }
    }

    async fn create(&self, document: NewDocument) -> Result<Document, DocumentStoreError> {
        let document_id = match &document.id {
            NewDocumentId::Unique => "unique()",
            NewDocumentId::Explicit(id) => id.as_ref(),
        };
        let body = CreateDocumentBody {
            document_id,
            data: &document.fields,
            permissions: document
                .permissions
                .iter()
                .map(ToString::to_string)
                .collect(),
        };
        let request = self
            .client
            .request(Method::POST, &self.documents_path(None), self.session())
            .map_err(map_failure)?
            .json(&body);
        let response = self
            .client
            .send_json::<DocumentDto>(request)
            .await
            .map_err(map_failure)?;
        decode(response.body)
    }

    async fn update(
        &self,
        id: &DocumentId,
        fields: DocumentFields,
    ) -> Result<Document, DocumentStoreError> {
        let request = self
            .client
            .request(
                Method::PATCH,
                &self.documents_path(Some(id.as_ref())),
                self.session(),
            )
            .map_err(map_failure)?
            .json(&UpdateDocumentBody { data: &fields });
        let response = self
            .client
            .send_json::<DocumentDto>(request)
            .await
            .map_err(map_failure)?;
        decode(response.body)
    }

    async fn delete(&self, id: &DocumentId) -> Result<(), DocumentStoreError> {
        let request = self
            .client
            .request(
                Method::DELETE,
                &self.documents_path(Some(id.as_ref())),
                self.session(),
            )
            .map_err(map_failure)?;
        self.client.send_empty(request).await.map_err(map_failure)
    }
}
