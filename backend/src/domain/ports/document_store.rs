//! Driven port for the backend document store.
//!
//! The store persists schemaless JSON documents inside one database and
//! collection chosen by the adapter's configuration. The domain owns the
//! request shapes; adapters own transport, encoding and access enforcement.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::define_port_error;
use crate::domain::{DocumentId, UserId};

/// Attribute map stored in a document.
pub type DocumentFields = Map<String, Value>;

/// Principal an access rule applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Anyone, including unauthenticated readers.
    Any,
    /// A single account.
    User(UserId),
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}

/// Per-document access rule.
///
/// Renders in the store's permission syntax:
///
/// ```
/// use skill_exchange::domain::UserId;
/// use skill_exchange::domain::ports::{Permission, Role};
///
/// let owner = UserId::new("abc123").unwrap();
/// assert_eq!(Permission::Read(Role::Any).to_string(), r#"read("any")"#);
/// assert_eq!(Permission::Update(Role::User(owner)).to_string(), r#"update("user:abc123")"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    /// Role may read the document.
    Read(Role),
    /// Role may update the document.
    Update(Role),
    /// Role may delete the document.
    Delete(Role),
}

impl Permission {
    /// Public read plus owner-only update and delete.
    pub fn public_read_owner_write(owner: &UserId) -> Vec<Self> {
        vec![
            Self::Read(Role::Any),
            Self::Update(Role::User(owner.clone())),
            Self::Delete(Role::User(owner.clone())),
        ]
    }

    /// Whether `role` is granted write access (update or delete) by this rule.
    pub fn grants_write_to(&self, role: &Role) -> bool {
        match self {
            Self::Read(_) => false,
            Self::Update(granted) | Self::Delete(granted) => {
                granted == role || *granted == Role::Any
            }
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (action, role) = match self {
            Self::Read(role) => ("read", role),
            Self::Update(role) => ("update", role),
            Self::Delete(role) => ("delete", role),
        };
        write!(f, "{action}(\"{role}\")")
    }
}

/// One `attribute == any of values` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEquals {
    /// Attribute name.
    pub attribute: String,
    /// Accepted values.
    pub values: Vec<Value>,
}

/// Conjunction of equality conditions. Empty filters match every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    conditions: Vec<FieldEquals>,
}

impl DocumentFilter {
    /// Filter matching every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Add an equality condition.
    ///
    /// ```
    /// use skill_exchange::domain::ports::DocumentFilter;
    ///
    /// let filter = DocumentFilter::all().equal("userId", "abc");
    /// assert_eq!(filter.conditions().len(), 1);
    /// ```
    #[must_use]
    pub fn equal(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(FieldEquals {
            attribute: attribute.into(),
            values: vec![value.into()],
        });
        self
    }

    /// Conditions in insertion order.
    pub fn conditions(&self) -> &[FieldEquals] {
        &self.conditions
    }

    /// Evaluate the filter against a field map.
    pub fn matches(&self, fields: &DocumentFields) -> bool {
        self.conditions.iter().all(|condition| {
            fields
                .get(&condition.attribute)
                .is_some_and(|value| condition.values.contains(value))
        })
    }
}

/// Identifier choice for a new document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewDocumentId {
    /// Let the adapter generate a unique id.
    Unique,
    /// Use the caller-provided id.
    Explicit(DocumentId),
}

/// Create request passed to [`DocumentStore::create`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    /// Identifier strategy.
    pub id: NewDocumentId,
    /// Initial attributes.
    pub fields: DocumentFields,
    /// Access rules attached at creation.
    pub permissions: Vec<Permission>,
}

/// Stored document as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Store-assigned identifier.
    pub id: DocumentId,
    /// User attributes (system attributes stripped).
    pub fields: DocumentFields,
    /// Access rules in the store's permission syntax.
    pub permissions: Vec<String>,
    /// Creation timestamp, when reported.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp, when reported.
    pub updated_at: Option<DateTime<Utc>>,
}

define_port_error! {
    /// Errors surfaced by document store adapters.
    pub enum DocumentStoreError {
        /// Network transport failed before a response arrived.
        Transport { message: String } => "document store transport failed: {message}",
        /// The call exceeded its timeout.
        Timeout { message: String } => "document store timeout: {message}",
        /// The store rate-limited the caller.
        RateLimited { message: String } => "document store rate limited request: {message}",
        /// The caller lacks a session or the permission for this document.
        Unauthorized { message: String } => "document store denied access: {message}",
        /// The addressed document does not exist.
        NotFound { message: String } => "document not found: {message}",
        /// A document with the same id already exists.
        Conflict { message: String } => "document conflict: {message}",
        /// The store rejected the request as invalid.
        Rejected { message: String } => "document store rejected request: {message}",
        /// The response could not be decoded.
        Decode { message: String } => "document store response decode failed: {message}",
    }
}

impl DocumentStoreError {
    /// Whether the failure is expected to clear on its own.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }

    /// Upstream message without the adapter prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message }
            | Self::Timeout { message }
            | Self::RateLimited { message }
            | Self::Unauthorized { message }
            | Self::NotFound { message }
            | Self::Conflict { message }
            | Self::Rejected { message }
            | Self::Decode { message } => message.as_str(),
        }
    }
}

/// Port for the profile document collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List documents matching `filter`.
    async fn find(&self, filter: &DocumentFilter) -> Result<Vec<Document>, DocumentStoreError>;

    /// Fetch one document; `Ok(None)` when it does not exist.
    async fn get(&self, id: &DocumentId) -> Result<Option<Document>, DocumentStoreError>;

    /// Create a document with access rules.
    async fn create(&self, document: NewDocument) -> Result<Document, DocumentStoreError>;

    /// Merge `fields` into an existing document.
    async fn update(
        &self,
        id: &DocumentId,
        fields: DocumentFields,
    ) -> Result<Document, DocumentStoreError>;

    /// Delete a document.
    async fn delete(&self, id: &DocumentId) -> Result<(), DocumentStoreError>;
}
