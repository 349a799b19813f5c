//! DTOs for the Appwrite REST API.
//!
//! Responses decode into these transport shapes first and map into domain
//! values in one pass. System attributes carry a `$` prefix on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::ports::{Document, DocumentFields};
use crate::domain::{Account, DisplayName, DocumentId, EmailAddress, Session, UserId};

/// Error envelope returned with every non-2xx response.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorDto {
    pub(super) message: String,
    #[serde(rename = "type", default)]
    pub(super) error_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateAccountBody<'a> {
    pub(super) user_id: &'a str,
    pub(super) email: &'a str,
    pub(super) password: &'a str,
    pub(super) name: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct CreateSessionBody<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateDocumentBody<'a> {
    pub(super) document_id: &'a str,
    pub(super) data: &'a DocumentFields,
    pub(super) permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct UpdateDocumentBody<'a> {
    pub(super) data: &'a DocumentFields,
}

#[derive(Debug, Deserialize)]
pub(super) struct AccountDto {
    #[serde(rename = "$id")]
    pub(super) id: String,
    #[serde(rename = "$createdAt")]
    pub(super) created_at: DateTime<Utc>,
    pub(super) name: String,
    pub(super) email: String,
}

impl AccountDto {
    pub(super) fn into_domain(self) -> Result<Account, String> {
        let id = UserId::new(&self.id).map_err(|err| format!("account id `{}`: {err}", self.id))?;
        let email = EmailAddress::new(self.email).map_err(|err| format!("account email: {err}"))?;
        // Console-created accounts may have no name.
        let name = DisplayName::new(self.name)
            .or_else(|_| DisplayName::new(email.as_ref()))
            .map_err(|err| format!("account name: {err}"))?;
        Ok(Account::new(id, email, name, self.created_at))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SessionDto {
    #[serde(rename = "$id")]
    pub(super) id: String,
    pub(super) user_id: String,
    pub(super) expire: DateTime<Utc>,
    #[serde(default)]
    pub(super) secret: String,
}

impl SessionDto {
    /// Map into a domain session using `secret`, which the caller resolves
    /// from the body or the response cookies.
    pub(super) fn into_domain(self, secret: String) -> Result<Session, String> {
        let account_id = UserId::new(&self.user_id)
            .map_err(|err| format!("session user id `{}`: {err}", self.user_id))?;
        Ok(Session::new(self.id, account_id, secret, self.expire))
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct DocumentDto {
    #[serde(rename = "$id")]
    pub(super) id: String,
    #[serde(rename = "$permissions", default)]
    pub(super) permissions: Vec<String>,
    #[serde(rename = "$createdAt", default)]
    pub(super) created_at: Option<DateTime<Utc>>,
    #[serde(rename = "$updatedAt", default)]
    pub(super) updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub(super) fields: Map<String, Value>,
}

impl DocumentDto {
    pub(super) fn into_domain(self) -> Result<Document, String> {
        let id = DocumentId::new(&self.id).map_err(|err| format!("document id: {err}"))?;
        let fields = self
            .fields
            .into_iter()
            .filter(|(key, _)| !key.starts_with('$'))
            .collect();
        Ok(Document {
            id,
            fields,
            permissions: self.permissions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct DocumentListDto {
    pub(super) total: u64,
    #[serde(default)]
    pub(super) documents: Vec<DocumentDto>,
}
