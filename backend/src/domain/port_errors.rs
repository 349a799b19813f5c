//! Translation of port errors into domain errors.
//!
//! The upstream message is kept verbatim so that users see what the backend
//! said; the port error kind and transient flag travel in `details`.

use serde_json::json;

use crate::domain::ports::{DocumentStoreError, IdentityServiceError};
use crate::domain::{Error, ErrorCode};

pub(crate) fn map_document_store_error(error: DocumentStoreError, action: &str) -> Error {
    let code = match &error {
        DocumentStoreError::Transport { .. }
        | DocumentStoreError::Timeout { .. }
        | DocumentStoreError::RateLimited { .. } => ErrorCode::ServiceUnavailable,
        DocumentStoreError::Unauthorized { .. } => ErrorCode::Unauthorized,
        DocumentStoreError::NotFound { .. } => ErrorCode::NotFound,
        DocumentStoreError::Conflict { .. } => ErrorCode::Conflict,
        DocumentStoreError::Rejected { .. } => ErrorCode::InvalidRequest,
        DocumentStoreError::Decode { .. } => ErrorCode::InternalError,
    };
    Error::from_upstream(code, error.message(), &error).with_details(json!({
        "code": error.kind(),
        "transient": error.is_transient(),
        "action": action,
    }))
}

pub(crate) fn map_identity_error(error: IdentityServiceError, action: &str) -> Error {
    let code = match &error {
        IdentityServiceError::Transport { .. }
        | IdentityServiceError::Timeout { .. }
        | IdentityServiceError::RateLimited { .. } => ErrorCode::ServiceUnavailable,
        IdentityServiceError::InvalidCredentials { .. }
        | IdentityServiceError::Unauthorized { .. } => ErrorCode::Unauthorized,
        IdentityServiceError::AccountExists { .. } => ErrorCode::Conflict,
        IdentityServiceError::Rejected { .. } => ErrorCode::InvalidRequest,
        IdentityServiceError::Decode { .. } => ErrorCode::InternalError,
    };
    Error::from_upstream(code, error.message(), &error).with_details(json!({
        "code": error.kind(),
        "transient": error.is_transient(),
        "action": action,
    }))
}
