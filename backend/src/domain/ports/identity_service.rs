//! Driven port for the identity and session service.
//!
//! Sessions are passed explicitly on every authenticated call so that no
//! adapter has to hold an ambient "current user".

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{Account, Credentials, Registration, Session};

define_port_error! {
    /// Errors surfaced by identity service adapters.
    pub enum IdentityServiceError {
        /// Network transport failed before a response arrived.
        Transport { message: String } => "identity service transport failed: {message}",
        /// The call exceeded its timeout.
        Timeout { message: String } => "identity service timeout: {message}",
        /// The service rate-limited the caller.
        RateLimited { message: String } => "identity service rate limited request: {message}",
        /// Email/password pair was not accepted.
        InvalidCredentials { message: String } => "invalid credentials: {message}",
        /// An account with the same id or email already exists.
        AccountExists { message: String } => "account already exists: {message}",
        /// Session missing, expired or revoked.
        Unauthorized { message: String } => "identity service denied access: {message}",
        /// The service rejected the request as invalid.
        Rejected { message: String } => "identity service rejected request: {message}",
        /// The response could not be decoded.
        Decode { message: String } => "identity service response decode failed: {message}",
    }
}

impl IdentityServiceError {
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
            | Self::InvalidCredentials { message }
            | Self::AccountExists { message }
            | Self::Unauthorized { message }
            | Self::Rejected { message }
            | Self::Decode { message } => message.as_str(),
        }
    }
}

/// Port for account registration and session management.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Create a new account.
    async fn register(&self, registration: &Registration) -> Result<Account, IdentityServiceError>;

    /// Open an email/password session.
    async fn create_session(
        &self,
        credentials: &Credentials,
    ) -> Result<Session, IdentityServiceError>;

    /// Revoke every session of the account owning `session`.
    async fn delete_all_sessions(&self, session: &Session) -> Result<(), IdentityServiceError>;

    /// Resolve the account `session` authenticates.
    async fn current_account(&self, session: &Session) -> Result<Account, IdentityServiceError>;
}
