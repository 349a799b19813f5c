//! Appwrite account API adapter for the identity port.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;

use super::client::{ApiFailure, AppwriteClient, FailureKind, session_secret_from_headers};
use super::dto::{AccountDto, CreateAccountBody, CreateSessionBody, SessionDto};
use crate::domain::ports::{IdentityService, IdentityServiceError};
use crate::domain::{Account, Credentials, Registration, Session, UserId};

/// Identity service adapter backed by the Appwrite account endpoints.
#[derive(Debug, Clone)]
pub struct AppwriteIdentityService {
    client: Arc<AppwriteClient>,
}

impl AppwriteIdentityService {
    /// Adapter over a shared client.
    pub fn new(client: Arc<AppwriteClient>) -> Self {
        Self { client }
    }
}

fn map_failure(failure: ApiFailure) -> IdentityServiceError {
    let ApiFailure { kind, message, .. } = failure;
    match kind {
        FailureKind::Transport => IdentityServiceError::transport(message),
        FailureKind::Timeout => IdentityServiceError::timeout(message),
        FailureKind::RateLimited => IdentityServiceError::rate_limited(message),
        FailureKind::Unauthorized => IdentityServiceError::unauthorized(message),
        FailureKind::Conflict => IdentityServiceError::account_exists(message),
        FailureKind::NotFound | FailureKind::Rejected => IdentityServiceError::rejected(message),
        FailureKind::Decode => IdentityServiceError::decode(message),
    }
}

/// Login failures arrive as 401 and mean the pair was not accepted.
fn map_login_failure(failure: ApiFailure) -> IdentityServiceError {
    match failure.kind {
        FailureKind::Unauthorized => IdentityServiceError::invalid_credentials(failure.message),
        _ => map_failure(failure),
    }
}

#[async_trait]
impl IdentityService for AppwriteIdentityService {
    async fn register(&self, registration: &Registration) -> Result<Account, IdentityServiceError> {
        let user_id = UserId::unique();
        let credentials = registration.credentials();
        let body = CreateAccountBody {
            user_id: user_id.as_ref(),
            email: credentials.email().as_ref(),
            password: credentials.password(),
            name: registration.name().as_ref(),
        };
        let request = self
            .client
            .request(Method::POST, &["account"], None)
            .map_err(map_failure)?
            .json(&body);
        let response = self
            .client
            .send_json::<AccountDto>(request)
            .await
            .map_err(map_failure)?;
        response
            .body
            .into_domain()
            .map_err(IdentityServiceError::decode)
    }

    async fn create_session(
        &self,
        credentials: &Credentials,
    ) -> Result<Session, IdentityServiceError> {
        let body = CreateSessionBody {
            email: credentials.email().as_ref(),
            password: credentials.password(),
        };
        let request = self
            .client
            .request(Method::POST, &["account", "sessions", "email"], None)
            .map_err(map_login_failure)?
            .json(&body);
        let response = self
            .client
            .send_json::<SessionDto>(request)
            .await
            .map_err(map_login_failure)?;

        let secret = if response.body.secret.is_empty() {
            session_secret_from_headers(&response.headers, self.client.project_id())
                .ok_or_else(|| IdentityServiceError::decode("session response carried no secret"))?
        } else {
            response.body.secret.clone()
        };
        response
            .body
            .into_domain(secret)
            .map_err(IdentityServiceError::decode)
    }

    async fn delete_all_sessions(&self, session: &Session) -> Result<(), IdentityServiceError> {
        let request = self
            .client
            .request(Method::DELETE, &["account", "sessions"], Some(session.secret()))
            .map_err(map_failure)?;
        self.client.send_empty(request).await.map_err(map_failure)
    }

    async fn current_account(&self, session: &Session) -> Result<Account, IdentityServiceError> {
        let request = self
            .client
            .request(Method::GET, &["account"], Some(session.secret()))
            .map_err(map_failure)?;
        let response = self
            .client
            .send_json::<AccountDto>(request)
            .await
            .map_err(map_failure)?;
        response
            .body
            .into_domain()
            .map_err(IdentityServiceError::decode)
    }
}
