//! Account and session domain service.
//!
//! Signup registers the account once and then tries to open a session up to
//! [`RetryPolicy::max_attempts`] times. Identity backends may take a moment
//! before a freshly created account accepts password logins, so failed login
//! attempts after a successful registration are expected and are not
//! surfaced as errors.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::port_errors::map_identity_error;
use crate::domain::ports::IdentityService;
use crate::domain::{
    Account, AuthenticatedSession, Credentials, Error, Registration, RetryPolicy, Session,
    Sleeper, TokioSleeper,
};

/// Message shown when an account was created but no session could be opened.
pub const REGISTERED_ONLY_MESSAGE: &str =
    "Account created, but auto login failed. Please log in manually.";

/// Result of [`AccountService::signup_and_login`].
#[derive(Debug, Clone, PartialEq)]
pub enum SignupOutcome {
    /// Account created and a session opened.
    Authenticated {
        /// Newly created account.
        account: Account,
        /// Session opened for it.
        session: Session,
        /// Login attempts used, including the successful one.
        attempts: u32,
    },
    /// Account created but every login attempt failed.
    RegisteredOnly {
        /// Newly created account.
        account: Account,
        /// Login attempts made.
        attempts: u32,
        /// Error from the final attempt.
        last_error: Error,
    },
}

impl SignupOutcome {
    /// Account created by the signup, whichever way login went.
    pub fn account(&self) -> &Account {
        match self {
            Self::Authenticated { account, .. } | Self::RegisteredOnly { account, .. } => account,
        }
    }

    /// Session, when auto-login succeeded.
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated { session, .. } => Some(session),
            Self::RegisteredOnly { .. } => None,
        }
    }

    /// Login attempts made.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Authenticated { attempts, .. } | Self::RegisteredOnly { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Account service backed by an [`IdentityService`].
pub struct AccountService<I: ?Sized> {
    identity: Arc<I>,
    sleeper: Arc<dyn Sleeper>,
    login_policy: RetryPolicy,
}

impl<I: ?Sized> Clone for AccountService<I> {
    fn clone(&self) -> Self {
        Self {
            identity: Arc::clone(&self.identity),
            sleeper: Arc::clone(&self.sleeper),
            login_policy: self.login_policy,
        }
    }
}

impl<I: ?Sized> AccountService<I> {
    /// Create a service with the default retry policy and a Tokio sleeper.
    pub fn new(identity: Arc<I>) -> Self {
        Self::with_runtime(identity, Arc::new(TokioSleeper), RetryPolicy::default())
    }

    /// Create a service with an explicit sleeper and login retry policy.
    pub fn with_runtime(
        identity: Arc<I>,
        sleeper: Arc<dyn Sleeper>,
        login_policy: RetryPolicy,
    ) -> Self {
        Self {
            identity,
            sleeper,
            login_policy,
        }
    }

    /// Retry policy applied to the auto-login after signup.
    pub fn login_policy(&self) -> RetryPolicy {
        self.login_policy
    }
}

impl<I> AccountService<I>
where
    I: IdentityService + ?Sized,
{
    /// Register an account and log it in.
    ///
    /// Registration is attempted exactly once and its failure is returned
    /// unchanged. Login is retried with a fixed pause between attempts and
    /// never after the last one; exhausting the attempts yields
    /// [`SignupOutcome::RegisteredOnly`] rather than an error.
    pub async fn signup_and_login(
        &self,
        registration: &Registration,
    ) -> Result<SignupOutcome, Error> {
        let account = self
            .identity
            .register(registration)
            .await
            .map_err(|err| map_identity_error(err, "register"))?;
        info!(account_id = %account.id(), "account registered");

        let max_attempts = self.login_policy.max_attempts();
        let mut attempt = 1;
        loop {
            let error = match self.identity.create_session(registration.credentials()).await {
                Ok(session) => {
                    info!(account_id = %account.id(), attempt, "auto login succeeded");
                    return Ok(SignupOutcome::Authenticated {
                        account,
                        session,
                        attempts: attempt,
                    });
                }
                Err(err) => map_identity_error(err, "create session"),
            };

            let Some(delay) = self.login_policy.delay_after(attempt) else {
                warn!(
                    account_id = %account.id(),
                    attempts = attempt,
                    error = %error,
                    "auto login failed; account left without a session"
                );
                return Ok(SignupOutcome::RegisteredOnly {
                    account,
                    attempts: attempt,
                    last_error: error,
                });
            };

            warn!(
                account_id = %account.id(),
                attempt,
                max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "auto login attempt failed; retrying"
            );
            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }

    /// Open a session with email and password and resolve its account.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthenticatedSession, Error> {
        let session = self
            .identity
            .create_session(credentials)
            .await
            .map_err(|err| map_identity_error(err, "create session"))?;
        let account = self.current_account(&session).await?;
        info!(account_id = %account.id(), "logged in");
        Ok(AuthenticatedSession { account, session })
    }

    /// Revoke every session of the account owning `session`.
    pub async fn logout(&self, session: &Session) -> Result<(), Error> {
        self.identity
            .delete_all_sessions(session)
            .await
            .map_err(|err| map_identity_error(err, "delete sessions"))?;
        info!(account_id = %session.account_id(), "logged out");
        Ok(())
    }

    /// Account `session` authenticates.
    pub async fn current_account(&self, session: &Session) -> Result<Account, Error> {
        self.identity
            .current_account(session)
            .await
            .map_err(|err| map_identity_error(err, "get account"))
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
