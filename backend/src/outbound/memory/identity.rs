//! Process-local identity service.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::DefaultClock;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::SharedClock;
use crate::domain::ports::{IdentityService, IdentityServiceError};
use crate::domain::{Account, Credentials, Registration, Session, UserId};

const PASSWORD_MIN_CHARS: usize = 8;
const SESSION_TTL_DAYS: i64 = 365;
const INVALID_CREDENTIALS: &str = "Invalid credentials. Please check the email and password.";

/// Identity operation, used to count calls and inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityOperation {
    Register,
    CreateSession,
    DeleteSessions,
    CurrentAccount,
}

struct AccountRecord {
    account: Account,
    password: Zeroizing<String>,
    login_ready_at: DateTime<Utc>,
}

#[derive(Default)]
struct Directory {
    accounts: Vec<AccountRecord>,
    sessions: HashMap<String, Session>,
    calls: HashMap<IdentityOperation, usize>,
    failures: HashMap<IdentityOperation, VecDeque<IdentityServiceError>>,
}

impl Directory {
    fn session_for(
        &self,
        secret: &str,
        now: DateTime<Utc>,
    ) -> Result<&Session, IdentityServiceError> {
        self.sessions
            .get(secret)
            .filter(|session| !session.is_expired_at(now))
            .ok_or_else(|| {
                IdentityServiceError::unauthorized(
                    "User (role: guests) missing scope (account)",
                )
            })
    }
}

/// Identity service kept in memory.
///
/// A login delay makes freshly registered accounts refuse password logins
/// until the delay has elapsed on the injected clock, reproducing the
/// propagation lag of hosted identity backends.
#[derive(Clone)]
pub struct InMemoryIdentityService {
    directory: Arc<Mutex<Directory>>,
    clock: SharedClock,
    login_delay: Duration,
}

impl Default for InMemoryIdentityService {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClock))
    }
}

impl InMemoryIdentityService {
    /// Empty directory reading time from `clock`.
    pub fn new(clock: SharedClock) -> Self {
        Self {
            directory: Arc::new(Mutex::new(Directory::default())),
            clock,
            login_delay: Duration::ZERO,
        }
    }

    /// Refuse logins for `delay` after each registration.
    #[must_use]
    pub fn with_login_delay(mut self, delay: Duration) -> Self {
        self.login_delay = delay;
        self
    }

    /// Queue `error` to be returned by the next call of `operation`.
    pub fn fail_next(&self, operation: IdentityOperation, error: IdentityServiceError) {
        self.lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Number of calls of `operation` so far, including failed ones.
    pub fn calls(&self, operation: IdentityOperation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or_default()
    }

    /// Number of live sessions across all accounts.
    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }

    fn lock(&self) -> MutexGuard<'_, Directory> {
        self.directory
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn begin(
        &self,
        operation: IdentityOperation,
    ) -> Result<MutexGuard<'_, Directory>, IdentityServiceError> {
        let mut directory = self.lock();
        *directory.calls.entry(operation).or_default() += 1;
        match directory
            .failures
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            Some(error) => Err(error),
            None => Ok(directory),
        }
    }
}

fn random_token() -> String {
    Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl IdentityService for InMemoryIdentityService {
    async fn register(&self, registration: &Registration) -> Result<Account, IdentityServiceError> {
        let mut directory = self.begin(IdentityOperation::Register)?;
        let credentials = registration.credentials();
        if credentials.password().chars().count() < PASSWORD_MIN_CHARS {
            return Err(IdentityServiceError::rejected(format!(
                "Invalid `password` param: Password must be at least {PASSWORD_MIN_CHARS} characters"
            )));
        }
        let email = credentials.email().as_ref();
        if directory
            .accounts
            .iter()
            .any(|record| record.account.email().as_ref().eq_ignore_ascii_case(email))
        {
            return Err(IdentityServiceError::account_exists(
                "A user with the same id, email, or phone already exists in this project.",
            ));
        }

        let now = self.clock.utc();
        let login_delay = TimeDelta::from_std(self.login_delay)
            .map_err(|err| IdentityServiceError::rejected(format!("login delay: {err}")))?;
        let account = Account::new(
            UserId::unique(),
            credentials.email().clone(),
            registration.name().clone(),
            now,
        );
        directory.accounts.push(AccountRecord {
            account: account.clone(),
            password: Zeroizing::new(credentials.password().to_owned()),
            login_ready_at: now + login_delay,
        });
        Ok(account)
    }

    async fn create_session(
        &self,
        credentials: &Credentials,
    ) -> Result<Session, IdentityServiceError> {
        let mut directory = self.begin(IdentityOperation::CreateSession)?;
        let now = self.clock.utc();
        let account_id = directory
            .accounts
            .iter()
            .find(|record| {
                record
                    .account
                    .email()
                    .as_ref()
                    .eq_ignore_ascii_case(credentials.email().as_ref())
                    && record.password.as_str() == credentials.password()
                    && now >= record.login_ready_at
            })
            .map(|record| record.account.id().clone())
            .ok_or_else(|| IdentityServiceError::invalid_credentials(INVALID_CREDENTIALS))?;

        let session = Session::new(
            random_token(),
            account_id,
            random_token(),
            now + TimeDelta::days(SESSION_TTL_DAYS),
        );
        directory
            .sessions
            .insert(session.secret().to_owned(), session.clone());
        Ok(session)
    }

    async fn delete_all_sessions(&self, session: &Session) -> Result<(), IdentityServiceError> {
        let mut directory = self.begin(IdentityOperation::DeleteSessions)?;
        let account_id = directory
            .session_for(session.secret(), self.clock.utc())?
            .account_id()
            .clone();
        directory
            .sessions
            .retain(|_, live| *live.account_id() != account_id);
        Ok(())
    }

    async fn current_account(&self, session: &Session) -> Result<Account, IdentityServiceError> {
        let directory = self.begin(IdentityOperation::CurrentAccount)?;
        let account_id = directory
            .session_for(session.secret(), self.clock.utc())?
            .account_id();
        directory
            .accounts
            .iter()
            .find(|record| record.account.id() == account_id)
            .map(|record| record.account.clone())
            .ok_or_else(|| IdentityServiceError::unauthorized("account no longer exists"))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the in-memory identity service.
    use super::*;
    use crate::test_support::{MutableClock, fixtures};
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn registered_accounts_can_log_in() {
        let identity = InMemoryIdentityService::default();
        let registration = fixtures::registration();
        let account = identity.register(&registration).await.expect("register");

        let session = identity
            .create_session(registration.credentials())
            .await
            .expect("login");
        assert_eq!(session.account_id(), account.id());
        assert_eq!(
            identity.current_account(&session).await.expect("account"),
            account
        );
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_emails_are_rejected() {
        let identity = InMemoryIdentityService::default();
        identity
            .register(&fixtures::registration())
            .await
            .expect("first registration");
        let again = Registration::try_from_parts("Ada Two", "ADA@example.com", "another secret")
            .expect("registration");

        let err = identity.register(&again).await.expect_err("duplicate");
        assert!(matches!(err, IdentityServiceError::AccountExists { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn short_passwords_are_rejected() {
        let identity = InMemoryIdentityService::default();
        let registration =
            Registration::try_from_parts("Ada", "ada@example.com", "short").expect("registration");

        let err = identity.register(&registration).await.expect_err("short");
        assert!(matches!(err, IdentityServiceError::Rejected { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn logins_wait_for_the_propagation_delay() {
        let clock = Arc::new(MutableClock::new(Utc::now()));
        let identity = InMemoryIdentityService::new(clock.clone())
            .with_login_delay(Duration::from_millis(1_500));
        let registration = fixtures::registration();
        identity.register(&registration).await.expect("register");

        let early = identity.create_session(registration.credentials()).await;
        assert!(matches!(
            early,
            Err(IdentityServiceError::InvalidCredentials { .. })
        ));

        clock.advance(Duration::from_millis(1_500));
        identity
            .create_session(registration.credentials())
            .await
            .expect("login after delay");
        assert_eq!(identity.calls(IdentityOperation::CreateSession), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn logout_revokes_every_session_of_the_account() {
        let identity = InMemoryIdentityService::default();
        let registration = fixtures::registration();
        identity.register(&registration).await.expect("register");
        let first = identity
            .create_session(registration.credentials())
            .await
            .expect("first");
        let second = identity
            .create_session(registration.credentials())
            .await
            .expect("second");
        assert_eq!(identity.session_count(), 2);

        identity.delete_all_sessions(&first).await.expect("logout");

        assert_eq!(identity.session_count(), 0);
        assert!(matches!(
            identity.current_account(&second).await,
            Err(IdentityServiceError::Unauthorized { .. })
        ));
    }
}
