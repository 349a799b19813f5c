//! Tests for the account service.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{IdentityServiceError, MockIdentityService};
use crate::domain::{DisplayName, EmailAddress, ErrorCode, UserId};
use crate::test_support::RecordingSleeper;

#[fixture]
fn registration() -> Registration {
    Registration::try_from_parts("Ada", "ada@example.com", "correct horse").expect("registration")
}

fn account() -> Account {
    Account::new(
        UserId::new("acc123").expect("id"),
        EmailAddress::new("ada@example.com").expect("email"),
        DisplayName::new("Ada").expect("name"),
        Utc::now(),
    )
}

fn session() -> Session {
    Session::new(
        "sess1",
        UserId::new("acc123").expect("id"),
        "secret-token",
        Utc::now() + TimeDelta::days(365),
    )
}

/// Succeed on login attempt `succeed_on`; `None` fails every attempt.
fn login_attempts(identity: &mut MockIdentityService, expected: usize, succeed_on: Option<u32>) {
    let calls = Arc::new(AtomicU32::new(0));
    identity
        .expect_create_session()
        .withf(|credentials| credentials.email().as_ref() == "ada@example.com")
        .times(expected)
        .returning(move |_| {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if succeed_on == Some(attempt) {
                Ok(session())
            } else {
                Err(IdentityServiceError::invalid_credentials(
                    "Invalid credentials. Please check the email and password.",
                ))
            }
        });
}

fn service(
    identity: MockIdentityService,
    sleeper: Arc<RecordingSleeper>,
) -> AccountService<MockIdentityService> {
    AccountService::with_runtime(
        Arc::new(identity),
        sleeper,
        RetryPolicy::fixed(3, Duration::from_secs(1)),
    )
}

#[rstest]
#[case(Some(1), 1, 0)]
#[case(Some(2), 2, 1)]
#[case(Some(3), 3, 2)]
#[tokio::test]
async fn signup_logs_in_within_the_attempt_budget(
    registration: Registration,
    #[case] succeed_on: Option<u32>,
    #[case] expected_calls: usize,
    #[case] expected_sleeps: usize,
) {
    let mut identity = MockIdentityService::new();
    identity
        .expect_register()
        .times(1)
        .return_once(|_| Ok(account()));
    login_attempts(&mut identity, expected_calls, succeed_on);
    let sleeper = Arc::new(RecordingSleeper::default());

    let outcome = service(identity, Arc::clone(&sleeper))
        .signup_and_login(&registration)
        .await
        .expect("signup succeeds");

    let SignupOutcome::Authenticated {
        account, attempts, ..
    } = outcome
    else {
        panic!("expected an authenticated outcome, got {outcome:?}");
    };
    assert_eq!(account.id().as_ref(), "acc123");
    assert_eq!(attempts as usize, expected_calls);
    assert_eq!(
        sleeper.recorded(),
        vec![Duration::from_secs(1); expected_sleeps]
    );
}

#[rstest]
#[tokio::test]
async fn exhausted_login_leaves_a_registered_account(registration: Registration) {
    let mut identity = MockIdentityService::new();
    identity
        .expect_register()
        .times(1)
        .return_once(|_| Ok(account()));
    login_attempts(&mut identity, 3, None);
    let sleeper = Arc::new(RecordingSleeper::default());

    let outcome = service(identity, Arc::clone(&sleeper))
        .signup_and_login(&registration)
        .await
        .expect("registration is not an error");

    assert!(outcome.session().is_none());
    assert_eq!(outcome.attempts(), 3);
    assert_eq!(outcome.account().email().as_ref(), "ada@example.com");
    let SignupOutcome::RegisteredOnly { last_error, .. } = outcome else {
        panic!("expected registered-only outcome");
    };
    assert_eq!(last_error.code(), ErrorCode::Unauthorized);
    assert_eq!(
        sleeper.recorded().len(),
        2,
        "no pause after the final attempt"
    );
}

#[rstest]
#[tokio::test]
async fn registration_failure_skips_login(registration: Registration) {
    let mut identity = MockIdentityService::new();
    identity.expect_register().times(1).return_once(|_| {
        Err(IdentityServiceError::account_exists(
            "A user with the same id, email, or phone already exists in this project.",
        ))
    });
    identity.expect_create_session().never();
    let sleeper = Arc::new(RecordingSleeper::default());

    let err = service(identity, Arc::clone(&sleeper))
        .signup_and_login(&registration)
        .await
        .expect_err("registration fails");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(
        err.message(),
        "A user with the same id, email, or phone already exists in this project."
    );
    assert!(sleeper.recorded().is_empty());
}

#[rstest]
#[tokio::test]
async fn transient_login_failures_are_retried_like_any_other(registration: Registration) {
    let mut identity = MockIdentityService::new();
    identity.expect_register().return_once(|_| Ok(account()));
    let calls = Arc::new(AtomicU32::new(0));
    identity
        .expect_create_session()
        .times(2)
        .returning(move |_| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(IdentityServiceError::transport("connection reset"))
            } else {
                Ok(session())
            }
        });

    let outcome = service(identity, Arc::new(RecordingSleeper::default()))
        .signup_and_login(&registration)
        .await
        .expect("signup");
    assert_eq!(outcome.attempts(), 2);
    assert!(outcome.session().is_some());
}

#[rstest]
#[tokio::test]
async fn single_attempt_policy_never_sleeps(registration: Registration) {
    let mut identity = MockIdentityService::new();
    identity.expect_register().return_once(|_| Ok(account()));
    login_attempts(&mut identity, 1, None);
    let sleeper = Arc::new(RecordingSleeper::default());
    let service = AccountService::with_runtime(
        Arc::new(identity),
        Arc::clone(&sleeper) as Arc<dyn Sleeper>,
        RetryPolicy::fixed(0, Duration::from_secs(5)),
    );

    let outcome = service
        .signup_and_login(&registration)
        .await
        .expect("signup");
    assert_eq!(outcome.attempts(), 1);
    assert!(sleeper.recorded().is_empty());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn default_policy_waits_one_second_between_attempts(registration: Registration) {
    let mut identity = MockIdentityService::new();
    identity.expect_register().return_once(|_| Ok(account()));
    login_attempts(&mut identity, 3, Some(3));
    let service = AccountService::new(Arc::new(identity));
    let started = tokio::time::Instant::now();

    let outcome = service
        .signup_and_login(&registration)
        .await
        .expect("signup");

    let elapsed = started.elapsed();
    assert_eq!(outcome.attempts(), 3);
    assert!(elapsed >= Duration::from_secs(2), "waited {elapsed:?}");
    assert!(elapsed < Duration::from_millis(2_100), "waited {elapsed:?}");
}

#[rstest]
#[tokio::test]
async fn login_resolves_the_session_account() {
    let mut identity = MockIdentityService::new();
    identity
        .expect_create_session()
        .times(1)
        .return_once(|_| Ok(session()));
    identity
        .expect_current_account()
        .withf(|session| session.secret() == "secret-token")
        .times(1)
        .return_once(|_| Ok(account()));
    let credentials =
        Credentials::try_from_parts("ada@example.com", "correct horse").expect("credentials");

    let authenticated = AccountService::new(Arc::new(identity))
        .login(&credentials)
        .await
        .expect("login");
    assert_eq!(authenticated.account.id().as_ref(), "acc123");
    assert_eq!(authenticated.session.id(), "sess1");
}

#[rstest]
#[tokio::test]
async fn login_is_not_retried() {
    let mut identity = MockIdentityService::new();
    identity
        .expect_create_session()
        .times(1)
        .return_once(|_| Err(IdentityServiceError::invalid_credentials("bad password")));
    identity.expect_current_account().never();
    let credentials =
        Credentials::try_from_parts("ada@example.com", "wrong").expect("credentials");

    let err = AccountService::new(Arc::new(identity))
        .login(&credentials)
        .await
        .expect_err("login fails");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(err.message(), "bad password");
}

#[rstest]
#[tokio::test]
async fn logout_revokes_sessions() {
    let mut identity = MockIdentityService::new();
    identity
        .expect_delete_all_sessions()
        .withf(|session| session.id() == "sess1")
        .times(1)
        .return_once(|_| Ok(()));

    AccountService::new(Arc::new(identity))
        .logout(&session())
        .await
        .expect("logout");
}

#[rstest]
#[tokio::test]
async fn expired_sessions_map_to_unauthorized() {
    let mut identity = MockIdentityService::new();
    identity
        .expect_current_account()
        .return_once(|_| Err(IdentityServiceError::unauthorized("session expired")));

    let err = AccountService::new(Arc::new(identity))
        .current_account(&session())
        .await
        .expect_err("unauthorized");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert!(!err.is_transient());
}
