//! Tests for the CLI commands against the in-memory backend.

use std::sync::Arc;

use chrono::Utc;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::IdentityServiceError;
use crate::outbound::memory::{IdentityOperation, StoreOperation};
use crate::test_support::{ClockAdvancingSleeper, ImmediateSleeper, MutableClock};

fn backend() -> MemoryBackend {
    MemoryBackend::new(Arc::new(MutableClock::new(Utc::now())))
}

async fn run_to_string(backend: &MemoryBackend, command: Command) -> Result<String, CliError> {
    let context =
        CliContext::with_sleeper(backend, RetryPolicy::default(), Arc::new(ImmediateSleeper));
    let mut out = Vec::new();
    run(&command, &context, &mut out).await?;
    Ok(String::from_utf8(out).expect("utf-8 output"))
}

fn signup() -> Command {
    Command::Signup {
        name: "Ada".to_owned(),
        email: "ada@example.com".to_owned(),
        password: "correct horse".to_owned(),
    }
}

fn save(bio: &str, offers: &str, wants: &str) -> Command {
    Command::SaveProfile {
        email: "ada@example.com".to_owned(),
        password: "correct horse".to_owned(),
        bio: bio.to_owned(),
        offers: offers.to_owned(),
        wants: wants.to_owned(),
    }
}

#[tokio::test]
async fn signup_reports_an_authenticated_account() {
    let backend = backend();
    let output = run_to_string(&backend, signup()).await.expect("signup");

    assert!(output.contains("status=authenticated\n"), "{output}");
    assert!(output.contains("attempts=1\n"), "{output}");
}

#[tokio::test]
async fn signup_reports_registered_only_when_login_keeps_failing() {
    let clock = Arc::new(MutableClock::new(Utc::now()));
    let backend = MemoryBackend::new(clock.clone());
    for _ in 0..3 {
        backend.identity_service().fail_next(
            IdentityOperation::CreateSession,
            IdentityServiceError::invalid_credentials("not yet"),
        );
    }
    let context = CliContext::with_sleeper(
        &backend,
        RetryPolicy::default(),
        Arc::new(ClockAdvancingSleeper::new(clock)),
    );
    let mut out = Vec::new();

    run(&signup(), &context, &mut out).await.expect("signup");

    let output = String::from_utf8(out).expect("utf-8 output");
    assert!(output.contains("status=registered_only\n"), "{output}");
    assert!(output.contains("attempts=3\n"), "{output}");
    assert!(
        output.contains("message=Account created, but auto login failed. Please log in manually.\n"),
        "{output}"
    );
}

#[tokio::test]
async fn saving_twice_keeps_one_profile() {
    let backend = backend();
    run_to_string(&backend, signup()).await.expect("signup");

    let first = run_to_string(&backend, save("", "React, Node.js", "Go"))
        .await
        .expect("first save");
    let second = run_to_string(&backend, save("Hi!", "Rust", ""))
        .await
        .expect("second save");

    assert!(first.contains("offers=React, Node.js\n"), "{first}");
    assert!(second.contains("bio=Hi!\n"), "{second}");
    assert!(second.contains("name=Ada\n"), "{second}");
    assert_eq!(backend.document_store().documents().len(), 1);
    assert_eq!(backend.document_store().calls(StoreOperation::Create), 1);
    assert_eq!(backend.document_store().calls(StoreOperation::Update), 1);
}

#[tokio::test]
async fn explore_lists_matching_profiles() {
    let backend = backend();
    run_to_string(&backend, signup()).await.expect("signup");
    run_to_string(&backend, save("", "Guitar", "Spanish"))
        .await
        .expect("save");

    let hits = run_to_string(&backend, Command::Explore { search: Some("spanish".to_owned()) })
        .await
        .expect("explore");
    let misses = run_to_string(&backend, Command::Explore { search: Some("cobol".to_owned()) })
        .await
        .expect("explore");

    assert!(hits.contains("\tAda\toffers=Guitar\twants=Spanish\n"), "{hits}");
    assert_eq!(misses, "no profiles found\n");
}

#[tokio::test]
async fn show_profile_reports_missing_documents() {
    let backend = backend();
    let err = run_to_string(&backend, Command::ShowProfile { id: "nope".to_owned() })
        .await
        .expect_err("missing");

    let CliError::Domain(error) = err else {
        panic!("expected a domain error, got {err:?}");
    };
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn wrong_passwords_do_not_save() {
    let backend = backend();
    run_to_string(&backend, signup()).await.expect("signup");
    let command = Command::SaveProfile {
        email: "ada@example.com".to_owned(),
        password: "wrong password".to_owned(),
        bio: String::new(),
        offers: "Rust".to_owned(),
        wants: String::new(),
    };

    let err = run_to_string(&backend, command).await.expect_err("login fails");

    assert!(matches!(err, CliError::Domain(ref error) if error.code() == ErrorCode::Unauthorized));
    assert!(backend.document_store().documents().is_empty());
}

#[tokio::test]
async fn malformed_emails_are_input_errors() {
    let backend = backend();
    let command = Command::Login {
        email: "not-an-email".to_owned(),
        password: "secret".to_owned(),
    };

    let err = run_to_string(&backend, command).await.expect_err("invalid");
    assert!(matches!(err, CliError::Credentials(_)));
    assert_eq!(backend.identity_service().calls(IdentityOperation::CreateSession), 0);
}

#[test]
fn arguments_parse_into_commands() {
    let args = CliArgs::try_parse_from([
        "skillx",
        "--backend",
        "memory",
        "save-profile",
        "--email",
        "ada@example.com",
        "--password",
        "pw",
        "--offers",
        "React, Node.js",
    ])
    .expect("arguments parse");

    assert_eq!(args.backend, BackendKind::Memory);
    let Command::SaveProfile { offers, bio, .. } = args.command else {
        panic!("expected save-profile");
    };
    assert_eq!(offers, "React, Node.js");
    assert_eq!(bio, "");
}
