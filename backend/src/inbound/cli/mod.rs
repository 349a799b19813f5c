//! `skillx` command-line surface.
//!
//! Parses arguments with clap, drives the domain services through a
//! [`CliBackend`], and renders results as `key=value` lines.

use std::io::{self, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::ports::{DocumentStore, IdentityService};
use crate::domain::{
    AccountService, AuthValidationError, Credentials, DocumentId, Error, Profile, ProfileDraft,
    ProfileService, ProfileValidationError, REGISTERED_ONLY_MESSAGE, Registration, RetryPolicy,
    Session, SignupOutcome, Sleeper, TokioSleeper,
};

mod backends;

pub use backends::{AppwriteBackend, BackendError, CliBackend, MemoryBackend};

/// Backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// The configured Appwrite project.
    Appwrite,
    /// A process-local backend that starts empty.
    Memory,
}

/// `skillx` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "skillx",
    about = "Publish and browse skill exchange profiles",
    version
)]
pub struct CliArgs {
    /// Backend to run against.
    #[arg(long, value_enum, default_value_t = BackendKind::Appwrite)]
    pub backend: BackendKind,
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create an account and log it in.
    Signup {
        #[arg(long, value_name = "name")]
        name: String,
        #[arg(long, value_name = "email")]
        email: String,
        #[arg(long, value_name = "password")]
        password: String,
    },
    /// Log in and show the account.
    Login {
        #[arg(long, value_name = "email")]
        email: String,
        #[arg(long, value_name = "password")]
        password: String,
    },
    /// Log in and create or update your profile.
    SaveProfile {
        #[arg(long, value_name = "email")]
        email: String,
        #[arg(long, value_name = "password")]
        password: String,
        #[arg(long, value_name = "text", default_value = "")]
        bio: String,
        /// Skills you can teach, comma separated.
        #[arg(long, value_name = "skills", default_value = "")]
        offers: String,
        /// Skills you want to learn, comma separated.
        #[arg(long, value_name = "skills", default_value = "")]
        wants: String,
    },
    /// List profiles, optionally filtered by skill.
    Explore {
        #[arg(long, value_name = "term")]
        search: Option<String>,
    },
    /// Show one profile.
    ShowProfile {
        #[arg(value_name = "id")]
        id: String,
    },
}

/// Errors surfaced to the terminal.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("invalid input: {0}")]
    Credentials(#[from] AuthValidationError),
    #[error("invalid input: {0}")]
    DocumentId(#[from] ProfileValidationError),
    #[error(transparent)]
    Domain(#[from] Error),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Services a command needs.
pub struct CliContext<'a> {
    backend: &'a dyn CliBackend,
    sleeper: Arc<dyn Sleeper>,
    login_policy: RetryPolicy,
}

impl<'a> CliContext<'a> {
    /// Context with a Tokio sleeper.
    pub fn new(backend: &'a dyn CliBackend, login_policy: RetryPolicy) -> Self {
        Self::with_sleeper(backend, login_policy, Arc::new(TokioSleeper))
    }

    /// Context with an explicit sleeper.
    pub fn with_sleeper(
        backend: &'a dyn CliBackend,
        login_policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            backend,
            sleeper,
            login_policy,
        }
    }

    fn accounts(&self) -> AccountService<dyn IdentityService> {
        AccountService::with_runtime(
            self.backend.identity(),
            Arc::clone(&self.sleeper),
            self.login_policy,
        )
    }

    fn profiles(&self, session: Option<&Session>) -> ProfileService<dyn DocumentStore> {
        ProfileService::new(self.backend.documents(session))
    }
}

/// Run `command`, writing the report to `out`.
pub async fn run(
    command: &Command,
    context: &CliContext<'_>,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    match command {
        Command::Signup {
            name,
            email,
            password,
        } => {
            let registration = Registration::try_from_parts(name, email, password)?;
            let outcome = context.accounts().signup_and_login(&registration).await?;
            write_signup(out, &outcome)?;
        }
        Command::Login { email, password } => {
            let credentials = Credentials::try_from_parts(email, password)?;
            let authenticated = context.accounts().login(&credentials).await?;
            writeln!(out, "account_id={}", authenticated.account.id())?;
            writeln!(out, "email={}", authenticated.account.email())?;
            writeln!(out, "name={}", authenticated.account.display_name())?;
            writeln!(
                out,
                "session_expires_at={}",
                authenticated.session.expires_at().to_rfc3339()
            )?;
        }
        Command::SaveProfile {
            email,
            password,
            bio,
            offers,
            wants,
        } => {
            let credentials = Credentials::try_from_parts(email, password)?;
            let authenticated = context.accounts().login(&credentials).await?;
            let profile = context
                .profiles(Some(&authenticated.session))
                .upsert_profile(
                    Some(&authenticated.account),
                    ProfileDraft::new(bio.as_str(), offers.as_str(), wants.as_str()),
                )
                .await?;
            write_profile(out, &profile)?;
        }
        Command::Explore { search } => {
            let profiles = context.profiles(None).explore(search.as_deref()).await?;
            if profiles.is_empty() {
                writeln!(out, "no profiles found")?;
            }
            for profile in &profiles {
                writeln!(
                    out,
                    "{}\t{}\toffers={}\twants={}",
                    profile.document_id(),
                    profile.display_name(),
                    labels(profile.skills_offered().labels()),
                    labels(profile.skills_wanted().labels()),
                )?;
            }
        }
        Command::ShowProfile { id } => {
            let id = DocumentId::new(id.as_str())?;
            let profile = context.profiles(None).profile(&id).await?;
            write_profile(out, &profile)?;
        }
    }
    Ok(())
}

fn write_signup(out: &mut dyn Write, outcome: &SignupOutcome) -> io::Result<()> {
    writeln!(out, "account_id={}", outcome.account().id())?;
    match outcome {
        SignupOutcome::Authenticated {
            session, attempts, ..
        } => {
            writeln!(out, "status=authenticated")?;
            writeln!(out, "attempts={attempts}")?;
            writeln!(out, "session_expires_at={}", session.expires_at().to_rfc3339())
        }
        SignupOutcome::RegisteredOnly {
            attempts,
            last_error,
            ..
        } => {
            writeln!(out, "status=registered_only")?;
            writeln!(out, "attempts={attempts}")?;
            writeln!(out, "last_error={last_error}")?;
            writeln!(out, "message={REGISTERED_ONLY_MESSAGE}")
        }
    }
}

fn write_profile(out: &mut dyn Write, profile: &Profile) -> io::Result<()> {
    writeln!(out, "document_id={}", profile.document_id())?;
    writeln!(out, "owner_id={}", profile.owner_id())?;
    writeln!(out, "name={}", profile.display_name())?;
    writeln!(out, "bio={}", profile.bio())?;
    writeln!(out, "offers={}", labels(profile.skills_offered().labels()))?;
    writeln!(out, "wants={}", labels(profile.skills_wanted().labels()))
}

fn labels<'a>(labels: impl Iterator<Item = &'a str>) -> String {
    labels.collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests;
