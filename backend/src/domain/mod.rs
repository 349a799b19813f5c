//! Domain primitives, ports and services.
//!
//! Purpose: define the strongly typed account and skill profile model, the
//! driven ports that reach the identity service and document store, and the
//! services that enforce the one-profile-per-owner and signup auto-login
//! rules. Nothing in this module knows about HTTP or the CLI.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Account, Credentials, Registration, Session: identity values.
//! - Profile, ProfileDraft, SkillList: skill profile values.
//! - ProfileService / AccountService: the use cases.
//! - RetryPolicy / Sleeper: auto-login retry runtime.

pub mod account_service;
pub mod auth;
pub mod error;
mod port_errors;
pub mod ports;
pub mod profile;
pub mod profile_document;
pub mod profile_service;
pub mod retry;
pub mod user;

pub use self::account_service::{AccountService, REGISTERED_ONLY_MESSAGE, SignupOutcome};
pub use self::auth::{AuthValidationError, AuthenticatedSession, Credentials, Registration, Session};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::profile::{DocumentId, Profile, ProfileDraft, ProfileValidationError, SkillList};
pub use self::profile_service::ProfileService;
pub use self::retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, RetryPolicy, Sleeper, TokioSleeper};
pub use self::user::{Account, DisplayName, EmailAddress, UserId, UserValidationError};

/// Convenient domain result alias.
///
/// # Examples
/// ```
/// use skill_exchange::domain::{DomainResult, Error};
///
/// fn lookup() -> DomainResult<()> {
///     Err(Error::not_found("missing"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
