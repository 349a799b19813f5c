//! Authentication primitives such as credentials, registrations and sessions.
//!
//! Keep raw input parsing outside the services by exposing constructors that
//! validate string inputs before anything talks to the identity port.

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::domain::user::{Account, DisplayName, EmailAddress, UserId, UserValidationError};

/// Domain error returned when credential or registration values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthValidationError {
    /// Email was missing or malformed.
    Email(UserValidationError),
    /// Display name was missing or too long.
    Name(UserValidationError),
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for AuthValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(err) | Self::Name(err) => err.fmt(f),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for AuthValidationError {}

/// Validated login credentials forwarded to the identity service.
///
/// ## Invariants
/// - `email` satisfies [`EmailAddress`] validation.
/// - `password` is non-empty but retains caller-provided whitespace to avoid
///   surprising credential comparisons.
///
/// # Examples
/// ```
/// use skill_exchange::domain::Credentials;
///
/// let creds = Credentials::try_from_parts("ada@example.com", "hunter22").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.com");
/// assert_eq!(creds.password(), "hunter22");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl Credentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, AuthValidationError> {
        let email = EmailAddress::new(email).map_err(AuthValidationError::Email)?;
        if password.is_empty() {
            return Err(AuthValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email used as the login handle.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validated signup form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    name: DisplayName,
    credentials: Credentials,
}

impl Registration {
    /// Validate a signup submission.
    ///
    /// # Examples
    /// ```
    /// use skill_exchange::domain::{AuthValidationError, Registration};
    ///
    /// let err = Registration::try_from_parts("Ada", "ada@example.com", "").unwrap_err();
    /// assert_eq!(err, AuthValidationError::EmptyPassword);
    /// ```
    pub fn try_from_parts(
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Self, AuthValidationError> {
        let name = DisplayName::new(name).map_err(AuthValidationError::Name)?;
        let credentials = Credentials::try_from_parts(email, password)?;
        Ok(Self { name, credentials })
    }

    /// Name recorded on the new account.
    pub fn name(&self) -> &DisplayName {
        &self.name
    }

    /// Credentials reused for the automatic login.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// Server-issued session.
///
/// The secret authenticates follow-up calls on behalf of the account; it is
/// zeroized on drop and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    id: String,
    account_id: UserId,
    secret: Zeroizing<String>,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Build a session from identity service values.
    pub fn new(
        id: impl Into<String>,
        account_id: UserId,
        secret: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            account_id,
            secret: Zeroizing::new(secret.into()),
            expires_at,
        }
    }

    /// Session identifier.
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Account the session belongs to.
    pub fn account_id(&self) -> &UserId {
        &self.account_id
    }

    /// Opaque token presented on authenticated calls.
    pub fn secret(&self) -> &str {
        self.secret.as_str()
    }

    /// Expiry instant.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the session has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("account_id", &self.account_id)
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Session paired with the account it authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSession {
    /// Account resolved for the session.
    pub account: Account,
    /// Session handle for follow-up calls.
    pub session: Session,
}
