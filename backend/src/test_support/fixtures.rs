//! Sample domain values for tests.

use chrono::{TimeDelta, TimeZone, Utc};

use crate::domain::{Account, DisplayName, EmailAddress, Registration, Session, UserId};

/// Account with the given id, email and display name.
pub fn account(id: &str, email: &str, name: &str) -> Account {
    Account::new(
        UserId::new(id).expect("fixture id"),
        EmailAddress::new(email).expect("fixture email"),
        DisplayName::new(name).expect("fixture name"),
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("fixture timestamp"),
    )
}

/// Registration for Ada Lovelace with a valid password.
pub fn registration() -> Registration {
    Registration::try_from_parts("Ada", "ada@example.com", "correct horse")
        .expect("fixture registration")
}

/// Session for `account_id` valid for a year.
pub fn session(account_id: &str) -> Session {
    Session::new(
        "sess1",
        UserId::new(account_id).expect("fixture id"),
        "secret-token",
        Utc::now() + TimeDelta::days(365),
    )
}
