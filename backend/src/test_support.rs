//! Test utilities for the skill exchange crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Only compiled for tests or with the `test-support` feature.

pub mod fixtures;
mod runtime;

pub use runtime::{ClockAdvancingSleeper, ImmediateSleeper, MutableClock, RecordingSleeper};
