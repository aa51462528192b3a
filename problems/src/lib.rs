//! Outcomes of a `tcexport` run.
//!
//! The enumeration is generated from `resources/exit-codes.csv` so that the
//! documented exit codes and the code that produces them cannot drift apart.

use std::fmt;

include!(concat!(env!("OUT_DIR"), "/outcomes.rs"));

impl Outcome {
    /// Returns true if the outcome denotes a successful run.
    pub fn is_success(&self) -> bool {
        *self == Outcome::Success
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.code())
    }
}

impl From<Outcome> for std::process::ExitCode {
    fn from(outcome: Outcome) -> Self {
        std::process::ExitCode::from(outcome.code())
    }
}
