//! The settings of one run.

use std::{path::PathBuf, time::Duration};

/// Everything a run needs from the command line.
///
/// Built once from the parsed arguments and passed by reference through
/// the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// The Visual Studio solution. Optional here so that its absence is
    /// reported with its own exit code.
    pub solution: Option<PathBuf>,
    /// A TwinCAT version that overrides the version of the project.
    pub tc_version: Option<String>,
    /// The PLC project below the PLC configuration node, for example
    /// `Library^Library Project`.
    pub plc_project: String,
    /// Where to save the library.
    pub library: PathBuf,
    /// The longest the run may take.
    pub timeout: Option<Duration>,
    /// A real-time task to enable. All other tasks are disabled.
    pub task: Option<String>,
    /// Compiler defines added to the PLC project before the build.
    pub defines: Vec<String>,
}

impl RunConfig {
    /// Converts a timeout given in minutes.
    pub fn timeout_from_minutes(minutes: u64) -> Duration {
        Duration::from_secs(minutes.saturating_mul(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_from_minutes_when_five_then_three_hundred_seconds() {
        assert_eq!(
            RunConfig::timeout_from_minutes(5),
            Duration::from_secs(300)
        );
    }

    #[test]
    fn timeout_from_minutes_when_huge_then_saturates() {
        assert_eq!(
            RunConfig::timeout_from_minutes(u64::MAX),
            Duration::from_secs(u64::MAX)
        );
    }
}
