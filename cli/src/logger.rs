//! Configures the log of a run.
//!
//! The log is the only report a build server gets of what a run did, so it
//! goes to standard error or, with `--log-file`, to a file next to the build
//! artifacts.
use env_logger::{fmt::Formatter, Builder, Target};
use log::trace;
use log::{LevelFilter, Record};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use time::OffsetDateTime;

/// Returns the log level for the debug setting.
pub fn level(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Configures the log.
///
/// Informational messages are always written because they are the progress
/// report of a run; `debug` adds the details.
pub fn configure(debug: bool, log_file: Option<PathBuf>) -> Result<(), String> {
    let log_level = level(debug);

    let mut builder = Builder::new();

    if let Some(path) = log_file {
        let file = File::create(&path)
            .map_err(|e| format!("Unable to create log file {}. {e}", path.display()))?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder
        .format(write_record)
        .filter_level(log_level)
        .try_init()
        .map_err(|e| format!("Unable to configure logging. {e}"))?;

    trace!("Logger level {log_level}");

    Ok(())
}

/// Writes one line: `[LEVEL target file:line time] message`.
///
/// The target names the module that logged, so lines from the runner and
/// from the library crates can be told apart in a build server log.
fn write_record(buf: &mut Formatter, record: &Record) -> io::Result<()> {
    writeln!(
        buf,
        "[{} {} {}:{} {:?}] {}",
        record.level(),
        record.target(),
        record.file().unwrap_or("unknown"),
        record.line().unwrap_or(0),
        OffsetDateTime::now_utc(),
        record.args()
    )
}

#[cfg(test)]
mod test {
    use crate::logger::{configure, level};
    use log::LevelFilter;

    #[test]
    fn level_when_debug_then_debug() {
        assert_eq!(level(true), LevelFilter::Debug);
        assert_eq!(level(false), LevelFilter::Info);
    }

    #[test]
    fn configure_when_log_file_in_missing_directory_then_err() {
        let result = configure(false, Some("does/not/exist/tcexport.log".into()));

        assert!(result.is_err());
    }
}
