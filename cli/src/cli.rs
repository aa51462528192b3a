//! Implements the command line behavior.

use std::{process, sync::Arc, thread};

use log::{error, warn};
use tcexport_automation::{AutomationHost, MessageFilter, ProcessMessageFilter};
use tcexport_problems::Outcome;

use crate::{config::RunConfig, runner, supervisor::Supervisor, watchdog::Watchdog};

/// Exports the PLC project named in `config` as a library.
///
/// A timeout or Ctrl+C ends the process from another thread with
/// [`Outcome::Timeout`] or [`Outcome::Interrupted`]; this function then
/// never returns.
pub fn export(config: &RunConfig, host: &dyn AutomationHost) -> Outcome {
    let supervisor = Arc::new(Supervisor::new());

    let on_interrupt = supervisor.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        warn!("Interrupted");
        exit_with(&on_interrupt, Outcome::Interrupted);
    }) {
        warn!("Unable to handle Ctrl+C. {err}");
    }

    let _watchdog = config.timeout.map(|timeout| {
        let on_timeout = supervisor.clone();
        Watchdog::arm(timeout, move || {
            error!("No result after {} minute(s)", timeout.as_secs() / 60);
            exit_with(&on_timeout, Outcome::Timeout);
        })
    });

    let filter: Arc<dyn MessageFilter> = Arc::new(ProcessMessageFilter::new());
    let outcome = runner::run(config, host, filter, &supervisor);

    if !supervisor.finish() {
        // The terminating thread exits the process.
        loop {
            thread::park();
        }
    }
    outcome
}

fn exit_with(supervisor: &Supervisor, outcome: Outcome) {
    if let Some(outcome) = supervisor.terminate(outcome) {
        process::exit(i32::from(outcome.code()));
    }
}
