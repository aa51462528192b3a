//! Cleanup for runs that end from outside the driving thread.
//!
//! A run normally releases the IDE session and the message filter through
//! their guards. When the run times out or the user presses Ctrl+C, the
//! driving thread may be blocked inside an automation call, so the guards
//! never get to run. The supervisor holds handles that can release both
//! resources from another thread.

use std::sync::{Arc, Mutex, MutexGuard};

use log::info;
use tcexport_automation::{MessageFilter, SessionKiller};
use tcexport_problems::Outcome;

#[derive(Default)]
struct State {
    killer: Option<Arc<dyn SessionKiller>>,
    filter: Option<Arc<dyn MessageFilter>>,
    done: bool,
}

/// Coordinates the end of a run between the driving thread, the watchdog
/// and the interrupt handler. Exactly one of them ends the run.
#[derive(Default)]
pub struct Supervisor {
    state: Mutex<State>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // The state stays consistent even if a holder panicked.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn register_filter(&self, filter: Arc<dyn MessageFilter>) {
        self.lock().filter = Some(filter);
    }

    pub fn register_session(&self, killer: Arc<dyn SessionKiller>) {
        self.lock().killer = Some(killer);
    }

    /// Marks the run as ended by the driving thread.
    ///
    /// Returns false if an asynchronous termination got there first; that
    /// thread is then ending the process.
    pub fn finish(&self) -> bool {
        let mut state = self.lock();
        if state.done {
            return false;
        }
        state.done = true;
        state.killer = None;
        state.filter = None;
        true
    }

    /// Ends the run from another thread: kills the session and revokes the
    /// message filter.
    ///
    /// Returns the outcome to exit with, or `None` if the run has already
    /// ended.
    pub fn terminate(&self, outcome: Outcome) -> Option<Outcome> {
        let mut state = self.lock();
        if state.done {
            return None;
        }
        state.done = true;

        if let Some(killer) = state.killer.take() {
            killer.kill();
        }
        if let Some(filter) = state.filter.take() {
            filter.revoke();
        }

        info!("Exiting application...");
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tcexport_automation::ProcessMessageFilter;

    #[derive(Default)]
    struct FlagKiller {
        killed: AtomicBool,
    }

    impl SessionKiller for FlagKiller {
        fn kill(&self) {
            self.killed.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn terminate_when_running_then_kills_and_revokes() {
        let supervisor = Supervisor::new();
        let killer = Arc::new(FlagKiller::default());
        let filter = Arc::new(ProcessMessageFilter::new());
        filter.install().unwrap();
        supervisor.register_session(killer.clone());
        supervisor.register_filter(filter.clone());

        let outcome = supervisor.terminate(Outcome::Timeout);

        assert_eq!(outcome, Some(Outcome::Timeout));
        assert!(killer.killed.load(Ordering::SeqCst));
        assert!(!filter.is_installed());
    }

    #[test]
    fn terminate_when_finished_then_none_and_nothing_killed() {
        let supervisor = Supervisor::new();
        let killer = Arc::new(FlagKiller::default());
        supervisor.register_session(killer.clone());

        assert!(supervisor.finish());
        let outcome = supervisor.terminate(Outcome::Interrupted);

        assert_eq!(outcome, None);
        assert!(!killer.killed.load(Ordering::SeqCst));
    }

    #[test]
    fn terminate_when_called_twice_then_second_is_none() {
        let supervisor = Supervisor::new();

        assert_eq!(
            supervisor.terminate(Outcome::Interrupted),
            Some(Outcome::Interrupted)
        );
        assert_eq!(supervisor.terminate(Outcome::Timeout), None);
        assert!(!supervisor.finish());
    }
}
