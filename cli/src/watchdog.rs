//! Overall time limit of a run.
//!
//! On machines short of memory the IDE build can hang. The only way out is
//! to end the IDE and this process, which the watchdog does once the time
//! limit passes.

use std::{thread, time::Duration};

use crossbeam_channel::{after, bounded, select, Sender};
use log::debug;

/// Calls a function once a time limit passes, unless dropped first.
pub struct Watchdog {
    _disarm: Sender<()>,
}

impl Watchdog {
    /// Starts the timer. `on_timeout` runs on the watchdog thread.
    pub fn arm<F>(timeout: Duration, on_timeout: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (disarm, disarmed) = bounded::<()>(1);
        debug!("Watchdog armed for {timeout:?}");

        thread::spawn(move || {
            let deadline = after(timeout);
            select! {
                // Dropping the sender disconnects the channel.
                recv(disarmed) -> _ => debug!("Watchdog disarmed"),
                recv(deadline) -> _ => on_timeout(),
            }
        });

        Watchdog { _disarm: disarm }
    }
}
