//! Re-entrancy handling for single threaded COM apartments.
//!
//! While the driving thread is blocked in a long automation call (a build,
//! for example) the IDE may call back into it or reject calls because it is
//! busy. A message filter answers those events. Without one, calls that the
//! IDE rejects as busy fail immediately instead of being retried.
//!
//! [`ReentrancyPolicy`] holds the answers. [`MessageFilter`] is the process
//! wide registration of a filter, and [`FilterGuard`] keeps it registered for
//! exactly as long as the guard lives.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::{debug, info};

use crate::error::AutomationError;

/// The incoming call was handled.
pub const SERVERCALL_ISHANDLED: u32 = 0;
/// The callee is busy and asks the caller to retry later.
pub const SERVERCALL_RETRYLATER: u32 = 2;
/// Let the default window procedure process pending messages.
pub const PENDINGMSG_WAITDEFPROCESS: u32 = 2;

/// Retry delays below this many milliseconds mean "retry immediately".
pub const IMMEDIATE_RETRY_LIMIT_MS: u32 = 100;

/// The delay used for rejected calls, inside the immediate retry range.
const RETRY_DELAY_MS: u32 = 99;

/// What to do about a call that the callee rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the call after this many milliseconds.
    RetryAfter(u32),
    /// Give up on the call.
    Cancel,
}

impl RetryDecision {
    /// The value returned to the platform: the delay, or `-1` to cancel.
    pub fn as_raw(&self) -> i32 {
        match self {
            RetryDecision::RetryAfter(ms) => i32::try_from(*ms).unwrap_or(i32::MAX),
            RetryDecision::Cancel => -1,
        }
    }
}

/// Answers re-entrant call events.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReentrancyPolicy;

impl ReentrancyPolicy {
    /// Every incoming call is accepted.
    pub fn handle_incoming_call(&self, call_type: u32) -> u32 {
        debug!("Incoming call of type {call_type} handled");
        SERVERCALL_ISHANDLED
    }

    /// Calls rejected as "retry later" are retried at once; any other
    /// rejection cancels the call.
    pub fn retry_rejected_call(&self, reject_type: u32, elapsed_ms: u32) -> RetryDecision {
        if reject_type == SERVERCALL_RETRYLATER {
            debug!("Call rejected as busy after {elapsed_ms} ms, retrying");
            RetryDecision::RetryAfter(RETRY_DELAY_MS)
        } else {
            info!("Too busy, cancelling call (reject type {reject_type})");
            RetryDecision::Cancel
        }
    }

    pub fn message_pending(&self, pending_type: u32) -> u32 {
        debug!("Message pending of type {pending_type}");
        PENDINGMSG_WAITDEFPROCESS
    }
}

/// The process wide message filter registration.
///
/// `revoke` may be called from any thread and any number of times, because
/// asynchronous exit paths (timeout, Ctrl+C) revoke the filter as well.
pub trait MessageFilter: Send + Sync {
    fn install(&self) -> Result<(), AutomationError>;

    fn revoke(&self);
}

/// Keeps a message filter installed while it lives.
pub struct FilterGuard {
    filter: Arc<dyn MessageFilter>,
}

impl FilterGuard {
    pub fn install(filter: Arc<dyn MessageFilter>) -> Result<Self, AutomationError> {
        filter.install()?;
        Ok(FilterGuard { filter })
    }
}

impl Drop for FilterGuard {
    fn drop(&mut self) {
        self.filter.revoke();
    }
}

/// The message filter of this process.
///
/// Tracks whether the filter is registered and answers events with a
/// [`ReentrancyPolicy`].
#[derive(Debug, Default)]
pub struct ProcessMessageFilter {
    policy: ReentrancyPolicy,
    installed: AtomicBool,
}

impl ProcessMessageFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The answers to the filter callbacks.
    ///
    /// This is where a COM backend attaches: the filter object it registers
    /// with the platform forwards `HandleInComingCall`, `RetryRejectedCall`
    /// and `MessagePending` here while this filter is installed.
    pub fn policy(&self) -> &ReentrancyPolicy {
        &self.policy
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }
}

impl MessageFilter for ProcessMessageFilter {
    fn install(&self) -> Result<(), AutomationError> {
        if self.installed.swap(true, Ordering::SeqCst) {
            return Err(AutomationError::call_failed(
                "install message filter",
                "a message filter is already installed",
            ));
        }
        debug!("Message filter installed");
        Ok(())
    }

    fn revoke(&self) {
        if self.installed.swap(false, Ordering::SeqCst) {
            debug!("Message filter revoked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_rejected_call_when_retry_later_then_immediate_retry() {
        let decision = ReentrancyPolicy.retry_rejected_call(SERVERCALL_RETRYLATER, 10);

        assert_eq!(decision, RetryDecision::RetryAfter(99));
        assert!(decision.as_raw() >= 0);
        assert!(decision.as_raw() < IMMEDIATE_RETRY_LIMIT_MS as i32);
    }

    #[test]
    fn retry_rejected_call_when_rejected_then_cancel() {
        let decision = ReentrancyPolicy.retry_rejected_call(1, 10);

        assert_eq!(decision, RetryDecision::Cancel);
        assert_eq!(decision.as_raw(), -1);
    }

    #[test]
    fn handle_incoming_call_when_any_then_handled() {
        assert_eq!(
            ReentrancyPolicy.handle_incoming_call(1),
            SERVERCALL_ISHANDLED
        );
    }

    #[test]
    fn message_pending_when_any_then_wait_default_process() {
        assert_eq!(
            ReentrancyPolicy.message_pending(0),
            PENDINGMSG_WAITDEFPROCESS
        );
    }

    #[test]
    fn guard_when_dropped_then_revoked() {
        let filter = Arc::new(ProcessMessageFilter::new());
        {
            let _guard = FilterGuard::install(filter.clone()).unwrap();
            assert!(filter.is_installed());
        }
        assert!(!filter.is_installed());
    }

    #[test]
    fn install_when_already_installed_then_err() {
        let filter = ProcessMessageFilter::new();
        filter.install().unwrap();

        assert!(filter.install().is_err());
    }

    #[test]
    fn policy_when_installed_then_busy_calls_retried() {
        let filter = Arc::new(ProcessMessageFilter::new());
        let _guard = FilterGuard::install(filter.clone()).unwrap();

        let policy = filter.policy();

        assert_eq!(policy.handle_incoming_call(0), SERVERCALL_ISHANDLED);
        assert_eq!(
            policy.retry_rejected_call(SERVERCALL_RETRYLATER, 5_000),
            RetryDecision::RetryAfter(RETRY_DELAY_MS)
        );
        assert_eq!(policy.message_pending(1), PENDINGMSG_WAITDEFPROCESS);
    }

    #[test]
    fn revoke_when_called_twice_then_not_installed() {
        let filter = ProcessMessageFilter::new();
        filter.install().unwrap();

        filter.revoke();
        filter.revoke();

        assert!(!filter.is_installed());
    }
}
