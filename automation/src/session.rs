//! IDE sessions.
//!
//! A session is one running instance of the engineering environment with a
//! solution loaded into it. Sessions hold an external process, so they are
//! owned by a [`SessionGuard`] that closes them on every exit path.

use std::{
    ops::{Deref, DerefMut},
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, warn};

use crate::{
    diagnostics::ErrorItem, error::AutomationError, tree::SystemManager,
    version::VersionSelection,
};

/// What a session must be able to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    /// The solution the session is opened for.
    pub solution: PathBuf,
    /// The `major.minor` Visual Studio version from the solution, if known.
    pub dte_version: Option<String>,
    /// The TwinCAT version to run with.
    pub tc_version: VersionSelection,
}

/// Creates IDE sessions.
pub trait AutomationHost {
    fn open(&self, request: &SessionRequest) -> Result<Box<dyn IdeSession>, AutomationError>;
}

/// A running IDE instance.
pub trait IdeSession {
    fn load_solution(&mut self, path: &Path) -> Result<(), AutomationError>;

    fn clean_solution(&mut self) -> Result<(), AutomationError>;

    /// Builds the loaded solution and waits for the build to finish.
    fn build_solution(&mut self) -> Result<(), AutomationError>;

    /// The entries of the error list after the last build.
    fn error_items(&self) -> Result<Vec<ErrorItem>, AutomationError>;

    /// The TwinCAT System Manager of the TwinCAT project in the solution.
    fn system_manager(&self) -> Result<Box<dyn SystemManager>, AutomationError>;

    /// A handle that can end the session from another thread.
    fn killer(&self) -> Arc<dyn SessionKiller>;

    /// Closes the IDE. Closing twice is not an error.
    fn close(&mut self) -> Result<(), AutomationError>;
}

/// Ends a session from outside the thread that drives it.
///
/// Used when the run is interrupted or times out while the driving thread
/// is blocked inside an automation call.
pub trait SessionKiller: Send + Sync {
    /// Ends the session. Failures are logged, never reported.
    fn kill(&self);
}

/// Owns a session and closes it when dropped.
pub struct SessionGuard {
    session: Box<dyn IdeSession>,
    closed: bool,
}

impl SessionGuard {
    pub fn new(session: Box<dyn IdeSession>) -> Self {
        SessionGuard {
            session,
            closed: false,
        }
    }

    /// Closes the session, reporting any failure to the caller.
    pub fn close(mut self) -> Result<(), AutomationError> {
        self.closed = true;
        self.session.close()
    }
}

impl Deref for SessionGuard {
    type Target = dyn IdeSession;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref()
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session.as_mut()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        debug!("Closing IDE session");
        if let Err(err) = self.session.close() {
            warn!("Unable to close IDE session: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeBehavior, FakeHost};
    use crate::version::VersionSelection;

    fn request() -> SessionRequest {
        SessionRequest {
            solution: PathBuf::from("Library.sln"),
            dte_version: Some(String::from("15.0")),
            tc_version: VersionSelection::Latest,
        }
    }

    #[test]
    fn drop_when_not_closed_then_session_closed() {
        let host = FakeHost::new(FakeBehavior::default());
        {
            let _guard = SessionGuard::new(host.open(&request()).unwrap());
        }
        assert!(host.state().closed);
    }

    #[test]
    fn close_when_called_then_closed_once() {
        let host = FakeHost::new(FakeBehavior::default());
        let guard = SessionGuard::new(host.open(&request()).unwrap());

        guard.close().unwrap();

        let closes = host
            .state()
            .calls
            .iter()
            .filter(|call| call.as_str() == "close")
            .count();
        assert_eq!(closes, 1);
    }

    #[test]
    fn deref_mut_when_build_then_reaches_session() {
        let host = FakeHost::new(FakeBehavior::default());
        let mut guard = SessionGuard::new(host.open(&request()).unwrap());

        guard.build_solution().unwrap();

        assert!(host.state().calls.contains(&String::from("build_solution")));
    }
}
