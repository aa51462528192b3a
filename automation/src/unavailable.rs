//! The host used when no automation backend is present.

use crate::{
    error::AutomationError,
    session::{AutomationHost, IdeSession, SessionRequest},
};

/// A host that cannot open sessions.
///
/// Every run that gets as far as acquiring a session fails with the reason
/// given here, after all of the checks that need no IDE have passed.
#[derive(Debug, Clone)]
pub struct UnavailableHost {
    reason: String,
}

impl UnavailableHost {
    pub fn new(reason: impl Into<String>) -> Self {
        UnavailableHost {
            reason: reason.into(),
        }
    }
}

impl AutomationHost for UnavailableHost {
    fn open(&self, request: &SessionRequest) -> Result<Box<dyn IdeSession>, AutomationError> {
        Err(AutomationError::Unavailable(format!(
            "{} (requested Visual Studio {} with TwinCAT {})",
            self.reason,
            request.dte_version.as_deref().unwrap_or("unknown"),
            request.tc_version
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::VersionSelection;
    use std::path::PathBuf;

    #[test]
    fn open_when_called_then_unavailable_with_reason() {
        let host = UnavailableHost::new("no COM automation backend");
        let request = SessionRequest {
            solution: PathBuf::from("Library.sln"),
            dte_version: Some(String::from("15.0")),
            tc_version: VersionSelection::Pinned(String::from("3.1.4024.11")),
        };

        let err = host.open(&request).err().unwrap();

        let message = err.to_string();
        assert!(message.contains("no COM automation backend"));
        assert!(message.contains("3.1.4024.11 (pinned)"));
    }
}
