//! Automation interfaces of the engineering environment.
//!
//! `tcexport` drives two object models that it does not own: the Visual
//! Studio automation model (the DTE) and the TwinCAT System Manager. This
//! crate describes the parts of them that `tcexport` uses as traits, so that
//! the orchestration can be written and tested without either being present.
//!
//! - **session**: acquiring an IDE session and driving solution builds
//! - **tree**: the TwinCAT configuration tree and PLC projects
//! - **diagnostics**: classification of build error list entries
//! - **version**: which TwinCAT version a session should use
//! - **message_filter**: the re-entrancy filter that single threaded COM
//!   apartments need while a long automation call is running

pub mod diagnostics;
pub mod error;
#[cfg(any(test, feature = "fake"))]
pub mod fake;
pub mod message_filter;
pub mod session;
pub mod tree;
pub mod unavailable;
pub mod version;

pub use diagnostics::{BuildSummary, ErrorItem, ErrorLevel};
pub use error::AutomationError;
pub use message_filter::{FilterGuard, MessageFilter, ProcessMessageFilter, ReentrancyPolicy};
pub use session::{AutomationHost, IdeSession, SessionGuard, SessionKiller, SessionRequest};
pub use tree::{PlcProject, SystemManager, TreeItem};
pub use unavailable::UnavailableHost;
pub use version::VersionSelection;
