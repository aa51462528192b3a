//! Classification of the IDE error list after a build.

use std::fmt;

/// Severity of an error list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLevel {
    /// Informational message.
    Low,
    /// Warning.
    Medium,
    /// Error.
    High,
}

impl fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorLevel::Low => write!(f, "low"),
            ErrorLevel::Medium => write!(f, "medium"),
            ErrorLevel::High => write!(f, "high"),
        }
    }
}

/// One entry of the IDE error list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorItem {
    pub level: ErrorLevel,
    pub description: String,
    pub file_name: String,
}

impl ErrorItem {
    pub fn new(
        level: ErrorLevel,
        description: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        ErrorItem {
            level,
            description: description.into(),
            file_name: file_name.into(),
        }
    }
}

/// Counts of warnings and the errors from a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub warnings: usize,
    pub errors: Vec<ErrorItem>,
}

impl BuildSummary {
    /// Sorts error list entries into warnings and errors. Messages are
    /// dropped.
    pub fn classify(items: &[ErrorItem]) -> Self {
        items
            .iter()
            .fold(BuildSummary::default(), |mut summary, item| {
                match item.level {
                    ErrorLevel::Low => {}
                    ErrorLevel::Medium => summary.warnings += 1,
                    ErrorLevel::High => summary.errors.push(item.clone()),
                }
                summary
            })
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
