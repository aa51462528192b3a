//! Errors for reading project files and editing XML.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from reading or editing an XML document held in memory.
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("XML parse error: {0}")]
    Malformed(#[from] roxmltree::Error),

    #[error("Element '{path}' contains '{text}' which is not a valid integer")]
    InvalidInteger { path: String, text: String },
}

/// Errors from reading a project file from disk.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Unable to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to parse {}: {source}", .path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: XmlError,
    },
}

impl ProjectError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        ProjectError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn xml(path: &std::path::Path, source: XmlError) -> Self {
        ProjectError::Xml {
            path: path.to_path_buf(),
            source,
        }
    }
}
