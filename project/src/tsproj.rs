//! Reads TwinCAT project (`.tsproj`) files.
//!
//! The root `<TcSmProject>` element of a project file records the TwinCAT
//! version that last saved it (`TcVersion`) and whether the project is pinned
//! to that version (`TcVersionFixed`).

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use roxmltree::Document;

use crate::error::{ProjectError, XmlError};

const TC_SM_PROJECT: &str = "TcSmProject";
const TC_VERSION: &str = "TcVersion";
const TC_VERSION_FIXED: &str = "TcVersionFixed";

/// Returns true if the project is pinned to its TwinCAT version.
///
/// A document without a `<TcSmProject>` root or without the `TcVersionFixed`
/// attribute is not pinned. Only a malformed document is an error.
pub fn is_pinned(xml: &str) -> Result<bool, XmlError> {
    let doc = Document::parse(xml)?;
    Ok(pinned_from(&doc))
}

/// Returns the TwinCAT version that the project was saved with.
pub fn tc_version(xml: &str) -> Result<Option<String>, XmlError> {
    let doc = Document::parse(xml)?;
    Ok(version_from(&doc))
}

/// Reads an XML document from disk and checks that it is well formed.
pub fn read_document(path: &Path) -> Result<String, ProjectError> {
    let content = read_text(path)?;
    Document::parse(&content).map_err(|e| ProjectError::xml(path, e.into()))?;
    Ok(content)
}

fn read_text(path: &Path) -> Result<String, ProjectError> {
    let content = fs::read_to_string(path).map_err(|e| ProjectError::io(path, e))?;
    Ok(match content.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => content,
    })
}

fn project_root<'a, 'input>(doc: &'a Document<'input>) -> Option<roxmltree::Node<'a, 'input>> {
    let root = doc.root_element();
    (root.tag_name().name() == TC_SM_PROJECT).then_some(root)
}

fn pinned_from(doc: &Document) -> bool {
    let Some(value) = project_root(doc).and_then(|root| root.attribute(TC_VERSION_FIXED)) else {
        return false;
    };

    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        true
    } else {
        if !value.eq_ignore_ascii_case("false") {
            warn!(
                "{TC_VERSION_FIXED}=\"{value}\" is not a boolean, treating the project as not pinned"
            );
        }
        false
    }
}

fn version_from(doc: &Document) -> Option<String> {
    project_root(doc)
        .and_then(|root| root.attribute(TC_VERSION))
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .map(String::from)
}

/// The facts about a TwinCAT project file that select the toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwinCatProject {
    path: PathBuf,
    version: Option<String>,
    pinned: bool,
}

impl TwinCatProject {
    /// Reads the project file at `path`.
    pub fn read(path: &Path) -> Result<Self, ProjectError> {
        let content = read_text(path)?;
        Self::parse(path, &content).map_err(|e| ProjectError::xml(path, e))
    }

    /// Reads the project from `content` that was loaded from `path`.
    pub fn parse(path: &Path, content: &str) -> Result<Self, XmlError> {
        let doc = Document::parse(content)?;
        let project = TwinCatProject {
            path: path.to_path_buf(),
            version: version_from(&doc),
            pinned: pinned_from(&doc),
        };
        debug!(
            "TwinCAT project {} version {:?} pinned {}",
            path.display(),
            project.version,
            project.pinned
        );
        Ok(project)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `TcVersion` of the project, if it has one.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }
}
