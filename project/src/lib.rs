//! TwinCAT project files and configuration tree XML.
//!
//! This crate holds the parts of `tcexport` that do not need a running
//! engineering environment:
//!
//! - **solution**: reads a Visual Studio solution file to find the TwinCAT
//!   project and the Visual Studio version
//! - **tsproj**: reads the TwinCAT version and pin state of a project file
//! - **tree_item**: edits the XML produced by configuration tree items
//!   (real-time tasks, PLC projects)
//!
//! Edits never reformat a document. Only the bytes of the edited element
//! change, so a document written back through the automation interface is
//! otherwise exactly what the interface produced.

pub mod error;
pub mod solution;
mod splice;
pub mod tree_item;
pub mod tsproj;

pub use error::{ProjectError, XmlError};
pub use solution::{Solution, SolutionProject};
pub use tsproj::TwinCatProject;
