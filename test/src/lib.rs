//! Fixtures shared by the tests of every crate.
//!
//! A fixture solution lives in a directory named after it, with its TwinCAT
//! project one level further down:
//!
//! ```text
//! resources/test/Library/Library.sln
//! resources/test/Library/Library/Library.tsproj
//! ```
//!
//! Tree item documents sit directly in `resources/test`.

use std::{fs, path::PathBuf};

/// A fixture solution and its TwinCAT project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Solution {
    /// Pinned to TwinCAT 3.1.4024.11, Visual Studio 15.0.
    Library,
    /// TwinCAT 3.1.4024.22, not pinned, Visual Studio 16.0.
    Unpinned,
    /// Only a C# project, no TwinCAT project.
    NoProject,
    /// The TwinCAT project has no `TcVersion`.
    NoVersion,
    /// The solution has no `VisualStudioVersion` header.
    NoIdeVersion,
}

impl Solution {
    pub fn name(&self) -> &'static str {
        match self {
            Solution::Library => "Library",
            Solution::Unpinned => "Unpinned",
            Solution::NoProject => "NoProject",
            Solution::NoVersion => "NoVersion",
            Solution::NoIdeVersion => "NoIdeVersion",
        }
    }

    /// The `.sln` file.
    pub fn path(&self) -> PathBuf {
        let name = self.name();
        resource_path(&format!("{name}/{name}.sln"))
    }

    pub fn read(&self) -> String {
        read(self.path())
    }

    /// The `.tsproj` file. [`Solution::NoProject`] has none on disk.
    pub fn tsproj_path(&self) -> PathBuf {
        let name = self.name();
        resource_path(&format!("{name}/{name}/{name}.tsproj"))
    }
}

/// A `<TreeItem>` document as the automation interface produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeItem {
    /// The task `PlcTask`, disabled flag and autostart both false.
    RealTimeTask,
    /// A PLC project on AMS port 851.
    PlcProject,
}

impl TreeItem {
    pub fn read(&self) -> String {
        let file = match self {
            TreeItem::RealTimeTask => "realtime_task.xml",
            TreeItem::PlcProject => "plc_project.xml",
        };
        read(resource_path(file))
    }
}

/// The path of `name` relative to the fixture directory. The file need not
/// exist.
pub fn resource_path(name: &str) -> PathBuf {
    [env!("CARGO_MANIFEST_DIR"), "..", "resources", "test"]
        .iter()
        .collect::<PathBuf>()
        .join(name)
}

fn read(path: PathBuf) -> String {
    match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) => panic!("Unable to read fixture {}: {err}", path.display()),
    }
}
