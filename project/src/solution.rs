//! Reads Visual Studio solution (`.sln`) files.
//!
//! A solution is a line-oriented text file. Two kinds of lines matter here:
//!
//! ```text
//! VisualStudioVersion = 15.0.28307.1300
//! Project("{B1E792BE-AA5F-4E3C-8C82-674BF9C0715B}") = "Lib", "Lib\Lib.tsproj", "{9A6B...}"
//! ```
//!
//! The first selects the Visual Studio automation object to create, the
//! second locates the TwinCAT project inside the solution.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, trace};

use crate::error::ProjectError;

const VISUAL_STUDIO_VERSION: &str = "VisualStudioVersion";
const PROJECT: &str = "Project(";

/// Extensions of project files that the TwinCAT engineering environment owns.
const TWINCAT_PROJECT_EXTENSIONS: [&str; 2] = ["tsproj", "tspproj"];

/// One `Project(...)` entry of a solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionProject {
    pub type_guid: String,
    pub name: String,
    /// The project file path relative to the solution, as written in the
    /// solution (usually with `\` separators).
    pub path: String,
    pub guid: String,
}

impl SolutionProject {
    fn parse(line: &str) -> Option<Self> {
        let values = quoted_values(line.strip_prefix(PROJECT)?);
        match values.as_slice() {
            [type_guid, name, path, guid, ..] => Some(SolutionProject {
                type_guid: type_guid.to_string(),
                name: name.to_string(),
                path: path.to_string(),
                guid: guid.to_string(),
            }),
            _ => None,
        }
    }

    /// Returns true if the project file is a TwinCAT project.
    pub fn is_twincat(&self) -> bool {
        let normalized = self.path.replace('\\', "/");
        Path::new(&normalized)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                TWINCAT_PROJECT_EXTENSIONS
                    .iter()
                    .any(|candidate| ext.eq_ignore_ascii_case(candidate))
            })
    }
}

/// Returns the contents of each `"..."` in the text, in order.
fn quoted_values(text: &str) -> Vec<&str> {
    text.split('"').skip(1).step_by(2).collect()
}

/// A Visual Studio solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    path: PathBuf,
    visual_studio_version: Option<String>,
    projects: Vec<SolutionProject>,
}

impl Solution {
    /// Reads the solution file at `path`.
    pub fn read(path: &Path) -> Result<Self, ProjectError> {
        let content = fs::read_to_string(path).map_err(|e| ProjectError::io(path, e))?;
        Ok(Self::parse(path, &content))
    }

    /// Reads the solution from `content` that was loaded from `path`.
    ///
    /// Lines that are not understood are skipped, so this never fails.
    pub fn parse(path: &Path, content: &str) -> Self {
        let mut visual_studio_version = None;
        let mut projects = vec![];

        for line in content.trim_start_matches('\u{feff}').lines() {
            let line = line.trim();
            if line.starts_with(PROJECT) {
                match SolutionProject::parse(line) {
                    Some(project) => {
                        trace!("Solution project {project:?}");
                        projects.push(project);
                    }
                    None => debug!("Skipping malformed project line: {line}"),
                }
            } else if let Some(rest) = line.strip_prefix(VISUAL_STUDIO_VERSION) {
                if let Some((_, value)) = rest.split_once('=') {
                    let value = value.trim();
                    if !value.is_empty() {
                        visual_studio_version = Some(value.to_string());
                    }
                }
            }
        }

        Solution {
            path: path.to_path_buf(),
            visual_studio_version,
            projects,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The full Visual Studio version, for example `15.0.28307.1300`.
    pub fn visual_studio_version(&self) -> Option<&str> {
        self.visual_studio_version.as_deref()
    }

    /// The `major.minor` version that names the automation object, for
    /// example `15.0`.
    pub fn dte_version(&self) -> Option<String> {
        let mut parts = self.visual_studio_version.as_deref()?.split('.');
        let major = parts.next().filter(|p| !p.is_empty())?;
        let minor = parts.next().filter(|p| !p.is_empty())?;
        Some(format!("{major}.{minor}"))
    }

    pub fn projects(&self) -> &[SolutionProject] {
        &self.projects
    }

    /// Returns the path of the first TwinCAT project in the solution.
    ///
    /// The path is resolved against the directory of the solution file.
    /// Existence of the file is not checked.
    pub fn twincat_project(&self) -> Option<PathBuf> {
        let project = self.projects.iter().find(|p| p.is_twincat())?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new(""));
        Some(dir.join(project.path.replace('\\', "/")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcexport_test::Solution as Fixture;

    #[test]
    fn read_when_twincat_solution_then_finds_project() {
        let path = Fixture::Library.path();
        let solution = Solution::read(&path).unwrap();

        assert_eq!(solution.projects().len(), 1);
        assert_eq!(solution.projects()[0].name, "Library");
        let project = solution.twincat_project().unwrap();
        assert!(project.is_file(), "{} should exist", project.display());
        assert!(project.ends_with("Library/Library.tsproj"));
    }

    #[test]
    fn read_when_file_missing_then_err() {
        let result = Solution::read(Path::new("does/not/exist.sln"));
        assert!(matches!(result, Err(ProjectError::Io { .. })));
    }

    #[test]
    fn parse_when_no_twincat_project_then_none() {
        let content = Fixture::NoProject.read();
        let solution = Solution::parse(Path::new("NoProject.sln"), &content);

        assert_eq!(solution.projects().len(), 1);
        assert_eq!(solution.twincat_project(), None);
    }

    #[test]
    fn parse_when_visual_studio_version_then_dte_version() {
        let content = Fixture::Unpinned.read();
        let solution = Solution::parse(Path::new("Unpinned.sln"), &content);

        assert_eq!(solution.visual_studio_version(), Some("16.0.30804.86"));
        assert_eq!(solution.dte_version(), Some(String::from("16.0")));
    }

    #[test]
    fn parse_when_no_visual_studio_version_then_none() {
        let content = "Project(\"{A}\") = \"P\", \"P\\P.tsproj\", \"{B}\"\nEndProject\n";
        let solution = Solution::parse(Path::new("x.sln"), content);

        assert_eq!(solution.visual_studio_version(), None);
        assert_eq!(solution.dte_version(), None);
    }

    #[test]
    fn parse_when_standalone_plc_project_then_twincat() {
        let content = "\u{feff}Project(\"{A}\") = \"Plc\", \"Plc\\Plc.TSPPROJ\", \"{B}\"\n";
        let solution = Solution::parse(Path::new("dir/x.sln"), content);

        assert_eq!(
            solution.twincat_project(),
            Some(PathBuf::from("dir/Plc/Plc.TSPPROJ"))
        );
    }

    #[test]
    fn parse_when_project_line_truncated_then_skipped() {
        let content = "Project(\"{A}\") = \"P\"\n";
        let solution = Solution::parse(Path::new("x.sln"), content);
        assert!(solution.projects().is_empty());
    }

    #[test]
    fn parse_when_name_contains_comma_then_kept() {
        let content = "Project(\"{A}\") = \"A, B\", \"A\\A.tsproj\", \"{B}\"\n";
        let solution = Solution::parse(Path::new("x.sln"), content);
        assert_eq!(solution.projects()[0].name, "A, B");
    }
}
