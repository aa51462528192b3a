//! The TwinCAT configuration tree.
//!
//! Items in the tree are addressed by path. A path starts with a shortcut
//! naming a top level node and continues with child names separated by `^`,
//! for example `TIPC^Library^Library Project`.

use std::path::Path;

use crate::error::AutomationError;

/// Shortcut of the PLC configuration node.
pub const PLC_CONFIGURATION: &str = "TIPC";
/// Shortcut of the additional real-time tasks node.
pub const REAL_TIME_TASKS: &str = "TIRT";
/// Shortcut of the ADS routes node.
pub const ROUTES: &str = "TIRR";
/// Shortcut of the real-time settings node.
pub const REAL_TIME_SETTINGS: &str = "TIRS";

pub const PATH_SEPARATOR: char = '^';

/// Returns the path of a child below `parent`.
pub fn child_path(parent: &str, child: &str) -> String {
    format!("{parent}{PATH_SEPARATOR}{child}")
}

/// A node of the configuration tree.
///
/// Tree items are handles to objects owned by the engineering environment,
/// so changes go through `&self`.
pub trait TreeItem {
    fn name(&self) -> String;

    fn child_count(&self) -> usize;

    fn children(&self) -> Result<Vec<Box<dyn TreeItem>>, AutomationError>;

    /// Describes the item as a `<TreeItem>` XML document.
    fn produce_xml(&self) -> Result<String, AutomationError>;

    /// Applies a changed `<TreeItem>` XML document to the item.
    fn consume_xml(&self, xml: &str) -> Result<(), AutomationError>;
}

/// A PLC project node.
pub trait PlcProject: TreeItem {
    /// Runs the static check of every object in the project. Returns false
    /// if the check found errors.
    fn check_all_objects(&self) -> Result<bool, AutomationError>;

    /// Saves the project as a library. When `install` is set the library is
    /// also installed into the local library repository.
    fn save_as_library(&self, path: &Path, install: bool) -> Result<(), AutomationError>;
}

/// Looks up items in the configuration tree.
pub trait SystemManager {
    fn lookup_tree_item(&self, path: &str) -> Result<Box<dyn TreeItem>, AutomationError>;

    fn lookup_plc_project(&self, path: &str) -> Result<Box<dyn PlcProject>, AutomationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_path_when_plc_project_then_joined_with_caret() {
        assert_eq!(
            child_path(PLC_CONFIGURATION, "Library^Library Project"),
            "TIPC^Library^Library Project"
        );
    }

    #[test]
    fn child_path_when_shortcuts_then_distinct_roots() {
        let roots = [PLC_CONFIGURATION, REAL_TIME_TASKS, ROUTES, REAL_TIME_SETTINGS];
        for (index, root) in roots.iter().enumerate() {
            assert!(!roots[index + 1..].contains(root));
            assert!(child_path(root, "Item").starts_with(root));
        }
    }
}
