//! Edits the XML of TwinCAT configuration tree items.
//!
//! Tree items describe themselves as a `<TreeItem>` document (produced by
//! the automation interface) and accept a changed document back. The
//! functions here read and rewrite individual fields of that document.
//!
//! Absent fields are not errors: every function returns `Ok(None)` when the
//! element it needs is not in the document, and callers must not write such
//! a result back. A document that cannot be parsed is an error.

use log::debug;
use roxmltree::Document;

use crate::error::XmlError;
use crate::splice::{display_path, inner_text, select, Edits};

const DISABLED: [&str; 2] = ["TreeItem", "Disabled"];
const AUTO_START: [&str; 3] = ["TreeItem", "TaskDef", "AutoStart"];
const ITEM_NAME: [&str; 2] = ["TreeItem", "ItemName"];
const PLC_PROJECT_DEF: [&str; 2] = ["TreeItem", "PlcProjectDef"];
const ADS_PORT: [&str; 3] = ["TreeItem", "PlcProjectDef", "AdsPort"];

const COMPILER_DEFINES: &str = "CompilerDefines";

/// Sets the `<Disabled>` and `<AutoStart>` flags of a real-time task.
///
/// Returns the updated document, or `None` if either element is missing.
/// Only the content of the two elements changes.
pub fn set_disabled_and_autostart(
    xml: &str,
    disabled: bool,
    autostart: bool,
) -> Result<Option<String>, XmlError> {
    let doc = Document::parse(xml)?;

    let Some(disabled_node) = select(&doc, &DISABLED) else {
        debug!("{} not found in tree item", display_path(&DISABLED));
        return Ok(None);
    };
    let Some(auto_start_node) = select(&doc, &AUTO_START) else {
        debug!("{} not found in tree item", display_path(&AUTO_START));
        return Ok(None);
    };

    let mut edits = Edits::new(xml);
    edits.set_text(disabled_node, bool_text(disabled));
    edits.set_text(auto_start_node, bool_text(autostart));
    Ok(edits.apply())
}

/// Reads the `<Disabled>` flag of a real-time task.
pub fn disabled(xml: &str) -> Result<Option<bool>, XmlError> {
    read_bool(xml, &DISABLED)
}

/// Reads the `<AutoStart>` flag of a real-time task.
pub fn autostart(xml: &str) -> Result<Option<bool>, XmlError> {
    read_bool(xml, &AUTO_START)
}

/// Reads the `<ItemName>` of a tree item.
pub fn item_name(xml: &str) -> Result<Option<String>, XmlError> {
    let doc = Document::parse(xml)?;
    Ok(select(&doc, &ITEM_NAME).map(inner_text))
}

/// Reads the AMS port that a PLC project runs on.
///
/// Returns `None` if the document has no `<AdsPort>` and an error if the
/// element does not hold a port number.
pub fn ams_port(xml: &str) -> Result<Option<u16>, XmlError> {
    let doc = Document::parse(xml)?;
    let Some(node) = select(&doc, &ADS_PORT) else {
        return Ok(None);
    };

    let text = inner_text(node);
    text.trim()
        .parse::<u16>()
        .map(Some)
        .map_err(|_| XmlError::InvalidInteger {
            path: display_path(&ADS_PORT),
            text,
        })
}

/// Appends a `<CompilerDefines>` element to the PLC project definition.
///
/// Existing defines are left alone, so calling this twice with the same
/// value gives two elements. Returns `None` if the document has no
/// `<PlcProjectDef>`.
pub fn add_compiler_define(xml: &str, define: &str) -> Result<Option<String>, XmlError> {
    let doc = Document::parse(xml)?;
    let Some(target) = select(&doc, &PLC_PROJECT_DEF) else {
        debug!("{} not found in tree item", display_path(&PLC_PROJECT_DEF));
        return Ok(None);
    };

    let mut edits = Edits::new(xml);
    edits.append_child(target, COMPILER_DEFINES, define);
    Ok(edits.apply())
}

fn read_bool(xml: &str, path: &[&str]) -> Result<Option<bool>, XmlError> {
    let doc = Document::parse(xml)?;
    Ok(select(&doc, path).and_then(|node| {
        let text = inner_text(node);
        let text = text.trim();
        if text.eq_ignore_ascii_case("true") {
            Some(true)
        } else if text.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }))
}

fn bool_text(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tcexport_test::TreeItem;

    const TASK: &str = "<TreeItem><Disabled>false</Disabled><TaskDef><AutoStart>false</AutoStart></TaskDef></TreeItem>";

    #[test]
    fn set_disabled_and_autostart_when_both_present_then_both_rewritten() {
        let result = set_disabled_and_autostart(TASK, true, true).unwrap();
        assert_eq!(
            result.unwrap(),
            "<TreeItem><Disabled>true</Disabled><TaskDef><AutoStart>true</AutoStart></TaskDef></TreeItem>"
        );
    }

    #[rstest]
    #[case(false, false)]
    #[case(false, true)]
    #[case(true, false)]
    #[case(true, true)]
    fn set_disabled_and_autostart_when_read_back_then_same_values(
        #[case] disabled_value: bool,
        #[case] autostart_value: bool,
    ) {
        let xml = TreeItem::RealTimeTask.read();
        let result = set_disabled_and_autostart(&xml, disabled_value, autostart_value)
            .unwrap()
            .unwrap();

        assert_eq!(disabled(&result).unwrap(), Some(disabled_value));
        assert_eq!(autostart(&result).unwrap(), Some(autostart_value));
    }

    #[test]
    fn set_disabled_and_autostart_when_applied_then_other_bytes_unchanged() {
        let xml = TreeItem::RealTimeTask.read();
        let result = set_disabled_and_autostart(&xml, true, true)
            .unwrap()
            .unwrap();

        let expected = xml
            .replace("<Disabled>false</Disabled>", "<Disabled>true</Disabled>")
            .replace("<AutoStart>false</AutoStart>", "<AutoStart>true</AutoStart>");
        assert_eq!(result, expected);
    }

    #[test]
    fn set_disabled_and_autostart_when_applied_twice_then_same_as_once() {
        let xml = TreeItem::RealTimeTask.read();
        let once = set_disabled_and_autostart(&xml, true, false)
            .unwrap()
            .unwrap();
        let twice = set_disabled_and_autostart(&once, true, false)
            .unwrap()
            .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn set_disabled_and_autostart_when_disabled_missing_then_none() {
        let xml = "<TreeItem><TaskDef><AutoStart>false</AutoStart></TaskDef></TreeItem>";
        assert_eq!(set_disabled_and_autostart(xml, true, true).unwrap(), None);
    }

    #[test]
    fn set_disabled_and_autostart_when_autostart_missing_then_none() {
        let xml = "<TreeItem><Disabled>false</Disabled><TaskDef/></TreeItem>";
        assert_eq!(set_disabled_and_autostart(xml, true, true).unwrap(), None);
    }

    #[test]
    fn set_disabled_and_autostart_when_wrong_root_then_none() {
        let xml = "<Task><Disabled>false</Disabled><TaskDef><AutoStart>false</AutoStart></TaskDef></Task>";
        assert_eq!(set_disabled_and_autostart(xml, true, true).unwrap(), None);
    }

    #[test]
    fn set_disabled_and_autostart_when_malformed_then_err() {
        let result = set_disabled_and_autostart("<TreeItem><Disabled>", true, true);
        assert!(matches!(result, Err(XmlError::Malformed(_))));
    }

    #[test]
    fn item_name_when_present_then_text() {
        let xml = TreeItem::RealTimeTask.read();
        assert_eq!(item_name(&xml).unwrap(), Some(String::from("PlcTask")));
    }

    #[test]
    fn item_name_when_entity_then_decoded() {
        let xml = "<TreeItem><ItemName>A&amp;B</ItemName></TreeItem>";
        assert_eq!(item_name(xml).unwrap(), Some(String::from("A&B")));
    }

    #[test]
    fn item_name_when_missing_then_none() {
        assert_eq!(item_name("<TreeItem/>").unwrap(), None);
    }

    #[test]
    fn ams_port_when_present_then_value() {
        let xml = TreeItem::PlcProject.read();
        assert_eq!(ams_port(&xml).unwrap(), Some(851));
    }

    #[test]
    fn ams_port_when_missing_then_none() {
        let xml = "<TreeItem><PlcProjectDef/></TreeItem>";
        assert_eq!(ams_port(xml).unwrap(), None);
    }

    #[test]
    fn ams_port_when_not_a_number_then_err() {
        let xml = "<TreeItem><PlcProjectDef><AdsPort>port</AdsPort></PlcProjectDef></TreeItem>";
        let result = ams_port(xml);
        assert!(matches!(result, Err(XmlError::InvalidInteger { .. })));
    }

    #[test]
    fn add_compiler_define_when_called_twice_then_two_elements() {
        let xml = TreeItem::PlcProject.read();
        let once = add_compiler_define(&xml, "UNIT_TEST").unwrap().unwrap();
        let twice = add_compiler_define(&once, "UNIT_TEST").unwrap().unwrap();

        assert_eq!(
            twice
                .matches("<CompilerDefines>UNIT_TEST</CompilerDefines>")
                .count(),
            2
        );
        assert!(twice.contains(
            "\n\t<CompilerDefines>UNIT_TEST</CompilerDefines><CompilerDefines>UNIT_TEST</CompilerDefines></PlcProjectDef>"
        ));
    }

    #[test]
    fn add_compiler_define_when_appended_then_last_child() {
        let xml = "<TreeItem><PlcProjectDef><AdsPort>851</AdsPort></PlcProjectDef></TreeItem>";
        assert_eq!(
            add_compiler_define(xml, "A=1").unwrap().unwrap(),
            "<TreeItem><PlcProjectDef><AdsPort>851</AdsPort><CompilerDefines>A=1</CompilerDefines></PlcProjectDef></TreeItem>"
        );
    }

    #[test]
    fn add_compiler_define_when_no_project_def_then_none() {
        assert_eq!(add_compiler_define("<TreeItem/>", "A").unwrap(), None);
    }

    #[test]
    fn disabled_when_value_not_boolean_then_none() {
        let xml = "<TreeItem><Disabled>maybe</Disabled></TreeItem>";
        assert_eq!(disabled(xml).unwrap(), None);
    }
}
