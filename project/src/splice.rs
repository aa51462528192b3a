//! Byte-preserving edits of an XML document.
//!
//! roxmltree gives a read-only tree, so an edit is made by locating the byte
//! range of an element in the source text and splicing replacement text into
//! a copy of the source. Everything outside the spliced ranges is copied as
//! is, which keeps whitespace, comments, attribute quoting and the XML
//! declaration exactly as the automation interface produced them.

use std::ops::Range;

use quick_xml::escape::partial_escape;
use roxmltree::{Document, Node};

/// Selects the element at an absolute path of local names.
///
/// The first step must name the root element. Each following step selects
/// the first child element with that name.
pub(crate) fn select<'a, 'input>(
    doc: &'a Document<'input>,
    path: &[&str],
) -> Option<Node<'a, 'input>> {
    let (first, rest) = path.split_first()?;
    let root = doc.root_element();
    if root.tag_name().name() != *first {
        return None;
    }
    rest.iter()
        .try_fold(root, |node, name| child_element(node, name))
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

/// Returns the text of every descendant text node, concatenated.
pub(crate) fn inner_text(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Formats an absolute path for messages.
pub(crate) fn display_path(path: &[&str]) -> String {
    format!("/{}", path.join("/"))
}

/// Where the parts of an element sit in the source text.
struct ElementSpan<'s> {
    /// The whole element, from `<` of the start tag to `>` of the end tag.
    range: Range<usize>,
    /// Offset of the `>` that closes the start tag.
    start_tag_close: usize,
    /// Offset of the `</` that opens the end tag. `None` for `<Name/>`.
    end_tag_open: Option<usize>,
    /// The element name as written, including any namespace prefix.
    qname: &'s str,
}

impl<'s> ElementSpan<'s> {
    fn of(source: &'s str, node: Node) -> Option<Self> {
        let range = node.range();
        let element = source.get(range.clone())?;

        let close = start_tag_close(element)?;
        let self_closing = element[..close].ends_with('/');
        let end_tag_open = if self_closing {
            None
        } else {
            Some(range.start + element.rfind("</")?)
        };

        let name_len = element[1..]
            .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .unwrap_or(element.len() - 1);
        let qname = &element[1..1 + name_len];

        Some(ElementSpan {
            start_tag_close: range.start + close,
            range,
            end_tag_open,
            qname,
        })
    }

    /// The start tag without its closing `>` or `/>`.
    fn head(&self, source: &'s str) -> &'s str {
        source[self.range.start..self.start_tag_close]
            .trim_end_matches('/')
            .trim_end()
    }
}

/// Finds the `>` closing the start tag, skipping quoted attribute values.
fn start_tag_close(element: &str) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, b) in element.bytes().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return Some(i),
                _ => {}
            },
        }
    }
    None
}

/// A set of edits against one source document.
///
/// Edits are recorded against offsets in the original text and applied
/// together, so recording one edit never shifts the offsets of another.
/// Edits must not overlap.
pub(crate) struct Edits<'s> {
    source: &'s str,
    replacements: Vec<(Range<usize>, String)>,
    failed: bool,
}

impl<'s> Edits<'s> {
    pub(crate) fn new(source: &'s str) -> Self {
        Edits {
            source,
            replacements: vec![],
            failed: false,
        }
    }

    /// Replaces the content of `node` with `text`.
    ///
    /// Child nodes of the element are replaced too, in the same way that
    /// assigning the inner text of a DOM element would.
    pub(crate) fn set_text(&mut self, node: Node, text: &str) {
        let Some(span) = ElementSpan::of(self.source, node) else {
            self.failed = true;
            return;
        };
        let escaped = partial_escape(text);

        match span.end_tag_open {
            Some(end_tag_open) => self
                .replacements
                .push((span.start_tag_close + 1..end_tag_open, escaped.into_owned())),
            None => {
                let element = format!(
                    "{}>{}</{}>",
                    span.head(self.source),
                    escaped,
                    span.qname
                );
                self.replacements.push((span.range, element));
            }
        }
    }

    /// Appends `<tag>text</tag>` as the last child of `node`.
    pub(crate) fn append_child(&mut self, node: Node, tag: &str, text: &str) {
        let Some(span) = ElementSpan::of(self.source, node) else {
            self.failed = true;
            return;
        };
        let child = format!("<{}>{}</{}>", tag, partial_escape(text), tag);

        match span.end_tag_open {
            Some(end_tag_open) => self
                .replacements
                .push((end_tag_open..end_tag_open, child)),
            None => {
                let element = format!(
                    "{}>{}</{}>",
                    span.head(self.source),
                    child,
                    span.qname
                );
                self.replacements.push((span.range, element));
            }
        }
    }

    /// Applies the edits, returning the new document.
    ///
    /// Returns `None` if any element could not be located in the source.
    pub(crate) fn apply(mut self) -> Option<String> {
        if self.failed {
            return None;
        }

        self.replacements
            .sort_by(|(a, _), (b, _)| b.start.cmp(&a.start));

        let mut out = self.source.to_string();
        for (range, text) in self.replacements {
            out.replace_range(range, &text);
        }
        Some(out)
    }
}
