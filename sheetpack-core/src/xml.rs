//! Thin event writer over `quick_xml::Writer` used by every generated part

use crate::error::{PackError, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::borrow::Cow;

pub(crate) const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub(crate) const NS_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const NS_MC: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";
pub(crate) const NS_PACKAGE_REL: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
pub(crate) const NS_CONTENT_TYPES: &str =
    "http://schemas.openxmlformats.org/package/2006/content-types";
pub(crate) const NS_XDR: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
pub(crate) const NS_DRAWING_MAIN: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

/// Writes one XML part. Every event error is reported against the part name.
pub(crate) struct XmlWriter {
    part: String,
    inner: Writer<Vec<u8>>,
}

impl XmlWriter {
    /// Start a new document with the standalone XML declaration.
    pub(crate) fn new(part: impl Into<String>) -> Result<Self> {
        let mut writer = Self {
            part: part.into(),
            inner: Writer::new(Vec::new()),
        };
        writer.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        writer.inner.get_mut().push(b'\n');
        Ok(writer)
    }

    pub(crate) fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.event(Event::Start(element(name, attrs)))
    }

    pub(crate) fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.event(Event::Empty(element(name, attrs)))
    }

    pub(crate) fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    /// `<name attrs>text</name>`, with the text escaped and made XML-safe.
    pub(crate) fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attrs)?;
        self.event(Event::Text(BytesText::new(&xml_safe(text))))?;
        self.end(name)
    }

    pub(crate) fn finish(self) -> Result<String> {
        String::from_utf8(self.inner.into_inner()).map_err(|e| PackError::serialize(self.part, e))
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.inner
            .write_event(event)
            .map_err(|e| PackError::serialize(self.part.clone(), e))
    }
}

fn element<'a>(name: &'a str, attrs: &[(&'a str, &'a str)]) -> BytesStart<'a> {
    let mut elem = BytesStart::new(name);
    for &(key, value) in attrs {
        elem.push_attribute((key, xml_safe(value).as_ref()));
    }
    elem
}

/// Replace characters XML 1.0 cannot carry with U+FFFD.
///
/// Allowed are tab, LF, CR, and everything from U+0020 up except the
/// noncharacters U+FFFE and U+FFFF.
pub(crate) fn xml_safe(text: &str) -> Cow<'_, str> {
    let illegal = |c: char| {
        matches!(
            c,
            '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}'
        )
    };
    if text.contains(illegal) {
        Cow::Owned(
            text.chars()
                .map(|c| if illegal(c) { char::REPLACEMENT_CHARACTER } else { c })
                .collect(),
        )
    } else {
        Cow::Borrowed(text)
    }
}

/// Attribute-value form of a boolean as the spreadsheet schema spells it.
pub(crate) fn bool_attr(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}
