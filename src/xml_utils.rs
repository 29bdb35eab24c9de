//! Indented XML output shared by the eCDF and FAIA writers.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Cursor;

use crate::core::EcdfError;

pub(crate) fn xml_io(e: std::io::Error) -> EcdfError {
    EcdfError::Xml(format!("XML write error: {e}"))
}

/// Indented quick-xml writer over an in-memory buffer.
pub(crate) struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    /// Writer for a complete document, starting with the XML declaration.
    pub fn new() -> Result<Self, EcdfError> {
        let mut writer = Self::fragment();
        writer
            .writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(writer)
    }

    /// Writer for a detached subtree, without XML declaration.
    pub fn fragment() -> Self {
        Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.writer.into_inner().into_inner()
    }

    pub fn into_string(self) -> Result<String, EcdfError> {
        String::from_utf8(self.into_bytes())
            .map_err(|e| EcdfError::Xml(format!("XML UTF-8 error: {e}")))
    }

    pub fn start_element(&mut self, name: &str) -> Result<&mut Self, EcdfError> {
        self.writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, EcdfError> {
        let mut elem = BytesStart::new(name);
        for (k, v) in attrs {
            elem.push_attribute((*k, *v));
        }
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, EcdfError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, EcdfError> {
        self.start_element(name)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    pub fn text_element_with_attrs(
        &mut self,
        name: &str,
        text: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, EcdfError> {
        self.start_element_with_attrs(name, attrs)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    /// Write `<!--text-->`.
    pub fn comment(&mut self, text: &str) -> Result<&mut Self, EcdfError> {
        let text = comment_text(text);
        self.writer
            .write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
            .map_err(xml_io)?;
        Ok(self)
    }
}

/// Make `text` legal inside an XML comment: no `--`, no trailing `-`.
pub(crate) fn comment_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '-' && out.ends_with('-') {
            out.push(' ');
        }
        out.push(c);
    }
    if out.ends_with('-') {
        out.push(' ');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_text_cases() {
        assert_eq!(comment_text(" credit - 106 - Owner "), " credit - 106 - Owner ");
        assert_eq!(comment_text("a--b"), "a- -b");
        assert_eq!(comment_text("a---"), "a- - - ");
    }

    #[test]
    fn fragment_has_no_declaration() {
        let mut w = XmlWriter::fragment();
        w.text_element_with_attrs("Choice", "1", &[("id", "204")]).unwrap();
        assert_eq!(
            String::from_utf8(w.into_bytes()).unwrap(),
            r#"<Choice id="204">1</Choice>"#
        );
    }

    #[test]
    fn document_starts_with_declaration() {
        let mut w = XmlWriter::new().unwrap();
        w.start_element("AuditFile").unwrap();
        w.text_element("AuditFileVersion", "2.01B").unwrap();
        w.end_element("AuditFile").unwrap();
        let xml = w.into_string().unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains("\n  <AuditFileVersion>2.01B</AuditFileVersion>\n"));
    }

    #[test]
    fn escapes_text() {
        let mut w = XmlWriter::fragment();
        w.text_element("TextField", "A & B <C>").unwrap();
        let xml = String::from_utf8(w.into_bytes()).unwrap();
        assert!(xml.contains("A &amp; B &lt;C&gt;"));
    }
}
