//! Instance validation against a compiled [`Schema`].
//!
//! Content models are matched greedily without backtracking, which is
//! sufficient for the deterministic content models XSD requires (Unique
//! Particle Attribution).

use std::str::FromStr;

use chrono::NaiveDate;
use roxmltree::{Document, Node};
use rust_decimal::Decimal;

use super::compile::{
    Builtin, Content, ComplexType, ElementDecl, Facets, Particle, Resolved, Schema, SimpleType,
    Term, TypeRef,
};
use crate::core::SchemaViolation;

const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

impl Schema {
    /// Validate a serialized document, returning the first violation.
    pub fn validate(&self, xml: &[u8]) -> Result<(), SchemaViolation> {
        let text = std::str::from_utf8(xml).map_err(|e| {
            SchemaViolation::new(1, format!("Input is not proper UTF-8: {e}"))
        })?;
        let doc = Document::parse(text).map_err(|e| SchemaViolation::new(e.pos().row, e.to_string()))?;
        let root = doc.root_element();

        let decl = self
            .elements
            .get(root.tag_name().name())
            .filter(|decl| decl_matches(decl, root))
            .ok_or_else(|| {
                violation(
                    root,
                    "No matching global declaration available for the validation root.",
                )
            })?;

        Checker { schema: self }.element(root, decl)
    }
}

enum Mismatch {
    /// Expected one of `names` at child index `at`.
    Expected { names: Vec<String>, at: usize },
    /// A matched child is itself invalid.
    Invalid(SchemaViolation),
}

struct Checker<'s> {
    schema: &'s Schema,
}

impl<'s> Checker<'s> {
    fn element(&self, node: Node, decl: &ElementDecl) -> Result<(), SchemaViolation> {
        let resolved = self.schema.resolve(&decl.ty).ok_or_else(|| {
            violation(node, "The type definition is absent.")
        })?;
        match resolved {
            Resolved::Builtin(_) | Resolved::Simple(_) => {
                self.reject_attributes(node, &[])?;
                self.simple_content(node, &decl.ty)
            }
            Resolved::Complex(ty) => self.complex(node, ty),
        }
    }

    fn complex(&self, node: Node, ty: &ComplexType) -> Result<(), SchemaViolation> {
        self.attributes(node, ty)?;
        match &ty.content {
            Content::Empty => {
                let has_text = text_of(node).chars().any(|c| !c.is_whitespace());
                if has_text || node.children().any(|n| n.is_element()) {
                    return Err(violation(
                        node,
                        "Character or element content is not allowed, because the content type is empty.",
                    ));
                }
                Ok(())
            }
            Content::Simple(simple) => self.simple_content(node, simple),
            Content::Elements(particle) => {
                if text_of(node).chars().any(|c| !c.is_whitespace()) {
                    return Err(violation(
                        node,
                        "Character content other than whitespace is not allowed because the content type is 'element-only'.",
                    ));
                }
                let kids: Vec<Node> = node.children().filter(Node::is_element).collect();
                let mut pos = 0;
                match self.particle(particle, &kids, &mut pos) {
                    Ok(()) => {}
                    Err(Mismatch::Invalid(v)) => return Err(v),
                    Err(Mismatch::Expected { names, at }) => {
                        let expected = format!("Expected is ( {} ).", names.join(", "));
                        return Err(match kids.get(at) {
                            Some(kid) => violation(
                                *kid,
                                &format!("This element is not expected. {expected}"),
                            ),
                            None => violation(
                                node,
                                &format!("Missing child element(s). {expected}"),
                            ),
                        });
                    }
                }
                match kids.get(pos) {
                    Some(kid) => Err(violation(*kid, "This element is not expected.")),
                    None => Ok(()),
                }
            }
        }
    }

    fn attributes(&self, node: Node, ty: &ComplexType) -> Result<(), SchemaViolation> {
        self.reject_attributes(node, &ty.attributes.iter().map(|a| a.name.as_str()).collect::<Vec<_>>())?;
        for decl in &ty.attributes {
            match node.attribute(decl.name.as_str()) {
                Some(value) => {
                    self.value(&decl.ty, value)
                        .map_err(|msg| attribute_violation(node, &decl.name, &msg))?;
                }
                None if decl.required => {
                    return Err(violation(
                        node,
                        &format!("The attribute '{}' is required but missing.", decl.name),
                    ));
                }
                None => {}
            }
        }
        Ok(())
    }

    fn reject_attributes(&self, node: Node, allowed: &[&str]) -> Result<(), SchemaViolation> {
        for attr in node.attributes() {
            if attr.namespace() == Some(XSI_NS) {
                continue;
            }
            if attr.namespace().is_some() || !allowed.contains(&attr.name()) {
                let name = attr.name();
                return Err(attribute_violation(
                    node,
                    name,
                    &format!("The attribute '{name}' is not allowed."),
                ));
            }
        }
        Ok(())
    }

    fn simple_content(&self, node: Node, ty: &TypeRef) -> Result<(), SchemaViolation> {
        if node.children().any(|n| n.is_element()) {
            return Err(violation(
                node,
                "Element content is not allowed, because the content type is a simple type definition.",
            ));
        }
        self.value(ty, &text_of(node))
            .map_err(|msg| violation(node, &msg))
    }

    /// Check a lexical value against a simple type. Returns the message body.
    fn value(&self, ty: &TypeRef, raw: &str) -> Result<(), String> {
        match self.schema.resolve(ty) {
            Some(Resolved::Builtin(b)) => builtin(b, normalize(b, raw)),
            Some(Resolved::Simple(simple)) => self.restricted(simple, raw),
            Some(Resolved::Complex(_)) | None => {
                Err("The type definition is not a simple type.".to_string())
            }
        }
    }

    fn restricted(&self, simple: &SimpleType, raw: &str) -> Result<(), String> {
        self.value(&simple.base, raw)?;
        let base = self.root_builtin(&simple.base);
        facets(&simple.facets, normalize(base, raw), base)
    }

    fn root_builtin(&self, ty: &TypeRef) -> Builtin {
        match self.schema.resolve(ty) {
            Some(Resolved::Builtin(b)) => b,
            Some(Resolved::Simple(s)) => self.root_builtin(&s.base),
            Some(Resolved::Complex(_)) | None => Builtin::String,
        }
    }

    fn particle(&self, p: &Particle, kids: &[Node], pos: &mut usize) -> Result<(), Mismatch> {
        let mut count = 0u32;
        while p.occurs.max.is_none_or(|max| count < max) {
            let Some(kid) = kids.get(*pos) else { break };
            if !self.starts(&p.term, *kid) {
                break;
            }
            let before = *pos;
            self.term(&p.term, kids, pos)?;
            count += 1;
            if *pos == before {
                break;
            }
        }
        if count < p.occurs.min && !self.term_nullable(&p.term) {
            let mut names = Vec::new();
            self.first_names(&p.term, &mut names);
            return Err(Mismatch::Expected { names, at: *pos });
        }
        Ok(())
    }

    fn term(&self, term: &Term, kids: &[Node], pos: &mut usize) -> Result<(), Mismatch> {
        match term {
            Term::Element(decl) => self.child(decl, kids, pos),
            Term::ElementRef(name) => match self.schema.elements.get(name) {
                Some(decl) => self.child(decl, kids, pos),
                None => Err(Mismatch::Expected { names: vec![name.clone()], at: *pos }),
            },
            Term::Sequence(items) => items.iter().try_for_each(|item| self.particle(item, kids, pos)),
            Term::Choice(items) => {
                let kid = kids.get(*pos);
                let branch = kid.and_then(|kid| {
                    items
                        .iter()
                        .find(|item| item.occurs.max != Some(0) && self.starts(&item.term, *kid))
                });
                match branch {
                    Some(item) => self.particle(item, kids, pos),
                    None if items.iter().any(|item| self.nullable(item)) => Ok(()),
                    None => {
                        let mut names = Vec::new();
                        self.first_names(term, &mut names);
                        Err(Mismatch::Expected { names, at: *pos })
                    }
                }
            }
        }
    }

    fn child(&self, decl: &ElementDecl, kids: &[Node], pos: &mut usize) -> Result<(), Mismatch> {
        let Some(kid) = kids.get(*pos) else {
            return Err(Mismatch::Expected { names: vec![decl.display_name()], at: *pos });
        };
        self.element(*kid, decl).map_err(Mismatch::Invalid)?;
        *pos += 1;
        Ok(())
    }

    fn nullable(&self, p: &Particle) -> bool {
        p.occurs.min == 0 || self.term_nullable(&p.term)
    }

    fn term_nullable(&self, term: &Term) -> bool {
        match term {
            Term::Element(_) | Term::ElementRef(_) => false,
            Term::Sequence(items) => items.iter().all(|item| self.nullable(item)),
            Term::Choice(items) => items.iter().any(|item| self.nullable(item)),
        }
    }

    /// Whether `kid` can be the first element matched by `term`.
    fn starts(&self, term: &Term, kid: Node) -> bool {
        match term {
            Term::Element(decl) => decl_matches(decl, kid),
            Term::ElementRef(name) => self
                .schema
                .elements
                .get(name)
                .is_some_and(|decl| decl_matches(decl, kid)),
            Term::Sequence(items) => {
                for item in items {
                    if item.occurs.max != Some(0) && self.starts(&item.term, kid) {
                        return true;
                    }
                    if !self.nullable(item) {
                        return false;
                    }
                }
                false
            }
            Term::Choice(items) => items
                .iter()
                .any(|item| item.occurs.max != Some(0) && self.starts(&item.term, kid)),
        }
    }

    fn first_names(&self, term: &Term, out: &mut Vec<String>) {
        match term {
            Term::Element(decl) => push_unique(out, decl.display_name()),
            Term::ElementRef(name) => match self.schema.elements.get(name) {
                Some(decl) => push_unique(out, decl.display_name()),
                None => push_unique(out, name.clone()),
            },
            Term::Sequence(items) => {
                for item in items {
                    self.first_names(&item.term, out);
                    if !self.nullable(item) {
                        break;
                    }
                }
            }
            Term::Choice(items) => {
                for item in items {
                    self.first_names(&item.term, out);
                }
            }
        }
    }
}

fn push_unique(out: &mut Vec<String>, name: String) {
    if !out.contains(&name) {
        out.push(name);
    }
}

fn decl_matches(decl: &ElementDecl, node: Node) -> bool {
    node.tag_name().name() == decl.name && node.tag_name().namespace() == decl.namespace.as_deref()
}

fn text_of(node: Node) -> String {
    node.children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

fn normalize(builtin: Builtin, raw: &str) -> &str {
    if builtin.collapses_whitespace() { raw.trim() } else { raw }
}

fn display_name(node: Node) -> String {
    match node.tag_name().namespace() {
        Some(ns) => format!("{{{ns}}}{}", node.tag_name().name()),
        None => node.tag_name().name().to_string(),
    }
}

fn violation(node: Node, message: &str) -> SchemaViolation {
    let line = node.document().text_pos_at(node.range().start).row;
    SchemaViolation::new(line, format!("Element '{}': {message}", display_name(node)))
}

fn attribute_violation(node: Node, attribute: &str, message: &str) -> SchemaViolation {
    let line = node.document().text_pos_at(node.range().start).row;
    SchemaViolation::new(
        line,
        format!(
            "Element '{}', attribute '{attribute}': {message}",
            display_name(node)
        ),
    )
}

fn builtin(b: Builtin, value: &str) -> Result<(), String> {
    let valid = match b {
        Builtin::String | Builtin::NormalizedString | Builtin::Token => true,
        Builtin::Decimal => is_decimal(value),
        Builtin::Integer => is_integer(value),
        Builtin::NonNegativeInteger => {
            is_integer(value)
                && value.strip_prefix('-').is_none_or(|d| d.bytes().all(|b| b == b'0'))
        }
        Builtin::PositiveInteger => {
            is_integer(value) && !value.starts_with('-') && value.bytes().any(|b| b.is_ascii_digit() && b != b'0')
        }
        Builtin::Date => is_date(value),
        Builtin::GYear => {
            let digits = value.strip_prefix('-').unwrap_or(value);
            digits.len() >= 4 && digits.bytes().all(|b| b.is_ascii_digit())
        }
        Builtin::Boolean => matches!(value, "true" | "false" | "1" | "0"),
    };
    if valid {
        Ok(())
    } else {
        Err(format!("'{value}' is not a valid value of the atomic type '{}'.", b.xs_name()))
    }
}

fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_decimal(value: &str) -> bool {
    let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);
    let (int, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    !(int.is_empty() && frac.is_empty())
        && int.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit())
}

fn is_date(value: &str) -> bool {
    if !value.is_ascii() {
        return false;
    }
    let date = value.strip_suffix('Z').unwrap_or(value);
    let date = match date.len().checked_sub(6).map(|i| date.split_at(i)) {
        Some((d, tz)) if d.len() == 10 && tz.len() == 6 && is_timezone(tz) => d,
        _ => date,
    };
    date.len() == 10 && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

fn is_timezone(tz: &str) -> bool {
    let b = tz.as_bytes();
    matches!(b[0], b'+' | b'-')
        && b[1].is_ascii_digit()
        && b[2].is_ascii_digit()
        && b[3] == b':'
        && b[4].is_ascii_digit()
        && b[5].is_ascii_digit()
}

fn facets(f: &Facets, value: &str, base: Builtin) -> Result<(), String> {
    if !f.patterns.is_empty() && !f.patterns.iter().any(|(_, re)| re.is_match(value)) {
        let pattern = f
            .patterns
            .iter()
            .map(|(p, _)| p.as_str())
            .collect::<Vec<_>>()
            .join("|");
        return Err(format!(
            "[facet 'pattern'] The value '{value}' is not accepted by the pattern '{pattern}'."
        ));
    }
    if !f.enumeration.is_empty() && !f.enumeration.iter().any(|e| e == value) {
        let set = f
            .enumeration
            .iter()
            .map(|e| format!("'{e}'"))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(format!(
            "[facet 'enumeration'] The value '{value}' is not an element of the set {{{set}}}."
        ));
    }

    let len = value.chars().count();
    if let Some(expected) = f.length.filter(|l| *l != len) {
        return Err(format!(
            "[facet 'length'] The value '{value}' has a length of '{len}'; this differs from the allowed length of '{expected}'."
        ));
    }
    if let Some(min) = f.min_length.filter(|m| len < *m) {
        return Err(format!(
            "[facet 'minLength'] The value '{value}' has a length of '{len}'; this underruns the allowed minimum length of '{min}'."
        ));
    }
    if let Some(max) = f.max_length.filter(|m| len > *m) {
        return Err(format!(
            "[facet 'maxLength'] The value '{value}' has a length of '{len}'; this exceeds the allowed maximum length of '{max}'."
        ));
    }

    let numeric = matches!(
        base,
        Builtin::Decimal | Builtin::Integer | Builtin::NonNegativeInteger | Builtin::PositiveInteger
    );
    if !numeric {
        return Ok(());
    }
    let Ok(number) = Decimal::from_str(value.strip_prefix('+').unwrap_or(value)) else {
        return Ok(());
    };
    if let Some(min) = f.min_inclusive.filter(|m| number < *m) {
        return Err(format!(
            "[facet 'minInclusive'] The value '{value}' is less than the minimum value allowed ('{min}')."
        ));
    }
    if let Some(max) = f.max_inclusive.filter(|m| number > *m) {
        return Err(format!(
            "[facet 'maxInclusive'] The value '{value}' is greater than the maximum value allowed ('{max}')."
        ));
    }

    let unsigned = value.trim_start_matches(['+', '-']);
    let (int, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let frac = frac.trim_end_matches('0');
    let int = int.trim_start_matches('0');
    if let Some(total) = f.total_digits.filter(|t| int.len() + frac.len() > *t as usize) {
        return Err(format!(
            "[facet 'totalDigits'] The value '{value}' has more digits than are allowed ('{total}')."
        ));
    }
    if let Some(fraction) = f.fraction_digits.filter(|d| frac.len() > *d as usize) {
        return Err(format!(
            "[facet 'fractionDigits'] The value '{value}' has more fractional digits than are allowed ('{fraction}')."
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const XSD: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:t" xmlns="urn:t" elementFormDefault="qualified">
  <xs:element name="Root">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="Head" type="xs:string"/>
        <xs:element name="Opt" type="xs:integer" minOccurs="0"/>
        <xs:choice maxOccurs="unbounded">
          <xs:element name="Amount" type="AmountType"/>
          <xs:element name="Flag" type="xs:boolean"/>
        </xs:choice>
      </xs:sequence>
      <xs:attribute name="kind" use="required">
        <xs:simpleType>
          <xs:restriction base="xs:string">
            <xs:enumeration value="A"/>
            <xs:enumeration value="B"/>
          </xs:restriction>
        </xs:simpleType>
      </xs:attribute>
    </xs:complexType>
  </xs:element>
  <xs:simpleType name="AmountType">
    <xs:restriction base="xs:decimal">
      <xs:minInclusive value="0"/>
      <xs:fractionDigits value="2"/>
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"#;

    fn schema() -> Schema {
        Schema::parse(XSD).unwrap()
    }

    fn check(xml: &str) -> Result<(), SchemaViolation> {
        schema().validate(xml.as_bytes())
    }

    #[test]
    fn valid_document() {
        check(r#"<Root xmlns="urn:t" kind="A"><Head>x</Head><Opt>3</Opt><Amount>1.50</Amount><Flag>true</Flag></Root>"#)
            .unwrap();
        check(r#"<Root xmlns="urn:t" kind="B"><Head/><!-- c --><Amount>0</Amount></Root>"#).unwrap();
    }

    #[test]
    fn wrong_root_namespace() {
        let v = check(r#"<Root kind="A"><Head/><Amount>1</Amount></Root>"#).unwrap_err();
        assert_eq!(
            v.message,
            "Element 'Root': No matching global declaration available for the validation root."
        );
    }

    #[test]
    fn unexpected_child_lists_expected() {
        let v = check(r#"<Root xmlns="urn:t" kind="A"><Amount>1</Amount></Root>"#).unwrap_err();
        assert_eq!(
            v.message,
            "Element '{urn:t}Amount': This element is not expected. Expected is ( {urn:t}Head )."
        );
    }

    #[test]
    fn missing_child() {
        let v = check(r#"<Root xmlns="urn:t" kind="A"><Head/></Root>"#).unwrap_err();
        assert_eq!(
            v.message,
            "Element '{urn:t}Root': Missing child element(s). Expected is ( {urn:t}Amount, {urn:t}Flag )."
        );
    }

    #[test]
    fn trailing_child_not_expected() {
        let v = check(r#"<Root xmlns="urn:t" kind="A"><Head/><Amount>1</Amount><Head/></Root>"#)
            .unwrap_err();
        assert_eq!(v.message, "Element '{urn:t}Head': This element is not expected.");
    }

    #[test]
    fn atomic_type_error() {
        let v = check(r#"<Root xmlns="urn:t" kind="A"><Head/><Amount>abc</Amount></Root>"#)
            .unwrap_err();
        assert_eq!(
            v.message,
            "Element '{urn:t}Amount': 'abc' is not a valid value of the atomic type 'xs:decimal'."
        );
    }

    #[test]
    fn facet_errors() {
        let v = check(r#"<Root xmlns="urn:t" kind="A"><Head/><Amount>-1</Amount></Root>"#)
            .unwrap_err();
        assert!(v.message.contains("[facet 'minInclusive']"));
        let v = check(r#"<Root xmlns="urn:t" kind="A"><Head/><Amount>1.234</Amount></Root>"#)
            .unwrap_err();
        assert!(v.message.contains("[facet 'fractionDigits']"));
    }

    #[test]
    fn attribute_errors() {
        let v = check(r#"<Root xmlns="urn:t"><Head/><Amount>1</Amount></Root>"#).unwrap_err();
        assert_eq!(
            v.message,
            "Element '{urn:t}Root': The attribute 'kind' is required but missing."
        );
        let v = check(r#"<Root xmlns="urn:t" kind="C"><Head/><Amount>1</Amount></Root>"#)
            .unwrap_err();
        assert!(v.message.contains("[facet 'enumeration']"));
        let v = check(r#"<Root xmlns="urn:t" kind="A" x="1"><Head/><Amount>1</Amount></Root>"#)
            .unwrap_err();
        assert_eq!(
            v.message,
            "Element '{urn:t}Root', attribute 'x': The attribute 'x' is not allowed."
        );
    }

    #[test]
    fn text_in_element_only_content() {
        let v = check(r#"<Root xmlns="urn:t" kind="A">oops<Head/><Amount>1</Amount></Root>"#)
            .unwrap_err();
        assert!(v.message.ends_with("the content type is 'element-only'."));
    }

    #[test]
    fn reports_line_number() {
        let v = check("<Root xmlns=\"urn:t\" kind=\"A\">\n<Head/>\n<Amount>x</Amount>\n</Root>")
            .unwrap_err();
        assert_eq!(v.line, 3);
    }

    #[test]
    fn malformed_xml_is_a_violation() {
        assert!(check("<Root").is_err());
        assert!(schema().validate(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn builtin_lexical_spaces() {
        assert!(is_decimal("-12.5"));
        assert!(is_decimal(".5"));
        assert!(!is_decimal("12,5"));
        assert!(!is_decimal("."));
        assert!(is_date("2024-02-29"));
        assert!(is_date("2024-02-29+01:00"));
        assert!(!is_date("2023-02-29"));
        assert!(builtin(Builtin::PositiveInteger, "0").is_err());
        assert!(builtin(Builtin::NonNegativeInteger, "0").is_ok());
    }
}
