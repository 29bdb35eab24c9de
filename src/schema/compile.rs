//! Compilation of an XSD document into the validation model.

use std::collections::HashMap;
use std::str::FromStr;

use regex::Regex;
use roxmltree::{Document, Node};
use rust_decimal::Decimal;

use crate::core::EcdfError;

pub(super) const XS_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// Built-in XSD datatypes understood by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Builtin {
    String,
    NormalizedString,
    Token,
    Decimal,
    Integer,
    NonNegativeInteger,
    PositiveInteger,
    Date,
    GYear,
    Boolean,
}

impl Builtin {
    fn from_local_name(name: &str) -> Option<Self> {
        Some(match name {
            "string" => Self::String,
            "normalizedString" => Self::NormalizedString,
            "token" => Self::Token,
            "decimal" => Self::Decimal,
            "integer" => Self::Integer,
            "nonNegativeInteger" => Self::NonNegativeInteger,
            "positiveInteger" => Self::PositiveInteger,
            "date" => Self::Date,
            "gYear" => Self::GYear,
            "boolean" => Self::Boolean,
            _ => return None,
        })
    }

    pub(super) fn xs_name(&self) -> &'static str {
        match self {
            Self::String => "xs:string",
            Self::NormalizedString => "xs:normalizedString",
            Self::Token => "xs:token",
            Self::Decimal => "xs:decimal",
            Self::Integer => "xs:integer",
            Self::NonNegativeInteger => "xs:nonNegativeInteger",
            Self::PositiveInteger => "xs:positiveInteger",
            Self::Date => "xs:date",
            Self::GYear => "xs:gYear",
            Self::Boolean => "xs:boolean",
        }
    }

    /// Whether leading/trailing whitespace is collapsed before checking.
    pub(super) fn collapses_whitespace(&self) -> bool {
        !matches!(self, Self::String | Self::NormalizedString)
    }
}

#[derive(Debug, Clone)]
pub(super) enum TypeRef {
    Builtin(Builtin),
    Named(String),
    Simple(Box<SimpleType>),
    Complex(Box<ComplexType>),
}

#[derive(Debug, Clone)]
pub(super) enum TypeDef {
    Simple(SimpleType),
    Complex(ComplexType),
}

#[derive(Debug, Clone)]
pub(super) struct SimpleType {
    pub base: TypeRef,
    pub facets: Facets,
}

#[derive(Debug, Clone, Default)]
pub(super) struct Facets {
    /// Alternatives: the value must match one of them.
    pub patterns: Vec<(String, Regex)>,
    pub enumeration: Vec<String>,
    pub length: Option<usize>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min_inclusive: Option<Decimal>,
    pub max_inclusive: Option<Decimal>,
    pub total_digits: Option<u32>,
    pub fraction_digits: Option<u32>,
}

#[derive(Debug, Clone)]
pub(super) struct ComplexType {
    pub attributes: Vec<AttributeDecl>,
    pub content: Content,
}

#[derive(Debug, Clone)]
pub(super) enum Content {
    Empty,
    Simple(TypeRef),
    Elements(Particle),
}

#[derive(Debug, Clone)]
pub(super) struct AttributeDecl {
    pub name: String,
    pub ty: TypeRef,
    pub required: bool,
}

#[derive(Debug, Clone)]
pub(super) struct ElementDecl {
    pub name: String,
    pub namespace: Option<String>,
    pub ty: TypeRef,
}

impl ElementDecl {
    pub(super) fn display_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{{{ns}}}{}", self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) struct Occurs {
    pub min: u32,
    /// `None` means unbounded.
    pub max: Option<u32>,
}

#[derive(Debug, Clone)]
pub(super) enum Term {
    Element(ElementDecl),
    ElementRef(String),
    Sequence(Vec<Particle>),
    Choice(Vec<Particle>),
}

#[derive(Debug, Clone)]
pub(super) struct Particle {
    pub term: Term,
    pub occurs: Occurs,
}

/// A compiled schema.
#[derive(Debug, Clone)]
pub struct Schema {
    pub(super) target_namespace: Option<String>,
    pub(super) elements: HashMap<String, ElementDecl>,
    pub(super) types: HashMap<String, TypeDef>,
}

impl Schema {
    /// Compile an XSD document.
    pub fn parse(xsd: &str) -> Result<Self, EcdfError> {
        let doc = Document::parse(xsd).map_err(|e| def_err(format!("XSD is not well-formed: {e}")))?;
        let root = doc.root_element();
        if !is_xs(root, "schema") {
            return Err(def_err("root element must be xs:schema"));
        }

        let mut compiler = Compiler {
            target_namespace: root.attribute("targetNamespace").map(str::to_string),
            qualified: root.attribute("elementFormDefault") == Some("qualified"),
        };
        let mut elements = HashMap::new();
        let mut types = HashMap::new();

        for child in root.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "element" if is_xs(child, "element") => {
                    let decl = compiler.element(child, true)?;
                    elements.insert(decl.name.clone(), decl);
                }
                "complexType" if is_xs(child, "complexType") => {
                    let name = required_attr(child, "name")?;
                    types.insert(name.to_string(), TypeDef::Complex(compiler.complex(child)?));
                }
                "simpleType" if is_xs(child, "simpleType") => {
                    let name = required_attr(child, "name")?;
                    types.insert(name.to_string(), TypeDef::Simple(compiler.simple(child)?));
                }
                "annotation" => {}
                other => return Err(def_err(format!("unsupported top-level construct xs:{other}"))),
            }
        }

        let schema = Self {
            target_namespace: compiler.target_namespace.take(),
            elements,
            types,
        };
        schema.check_references()?;
        Ok(schema)
    }

    /// Namespace of the documents described by this schema.
    pub fn target_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }

    pub(super) fn resolve<'a>(&'a self, ty: &'a TypeRef) -> Option<Resolved<'a>> {
        match ty {
            TypeRef::Builtin(b) => Some(Resolved::Builtin(*b)),
            TypeRef::Simple(s) => Some(Resolved::Simple(s)),
            TypeRef::Complex(c) => Some(Resolved::Complex(c)),
            TypeRef::Named(name) => match self.types.get(name)? {
                TypeDef::Simple(s) => Some(Resolved::Simple(s)),
                TypeDef::Complex(c) => Some(Resolved::Complex(c)),
            },
        }
    }

    fn check_references(&self) -> Result<(), EcdfError> {
        for decl in self.elements.values() {
            self.check_type(&decl.ty)?;
        }
        for def in self.types.values() {
            match def {
                TypeDef::Simple(s) => self.check_simple(s)?,
                TypeDef::Complex(c) => self.check_complex(c)?,
            }
        }
        Ok(())
    }

    fn check_type(&self, ty: &TypeRef) -> Result<(), EcdfError> {
        match ty {
            TypeRef::Builtin(_) => Ok(()),
            TypeRef::Named(name) if self.types.contains_key(name) => Ok(()),
            TypeRef::Named(name) => Err(def_err(format!("unknown type '{name}'"))),
            TypeRef::Simple(s) => self.check_simple(s),
            TypeRef::Complex(c) => self.check_complex(c),
        }
    }

    fn check_simple_ref(&self, ty: &TypeRef) -> Result<(), EcdfError> {
        self.check_type(ty)?;
        match self.resolve(ty) {
            Some(Resolved::Complex(_)) => Err(def_err("a simple type is required here")),
            _ => Ok(()),
        }
    }

    fn check_simple(&self, s: &SimpleType) -> Result<(), EcdfError> {
        self.check_simple_ref(&s.base)?;
        let mut base = &s.base;
        for _ in 0..=self.types.len() {
            match base {
                TypeRef::Named(name) => match self.types.get(name) {
                    Some(TypeDef::Simple(next)) => base = &next.base,
                    _ => return Ok(()),
                },
                _ => return Ok(()),
            }
        }
        Err(def_err("circular simple type derivation"))
    }

    fn check_complex(&self, c: &ComplexType) -> Result<(), EcdfError> {
        for attr in &c.attributes {
            self.check_simple_ref(&attr.ty)?;
        }
        match &c.content {
            Content::Empty => Ok(()),
            Content::Simple(ty) => self.check_simple_ref(ty),
            Content::Elements(p) => self.check_particle(p),
        }
    }

    fn check_particle(&self, p: &Particle) -> Result<(), EcdfError> {
        match &p.term {
            Term::Element(decl) => self.check_type(&decl.ty),
            Term::ElementRef(name) if self.elements.contains_key(name) => Ok(()),
            Term::ElementRef(name) => Err(def_err(format!("unknown element reference '{name}'"))),
            Term::Sequence(items) | Term::Choice(items) => {
                items.iter().try_for_each(|item| self.check_particle(item))
            }
        }
    }
}

pub(super) enum Resolved<'a> {
    Builtin(Builtin),
    Simple(&'a SimpleType),
    Complex(&'a ComplexType),
}

struct Compiler {
    target_namespace: Option<String>,
    qualified: bool,
}

impl Compiler {
    fn element(&self, node: Node, global: bool) -> Result<ElementDecl, EcdfError> {
        let name = required_attr(node, "name")?.to_string();
        let namespace = if global || self.qualified {
            self.target_namespace.clone()
        } else {
            None
        };
        let ty = self.type_of(node)?;
        Ok(ElementDecl { name, namespace, ty })
    }

    /// Type of an element or attribute: `type="…"` or an inline definition.
    fn type_of(&self, node: Node) -> Result<TypeRef, EcdfError> {
        if let Some(qname) = node.attribute("type") {
            return type_ref(node, qname);
        }
        for child in xs_children(node) {
            match child.tag_name().name() {
                "complexType" => return Ok(TypeRef::Complex(Box::new(self.complex(child)?))),
                "simpleType" => return Ok(TypeRef::Simple(Box::new(self.simple(child)?))),
                _ => {}
            }
        }
        Err(def_err(format!(
            "'{}' has neither a type attribute nor an inline type",
            node.attribute("name").unwrap_or("?")
        )))
    }

    fn complex(&self, node: Node) -> Result<ComplexType, EcdfError> {
        let mut attributes = Vec::new();
        let mut content = Content::Empty;

        for child in xs_children(node) {
            match child.tag_name().name() {
                "sequence" | "choice" => content = Content::Elements(self.particle(child)?),
                "attribute" => attributes.push(self.attribute(child)?),
                "simpleContent" => {
                    let ext = xs_children(child)
                        .find(|n| n.tag_name().name() == "extension")
                        .ok_or_else(|| def_err("xs:simpleContent requires xs:extension"))?;
                    content = Content::Simple(type_ref(ext, required_attr(ext, "base")?)?);
                    for attr in xs_children(ext).filter(|n| n.tag_name().name() == "attribute") {
                        attributes.push(self.attribute(attr)?);
                    }
                }
                "annotation" => {}
                other => {
                    return Err(def_err(format!("unsupported construct xs:{other} in complexType")));
                }
            }
        }
        Ok(ComplexType { attributes, content })
    }

    fn particle(&self, node: Node) -> Result<Particle, EcdfError> {
        let occurs = occurs(node)?;
        let term = match node.tag_name().name() {
            "element" => match node.attribute("ref") {
                Some(r) => Term::ElementRef(local_name(r).to_string()),
                None => Term::Element(self.element(node, false)?),
            },
            "sequence" => Term::Sequence(self.particles(node)?),
            "choice" => Term::Choice(self.particles(node)?),
            other => return Err(def_err(format!("unsupported particle xs:{other}"))),
        };
        Ok(Particle { term, occurs })
    }

    fn particles(&self, node: Node) -> Result<Vec<Particle>, EcdfError> {
        xs_children(node)
            .filter(|n| n.tag_name().name() != "annotation")
            .map(|n| self.particle(n))
            .collect()
    }

    fn attribute(&self, node: Node) -> Result<AttributeDecl, EcdfError> {
        Ok(AttributeDecl {
            name: required_attr(node, "name")?.to_string(),
            ty: self.type_of(node)?,
            required: node.attribute("use") == Some("required"),
        })
    }

    fn simple(&self, node: Node) -> Result<SimpleType, EcdfError> {
        let restriction = xs_children(node)
            .find(|n| n.tag_name().name() == "restriction")
            .ok_or_else(|| def_err("only xs:restriction simple types are supported"))?;
        let base = type_ref(restriction, required_attr(restriction, "base")?)?;

        let mut facets = Facets::default();
        for facet in xs_children(restriction) {
            let value = || required_attr(facet, "value");
            match facet.tag_name().name() {
                "pattern" => {
                    let pattern = value()?;
                    let regex = Regex::new(&format!("^(?:{pattern})$"))
                        .map_err(|e| def_err(format!("invalid pattern '{pattern}': {e}")))?;
                    facets.patterns.push((pattern.to_string(), regex));
                }
                "enumeration" => facets.enumeration.push(value()?.to_string()),
                "length" => facets.length = Some(parse_num(value()?)?),
                "minLength" => facets.min_length = Some(parse_num(value()?)?),
                "maxLength" => facets.max_length = Some(parse_num(value()?)?),
                "totalDigits" => facets.total_digits = Some(parse_num(value()?)?),
                "fractionDigits" => facets.fraction_digits = Some(parse_num(value()?)?),
                "minInclusive" => facets.min_inclusive = Some(parse_decimal(value()?)?),
                "maxInclusive" => facets.max_inclusive = Some(parse_decimal(value()?)?),
                "whiteSpace" | "annotation" => {}
                other => return Err(def_err(format!("unsupported facet xs:{other}"))),
            }
        }
        Ok(SimpleType { base, facets })
    }
}

fn occurs(node: Node) -> Result<Occurs, EcdfError> {
    let min = match node.attribute("minOccurs") {
        Some(v) => parse_num(v)?,
        None => 1,
    };
    let max = match node.attribute("maxOccurs") {
        Some("unbounded") => None,
        Some(v) => Some(parse_num(v)?),
        None => Some(1),
    };
    if max.is_some_and(|max| max < min) {
        return Err(def_err("maxOccurs must not be lower than minOccurs"));
    }
    Ok(Occurs { min, max })
}

/// Resolve a QName used as a type reference.
fn type_ref(node: Node, qname: &str) -> Result<TypeRef, EcdfError> {
    let (prefix, local) = match qname.split_once(':') {
        Some((p, l)) => (Some(p), l),
        None => (None, qname),
    };
    if node.lookup_namespace_uri(prefix) == Some(XS_NS) {
        return Builtin::from_local_name(local)
            .map(TypeRef::Builtin)
            .ok_or_else(|| def_err(format!("unsupported built-in type xs:{local}")));
    }
    Ok(TypeRef::Named(local.to_string()))
}

fn xs_children<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(|n| n.is_element() && n.tag_name().namespace() == Some(XS_NS))
}

fn is_xs(node: Node, name: &str) -> bool {
    node.tag_name().namespace() == Some(XS_NS) && node.tag_name().name() == name
}

fn local_name(qname: &str) -> &str {
    qname.rsplit(':').next().unwrap_or(qname)
}

fn required_attr<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str, EcdfError> {
    node.attribute(name).ok_or_else(|| {
        def_err(format!(
            "xs:{} is missing the '{name}' attribute",
            node.tag_name().name()
        ))
    })
}

fn parse_num<T: FromStr>(value: &str) -> Result<T, EcdfError> {
    value
        .trim()
        .parse()
        .map_err(|_| def_err(format!("'{value}' is not a valid number")))
}

fn parse_decimal(value: &str) -> Result<Decimal, EcdfError> {
    Decimal::from_str(value.trim()).map_err(|e| def_err(format!("'{value}': {e}")))
}

fn def_err(message: impl Into<String>) -> EcdfError {
    EcdfError::SchemaDefinition(message.into())
}
