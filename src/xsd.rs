//! Reference-resolved XML Schema object graph
//!
//! This is the input contract of the converter. The XML reader itself lives
//! outside this crate; it hands over a [`SchemaSet`] (the types here are
//! serde-deserializable so the hand-off can be plain JSON). The graph is
//! already reference-resolved: every named type a component mentions can be
//! looked up through the set, and substitution-group membership is recorded
//! on the set keyed by head element.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The XML Schema namespace. Types in this namespace are primitives and are
/// mapped to proto scalars instead of messages.
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Namespace-qualified name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QName {
    pub namespace: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(namespace: Option<&str>, local: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            local: local.to_string(),
        }
    }

    /// A name in the XML Schema namespace itself.
    pub fn xsd(local: &str) -> Self {
        Self::new(Some(XSD_NAMESPACE), local)
    }

    pub fn is_xsd(&self) -> bool {
        self.namespace.as_deref() == Some(XSD_NAMESPACE)
    }
}

impl std::fmt::Display for QName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// Position of a component in its source document, for diagnostics and
/// optional documentation trailers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// All schema documents of one conversion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaSet {
    pub schemas: Vec<Schema>,

    /// Substitution-group members keyed by head element name. Members keep
    /// their declaration order.
    #[serde(default)]
    pub substitution_groups: BTreeMap<String, Vec<QName>>,
}

impl SchemaSet {
    pub fn find_complex(&self, name: &QName) -> Option<&ComplexType> {
        self.schemas
            .iter()
            .filter(|s| s.target_namespace == name.namespace)
            .flat_map(|s| s.complex_types.iter())
            .find(|t| t.name.as_deref() == Some(name.local.as_str()))
    }

    pub fn find_simple(&self, name: &QName) -> Option<&SimpleType> {
        self.schemas
            .iter()
            .filter(|s| s.target_namespace == name.namespace)
            .flat_map(|s| s.simple_types.iter())
            .find(|t| t.name.as_deref() == Some(name.local.as_str()))
    }

    pub fn find_element(&self, name: &QName) -> Option<&ElementDecl> {
        self.schemas
            .iter()
            .filter(|s| s.target_namespace == name.namespace)
            .flat_map(|s| s.elements.iter())
            .find(|e| e.name == name.local)
    }

    pub fn find_attribute_group(&self, name: &QName) -> Option<&AttributeGroup> {
        self.schemas
            .iter()
            .filter(|s| s.target_namespace == name.namespace)
            .flat_map(|s| s.attribute_groups.iter())
            .find(|g| g.name == name.local)
    }

    /// Members substituting for `head`, declaration order preserved.
    pub fn substitution_members(&self, head: &QName) -> &[QName] {
        self.substitution_groups
            .get(&head.local)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// One schema document (one target namespace).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    pub target_namespace: Option<String>,
    #[serde(default)]
    pub complex_types: Vec<ComplexType>,
    #[serde(default)]
    pub simple_types: Vec<SimpleType>,
    #[serde(default)]
    pub elements: Vec<ElementDecl>,
    #[serde(default)]
    pub attribute_groups: Vec<AttributeGroup>,
}

impl Schema {
    pub fn new(target_namespace: Option<&str>) -> Self {
        Self {
            target_namespace: target_namespace.map(str::to_string),
            ..Default::default()
        }
    }
}

/// A complex type definition, named or anonymous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexType {
    pub name: Option<String>,
    pub namespace: Option<String>,

    /// Base type of an extension or restriction, when present.
    pub base: Option<QName>,

    #[serde(default)]
    pub is_abstract: bool,

    #[serde(default)]
    pub attributes: Vec<AttributeUse>,

    /// Named attribute groups used by this type, resolved through the set.
    #[serde(default)]
    pub attribute_groups: Vec<QName>,

    pub content: Content,

    pub documentation: Option<String>,
    pub location: Option<SourceLocation>,
}

impl ComplexType {
    pub fn named(namespace: Option<&str>, name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            namespace: namespace.map(str::to_string),
            base: None,
            is_abstract: false,
            attributes: Vec::new(),
            attribute_groups: Vec::new(),
            content: Content::Empty,
            documentation: None,
            location: None,
        }
    }

    pub fn qname(&self) -> Option<QName> {
        self.name
            .as_ref()
            .map(|n| QName::new(self.namespace.as_deref(), n))
    }
}

/// Content model of a complex type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Content {
    Empty,
    /// Element content: a particle tree.
    Particle(Particle),
    /// Simple content: character data typed by a simple type.
    Simple(SimpleTypeRef),
}

/// Reference to a simple type, by name or inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimpleTypeRef {
    Named(QName),
    Inline(Box<SimpleType>),
}

/// Occurrence-constrained term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    #[serde(default = "one")]
    pub min_occurs: u32,
    /// `None` means unbounded.
    #[serde(default = "some_one")]
    pub max_occurs: Option<u32>,
    pub term: Term,
}

fn one() -> u32 {
    1
}

fn some_one() -> Option<u32> {
    Some(1)
}

impl Particle {
    pub fn of(term: Term) -> Self {
        Self {
            min_occurs: 1,
            max_occurs: Some(1),
            term,
        }
    }

    pub fn repeated(term: Term) -> Self {
        Self {
            min_occurs: 0,
            max_occurs: None,
            term,
        }
    }

    pub fn optional(term: Term) -> Self {
        Self {
            min_occurs: 0,
            max_occurs: Some(1),
            term,
        }
    }

    pub fn is_repeated(&self) -> bool {
        self.max_occurs.map_or(true, |max| max > 1)
    }
}

/// What a particle holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    Element(ElementDecl),
    Group {
        compositor: Compositor,
        particles: Vec<Particle>,
    },
    /// `xs:any`; carried as an opaque string field.
    Wildcard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compositor {
    Sequence,
    Choice,
    All,
}

impl Compositor {
    pub fn wrapper_prefix(&self) -> &'static str {
        match self {
            Compositor::Sequence => "SequenceWrapper_",
            Compositor::Choice => "ChoiceWrapper_",
            Compositor::All => "AllWrapper_",
        }
    }
}

/// An element declaration, global or local.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementDecl {
    pub name: String,
    pub namespace: Option<String>,
    pub type_ref: ElementType,
    #[serde(default)]
    pub is_abstract: bool,
    /// Head element this one substitutes for, when any.
    pub substitution_head: Option<QName>,
    pub documentation: Option<String>,
    pub location: Option<SourceLocation>,
}

impl ElementDecl {
    pub fn named(name: &str, type_ref: ElementType) -> Self {
        Self {
            name: name.to_string(),
            namespace: None,
            type_ref,
            is_abstract: false,
            substitution_head: None,
            documentation: None,
            location: None,
        }
    }

    pub fn qname(&self) -> QName {
        QName::new(self.namespace.as_deref(), &self.name)
    }
}

/// Type of an element: a named reference or an inline definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Named(QName),
    InlineComplex(Box<ComplexType>),
    InlineSimple(Box<SimpleType>),
}

/// An attribute use on a complex type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeUse {
    pub name: String,
    pub namespace: Option<String>,
    pub type_ref: SimpleTypeRef,
    pub documentation: Option<String>,
    pub location: Option<SourceLocation>,
}

impl AttributeUse {
    pub fn named(name: &str, type_ref: SimpleTypeRef) -> Self {
        Self {
            name: name.to_string(),
            namespace: None,
            type_ref,
            documentation: None,
            location: None,
        }
    }
}

/// A named attribute group, resolved through [`SchemaSet::find_attribute_group`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeGroup {
    pub name: String,
    pub namespace: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeUse>,
    /// Groups may nest.
    #[serde(default)]
    pub attribute_groups: Vec<QName>,
}

/// A simple type definition, named or anonymous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleType {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub variety: SimpleVariety,
    pub documentation: Option<String>,
    pub location: Option<SourceLocation>,
}

impl SimpleType {
    pub fn restriction(name: Option<&str>, base: QName) -> Self {
        Self {
            name: name.map(str::to_string),
            namespace: None,
            variety: SimpleVariety::Restriction {
                base,
                enumeration: Vec::new(),
            },
            documentation: None,
            location: None,
        }
    }

    /// True when the type carries enumeration facets.
    pub fn is_enumeration(&self) -> bool {
        matches!(
            &self.variety,
            SimpleVariety::Restriction { enumeration, .. } if !enumeration.is_empty()
        )
    }
}

/// Variety of a simple type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimpleVariety {
    Restriction {
        base: QName,
        #[serde(default)]
        enumeration: Vec<EnumFacet>,
    },
    List {
        item: QName,
    },
    /// Unions degrade to string.
    Union,
}

/// One enumeration facet with its own documentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumFacet {
    pub value: String,
    pub documentation: Option<String>,
}

impl EnumFacet {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            documentation: None,
        }
    }
}
