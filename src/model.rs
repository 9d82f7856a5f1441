//! In-memory Protocol Buffers model
//!
//! Thin mutable containers produced by the builder and rewritten by the
//! transformation passes. Type references are plain strings; the naming
//! passes rewrite them in place and the final model is rendered to proto3
//! text by [`crate::render`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Placeholder suffix attached to generated type names that may still be
/// replaced by a later, better-named declaration for the same structure.
pub const GENERATED_NAME_SUFFIX: &str = "GeneratedType";

/// All packages produced by one conversion run, keyed by proto package name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageSet {
    pub packages: BTreeMap<String, Package>,

    /// Usage sites of generated local types, recorded by the builder and
    /// consumed by the promotion pass. Not part of the output model.
    #[serde(skip)]
    pub local_types: Vec<LocalTypeUse>,
}

/// One use of a generated local type.
#[derive(Debug, Clone)]
pub struct LocalTypeUse {
    pub package: String,

    /// Message the local type is nested under.
    pub enclosing_message: String,

    /// Complex type whose content declared the element. Inheritance
    /// flattening copies a base's local types into every subtype, so many
    /// enclosing messages can share one defining type. It becomes the name
    /// prefix when a promotion has to be disambiguated.
    pub defining_type: Option<String>,

    /// Current name of the nested declaration.
    pub local_name: String,
}

impl PackageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Package for `name`, created empty on first use.
    pub fn entry(&mut self, name: &str) -> &mut Package {
        self.packages
            .entry(name.to_string())
            .or_insert_with(|| Package::new(name))
    }

    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    /// Apply `f` to every type declaration in every package, nested types
    /// included, depth first.
    pub fn for_each_type_mut<F: FnMut(&str, &mut TypeDecl)>(&mut self, mut f: F) {
        for (pkg_name, pkg) in self.packages.iter_mut() {
            for decl in pkg.types.iter_mut() {
                visit_mut(pkg_name, decl, &mut f);
            }
        }
    }

    pub fn for_each_type<F: FnMut(&str, &TypeDecl)>(&self, mut f: F) {
        for (pkg_name, pkg) in self.packages.iter() {
            for decl in pkg.types.iter() {
                visit(pkg_name, decl, &mut f);
            }
        }
    }
}

fn visit_mut<F: FnMut(&str, &mut TypeDecl)>(pkg: &str, decl: &mut TypeDecl, f: &mut F) {
    f(pkg, decl);
    if let TypeDecl::Message(m) = decl {
        for nested in m.nested.iter_mut() {
            visit_mut(pkg, nested, f);
        }
    }
}

fn visit<F: FnMut(&str, &TypeDecl)>(pkg: &str, decl: &TypeDecl, f: &mut F) {
    f(pkg, decl);
    if let TypeDecl::Message(m) = decl {
        for nested in m.nested.iter() {
            visit(pkg, nested, f);
        }
    }
}

/// One output `.proto` file in the making.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// Dotted proto package name, e.g. `org.example.membership.v1`.
    pub name: String,

    /// Source XML namespace this package was derived from, kept for
    /// diagnostics.
    pub source_namespace: Option<String>,

    /// Import paths, kept sorted and deduplicated at render time.
    pub imports: Vec<String>,

    /// File-level options from configuration.
    pub options: Vec<FileOption>,

    /// Top-level message and enum declarations.
    pub types: Vec<TypeDecl>,

    /// Output filename relative to the output directory, filled in by the
    /// final pipeline pass.
    pub filename: Option<String>,
}

impl Package {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source_namespace: None,
            imports: Vec::new(),
            options: Vec::new(),
            types: Vec::new(),
            filename: None,
        }
    }

    pub fn add_import(&mut self, path: &str) {
        if !self.imports.iter().any(|i| i == path) {
            self.imports.push(path.to_string());
        }
    }

    pub fn message(&self, name: &str) -> Option<&Message> {
        self.types.iter().find_map(|t| match t {
            TypeDecl::Message(m) if m.name == name => Some(m),
            _ => None,
        })
    }

    pub fn message_mut(&mut self, name: &str) -> Option<&mut Message> {
        self.types.iter_mut().find_map(|t| match t {
            TypeDecl::Message(m) if m.name == name => Some(m),
            _ => None,
        })
    }

    pub fn enum_type(&self, name: &str) -> Option<&EnumType> {
        self.types.iter().find_map(|t| match t {
            TypeDecl::Enum(e) if e.name == name => Some(e),
            _ => None,
        })
    }
}

/// File-level option value, written verbatim into the output file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOption {
    pub name: String,
    pub value: OptionValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Number(i64),
    Text(String),
}

/// A message or enum declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypeDecl {
    Message(Message),
    Enum(EnumType),
}

impl TypeDecl {
    pub fn name(&self) -> &str {
        match self {
            TypeDecl::Message(m) => &m.name,
            TypeDecl::Enum(e) => &e.name,
        }
    }

    pub fn set_name(&mut self, name: String) {
        match self {
            TypeDecl::Message(m) => m.name = name,
            TypeDecl::Enum(e) => e.name = name,
        }
    }

    pub fn documentation(&self) -> Option<&str> {
        match self {
            TypeDecl::Message(m) => m.documentation.as_deref(),
            TypeDecl::Enum(e) => e.documentation.as_deref(),
        }
    }
}

/// A proto message under construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    pub name: String,
    pub documentation: Option<String>,
    pub fields: Vec<Field>,
    pub oneofs: Vec<OneOf>,
    pub nested: Vec<TypeDecl>,
    pub reserved_names: Vec<String>,
    pub reserved_tags: Vec<u32>,

    /// Next unassigned field tag. Monotonic within the message; tags freed
    /// by field removal are never reissued.
    next_tag: u32,
}

impl Message {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            next_tag: 1,
            ..Default::default()
        }
    }

    /// Claim the next field tag.
    pub fn take_tag(&mut self) -> u32 {
        let tag = self.next_tag;
        self.next_tag += 1;
        tag
    }

    /// Skip `count` tags without assigning them. Used at inherited-field
    /// group boundaries so later additions to a base type cannot collide
    /// with fields declared by this type.
    pub fn advance_tag(&mut self, count: u32) {
        self.next_tag += count;
    }

    /// Force the counter past `tag` if it is not already.
    pub fn bump_tag_past(&mut self, tag: u32) {
        if self.next_tag <= tag {
            self.next_tag = tag + 1;
        }
    }

    /// All fields, direct and oneof members.
    pub fn all_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields
            .iter()
            .chain(self.oneofs.iter().flat_map(|o| o.fields.iter()))
    }

    pub fn all_fields_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.fields
            .iter_mut()
            .chain(self.oneofs.iter_mut().flat_map(|o| o.fields.iter_mut()))
    }

    pub fn reserve_name(&mut self, name: &str) {
        if !self.reserved_names.iter().any(|n| n == name) {
            self.reserved_names.push(name.to_string());
        }
    }

    pub fn reserve_tag(&mut self, tag: u32) {
        if !self.reserved_tags.contains(&tag) {
            self.reserved_tags.push(tag);
        }
    }
}

/// Cardinality of a field. Proto3 has no required label; optionality from
/// the source schema is carried in documentation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    #[default]
    Single,
    Repeated,
}

/// A message field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub name: String,

    /// Referenced type: an XSD primitive name until the scalar replacement
    /// pass, then a proto scalar or message/enum name.
    pub type_name: String,

    /// Package the referenced type lives in, when it is not a scalar.
    /// Folded into `type_name` by the qualification pass.
    pub type_package: Option<String>,

    pub tag: u32,
    pub label: Label,

    /// True when the field came from an XML attribute rather than an
    /// element. Drives the `attr_` disambiguation rule.
    pub from_attribute: bool,

    pub documentation: Option<String>,
}

impl Field {
    pub fn new(name: &str, type_name: &str, tag: u32) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            type_package: None,
            tag,
            label: Label::Single,
            from_attribute: false,
            documentation: None,
        }
    }
}

/// A oneof group produced from a substitution group or a non-repeated
/// choice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneOf {
    pub name: String,
    pub documentation: Option<String>,
    pub fields: Vec<Field>,
}

/// A proto enum.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    pub documentation: Option<String>,
    pub constants: Vec<EnumConstant>,
    pub reserved_names: Vec<String>,
    pub reserved_numbers: Vec<i32>,
}

impl EnumType {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn reserve_name(&mut self, name: &str) {
        if !self.reserved_names.iter().any(|n| n == name) {
            self.reserved_names.push(name.to_string());
        }
    }

    pub fn reserve_number(&mut self, number: i32) {
        if !self.reserved_numbers.contains(&number) {
            self.reserved_numbers.push(number);
        }
    }
}

/// An enum constant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumConstant {
    pub name: String,
    pub number: i32,
    pub documentation: Option<String>,
}
