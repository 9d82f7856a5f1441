//! Schema Model Builder
//!
//! Walks a reference-resolved [`SchemaSet`] and produces the initial
//! [`PackageSet`]: one package per namespace, one message per complex type,
//! one enum per enumerated simple type. Field tags are assigned here from
//! each message's monotonic counter. Names produced here are raw; the
//! transformation passes take care of casing, collisions and scalar
//! replacement.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::config::{ConverterConfig, InheritanceMode};
use crate::error::{ConversionError, Result};
use crate::mapper::NameMapper;
use crate::model::{
    EnumConstant, EnumType, Field, Label, LocalTypeUse, Message, OneOf, Package, PackageSet,
    TypeDecl, GENERATED_NAME_SUFFIX,
};
use crate::namespace::package_from_namespace;
use crate::xsd::{
    AttributeUse, ComplexType, Compositor, Content, ElementDecl, ElementType, Particle, QName,
    SchemaSet, SimpleType, SimpleTypeRef, SimpleVariety, SourceLocation, Term,
};

/// Fallback package for schemas without a target namespace when no default
/// is configured.
const FALLBACK_PACKAGE: &str = "default";

/// Builds the proto model from a schema set.
pub struct Builder<'a> {
    set: &'a SchemaSet,
    config: &'a ConverterConfig,
    mapper: &'a NameMapper,
    packages: PackageSet,

    /// Complex types already built or currently being built. Guards
    /// recursive and mutually recursive types.
    processed: HashSet<QName>,

    /// Named enums already emitted.
    processed_enums: HashSet<QName>,

    /// Empty derived types folded into their base, keyed by the skipped
    /// type's name.
    aliases: HashMap<QName, (String, String)>,

    /// Usage sites of generated local types, handed to the promotion pass
    /// through the package set.
    local_types: Vec<LocalTypeUse>,

    /// Name of the complex type whose content is currently being walked.
    /// With inheritance flattening this is the ancestor declaring the
    /// element, not the message receiving the field.
    current_defining: Option<String>,
}

impl<'a> Builder<'a> {
    pub fn new(set: &'a SchemaSet, config: &'a ConverterConfig, mapper: &'a NameMapper) -> Self {
        Self {
            set,
            config,
            mapper,
            packages: PackageSet::new(),
            processed: HashSet::new(),
            processed_enums: HashSet::new(),
            aliases: HashMap::new(),
            local_types: Vec::new(),
            current_defining: None,
        }
    }

    /// Build the whole set.
    pub fn build(mut self) -> Result<PackageSet> {
        for schema in &self.set.schemas {
            let package = self.package_for(schema.target_namespace.as_deref());

            for simple in &schema.simple_types {
                if simple.is_enumeration() {
                    if let Some(name) = &simple.name {
                        let qname = QName::new(schema.target_namespace.as_deref(), name);
                        self.ensure_enum(&qname, simple, &package)?;
                    }
                }
            }

            for complex in &schema.complex_types {
                if complex.name.is_some() {
                    self.ensure_complex(complex, &package)?;
                }
            }

            for element in &schema.elements {
                self.process_global_element(element, &package)?;
            }
        }
        let mut packages = self.packages;
        packages.local_types = self.local_types;
        Ok(packages)
    }

    /// Proto package for a target namespace, honoring the configured
    /// override order.
    fn package_for(&self, namespace: Option<&str>) -> String {
        if let Some(forced) = &self.config.packages.force_package {
            return forced.clone();
        }
        if let Some(ns) = namespace {
            if let Some(derived) = package_from_namespace(ns) {
                return derived;
            }
        }
        if let Some(default) = &self.config.packages.default_package {
            return default.clone();
        }
        warn!("schema without target namespace and no default package configured");
        FALLBACK_PACKAGE.to_string()
    }

    /// A global element with an inline type gets a message named after the
    /// element. Elements referencing named types add nothing; their types
    /// are built from the type walk.
    fn process_global_element(&mut self, element: &ElementDecl, package: &str) -> Result<()> {
        match &element.type_ref {
            ElementType::InlineComplex(ct) => {
                debug!(element = %element.name, "building inline type of global element");
                let mut msg = Message::new(&element.name);
                msg.documentation = self.doc_for(
                    element.documentation.as_deref(),
                    element.location.as_ref(),
                );
                self.fill_message(&mut msg, ct, package)?;
                self.push_type(package, TypeDecl::Message(msg));
                Ok(())
            }
            ElementType::InlineSimple(st) if st.is_enumeration() => {
                let decl = self.make_enum(&element.name, st);
                self.push_type(package, TypeDecl::Enum(decl));
                Ok(())
            }
            _ => {
                debug!(element = %element.name, "global element references a named type, nothing to add");
                Ok(())
            }
        }
    }

    /// Build a named complex type once, returning its (package, name).
    fn ensure_complex(&mut self, ct: &ComplexType, package: &str) -> Result<(String, String)> {
        let qname = ct.qname().ok_or_else(|| {
            ConversionError::UnsupportedConstruct("anonymous type in named position".into())
        })?;
        if let Some(target) = self.aliases.get(&qname) {
            return Ok(target.clone());
        }
        let name = qname.local.clone();
        if self.processed.contains(&qname) {
            return Ok((package.to_string(), name));
        }
        self.processed.insert(qname.clone());

        // A type that adds nothing over its complex base only renames it.
        if self.config.inheritance.skip_empty_types && self.is_empty_extension(ct) {
            let base = ct.base.clone().ok_or_else(|| {
                ConversionError::UnsupportedConstruct("empty type without base".into())
            })?;
            let base_ct = self.set.find_complex(&base).ok_or_else(|| {
                self.unresolved(&base, &name)
            })?;
            let base_ct = base_ct.clone();
            let base_package = self.package_for(base_ct.namespace.as_deref());
            let target = self.ensure_complex(&base_ct, &base_package)?;
            debug!(skipped = %name, base = %target.1, "folding empty derived type into base");
            self.aliases.insert(qname, target.clone());
            return Ok(target);
        }

        let mut msg = Message::new(&name);
        msg.documentation = self.doc_for(ct.documentation.as_deref(), ct.location.as_ref());
        self.fill_message(&mut msg, ct, package)?;
        self.push_type(package, TypeDecl::Message(msg));
        Ok((package.to_string(), name))
    }

    fn is_empty_extension(&self, ct: &ComplexType) -> bool {
        let base_is_complex = ct
            .base
            .as_ref()
            .map(|b| self.set.find_complex(b).is_some())
            .unwrap_or(false);
        base_is_complex
            && ct.attributes.is_empty()
            && ct.attribute_groups.is_empty()
            && matches!(ct.content, Content::Empty)
    }

    /// Fill a message from a complex type: ancestors first, then the
    /// type's own attributes and content.
    fn fill_message(&mut self, msg: &mut Message, ct: &ComplexType, package: &str) -> Result<()> {
        let ancestors = self.ancestor_chain(ct)?;
        match self.config.inheritance.mode {
            InheritanceMode::Flatten => {
                for ancestor in &ancestors {
                    self.add_type_content(msg, ancestor, package)?;
                }
            }
            InheritanceMode::Composition => {
                let mut added = false;
                for ancestor in &ancestors {
                    if ancestor.is_abstract {
                        continue;
                    }
                    let (anc_pkg, anc_name) = {
                        let pkg = self.package_for(ancestor.namespace.as_deref());
                        self.ensure_complex(ancestor, &pkg)?
                    };
                    let tag = msg.take_tag();
                    let mut field = Field::new(&format!("_{}", anc_name), &anc_name, tag);
                    field.type_package = Some(anc_pkg);
                    msg.fields.push(field);
                    added = true;
                }
                if added {
                    msg.advance_tag(1);
                }
            }
        }
        self.add_type_content(msg, ct, package)
    }

    /// Ancestor complex types, root-most first, not including `ct` itself.
    fn ancestor_chain(&self, ct: &ComplexType) -> Result<Vec<ComplexType>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = ct.base.clone();
        while let Some(base) = current {
            if base.is_xsd() || !seen.insert(base.clone()) {
                break;
            }
            match self.set.find_complex(&base) {
                Some(parent) => {
                    current = parent.base.clone();
                    chain.push(parent.clone());
                }
                None => break,
            }
        }
        chain.reverse();
        Ok(chain)
    }

    /// Content of one type only: attributes first, then the particle or
    /// simple content. Attribute order matters for tag assignment.
    fn add_type_content(&mut self, msg: &mut Message, ct: &ComplexType, package: &str) -> Result<()> {
        let defining = ct.name.clone().unwrap_or_else(|| msg.name.clone());
        let previous = std::mem::replace(&mut self.current_defining, Some(defining));
        let result = self.add_own_content(msg, ct, package);
        self.current_defining = previous;
        result
    }

    fn add_own_content(&mut self, msg: &mut Message, ct: &ComplexType, package: &str) -> Result<()> {
        let attributes = self.collect_attributes(ct)?;
        for attr in &attributes {
            self.add_attribute_field(msg, attr, package)?;
        }
        match &ct.content {
            Content::Empty => {}
            Content::Particle(particle) => {
                self.process_particle(msg, particle, package, false)?;
            }
            Content::Simple(type_ref) => {
                let tag = msg.take_tag();
                let scalar = self.resolve_simple_ref(msg, type_ref, "value", package)?;
                let mut field = Field::new("value", &scalar.type_name, tag);
                field.type_package = scalar.type_package;
                msg.fields.push(field);
            }
        }
        Ok(())
    }

    /// Attributes of a type, own uses first, then attribute groups
    /// (recursively resolved, cycle-safe).
    fn collect_attributes(&self, ct: &ComplexType) -> Result<Vec<AttributeUse>> {
        let mut out = ct.attributes.clone();
        let mut visited = HashSet::new();
        let mut pending: Vec<QName> = ct.attribute_groups.clone();
        while let Some(group_name) = pending.pop() {
            if !visited.insert(group_name.clone()) {
                continue;
            }
            let group = self
                .set
                .find_attribute_group(&group_name)
                .ok_or_else(|| self.unresolved(&group_name, ct.name.as_deref().unwrap_or("<anonymous>")))?;
            out.extend(group.attributes.iter().cloned());
            pending.extend(group.attribute_groups.iter().cloned());
        }
        Ok(out)
    }

    fn add_attribute_field(&mut self, msg: &mut Message, attr: &AttributeUse, package: &str) -> Result<()> {
        // Collision with a field inherited from an ancestor. Collisions
        // with this type's own elements are handled when the element is
        // added, since attributes come first.
        let name = if msg.all_fields().any(|f| f.name == attr.name) {
            format!("attr_{}", attr.name)
        } else {
            attr.name.clone()
        };
        let tag = msg.take_tag();
        let resolved = self.resolve_simple_ref(msg, &attr.type_ref, &attr.name, package)?;
        let mut field = Field::new(&name, &resolved.type_name, tag);
        field.type_package = resolved.type_package;
        field.from_attribute = true;
        field.documentation = self.doc_for(attr.documentation.as_deref(), attr.location.as_ref());
        msg.fields.push(field);
        Ok(())
    }

    /// Walk a particle tree, adding fields to `msg`.
    ///
    /// Sequence and all groups flatten into the message in declaration
    /// order. A non-repeated choice becomes a oneof. Repeated model groups
    /// cannot be expressed by flattening, so each one becomes a nested
    /// wrapper message referenced by a repeated field.
    fn process_particle(
        &mut self,
        msg: &mut Message,
        particle: &Particle,
        package: &str,
        inherit_repeated: bool,
    ) -> Result<()> {
        let repeated = inherit_repeated || particle.is_repeated();
        match &particle.term {
            Term::Element(element) => self.add_element_field(msg, element, repeated, package),
            Term::Group { compositor, particles } => {
                if particle.is_repeated() {
                    self.add_group_wrapper(msg, *compositor, particles, package)
                } else if *compositor == Compositor::Choice {
                    self.add_choice_oneof(msg, particles, package, inherit_repeated)
                } else {
                    for child in particles {
                        self.process_particle(msg, child, package, inherit_repeated)?;
                    }
                    Ok(())
                }
            }
            Term::Wildcard => {
                let tag = msg.take_tag();
                let mut field = Field::new("any", "anyType", tag);
                if repeated {
                    field.label = Label::Repeated;
                }
                msg.fields.push(field);
                Ok(())
            }
        }
    }

    /// A repeated group becomes a nested wrapper message holding the group
    /// members, referenced by one repeated field.
    fn add_group_wrapper(
        &mut self,
        msg: &mut Message,
        compositor: Compositor,
        particles: &[Particle],
        package: &str,
    ) -> Result<()> {
        let index = msg
            .nested
            .iter()
            .filter(|t| t.name().starts_with(compositor.wrapper_prefix()))
            .count()
            + 1;
        let wrapper_name = format!("{}{}", compositor.wrapper_prefix(), index);

        let mut wrapper = Message::new(&wrapper_name);
        for child in particles {
            self.process_particle(&mut wrapper, child, package, false)?;
        }

        let tag = msg.take_tag();
        let field_name = wrapper_name.to_lowercase();
        let mut field = Field::new(&field_name, &wrapper_name, tag);
        field.label = Label::Repeated;
        field.type_package = Some(package.to_string());
        msg.fields.push(field);
        msg.nested.push(TypeDecl::Message(wrapper));
        Ok(())
    }

    /// A non-repeated choice becomes a oneof. Members a oneof cannot hold
    /// (repeated elements, nested groups, substitution heads) fall back to
    /// plain fields on the message.
    fn add_choice_oneof(
        &mut self,
        msg: &mut Message,
        particles: &[Particle],
        package: &str,
        inherit_repeated: bool,
    ) -> Result<()> {
        let index = msg
            .oneofs
            .iter()
            .filter(|o| o.name.starts_with("choice_"))
            .count()
            + 1;
        let mut oneof = OneOf {
            name: format!("choice_{}", index),
            documentation: None,
            fields: Vec::new(),
        };
        for child in particles {
            match &child.term {
                Term::Element(el)
                    if !(inherit_repeated || child.is_repeated())
                        && !el.is_abstract
                        && self.set.substitution_members(&el.qname()).is_empty() =>
                {
                    displace_attribute_collision(msg, &el.name);
                    let resolved = self.resolve_element_type(msg, el, package)?;
                    let tag = msg.take_tag();
                    let mut field = Field::new(&el.name, &resolved.type_name, tag);
                    field.type_package = resolved.type_package;
                    field.documentation =
                        self.doc_for(el.documentation.as_deref(), el.location.as_ref());
                    oneof.fields.push(field);
                }
                _ => {
                    debug!(message = %msg.name, "choice member not representable in a oneof, flattened");
                    self.process_particle(msg, child, package, inherit_repeated)?;
                }
            }
        }
        if !oneof.fields.is_empty() {
            msg.oneofs.push(oneof);
        }
        Ok(())
    }

    fn add_element_field(
        &mut self,
        msg: &mut Message,
        element: &ElementDecl,
        repeated: bool,
        package: &str,
    ) -> Result<()> {
        // A head of a substitution group expands into a oneof over its
        // concrete members.
        let members = self.set.substitution_members(&element.qname());
        if !members.is_empty() {
            return self.add_substitution_oneof(msg, element, members.to_vec(), package);
        }
        if element.is_abstract {
            warn!(element = %element.name, "abstract element without substitution members, skipped");
            return Ok(());
        }

        displace_attribute_collision(msg, &element.name);
        let resolved = self.resolve_element_type(msg, element, package)?;
        let tag = msg.take_tag();
        let mut field = Field::new(&element.name, &resolved.type_name, tag);
        field.type_package = resolved.type_package;
        if repeated || resolved.force_repeated {
            field.label = Label::Repeated;
        }
        field.documentation =
            self.doc_for(element.documentation.as_deref(), element.location.as_ref());
        msg.fields.push(field);
        Ok(())
    }

    fn add_substitution_oneof(
        &mut self,
        msg: &mut Message,
        head: &ElementDecl,
        members: Vec<QName>,
        package: &str,
    ) -> Result<()> {
        let mut oneof = OneOf {
            name: head.name.clone(),
            documentation: self.doc_for(head.documentation.as_deref(), head.location.as_ref()),
            fields: Vec::new(),
        };
        for member_name in &members {
            let member = match self.set.find_element(member_name) {
                Some(m) => m.clone(),
                None => return Err(self.unresolved(member_name, &head.name)),
            };
            if member.is_abstract {
                debug!(member = %member.name, "skipping abstract substitution member");
                continue;
            }
            let resolved = self.resolve_element_type(msg, &member, package)?;
            let tag = msg.take_tag();
            let mut field = Field::new(&member.name, &resolved.type_name, tag);
            field.type_package = resolved.type_package;
            oneof.fields.push(field);
        }
        if oneof.fields.is_empty() {
            warn!(head = %head.name, "substitution group has no concrete members");
            return Ok(());
        }
        msg.oneofs.push(oneof);
        Ok(())
    }

    fn resolve_element_type(
        &mut self,
        msg: &mut Message,
        element: &ElementDecl,
        package: &str,
    ) -> Result<ResolvedType> {
        match &element.type_ref {
            ElementType::Named(qname) => self.resolve_named_type(qname, &element.name, package),
            ElementType::InlineComplex(ct) => {
                // Anonymous type. Named with a placeholder suffix the
                // pipeline later replaces or promotes.
                let generated = format!("{}{}", capitalize(&element.name), GENERATED_NAME_SUFFIX);
                self.record_local_type(msg, &generated, package);
                let mut nested = Message::new(&generated);
                nested.documentation = self.doc_for(ct.documentation.as_deref(), ct.location.as_ref());
                self.fill_message(&mut nested, ct, package)?;
                msg.nested.push(TypeDecl::Message(nested));
                Ok(ResolvedType::local(&generated, package))
            }
            ElementType::InlineSimple(st) => {
                self.resolve_inline_simple(msg, st, &element.name, package)
            }
        }
    }

    fn resolve_named_type(&mut self, qname: &QName, context: &str, package: &str) -> Result<ResolvedType> {
        if qname.is_xsd() && self.mapper.is_basic_type(&qname.local) {
            return Ok(ResolvedType::scalar(&qname.local));
        }
        if let Some(ct) = self.set.find_complex(qname) {
            let ct = ct.clone();
            let target_package = self.package_for(ct.namespace.as_deref());
            let (pkg, name) = self.ensure_complex(&ct, &target_package)?;
            return Ok(ResolvedType::local(&name, &pkg));
        }
        if let Some(st) = self.set.find_simple(qname) {
            let st = st.clone();
            if st.is_enumeration() {
                let target_package = self.package_for(st.namespace.as_deref());
                let (pkg, name) = self.ensure_enum(qname, &st, &target_package)?;
                return Ok(ResolvedType::local(&name, &pkg));
            }
            return self.resolve_simple_scalar(&st);
        }
        Err(self.unresolved(qname, context))
    }

    fn resolve_inline_simple(
        &mut self,
        msg: &mut Message,
        st: &SimpleType,
        context: &str,
        package: &str,
    ) -> Result<ResolvedType> {
        if st.is_enumeration() {
            let generated = format!("{}{}", capitalize(context), GENERATED_NAME_SUFFIX);
            self.record_local_type(msg, &generated, package);
            let decl = self.make_enum(&generated, st);
            msg.nested.push(TypeDecl::Enum(decl));
            return Ok(ResolvedType::local(&generated, package));
        }
        self.resolve_simple_scalar(st)
    }

    /// Note a generated local type for the promotion pass.
    fn record_local_type(&mut self, msg: &Message, generated: &str, package: &str) {
        self.local_types.push(LocalTypeUse {
            package: package.to_string(),
            enclosing_message: msg.name.clone(),
            defining_type: self.current_defining.clone(),
            local_name: generated.to_string(),
        });
    }

    fn resolve_simple_ref(
        &mut self,
        msg: &mut Message,
        type_ref: &SimpleTypeRef,
        context: &str,
        package: &str,
    ) -> Result<ResolvedType> {
        match type_ref {
            SimpleTypeRef::Named(qname) => self.resolve_named_type(qname, context, package),
            SimpleTypeRef::Inline(st) => self.resolve_inline_simple(msg, st, context, package),
        }
    }

    /// Follow a non-enumerated simple type down to an XSD primitive.
    fn resolve_simple_scalar(&self, st: &SimpleType) -> Result<ResolvedType> {
        let mut seen = HashSet::new();
        self.resolve_simple_scalar_guarded(st, &mut seen)
    }

    fn resolve_simple_scalar_guarded(
        &self,
        st: &SimpleType,
        seen: &mut HashSet<QName>,
    ) -> Result<ResolvedType> {
        match &st.variety {
            SimpleVariety::Restriction { base, .. } => {
                if base.is_xsd() {
                    return Ok(ResolvedType::scalar(&base.local));
                }
                if !seen.insert(base.clone()) {
                    warn!(type_name = %base.local,
                        "cyclic simple type restriction, falling back to string");
                    return Ok(ResolvedType::scalar("string"));
                }
                match self.set.find_simple(base) {
                    Some(parent) => self.resolve_simple_scalar_guarded(parent, seen),
                    None => Err(self.unresolved(base, st.name.as_deref().unwrap_or("<anonymous>"))),
                }
            }
            SimpleVariety::List { item } => {
                let inner = if item.is_xsd() {
                    ResolvedType::scalar(&item.local)
                } else if !seen.insert(item.clone()) {
                    warn!(type_name = %item.local,
                        "cyclic simple type restriction, falling back to string");
                    ResolvedType::scalar("string")
                } else {
                    match self.set.find_simple(item) {
                        Some(parent) => self.resolve_simple_scalar_guarded(parent, seen)?,
                        None => {
                            return Err(
                                self.unresolved(item, st.name.as_deref().unwrap_or("<anonymous>"))
                            )
                        }
                    }
                };
                Ok(inner.as_list())
            }
            SimpleVariety::Union => Ok(ResolvedType::scalar("string")),
        }
    }

    /// Build a named enum once, returning its (package, name).
    fn ensure_enum(&mut self, qname: &QName, st: &SimpleType, package: &str) -> Result<(String, String)> {
        if !self.processed_enums.contains(qname) {
            self.processed_enums.insert(qname.clone());
            let decl = self.make_enum(&qname.local, st);
            self.push_type(package, TypeDecl::Enum(decl));
        }
        Ok((package.to_string(), qname.local.clone()))
    }

    /// Enum from enumeration facets. Values are deduplicated and numbered
    /// from 1; the zero sentinel is inserted by the enum finalization pass.
    fn make_enum(&self, name: &str, st: &SimpleType) -> EnumType {
        let mut decl = EnumType::new(name);
        decl.documentation = self.doc_for(st.documentation.as_deref(), st.location.as_ref());
        if let SimpleVariety::Restriction { enumeration, .. } = &st.variety {
            let mut seen = HashSet::new();
            let mut number = 1;
            for facet in enumeration {
                if !seen.insert(facet.value.clone()) {
                    continue;
                }
                decl.constants.push(EnumConstant {
                    name: facet.value.clone(),
                    number,
                    documentation: facet.documentation.clone(),
                });
                number += 1;
            }
        }
        decl
    }

    fn push_type(&mut self, package: &str, decl: TypeDecl) {
        let pkg: &mut Package = self.packages.entry(package);
        if pkg.types.iter().any(|t| t.name() == decl.name()) {
            debug!(package, name = decl.name(), "type already present, skipped");
            return;
        }
        pkg.types.push(decl);
    }

    /// Flatten annotation text to one line; optionally append the source
    /// location.
    fn doc_for(&self, doc: Option<&str>, location: Option<&SourceLocation>) -> Option<String> {
        let mut flattened = doc.map(flatten_whitespace).filter(|s| !s.is_empty());
        if self.config.docs.include_source_location {
            if let Some(loc) = location {
                let trailer = format!("[{}]", loc);
                flattened = Some(match flattened {
                    Some(text) => format!("{} {}", text, trailer),
                    None => trailer,
                });
            }
        }
        flattened
    }

    fn unresolved(&self, qname: &QName, referenced_from: &str) -> ConversionError {
        ConversionError::UnresolvableReference {
            name: qname.local.clone(),
            namespace: qname.namespace.clone(),
            referenced_from: referenced_from.to_string(),
        }
    }
}

/// Result of resolving a type reference to something a field can carry.
struct ResolvedType {
    type_name: String,
    type_package: Option<String>,
    force_repeated: bool,
}

impl ResolvedType {
    fn scalar(xsd_local: &str) -> Self {
        Self {
            type_name: xsd_local.to_string(),
            type_package: None,
            force_repeated: false,
        }
    }

    fn local(name: &str, package: &str) -> Self {
        Self {
            type_name: name.to_string(),
            type_package: Some(package.to_string()),
            force_repeated: false,
        }
    }

    fn as_list(mut self) -> Self {
        self.force_repeated = true;
        self
    }
}

/// Element-origin and attribute-origin fields may share a name. The
/// attribute is the one that moves, whichever arrived first.
fn displace_attribute_collision(msg: &mut Message, name: &str) {
    if let Some(existing) = msg
        .fields
        .iter_mut()
        .find(|f| f.name == name && f.from_attribute)
    {
        existing.name = format!("attr_{}", name);
    }
}

pub(crate) fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn flatten_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Convenience entry point: compile the mapper from configuration and run
/// the builder.
pub fn build_model(set: &SchemaSet, config: &ConverterConfig) -> Result<PackageSet> {
    let mapper = NameMapper::new(
        &config.naming.type_rules,
        &config.naming.field_rules,
        &config.naming.scalar_rules,
        &config.fields.ignore,
    )?;
    Builder::new(set, config, &mapper).build()
}
