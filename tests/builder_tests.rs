//! End-to-end conversion tests over constructed schema graphs

use xsd2proto::model::{Label, TypeDecl};
use xsd2proto::xsd::{
    AttributeUse, ComplexType, Compositor, Content, ElementDecl, ElementType, EnumFacet, Particle,
    QName, Schema, SchemaSet, SimpleType, SimpleTypeRef, SimpleVariety, Term,
};
use xsd2proto::{convert, render, ConverterConfig};

const NS: &str = "http://example.org/person";

fn sequence(particles: Vec<Particle>) -> Content {
    Content::Particle(Particle::of(Term::Group {
        compositor: Compositor::Sequence,
        particles,
    }))
}

fn element(name: &str, type_name: &str) -> Particle {
    Particle::of(Term::Element(ElementDecl::named(
        name,
        ElementType::Named(QName::xsd(type_name)),
    )))
}

fn person_schema() -> SchemaSet {
    // A required id attribute and a repeated name element.
    let mut person = ComplexType::named(Some(NS), "Person");
    person.attributes.push(AttributeUse::named(
        "id",
        SimpleTypeRef::Named(QName::xsd("integer")),
    ));
    person.content = sequence(vec![Particle::repeated(Term::Element(ElementDecl::named(
        "name",
        ElementType::Named(QName::xsd("string")),
    )))]);
    let mut schema = Schema::new(Some(NS));
    schema.complex_types.push(person);
    SchemaSet {
        schemas: vec![schema],
        ..Default::default()
    }
}

#[test]
fn person_converts_to_expected_message() {
    let conversion = convert(&person_schema(), &ConverterConfig::default(), None).unwrap();

    let pkg = conversion.packages.get("org.example.person").unwrap();
    let person = pkg.message("Person").unwrap();
    assert_eq!(person.fields.len(), 2);

    let id = &person.fields[0];
    assert_eq!(id.name, "id");
    assert_eq!(id.type_name, "int32");
    assert_eq!(id.tag, 1);
    assert_eq!(id.label, Label::Single);
    assert!(id.from_attribute);

    let name = &person.fields[1];
    assert_eq!(name.name, "name");
    assert_eq!(name.type_name, "string");
    assert_eq!(name.tag, 2);
    assert_eq!(name.label, Label::Repeated);
}

#[test]
fn person_renders_to_proto3_text() {
    let conversion = convert(&person_schema(), &ConverterConfig::default(), None).unwrap();
    let pkg = conversion.packages.get("org.example.person").unwrap();
    let text = render::render_package(pkg);

    assert!(text.contains("syntax = \"proto3\";"));
    assert!(text.contains("package org.example.person;"));
    assert!(text.contains("  int32 id = 1;"));
    assert!(text.contains("  repeated string name = 2;"));
    assert_eq!(pkg.filename.as_deref(), Some("org/example/person/person.proto"));
}

#[test]
fn tags_are_unique_within_every_message() {
    // A broader schema: attributes, enums, wrappers, inheritance.
    let mut base = ComplexType::named(Some(NS), "Entity");
    base.content = sequence(vec![element("created", "dateTime")]);

    let mut person = ComplexType::named(Some(NS), "Person");
    person.base = Some(QName::new(Some(NS), "Entity"));
    person.content = sequence(vec![
        element("id", "int"),
        Particle::repeated(Term::Group {
            compositor: Compositor::Choice,
            particles: vec![element("email", "string"), element("phone", "string")],
        }),
    ]);
    person.attributes.push(AttributeUse::named(
        "id",
        SimpleTypeRef::Named(QName::xsd("string")),
    ));

    let mut status = SimpleType::restriction(Some("Status"), QName::xsd("string"));
    status.namespace = Some(NS.to_string());
    if let SimpleVariety::Restriction { enumeration, .. } = &mut status.variety {
        enumeration.push(EnumFacet::new("active"));
        enumeration.push(EnumFacet::new("retired"));
    }

    let mut schema = Schema::new(Some(NS));
    schema.complex_types.push(base);
    schema.complex_types.push(person);
    schema.simple_types.push(status);
    let set = SchemaSet {
        schemas: vec![schema],
        ..Default::default()
    };

    let conversion = convert(&set, &ConverterConfig::default(), None).unwrap();
    conversion.packages.for_each_type(|_, decl| {
        if let TypeDecl::Message(msg) = decl {
            let mut tags: Vec<u32> = msg.all_fields().map(|f| f.tag).collect();
            let before = tags.len();
            tags.sort_unstable();
            tags.dedup();
            assert_eq!(tags.len(), before, "duplicate tag in {}", msg.name);
            for tag in &tags {
                assert!(
                    !msg.reserved_tags.contains(tag),
                    "live tag {} is reserved in {}",
                    tag,
                    msg.name
                );
            }
        }
    });
}

#[test]
fn type_names_are_unique_per_package() {
    let conversion = convert(&person_schema(), &ConverterConfig::default(), None).unwrap();
    for pkg in conversion.packages.packages.values() {
        let mut names: Vec<&str> = pkg.types.iter().map(|t| t.name()).collect();
        let before = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), before, "duplicate type name in {}", pkg.name);
    }
}

#[test]
fn attribute_provenance_survives_to_the_model() {
    let mut person = ComplexType::named(Some(NS), "Person");
    person.content = sequence(vec![element("name", "string")]);
    person.attributes.push(AttributeUse::named(
        "version",
        SimpleTypeRef::Named(QName::xsd("string")),
    ));
    let mut schema = Schema::new(Some(NS));
    schema.complex_types.push(person);
    let set = SchemaSet {
        schemas: vec![schema],
        ..Default::default()
    };

    let conversion = convert(&set, &ConverterConfig::default(), None).unwrap();
    let person = conversion
        .packages
        .get("org.example.person")
        .unwrap()
        .message("Person")
        .unwrap();
    let version = person.fields.iter().find(|f| f.name == "version").unwrap();
    assert!(version.from_attribute);
    let name = person.fields.iter().find(|f| f.name == "name").unwrap();
    assert!(!name.from_attribute);
}

#[test]
fn forced_package_overrides_namespace_derivation() {
    let mut config = ConverterConfig::default();
    config.packages.force_package = Some("com.acme.flat".to_string());

    let conversion = convert(&person_schema(), &config, None).unwrap();
    assert!(conversion.packages.get("com.acme.flat").is_some());
    assert!(conversion.packages.get("org.example.person").is_none());
}
