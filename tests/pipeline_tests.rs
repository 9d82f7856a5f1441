//! Pipeline contract tests

use xsd2proto::config::RenameRule;
use xsd2proto::passes::PIPELINE;
use xsd2proto::xsd::{
    ComplexType, Compositor, Content, ElementDecl, ElementType, EnumFacet, Particle, QName,
    Schema, SchemaSet, SimpleType, SimpleVariety, Term,
};
use xsd2proto::{convert, ConverterConfig};

#[test]
fn pipeline_order_is_the_documented_contract() {
    let names: Vec<&str> = PIPELINE.iter().map(|(name, _)| *name).collect();
    assert_eq!(
        names,
        vec![
            "replace_generated_suffix",
            "promote_local_types",
            "remove_excluded_fields",
            "uppercase_type_names",
            "resolve_case_collisions",
            "translate_names",
            "compute_imports",
            "detect_import_cycles",
            "qualify_type_references",
            "underscore_field_names",
            "escape_reserved_keywords",
            "finalize_enums",
        ]
    );
}

fn sequence(particles: Vec<Particle>) -> Content {
    Content::Particle(Particle::of(Term::Group {
        compositor: Compositor::Sequence,
        particles,
    }))
}

fn named_element(name: &str, qname: QName) -> Particle {
    Particle::of(Term::Element(ElementDecl::named(
        name,
        ElementType::Named(qname),
    )))
}

#[test]
fn enums_end_up_with_sentinel_and_prefixed_constants() {
    const NS: &str = "http://example.org/orders";

    let mut status = SimpleType::restriction(Some("OrderStatus"), QName::xsd("string"));
    status.namespace = Some(NS.to_string());
    if let SimpleVariety::Restriction { enumeration, .. } = &mut status.variety {
        enumeration.push(EnumFacet::new("open"));
        enumeration.push(EnumFacet::new("closed"));
    }
    let mut order = ComplexType::named(Some(NS), "Order");
    order.content = sequence(vec![named_element(
        "status",
        QName::new(Some(NS), "OrderStatus"),
    )]);

    let mut schema = Schema::new(Some(NS));
    schema.simple_types.push(status);
    schema.complex_types.push(order);
    let set = SchemaSet {
        schemas: vec![schema],
        ..Default::default()
    };

    let conversion = convert(&set, &ConverterConfig::default(), None).unwrap();
    let pkg = conversion.packages.get("org.example.orders").unwrap();
    let status = pkg.enum_type("OrderStatus").unwrap();
    let names: Vec<(&str, i32)> = status
        .constants
        .iter()
        .map(|c| (c.name.as_str(), c.number))
        .collect();
    assert_eq!(
        names,
        vec![
            ("ORDER_STATUS_UNSPECIFIED", 0),
            ("ORDER_STATUS_OPEN", 1),
            ("ORDER_STATUS_CLOSED", 2),
        ]
    );
}

#[test]
fn cross_package_references_are_imported_and_qualified() {
    const COMMON: &str = "http://example.org/common";
    const ORDERS: &str = "http://example.org/orders";

    let money = ComplexType::named(Some(COMMON), "Money");
    let mut common = Schema::new(Some(COMMON));
    common.complex_types.push(money);

    let mut order = ComplexType::named(Some(ORDERS), "Order");
    order.content = sequence(vec![named_element(
        "total",
        QName::new(Some(COMMON), "Money"),
    )]);
    let mut orders = Schema::new(Some(ORDERS));
    orders.complex_types.push(order);

    let set = SchemaSet {
        schemas: vec![common, orders],
        ..Default::default()
    };

    let conversion = convert(&set, &ConverterConfig::default(), None).unwrap();
    let orders_pkg = conversion.packages.get("org.example.orders").unwrap();
    assert!(orders_pkg
        .imports
        .contains(&"org/example/common/common.proto".to_string()));
    let order = orders_pkg.message("Order").unwrap();
    assert_eq!(order.fields[0].type_name, "org.example.common.Money");
    assert_eq!(order.fields[0].type_package, None);
    assert!(conversion.report.import_cycles.is_empty());
}

#[test]
fn mutually_importing_packages_are_reported_not_fatal() {
    const A: &str = "http://example.org/a";
    const B: &str = "http://example.org/b";

    let mut left = ComplexType::named(Some(A), "Left");
    left.content = sequence(vec![named_element("right", QName::new(Some(B), "Right"))]);
    let mut right = ComplexType::named(Some(B), "Right");
    right.content = sequence(vec![named_element("left", QName::new(Some(A), "Left"))]);

    let mut schema_a = Schema::new(Some(A));
    schema_a.complex_types.push(left);
    let mut schema_b = Schema::new(Some(B));
    schema_b.complex_types.push(right);

    let set = SchemaSet {
        schemas: vec![schema_a, schema_b],
        ..Default::default()
    };

    let conversion = convert(&set, &ConverterConfig::default(), None).unwrap();
    assert_eq!(conversion.report.import_cycles.len(), 1);
    let cycle = &conversion.report.import_cycles[0];
    assert!(cycle.contains(&"org.example.a".to_string()));
    assert!(cycle.contains(&"org.example.b".to_string()));
}

#[test]
fn excluded_fields_disappear_from_the_output() {
    const NS: &str = "http://example.org/person";
    let mut person = ComplexType::named(Some(NS), "Person");
    person.content = sequence(vec![
        named_element("id", QName::xsd("int")),
        named_element("internalId", QName::xsd("string")),
    ]);
    let mut schema = Schema::new(Some(NS));
    schema.complex_types.push(person);
    let set = SchemaSet {
        schemas: vec![schema],
        ..Default::default()
    };

    let mut config = ConverterConfig::default();
    config.fields.ignore = vec!["*/Person/internalId".to_string()];

    let conversion = convert(&set, &config, None).unwrap();
    let person = conversion
        .packages
        .get("org.example.person")
        .unwrap()
        .message("Person")
        .unwrap();
    assert_eq!(person.fields.len(), 1);
    assert_eq!(person.fields[0].name, "id");
    assert_eq!(conversion.report.removed_fields, 1);
}

#[test]
fn field_names_are_snake_cased_and_keywords_escaped() {
    const NS: &str = "http://example.org/person";
    let mut person = ComplexType::named(Some(NS), "Person");
    person.content = sequence(vec![
        named_element("BirthDate", QName::xsd("date")),
        named_element("option", QName::xsd("string")),
    ]);
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
    let names: Vec<&str> = person.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["birth_date", "option_field"]);
}

#[test]
fn capitalized_name_that_snake_cases_to_a_keyword_is_still_escaped() {
    const NS: &str = "http://example.org/person";
    let mut person = ComplexType::named(Some(NS), "Person");
    person.content = sequence(vec![named_element("Option", QName::xsd("string"))]);
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
    assert_eq!(person.fields[0].name, "option_field");
}

#[test]
fn user_rename_rules_apply_before_qualification() {
    const NS: &str = "http://example.org/person";
    let mut person = ComplexType::named(Some(NS), "PersonStructure");
    person.content = sequence(vec![named_element("id", QName::xsd("int"))]);
    let mut schema = Schema::new(Some(NS));
    schema.complex_types.push(person);
    let set = SchemaSet {
        schemas: vec![schema],
        ..Default::default()
    };

    let mut config = ConverterConfig::default();
    config.naming.type_rules = vec![RenameRule {
        pattern: "(.*)Structure".to_string(),
        replacement: "$1".to_string(),
    }];

    let conversion = convert(&set, &config, None).unwrap();
    let pkg = conversion.packages.get("org.example.person").unwrap();
    assert!(pkg.message("Person").is_some());
    assert!(pkg.message("PersonStructure").is_none());
}
