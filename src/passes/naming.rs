//! Type and field naming passes

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::error::Result;
use crate::model::{PackageSet, TypeDecl};
use crate::passes::{rewrite_type_references, PassContext};

/// Capitalize the first letter of every message and enum name. Proto style
/// expects type names to start uppercase; XSD types frequently do not.
pub fn uppercase_type_names(set: &mut PackageSet, _ctx: &mut PassContext) -> Result<()> {
    rename_types(set, |name| {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_lowercase() => {
                Some(first.to_uppercase().collect::<String>() + chars.as_str())
            }
            _ => None,
        }
    })
}

/// Apply the user rename rules: type rules to type names, field rules to
/// field names, then the primitive replacement table to scalar references.
pub fn translate_names(set: &mut PackageSet, ctx: &mut PassContext) -> Result<()> {
    let mapper = ctx.mapper;
    rename_types(set, |name| {
        let translated = mapper.translate_type(name);
        (translated != name).then_some(translated)
    })?;

    set.for_each_type_mut(|_, decl| {
        if let TypeDecl::Message(msg) = decl {
            for field in msg.all_fields_mut() {
                let translated = mapper.translate_field(&field.name);
                if translated != field.name {
                    field.name = translated;
                }
                // A field without a package refers to an XSD primitive.
                if field.type_package.is_none() {
                    if let Some(scalar) = mapper.scalar_for(&field.type_name) {
                        field.type_name = scalar.to_string();
                    }
                }
            }
        }
    });
    Ok(())
}

/// Rename every type declaration through `f` and rewrite the references.
///
/// A rename whose target name is already taken in the package is skipped
/// and the original name kept. Same-named declarations in one package are
/// renamed consistently so reference rewriting stays unambiguous.
fn rename_types<F: Fn(&str) -> Option<String>>(set: &mut PackageSet, f: F) -> Result<()> {
    let mut renames: HashMap<(String, String), String> = HashMap::new();
    for (pkg_name, pkg) in set.packages.iter_mut() {
        let mut taken = HashSet::new();
        for decl in pkg.types.iter() {
            collect_names(decl, &mut taken);
        }
        for decl in pkg.types.iter_mut() {
            rename_decl(pkg_name, decl, &f, &mut renames, &mut taken);
        }
    }
    rewrite_type_references(set, &renames);
    Ok(())
}

fn collect_names(decl: &TypeDecl, out: &mut HashSet<String>) {
    out.insert(decl.name().to_string());
    if let TypeDecl::Message(msg) = decl {
        for nested in &msg.nested {
            collect_names(nested, out);
        }
    }
}

fn rename_decl<F: Fn(&str) -> Option<String>>(
    pkg: &str,
    decl: &mut TypeDecl,
    f: &F,
    renames: &mut HashMap<(String, String), String>,
    taken: &mut HashSet<String>,
) {
    let key = (pkg.to_string(), decl.name().to_string());
    if let Some(prior) = renames.get(&key) {
        let prior = prior.clone();
        decl.set_name(prior);
    } else if let Some(new_name) = f(decl.name()) {
        if taken.contains(&new_name) {
            warn!(
                package = pkg,
                from = decl.name(),
                to = %new_name,
                "rename collides with an existing type, original name kept"
            );
        } else {
            taken.insert(new_name.clone());
            renames.insert(key, new_name.clone());
            decl.set_name(new_name);
        }
    }
    if let TypeDecl::Message(msg) = decl {
        for nested in msg.nested.iter_mut() {
            rename_decl(pkg, nested, f, renames, taken);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConverterConfig, RenameRule};
    use crate::mapper::NameMapper;
    use crate::model::{Field, Message};

    #[test]
    fn lowercase_type_names_are_capitalized_and_references_follow() {
        let mut set = PackageSet::new();
        let pkg = set.entry("org.example");
        pkg.types.push(TypeDecl::Message(Message::new("person")));
        let mut order = Message::new("Order");
        let mut field = Field::new("buyer", "person", 1);
        field.type_package = Some("org.example".to_string());
        order.fields.push(field);
        pkg.types.push(TypeDecl::Message(order));

        let config = ConverterConfig::default();
        let mapper = NameMapper::default();
        let mut ctx = PassContext::new(&config, &mapper);
        uppercase_type_names(&mut set, &mut ctx).unwrap();

        let pkg = set.get("org.example").unwrap();
        assert!(pkg.message("Person").is_some());
        assert_eq!(pkg.message("Order").unwrap().fields[0].type_name, "Person");
    }

    #[test]
    fn user_rules_and_scalar_table_apply() {
        let mut set = PackageSet::new();
        let pkg = set.entry("org.example");
        let mut person = Message::new("PersonStructure");
        person.fields.push(Field::new("birthDate", "date", 1));
        pkg.types.push(TypeDecl::Message(person));

        let config = ConverterConfig::default();
        let mapper = NameMapper::new(
            &[RenameRule {
                pattern: "(.*)Structure".to_string(),
                replacement: "$1".to_string(),
            }],
            &[RenameRule {
                pattern: "birthDate".to_string(),
                replacement: "date_of_birth".to_string(),
            }],
            &[],
            &[],
        )
        .unwrap();
        let mut ctx = PassContext::new(&config, &mapper);
        translate_names(&mut set, &mut ctx).unwrap();

        let pkg = set.get("org.example").unwrap();
        let person = pkg.message("Person").unwrap();
        assert_eq!(person.fields[0].name, "date_of_birth");
        assert_eq!(person.fields[0].type_name, "uint32");
    }

    #[test]
    fn colliding_rename_is_skipped() {
        let mut set = PackageSet::new();
        let pkg = set.entry("org.example");
        pkg.types.push(TypeDecl::Message(Message::new("Person")));
        pkg.types.push(TypeDecl::Message(Message::new("PersonStructure")));

        let config = ConverterConfig::default();
        let mapper = NameMapper::new(
            &[RenameRule {
                pattern: "(.*)Structure".to_string(),
                replacement: "$1".to_string(),
            }],
            &[],
            &[],
            &[],
        )
        .unwrap();
        let mut ctx = PassContext::new(&config, &mapper);
        translate_names(&mut set, &mut ctx).unwrap();

        let pkg = set.get("org.example").unwrap();
        assert!(pkg.message("Person").is_some());
        assert!(pkg.message("PersonStructure").is_some());
    }
}
