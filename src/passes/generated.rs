//! Generated-name cleanup and local type promotion

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, warn};

use crate::builder::capitalize;
use crate::error::{ConversionError, Result};
use crate::model::{PackageSet, TypeDecl, GENERATED_NAME_SUFFIX};
use crate::passes::{rewrite_type_references, PassContext};

/// Replace the placeholder suffix on generated type names with plain
/// `Type`. When the shorter name is already taken by a real declaration the
/// placeholder name stays, so nothing is shadowed.
pub fn replace_generated_suffix(set: &mut PackageSet, _ctx: &mut PassContext) -> Result<()> {
    let mut renames: HashMap<(String, String), String> = HashMap::new();

    for (pkg_name, pkg) in set.packages.iter_mut() {
        let mut names: HashSet<String> = HashSet::new();
        for decl in &pkg.types {
            collect_names(decl, &mut names);
        }

        let generated: Vec<String> = names
            .iter()
            .filter(|n| n.ends_with(GENERATED_NAME_SUFFIX))
            .cloned()
            .collect();
        for old in generated {
            let stem = &old[..old.len() - GENERATED_NAME_SUFFIX.len()];
            let candidate = format!("{}Type", stem);
            if names.contains(&candidate) {
                warn!(package = %pkg_name, name = %old, wanted = %candidate,
                    "generated name kept, replacement already in use");
                continue;
            }
            renames.insert((pkg_name.clone(), old.clone()), candidate.clone());
            names.insert(candidate);
        }

        for decl in pkg.types.iter_mut() {
            apply_renames(pkg_name, decl, &renames);
        }
    }

    rewrite_type_references(set, &renames);

    // The usage table still refers to the old names.
    for usage in set.local_types.iter_mut() {
        let pkg = usage.package.clone();
        for slot in [&mut usage.local_name, &mut usage.enclosing_message] {
            if let Some(new_name) = renames.get(&(pkg.clone(), slot.clone())) {
                *slot = new_name.clone();
            }
        }
        if let Some(defining) = usage.defining_type.as_mut() {
            if let Some(new_name) = renames.get(&(pkg, defining.clone())) {
                *defining = new_name.clone();
            }
        }
    }
    Ok(())
}

fn collect_names(decl: &TypeDecl, names: &mut HashSet<String>) {
    names.insert(decl.name().to_string());
    if let TypeDecl::Message(msg) = decl {
        for nested in &msg.nested {
            collect_names(nested, names);
        }
    }
}

fn apply_renames(pkg: &str, decl: &mut TypeDecl, renames: &HashMap<(String, String), String>) {
    if let Some(new_name) = renames.get(&(pkg.to_string(), decl.name().to_string())) {
        decl.set_name(new_name.clone());
    }
    if let TypeDecl::Message(msg) = decl {
        for nested in msg.nested.iter_mut() {
            apply_renames(pkg, nested, renames);
        }
    }
}

/// Promote local types reused across messages to package scope.
///
/// A nested type whose name appears under two or more parent messages with
/// identical structure is hoisted to the package top level and the nested
/// copies are removed. When a differing declaration holds the same name,
/// the hoisted copy is renamed to `<DefiningType>_<Name>` using the
/// builder's usage table; its referencing fields are rewritten to match.
/// Occurrences whose defining types disagree cannot be named
/// deterministically, which aborts the run.
pub fn promote_local_types(set: &mut PackageSet, ctx: &mut PassContext) -> Result<()> {
    let usage = set.local_types.clone();
    for (pkg_name, pkg) in set.packages.iter_mut() {
        // name -> (direct parent, structural key, one representative)
        let mut occurrences: BTreeMap<String, Vec<(String, String, TypeDecl)>> = BTreeMap::new();
        for decl in &pkg.types {
            if let TypeDecl::Message(msg) = decl {
                collect_nested(&msg.name, msg, &mut occurrences);
            }
        }

        let mut taken: HashSet<String> = HashSet::new();
        for decl in &pkg.types {
            collect_names(decl, &mut taken);
        }

        for (name, found) in occurrences {
            let mut by_structure: BTreeMap<&str, Vec<&(String, String, TypeDecl)>> =
                BTreeMap::new();
            for occurrence in &found {
                by_structure
                    .entry(occurrence.1.as_str())
                    .or_default()
                    .push(occurrence);
            }
            let structure_count = by_structure.len();
            let global_key = pkg
                .types
                .iter()
                .find(|t| t.name() == name)
                .map(structural_key);

            for (key, group) in by_structure {
                let parents: HashSet<&str> = group.iter().map(|(p, _, _)| p.as_str()).collect();
                if parents.len() < 2 {
                    continue;
                }

                let matching_global = global_key.as_deref() == Some(key);
                let contested =
                    structure_count > 1 || (global_key.is_some() && !matching_global);
                if !contested {
                    if !matching_global {
                        pkg.types.push(group[0].2.clone());
                    }
                    for decl in pkg.types.iter_mut() {
                        remove_nested(decl, &name, key);
                    }
                    debug!(package = %pkg_name, type_name = %name, copies = group.len(),
                        "promoted reused local type");
                    ctx.report
                        .notes
                        .push(format!("promoted local type {}.{}", pkg_name, name));
                    continue;
                }

                // The plain name is contested. Disambiguate with the name
                // of the complex type that declared the local type.
                let defining: HashSet<&str> = usage
                    .iter()
                    .filter(|u| {
                        u.package == *pkg_name
                            && u.local_name == name
                            && parents.contains(u.enclosing_message.as_str())
                    })
                    .filter_map(|u| u.defining_type.as_deref())
                    .collect();
                if defining.len() > 1 {
                    let mut names: Vec<String> =
                        defining.iter().map(|d| d.to_string()).collect();
                    names.sort();
                    return Err(ConversionError::AmbiguousPromotion {
                        name: name.clone(),
                        defining: names,
                    });
                }
                let Some(defining) = defining.into_iter().next() else {
                    warn!(package = %pkg_name, type_name = %name,
                        "contested local type has no recorded defining type, not promoted");
                    continue;
                };

                let candidate = format!("{}_{}", capitalize(defining), name);
                if taken.contains(&candidate) {
                    warn!(package = %pkg_name, type_name = %name, wanted = %candidate,
                        "contested local type not promoted, disambiguated name already in use");
                    continue;
                }

                let mut promoted = group[0].2.clone();
                promoted.set_name(candidate.clone());
                pkg.types.push(promoted);
                taken.insert(candidate.clone());
                for decl in pkg.types.iter_mut() {
                    remove_nested(decl, &name, key);
                    retarget_references(decl, &parents, pkg_name, &name, &candidate);
                }
                debug!(package = %pkg_name, type_name = %name, new_name = %candidate,
                    copies = group.len(), "promoted contested local type under disambiguated name");
                ctx.report.notes.push(format!(
                    "promoted local type {}.{} as {}",
                    pkg_name, name, candidate
                ));
            }
        }
    }
    Ok(())
}

/// Point fields of the promoted group's parent messages at the new global
/// name. Other same-named nested types keep their references.
fn retarget_references(
    decl: &mut TypeDecl,
    parents: &HashSet<&str>,
    pkg: &str,
    old: &str,
    new: &str,
) {
    if let TypeDecl::Message(msg) = decl {
        if parents.contains(msg.name.as_str()) {
            for field in msg.all_fields_mut() {
                if field.type_name == old && field.type_package.as_deref() == Some(pkg) {
                    field.type_name = new.to_string();
                }
            }
        }
        for nested in msg.nested.iter_mut() {
            retarget_references(nested, parents, pkg, old, new);
        }
    }
}

fn collect_nested(
    parent: &str,
    msg: &crate::model::Message,
    out: &mut BTreeMap<String, Vec<(String, String, TypeDecl)>>,
) {
    for nested in &msg.nested {
        out.entry(nested.name().to_string()).or_default().push((
            parent.to_string(),
            structural_key(nested),
            nested.clone(),
        ));
        if let TypeDecl::Message(inner) = nested {
            collect_nested(&inner.name, inner, out);
        }
    }
}

fn remove_nested(decl: &mut TypeDecl, name: &str, key: &str) {
    if let TypeDecl::Message(msg) = decl {
        msg.nested
            .retain(|n| !(n.name() == name && structural_key(n) == key));
        for nested in msg.nested.iter_mut() {
            remove_nested(nested, name, key);
        }
    }
}

/// Structure of a declaration with documentation stripped, as a comparable
/// string.
fn structural_key(decl: &TypeDecl) -> String {
    let mut clone = decl.clone();
    strip_docs(&mut clone);
    serde_json::to_string(&clone).unwrap_or_default()
}

fn strip_docs(decl: &mut TypeDecl) {
    match decl {
        TypeDecl::Message(msg) => {
            msg.documentation = None;
            for field in msg.all_fields_mut() {
                field.documentation = None;
            }
            for oneof in msg.oneofs.iter_mut() {
                oneof.documentation = None;
            }
            for nested in msg.nested.iter_mut() {
                strip_docs(nested);
            }
        }
        TypeDecl::Enum(en) => {
            en.documentation = None;
            for constant in en.constants.iter_mut() {
                constant.documentation = None;
            }
        }
    }
}
