//! Import computation, cycle detection and reference qualification

use std::collections::{HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, error};

use crate::error::Result;
use crate::model::{Message, PackageSet, TypeDecl};
use crate::passes::PassContext;

/// Output path for a package: one file per package, named after its last
/// segment, under directories mirroring the package.
pub fn proto_path_for_package(package: &str) -> String {
    let segments: Vec<&str> = package.split('.').collect();
    let last = segments.last().copied().unwrap_or(package);
    format!("{}/{}.proto", segments.join("/"), last)
}

/// Resolve cross-package references into import statements.
///
/// Same-package references lose their package qualifier and stay bare
/// names. References into another package add that package's file to the
/// import list. Configured extra imports are appended afterwards, but only
/// to files that actually reference the imported package.
pub fn compute_imports(set: &mut PackageSet, ctx: &mut PassContext) -> Result<()> {
    for (pkg_name, pkg) in set.packages.iter_mut() {
        let mut foreign: HashSet<String> = HashSet::new();
        for decl in pkg.types.iter_mut() {
            scan_decl(pkg_name, decl, &mut foreign);
        }
        for target in &foreign {
            pkg.add_import(&proto_path_for_package(target));
        }

        for import in &ctx.config.output.imports {
            let imported_package = package_of_import(import);
            if foreign.contains(&imported_package) {
                debug!(package = %pkg_name, import = %import, "adding configured import");
                pkg.add_import(import);
            }
        }
    }
    Ok(())
}

fn scan_decl(pkg_name: &str, decl: &mut TypeDecl, foreign: &mut HashSet<String>) {
    if let TypeDecl::Message(msg) = decl {
        for field in msg.all_fields_mut() {
            match field.type_package.as_deref() {
                Some(p) if p == pkg_name => field.type_package = None,
                Some(p) => {
                    foreign.insert(p.to_string());
                }
                None => {}
            }
        }
        for nested in msg.nested.iter_mut() {
            scan_decl(pkg_name, nested, foreign);
        }
    }
}

/// Package an import path refers to: the directory part, dotted.
fn package_of_import(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, _)) => dir.replace('/', "."),
        None => String::new(),
    }
}

/// Scan the package import graph for cycles. proto imports tolerate cycles
/// poorly on most toolchains, but a cycle here reflects the source schemas,
/// so it is reported and the output still written.
pub fn detect_import_cycles(set: &mut PackageSet, ctx: &mut PassContext) -> Result<()> {
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut nodes: HashMap<String, NodeIndex> = HashMap::new();
    let mut by_path: HashMap<String, String> = HashMap::new();

    for name in set.packages.keys() {
        let idx = graph.add_node(name.clone());
        nodes.insert(name.clone(), idx);
        by_path.insert(proto_path_for_package(name), name.clone());
    }
    for (name, pkg) in &set.packages {
        for import in &pkg.imports {
            if let Some(target) = by_path.get(import) {
                graph.add_edge(nodes[name], nodes[target], ());
            }
        }
    }

    for scc in tarjan_scc(&graph) {
        if scc.len() > 1 {
            let cycle: Vec<String> = scc.iter().map(|i| graph[*i].clone()).collect();
            error!(packages = ?cycle, "import cycle between packages");
            ctx.report.import_cycles.push(cycle);
        }
    }
    Ok(())
}

/// Fold the remaining package qualifiers into the type names.
///
/// A qualified name whose first segment is shadowed by a type in the
/// referencing package would resolve against that type, so those get a
/// leading dot to pin resolution at the root.
pub fn qualify_type_references(set: &mut PackageSet, _ctx: &mut PassContext) -> Result<()> {
    let shadows: HashMap<String, HashSet<String>> = set
        .packages
        .iter()
        .map(|(name, pkg)| {
            (
                name.clone(),
                pkg.types.iter().map(|t| t.name().to_string()).collect(),
            )
        })
        .collect();

    for (pkg_name, pkg) in set.packages.iter_mut() {
        let local_names = &shadows[pkg_name];
        for decl in pkg.types.iter_mut() {
            qualify_decl(decl, local_names);
        }
    }
    Ok(())
}

fn qualify_decl(decl: &mut TypeDecl, local_names: &HashSet<String>) {
    if let TypeDecl::Message(msg) = decl {
        qualify_message(msg, local_names);
        for nested in msg.nested.iter_mut() {
            qualify_decl(nested, local_names);
        }
    }
}

fn qualify_message(msg: &mut Message, local_names: &HashSet<String>) {
    for field in msg.all_fields_mut() {
        if let Some(pkg) = field.type_package.take() {
            let first_segment = pkg.split('.').next().unwrap_or(&pkg);
            let qualified = if local_names.contains(first_segment) {
                format!(".{}.{}", pkg, field.type_name)
            } else {
                format!("{}.{}", pkg, field.type_name)
            };
            field.type_name = qualified;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConverterConfig;
    use crate::mapper::NameMapper;
    use crate::model::Field;

    fn two_package_set() -> PackageSet {
        let mut set = PackageSet::new();
        {
            let common = set.entry("org.example.common");
            common.types.push(TypeDecl::Message(Message::new("Money")));
        }
        {
            let orders = set.entry("org.example.orders");
            let mut order = Message::new("Order");
            let mut field = Field::new("total", "Money", 1);
            field.type_package = Some("org.example.common".to_string());
            order.fields.push(field);
            let mut local = Field::new("self_ref", "Order", 2);
            local.type_package = Some("org.example.orders".to_string());
            order.fields.push(local);
            orders.types.push(TypeDecl::Message(order));
        }
        set
    }

    #[test]
    fn proto_paths_mirror_packages() {
        assert_eq!(
            proto_path_for_package("org.example.v1"),
            "org/example/v1/v1.proto"
        );
        assert_eq!(proto_path_for_package("single"), "single/single.proto");
    }

    #[test]
    fn cross_package_reference_creates_import_and_local_loses_package() {
        let mut set = two_package_set();
        let config = ConverterConfig::default();
        let mapper = NameMapper::default();
        let mut ctx = PassContext::new(&config, &mapper);
        compute_imports(&mut set, &mut ctx).unwrap();

        let orders = set.get("org.example.orders").unwrap();
        assert_eq!(orders.imports, vec!["org/example/common/common.proto"]);
        let order = orders.message("Order").unwrap();
        assert_eq!(order.fields[1].type_package, None);
        assert_eq!(
            order.fields[0].type_package.as_deref(),
            Some("org.example.common")
        );
    }

    #[test]
    fn configured_import_added_only_when_referenced() {
        let mut set = two_package_set();
        let mut config = ConverterConfig::default();
        config.output.imports = vec![
            "org/example/common/common.proto".to_string(),
            "google/protobuf/timestamp.proto".to_string(),
        ];
        let mapper = NameMapper::default();
        let mut ctx = PassContext::new(&config, &mapper);
        compute_imports(&mut set, &mut ctx).unwrap();

        let orders = set.get("org.example.orders").unwrap();
        assert!(orders.imports.contains(&"org/example/common/common.proto".to_string()));
        assert!(!orders.imports.iter().any(|i| i.contains("timestamp")));
    }

    #[test]
    fn cycles_are_reported_not_fatal() {
        let mut set = two_package_set();
        // Make common depend back on orders.
        {
            let common = set.entry("org.example.common");
            let mut money = Message::new("Money");
            let mut field = Field::new("order", "Order", 1);
            field.type_package = Some("org.example.orders".to_string());
            money.fields.push(field);
            common.types.clear();
            common.types.push(TypeDecl::Message(money));
        }
        let config = ConverterConfig::default();
        let mapper = NameMapper::default();
        let mut ctx = PassContext::new(&config, &mapper);
        compute_imports(&mut set, &mut ctx).unwrap();
        detect_import_cycles(&mut set, &mut ctx).unwrap();

        assert_eq!(ctx.report.import_cycles.len(), 1);
        assert_eq!(ctx.report.import_cycles[0].len(), 2);
    }

    #[test]
    fn references_are_qualified_with_shadow_protection() {
        let mut set = two_package_set();
        // A type named like the first package segment forces a leading dot.
        {
            let orders = set.entry("org.example.orders");
            orders.types.push(TypeDecl::Message(Message::new("org")));
        }
        let config = ConverterConfig::default();
        let mapper = NameMapper::default();
        let mut ctx = PassContext::new(&config, &mapper);
        compute_imports(&mut set, &mut ctx).unwrap();
        qualify_type_references(&mut set, &mut ctx).unwrap();

        let orders = set.get("org.example.orders").unwrap();
        let order = orders.message("Order").unwrap();
        assert_eq!(order.fields[0].type_name, ".org.example.common.Money");
        assert_eq!(order.fields[0].type_package, None);
        assert_eq!(order.fields[1].type_name, "Order");
    }
}
