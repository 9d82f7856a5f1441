//! Field-level passes: exclusion, collision handling, keyword escaping and
//! final snake_casing

use std::collections::HashSet;

use heck::ToSnakeCase;
use tracing::debug;

use crate::error::Result;
use crate::mapper::escape_reserved;
use crate::model::{PackageSet, TypeDecl};
use crate::passes::PassContext;

/// Drop fields excluded by configuration. Each removal is noted in the
/// message documentation; oneofs emptied by removal disappear with it.
pub fn remove_excluded_fields(set: &mut PackageSet, ctx: &mut PassContext) -> Result<()> {
    let mapper = ctx.mapper;
    let mut removed_total = 0usize;
    set.for_each_type_mut(|pkg, decl| {
        if let TypeDecl::Message(msg) = decl {
            let name = msg.name.clone();
            let mut removed = Vec::new();
            msg.fields.retain(|f| {
                let drop = mapper.is_ignored(pkg, &name, &f.name);
                if drop {
                    removed.push(f.name.clone());
                }
                !drop
            });
            for oneof in msg.oneofs.iter_mut() {
                oneof.fields.retain(|f| {
                    let drop = mapper.is_ignored(pkg, &name, &f.name);
                    if drop {
                        removed.push(f.name.clone());
                    }
                    !drop
                });
            }
            msg.oneofs.retain(|o| !o.fields.is_empty());

            if !removed.is_empty() {
                removed_total += removed.len();
                debug!(package = pkg, message = %name, fields = ?removed, "removed excluded fields");
                let note = format!("Removed by configuration: {}.", removed.join(", "));
                msg.documentation = Some(match msg.documentation.take() {
                    Some(doc) => format!("{} {}", doc, note),
                    None => note,
                });
            }
        }
    });
    ctx.report.removed_fields += removed_total;
    Ok(())
}

/// Proto field names are case-insensitive in generated code on several
/// targets. Later fields whose names collide case-insensitively get a `_v`
/// suffix until unique.
pub fn resolve_case_collisions(set: &mut PackageSet, _ctx: &mut PassContext) -> Result<()> {
    set.for_each_type_mut(|_, decl| {
        if let TypeDecl::Message(msg) = decl {
            let mut seen: HashSet<String> = HashSet::new();
            for field in msg.all_fields_mut() {
                while !seen.insert(field.name.to_lowercase()) {
                    field.name.push_str("_v");
                }
            }
        }
    });
    Ok(())
}

/// Reserved words cannot be field names; suffix them. Runs after
/// snake_casing, which is what can turn a capitalized name into a keyword.
pub fn escape_reserved_keywords(set: &mut PackageSet, _ctx: &mut PassContext) -> Result<()> {
    set.for_each_type_mut(|_, decl| {
        if let TypeDecl::Message(msg) = decl {
            for field in msg.all_fields_mut() {
                field.name = escape_reserved(&field.name);
            }
        }
    });
    Ok(())
}

/// Field name normalization: lower snake_case with dash removal.
/// Leading underscores survive (composition fields are `_base_name`), a
/// trailing underscore becomes a `u` so the name stays distinct from its
/// trimmed form.
pub fn underscore_field_names(set: &mut PackageSet, _ctx: &mut PassContext) -> Result<()> {
    set.for_each_type_mut(|_, decl| {
        if let TypeDecl::Message(msg) = decl {
            for field in msg.all_fields_mut() {
                field.name = underscore(&field.name);
            }
            for oneof in msg.oneofs.iter_mut() {
                oneof.name = underscore(&oneof.name);
            }
        }
    });
    Ok(())
}

fn underscore(name: &str) -> String {
    let had_leading = name.starts_with('_');
    let had_trailing = name.ends_with('_');
    let core = name.trim_matches('_').replace('-', "");
    let mut snake = core.to_snake_case();
    if had_trailing {
        snake.push('u');
    }
    if had_leading {
        snake.insert(0, '_');
    }
    snake
}
