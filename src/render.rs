//! Proto3 text rendering
//!
//! Straight string building over the finalized model, plus the output file
//! layout. No rewriting happens here; every name and tag is already final
//! when rendering starts.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::ConverterConfig;
use crate::error::{ConversionError, Result};
use crate::model::{
    EnumType, Field, FileOption, Label, Message, OptionValue, Package, PackageSet, TypeDecl,
};
use crate::passes::proto_path_for_package;

/// Assign output filenames, attach the configured file options and put
/// fields back in tag order.
///
/// Each package normally gets its own file mirroring the package path. With
/// a single configured output file, more than one package is a hard error;
/// two packages cannot share one file. Reconciliation can displace a field
/// to a tag above its neighbours, so declaration order is only restored
/// here, after every tag is final.
pub fn apply_file_layout(set: &mut PackageSet, config: &ConverterConfig) -> Result<()> {
    if let Some(single) = &config.output.single_file {
        if set.packages.len() > 1 {
            return Err(ConversionError::OutputFilenameConflict {
                filename: single.clone(),
                count: set.packages.len(),
            });
        }
        for pkg in set.packages.values_mut() {
            pkg.filename = Some(single.clone());
        }
    } else {
        for (name, pkg) in set.packages.iter_mut() {
            pkg.filename = Some(proto_path_for_package(name));
        }
    }

    for pkg in set.packages.values_mut() {
        for option in &config.output.options {
            pkg.options.push(FileOption {
                name: option.name.clone(),
                value: option.value.clone(),
            });
        }
        for decl in pkg.types.iter_mut() {
            sort_fields_by_tag(decl);
        }
    }
    Ok(())
}

fn sort_fields_by_tag(decl: &mut TypeDecl) {
    if let TypeDecl::Message(msg) = decl {
        msg.fields.sort_by_key(|f| f.tag);
        for oneof in msg.oneofs.iter_mut() {
            oneof.fields.sort_by_key(|f| f.tag);
        }
        for nested in msg.nested.iter_mut() {
            sort_fields_by_tag(nested);
        }
    }
}

/// Render one package to proto3 text.
pub fn render_package(pkg: &Package) -> String {
    let mut out = String::new();
    out.push_str("// Code generated from XML Schema. DO NOT EDIT.\n");
    out.push_str("syntax = \"proto3\";\n\n");
    let _ = writeln!(out, "package {};", pkg.name);

    let mut imports = pkg.imports.clone();
    imports.sort();
    imports.dedup();
    if !imports.is_empty() {
        out.push('\n');
        for import in &imports {
            let _ = writeln!(out, "import \"{}\";", import);
        }
    }

    if !pkg.options.is_empty() {
        out.push('\n');
        for option in &pkg.options {
            let _ = writeln!(out, "option {} = {};", option.name, render_value(&option.value));
        }
    }

    for decl in &pkg.types {
        out.push('\n');
        render_decl(&mut out, decl, 0);
    }
    out
}

fn render_value(value: &OptionValue) -> String {
    match value {
        OptionValue::Bool(b) => b.to_string(),
        OptionValue::Number(n) => n.to_string(),
        OptionValue::Text(s) => format!("\"{}\"", s),
    }
}

fn render_decl(out: &mut String, decl: &TypeDecl, depth: usize) {
    match decl {
        TypeDecl::Message(msg) => render_message(out, msg, depth),
        TypeDecl::Enum(en) => render_enum(out, en, depth),
    }
}

fn render_message(out: &mut String, msg: &Message, depth: usize) {
    let pad = "  ".repeat(depth);
    render_doc(out, msg.documentation.as_deref(), &pad);
    let _ = writeln!(out, "{}message {} {{", pad, msg.name);
    let inner = "  ".repeat(depth + 1);

    for field in &msg.fields {
        render_field(out, field, &inner);
    }
    for oneof in &msg.oneofs {
        render_doc(out, oneof.documentation.as_deref(), &inner);
        let _ = writeln!(out, "{}oneof {} {{", inner, oneof.name);
        let oneof_pad = "  ".repeat(depth + 2);
        for field in &oneof.fields {
            render_field(out, field, &oneof_pad);
        }
        let _ = writeln!(out, "{}}}", inner);
    }

    if !msg.reserved_tags.is_empty() {
        let mut tags = msg.reserved_tags.clone();
        tags.sort_unstable();
        let list: Vec<String> = tags.iter().map(u32::to_string).collect();
        let _ = writeln!(out, "{}reserved {};", inner, list.join(", "));
    }
    if !msg.reserved_names.is_empty() {
        let mut names = msg.reserved_names.clone();
        names.sort();
        let list: Vec<String> = names.iter().map(|n| format!("\"{}\"", n)).collect();
        let _ = writeln!(out, "{}reserved {};", inner, list.join(", "));
    }

    for nested in &msg.nested {
        render_decl(out, nested, depth + 1);
    }
    let _ = writeln!(out, "{}}}", pad);
}

fn render_field(out: &mut String, field: &Field, pad: &str) {
    render_doc(out, field.documentation.as_deref(), pad);
    let label = match field.label {
        Label::Single => "",
        Label::Repeated => "repeated ",
    };
    let _ = writeln!(out, "{}{}{} {} = {};", pad, label, field.type_name, field.name, field.tag);
}

fn render_enum(out: &mut String, en: &EnumType, depth: usize) {
    let pad = "  ".repeat(depth);
    render_doc(out, en.documentation.as_deref(), &pad);
    let _ = writeln!(out, "{}enum {} {{", pad, en.name);
    let inner = "  ".repeat(depth + 1);
    for constant in &en.constants {
        render_doc(out, constant.documentation.as_deref(), &inner);
        let _ = writeln!(out, "{}{} = {};", inner, constant.name, constant.number);
    }
    if !en.reserved_numbers.is_empty() {
        let mut numbers = en.reserved_numbers.clone();
        numbers.sort_unstable();
        let list: Vec<String> = numbers.iter().map(i32::to_string).collect();
        let _ = writeln!(out, "{}reserved {};", inner, list.join(", "));
    }
    if !en.reserved_names.is_empty() {
        let mut names = en.reserved_names.clone();
        names.sort();
        let list: Vec<String> = names.iter().map(|n| format!("\"{}\"", n)).collect();
        let _ = writeln!(out, "{}reserved {};", inner, list.join(", "));
    }
    let _ = writeln!(out, "{}}}", pad);
}

fn render_doc(out: &mut String, doc: Option<&str>, pad: &str) {
    if let Some(doc) = doc {
        for line in doc.lines() {
            let _ = writeln!(out, "{}// {}", pad, line);
        }
    }
}

/// Write every package to its assigned file under `out_dir`.
pub fn write_output(set: &PackageSet, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (name, pkg) in &set.packages {
        let filename = pkg
            .filename
            .as_deref()
            .map(str::to_string)
            .unwrap_or_else(|| proto_path_for_package(name));
        let path = out_dir.join(filename);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, render_package(pkg))?;
        info!(path = %path.display(), "wrote proto file");
        written.push(path);
    }
    Ok(written)
}
