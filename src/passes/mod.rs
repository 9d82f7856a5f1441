//! Transformation pipeline
//!
//! After the builder has produced the raw model, these passes run over the
//! [`PackageSet`] in a fixed order, each one a small, idempotent-safe
//! rewrite. The order is a contract: naming passes must run before
//! reference qualification, imports before cycle detection, snake_casing
//! before keyword escaping, and enum finalization last. [`PIPELINE`] is that order; tests assert it.

mod enums;
mod fields;
mod generated;
mod imports;
mod naming;

use tracing::debug;

use crate::config::ConverterConfig;
use crate::error::Result;
use crate::mapper::NameMapper;
use crate::model::PackageSet;

pub use enums::finalize_enums;
pub use fields::{
    escape_reserved_keywords, remove_excluded_fields, resolve_case_collisions,
    underscore_field_names,
};
pub use generated::{promote_local_types, replace_generated_suffix};
pub use imports::{
    compute_imports, detect_import_cycles, proto_path_for_package, qualify_type_references,
};
pub use naming::{translate_names, uppercase_type_names};

/// Shared read context for a pipeline run.
pub struct PassContext<'a> {
    pub config: &'a ConverterConfig,
    pub mapper: &'a NameMapper,
    pub report: PassReport,
}

impl<'a> PassContext<'a> {
    pub fn new(config: &'a ConverterConfig, mapper: &'a NameMapper) -> Self {
        Self {
            config,
            mapper,
            report: PassReport::default(),
        }
    }
}

/// What a pipeline run wants the caller to know.
#[derive(Debug, Default)]
pub struct PassReport {
    /// Human-readable notes, one per noteworthy rewrite.
    pub notes: Vec<String>,

    /// Residual package import cycles. Non-empty output is degraded but
    /// still written.
    pub import_cycles: Vec<Vec<String>>,

    /// Fields dropped by configuration.
    pub removed_fields: usize,
}

/// One pipeline pass.
pub type PassFn = fn(&mut PackageSet, &mut PassContext) -> Result<()>;

/// The pipeline, in execution order.
pub const PIPELINE: &[(&str, PassFn)] = &[
    ("replace_generated_suffix", replace_generated_suffix),
    ("promote_local_types", promote_local_types),
    ("remove_excluded_fields", remove_excluded_fields),
    ("uppercase_type_names", uppercase_type_names),
    ("resolve_case_collisions", resolve_case_collisions),
    ("translate_names", translate_names),
    ("compute_imports", compute_imports),
    ("detect_import_cycles", detect_import_cycles),
    ("qualify_type_references", qualify_type_references),
    ("underscore_field_names", underscore_field_names),
    ("escape_reserved_keywords", escape_reserved_keywords),
    ("finalize_enums", finalize_enums),
];

/// Run every pass in order.
pub fn run_pipeline(set: &mut PackageSet, ctx: &mut PassContext) -> Result<()> {
    for (name, pass) in PIPELINE {
        debug!(pass = name, "running pass");
        pass(set, ctx)?;
    }
    Ok(())
}

/// Rewrite field type references after type renames. Keys are
/// `(package, old name)`. Scalar references carry no package and are left
/// alone.
pub(crate) fn rewrite_type_references(
    set: &mut PackageSet,
    renames: &std::collections::HashMap<(String, String), String>,
) {
    set.for_each_type_mut(|_, decl| {
        if let crate::model::TypeDecl::Message(msg) = decl {
            for field in msg.all_fields_mut() {
                if let Some(pkg) = &field.type_package {
                    let key = (pkg.clone(), field.type_name.clone());
                    if let Some(new_name) = renames.get(&key) {
                        field.type_name = new_name.clone();
                    }
                }
            }
        }
    });
}
