//! XML Schema to Protocol Buffers conversion
//!
//! Takes a reference-resolved XML Schema object graph and produces proto3
//! schema files, one per namespace-derived package.
//!
//! ## Architecture
//!
//! ```text
//! SchemaSet (xsd)
//!     |  builder: packages, messages, enums, tags
//!     v
//! PackageSet (model)
//!     |  passes: naming, promotion, imports, enum finalization
//!     v
//! PackageSet, finalized names
//!     |  compat: reconcile tags and reservations against the lock snapshot
//!     v
//! render: .proto text, one file per package
//! ```

pub mod builder;
pub mod compat;
pub mod config;
pub mod error;
pub mod mapper;
pub mod model;
pub mod namespace;
pub mod passes;
pub mod render;
pub mod xsd;

pub use builder::Builder;
pub use compat::{reconcile, CompatReport, Lock};
pub use config::ConverterConfig;
pub use error::{ConversionError, Result};
pub use mapper::NameMapper;
pub use model::PackageSet;
pub use passes::{run_pipeline, PassContext, PassReport};
pub use xsd::SchemaSet;

/// Everything a conversion run produced.
#[derive(Debug)]
pub struct Conversion {
    pub packages: PackageSet,
    pub report: PassReport,
    pub compat: Option<CompatReport>,
}

/// Run the whole conversion: build, transform, reconcile, lay out files.
///
/// Reconciliation runs only when a lock snapshot is given. The result still
/// has to be written out by the caller, see [`render::write_output`].
pub fn convert(
    set: &SchemaSet,
    config: &ConverterConfig,
    lock: Option<&Lock>,
) -> Result<Conversion> {
    let mapper = NameMapper::new(
        &config.naming.type_rules,
        &config.naming.field_rules,
        &config.naming.scalar_rules,
        &config.fields.ignore,
    )?;
    let mut packages = Builder::new(set, config, &mapper).build()?;

    let mut ctx = PassContext::new(config, &mapper);
    run_pipeline(&mut packages, &mut ctx)?;

    let compat = match lock {
        Some(lock) => Some(reconcile(&mut packages, lock)?),
        None => None,
    };

    render::apply_file_layout(&mut packages, config)?;
    Ok(Conversion {
        packages,
        report: ctx.report,
        compat,
    })
}
