//! XSD to proto conversion CLI
//!
//! Reads a reference-resolved schema graph (JSON), runs the conversion and
//! writes one .proto file per package.
//!
//! Usage:
//!   xsd2proto --input schema-graph.json --out proto/
//!   xsd2proto --input schema-graph.json --lock proto.lock --fail-if-removed
//!   xsd2proto --help

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use xsd2proto::{convert, ConversionError, ConverterConfig, Lock, SchemaSet};

#[derive(Parser)]
#[command(name = "xsd2proto")]
#[command(about = "Convert XML Schema definitions to Protocol Buffers schemas")]
struct Cli {
    /// Reference-resolved schema graph (JSON)
    #[arg(short, long)]
    input: PathBuf,

    /// Config file (default: xsd2proto.toml lookup chain)
    #[arg(short, long)]
    config: Option<String>,

    /// Output directory (overrides config)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Lock snapshot to reconcile against (overrides config)
    #[arg(short, long)]
    lock: Option<PathBuf>,

    /// Fail when fields or constants present in the snapshot are gone
    #[arg(long)]
    fail_if_removed: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ConverterConfig::load_from(cli.config.as_deref())
        .context("loading configuration")?;
    if let Some(out) = cli.out {
        config.output.directory = out;
    }
    if let Some(lock) = cli.lock {
        config.compat.lock_file = Some(lock);
    }
    if cli.fail_if_removed {
        config.compat.fail_if_removed = true;
    }

    println!("📂 Loading schema graph: {:?}", cli.input);
    let data = fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {:?}", cli.input))?;
    let set: SchemaSet = serde_json::from_str(&data).context("parsing schema graph")?;
    println!("   {} schema document(s)\n", set.schemas.len());

    let lock = match &config.compat.lock_file {
        Some(path) => {
            println!("🔒 Loading lock snapshot: {:?}", path);
            Some(Lock::from_path(path).context("loading lock snapshot")?)
        }
        None => None,
    };

    let conversion = convert(&set, &config, lock.as_ref())?;

    for cycle in &conversion.report.import_cycles {
        eprintln!("⚠️  Import cycle between packages: {}", cycle.join(" -> "));
    }
    if conversion.report.removed_fields > 0 {
        println!(
            "   {} field(s) removed by configuration",
            conversion.report.removed_fields
        );
    }

    let out_dir = config.output_directory();
    let written = xsd2proto::render::write_output(&conversion.packages, &out_dir)?;
    println!("✅ Wrote {} proto file(s) to {:?}", written.len(), out_dir);

    if let Some(compat) = &conversion.compat {
        for removed in &compat.removed {
            eprintln!("⚠️  Removed since snapshot: {}", removed);
        }
        if compat.compatibility_risk {
            if config.compat.fail_if_removed {
                return Err(ConversionError::IncompatibleChange(format!(
                    "{} member(s) removed since the lock snapshot",
                    compat.removed.len()
                ))
                .into());
            }
            eprintln!("⚠️  Backward-compatibility risk - old readers may depend on removed members");
        } else {
            println!("✅ Backward compatible with the lock snapshot");
        }
    }
    Ok(())
}
