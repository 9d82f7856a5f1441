//! Configuration for the converter
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (xsd2proto.toml)
//! - Environment variables (XSD2PROTO_*)
//!
//! ## Example config file (xsd2proto.toml):
//! ```toml
//! [packages]
//! default_package = "org.example.unqualified"
//!
//! [[naming.type_rules]]
//! pattern = "(.*)Structure"
//! replacement = "$1"
//!
//! [fields]
//! ignore = ["*/Person/internal_id"]
//!
//! [inheritance]
//! mode = "composition"
//!
//! [output]
//! directory = "proto"
//!
//! [[output.options]]
//! name = "java_multiple_files"
//! value = true
//!
//! [compat]
//! lock_file = "proto.lock"
//! fail_if_removed = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::model::OptionValue;

/// Main configuration for a conversion run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Package derivation settings
    #[serde(default)]
    pub packages: PackageConfig,

    /// Rename and replacement rules
    #[serde(default)]
    pub naming: NamingConfig,

    /// Field exclusion settings
    #[serde(default)]
    pub fields: FieldConfig,

    /// Inheritance handling
    #[serde(default)]
    pub inheritance: InheritanceConfig,

    /// Documentation handling
    #[serde(default)]
    pub docs: DocConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Backward-compatibility settings
    #[serde(default)]
    pub compat: CompatConfig,
}

/// Package derivation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Put every type into this package, ignoring namespaces
    #[serde(default)]
    pub force_package: Option<String>,

    /// Package for schemas without a target namespace
    #[serde(default)]
    pub default_package: Option<String>,
}

/// One regex rename rule. Patterns match the whole name; replacements may
/// use capture groups (`$1`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameRule {
    pub pattern: String,
    pub replacement: String,
}

/// Naming rules, applied in declaration order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Rules applied to message and enum names
    #[serde(default)]
    pub type_rules: Vec<RenameRule>,

    /// Rules applied to field names
    #[serde(default)]
    pub field_rules: Vec<RenameRule>,

    /// Overrides for the standard primitive replacement table
    /// (e.g. decimal -> float). Exact names, not regexes.
    #[serde(default)]
    pub scalar_rules: Vec<RenameRule>,
}

/// Field exclusion configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Fields to drop, as `package/Message/field` paths. `*` matches any
    /// segment.
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// How base types are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InheritanceMode {
    /// Copy base-type fields into the derived message
    #[default]
    Flatten,
    /// Emit one `_BaseName` field per ancestor instead
    Composition,
}

/// Inheritance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InheritanceConfig {
    #[serde(default)]
    pub mode: InheritanceMode,

    /// Skip types that add nothing over their complex base
    #[serde(default = "default_true")]
    pub skip_empty_types: bool,
}

/// Documentation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocConfig {
    /// Append the source location of each component to its comment
    #[serde(default)]
    pub include_source_location: bool,
}

/// A file-level option to attach to every output file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomOption {
    pub name: String,
    pub value: OptionValue,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory output files are written under
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,

    /// Write everything to this one file instead of per-package files.
    /// Fails when more than one package is produced.
    #[serde(default)]
    pub single_file: Option<String>,

    /// Options attached to every output file
    #[serde(default)]
    pub options: Vec<CustomOption>,

    /// Extra import paths, added only to files that reference the
    /// imported package
    #[serde(default)]
    pub imports: Vec<String>,
}

/// Backward-compatibility configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompatConfig {
    /// Lock snapshot to reconcile against. Reconciliation runs only when
    /// this is set.
    #[serde(default)]
    pub lock_file: Option<PathBuf>,

    /// Treat removed fields and constants as an error instead of a warning
    #[serde(default)]
    pub fail_if_removed: bool,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("proto")
}

impl Default for InheritanceConfig {
    fn default() -> Self {
        Self {
            mode: InheritanceMode::Flatten,
            skip_empty_types: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            single_file: None,
            options: Vec::new(),
            imports: Vec::new(),
        }
    }
}

impl ConverterConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["xsd2proto.toml", ".xsd2proto.toml", "config/xsd2proto.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("org", "xsd2proto", "xsd2proto") {
            let xdg_config = config_dir.config_dir().join("xsd2proto.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Environment variables (XSD2PROTO_*)
        builder = builder.add_source(
            Environment::with_prefix("XSD2PROTO")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Output directory, resolved against the current directory
    pub fn output_directory(&self) -> PathBuf {
        if self.output.directory.is_absolute() {
            self.output.directory.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.output.directory)
        }
    }
}
