//! Name mapping rules
//!
//! Holds the compiled form of the user-configured rename rules plus the
//! standard XSD primitive replacement table. Rules are regexes compiled once
//! here and applied in declaration order; the first rule whose pattern
//! matches the whole name wins, with capture-group substitution in the
//! replacement.

use regex::Regex;

use crate::config::RenameRule;
use crate::error::{ConversionError, Result};

/// Standard replacement table for XSD primitive types. Applied after the
/// user rules, so a user rule can override any entry.
const SCALAR_TABLE: &[(&str, &str)] = &[
    ("string", "string"),
    ("normalizedString", "string"),
    ("token", "string"),
    ("language", "string"),
    ("Name", "string"),
    ("NCName", "string"),
    ("NMTOKEN", "string"),
    ("NMTOKENS", "string"),
    ("ID", "string"),
    ("IDREF", "string"),
    ("IDREFS", "string"),
    ("ENTITY", "string"),
    ("ENTITIES", "string"),
    ("NOTATION", "string"),
    ("anyURI", "string"),
    ("QName", "string"),
    ("duration", "string"),
    ("anyType", "string"),
    ("anySimpleType", "string"),
    ("boolean", "bool"),
    ("float", "float"),
    ("double", "double"),
    ("decimal", "double"),
    ("byte", "int32"),
    ("short", "int32"),
    ("int", "int32"),
    ("integer", "int32"),
    ("nonPositiveInteger", "int32"),
    ("negativeInteger", "int32"),
    ("long", "int64"),
    ("unsignedByte", "uint32"),
    ("unsignedShort", "uint32"),
    ("unsignedInt", "uint32"),
    ("nonNegativeInteger", "uint32"),
    ("positiveInteger", "uint32"),
    ("unsignedLong", "uint64"),
    ("dateTime", "uint64"),
    ("time", "uint64"),
    ("date", "uint32"),
    ("gYear", "uint32"),
    ("gYearMonth", "uint32"),
    ("gMonth", "uint32"),
    ("gMonthDay", "uint32"),
    ("gDay", "uint32"),
    ("hexBinary", "bytes"),
    ("base64Binary", "bytes"),
];

/// Words that cannot be used as field names in the output and get an
/// `_field` suffix instead.
const RESERVED_WORDS: &[&str] = &[
    "syntax", "import", "package", "option", "message", "enum", "oneof", "map", "reserved",
    "service", "rpc", "returns", "repeated", "optional", "required", "group", "extend",
    "extensions", "true", "false",
];

pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// Escape a reserved field name. Idempotent for already-escaped names.
pub fn escape_reserved(name: &str) -> String {
    if is_reserved_word(name) {
        format!("{}_field", name)
    } else {
        name.to_string()
    }
}

/// Compiled rename and replacement rules.
#[derive(Debug, Default)]
pub struct NameMapper {
    type_rules: Vec<(Regex, String)>,
    field_rules: Vec<(Regex, String)>,
    scalar_overrides: Vec<(String, String)>,
    ignored_fields: Vec<FieldPath>,
}

impl NameMapper {
    pub fn new(
        type_rules: &[RenameRule],
        field_rules: &[RenameRule],
        scalar_overrides: &[RenameRule],
        ignored_fields: &[String],
    ) -> Result<Self> {
        Ok(Self {
            type_rules: compile_rules(type_rules)?,
            field_rules: compile_rules(field_rules)?,
            scalar_overrides: scalar_overrides
                .iter()
                .map(|r| (r.pattern.clone(), r.replacement.clone()))
                .collect(),
            ignored_fields: ignored_fields
                .iter()
                .map(|p| FieldPath::parse(p))
                .collect::<Result<Vec<_>>>()?,
        })
    }

    /// Apply the user type rules to a type name.
    pub fn translate_type(&self, name: &str) -> String {
        apply_rules(&self.type_rules, name)
    }

    /// Apply the user field rules to a field name.
    pub fn translate_field(&self, name: &str) -> String {
        apply_rules(&self.field_rules, name)
    }

    /// Proto scalar for an XSD primitive local name, if it is one.
    pub fn scalar_for(&self, xsd_local: &str) -> Option<&str> {
        if let Some((_, to)) = self.scalar_overrides.iter().find(|(from, _)| from == xsd_local) {
            return Some(to);
        }
        SCALAR_TABLE
            .iter()
            .find(|(from, _)| *from == xsd_local)
            .map(|(_, to)| *to)
    }

    /// True if the name is an XSD primitive the scalar table covers.
    pub fn is_basic_type(&self, xsd_local: &str) -> bool {
        self.scalar_for(xsd_local).is_some()
    }

    /// True if configuration excludes this field from the output.
    pub fn is_ignored(&self, package: &str, message: &str, field: &str) -> bool {
        self.ignored_fields
            .iter()
            .any(|p| p.matches(package, message, field))
    }
}

fn compile_rules(rules: &[RenameRule]) -> Result<Vec<(Regex, String)>> {
    rules
        .iter()
        .map(|r| {
            // Anchor so a rule matches the whole name, not a substring.
            let anchored = format!("^(?:{})$", r.pattern);
            let re = Regex::new(&anchored).map_err(|e| ConversionError::InvalidRule {
                pattern: r.pattern.clone(),
                reason: e.to_string(),
            })?;
            Ok((re, r.replacement.clone()))
        })
        .collect()
}

fn apply_rules(rules: &[(Regex, String)], name: &str) -> String {
    for (re, replacement) in rules {
        if re.is_match(name) {
            return re.replace(name, replacement.as_str()).into_owned();
        }
    }
    name.to_string()
}

/// Matcher for `package/Message/field` exclusion entries. Any segment may be
/// `*`.
#[derive(Debug, Clone)]
pub struct FieldPath {
    package: String,
    message: String,
    field: String,
}

impl FieldPath {
    pub fn parse(path: &str) -> Result<Self> {
        let parts: Vec<&str> = path.split('/').collect();
        match parts.as_slice() {
            [package, message, field] => Ok(Self {
                package: package.to_string(),
                message: message.to_string(),
                field: field.to_string(),
            }),
            _ => Err(ConversionError::InvalidConfig(format!(
                "field path '{}' must have the form package/Message/field",
                path
            ))),
        }
    }

    pub fn matches(&self, package: &str, message: &str, field: &str) -> bool {
        segment_matches(&self.package, package)
            && segment_matches(&self.message, message)
            && segment_matches(&self.field, field)
    }
}

fn segment_matches(pattern: &str, value: &str) -> bool {
    pattern == "*" || pattern == value
}
