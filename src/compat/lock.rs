//! Lock snapshot model
//!
//! The snapshot is protolock-shaped JSON: a list of definitions keyed by
//! proto path, each carrying messages with `(id, name)` field pairs, nested
//! messages, enums with `(integer, name)` constants, and the reservations
//! accumulated by earlier runs. Paths in the wild use either `/` or the
//! protolock `:/:` separator; lookup tolerates both.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConversionError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lock {
    #[serde(default)]
    pub definitions: Vec<LockDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockDefinition {
    pub protopath: String,
    #[serde(default)]
    pub def: LockDef,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockDef {
    #[serde(default)]
    pub messages: Vec<LockMessage>,
    #[serde(default)]
    pub enums: Vec<LockEnum>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockMessage {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<LockField>,
    #[serde(default)]
    pub messages: Vec<LockMessage>,
    #[serde(default)]
    pub enums: Vec<LockEnum>,
    #[serde(default)]
    pub reserved_ids: Vec<u32>,
    #[serde(default)]
    pub reserved_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockField {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockEnum {
    pub name: String,
    #[serde(default)]
    pub enum_fields: Vec<LockEnumField>,
    #[serde(default)]
    pub reserved_ids: Vec<i32>,
    #[serde(default)]
    pub reserved_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockEnumField {
    pub name: String,
    #[serde(default)]
    pub integer: i32,
}

impl Lock {
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_str(&data)
    }

    pub fn from_str(data: &str) -> Result<Self> {
        serde_json::from_str(data)
            .map_err(|e| ConversionError::InvalidLockFile(e.to_string()))
    }

    /// Definition for an output path, tolerating the `:/:` separator.
    pub fn definition_for(&self, proto_path: &str) -> Option<&LockDef> {
        let wanted = normalize_path(proto_path);
        self.definitions
            .iter()
            .find(|d| {
                let have = normalize_path(&d.protopath);
                have == wanted || have.ends_with(&format!("/{}", wanted)) || wanted.ends_with(&format!("/{}", have))
            })
            .map(|d| &d.def)
    }
}

fn normalize_path(path: &str) -> String {
    path.replace(":/:", "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "definitions": [
            {
                "protopath": "org:/:example:/:orders:/:orders.proto",
                "def": {
                    "messages": [
                        {
                            "name": "Order",
                            "fields": [
                                {"id": 1, "name": "id"},
                                {"id": 3, "name": "status"}
                            ],
                            "reserved_ids": [7],
                            "reserved_names": ["legacy_flag"]
                        }
                    ],
                    "enums": [
                        {
                            "name": "Status",
                            "enum_fields": [
                                {"name": "STATUS_UNSPECIFIED", "integer": 0},
                                {"name": "STATUS_OPEN", "integer": 1}
                            ]
                        }
                    ]
                }
            }
        ]
    }"#;

    #[test]
    fn parses_protolock_shape() {
        let lock = Lock::from_str(SAMPLE).unwrap();
        assert_eq!(lock.definitions.len(), 1);
        let def = &lock.definitions[0].def;
        assert_eq!(def.messages[0].fields[1].name, "status");
        assert_eq!(def.messages[0].reserved_ids, vec![7]);
        assert_eq!(def.enums[0].enum_fields[0].integer, 0);
    }

    #[test]
    fn lookup_tolerates_separator_styles() {
        let lock = Lock::from_str(SAMPLE).unwrap();
        assert!(lock.definition_for("org/example/orders/orders.proto").is_some());
        assert!(lock.definition_for("somewhere/else.proto").is_none());
    }

    #[test]
    fn garbage_is_an_invalid_lock_file() {
        let err = Lock::from_str("not json").unwrap_err();
        assert!(matches!(err, ConversionError::InvalidLockFile(_)));
    }
}
