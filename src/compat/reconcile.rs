//! Tag and name reconciliation against a lock snapshot

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{ConversionError, Result};
use crate::model::{EnumType, Message, PackageSet, TypeDecl};
use crate::passes::proto_path_for_package;

use super::lock::{Lock, LockEnum, LockMessage};

/// Upper bound on the conflict-resolution loop per type. The loop settles
/// in two or three rounds on real schemas; hitting the bound means the
/// constraints contradict each other.
pub const MAX_RECONCILE_ITERATIONS: usize = 64;

/// Outcome of a reconciliation run.
#[derive(Debug, Default)]
pub struct CompatReport {
    /// True when members present in the snapshot are gone from the new
    /// model. Old readers may still depend on them.
    pub compatibility_risk: bool,

    /// Removed members, as `package.Type.member` paths.
    pub removed: Vec<String>,
}

/// Reconcile the model against the snapshot.
///
/// Fields and constants that survive keep their snapshot tags. Members that
/// vanished turn into reservations. New members are moved off any tag the
/// snapshot still lays claim to. Fatal outcomes are a reservation coming
/// back to life and a conflict set that does not settle.
pub fn reconcile(set: &mut PackageSet, lock: &Lock) -> Result<CompatReport> {
    let mut report = CompatReport::default();
    for (pkg_name, pkg) in set.packages.iter_mut() {
        let path = proto_path_for_package(pkg_name);
        let Some(def) = lock.definition_for(&path) else {
            debug!(package = %pkg_name, "no snapshot definition, package is new");
            continue;
        };
        let def = def.clone();
        for decl in pkg.types.iter_mut() {
            reconcile_decl(pkg_name, decl, &def.messages, &def.enums, &mut report)?;
        }
    }
    Ok(report)
}

fn reconcile_decl(
    scope: &str,
    decl: &mut TypeDecl,
    lock_messages: &[LockMessage],
    lock_enums: &[LockEnum],
    report: &mut CompatReport,
) -> Result<()> {
    match decl {
        TypeDecl::Message(msg) => {
            let Some(lm) = lock_messages.iter().find(|m| m.name == msg.name) else {
                return Ok(());
            };
            reconcile_message(scope, msg, lm, report)?;
            let child_scope = format!("{}.{}", scope, msg.name);
            for nested in msg.nested.iter_mut() {
                reconcile_decl(&child_scope, nested, &lm.messages, &lm.enums, report)?;
            }
            Ok(())
        }
        TypeDecl::Enum(en) => {
            if let Some(le) = lock_enums.iter().find(|e| e.name == en.name) {
                reconcile_enum(scope, en, le, report)?;
            }
            Ok(())
        }
    }
}

fn reconcile_message(
    scope: &str,
    msg: &mut Message,
    lm: &LockMessage,
    report: &mut CompatReport,
) -> Result<()> {
    let type_name = format!("{}.{}", scope, msg.name);
    let lock_by_name: HashMap<&str, u32> =
        lm.fields.iter().map(|f| (f.name.as_str(), f.id)).collect();
    let lock_ids: HashMap<u32, &str> =
        lm.fields.iter().map(|f| (f.id, f.name.as_str())).collect();

    // Reservations never die, and never come back to life.
    for name in &lm.reserved_names {
        if msg.all_fields().any(|f| &f.name == name) {
            return Err(ConversionError::ReappearedReservation {
                type_name,
                kind: "field name".to_string(),
                member: name.clone(),
            });
        }
        msg.reserve_name(name);
    }
    for id in &lm.reserved_ids {
        msg.reserve_tag(*id);
    }

    let reserved = msg.reserved_tags.clone();
    let mut next_free = 1 + msg
        .all_fields()
        .map(|f| f.tag)
        .chain(lock_ids.keys().copied())
        .chain(reserved.iter().copied())
        .max()
        .unwrap_or(0);

    let mut iterations = 0;
    loop {
        iterations += 1;
        if iterations > MAX_RECONCILE_ITERATIONS {
            return Err(ConversionError::ReconcileLoop {
                type_name,
                iterations,
            });
        }
        let mut changed = false;

        // Surviving fields take their snapshot tags back.
        for field in msg.all_fields_mut() {
            if let Some(&id) = lock_by_name.get(field.name.as_str()) {
                if field.tag != id {
                    debug!(field = %field.name, from = field.tag, to = id, "restoring snapshot tag");
                    field.tag = id;
                    changed = true;
                }
            }
        }

        // Everything else moves off reserved tags, off tags the snapshot
        // assigns to a different name, and off duplicates.
        let mut seen: Vec<u32> = Vec::new();
        for field in msg.all_fields_mut() {
            let holds_own_lock_tag = lock_by_name.get(field.name.as_str()) == Some(&field.tag);
            let squatting = !holds_own_lock_tag && lock_ids.contains_key(&field.tag);
            let on_reserved = reserved.contains(&field.tag);
            let duplicate = !holds_own_lock_tag && seen.contains(&field.tag);
            if on_reserved || squatting || duplicate {
                debug!(field = %field.name, from = field.tag, to = next_free, "displacing field");
                field.tag = next_free;
                next_free += 1;
                changed = true;
            }
            seen.push(field.tag);
        }

        if !changed {
            break;
        }
    }

    // Vanished fields become reservations.
    for lf in &lm.fields {
        if !msg.all_fields().any(|f| f.name == lf.name) {
            warn!(message = %type_name, field = %lf.name, tag = lf.id, "field removed since snapshot");
            msg.reserve_name(&lf.name);
            msg.reserve_tag(lf.id);
            report.removed.push(format!("{}.{}", type_name, lf.name));
            report.compatibility_risk = true;
        }
    }

    let highest = msg
        .all_fields()
        .map(|f| f.tag)
        .chain(msg.reserved_tags.iter().copied())
        .max()
        .unwrap_or(0);
    msg.bump_tag_past(highest);
    Ok(())
}

fn reconcile_enum(
    scope: &str,
    en: &mut EnumType,
    le: &LockEnum,
    report: &mut CompatReport,
) -> Result<()> {
    let type_name = format!("{}.{}", scope, en.name);
    let lock_by_name: HashMap<&str, i32> = le
        .enum_fields
        .iter()
        .map(|f| (f.name.as_str(), f.integer))
        .collect();
    let lock_numbers: HashMap<i32, &str> = le
        .enum_fields
        .iter()
        .map(|f| (f.integer, f.name.as_str()))
        .collect();

    for name in &le.reserved_names {
        if en.constants.iter().any(|c| &c.name == name) {
            return Err(ConversionError::ReappearedReservation {
                type_name,
                kind: "enum constant".to_string(),
                member: name.clone(),
            });
        }
        en.reserve_name(name);
    }
    for number in &le.reserved_ids {
        en.reserve_number(*number);
    }

    let reserved = en.reserved_numbers.clone();
    let mut next_free = 1 + en
        .constants
        .iter()
        .map(|c| c.number)
        .chain(lock_numbers.keys().copied())
        .chain(reserved.iter().copied())
        .max()
        .unwrap_or(0);

    let mut iterations = 0;
    loop {
        iterations += 1;
        if iterations > MAX_RECONCILE_ITERATIONS {
            return Err(ConversionError::ReconcileLoop {
                type_name,
                iterations,
            });
        }
        let mut changed = false;

        for constant in en.constants.iter_mut() {
            if let Some(&number) = lock_by_name.get(constant.name.as_str()) {
                if constant.number != number {
                    constant.number = number;
                    changed = true;
                }
            }
        }

        let mut seen: Vec<i32> = Vec::new();
        for constant in en.constants.iter_mut() {
            let holds_own = lock_by_name.get(constant.name.as_str()) == Some(&constant.number);
            let squatting = !holds_own && lock_numbers.contains_key(&constant.number);
            let on_reserved = reserved.contains(&constant.number);
            let duplicate = !holds_own && seen.contains(&constant.number);
            if on_reserved || squatting || duplicate {
                constant.number = next_free;
                next_free += 1;
                changed = true;
            }
            seen.push(constant.number);
        }

        if !changed {
            break;
        }
    }

    for lf in &le.enum_fields {
        if !en.constants.iter().any(|c| c.name == lf.name) {
            warn!(enum_type = %type_name, constant = %lf.name, "constant removed since snapshot");
            en.reserve_name(&lf.name);
            en.reserve_number(lf.integer);
            report.removed.push(format!("{}.{}", type_name, lf.name));
            report.compatibility_risk = true;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EnumConstant, Field};

    const LOCK: &str = r#"{
        "definitions": [{
            "protopath": "org:/:example:/:orders:/:orders.proto",
            "def": {
                "messages": [{
                    "name": "Order",
                    "fields": [
                        {"id": 1, "name": "id"},
                        {"id": 2, "name": "number"},
                        {"id": 3, "name": "status"}
                    ]
                }]
            }
        }]
    }"#;

    fn order_set(field_names: &[(&str, u32)]) -> PackageSet {
        let mut set = PackageSet::new();
        let pkg = set.entry("org.example.orders");
        let mut order = Message::new("Order");
        for (name, tag) in field_names {
            order.fields.push(Field::new(name, "string", *tag));
            order.bump_tag_past(*tag);
        }
        pkg.types.push(TypeDecl::Message(order));
        set
    }

    #[test]
    fn renamed_field_is_displaced_and_old_member_reserved() {
        let lock = Lock::from_str(LOCK).unwrap();
        // `status` was renamed to `state`; it lands on tag 3 from the builder.
        let mut set = order_set(&[("id", 1), ("number", 2), ("state", 3)]);

        let report = reconcile(&mut set, &lock).unwrap();

        let order = set.get("org.example.orders").unwrap().message("Order").unwrap();
        let state = order.fields.iter().find(|f| f.name == "state").unwrap();
        assert_eq!(state.tag, 4);
        assert!(order.reserved_names.contains(&"status".to_string()));
        assert!(order.reserved_tags.contains(&3));
        assert!(report.compatibility_risk);
        assert_eq!(report.removed, vec!["org.example.orders.Order.status"]);
    }

    #[test]
    fn reordered_fields_get_their_snapshot_tags_back() {
        let lock = Lock::from_str(LOCK).unwrap();
        // Source reordering assigned fresh tags in a different order.
        let mut set = order_set(&[("status", 1), ("id", 2), ("number", 3)]);

        let report = reconcile(&mut set, &lock).unwrap();

        let order = set.get("org.example.orders").unwrap().message("Order").unwrap();
        let tags: HashMap<&str, u32> =
            order.fields.iter().map(|f| (f.name.as_str(), f.tag)).collect();
        assert_eq!(tags["id"], 1);
        assert_eq!(tags["number"], 2);
        assert_eq!(tags["status"], 3);
        assert!(!report.compatibility_risk);
    }

    #[test]
    fn reconciliation_is_idempotent() {
        let lock = Lock::from_str(LOCK).unwrap();
        let mut set = order_set(&[("id", 1), ("number", 2), ("state", 3)]);
        reconcile(&mut set, &lock).unwrap();
        let snapshot = serde_json::to_string(&set).unwrap();

        reconcile(&mut set, &lock).unwrap();
        assert_eq!(serde_json::to_string(&set).unwrap(), snapshot);
    }

    #[test]
    fn reappeared_reserved_name_is_fatal() {
        let lock = Lock::from_str(
            r#"{"definitions": [{
                "protopath": "org/example/orders/orders.proto",
                "def": {"messages": [{"name": "Order", "fields": [], "reserved_names": ["ghost"]}]}
            }]}"#,
        )
        .unwrap();
        let mut set = order_set(&[("ghost", 1)]);

        let err = reconcile(&mut set, &lock).unwrap_err();
        assert!(matches!(err, ConversionError::ReappearedReservation { .. }));
    }

    #[test]
    fn new_field_moves_off_reserved_tag() {
        let lock = Lock::from_str(
            r#"{"definitions": [{
                "protopath": "org/example/orders/orders.proto",
                "def": {"messages": [{"name": "Order", "fields": [{"id": 1, "name": "id"}], "reserved_ids": [2]}]}
            }]}"#,
        )
        .unwrap();
        let mut set = order_set(&[("id", 1), ("fresh", 2)]);

        reconcile(&mut set, &lock).unwrap();
        let order = set.get("org.example.orders").unwrap().message("Order").unwrap();
        let fresh = order.fields.iter().find(|f| f.name == "fresh").unwrap();
        assert_eq!(fresh.tag, 3);
        assert!(order.reserved_tags.contains(&2));
    }

    #[test]
    fn enum_constants_follow_the_same_rules() {
        let lock = Lock::from_str(
            r#"{"definitions": [{
                "protopath": "org/example/orders/orders.proto",
                "def": {"enums": [{"name": "Status", "enum_fields": [
                    {"name": "STATUS_UNSPECIFIED", "integer": 0},
                    {"name": "STATUS_OPEN", "integer": 1},
                    {"name": "STATUS_CLOSED", "integer": 2}
                ]}]}
            }]}"#,
        )
        .unwrap();

        let mut set = PackageSet::new();
        let pkg = set.entry("org.example.orders");
        let mut status = EnumType::new("Status");
        for (name, number) in [
            ("STATUS_UNSPECIFIED", 0),
            ("STATUS_OPEN", 1),
            // CLOSED is gone, DONE took its number.
            ("STATUS_DONE", 2),
        ] {
            status.constants.push(EnumConstant {
                name: name.to_string(),
                number,
                documentation: None,
            });
        }
        pkg.types.push(TypeDecl::Enum(status));

        let report = reconcile(&mut set, &lock).unwrap();
        let status = set.get("org.example.orders").unwrap().enum_type("Status").unwrap();
        let done = status.constants.iter().find(|c| c.name == "STATUS_DONE").unwrap();
        assert_eq!(done.number, 3);
        assert!(status.reserved_names.contains(&"STATUS_CLOSED".to_string()));
        assert!(status.reserved_numbers.contains(&2));
        assert!(report.compatibility_risk);
    }
}
