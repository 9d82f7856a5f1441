//! Backward-compatibility reconciliation
//!
//! Given a lock snapshot of the previously published output, the reconciler
//! adjusts the freshly built model so that wire compatibility holds: fields
//! keep their old tags, vacated names and tags become reservations, and a
//! reservation can never come back to life.

mod lock;
mod reconcile;

pub use lock::{Lock, LockDef, LockEnum, LockEnumField, LockField, LockMessage};
pub use reconcile::{reconcile, CompatReport, MAX_RECONCILE_ITERATIONS};
