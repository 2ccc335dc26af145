//! Entity history events
//!
//! Emitted as tracing events under the `haul::history` target so they can be
//! filtered or routed separately from operational logs.

use crate::core::types::{EntityKind, ObjectId};
use tracing::info;

/// Target used for all history events
pub const HISTORY_TARGET: &str = "haul::history";

pub(crate) fn log_create(kind: EntityKind, id: ObjectId, name: &str) {
    info!(target: HISTORY_TARGET, %kind, %id, "'{}' created", name);
}

pub(crate) fn log_delete(kind: EntityKind, id: ObjectId) {
    info!(target: HISTORY_TARGET, %kind, %id, "deleted");
}
