use std::collections::BTreeMap;

use aggregate::location::RoleCount;
use serde::Serialize;

/// Lifecycle of one fingerprint's refinement:
/// absent → `Pending` → `Resolved` | `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RefinementStatus {
    /// The reported total is already exact; nothing was requested.
    Unneeded,
    Pending,
    Resolved(Resolution),
    Failed { message: String },
    /// The filter context changed while the request was in flight; the
    /// response was discarded.
    Superseded,
}

impl RefinementStatus {
    pub fn exact_total(&self) -> Option<u64> {
        match self {
            RefinementStatus::Resolved(r) => Some(r.exact_total),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RefinementStatus::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// An exact deduplicated total for a cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub exact_total: u64,
    /// Per-role counts with the service's breakdown applied, keyed by role
    /// label. Present only when the service returned a breakdown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_role: Option<BTreeMap<String, RoleCount>>,
}
