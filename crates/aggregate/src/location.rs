use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identity of a location within one filter context.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocationKey {
    pub city: String,
    pub state: String,
}

impl LocationKey {
    pub fn new(city: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            state: state.into(),
        }
    }
}

/// The best observed count for one role at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCount {
    pub query: String,
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One location's counts merged across every selected role.
///
/// Invariant: `total == per_role.values().map(|r| r.total).sum()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeLocation {
    pub city: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    /// Largest radius observed for this location.
    pub radius_miles: f64,
    pub total: u64,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seniority_level: Option<String>,
    #[serde(default)]
    pub run_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Keyed by role label.
    pub per_role: BTreeMap<String, RoleCount>,
}

impl CompositeLocation {
    pub fn key(&self) -> LocationKey {
        LocationKey::new(self.city.clone(), self.state.clone())
    }

    /// Coordinates and radius: what the dedup service needs to recount
    /// this location.
    pub fn identity(&self) -> MemberIdentity {
        MemberIdentity {
            city: self.city.clone(),
            state: self.state.clone(),
            lat: self.lat,
            lon: self.lon,
            radius_miles: self.radius_miles,
        }
    }

    pub(crate) fn recompute_total(&mut self) {
        self.total = self.per_role.values().map(|r| r.total).sum();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberIdentity {
    pub city: String,
    pub state: String,
    pub lat: f64,
    pub lon: f64,
    pub radius_miles: f64,
}
