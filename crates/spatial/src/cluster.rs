use std::collections::BTreeMap;

use aggregate::location::{CompositeLocation, RoleCount};
use serde::Serialize;

/// Stable handle for a cluster within one index: the zoom level it was
/// produced at and its position in that level.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ClusterId {
    pub zoom: u8,
    pub index: u32,
}

/// A viewport/zoom-dependent group of one or more locations.
///
/// Invariants: `max_total == max(members.total)`,
/// `sum_total == sum(members.total)`; `cities`/`states` are de-duplicated
/// in first-seen member order; representative fields come from the first
/// member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub id: ClusterId,
    pub lat: f64,
    pub lon: f64,
    pub members: Vec<CompositeLocation>,
    pub max_total: u64,
    pub sum_total: u64,
    pub radius_miles: f64,
    pub cities: Vec<String>,
    pub states: Vec<String>,
    pub query: Option<String>,
    pub seniority_level: Option<String>,
    pub run_at: Option<String>,
}

impl Cluster {
    pub fn from_members(id: ClusterId, lat: f64, lon: f64, members: Vec<CompositeLocation>) -> Self {
        let max_total = members.iter().map(|m| m.total).max().unwrap_or(0);
        let sum_total = members.iter().map(|m| m.total).sum();
        let radius_miles = members.iter().map(|m| m.radius_miles).fold(0.0, f64::max);

        let mut cities: Vec<String> = Vec::new();
        let mut states: Vec<String> = Vec::new();
        for m in &members {
            if !cities.contains(&m.city) {
                cities.push(m.city.clone());
            }
            if !states.contains(&m.state) {
                states.push(m.state.clone());
            }
        }

        let first = members.first();
        Self {
            id,
            lat,
            lon,
            max_total,
            sum_total,
            radius_miles,
            cities,
            states,
            query: first.and_then(|m| m.query.clone()),
            seniority_level: first.and_then(|m| m.seniority_level.clone()),
            run_at: first.and_then(|m| m.run_at.clone()),
            members,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether the reported totals are a range (`max_total..=sum_total`)
    /// rather than a single number.
    pub fn has_range(&self) -> bool {
        self.members.len() > 1 && self.sum_total != self.max_total
    }

    /// Per-role counts summed over members, keyed by role label.
    pub fn roles(&self) -> BTreeMap<String, RoleCount> {
        let mut roles: BTreeMap<String, RoleCount> = BTreeMap::new();
        for m in &self.members {
            for (label, rc) in &m.per_role {
                roles
                    .entry(label.clone())
                    .and_modify(|acc| acc.total += rc.total)
                    .or_insert_with(|| RoleCount {
                        query: rc.query.clone(),
                        total: rc.total,
                        url: None,
                    });
            }
        }
        roles
    }

    /// Distinct role queries across members, in role-label order.
    pub fn role_queries(&self) -> Vec<String> {
        let mut queries: Vec<String> = Vec::new();
        for rc in self.roles().into_values() {
            if !queries.contains(&rc.query) {
                queries.push(rc.query);
            }
        }
        queries
    }
}
