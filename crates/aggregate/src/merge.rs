use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::location::{CompositeLocation, LocationKey, RoleCount};
use crate::observation::Observation;

/// One role's query result.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RoleResult {
    pub label: String,
    pub query: String,
    #[serde(alias = "points")]
    pub observations: Vec<Observation>,
}

impl RoleResult {
    pub fn new(
        label: impl Into<String>,
        query: impl Into<String>,
        observations: Vec<Observation>,
    ) -> Self {
        Self {
            label: label.into(),
            query: query.into(),
            observations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergeReport {
    /// One entry per `(city, state)`, in first-seen order.
    pub locations: Vec<CompositeLocation>,
    /// Observations dropped for missing city/state/coordinates.
    pub dropped: usize,
}

/// Incremental per-location merge across role results.
///
/// Per role label the highest total wins; an equal total keeps the value
/// seen first. `total` is re-derived after every update, so the result does
/// not depend on the order roles are added in, and adding the same role
/// result twice changes nothing.
#[derive(Debug, Default)]
pub struct RoleMerger {
    slots: HashMap<LocationKey, usize>,
    locations: Vec<CompositeLocation>,
    dropped: usize,
}

impl RoleMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn add_role(&mut self, label: &str, query: &str, observations: &[Observation]) {
        for obs in observations {
            self.add_observation(label, query, obs);
        }
    }

    pub fn add_observation(&mut self, label: &str, query: &str, obs: &Observation) {
        let Some(place) = obs.place() else {
            debug!(
                role = label,
                city = ?obs.city,
                state = ?obs.state,
                "dropping observation without a usable location"
            );
            self.dropped += 1;
            return;
        };

        let role_count = RoleCount {
            query: query.to_string(),
            total: obs.total,
            url: obs.source_url.clone(),
        };

        let key = LocationKey::new(place.city, place.state);
        if let Some(&slot) = self.slots.get(&key) {
            let existing = &mut self.locations[slot];
            let replace = existing
                .per_role
                .get(label)
                .is_none_or(|prev| role_count.total > prev.total);
            if replace {
                existing.per_role.insert(label.to_string(), role_count);
            }
            existing.radius_miles = existing.radius_miles.max(obs.radius());
            existing.recompute_total();
            return;
        }

        let mut per_role = BTreeMap::new();
        per_role.insert(label.to_string(), role_count);
        let mut location = CompositeLocation {
            city: place.city.to_string(),
            state: place.state.to_string(),
            state_name: obs.state_name.clone(),
            lat: place.lat,
            lon: place.lon,
            radius_miles: obs.radius(),
            total: 0,
            query: obs.query.clone().or_else(|| Some(query.to_string())),
            seniority_level: obs.seniority_level.clone(),
            run_at: obs.run_at.clone(),
            source_url: obs.source_url.clone(),
            per_role,
        };
        location.recompute_total();
        self.slots.insert(key, self.locations.len());
        self.locations.push(location);
    }

    pub fn finish(self) -> MergeReport {
        MergeReport {
            locations: self.locations,
            dropped: self.dropped,
        }
    }
}

/// Merge per-role results into one composite record per location.
pub fn merge(results: &[RoleResult]) -> MergeReport {
    let mut merger = RoleMerger::new();
    for result in results {
        merger.add_role(&result.label, &result.query, &result.observations);
    }
    merger.finish()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::{RoleMerger, RoleResult, merge};
    use crate::observation::Observation;

    fn obs(city: &str, state: &str, total: u64) -> Observation {
        Observation {
            city: Some(city.to_string()),
            state: Some(state.to_string()),
            lat: Some(30.0),
            lon: Some(-97.0),
            radius_miles: Some(25.0),
            total,
            ..Observation::default()
        }
    }

    fn role_totals(report: &super::MergeReport) -> BTreeMap<(String, String), (u64, Vec<(String, u64)>)> {
        report
            .locations
            .iter()
            .map(|l| {
                (
                    (l.city.clone(), l.state.clone()),
                    (
                        l.total,
                        l.per_role
                            .iter()
                            .map(|(k, v)| (k.clone(), v.total))
                            .collect(),
                    ),
                )
            })
            .collect()
    }

    #[test]
    fn two_roles_at_one_city_sum() {
        let report = merge(&[
            RoleResult::new("Software", "Software Engineer", vec![obs("Austin", "TX", 10)]),
            RoleResult::new("Backend", "Backend Engineer", vec![obs("Austin", "TX", 7)]),
        ]);
        assert_eq!(report.locations.len(), 1);
        let austin = &report.locations[0];
        assert_eq!(austin.total, 17);
        assert_eq!(austin.per_role["Software"].total, 10);
        assert_eq!(austin.per_role["Backend"].total, 7);
        assert_eq!(austin.per_role["Backend"].query, "Backend Engineer");
    }

    #[test]
    fn lower_total_for_same_role_never_wins() {
        let mut merger = RoleMerger::new();
        merger.add_role("Software", "Software Engineer", &[obs("Austin", "TX", 5)]);
        merger.add_role("Software", "Software Engineer", &[obs("Austin", "TX", 3)]);
        let report = merger.finish();
        assert_eq!(report.locations[0].per_role["Software"].total, 5);
        assert_eq!(report.locations[0].total, 5);
    }

    #[test]
    fn highest_total_per_role_wins_in_either_order() {
        let high = RoleResult::new("Software", "Software Engineer", vec![obs("Austin", "TX", 8)]);
        let low = RoleResult::new("Software", "Software Engineer", vec![obs("Austin", "TX", 2)]);
        let a = merge(&[high.clone(), low.clone()]);
        let b = merge(&[low, high]);
        assert_eq!(role_totals(&a), role_totals(&b));
        assert_eq!(a.locations[0].total, 8);
    }

    #[test]
    fn exact_tie_keeps_first_value() {
        let mut first = obs("Austin", "TX", 4);
        first.source_url = Some("first".into());
        let mut second = obs("Austin", "TX", 4);
        second.source_url = Some("second".into());

        let mut merger = RoleMerger::new();
        merger.add_role("Data", "Data Engineer", &[first, second]);
        let report = merger.finish();
        assert_eq!(
            report.locations[0].per_role["Data"].url.as_deref(),
            Some("first")
        );
    }

    #[test]
    fn radius_keeps_largest_observed() {
        let mut wide = obs("Austin", "TX", 1);
        wide.radius_miles = Some(50.0);
        let report = merge(&[
            RoleResult::new("Software", "Software Engineer", vec![obs("Austin", "TX", 2)]),
            RoleResult::new("Mobile", "Mobile Developer", vec![wide]),
        ]);
        assert_eq!(report.locations[0].radius_miles, 50.0);
    }

    #[test]
    fn malformed_observations_are_dropped_not_fatal() {
        let mut no_lat = obs("Austin", "TX", 9);
        no_lat.lat = None;
        let no_city = Observation {
            city: None,
            ..obs("x", "TX", 1)
        };
        let report = merge(&[RoleResult::new(
            "Software",
            "Software Engineer",
            vec![no_lat, no_city, obs("Denver", "CO", 2)],
        )]);
        assert_eq!(report.dropped, 2);
        assert_eq!(report.locations.len(), 1);
        assert_eq!(report.locations[0].city, "Denver");
    }

    #[test]
    fn same_city_name_in_different_states_stays_apart() {
        let report = merge(&[RoleResult::new(
            "Software",
            "Software Engineer",
            vec![obs("Portland", "OR", 3), obs("Portland", "ME", 1)],
        )]);
        assert_eq!(report.locations.len(), 2);
    }

    #[test]
    fn merging_twice_is_idempotent() {
        let roles = vec![
            RoleResult::new("Software", "Software Engineer", vec![obs("Austin", "TX", 10)]),
            RoleResult::new("Backend", "Backend Engineer", vec![obs("Austin", "TX", 7)]),
        ];
        let once = merge(&roles);
        let mut doubled = roles.clone();
        doubled.extend(roles);
        assert_eq!(merge(&doubled), once);
    }

    /// Role results whose labels repeat, so the same role meets itself with
    /// different totals at the same city.
    fn arb_roles() -> impl Strategy<Value = Vec<RoleResult>> {
        let city = prop::sample::select(vec!["Austin", "Denver", "Boston", "Seattle"]);
        let label = prop::sample::select(vec!["Software", "Backend", "Data"]);
        let observation = (city, 0u64..50).prop_map(|(c, t)| obs(c, "XX", t));
        let role = (label, prop::collection::vec(observation, 0..6))
            .prop_map(|(l, list)| RoleResult::new(l, format!("{l} Engineer"), list));
        prop::collection::vec(role, 1..6)
    }

    fn arb_roles_and_permutation() -> impl Strategy<Value = (Vec<RoleResult>, Vec<RoleResult>)> {
        arb_roles().prop_flat_map(|roles| (Just(roles.clone()), Just(roles).prop_shuffle()))
    }

    proptest! {
        #[test]
        fn role_order_does_not_change_totals((roles, shuffled) in arb_roles_and_permutation()) {
            prop_assert_eq!(role_totals(&merge(&roles)), role_totals(&merge(&shuffled)));
        }

        #[test]
        fn total_is_sum_of_role_counts(roles in arb_roles()) {
            for loc in merge(&roles).locations {
                let sum: u64 = loc.per_role.values().map(|r| r.total).sum();
                prop_assert_eq!(loc.total, sum);
            }
        }

        #[test]
        fn repeated_merge_is_idempotent(roles in arb_roles()) {
            let once = merge(&roles);
            let mut twice = roles.clone();
            twice.extend(roles.iter().cloned());
            prop_assert_eq!(role_totals(&merge(&twice)), role_totals(&once));
        }
    }
}
