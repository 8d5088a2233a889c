pub mod labels;
pub mod markers;
pub mod symbology;

pub use labels::*;
pub use markers::*;
pub use symbology::*;

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeMap;

    use aggregate::location::{CompositeLocation, RoleCount};
    use spatial::cluster::{Cluster, ClusterId};

    fn place(city: &str, lat: f64, lon: f64, roles: &[(&str, &str, u64)]) -> CompositeLocation {
        let per_role: BTreeMap<String, RoleCount> = roles
            .iter()
            .map(|(label, query, total)| {
                (
                    (*label).to_string(),
                    RoleCount {
                        query: (*query).to_string(),
                        total: *total,
                        url: None,
                    },
                )
            })
            .collect();
        CompositeLocation {
            city: city.to_string(),
            state: "TX".to_string(),
            state_name: Some("Texas".to_string()),
            lat,
            lon,
            radius_miles: 25.0,
            total: per_role.values().map(|r| r.total).sum(),
            query: roles.first().map(|(_, q, _)| (*q).to_string()),
            seniority_level: None,
            run_at: None,
            source_url: None,
            per_role,
        }
    }

    pub(crate) fn austin_two_roles() -> Cluster {
        Cluster::from_members(
            ClusterId { zoom: 13, index: 0 },
            30.2672,
            -97.7431,
            vec![place(
                "Austin",
                30.2672,
                -97.7431,
                &[("Software", "Software Engineer", 10), ("Backend", "Backend Engineer", 7)],
            )],
        )
    }

    pub(crate) fn austin_round_rock() -> Cluster {
        Cluster::from_members(
            ClusterId { zoom: 6, index: 1 },
            30.39,
            -97.71,
            vec![
                place("Austin", 30.2672, -97.7431, &[("Software", "Software Engineer", 10)]),
                place("Round Rock", 30.5083, -97.6789, &[("Software", "Software Engineer", 4)]),
            ],
        )
    }
}
