use aggregate::link::search_link;
use foundation::math::miles_to_meters;
use serde::Serialize;
use spatial::cluster::{Cluster, ClusterId};
use streaming::status::RefinementStatus;

use crate::labels::total_label;
use crate::symbology::{ColorScale, Rgba};

/// Radius drawn for clusters whose members carry none.
pub const DEFAULT_MARKER_RADIUS_MILES: f64 = 10.0;

/// Everything a map layer needs to draw one cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: ClusterId,
    pub lat: f64,
    pub lon: f64,
    pub radius_meters: f64,
    pub color: Rgba,
    pub label: String,
    pub cities: Vec<String>,
    pub states: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refinement: Option<RefinementStatus>,
}

/// Color scale maximum: the largest `max_total` among visible clusters.
pub fn max_total(clusters: &[Cluster]) -> u64 {
    clusters.iter().map(|c| c.max_total).max().unwrap_or(0)
}

pub fn marker_for(
    cluster: &Cluster,
    scale: &ColorScale,
    scale_max: u64,
    status: Option<RefinementStatus>,
) -> Option<Marker> {
    if cluster.max_total == 0 {
        return None;
    }

    let radius_miles = if cluster.radius_miles > 0.0 {
        cluster.radius_miles
    } else {
        DEFAULT_MARKER_RADIUS_MILES
    };

    Some(Marker {
        id: cluster.id,
        lat: cluster.lat,
        lon: cluster.lon,
        radius_meters: miles_to_meters(radius_miles),
        color: scale.color_for(cluster.max_total as f64, scale_max as f64),
        label: total_label(cluster, status.as_ref()),
        cities: cluster.cities.clone(),
        states: cluster.states.clone(),
        query: cluster.query.clone(),
        search_link: search_link(&cluster.members, cluster.query.as_deref()),
        refinement: status,
    })
}

/// Markers for a viewport's clusters. `status_of` supplies each cluster's
/// current refinement status, if any.
pub fn markers<F>(clusters: &[Cluster], scale: &ColorScale, mut status_of: F) -> Vec<Marker>
where
    F: FnMut(&Cluster) -> Option<RefinementStatus>,
{
    let scale_max = max_total(clusters);
    clusters
        .iter()
        .filter_map(|c| marker_for(c, scale, scale_max, status_of(c)))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use streaming::status::RefinementStatus;

    use super::{DEFAULT_MARKER_RADIUS_MILES, marker_for, markers, max_total};
    use crate::symbology::{ColorScale, NEUTRAL, Rgba};
    use crate::tests::{austin_round_rock, austin_two_roles};

    #[test]
    fn largest_cluster_gets_top_color() {
        let clusters = vec![austin_two_roles(), austin_round_rock()];
        assert_eq!(max_total(&clusters), 17);
        let out = markers(&clusters, &ColorScale::default(), |_| None);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].color, Rgba::new(255, 0, 40, 0.55));
        assert_ne!(out[1].color, NEUTRAL);
        assert_eq!(out[1].label, "10–14");
    }

    #[test]
    fn radius_defaults_when_missing() {
        let mut c = austin_two_roles();
        c.radius_miles = 0.0;
        let m = marker_for(&c, &ColorScale::default(), 17, None).unwrap();
        assert!((m.radius_meters - DEFAULT_MARKER_RADIUS_MILES * 1_609.344).abs() < 1e-9);
        assert!(m.search_link.is_some());
    }

    #[test]
    fn empty_cluster_has_no_marker() {
        let mut c = austin_two_roles();
        c.max_total = 0;
        assert!(marker_for(&c, &ColorScale::default(), 17, None).is_none());
    }

    #[test]
    fn status_is_carried_through() {
        let c = austin_round_rock();
        let out = markers(std::slice::from_ref(&c), &ColorScale::default(), |_| {
            Some(RefinementStatus::Pending)
        });
        assert_eq!(out[0].refinement, Some(RefinementStatus::Pending));
        assert_eq!(out[0].label, "10–14 (refining…)");
    }
}
