//! Deep link into the job board for a group of locations.

use serde_json::{Value, json};

use crate::location::CompositeLocation;

pub const SEARCH_BASE_URL: &str = "https://hiring.cafe/";

/// Radius used in links when a location carries none.
pub const DEFAULT_LINK_RADIUS_MILES: f64 = 25.0;

const DATE_FETCHED_PAST_N_DAYS: u32 = 61;

/// Build a job-board search URL covering every member location.
///
/// Returns `None` for an empty member list.
pub fn search_link(members: &[CompositeLocation], query: Option<&str>) -> Option<String> {
    if members.is_empty() {
        return None;
    }

    let locations: Vec<Value> = members.iter().map(location_entry).collect();
    let search_state = json!({
        "locations": locations,
        "workplaceTypes": ["Remote", "Hybrid", "Onsite"],
        "defaultToUserLocation": false,
        "searchQuery": query.unwrap_or(""),
        "dateFetchedPastNDays": DATE_FETCHED_PAST_N_DAYS,
        "sortBy": "default",
    });

    let encoded = urlencoding::encode(&search_state.to_string()).into_owned();
    Some(format!("{SEARCH_BASE_URL}?searchState={encoded}"))
}

fn location_entry(m: &CompositeLocation) -> Value {
    let radius = if m.radius_miles > 0.0 {
        m.radius_miles
    } else {
        DEFAULT_LINK_RADIUS_MILES
    };
    json!({
        "formatted_address": format!("{}, {}, United States", m.city, m.state),
        "types": ["locality", "political"],
        "geometry": { "location": { "lat": m.lat, "lon": m.lon } },
        "id": location_id(&m.city, &m.state),
        "address_components": [
            { "long_name": m.city, "short_name": m.city, "types": ["locality", "political"] },
            { "long_name": m.state, "short_name": m.state, "types": ["administrative_area_level_1", "political"] },
            { "long_name": "United States", "short_name": "US", "types": ["country", "political"] },
        ],
        "options": { "radius_miles": radius, "ignore_radius": false, "radius": radius },
    })
}

/// `city_<city, lowercased, whitespace runs as '_'>_<state, lowercased>`.
pub fn location_id(city: &str, state: &str) -> String {
    let city = city
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    format!("city_{city}_{}", state.to_lowercase())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{location_id, search_link};
    use crate::location::CompositeLocation;

    fn place(city: &str, radius: f64) -> CompositeLocation {
        CompositeLocation {
            city: city.to_string(),
            state: "CA".to_string(),
            state_name: None,
            lat: 37.77,
            lon: -122.42,
            radius_miles: radius,
            total: 3,
            query: None,
            seniority_level: None,
            run_at: None,
            source_url: None,
            per_role: BTreeMap::new(),
        }
    }

    #[test]
    fn location_ids_are_snake_cased() {
        assert_eq!(location_id("San Francisco", "CA"), "city_san_francisco_ca");
    }

    #[test]
    fn no_members_no_link() {
        assert_eq!(search_link(&[], Some("Data Engineer")), None);
    }

    #[test]
    fn link_carries_encoded_search_state() {
        let url = search_link(&[place("San Francisco", 0.0)], Some("Data Engineer")).unwrap();
        let encoded = url.strip_prefix("https://hiring.cafe/?searchState=").unwrap();
        let decoded = urlencoding::decode(encoded).unwrap();
        let state: serde_json::Value = serde_json::from_str(&decoded).unwrap();
        assert_eq!(state["searchQuery"], "Data Engineer");
        assert_eq!(state["locations"][0]["id"], "city_san_francisco_ca");
        assert_eq!(state["locations"][0]["options"]["radius_miles"], 25.0);
    }
}
