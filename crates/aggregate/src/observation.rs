use serde::{Deserialize, Serialize};

/// One count result for a (location, role, seniority) combination, as
/// returned by the counts service. Immutable once received.
///
/// Location fields are optional on the wire; rows missing any of them are
/// dropped during merge.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub state_name: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub radius_miles: Option<f64>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub seniority_level: Option<String>,
    #[serde(default)]
    pub run_at: Option<String>,
    #[serde(default, rename = "hiring_cafe_url", alias = "source_url")]
    pub source_url: Option<String>,
}

/// The validated location part of an observation.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedPlace<'a> {
    pub city: &'a str,
    pub state: &'a str,
    pub lat: f64,
    pub lon: f64,
}

impl Observation {
    /// Returns `None` when city/state are missing or blank, or coordinates
    /// are missing or non-finite.
    pub fn place(&self) -> Option<ObservedPlace<'_>> {
        let city = self.city.as_deref().filter(|s| !s.trim().is_empty())?;
        let state = self.state.as_deref().filter(|s| !s.trim().is_empty())?;
        let lat = self.lat.filter(|v| v.is_finite())?;
        let lon = self.lon.filter(|v| v.is_finite())?;
        Some(ObservedPlace {
            city,
            state,
            lat,
            lon,
        })
    }

    /// Radius in miles; missing or negative radii count as zero.
    pub fn radius(&self) -> f64 {
        self.radius_miles
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(0.0)
    }
}

/// Response body of the counts service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountsResponse {
    #[serde(default)]
    pub points: Vec<Observation>,
}
