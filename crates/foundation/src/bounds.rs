use serde::{Deserialize, Serialize};

use crate::math::{MAX_MERCATOR_LAT, wrap_lon_deg};

/// Axis-aligned bounding box in a planar space (projected units).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    /// Inclusive on every edge.
    pub fn contains(&self, p: [f64; 2]) -> bool {
        p[0] >= self.min[0] && p[0] <= self.max[0] && p[1] >= self.min[1] && p[1] <= self.max[1]
    }
}

/// A map viewport in degrees: west/south/east/north.
///
/// `west > east` denotes a box crossing the antimeridian.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeoBounds {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// The whole Web-Mercator world, used when no viewport is known yet.
    pub fn world() -> Self {
        Self::new(-180.0, -85.0, 180.0, 85.0)
    }

    /// Split into at most two non-wrapping longitude ranges with latitudes
    /// clamped to the Mercator limit.
    pub fn normalized_parts(&self) -> Vec<GeoBounds> {
        let south = self.south.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
        let north = self.north.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);

        if self.east - self.west >= 360.0 {
            return vec![GeoBounds::new(-180.0, south, 180.0, north)];
        }

        let west = wrap_lon_deg(self.west);
        // Keep +180 as an east edge rather than wrapping it to -180.
        let east = if self.east == 180.0 {
            180.0
        } else {
            wrap_lon_deg(self.east)
        };

        if west > east {
            vec![
                GeoBounds::new(west, south, 180.0, north),
                GeoBounds::new(-180.0, south, east, north),
            ]
        } else {
            vec![GeoBounds::new(west, south, east, north)]
        }
    }
}

/// Parse `W,S,E,N` as used on command lines.
impl std::str::FromStr for GeoBounds {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("invalid bbox {s:?}: {e}"))?;
        match parts.as_slice() {
            [w, s_, e, n] => Ok(GeoBounds::new(*w, *s_, *e, *n)),
            _ => Err(format!("bbox needs 4 values (W,S,E,N), got {}", parts.len())),
        }
    }
}
