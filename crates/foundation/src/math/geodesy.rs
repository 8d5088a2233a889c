/// Statute mile in meters.
pub const MI_TO_METERS: f64 = 1_609.344;

/// Largest latitude representable in Web Mercator (degrees).
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

pub fn miles_to_meters(miles: f64) -> f64 {
    miles * MI_TO_METERS
}

/// Wrap a longitude into `[-180, 180)`.
pub fn wrap_lon_deg(lon: f64) -> f64 {
    if (-180.0..180.0).contains(&lon) {
        return lon;
    }
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::{miles_to_meters, wrap_lon_deg};

    #[test]
    fn ten_miles_in_meters() {
        assert!((miles_to_meters(10.0) - 16_093.44).abs() < 1e-9);
    }

    #[test]
    fn wraps_longitudes_past_the_antimeridian() {
        assert_eq!(wrap_lon_deg(190.0), -170.0);
        assert_eq!(wrap_lon_deg(-190.0), 170.0);
        assert_eq!(wrap_lon_deg(180.0), -180.0);
        assert_eq!(wrap_lon_deg(-97.74), -97.74);
    }
}
