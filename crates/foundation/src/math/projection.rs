//! Spherical Web Mercator in unit space.
//!
//! Longitude/latitude in degrees map onto `[0, 1] x [0, 1]`, with `x`
//! increasing eastward and `y` increasing southward (tile convention). A
//! distance of `d` unit-space units is `d * extent * 2^zoom` pixels on screen.

use std::f64::consts::PI;

use super::Vec2;

/// Project a longitude (degrees) onto the unit x axis.
pub fn lon_to_unit_x(lon_deg: f64) -> f64 {
    lon_deg / 360.0 + 0.5
}

/// Project a latitude (degrees) onto the unit y axis, clamped to `[0, 1]`.
pub fn lat_to_unit_y(lat_deg: f64) -> f64 {
    let sin = (lat_deg * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    // Poles project to +/- infinity; NaN from sin = 1 collapses here too.
    if y.is_nan() {
        return if lat_deg > 0.0 { 0.0 } else { 1.0 };
    }
    y.clamp(0.0, 1.0)
}

pub fn unit_x_to_lon(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

pub fn unit_y_to_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0) * PI / 180.0;
    360.0 * y2.exp().atan() / PI - 90.0
}

pub fn project_lon_lat(lon_deg: f64, lat_deg: f64) -> Vec2 {
    Vec2::new(lon_to_unit_x(lon_deg), lat_to_unit_y(lat_deg))
}

pub fn unproject(p: Vec2) -> (f64, f64) {
    (unit_x_to_lon(p.x), unit_y_to_lat(p.y))
}

/// Size of one screen pixel in unit space at an integer zoom level.
pub fn unit_per_pixel(extent: f64, zoom: u8) -> f64 {
    1.0 / (extent * f64::from(1u32 << zoom.min(31)))
}
