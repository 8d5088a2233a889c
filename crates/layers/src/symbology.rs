use std::fmt;

use serde::{Serialize, Serializer};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// CSS `rgba(r,g,b,a)`.
impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorStop {
    pub t: f64,
    pub rgb: [u8; 3],
}

impl ColorStop {
    pub const fn new(t: f64, rgb: [u8; 3]) -> Self {
        Self { t, rgb }
    }
}

/// Piecewise-linear ramp from a magnitude ratio to a marker color.
///
/// Pure: the same `(value, max)` always yields the same color, so legend and
/// markers agree.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    /// Ordered by `t`, spanning `0..=1`.
    stops: Vec<ColorStop>,
    alpha: f32,
    neutral: Rgba,
}

pub const DEFAULT_STOPS: [ColorStop; 6] = [
    ColorStop::new(0.0, [0, 120, 255]),
    ColorStop::new(0.2, [0, 200, 255]),
    ColorStop::new(0.4, [0, 200, 120]),
    ColorStop::new(0.6, [200, 200, 60]),
    ColorStop::new(0.8, [255, 140, 40]),
    ColorStop::new(1.0, [255, 0, 40]),
];

pub const NEUTRAL: Rgba = Rgba::new(180, 180, 180, 0.25);

impl Default for ColorScale {
    fn default() -> Self {
        Self {
            stops: DEFAULT_STOPS.to_vec(),
            alpha: 0.55,
            neutral: NEUTRAL,
        }
    }
}

impl ColorScale {
    /// `stops` must be non-empty; they are sorted by `t`.
    pub fn new(mut stops: Vec<ColorStop>, alpha: f32, neutral: Rgba) -> Option<Self> {
        if stops.is_empty() {
            return None;
        }
        stops.sort_by(|a, b| a.t.total_cmp(&b.t));
        Some(Self {
            stops,
            alpha,
            neutral,
        })
    }

    pub fn neutral(&self) -> Rgba {
        self.neutral
    }

    pub fn color_for(&self, value: f64, max_value: f64) -> Rgba {
        if !(value > 0.0 && max_value > 0.0) {
            return self.neutral;
        }
        let t = (value / max_value).min(1.0);

        // First stop at or past t; the first segment covers anything before it.
        let i = self
            .stops
            .iter()
            .position(|s| t <= s.t)
            .unwrap_or(self.stops.len() - 1)
            .max(1)
            .min(self.stops.len() - 1);
        let next = self.stops[i];
        let prev = self.stops[i.saturating_sub(1)];

        let span = next.t - prev.t;
        let ratio = if span > 0.0 { (t - prev.t) / span } else { 1.0 };
        let lerp = |a: u8, b: u8| {
            let v = f64::from(a) + (f64::from(b) - f64::from(a)) * ratio;
            v.round().clamp(0.0, 255.0) as u8
        };

        Rgba::new(
            lerp(prev.rgb[0], next.rgb[0]),
            lerp(prev.rgb[1], next.rgb[1]),
            lerp(prev.rgb[2], next.rgb[2]),
            self.alpha,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{ColorScale, ColorStop, NEUTRAL, Rgba};

    #[test]
    fn zero_value_or_max_is_neutral() {
        let scale = ColorScale::default();
        for x in [0.0, 1.0, 250.0] {
            assert_eq!(scale.color_for(0.0, x), NEUTRAL);
            assert_eq!(scale.color_for(x, 0.0), NEUTRAL);
        }
    }

    #[test]
    fn value_at_max_is_top_stop() {
        let scale = ColorScale::default();
        assert_eq!(scale.color_for(42.0, 42.0), Rgba::new(255, 0, 40, 0.55));
        // Values past the max clamp to the top.
        assert_eq!(scale.color_for(100.0, 42.0), Rgba::new(255, 0, 40, 0.55));
    }

    #[test]
    fn interpolates_between_stops() {
        let scale = ColorScale::default();
        // t = 0.1: halfway between stop 0 and stop 1.
        assert_eq!(scale.color_for(1.0, 10.0), Rgba::new(0, 160, 255, 0.55));
        // t = 0.5: halfway between (0,200,120) and (200,200,60).
        assert_eq!(scale.color_for(5.0, 10.0), Rgba::new(100, 200, 90, 0.55));
        // Exactly on a stop.
        assert_eq!(scale.color_for(2.0, 10.0), Rgba::new(0, 200, 255, 0.55));
    }

    #[test]
    fn coincident_stops_do_not_divide_by_zero() {
        let scale = ColorScale::new(
            vec![
                ColorStop::new(0.0, [0, 0, 0]),
                ColorStop::new(0.5, [10, 10, 10]),
                ColorStop::new(0.5, [20, 20, 20]),
            ],
            0.5,
            NEUTRAL,
        )
        .unwrap();
        // Past the last stop the final (zero-width) segment is used.
        assert_eq!(scale.color_for(8.0, 10.0), Rgba::new(20, 20, 20, 0.5));
        assert_eq!(scale.color_for(5.0, 10.0), Rgba::new(10, 10, 10, 0.5));
    }

    #[test]
    fn renders_css() {
        assert_eq!(NEUTRAL.to_string(), "rgba(180,180,180,0.25)");
        assert_eq!(Rgba::new(255, 0, 40, 0.55).to_string(), "rgba(255,0,40,0.55)");
    }

    #[test]
    fn deterministic_output() {
        let scale = ColorScale::default();
        assert_eq!(scale.color_for(3.3, 17.0), scale.color_for(3.3, 17.0));
    }
}
