//! Deterministic float handling for spatial ordering and hashing.

use core::cmp::Ordering;

/// Fold the float values that compare equal but format differently onto one
/// representative: `-0.0` becomes `0.0` and every NaN becomes `f64::NAN`.
///
/// Fingerprints format canonicalized coordinates, so two equal members always
/// produce the same key text.
pub fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Total order over canonicalized floats; the k-d tree's split comparator.
pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    canonical_f64(a).total_cmp(&canonical_f64(b))
}

#[cfg(test)]
mod tests {
    use super::{canonical_f64, stable_total_cmp_f64};
    use core::cmp::Ordering;

    #[test]
    fn negative_zero_formats_like_zero() {
        assert_eq!(format!("{}", canonical_f64(-0.0)), "0");
        assert_eq!(stable_total_cmp_f64(-0.0, 0.0), Ordering::Equal);
    }

    #[test]
    fn nans_compare_equal_and_sort_last() {
        assert_eq!(stable_total_cmp_f64(f64::NAN, -f64::NAN), Ordering::Equal);
        assert_eq!(stable_total_cmp_f64(1.0, 2.0), Ordering::Less);
        assert_eq!(stable_total_cmp_f64(f64::INFINITY, f64::NAN), Ordering::Less);
    }
}
