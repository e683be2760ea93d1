//! Centralized validation and helper functions.

/// Minimum number of samples in a wavelength grid that can be interpolated
pub const MIN_GRID_SAMPLES: usize = 2;

/// Check that a redshift is usable as a dilation factor `(1 + z)`.
///
/// # Examples
///
/// ```
/// use rr_archetype::utils::validation::is_valid_redshift;
///
/// assert!(is_valid_redshift(0.0));
/// assert!(is_valid_redshift(2.5));
/// assert!(!is_valid_redshift(-1.0));
/// assert!(!is_valid_redshift(f64::NAN));
/// ```
#[must_use]
pub fn is_valid_redshift(z: f64) -> bool {
    z.is_finite() && z > -1.0
}

/// True if every sample is finite and strictly greater than the previous one.
#[must_use]
pub fn is_strictly_increasing(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite()) && values.windows(2).all(|w| w[0] < w[1])
}

/// Minimum and maximum over several grids, or `None` if all are empty.
#[must_use]
pub fn joint_span<'a, I>(grids: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = &'a Vec<f64>>,
{
    grids
        .into_iter()
        .flatten()
        .fold(None, |span, &w| match span {
            None => Some((w, w)),
            Some((lo, hi)) => Some((lo.min(w), hi.max(w))),
        })
}

/// Safely convert usize to f64 for grid arithmetic
#[inline]
#[must_use]
pub fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redshift_validation() {
        assert!(is_valid_redshift(0.0));
        assert!(is_valid_redshift(-0.5));
        assert!(!is_valid_redshift(-1.0));
        assert!(!is_valid_redshift(-3.0));
        assert!(!is_valid_redshift(f64::INFINITY));
    }

    #[test]
    fn test_strictly_increasing() {
        assert!(is_strictly_increasing(&[1.0, 2.0, 3.0]));
        assert!(is_strictly_increasing(&[]));
        assert!(!is_strictly_increasing(&[1.0, 1.0, 2.0]));
        assert!(!is_strictly_increasing(&[3.0, 2.0]));
        assert!(!is_strictly_increasing(&[1.0, f64::NAN]));
    }

    #[test]
    fn test_joint_span() {
        let a = vec![3600.0, 3700.0];
        let b = vec![5500.0, 5800.0, 5900.0];
        assert_eq!(joint_span([&a, &b]), Some((3600.0, 5900.0)));

        let empty: Vec<f64> = Vec::new();
        assert_eq!(joint_span([&empty]), None);
    }
}
