use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Wavelength grids keyed by camera (arm) identifier
///
/// Ordered by camera id so iteration is deterministic.
pub type CameraGrids = BTreeMap<String, Vec<f64>>;

/// Per-camera flux arrays, keyed like [`CameraGrids`]
pub type CameraFlux = BTreeMap<String, Vec<f64>>;

/// Design matrix bundle (`tdata`): per camera, an `n_cam × ncol` matrix whose
/// first column is the rebinned template and the rest are Legendre terms
pub type DesignBundle = BTreeMap<String, Array2<f64>>;

/// Separator between the spectral class and the subtype in a full type
pub const FULL_TYPE_SEPARATOR: &str = ":::";

/// Spectral class label (the `RRTYPE` of a template file), e.g. `GALAXY`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpectralClass(pub String);

impl SpectralClass {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SpectralClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Externally visible archetype identifier: `"{class}:::{subtype}"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FullType(pub String);

impl FullType {
    #[must_use]
    pub fn new(class: &SpectralClass, subtype: &str) -> Self {
        Self(format!("{class}{FULL_TYPE_SEPARATOR}{subtype}"))
    }

    /// Split back into (class, subtype)
    #[must_use]
    pub fn split(&self) -> Option<(&str, &str)> {
        self.0.split_once(FULL_TYPE_SEPARATOR)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FullType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a template is resampled onto an observed grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebinMode {
    /// Flux-conserving rebin of the redshifted template
    Exact,
    /// Pointwise interpolation at the de-redshifted observed wavelengths
    Interpolated,
}

/// How many Legendre rows a model evaluation uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuumDegree {
    /// Exactly this many Legendre rows; the coefficient vector must have one more entry
    Explicit(usize),
    /// Legacy behavior: count the nonzero coefficients and subtract one.
    ///
    /// A fit coefficient that happens to be exactly zero silently truncates
    /// the polynomial, so this exists only for parity with older outputs.
    InferFromNonzero,
}

impl ContinuumDegree {
    /// Number of Legendre rows to evaluate for the given coefficients
    #[must_use]
    pub fn legendre_rows(self, coeff: &[f64]) -> usize {
        match self {
            Self::Explicit(n) => n,
            Self::InferFromNonzero => coeff
                .iter()
                .filter(|c| **c != 0.0)
                .count()
                .saturating_sub(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_type_format() {
        let full = FullType::new(&SpectralClass::new("GALAXY"), "ELG_3");
        assert_eq!(full.as_str(), "GALAXY:::ELG_3");
        assert_eq!(full.split(), Some(("GALAXY", "ELG_3")));
    }

    #[test]
    fn test_inferred_degree_counts_nonzero() {
        let coeff = [1.0, 0.5, -0.2, 0.1];
        assert_eq!(ContinuumDegree::InferFromNonzero.legendre_rows(&coeff), 3);

        let with_zero = [1.0, 0.0, -0.2, 0.1];
        assert_eq!(ContinuumDegree::InferFromNonzero.legendre_rows(&with_zero), 2);

        assert_eq!(ContinuumDegree::InferFromNonzero.legendre_rows(&[0.0]), 0);
        assert_eq!(ContinuumDegree::Explicit(3).legendre_rows(&with_zero), 3);
    }
}
