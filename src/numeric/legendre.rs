//! Legendre polynomial continuum basis.
//!
//! The continuum correction added to an archetype is a low-order Legendre
//! series in wavelength, normalized to `[-1, 1]` over the joint span of all
//! cameras of a spectrum. Every camera shares that span so the polynomial is
//! one smooth curve across arms.

use ndarray::Array2;
use std::collections::BTreeMap;

use crate::core::types::CameraGrids;
use crate::utils::validation::{count_to_f64, joint_span};

/// Evaluate Legendre polynomials `P_0..P_{count-1}` at each `x`.
///
/// Returns a `count × x.len()` matrix, one row per order, computed with
/// Bonnet's recurrence `(n+1) P_{n+1} = (2n+1) x P_n - n P_{n-1}`.
#[must_use]
pub fn legendre_rows(x: &[f64], count: usize) -> Array2<f64> {
    let mut rows = Array2::<f64>::zeros((count, x.len()));
    if count == 0 {
        return rows;
    }

    rows.row_mut(0).fill(1.0);
    if count > 1 {
        for (j, &xj) in x.iter().enumerate() {
            rows[[1, j]] = xj;
        }
    }
    for n in 1..count.saturating_sub(1) {
        let nf = count_to_f64(n);
        for (j, &xj) in x.iter().enumerate() {
            rows[[n + 1, j]] =
                ((2.0 * nf + 1.0) * xj * rows[[n, j]] - nf * rows[[n - 1, j]]) / (nf + 1.0);
        }
    }
    rows
}

/// Map wavelengths from `[wave_min, wave_max]` onto `[-1, 1]`.
#[must_use]
pub fn normalize_to_span(wave: &[f64], wave_min: f64, wave_max: f64) -> Vec<f64> {
    let width = wave_max - wave_min;
    if width <= 0.0 {
        return vec![0.0; wave.len()];
    }
    wave.iter()
        .map(|w| (w - wave_min) / width * 2.0 - 1.0)
        .collect()
}

/// Precomputed Legendre rows for each camera of a spectrum.
///
/// Computed once per spectrum and shared across every template scanned.
#[derive(Debug, Clone, Default)]
pub struct LegendreBasis {
    rows: BTreeMap<String, Array2<f64>>,
    nleg: usize,
}

impl LegendreBasis {
    /// Evaluate `nleg` orders on every camera grid, normalized over the joint span.
    #[must_use]
    pub fn for_grids(dwave: &CameraGrids, nleg: usize) -> Self {
        let (wave_min, wave_max) = joint_span(dwave.values()).unwrap_or((0.0, 0.0));
        let rows = dwave
            .iter()
            .map(|(camera, wave)| {
                let x = normalize_to_span(wave, wave_min, wave_max);
                (camera.clone(), legendre_rows(&x, nleg))
            })
            .collect();
        Self { rows, nleg }
    }

    /// Wrap rows computed elsewhere. All matrices must have the same row count.
    #[must_use]
    pub fn from_rows(rows: BTreeMap<String, Array2<f64>>) -> Self {
        let nleg = rows.values().next().map_or(0, Array2::nrows);
        Self { rows, nleg }
    }

    /// Number of Legendre orders per camera
    #[must_use]
    pub fn nleg(&self) -> usize {
        self.nleg
    }

    /// `nleg × n_cam` rows for one camera
    #[must_use]
    pub fn get(&self, camera: &str) -> Option<&Array2<f64>> {
        self.rows.get(camera)
    }
}
