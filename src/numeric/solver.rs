//! Weighted linear least-squares fit of a design bundle to observed flux.
//!
//! [`ChiSquareSolver`] is the seam the selector calls once per template.
//! [`WeightedLeastSquares`] solves `√W T c ≈ √W f` with a singular value
//! decomposition and reports `chi2 = Σ w (f - T c)²`.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use serde::Serialize;
use thiserror::Error;

use crate::core::spectrum::SpectrumSet;
use crate::core::types::DesignBundle;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Design bundle has no matrix for camera '{0}'")]
    MissingCamera(String),

    #[error("Design matrix for camera '{camera}' is {rows}x{cols}, expected {expected_rows} rows and {expected_cols} columns")]
    DimensionMismatch {
        camera: String,
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },

    #[error("Design matrix is rank deficient")]
    Singular,

    #[error("No spectra or no design columns to fit")]
    NoData,
}

/// Result of one linear fit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fit {
    /// Weighted sum of squared residuals
    pub chi2: f64,

    /// One coefficient per design-matrix column
    pub coeff: Vec<f64>,
}

/// Fits a design bundle to the observed spectra.
pub trait ChiSquareSolver: Sync {
    /// # Errors
    ///
    /// Returns a [`SolveError`] if the bundle does not match the spectra or the
    /// system cannot be solved.
    fn solve(&self, spectra: &SpectrumSet, tdata: &DesignBundle) -> Result<Fit, SolveError>;
}

impl<T: ChiSquareSolver + ?Sized> ChiSquareSolver for &T {
    fn solve(&self, spectra: &SpectrumSet, tdata: &DesignBundle) -> Result<Fit, SolveError> {
        (**self).solve(spectra, tdata)
    }
}

/// Singular values below this fraction of the largest, after column
/// scaling, count as rank deficiency
pub const DEFAULT_RANK_TOLERANCE: f64 = 1e-12;

/// Weighted least squares by SVD of the column-scaled design matrix
#[derive(Debug, Clone, Copy)]
pub struct WeightedLeastSquares {
    pub rank_tolerance: f64,
}

impl Default for WeightedLeastSquares {
    fn default() -> Self {
        Self {
            rank_tolerance: DEFAULT_RANK_TOLERANCE,
        }
    }
}

impl ChiSquareSolver for WeightedLeastSquares {
    fn solve(&self, spectra: &SpectrumSet, tdata: &DesignBundle) -> Result<Fit, SolveError> {
        let design = stack_design(spectra, tdata)?;
        let weights = Array1::from(spectra.weights().to_vec());
        let flux = Array1::from(spectra.flux().to_vec());

        let coeff = solve_weighted(&design, &weights, &flux, self.rank_tolerance)?;
        let residual = &flux - &design.dot(&coeff);
        let chi2 = residual
            .iter()
            .zip(weights.iter())
            .map(|(r, w)| w * r * r)
            .sum();

        Ok(Fit {
            chi2,
            coeff: coeff.to_vec(),
        })
    }
}

/// Stack per-camera matrices in the order of `spectra`
fn stack_design(spectra: &SpectrumSet, tdata: &DesignBundle) -> Result<Array2<f64>, SolveError> {
    let first = spectra
        .spectra()
        .first()
        .ok_or(SolveError::NoData)?;
    let ncol = tdata
        .get(&first.camera)
        .ok_or_else(|| SolveError::MissingCamera(first.camera.clone()))?
        .ncols();
    if ncol == 0 {
        return Err(SolveError::NoData);
    }

    let mut design = Array2::<f64>::zeros((spectra.len(), ncol));
    let mut offset = 0;
    for spectrum in spectra.spectra() {
        let block = tdata
            .get(&spectrum.camera)
            .ok_or_else(|| SolveError::MissingCamera(spectrum.camera.clone()))?;
        if block.nrows() != spectrum.len() || block.ncols() != ncol {
            return Err(SolveError::DimensionMismatch {
                camera: spectrum.camera.clone(),
                rows: block.nrows(),
                cols: block.ncols(),
                expected_rows: spectrum.len(),
                expected_cols: ncol,
            });
        }
        design
            .slice_mut(ndarray::s![offset..offset + spectrum.len(), ..])
            .assign(block);
        offset += spectrum.len();
    }
    Ok(design)
}

/// Minimize `Σ w (f - T c)²`.
///
/// Rows are scaled by `√w` and columns by their norm so the rank test does
/// not depend on flux units.
fn solve_weighted(
    design: &Array2<f64>,
    weights: &Array1<f64>,
    flux: &Array1<f64>,
    tolerance: f64,
) -> Result<Array1<f64>, SolveError> {
    let (nrows, ncols) = design.dim();
    let sqrt_w: Vec<f64> = weights.iter().map(|w| w.sqrt()).collect();

    let norms: Vec<f64> = design
        .columns()
        .into_iter()
        .map(|column| {
            column
                .iter()
                .zip(&sqrt_w)
                .map(|(t, s)| (t * s).powi(2))
                .sum::<f64>()
                .sqrt()
        })
        .collect();
    if norms.iter().any(|n| !n.is_finite() || *n == 0.0) {
        return Err(SolveError::Singular);
    }

    let a = DMatrix::from_fn(nrows, ncols, |i, j| sqrt_w[i] * design[[i, j]] / norms[j]);
    let b = DVector::from_iterator(nrows, flux.iter().zip(&sqrt_w).map(|(f, s)| f * s));

    let svd = a.svd(true, true);
    let cutoff = tolerance * svd.singular_values.max();
    if !cutoff.is_finite() || svd.rank(cutoff) < ncols {
        return Err(SolveError::Singular);
    }
    let scaled = svd.solve(&b, cutoff).map_err(|_| SolveError::Singular)?;

    Ok(scaled
        .iter()
        .zip(&norms)
        .map(|(x, n)| x / n)
        .collect())
}
