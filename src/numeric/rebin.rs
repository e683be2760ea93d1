//! Flux-conserving rebinning.
//!
//! [`FluxRebinner`] is the seam through which the exact rebin mode resamples
//! a redshifted template. [`TrapzRebinner`] integrates the piecewise-linear
//! source exactly over each destination bin.

use thiserror::Error;

use crate::utils::validation::{is_strictly_increasing, MIN_GRID_SAMPLES};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RebinError {
    #[error("Source grid has {wave} wavelengths but {flux} flux values")]
    LengthMismatch { wave: usize, flux: usize },

    #[error("Grid needs at least {MIN_GRID_SAMPLES} samples, got {0}")]
    TooFewSamples(usize),

    #[error("Wavelength grid must be finite and strictly increasing")]
    NotIncreasing,
}

/// Resample flux from one wavelength grid onto another, conserving the
/// integrated flux in each destination bin.
pub trait FluxRebinner: Sync {
    /// # Errors
    ///
    /// Returns a [`RebinError`] when the grids cannot be rebinned.
    fn rebin(&self, src_wave: &[f64], src_flux: &[f64], dst_wave: &[f64])
        -> Result<Vec<f64>, RebinError>;
}

impl<T: FluxRebinner + ?Sized> FluxRebinner for &T {
    fn rebin(
        &self,
        src_wave: &[f64],
        src_flux: &[f64],
        dst_wave: &[f64],
    ) -> Result<Vec<f64>, RebinError> {
        (**self).rebin(src_wave, src_flux, dst_wave)
    }
}

/// Trapezoidal flux-conserving rebinner.
///
/// Destination bin edges sit halfway between neighboring destination
/// wavelengths; the outer edges extend half a step past the first and last
/// sample. Each output value is the integral of the linearly interpolated
/// source over its bin, divided by the bin width. Beyond the source grid the
/// source is extended linearly from its edge segments.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrapzRebinner;

impl FluxRebinner for TrapzRebinner {
    fn rebin(
        &self,
        src_wave: &[f64],
        src_flux: &[f64],
        dst_wave: &[f64],
    ) -> Result<Vec<f64>, RebinError> {
        if src_wave.len() != src_flux.len() {
            return Err(RebinError::LengthMismatch {
                wave: src_wave.len(),
                flux: src_flux.len(),
            });
        }
        if src_wave.len() < MIN_GRID_SAMPLES {
            return Err(RebinError::TooFewSamples(src_wave.len()));
        }
        if dst_wave.is_empty() {
            return Ok(Vec::new());
        }
        if dst_wave.len() < MIN_GRID_SAMPLES {
            return Err(RebinError::TooFewSamples(dst_wave.len()));
        }
        if !is_strictly_increasing(src_wave) || !is_strictly_increasing(dst_wave) {
            return Err(RebinError::NotIncreasing);
        }

        let source = CumulativeIntegral::new(src_wave, src_flux);
        let edges = bin_edges(dst_wave);

        Ok(edges
            .windows(2)
            .map(|e| (source.at(e[1]) - source.at(e[0])) / (e[1] - e[0]))
            .collect())
    }
}

/// Bin edges for a grid of bin centers (`len + 1` values)
fn bin_edges(centers: &[f64]) -> Vec<f64> {
    let n = centers.len();
    let mut edges = Vec::with_capacity(n + 1);
    edges.push(centers[0] - (centers[1] - centers[0]) / 2.0);
    edges.extend(centers.windows(2).map(|w| (w[0] + w[1]) / 2.0));
    edges.push(centers[n - 1] + (centers[n - 1] - centers[n - 2]) / 2.0);
    edges
}

/// Running integral of a piecewise-linear function from its first knot
struct CumulativeIntegral<'a> {
    wave: &'a [f64],
    flux: &'a [f64],
    cumulative: Vec<f64>,
}

impl<'a> CumulativeIntegral<'a> {
    fn new(wave: &'a [f64], flux: &'a [f64]) -> Self {
        let mut cumulative = Vec::with_capacity(wave.len());
        let mut total = 0.0;
        cumulative.push(total);
        for k in 1..wave.len() {
            total += (wave[k] - wave[k - 1]) * (flux[k] + flux[k - 1]) / 2.0;
            cumulative.push(total);
        }
        Self {
            wave,
            flux,
            cumulative,
        }
    }

    /// Signed integral from the first knot to `x`
    fn at(&self, x: f64) -> f64 {
        // Segment whose left knot is the last one <= x, clamped to the edge segments
        let last_segment = self.wave.len() - 2;
        let k = self
            .wave
            .partition_point(|&w| w <= x)
            .saturating_sub(1)
            .min(last_segment);

        let slope = (self.flux[k + 1] - self.flux[k]) / (self.wave[k + 1] - self.wave[k]);
        let fx = self.flux[k] + slope * (x - self.wave[k]);
        self.cumulative[k] + (x - self.wave[k]) * (self.flux[k] + fx) / 2.0
    }
}
