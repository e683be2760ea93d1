use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::CameraGrids;
use crate::utils::validation::is_strictly_increasing;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpectrumError {
    #[error("Camera '{camera}' has {wave} wavelengths, {flux} flux and {ivar} ivar values")]
    LengthMismatch {
        camera: String,
        wave: usize,
        flux: usize,
        ivar: usize,
    },

    #[error("Camera '{0}' wavelengths must be finite and strictly increasing")]
    NotIncreasing(String),

    #[error("Camera '{0}' appears more than once")]
    DuplicateCamera(String),

    #[error("Camera '{0}' has a negative or non-finite inverse variance")]
    InvalidIvar(String),
}

/// Observed flux from one camera (spectrograph arm)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spectrum {
    /// Camera identifier, e.g. "b", "r", "z"
    pub camera: String,

    /// Observed-frame wavelengths
    pub wave: Vec<f64>,

    /// Observed flux
    pub flux: Vec<f64>,

    /// Inverse variance of the flux
    pub ivar: Vec<f64>,
}

impl Spectrum {
    pub fn new(camera: impl Into<String>, wave: Vec<f64>, flux: Vec<f64>, ivar: Vec<f64>) -> Self {
        Self {
            camera: camera.into(),
            wave,
            flux,
            ivar,
        }
    }

    /// Number of samples
    #[must_use]
    pub fn len(&self) -> usize {
        self.wave.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wave.is_empty()
    }

    fn validate(&self) -> Result<(), SpectrumError> {
        if self.flux.len() != self.wave.len() || self.ivar.len() != self.wave.len() {
            return Err(SpectrumError::LengthMismatch {
                camera: self.camera.clone(),
                wave: self.wave.len(),
                flux: self.flux.len(),
                ivar: self.ivar.len(),
            });
        }
        if !is_strictly_increasing(&self.wave) {
            return Err(SpectrumError::NotIncreasing(self.camera.clone()));
        }
        if self.ivar.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(SpectrumError::InvalidIvar(self.camera.clone()));
        }
        Ok(())
    }
}

/// The spectra of one target plus their concatenated fit inputs.
///
/// `weights`, `flux` and `wflux` are concatenated in the order of
/// `spectra`; solvers rely on that order when stacking design matrices.
#[derive(Debug, Clone)]
pub struct SpectrumSet {
    spectra: Vec<Spectrum>,
    weights: Vec<f64>,
    flux: Vec<f64>,
    wflux: Vec<f64>,
}

impl SpectrumSet {
    /// Build a set, validating each spectrum and precomputing concatenations.
    ///
    /// # Errors
    ///
    /// Returns a [`SpectrumError`] if a camera is malformed or repeated.
    pub fn new(spectra: Vec<Spectrum>) -> Result<Self, SpectrumError> {
        for (i, spectrum) in spectra.iter().enumerate() {
            spectrum.validate()?;
            if spectra[..i].iter().any(|s| s.camera == spectrum.camera) {
                return Err(SpectrumError::DuplicateCamera(spectrum.camera.clone()));
            }
        }

        let weights: Vec<f64> = spectra.iter().flat_map(|s| s.ivar.iter().copied()).collect();
        let flux: Vec<f64> = spectra.iter().flat_map(|s| s.flux.iter().copied()).collect();
        let wflux = weights.iter().zip(&flux).map(|(w, f)| w * f).collect();

        Ok(Self {
            spectra,
            weights,
            flux,
            wflux,
        })
    }

    #[must_use]
    pub fn spectra(&self) -> &[Spectrum] {
        &self.spectra
    }

    /// Concatenated inverse variances
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Concatenated flux
    #[must_use]
    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    /// Concatenated `weights * flux`
    #[must_use]
    pub fn wflux(&self) -> &[f64] {
        &self.wflux
    }

    /// Wavelength grid of each camera
    #[must_use]
    pub fn dwave(&self) -> CameraGrids {
        self.spectra
            .iter()
            .map(|s| (s.camera.clone(), s.wave.clone()))
            .collect()
    }

    /// Total number of samples across cameras
    #[must_use]
    pub fn len(&self) -> usize {
        self.flux.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flux.is_empty()
    }
}
