use ndarray::Array2;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::core::interp::LinearInterpolant;
use crate::core::types::{CameraFlux, CameraGrids, ContinuumDegree, FullType, RebinMode, SpectralClass};
use crate::numeric::legendre::{legendre_rows, normalize_to_span};
use crate::numeric::rebin::{FluxRebinner, RebinError};
use crate::parsing::archetype_file::{parse_archetype_file, ArchetypeFile, FormatError};
use crate::utils::validation::{is_valid_redshift, joint_span};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArchetypeError {
    #[error("No archetype with subtype '{0}'")]
    UnknownSubtype(String),

    #[error("Archetype index {index} out of range ({narch} archetypes)")]
    IndexOutOfRange { index: usize, narch: usize },

    #[error("Invalid redshift {0}: must be finite and greater than -1")]
    InvalidRedshift(f64),

    #[error("Expected {expected} coefficients, got {found}")]
    CoefficientMismatch { expected: usize, found: usize },

    #[error("Camera wavelength grids contain no samples")]
    EmptyGrids,

    #[error("Rebinning failed: {0}")]
    Rebin(#[from] RebinError),
}

/// The archetypes of one spectral class.
///
/// Holds the rest-frame template fluxes on a common wavelength grid plus one
/// prebuilt interpolant per template. Immutable after construction and safe
/// to share across threads.
#[derive(Debug, Clone)]
pub struct Archetype {
    class: SpectralClass,
    version: String,
    wave: Arc<[f64]>,
    flux: Array2<f64>,
    subtypes: Vec<String>,
    full_types: Vec<FullType>,
    interpolants: Vec<LinearInterpolant>,
    subtype_to_index: HashMap<String, usize>,
}

impl Archetype {
    /// Load the archetypes of one class from a template file
    ///
    /// # Errors
    ///
    /// Returns a `FormatError` if the file is unreadable or incomplete.
    pub fn load(path: &Path) -> Result<Self, FormatError> {
        Self::from_file(parse_archetype_file(path)?)
    }

    /// Build from parsed file contents.
    ///
    /// Subtypes get their row index appended (`ELG` in row 3 becomes
    /// `ELG_3`) since raw labels repeat within a class.
    ///
    /// # Errors
    ///
    /// Returns a `FormatError` if the table shape or grid is invalid.
    pub fn from_file(file: ArchetypeFile) -> Result<Self, FormatError> {
        file.validate()?;

        let wave: Arc<[f64]> = Arc::from(file.wavelengths());
        let narch = file.flux.len();
        let nwave = wave.len();
        let class = SpectralClass::new(file.rrtype);

        let subtypes: Vec<String> = file
            .subtypes
            .iter()
            .enumerate()
            .map(|(i, raw)| format!("{raw}_{i}"))
            .collect();
        let full_types = subtypes.iter().map(|s| FullType::new(&class, s)).collect();
        let subtype_to_index = subtypes
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();

        let interpolants = file
            .flux
            .iter()
            .map(|row| LinearInterpolant::new(Arc::clone(&wave), row.clone()))
            .collect();

        let flux = Array2::from_shape_fn((narch, nwave), |(i, k)| file.flux[i][k]);

        Ok(Self {
            class,
            version: file.version,
            wave,
            flux,
            subtypes,
            full_types,
            interpolants,
            subtype_to_index,
        })
    }

    /// Spectral class of every archetype in this store
    #[must_use]
    pub fn class(&self) -> &SpectralClass {
        &self.class
    }

    /// Provenance string from the template file
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Rest-frame wavelength grid
    #[must_use]
    pub fn wave(&self) -> &[f64] {
        &self.wave
    }

    /// `narch × nwave` rest-frame fluxes
    #[must_use]
    pub fn flux(&self) -> &Array2<f64> {
        &self.flux
    }

    /// Number of archetypes
    #[must_use]
    pub fn narch(&self) -> usize {
        self.subtypes.len()
    }

    /// Number of wavelength samples
    #[must_use]
    pub fn nwave(&self) -> usize {
        self.wave.len()
    }

    /// Unique subtype labels (`{raw}_{index}`)
    #[must_use]
    pub fn subtypes(&self) -> &[String] {
        &self.subtypes
    }

    #[must_use]
    pub fn full_types(&self) -> &[FullType] {
        &self.full_types
    }

    #[must_use]
    pub fn full_type(&self, index: usize) -> Option<&FullType> {
        self.full_types.get(index)
    }

    /// Row index of a unique subtype label
    #[must_use]
    pub fn index_of(&self, subtype: &str) -> Option<usize> {
        self.subtype_to_index.get(subtype).copied()
    }

    fn check_index(&self, index: usize) -> Result<(), ArchetypeError> {
        if index < self.narch() {
            Ok(())
        } else {
            Err(ArchetypeError::IndexOutOfRange {
                index,
                narch: self.narch(),
            })
        }
    }

    fn template_row(&self, index: usize) -> Cow<'_, [f64]> {
        let row = self.flux.row(index);
        match row.to_slice() {
            Some(slice) => Cow::Borrowed(slice),
            None => Cow::Owned(row.to_vec()),
        }
    }

    /// Redshifted wavelength grid `(1 + z) * wave`
    fn redshifted_wave(&self, z: f64) -> Vec<f64> {
        self.wave.iter().map(|w| w * (1.0 + z)).collect()
    }

    /// Flux-conserving rebin of archetype `index`, redshifted to `z`, onto
    /// each camera grid.
    ///
    /// # Errors
    ///
    /// Returns an error for an out-of-range index, an invalid redshift, or a
    /// rebinner failure.
    pub fn rebin_exact<R: FluxRebinner + ?Sized>(
        &self,
        index: usize,
        z: f64,
        dwave: &CameraGrids,
        rebinner: &R,
    ) -> Result<CameraFlux, ArchetypeError> {
        self.check_index(index)?;
        check_redshift(z)?;

        let src_wave = self.redshifted_wave(z);
        let src_flux = self.template_row(index);
        dwave
            .iter()
            .map(|(camera, wave)| -> Result<(String, Vec<f64>), ArchetypeError> {
                let binned = rebinner.rebin(&src_wave, &src_flux, wave)?;
                Ok((camera.clone(), binned))
            })
            .collect()
    }

    /// Interpolate archetype `index` at each camera's wavelengths shifted to
    /// the rest frame (`wave / (1 + z)`).
    ///
    /// Cheaper than [`Self::rebin_exact`] but does not conserve flux.
    ///
    /// # Errors
    ///
    /// Returns an error for an out-of-range index or an invalid redshift.
    pub fn rebin_interpolated(
        &self,
        index: usize,
        z: f64,
        dwave: &CameraGrids,
    ) -> Result<CameraFlux, ArchetypeError> {
        self.check_index(index)?;
        check_redshift(z)?;

        let interpolant = &self.interpolants[index];
        Ok(dwave
            .iter()
            .map(|(camera, wave)| {
                let rest = wave.iter().map(|w| w / (1.0 + z));
                (camera.clone(), interpolant.eval_many(rest))
            })
            .collect())
    }

    /// Rebin archetype `index` with the chosen mode
    ///
    /// # Errors
    ///
    /// See [`Self::rebin_exact`] and [`Self::rebin_interpolated`].
    pub fn rebin_template<R: FluxRebinner + ?Sized>(
        &self,
        index: usize,
        z: f64,
        dwave: &CameraGrids,
        mode: RebinMode,
        rebinner: &R,
    ) -> Result<CameraFlux, ArchetypeError> {
        match mode {
            RebinMode::Exact => self.rebin_exact(index, z, dwave, rebinner),
            RebinMode::Interpolated => self.rebin_interpolated(index, z, dwave),
        }
    }

    /// Reconstruct the fitted flux of one archetype on `wave`.
    ///
    /// `coeff[0]` scales the template and `coeff[1..]` weight Legendre
    /// orders in wavelength normalized over the joint span of `dwave`. The
    /// result is divided by `(1 + z)`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSubtype` if no archetype has the label,
    /// `CoefficientMismatch` if `coeff` does not fit `degree`, `EmptyGrids`
    /// if `dwave` has no samples, and redshift or rebin errors.
    #[allow(clippy::too_many_arguments)]
    pub fn evaluate_model<R: FluxRebinner + ?Sized>(
        &self,
        subtype: &str,
        dwave: &CameraGrids,
        coeff: &[f64],
        wave: &[f64],
        z: f64,
        degree: ContinuumDegree,
        rebinner: &R,
    ) -> Result<Vec<f64>, ArchetypeError> {
        check_redshift(z)?;

        let nrows = degree.legendre_rows(coeff);
        let needed = nrows + 1;
        let mismatched = match degree {
            ContinuumDegree::Explicit(_) => coeff.len() != needed,
            ContinuumDegree::InferFromNonzero => coeff.len() < needed,
        };
        if mismatched {
            return Err(ArchetypeError::CoefficientMismatch {
                expected: needed,
                found: coeff.len(),
            });
        }

        let index = self
            .index_of(subtype)
            .ok_or_else(|| ArchetypeError::UnknownSubtype(subtype.to_string()))?;

        let (wave_min, wave_max) = joint_span(dwave.values()).ok_or(ArchetypeError::EmptyGrids)?;
        let legendre = legendre_rows(&normalize_to_span(wave, wave_min, wave_max), nrows);
        let binned = rebinner.rebin(&self.redshifted_wave(z), &self.template_row(index), wave)?;

        Ok(binned
            .iter()
            .enumerate()
            .map(|(j, t)| {
                let continuum: f64 = coeff[1..needed]
                    .iter()
                    .zip(legendre.column(j))
                    .map(|(c, p)| c * p)
                    .sum();
                (coeff[0] * t + continuum) / (1.0 + z)
            })
            .collect())
    }
}

fn check_redshift(z: f64) -> Result<(), ArchetypeError> {
    if is_valid_redshift(z) {
        Ok(())
    } else {
        Err(ArchetypeError::InvalidRedshift(z))
    }
}
