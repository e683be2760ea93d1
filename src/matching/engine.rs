use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::core::archetype::{Archetype, ArchetypeError};
use crate::core::spectrum::SpectrumSet;
use crate::core::types::{CameraGrids, FullType, RebinMode, SpectralClass};
use crate::matching::design::{build_design, DesignError};
use crate::numeric::legendre::LegendreBasis;
use crate::numeric::rebin::{FluxRebinner, TrapzRebinner};
use crate::numeric::solver::{ChiSquareSolver, Fit, SolveError, WeightedLeastSquares};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectError {
    #[error("Archetype class {0} has no templates")]
    EmptyArchetype(SpectralClass),

    #[error(transparent)]
    Archetype(#[from] ArchetypeError),

    #[error(transparent)]
    Design(#[from] DesignError),

    #[error("Linear fit failed: {0}")]
    Solve(#[from] SolveError),
}

/// The best archetype of one class for a spectrum at a fixed redshift
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestArchetype {
    /// Chi-square of the refined (flux-conserving) fit
    pub chi2: f64,

    /// Template amplitude followed by the Legendre coefficients
    pub coeff: Vec<f64>,

    /// `{class}:::{subtype}` of the winner
    pub full_type: FullType,

    /// Row of the winner in its archetype store
    pub index: usize,

    /// Approximate chi-square of every scanned template, by row
    pub scan_chi2: Vec<f64>,
}

/// Configuration for the archetype selector
#[derive(Debug, Clone, Copy)]
pub struct SelectorConfig {
    /// Scan templates on the rayon thread pool
    pub parallel: bool,
    /// Only scan the first N templates (time-budgeted runs)
    pub max_templates: Option<usize>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            max_templates: None,
        }
    }
}

/// Picks the best-matching archetype of one class.
///
/// Every template is first fit using cheap interpolation; the template with
/// the lowest chi-square is then refit with flux-conserving rebinning and
/// that refit is what gets reported.
pub struct ArchetypeSelector<'a, S = WeightedLeastSquares, R = TrapzRebinner> {
    archetype: &'a Archetype,
    solver: S,
    rebinner: R,
    config: SelectorConfig,
}

impl<'a> ArchetypeSelector<'a> {
    /// Create a selector with the bundled solver and rebinner
    #[must_use]
    pub fn new(archetype: &'a Archetype) -> Self {
        Self {
            archetype,
            solver: WeightedLeastSquares::default(),
            rebinner: TrapzRebinner,
            config: SelectorConfig::default(),
        }
    }
}

impl<'a, S: ChiSquareSolver, R: FluxRebinner> ArchetypeSelector<'a, S, R> {
    /// Create a selector around caller-provided numerical primitives
    pub fn with_parts(archetype: &'a Archetype, solver: S, rebinner: R, config: SelectorConfig) -> Self {
        Self {
            archetype,
            solver,
            rebinner,
            config,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: SelectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Rebin one template, build its design bundle and solve
    fn fit_template(
        &self,
        index: usize,
        z: f64,
        spectra: &SpectrumSet,
        dwave: &CameraGrids,
        legendre: &LegendreBasis,
        mode: RebinMode,
    ) -> Result<Fit, SelectError> {
        let binned = self
            .archetype
            .rebin_template(index, z, dwave, mode, &self.rebinner)?;
        let tdata = build_design(&binned, legendre)?;
        Ok(self.solver.solve(spectra, &tdata)?)
    }

    /// Fit every scanned template with the interpolating rebin.
    ///
    /// Results are in row order. When several templates fail, the error of
    /// the lowest row is returned.
    ///
    /// # Errors
    ///
    /// Returns the first rebin, design or solver error by row.
    pub fn scan(
        &self,
        spectra: &SpectrumSet,
        z: f64,
        legendre: &LegendreBasis,
    ) -> Result<Vec<Fit>, SelectError> {
        let dwave = spectra.dwave();
        let count = self
            .config
            .max_templates
            .map_or(self.archetype.narch(), |cap| cap.min(self.archetype.narch()));

        let fit = |index| {
            self.fit_template(index, z, spectra, &dwave, legendre, RebinMode::Interpolated)
        };
        let fits: Vec<Result<Fit, SelectError>> = if self.config.parallel {
            (0..count).into_par_iter().map(fit).collect()
        } else {
            (0..count).map(fit).collect()
        };
        fits.into_iter().collect()
    }

    /// Find the best archetype for `spectra` at redshift `z`.
    ///
    /// `legendre` holds the continuum basis evaluated on each camera grid of
    /// `spectra` and is shared by every template.
    ///
    /// # Errors
    ///
    /// Returns `EmptyArchetype` if there is nothing to scan, otherwise
    /// propagates rebin, design and solver errors unchanged.
    pub fn select_best_template(
        &self,
        spectra: &SpectrumSet,
        z: f64,
        legendre: &LegendreBasis,
    ) -> Result<BestArchetype, SelectError> {
        let empty = || SelectError::EmptyArchetype(self.archetype.class().clone());
        if self.archetype.narch() == 0 || self.config.max_templates == Some(0) {
            return Err(empty());
        }

        debug!(
            class = %self.archetype.class(),
            narch = self.archetype.narch(),
            z,
            "Scanning archetypes"
        );

        let scan_chi2: Vec<f64> = self
            .scan(spectra, z, legendre)?
            .into_iter()
            .map(|fit| fit.chi2)
            .collect();
        let index = stable_argmin(&scan_chi2).ok_or_else(empty)?;

        let refined = self.fit_template(
            index,
            z,
            spectra,
            &spectra.dwave(),
            legendre,
            RebinMode::Exact,
        )?;
        let full_type = self
            .archetype
            .full_type(index)
            .cloned()
            .ok_or_else(empty)?;

        debug!(
            full_type = %full_type,
            scan_chi2 = scan_chi2[index],
            chi2 = refined.chi2,
            "Selected archetype"
        );

        Ok(BestArchetype {
            chi2: refined.chi2,
            coeff: refined.coeff,
            full_type,
            index,
            scan_chi2,
        })
    }
}

/// Index of the smallest value; ties go to the lowest index and NaN never
/// beats a number.
#[must_use]
pub fn stable_argmin(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        let v = if v.is_nan() { f64::INFINITY } else { v };
        match best {
            Some((_, b)) if v >= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::spectrum::Spectrum;
    use crate::numeric::legendre::{legendre_rows, normalize_to_span};
    use crate::parsing::archetype_file::ArchetypeFile;
    use crate::utils::validation::{count_to_f64, joint_span};
    use std::collections::BTreeMap;

    const CENTERS: [f64; 3] = [3950.0, 4050.0, 4150.0];

    fn bump(w: f64, center: f64) -> f64 {
        1.0 + 5.0 * (-((w - center) / 5.0).powi(2)).exp()
    }

    /// Archetypes with a single emission bump at different wavelengths
    fn make_archetype(centers: &[f64]) -> Archetype {
        let wave: Vec<f64> = (0..500).map(|k| 3800.0 + f64::from(k)).collect();
        Archetype::from_file(ArchetypeFile {
            rrtype: "GALAXY".to_string(),
            version: "test".to_string(),
            crval1: 3800.0,
            cdelt1: 1.0,
            loglam: false,
            subtypes: centers.iter().map(|_| "BUMP".to_string()).collect(),
            flux: centers
                .iter()
                .map(|&c| wave.iter().map(|&w| bump(w, c)).collect())
                .collect(),
        })
        .unwrap()
    }

    fn grid(start: f64, step: f64, n: u32) -> Vec<f64> {
        (0..n).map(|k| start + step * f64::from(k)).collect()
    }

    /// Two cameras observing archetype `truth` at `z` with a small ripple
    fn observe(archetype: &Archetype, truth: usize, z: f64) -> SpectrumSet {
        let mut dwave = CameraGrids::new();
        dwave.insert("b".to_string(), grid(3900.0 * (1.0 + z), 1.7, 100));
        dwave.insert("r".to_string(), grid(4075.0 * (1.0 + z), 1.7, 70));
        let binned = archetype
            .rebin_exact(truth, z, &dwave, &TrapzRebinner)
            .unwrap();

        let spectra = dwave
            .iter()
            .map(|(camera, wave)| {
                let flux = binned[camera]
                    .iter()
                    .enumerate()
                    .map(|(j, t)| {
                        let ripple = 0.05 * (1.3 * count_to_f64(j)).sin();
                        2.0 * t + 0.3 + ripple
                    })
                    .collect();
                Spectrum::new(camera.clone(), wave.clone(), flux, vec![1.0; wave.len()])
            })
            .collect();
        SpectrumSet::new(spectra).unwrap()
    }

    #[test]
    fn test_selects_true_archetype() {
        let archetype = make_archetype(&CENTERS);
        let z = 0.1;
        let spectra = observe(&archetype, 1, z);
        let legendre = LegendreBasis::for_grids(&spectra.dwave(), 3);

        let best = ArchetypeSelector::new(&archetype)
            .select_best_template(&spectra, z, &legendre)
            .unwrap();

        assert_eq!(best.index, 1);
        assert_eq!(best.full_type.as_str(), "GALAXY:::BUMP_1");
        assert_eq!(best.coeff.len(), 4);
        assert_eq!(best.scan_chi2.len(), 3);
        assert!((best.coeff[0] - 2.0).abs() < 0.05);
    }

    #[test]
    fn test_externally_built_legendre_rows() {
        let archetype = make_archetype(&CENTERS);
        let z = 0.1;
        let spectra = observe(&archetype, 1, z);
        let dwave = spectra.dwave();

        let (lo, hi) = joint_span(dwave.values()).unwrap();
        let rows: BTreeMap<String, _> = dwave
            .iter()
            .map(|(camera, wave)| {
                (camera.clone(), legendre_rows(&normalize_to_span(wave, lo, hi), 3))
            })
            .collect();
        let external = LegendreBasis::from_rows(rows);
        assert_eq!(external.nleg(), 3);

        let selector = ArchetypeSelector::new(&archetype);
        let from_rows = selector.select_best_template(&spectra, z, &external).unwrap();
        let for_grids = selector
            .select_best_template(&spectra, z, &LegendreBasis::for_grids(&dwave, 3))
            .unwrap();

        assert_eq!(from_rows.index, 1);
        assert_eq!(from_rows, for_grids);
    }

    #[test]
    fn test_refit_uses_exact_rebinning() {
        let archetype = make_archetype(&CENTERS);
        let z = 0.1;
        let spectra = observe(&archetype, 2, z);
        let legendre = LegendreBasis::for_grids(&spectra.dwave(), 3);
        let selector = ArchetypeSelector::new(&archetype);

        let best = selector.select_best_template(&spectra, z, &legendre).unwrap();
        let approximate = selector
            .fit_template(2, z, &spectra, &spectra.dwave(), &legendre, RebinMode::Interpolated)
            .unwrap();
        let exact = selector
            .fit_template(2, z, &spectra, &spectra.dwave(), &legendre, RebinMode::Exact)
            .unwrap();

        assert_eq!(best.scan_chi2[2], approximate.chi2);
        assert_eq!(best.chi2, exact.chi2);
        assert_eq!(best.coeff, exact.coeff);
        assert!((best.chi2 - approximate.chi2).abs() > 1e-9);
    }

    #[test]
    fn test_single_archetype_always_wins() {
        let archetype = make_archetype(&[4050.0]);
        for z in [0.0, 0.3, 1.5] {
            let mut spectra = Vec::new();
            let wave = grid(3950.0 * (1.0 + z), 2.5 * (1.0 + z), 80);
            let flux = wave.iter().map(|w| 1.0 + 1e-4 * w).collect();
            spectra.push(Spectrum::new("b", wave.clone(), flux, vec![1.0; wave.len()]));
            let spectra = SpectrumSet::new(spectra).unwrap();
            let legendre = LegendreBasis::for_grids(&spectra.dwave(), 2);

            let best = ArchetypeSelector::new(&archetype)
                .select_best_template(&spectra, z, &legendre)
                .unwrap();
            assert_eq!(best.index, 0);
            assert_eq!(best.full_type.as_str(), "GALAXY:::BUMP_0");
        }
    }

    #[test]
    fn test_ties_go_to_lowest_index() {
        let archetype = make_archetype(&[4050.0, 4050.0, 4050.0]);
        let spectra = observe(&archetype, 2, 0.05);
        let legendre = LegendreBasis::for_grids(&spectra.dwave(), 2);

        let best = ArchetypeSelector::new(&archetype)
            .select_best_template(&spectra, 0.05, &legendre)
            .unwrap();
        assert_eq!(best.index, 0);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let archetype = make_archetype(&CENTERS);
        let spectra = observe(&archetype, 0, 0.2);
        let legendre = LegendreBasis::for_grids(&spectra.dwave(), 3);

        let parallel = ArchetypeSelector::new(&archetype)
            .select_best_template(&spectra, 0.2, &legendre)
            .unwrap();
        let sequential = ArchetypeSelector::new(&archetype)
            .with_config(SelectorConfig {
                parallel: false,
                max_templates: None,
            })
            .select_best_template(&spectra, 0.2, &legendre)
            .unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_max_templates_scans_a_prefix() {
        let archetype = make_archetype(&CENTERS);
        let spectra = observe(&archetype, 2, 0.1);
        let legendre = LegendreBasis::for_grids(&spectra.dwave(), 3);

        let best = ArchetypeSelector::new(&archetype)
            .with_config(SelectorConfig {
                parallel: true,
                max_templates: Some(2),
            })
            .select_best_template(&spectra, 0.1, &legendre)
            .unwrap();
        assert_eq!(best.scan_chi2.len(), 2);
        assert!(best.index < 2);
    }

    #[test]
    fn test_empty_archetype_is_an_error() {
        let archetype = make_archetype(&[]);
        let spectra = observe(&make_archetype(&CENTERS), 0, 0.1);
        let legendre = LegendreBasis::for_grids(&spectra.dwave(), 1);

        let result = ArchetypeSelector::new(&archetype).select_best_template(&spectra, 0.1, &legendre);
        assert_eq!(
            result,
            Err(SelectError::EmptyArchetype(SpectralClass::new("GALAXY")))
        );
    }

    #[test]
    fn test_missing_legendre_camera() {
        let archetype = make_archetype(&CENTERS);
        let spectra = observe(&archetype, 0, 0.1);
        let legendre = LegendreBasis::default();

        let result = ArchetypeSelector::new(&archetype).select_best_template(&spectra, 0.1, &legendre);
        assert!(matches!(
            result,
            Err(SelectError::Design(DesignError::MissingLegendre(_)))
        ));
    }

    #[test]
    fn test_stable_argmin() {
        assert_eq!(stable_argmin(&[3.0, 1.0, 1.0, 2.0]), Some(1));
        assert_eq!(stable_argmin(&[f64::NAN, 2.0]), Some(1));
        assert_eq!(stable_argmin(&[f64::NAN]), Some(0));
        assert_eq!(stable_argmin(&[]), None);
    }
}
