//! Best-match selection of archetypes.
//!
//! For a spectrum at a fixed redshift, [`ArchetypeSelector`] fits every
//! archetype of a class plus a Legendre continuum and keeps the best one.
//!
//! ## Algorithm
//!
//! 1. **Scan**: every template is rebinned by interpolation and fit; this is
//!    fast and runs in parallel.
//! 2. **Refine**: the template with the lowest chi-square is rebinned with
//!    flux conservation and fit again. Only this refit is reported.
//!
//! Ties in the scan go to the template that comes first in the file.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rr_archetype::{ArchetypeCatalog, ArchetypeSelector, DuplicateClassPolicy, SpectralClass};
//! use rr_archetype::numeric::legendre::LegendreBasis;
//! use rr_archetype::parsing::spectra_file::parse_spectra_file;
//! use std::path::Path;
//!
//! let catalog = ArchetypeCatalog::load(None, DuplicateClassPolicy::default()).unwrap();
//! let galaxy = catalog.get(&SpectralClass::new("GALAXY")).unwrap();
//! let spectra = parse_spectra_file(Path::new("spectra.json")).unwrap();
//! let legendre = LegendreBasis::for_grids(&spectra.dwave(), 3);
//!
//! let best = ArchetypeSelector::new(galaxy)
//!     .select_best_template(&spectra, 0.5, &legendre)
//!     .unwrap();
//! println!("{} chi2={:.2}", best.full_type, best.chi2);
//! ```

pub mod design;
pub mod engine;

pub use engine::{ArchetypeSelector, BestArchetype, SelectError, SelectorConfig};
