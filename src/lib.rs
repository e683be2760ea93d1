//! # rr-archetype
//!
//! Archetype fitting for redshift measurement of astronomical spectra.
//!
//! An archetype is a rest-frame template spectrum representative of a class
//! of objects (galaxies, stars, quasars). At a trial redshift, each archetype
//! is shifted onto the observed camera grids, a smooth Legendre continuum is
//! added, and the combination is fit by weighted least squares. The archetype
//! with the lowest chi-square wins.
//!
//! ## Features
//!
//! - **Template store**: archetypes of one class with prebuilt interpolants
//! - **Two rebinning modes**: fast interpolation and flux-conserving rebinning
//! - **Two-pass selection**: parallel approximate scan, exact refit of the winner
//! - **Model evaluation**: template plus continuum on any camera layout
//! - **Discovery**: explicit directory, environment override, packaged files
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
//! let spectra = parse_spectra_file(Path::new("spectra.json")).unwrap();
//! let legendre = LegendreBasis::for_grids(&spectra.dwave(), 3);
//!
//! for (class, archetype) in catalog.iter() {
//!     let best = ArchetypeSelector::new(archetype)
//!         .select_best_template(&spectra, 1.2, &legendre)
//!         .unwrap();
//!     println!("{class}: {} chi2={:.1}", best.full_type, best.chi2);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Template store, spectra and label types
//! - [`numeric`]: Legendre basis, flux-conserving rebinning, least squares
//! - [`matching`]: Design matrices and the best-match selector
//! - [`catalog`]: Archetype file discovery and the class catalog
//! - [`parsing`]: Archetype and spectra file parsers
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod core;
pub mod matching;
pub mod numeric;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::store::{ArchetypeCatalog, CatalogError, DuplicateClassPolicy};
pub use core::archetype::{Archetype, ArchetypeError};
pub use core::spectrum::{Spectrum, SpectrumSet};
pub use core::types::*;
pub use matching::engine::{ArchetypeSelector, BestArchetype, SelectError, SelectorConfig};
