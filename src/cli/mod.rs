//! Command-line interface for rr-archetype.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **catalog**: List the archetype classes or show the templates of one
//! - **fit**: Find the best archetype of a class for observed spectra
//! - **model**: Evaluate one archetype plus continuum on the observed grids
//!
//! ## Usage
//!
//! ```text
//! # List archetype classes from the packaged directory
//! rr-archetype catalog list
//!
//! # Use another directory of rrarchetype-*.json files
//! RR_ARCHETYPE_DIR=/data/archetypes rr-archetype catalog list
//!
//! # Best galaxy archetype at z = 0.8, JSON output
//! rr-archetype fit spectra.json --class GALAXY --z 0.8 --format json
//!
//! # Evaluate a fitted model
//! rr-archetype model spectra.json --class GALAXY --z 0.8 --subtype ELG_3 --coeff 1.2,0.1,-0.02
//! ```

use std::path::Path;

use clap::{Parser, Subcommand};

use crate::catalog::store::{ArchetypeCatalog, DuplicateClassPolicy};
use crate::core::archetype::Archetype;
use crate::core::types::SpectralClass;

pub mod catalog;
pub mod fit;
pub mod model;

#[derive(Parser)]
#[command(name = "rr-archetype")]
#[command(author = "Redrock Developers")]
#[command(version)]
#[command(about = "Fit spectral archetypes to redshifted spectra")]
#[command(
    long_about = "rr-archetype fits rest-frame archetype spectra to observed multi-camera spectra at a trial redshift.\n\nArchetype files (rrarchetype-*.json) are read from --dir, $RR_ARCHETYPE_DIR, or the packaged archetypes directory, in that order."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect the archetype catalog
    Catalog(catalog::CatalogArgs),

    /// Find the best archetype of a class for a spectrum
    Fit(fit::FitArgs),

    /// Evaluate one archetype model on the spectrum's cameras
    Model(model::ModelArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Load the catalog, rejecting duplicated classes
fn load_catalog(dir: Option<&Path>, verbose: bool) -> anyhow::Result<ArchetypeCatalog> {
    let catalog = ArchetypeCatalog::load(dir, DuplicateClassPolicy::Reject)?;
    if verbose {
        eprintln!("Loaded archetypes for {} classes", catalog.len());
    }
    Ok(catalog)
}

/// Look up one class, listing the available ones when it is missing
fn require_class<'a>(catalog: &'a ArchetypeCatalog, class: &str) -> anyhow::Result<&'a Archetype> {
    catalog.get(&SpectralClass::new(class)).ok_or_else(|| {
        let available: Vec<_> = catalog.classes().map(SpectralClass::as_str).collect();
        anyhow::anyhow!(
            "No archetypes for class '{}'. Available: {}",
            class,
            if available.is_empty() {
                "(none)".to_string()
            } else {
                available.join(", ")
            }
        )
    })
}
