use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::cli::{load_catalog, require_class, OutputFormat};
use crate::core::types::{ContinuumDegree, FullType};
use crate::numeric::rebin::TrapzRebinner;
use crate::parsing::spectra_file::parse_spectra_file;

#[derive(Args)]
pub struct ModelArgs {
    /// Observed spectra; only the camera wavelength grids are used
    #[arg(required = true)]
    pub spectra: PathBuf,

    /// Spectral class (e.g., "GALAXY")
    #[arg(long, required = true)]
    pub class: String,

    /// Redshift
    #[arg(long, required = true, allow_negative_numbers = true)]
    pub z: f64,

    /// Subtype label as reported by `fit` (e.g., "ELG_3")
    #[arg(long, required = true)]
    pub subtype: String,

    /// Template amplitude followed by Legendre coefficients
    #[arg(
        long,
        required = true,
        value_delimiter = ',',
        num_args = 1..,
        allow_negative_numbers = true
    )]
    pub coeff: Vec<f64>,

    /// Number of Legendre terms (defaults to one per extra coefficient)
    #[arg(long, conflicts_with = "infer_degree")]
    pub nleg: Option<usize>,

    /// Infer the number of Legendre terms from the nonzero coefficients
    #[arg(long)]
    pub infer_degree: bool,

    /// Directory of rrarchetype-*.json files
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

#[derive(Serialize)]
struct CameraModel<'a> {
    wave: &'a [f64],
    model: Vec<f64>,
}

/// Execute model subcommand
///
/// # Errors
///
/// Returns an error if the inputs cannot be loaded or the model cannot be
/// evaluated.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ModelArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let spectra = parse_spectra_file(&args.spectra)?;
    let catalog = load_catalog(args.dir.as_deref(), verbose)?;
    let archetype = require_class(&catalog, &args.class)?;

    let degree = if args.infer_degree {
        ContinuumDegree::InferFromNonzero
    } else {
        ContinuumDegree::Explicit(args.nleg.unwrap_or(args.coeff.len().saturating_sub(1)))
    };

    let dwave = spectra.dwave();
    let mut cameras = BTreeMap::new();
    for spectrum in spectra.spectra() {
        let model = archetype.evaluate_model(
            &args.subtype,
            &dwave,
            &args.coeff,
            &spectrum.wave,
            args.z,
            degree,
            &TrapzRebinner,
        )?;
        cameras.insert(
            spectrum.camera.as_str(),
            CameraModel {
                wave: &spectrum.wave,
                model,
            },
        );
    }

    let full_type = FullType::new(archetype.class(), &args.subtype);
    if verbose {
        eprintln!("Evaluated {} on {} cameras", full_type, cameras.len());
    }

    match format {
        OutputFormat::Text | OutputFormat::Tsv => {
            if matches!(format, OutputFormat::Text) {
                println!("Model {} at z = {:.5}\n", full_type, args.z);
            }
            println!("camera\twave\tmodel");
            for (camera, m) in &cameras {
                for (w, f) in m.wave.iter().zip(&m.model) {
                    println!("{camera}\t{w}\t{f}");
                }
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "full_type": full_type,
                "z": args.z,
                "coeff": args.coeff,
                "cameras": cameras,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
