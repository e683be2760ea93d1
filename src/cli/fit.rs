use std::path::PathBuf;

use clap::Args;

use crate::cli::{load_catalog, require_class, OutputFormat};
use crate::matching::engine::{ArchetypeSelector, BestArchetype, SelectorConfig};
use crate::numeric::legendre::LegendreBasis;
use crate::parsing::spectra_file::parse_spectra_file;
use crate::utils::validation::is_valid_redshift;

#[derive(Args)]
pub struct FitArgs {
    /// Observed spectra (JSON with one entry per camera)
    #[arg(required = true)]
    pub spectra: PathBuf,

    /// Spectral class to fit (e.g., "GALAXY")
    #[arg(long, required = true)]
    pub class: String,

    /// Trial redshift
    #[arg(long, required = true, allow_negative_numbers = true)]
    pub z: f64,

    /// Number of Legendre continuum terms
    #[arg(long, default_value = "3")]
    pub nleg: usize,

    /// Directory of rrarchetype-*.json files
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Scan templates on a single thread
    #[arg(long)]
    pub sequential: bool,

    /// Only scan the first N templates
    #[arg(long)]
    pub max_templates: Option<usize>,
}

/// Execute fit subcommand
///
/// # Errors
///
/// Returns an error if the inputs cannot be loaded or the fit fails.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: FitArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    if !is_valid_redshift(args.z) {
        anyhow::bail!("Invalid redshift {}: must be finite and greater than -1", args.z);
    }

    let spectra = parse_spectra_file(&args.spectra)?;
    if verbose {
        eprintln!(
            "Parsed {} cameras ({} samples) from input",
            spectra.spectra().len(),
            spectra.len()
        );
    }

    let catalog = load_catalog(args.dir.as_deref(), verbose)?;
    let archetype = require_class(&catalog, &args.class)?;

    let legendre = LegendreBasis::for_grids(&spectra.dwave(), args.nleg);
    let config = SelectorConfig {
        parallel: !args.sequential,
        max_templates: args.max_templates,
    };
    let best = ArchetypeSelector::new(archetype)
        .with_config(config)
        .select_best_template(&spectra, args.z, &legendre)?;

    match format {
        OutputFormat::Text => print_text(&args, archetype.subtypes(), &best, verbose),
        OutputFormat::Json => {
            let output = serde_json::json!({
                "class": args.class,
                "z": args.z,
                "nleg": args.nleg,
                "best": best,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("class\tz\tfull_type\tindex\tchi2\tcoeff");
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                args.class,
                args.z,
                best.full_type,
                best.index,
                best.chi2,
                join_coeff(&best.coeff)
            );
        }
    }

    Ok(())
}

fn print_text(args: &FitArgs, subtypes: &[String], best: &BestArchetype, verbose: bool) {
    println!("Best {} archetype at z = {:.5}\n", args.class, args.z);
    println!("Full type:    {}", best.full_type);
    println!("Index:        {}", best.index);
    println!("Chi2:         {:.4}", best.chi2);
    println!("Coefficients: {}", join_coeff(&best.coeff));

    if verbose {
        println!("\nScan:");
        println!("{:>5} {:<20} {:>14}", "Index", "Subtype", "Chi2 (approx)");
        println!("{}", "-".repeat(41));
        for (index, (subtype, chi2)) in subtypes.iter().zip(&best.scan_chi2).enumerate() {
            let marker = if index == best.index { " *" } else { "" };
            println!("{index:>5} {subtype:<20} {chi2:>14.4}{marker}");
        }
    }
}

fn join_coeff(coeff: &[f64]) -> String {
    coeff
        .iter()
        .map(|c| format!("{c:.6}"))
        .collect::<Vec<_>>()
        .join(",")
}
