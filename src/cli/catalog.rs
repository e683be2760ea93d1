use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::{load_catalog, require_class, OutputFormat};

/// Show at most this many templates unless `--all` is given
const SHOW_LIMIT: usize = 25;

#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommands,
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// List all archetype classes
    List {
        /// Directory of rrarchetype-*.json files
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Show the templates of one class
    Show {
        /// Spectral class (e.g., "GALAXY")
        #[arg(required = true)]
        class: String,

        /// Directory of rrarchetype-*.json files
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Show all templates
        #[arg(long)]
        all: bool,
    },

    /// Export a JSON summary of the catalog
    Export {
        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory of rrarchetype-*.json files
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

/// Execute catalog subcommand
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded or the class is unknown.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: CatalogArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    match args.command {
        CatalogCommands::List { dir } => run_list(dir, format, verbose),
        CatalogCommands::Show { class, dir, all } => run_show(&class, dir, all, format, verbose),
        CatalogCommands::Export { output, dir } => run_export(output, dir, verbose),
    }
}

fn run_list(dir: Option<PathBuf>, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let catalog = load_catalog(dir.as_deref(), verbose)?;
    let summaries = catalog.summaries();

    match format {
        OutputFormat::Text => {
            let class_width = summaries
                .iter()
                .map(|s| s.class.as_str().len())
                .max()
                .unwrap_or(5)
                .max(5);
            let version_width = summaries
                .iter()
                .map(|s| s.version.len())
                .max()
                .unwrap_or(7)
                .max(7);

            println!("Archetype Catalog ({} classes)\n", summaries.len());
            println!(
                "{:<class_w$} {:>10} {:>10} {:<ver_w$}",
                "Class",
                "Templates",
                "Samples",
                "Version",
                class_w = class_width,
                ver_w = version_width
            );
            println!("{}", "-".repeat(class_width + version_width + 23));

            for s in &summaries {
                println!(
                    "{:<class_w$} {:>10} {:>10} {:<ver_w$}",
                    s.class,
                    s.narch,
                    s.nwave,
                    s.version,
                    class_w = class_width,
                    ver_w = version_width
                );
                if verbose {
                    if let Some(source) = &s.source {
                        println!("  └─ File: {}", source.display());
                    }
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        OutputFormat::Tsv => {
            println!("class\tnarch\tnwave\tversion\tsource");
            for s in &summaries {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    s.class,
                    s.narch,
                    s.nwave,
                    s.version,
                    s.source.as_ref().map(|p| p.display().to_string()).unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}

fn run_show(
    class: &str,
    dir: Option<PathBuf>,
    all: bool,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let catalog = load_catalog(dir.as_deref(), verbose)?;
    let archetype = require_class(&catalog, class)?;
    let wave = archetype.wave();
    let (wave_min, wave_max) = (
        wave.first().copied().unwrap_or(f64::NAN),
        wave.last().copied().unwrap_or(f64::NAN),
    );

    match format {
        OutputFormat::Text => {
            println!("Class: {}\n", archetype.class());
            println!("Version:    {}", archetype.version());
            println!("Templates:  {}", archetype.narch());
            println!("Samples:    {}", archetype.nwave());
            println!("Wavelength: {wave_min:.2} - {wave_max:.2}");
            if let Some(source) = catalog.source(archetype.class()) {
                println!("File:       {}", source.display());
            }

            let shown = if all {
                archetype.narch()
            } else {
                archetype.narch().min(SHOW_LIMIT)
            };

            println!("\nTemplates:");
            println!("{:>5} {:<20} Full type", "Index", "Subtype");
            println!("{}", "-".repeat(60));
            for (index, (subtype, full_type)) in archetype
                .subtypes()
                .iter()
                .zip(archetype.full_types())
                .take(shown)
                .enumerate()
            {
                println!("{index:>5} {subtype:<20} {full_type}");
            }

            if shown < archetype.narch() {
                println!(
                    "\n... and {} more templates (use --all to show all)",
                    archetype.narch() - shown
                );
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "class": archetype.class(),
                "version": archetype.version(),
                "narch": archetype.narch(),
                "nwave": archetype.nwave(),
                "wave_min": wave_min,
                "wave_max": wave_max,
                "source": catalog.source(archetype.class()),
                "subtypes": archetype.subtypes(),
                "full_types": archetype.full_types(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("index\tsubtype\tfull_type");
            for (index, (subtype, full_type)) in archetype
                .subtypes()
                .iter()
                .zip(archetype.full_types())
                .enumerate()
            {
                println!("{index}\t{subtype}\t{full_type}");
            }
        }
    }

    Ok(())
}

fn run_export(output: Option<PathBuf>, dir: Option<PathBuf>, verbose: bool) -> anyhow::Result<()> {
    let catalog = load_catalog(dir.as_deref(), verbose)?;
    let json = catalog.summary_json()?;

    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            eprintln!("Exported catalog summary to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
