use clap::Parser;
use tracing_subscriber::EnvFilter;

use rr_archetype::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("rr_archetype=debug,info")
    } else {
        EnvFilter::new("rr_archetype=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Catalog(args) => {
            cli::catalog::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Fit(args) => {
            cli::fit::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Model(args) => {
            cli::model::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
