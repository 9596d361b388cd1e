mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "filament", about = "Extensional rheology from filament thinning videos")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse every experiment/background pair in a folder
    Run(commands::run::RunArgs),
    /// Analyse a single experiment video against a background video
    Analyze(commands::analyze::AnalyzeArgs),
    /// Fit a saved diameter series
    Fit(commands::fit::FitArgs),
    /// Print or save the default configuration
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Run(args) => commands::run::run(args, cli.verbose),
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Fit(args) => commands::fit::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::threshold_method;
    use filament_core::binarize::ThresholdMethod;

    #[test]
    fn fixed_threshold_reads_its_value() {
        let cli = Cli::try_parse_from([
            "filament",
            "run",
            "videos",
            "--threshold",
            "fixed",
            "--threshold-value",
            "0.3",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        let method = threshold_method(args.threshold.as_ref().unwrap(), args.threshold_value);
        assert_eq!(method.unwrap(), ThresholdMethod::Fixed(0.3));
    }

    #[test]
    fn fixed_threshold_without_value_is_rejected() {
        assert!(Cli::try_parse_from(["filament", "run", "videos", "--threshold", "fixed"]).is_err());
    }
}
