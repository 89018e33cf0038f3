//! Command-line parsing for the Raman layer analyzer.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fitting/classification code. Flags that also have an environment default
//! are `Option`s here; `app` resolves them.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::LayerLabel;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "raman", version, about = "Graphene layer-count analysis of Raman spectra")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze one spectrum: fit D/G/G′, score against the reference table, print a summary.
    Fit(FitArgs),
    /// Analyze every position of a long-format map export in parallel.
    Map(MapArgs),
    /// Print (or write) the built-in reference table as JSON.
    Reference(ReferenceArgs),
    /// Generate a synthetic spectrum for a reference label.
    Synth(SynthArgs),
}

/// Options shared by `fit` and `map`.
#[derive(Debug, Parser, Clone)]
pub struct AnalysisArgs {
    /// Reference table JSON (defaults to $RAMAN_REFERENCE, then the built-in table).
    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// Iteration budget per peak fit (defaults to $RAMAN_MAX_ITER, then 200).
    #[arg(long = "max-iter")]
    pub max_iter: Option<usize>,
}

#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Spectrum file: two columns (shift, intensity) or one column (shifts then intensities).
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Write the full fit result to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct MapArgs {
    /// Map file with `x, y, shift, intensity` rows.
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Worker threads (defaults to $RAMAN_THREADS, then available parallelism).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Export per-position results to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct ReferenceArgs {
    /// Write to this path instead of stdout.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct SynthArgs {
    /// Reference entry to synthesize.
    #[arg(short = 'l', long, value_enum)]
    pub label: LayerLabel,

    /// Reference table JSON to take the entry from (defaults to the built-in table).
    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// Number of samples between 1200 and 3000 cm⁻¹.
    #[arg(short = 'n', long, default_value_t = 1001)]
    pub points: usize,

    /// Gaussian noise standard deviation (normalized units).
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Random seed for the noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// D band amplitude (normalized units).
    #[arg(long = "d-amplitude", default_value_t = 0.08)]
    pub d_amplitude: f64,

    /// Output CSV (shift, intensity).
    #[arg(short = 'o', long)]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_map_command() {
        let cli = Cli::parse_from([
            "raman", "map", "-i", "map.csv", "--threads", "3", "--max-iter", "50",
        ]);
        let Command::Map(args) = cli.command else {
            panic!("expected map command");
        };
        assert_eq!(args.threads, Some(3));
        assert_eq!(args.analysis.max_iter, Some(50));
        assert!(args.analysis.reference.is_none());
    }

    #[test]
    fn synth_label_uses_kebab_case() {
        let cli = Cli::parse_from(["raman", "synth", "-l", "four-layers", "-o", "out.csv"]);
        let Command::Synth(args) = cli.command else {
            panic!("expected synth command");
        };
        assert_eq!(args.label, LayerLabel::FourLayers);
        assert_eq!(args.points, 1001);
    }
}
