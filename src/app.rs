//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and environment defaults
//! - ingests spectra / maps
//! - runs the analysis pipeline (single spectrum or parallel map)
//! - prints reports and writes optional exports

use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::Parser;
use log::{info, warn};

use crate::classify::{LayerClassifier, ReferenceTable};
use crate::cli::{AnalysisArgs, Command, FitArgs, MapArgs, ReferenceArgs, SynthArgs};
use crate::domain::{FitResult, PeakParameters, RunConfig, SolverOptions, Spectrum};
use crate::error::AppError;

pub mod batch;
pub mod pipeline;

use batch::BatchOptions;
use pipeline::Analyzer;

const ENV_REFERENCE: &str = "RAMAN_REFERENCE";
const ENV_MAX_ITER: &str = "RAMAN_MAX_ITER";
const ENV_THREADS: &str = "RAMAN_THREADS";

/// Entry point for the `raman` binary.
pub fn run() -> Result<(), AppError> {
    // Optional `.env` with RAMAN_* defaults.
    dotenvy::dotenv().ok();

    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Map(args) => handle_map(args),
        Command::Reference(args) => handle_reference(args),
        Command::Synth(args) => handle_synth(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = run_config(&args.input, &args.analysis, None)?;
    let config = RunConfig {
        export_json: args.export_json,
        ..config
    };
    let analyzer = build_analyzer(&config)?;

    let ingest = crate::io::read_spectrum(&config.input)?;
    if !ingest.row_errors.is_empty() {
        warn!(
            "{} of {} rows skipped in '{}'",
            ingest.row_errors.len(),
            ingest.rows_read,
            config.input.display()
        );
    }

    let result = fit_input(&analyzer, &ingest.spectrum, &config.input)?;
    println!(
        "{}",
        crate::report::format_fit_summary(&result, &config.input.display().to_string())
    );

    if let Some(path) = &config.export_json {
        let file = crate::io::FitFile::new(result, Some(config.input.as_path()));
        crate::io::write_fit_json(path, &file)?;
        info!("fit result written to '{}'", path.display());
    }

    Ok(())
}

fn handle_map(args: MapArgs) -> Result<(), AppError> {
    let config = run_config(&args.input, &args.analysis, args.threads)?;
    let config = RunConfig {
        export_csv: args.export,
        ..config
    };
    let analyzer = build_analyzer(&config)?;

    let ingest = crate::io::read_map(&config.input)?;
    if !ingest.row_errors.is_empty() {
        warn!(
            "{} of {} rows skipped in '{}'",
            ingest.row_errors.len(),
            ingest.rows_read,
            config.input.display()
        );
    }
    if ingest.map.is_empty() {
        return Err(AppError::new(
            2,
            format!("No usable positions in '{}'.", config.input.display()),
        ));
    }

    let opts = BatchOptions {
        threads: config.threads,
    };
    let result = analyzer.fit_map(&ingest.map, &opts)?;
    println!(
        "{}",
        crate::report::format_map_summary(
            &result,
            &config.input.display().to_string(),
            ingest.skipped.len()
        )
    );

    if let Some(path) = &config.export_csv {
        crate::io::write_map_csv(path, &result)?;
        info!("map results written to '{}'", path.display());
    }

    Ok(())
}

fn handle_reference(args: ReferenceArgs) -> Result<(), AppError> {
    let table = ReferenceTable::default();
    match &args.output {
        Some(path) => crate::io::write_reference_json(path, &table),
        None => {
            let json = serde_json::to_string_pretty(&table)
                .map_err(|e| AppError::new(4, format!("Failed to serialize reference table: {e}")))?;
            println!("{json}");
            Ok(())
        }
    }
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let table = load_reference(args.reference.as_deref())?;
    let entry = table.get(args.label).ok_or_else(|| {
        AppError::new(
            2,
            format!("Reference table has no entry for '{}'.", args.label),
        )
    })?;

    let defaults = crate::data::SynthOptions::default();
    let opts = crate::data::SynthOptions {
        points: args.points,
        noise: args.noise,
        seed: args.seed,
        d: PeakParameters {
            amplitude: args.d_amplitude,
            ..defaults.d
        },
        ..defaults
    };
    let spectrum = crate::data::synthesize(entry, &opts)?;
    crate::io::write_spectrum_csv(&args.output, &spectrum)?;
    info!(
        "{} synthetic spectrum ({} samples) written to '{}'",
        args.label,
        spectrum.len(),
        args.output.display()
    );
    Ok(())
}

/// Analyze one input spectrum; a failure names the file it came from.
fn fit_input(analyzer: &Analyzer, spectrum: &Spectrum, input: &Path) -> Result<FitResult, AppError> {
    analyzer.fit(spectrum).map_err(|err| {
        let app = AppError::from(err);
        AppError::new(app.exit_code(), format!("'{}': {app}", input.display()))
    })
}

/// Resolve CLI flags against `RAMAN_*` environment defaults (flags win).
pub fn run_config(
    input: &Path,
    analysis: &AnalysisArgs,
    threads: Option<usize>,
) -> Result<RunConfig, AppError> {
    let reference = analysis
        .reference
        .clone()
        .or_else(|| std::env::var_os(ENV_REFERENCE).map(PathBuf::from));

    let max_iterations = match analysis.max_iter {
        Some(n) => Some(n),
        None => parse_env_value(ENV_MAX_ITER, std::env::var(ENV_MAX_ITER).ok())?,
    };
    let threads = match threads {
        Some(n) => Some(n),
        None => parse_env_value(ENV_THREADS, std::env::var(ENV_THREADS).ok())?,
    };

    let defaults = SolverOptions::default();
    let solver = SolverOptions {
        max_iterations: max_iterations.unwrap_or(defaults.max_iterations),
        ..defaults
    };
    if solver.max_iterations == 0 {
        return Err(AppError::new(2, "Iteration budget must be > 0."));
    }
    if threads == Some(0) {
        return Err(AppError::new(2, "Thread count must be > 0."));
    }

    Ok(RunConfig {
        input: input.to_path_buf(),
        reference,
        solver,
        threads,
        export_csv: None,
        export_json: None,
    })
}

fn parse_env_value<T: FromStr>(key: &str, value: Option<String>) -> Result<Option<T>, AppError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|_| AppError::new(2, format!("Invalid value for {key}: '{trimmed}'")))
}

fn load_reference(path: Option<&Path>) -> Result<ReferenceTable, AppError> {
    match path {
        Some(path) => {
            let table = crate::io::read_reference_json(path)?;
            info!(
                "using reference table '{}' ({} entries)",
                path.display(),
                table.len()
            );
            Ok(table)
        }
        None => Ok(ReferenceTable::default()),
    }
}

/// Build the analyzer for a run (reference table + solver options).
pub fn build_analyzer(config: &RunConfig) -> Result<Analyzer, AppError> {
    let table = load_reference(config.reference.as_deref())?;
    Ok(Analyzer::new(LayerClassifier::new(table), config.solver))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_values_parse_or_fail_with_input_code() {
        assert_eq!(parse_env_value::<usize>("K", Some(" 12 ".to_string())).unwrap(), Some(12));
        assert_eq!(parse_env_value::<usize>("K", Some(String::new())).unwrap(), None);
        assert_eq!(parse_env_value::<usize>("K", None).unwrap(), None);

        let err = parse_env_value::<usize>("RAMAN_THREADS", Some("many".to_string())).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("RAMAN_THREADS"));
    }

    #[test]
    fn flags_take_precedence() {
        let analysis = AnalysisArgs {
            reference: Some(PathBuf::from("ref.json")),
            max_iter: Some(25),
        };
        let config = run_config(Path::new("in.csv"), &analysis, Some(3)).unwrap();
        assert_eq!(config.solver.max_iterations, 25);
        assert_eq!(config.threads, Some(3));
        assert_eq!(config.reference, Some(PathBuf::from("ref.json")));
    }

    #[test]
    fn fit_failure_names_the_input() {
        let flat = Spectrum::new(vec![1200.0, 1500.0, 1800.0, 2100.0], vec![5.0; 4]).unwrap();
        let err = fit_input(&Analyzer::default(), &flat, Path::new("maps/flat.csv")).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        let msg = err.to_string();
        assert!(msg.contains("maps/flat.csv"), "{msg}");
        assert!(msg.contains("[background]"), "{msg}");
    }

    #[test]
    fn zero_budget_is_rejected() {
        let analysis = AnalysisArgs {
            reference: None,
            max_iter: Some(0),
        };
        assert_eq!(
            run_config(Path::new("in.csv"), &analysis, Some(1))
                .unwrap_err()
                .exit_code(),
            2
        );
    }
}
