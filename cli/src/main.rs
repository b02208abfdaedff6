use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use window_sweep_core::{SweepAnalysis, SweepTables, validate_sweep};
use window_sweep_parser::output::{
    OutputFormat, format_analysis, format_run_report, format_validation,
};
use window_sweep_parser::report::ParseRunReport;
use window_sweep_parser::tables::{read_tables, write_tables};
use window_sweep_parser::{ParseOptions, SweepConfig, parse_sweep_file};

#[derive(Debug, Parser)]
#[command(name = "sweep-report", version)]
#[command(about = "Parse, validate and analyze window-size cross-validation sweeps")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse sweep output files into CSV tables and a run report.
    Parse(ParseArgs),
    /// Cross-check the tables of one sweep for consistency.
    Validate(ValidateArgs),
    /// Print derived statistics for one sweep.
    Analyze(AnalyzeArgs),
}

/// Where the tables of a single sweep come from.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct SourceArgs {
    /// Raw sweep output to parse.
    #[arg(long)]
    input: Option<PathBuf>,
    /// Directory of previously exported CSV tables.
    #[arg(long)]
    tables: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Sweep output files (repeat for several; parsed in parallel).
    #[arg(long, required = true)]
    input: Vec<PathBuf>,
    /// Output directory; one subdirectory per input when several are given.
    #[arg(long)]
    output: PathBuf,
    /// YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Summary printed to stdout.
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
    /// Number of parallel parse jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
    /// Write the report here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Length of the worst / most window-sensitive video lists.
    #[arg(long)]
    top: Option<usize>,
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::Validate(args) => run_validate(args),
        Command::Analyze(args) => run_analyze(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<SweepConfig, String> {
    match path {
        Some(path) => SweepConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display())),
        None => Ok(SweepConfig::default()),
    }
}

fn load_tables(source: &SourceArgs, options: &ParseOptions) -> Result<SweepTables, String> {
    if let Some(input) = &source.input {
        let (_, parse) = parse_sweep_file(input, options).map_err(|e| e.to_string())?;
        for warning in parse.diagnostics.warnings() {
            warn!(input = %input.display(), "{warning}");
        }
        return Ok(parse.tables);
    }
    match &source.tables {
        Some(dir) => read_tables(dir).map_err(|e| e.to_string()),
        None => Err("Specify either --input or --tables".to_string()),
    }
}

fn write_output(path: &Path, raw: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                format!(
                    "Failed to create output directory '{}': {err}",
                    parent.display()
                )
            })?;
        }
    }
    fs::write(path, raw).map_err(|err| format!("Failed to write '{}': {err}", path.display()))
}

// ---------------------------------------------------------------------------
// parse command
// ---------------------------------------------------------------------------

fn run_parse(args: ParseArgs) -> Result<(), String> {
    use rayon::prelude::*;

    let config = load_config(args.config.as_deref())?;
    let options = config.parse_options();
    let targets = output_dirs(&args.input, &args.output)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs.unwrap_or(0))
        .build()
        .map_err(|e| format!("Failed to create thread pool: {e}"))?;

    let outcomes: Vec<Result<ParseRunReport, String>> = pool.install(|| {
        targets
            .par_iter()
            .map(|(input, dir)| parse_one(input, dir, &options))
            .collect()
    });

    let total = outcomes.len();
    let mut failed = 0usize;
    for (outcome, (input, dir)) in outcomes.into_iter().zip(&targets) {
        match outcome {
            Ok(report) => {
                info!(input = %input.display(), output = %dir.display(), "Parsed sweep");
                print!("{}", format_run_report(&report, args.format)?);
            }
            Err(err) => {
                failed += 1;
                eprintln!("{}: {err}", input.display());
            }
        }
    }

    if failed > 0 {
        return Err(format!("{failed} of {total} input(s) failed"));
    }
    Ok(())
}

/// Pairs each input with its output directory. A single input writes
/// straight into `output`; several inputs get one subdirectory per file stem.
fn output_dirs(inputs: &[PathBuf], output: &Path) -> Result<Vec<(PathBuf, PathBuf)>, String> {
    if let [input] = inputs {
        return Ok(vec![(input.clone(), output.to_path_buf())]);
    }

    let mut seen = BTreeSet::new();
    let mut targets = Vec::with_capacity(inputs.len());
    for input in inputs {
        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| format!("Input '{}' has no file name", input.display()))?;
        if !seen.insert(stem.clone()) {
            return Err(format!(
                "Several inputs share the file stem '{stem}'; their outputs would collide"
            ));
        }
        targets.push((input.clone(), output.join(stem)));
    }
    Ok(targets)
}

fn parse_one(input: &Path, dir: &Path, options: &ParseOptions) -> Result<ParseRunReport, String> {
    let (text, parse) = parse_sweep_file(input, options).map_err(|e| e.to_string())?;
    for warning in parse.diagnostics.warnings() {
        warn!(input = %input.display(), "{warning}");
    }

    write_tables(dir, &parse.tables).map_err(|e| e.to_string())?;

    let report = ParseRunReport::new(&input.display().to_string(), &text, &parse);
    report.write_json(dir).map_err(|e| e.to_string())?;

    Ok(report)
}

// ---------------------------------------------------------------------------
// validate command
// ---------------------------------------------------------------------------

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let tables = load_tables(&args.source, &config.parse_options())?;

    let report = validate_sweep(&tables, &config.validation_options());
    let raw = format_validation(&report, args.format)?;

    match &args.output {
        Some(path) => {
            write_output(path, &raw)?;
            println!("Wrote validation report to '{}'.", path.display());
        }
        None => print!("{raw}"),
    }

    if report.passed {
        info!("All validation checks passed");
        Ok(())
    } else {
        Err(format!(
            "validation failed with {} discrepancy(ies)",
            report.discrepancies.len()
        ))
    }
}

// ---------------------------------------------------------------------------
// analyze command
// ---------------------------------------------------------------------------

fn run_analyze(args: AnalyzeArgs) -> Result<(), String> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(top) = args.top {
        config.analysis.top_n = top;
        config.validate().map_err(|e| e.to_string())?;
    }

    let tables = load_tables(&args.source, &config.parse_options())?;
    if tables.videos.is_empty() {
        return Err("No video results to analyze".to_string());
    }

    let analysis = SweepAnalysis::from_tables(&tables, config.analysis.top_n);
    print!("{}", format_analysis(&analysis, args.format)?);
    Ok(())
}
