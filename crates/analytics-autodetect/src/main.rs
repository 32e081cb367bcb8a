//! CLI entry point for the statistics auto-detection engine.

use analytics_autodetect::reporting::{AnalysisReport, ErrorResponse, format_response};
use analytics_autodetect::{
    AnalysisError, AnalysisRequest, AnalysisType, CoordinatedResult, ReportGenerator,
    UnifiedCoordinator, VariableMetadata, input,
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// CLI-compatible analysis type enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliAnalysisType {
    /// Pick modules from the data and goals
    Auto,
    /// Run every module
    Comprehensive,
    /// Descriptive statistics only
    Descriptive,
    /// Hypothesis tests and models only
    Inferential,
    /// Free-text analysis only
    Qualitative,
}

impl From<CliAnalysisType> for AnalysisType {
    fn from(cli: CliAnalysisType) -> Self {
        match cli {
            CliAnalysisType::Auto => AnalysisType::Auto,
            CliAnalysisType::Comprehensive => AnalysisType::Comprehensive,
            CliAnalysisType::Descriptive => AnalysisType::Descriptive,
            CliAnalysisType::Inferential => AnalysisType::Inferential,
            CliAnalysisType::Qualitative => AnalysisType::Qualitative,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Statistical analysis recommendations for tabular datasets",
    long_about = "Profiles a CSV file and recommends descriptive, inferential and \
                  qualitative analyses.\n\n\
                  EXAMPLES:\n  \
                  # Let the engine pick the modules\n  \
                  analytics-autodetect -i survey.csv\n\n  \
                  # State what you want to find out\n  \
                  analytics-autodetect -i survey.csv --goal \"compare satisfaction by team\"\n\n  \
                  # Machine-readable output\n  \
                  analytics-autodetect -i survey.csv --json | jq .modules_used"
)]
struct Args {
    /// Path to the CSV file to analyze
    #[arg(short, long)]
    input: String,

    /// Which analysis modules to run
    #[arg(long, value_enum, default_value = "auto")]
    analysis_type: CliAnalysisType,

    /// Analysis goal in free text (repeatable)
    ///
    /// Goals never change scores; they mark aligned methods and can enable
    /// group comparisons
    #[arg(long = "goal")]
    goals: Vec<String>,

    /// JSON file with variable type overrides: [{"name": ..., "type": ...}]
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only outputs the final JSON response.
    #[arg(long)]
    json: bool,

    /// Write a detailed JSON report to the output directory
    ///
    /// The report will be saved as <input_name>_analysis.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Output directory for reports
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only show warnings and the final result
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    match run(&args) {
        Ok(result) => handle_output(&result, &args),
        Err(e) if args.json => {
            println!("{}", serde_json::to_string_pretty(&ErrorResponse::from(&e))?);
            Err(anyhow!("Analysis failed: {}", e))
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            Err(anyhow!("Analysis failed: {}", e))
        }
    }
}

fn load_metadata(path: &Path) -> analytics_autodetect::AnalysisResult<Vec<VariableMetadata>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn run(args: &Args) -> analytics_autodetect::AnalysisResult<CoordinatedResult> {
    let data = input::load_csv(&args.input)?;

    let metadata = match &args.metadata {
        Some(path) => Some(load_metadata(path).map_err(|e| {
            AnalysisError::InvalidInput(format!(
                "could not read metadata {}: {}",
                path.display(),
                e
            ))
        })?),
        None => None,
    };

    let coordinator = UnifiedCoordinator::builder()
        .build()
        .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;

    let mut request = AnalysisRequest::new(&data).analysis_type(args.analysis_type.into());
    if let Some(metadata) = metadata.as_deref() {
        request = request.variable_metadata(metadata);
    }
    if !args.goals.is_empty() {
        request = request.goals(&args.goals);
    }

    coordinator.analyze(request)
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

/// Output behavior:
/// - Default: human-readable report on stdout
/// - `--json`: JSON response on stdout only
/// - `--emit-report`: additionally write the JSON report to a file
fn handle_output(result: &CoordinatedResult, args: &Args) -> Result<()> {
    let response = format_response(result);

    if args.emit_report {
        let generator = ReportGenerator::new(PathBuf::from(&args.output));
        let report = AnalysisReport::new(&args.input, result.clone());
        let report_path = generator
            .write_report_to_file(&report, &extract_file_stem(&args.input))
            .context("Failed to write report")?;
        info!("Report written to: {}", report_path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("{}", response.report);
    if !args.emit_report {
        println!("Use --emit-report to save the full JSON report");
    }

    Ok(())
}
