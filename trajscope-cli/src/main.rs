mod export;
mod reports;

use anyhow::{Context, Result, ensure};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use trajscope_core::{AnalyzerConfig, JsonRecordReader, SessionReport, analyze_root};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// One block of fields per episode
    Console,
    /// Structured session and outcome records
    Json,
    /// Per-session tables
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "trajscope", version)]
#[command(
    about = "Reconstruct recorded Procgen sessions and infer per-episode level completion and progress"
)]
struct Args {
    /// Directory of episode trajectories, flat or with timestamped session subdirectories
    #[arg(short, long)]
    input_dir: PathBuf,

    /// Directory to export outcome tables into
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Allow exporting into an output directory that already exists
    #[arg(short, long)]
    force: bool,

    /// Report raw recorded progress for completed levels instead of 100
    #[arg(long)]
    raw_progress: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Analyzer configuration (JSON) overriding reward thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    run(&args)
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn run(args: &Args) -> Result<()> {
    validate_inputs(args)?;
    let config = load_config(args)?;

    if args.report == ReportFormat::Console && args.output.is_none() {
        announce_banner();
    }

    let start_time = Instant::now();
    let reports = analyze_root(&args.input_dir, &JsonRecordReader, &config)
        .with_context(|| format!("failed to analyze {}", args.input_dir.display()))?;

    if let Some(dir) = &args.output_dir {
        let written = export::write_exports(dir, &reports)?;
        for path in written {
            log::info!("exported {}", path.display());
        }
    }

    write_report(args, &reports, start_time)
}

fn validate_inputs(args: &Args) -> Result<()> {
    ensure!(
        args.input_dir.is_dir(),
        "expected input directory {} to exist, but it does not",
        args.input_dir.display()
    );
    if let Some(dir) = &args.output_dir {
        export::ensure_output_dir_available(dir, args.force)?;
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<AnalyzerConfig> {
    let config = match &args.config {
        Some(path) => AnalyzerConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AnalyzerConfig::default(),
    };
    Ok(config.with_saturation(!args.raw_progress))
}

fn announce_banner() {
    println!("{}", "🎮 Trajscope Session Analyzer".bright_cyan().bold());
    println!("{}", "=============================".cyan());
}

fn write_report(args: &Args, reports: &[SessionReport], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    if matches!(output_target, OutputTarget::File(_)) {
        colored::control::set_override(false);
    }

    match args.report {
        ReportFormat::Json => reports::generate_json_report(&mut output_target, reports)?,
        ReportFormat::Markdown => {
            if reports.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Trajectory Session Outcomes\n\n_No sessions found._"
                )?;
            } else {
                reports::generate_markdown_report(&mut output_target, reports)?;
            }
        }
        ReportFormat::Console => {
            if reports.is_empty() {
                writeln!(&mut output_target, "No sessions found.")?;
            } else {
                reports::generate_console_report(
                    &mut output_target,
                    reports,
                    start_time.elapsed(),
                )?;
            }
        }
    }

    output_target
        .flush()
        .context("failed to flush report output")?;
    Ok(())
}

/// Report sink: buffered stdout, or a buffered file when `--output` is given.
enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::Stdout(BufWriter::new(stdout())));
        };
        let file =
            File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
        Ok(Self::File(BufWriter::new(file)))
    }

    fn sink(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(buffered) => buffered,
            Self::File(buffered) => buffered,
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.sink().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.sink().flush()
    }
}
