//! pm-build - Build PM documents from markdown
//!
//! Usage:
//!   pm-build -f page.md -o page.json
//!   pm-build -d ./markdowns -o ./pms --report report.json
//!   cat page.md | pm-build > page.json

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser as ClapParser, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};

use mathspm::{BuildOutput, BuildReport, PmBuilder, PmConfig};

#[derive(ValueEnum, Clone, Debug)]
enum ReportFormat {
    /// JSON format
    Json,
    /// Human-readable text
    Text,
}

#[derive(ClapParser)]
#[command(
    version,
    about = "Build PM documents from markdown",
    long_about = "Turns markdown pages into PM documents (JSON).\n\n\
                  If no input file is specified, reads from stdin.\n\
                  If no output file is specified, writes to stdout."
)]
struct Cli {
    /// Input markdown file (reads from stdin if not specified)
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Output JSON file, or output directory in batch mode
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Batch build a directory
    #[arg(short, long, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// File pattern for batch builds
    #[arg(long, default_value = "**/*.md")]
    pattern: String,

    /// TOML configuration with a [pm] table
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Write a build report
    #[arg(long, value_name = "REPORT_FILE")]
    report: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value = "json")]
    report_format: ReportFormat,

    /// Build without writing any document
    #[arg(long)]
    dry_run: bool,

    /// Also log to this file
    #[arg(long, value_name = "LOGFILE")]
    debuglogfile: Option<PathBuf>,

    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

fn init_logger(
    filter_level: log::LevelFilter,
    logfile: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut loggers: Vec<Box<dyn simplelog::SharedLogger>> = vec![simplelog::TermLogger::new(
        filter_level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )];
    if let Some(filename) = logfile {
        loggers.push(simplelog::WriteLogger::new(
            filter_level,
            simplelog::Config::default(),
            File::create(filename)?,
        ));
    }
    simplelog::CombinedLogger::init(loggers)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();
    init_logger(args.verbose.log_level_filter(), args.debuglogfile.as_deref())?;

    let config = match &args.config {
        Some(path) => PmConfig::load(path)?,
        None => PmConfig::default(),
    };
    let builder = PmBuilder::new(config);

    if let Some(ref dir) = args.directory {
        return batch_build(builder, dir, &args);
    }

    let (input_content, origin) = match &args.file {
        Some(path) => (fs::read_to_string(path)?, path.display().to_string()),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            (buffer, "stdin".to_string())
        }
    };

    let BuildOutput { pm, report } = builder.build(&input_content, &origin)?;
    for diagnostic in &report.diagnostics {
        log::warn!("{}", diagnostic);
    }

    if args.dry_run {
        eprintln!("{}", report.to_text());
        return Ok(());
    }

    let json = pm.to_json()?;
    match &args.output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            writer.write_all(json.as_bytes())?;
            writer.flush()?;
            log::info!(
                "built {} -> {} ({} fragments, {} warnings)",
                origin,
                path.display(),
                pm.fragments.len(),
                report.statistics.warning_count
            );
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            writer.write_all(json.as_bytes())?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
    }

    if let Some(report_path) = &args.report {
        write_report(&report, report_path, &args.report_format)?;
        log::info!("report written to {}", report_path.display());
    }

    Ok(())
}

/// What happened to one file of a batch
struct FileOutcome {
    input: PathBuf,
    output: PathBuf,
    result: Result<BuildReport, String>,
}

fn build_file(builder: &PmBuilder, input: &Path, output: &Path, dry_run: bool) -> Result<BuildReport, String> {
    let content = fs::read_to_string(input).map_err(|e| format!("cannot read: {}", e))?;
    let BuildOutput { pm, report } = builder
        .build(&content, &input.display().to_string())
        .map_err(|e| e.to_string())?;
    if !dry_run {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("cannot create {}: {}", parent.display(), e))?;
        }
        let json = pm.to_json().map_err(|e| e.to_string())?;
        fs::write(output, json).map_err(|e| format!("cannot write {}: {}", output.display(), e))?;
    }
    Ok(report)
}

fn batch_build(builder: PmBuilder, dir: &Path, args: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = args
        .output
        .clone()
        .ok_or("Output directory required for batch builds")?;

    let start_time = Instant::now();
    let pattern = format!("{}/{}", dir.display(), args.pattern);
    let entries: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| format!("Invalid pattern: {}", e))?
        .filter_map(|e| e.ok())
        .collect();

    let builder = Arc::new(builder);
    let dry_run = args.dry_run;
    let runtime = tokio::runtime::Runtime::new()?;
    let mut outcomes = runtime.block_on(async {
        let mut tasks = tokio::task::JoinSet::new();
        for input in entries {
            let relative = input.strip_prefix(dir).unwrap_or(&input).with_extension("json");
            let output = output_dir.join(relative);
            let builder = Arc::clone(&builder);
            log::debug!("building {} -> {}", input.display(), output.display());
            tasks.spawn_blocking(move || {
                let result = build_file(&builder, &input, &output, dry_run);
                FileOutcome { input, output, result }
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => log::error!("build task failed: {}", e),
            }
        }
        outcomes
    });
    outcomes.sort_by(|a, b| a.input.cmp(&b.input));

    let duration = start_time.elapsed();
    let batch_report = BatchReport::new(dir, &output_dir, &outcomes, duration.as_millis() as u64);

    for outcome in &outcomes {
        match &outcome.result {
            Ok(report) => {
                for diagnostic in &report.diagnostics {
                    log::warn!("{}: {}", outcome.input.display(), diagnostic);
                }
            }
            Err(e) => log::error!("failed to build {}: {}", outcome.input.display(), e),
        }
    }

    eprintln!("\nBatch Build Summary");
    eprintln!("===================");
    eprintln!("Files processed: {}", batch_report.files_processed);
    eprintln!("Succeeded:       {}", batch_report.files_succeeded);
    eprintln!("Failed:          {}", batch_report.files_failed);
    eprintln!("Total warnings:  {}", batch_report.total_warnings);
    eprintln!("Duration:        {:?}", duration);
    if dry_run {
        eprintln!("\n(Dry run - no files were written)");
    }

    if let Some(report_path) = &args.report {
        let report_content = match args.report_format {
            ReportFormat::Json => serde_json::to_string_pretty(&batch_report)?,
            ReportFormat::Text => batch_report.to_text(),
        };
        fs::write(report_path, report_content)?;
        log::info!("report written to {}", report_path.display());
    }

    if batch_report.files_failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn write_report(report: &BuildReport, path: &Path, format: &ReportFormat) -> Result<(), Box<dyn std::error::Error>> {
    let content = match format {
        ReportFormat::Json => report.to_json()?,
        ReportFormat::Text => report.to_text(),
    };
    fs::write(path, content)?;
    Ok(())
}

#[derive(serde::Serialize)]
struct BatchReport {
    input_directory: String,
    output_directory: String,
    files_processed: usize,
    files_succeeded: usize,
    files_failed: usize,
    total_warnings: usize,
    duration_ms: u64,
    files: Vec<FileReport>,
}

#[derive(serde::Serialize)]
struct FileReport {
    input: String,
    output: String,
    status: String,
    warnings: usize,
    fragments: usize,
    interactions: usize,
    duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl BatchReport {
    fn new(input_dir: &Path, output_dir: &Path, outcomes: &[FileOutcome], duration_ms: u64) -> Self {
        let files: Vec<FileReport> = outcomes
            .iter()
            .map(|outcome| {
                let input = outcome.input.display().to_string();
                let output = outcome.output.display().to_string();
                match &outcome.result {
                    Ok(report) => FileReport {
                        input,
                        output,
                        status: if report.diagnostics.is_empty() {
                            "success".to_string()
                        } else {
                            "success_with_warnings".to_string()
                        },
                        warnings: report.statistics.warning_count,
                        fragments: report.statistics.fragment_total(),
                        interactions: report.statistics.interaction_count,
                        duration_ms: report.duration_ms,
                        error: None,
                    },
                    Err(e) => FileReport {
                        input,
                        output,
                        status: "failed".to_string(),
                        warnings: 0,
                        fragments: 0,
                        interactions: 0,
                        duration_ms: 0,
                        error: Some(e.clone()),
                    },
                }
            })
            .collect();

        let files_failed = files.iter().filter(|f| f.error.is_some()).count();
        Self {
            input_directory: input_dir.display().to_string(),
            output_directory: output_dir.display().to_string(),
            files_processed: files.len(),
            files_succeeded: files.len() - files_failed,
            files_failed,
            total_warnings: files.iter().map(|f| f.warnings).sum(),
            duration_ms,
            files,
        }
    }

    fn to_text(&self) -> String {
        let mut output = String::new();
        output.push_str("Batch Build Report\n");
        output.push_str("==================\n\n");
        output.push_str(&format!("Input:  {}\n", self.input_directory));
        output.push_str(&format!("Output: {}\n\n", self.output_directory));
        output.push_str(&format!("Files processed: {}\n", self.files_processed));
        output.push_str(&format!("Succeeded:       {}\n", self.files_succeeded));
        output.push_str(&format!("Failed:          {}\n", self.files_failed));
        output.push_str(&format!("Total warnings:  {}\n", self.total_warnings));
        output.push_str(&format!("Duration:        {}ms\n\n", self.duration_ms));

        output.push_str("Files:\n");
        for file in &self.files {
            match &file.error {
                Some(e) => output.push_str(&format!("  ✗ {} ({})\n", file.input, e)),
                None => output.push_str(&format!(
                    "  ✓ {} -> {} ({} fragments, {} warnings)\n",
                    file.input, file.output, file.fragments, file.warnings
                )),
            }
        }
        output
    }
}
