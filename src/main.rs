use assetsweep::config::Config;
use assetsweep::delete::SafeDeleter;
use assetsweep::report::{ReportFormat, Reporter};
use assetsweep::scan::{ScanOrchestrator, ScanPhase, ScanProgress, ScanSession};
use assetsweep::watch::FileWatcher;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// assetsweep - Find images and effect files no effect container references
#[derive(Parser, Debug, Clone)]
#[command(name = "assetsweep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the project directory to scan
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Patterns to exclude (can be specified multiple times)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Patterns to retain - never report as unused (can be specified multiple times)
    #[arg(short, long)]
    retain: Vec<String>,

    /// Candidate asset extensions (comma-separated, e.g. "png,dds,efkmat")
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    ext: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file (for json format)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Analyze containers in parallel
    #[arg(long)]
    parallel: bool,

    /// Worker threads for parallel analysis (0 = one per core)
    #[arg(long, value_name = "N")]
    threads: Option<usize>,

    /// List the references recovered from each container
    #[arg(long)]
    show_references: bool,

    /// Delete unused assets after the report
    #[arg(long)]
    delete: bool,

    /// Interactive mode for deletions (confirm each)
    #[arg(long)]
    interactive: bool,

    /// Dry run - show what would be deleted without making changes
    #[arg(long)]
    dry_run: bool,

    /// Move deleted files here instead of removing them, keeping their
    /// project-relative layout
    #[arg(long, value_name = "DIR")]
    backup_dir: Option<PathBuf>,

    /// Watch mode - rescan whenever containers or assets change
    #[arg(long)]
    watch: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Terminal,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => ReportFormat::Terminal,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    info!("assetsweep v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;

    if cli.watch {
        run_watch_mode(&config, &cli)?;
    } else {
        let session = run_scan(&config, &cli)?;
        if cli.delete {
            run_delete(&session, &cli)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path).into_diagnostic()?
    } else {
        Config::from_default_locations(&cli.path).into_diagnostic()?
    };

    // Override with CLI arguments
    if !cli.exclude.is_empty() {
        config.exclude.extend(cli.exclude.clone());
    }
    if !cli.retain.is_empty() {
        config.retain_patterns.extend(cli.retain.clone());
    }
    if !cli.ext.is_empty() {
        config.assets.target_extensions = cli.ext.clone();
    }
    if cli.parallel {
        config.scan.parallel = true;
    }
    if let Some(threads) = cli.threads {
        config.scan.threads = threads;
    }
    if cli.show_references {
        config.report.show_references = true;
    }

    Ok(config)
}

fn report_format(config: &Config, cli: &Cli) -> Result<ReportFormat> {
    if let Some(format) = cli.format {
        return Ok(format.into());
    }
    ReportFormat::from_name(&config.report.format)
        .ok_or_else(|| miette::miette!("unknown report format '{}'", config.report.format))
}

fn run_scan(config: &Config, cli: &Cli) -> Result<ScanSession> {
    let start_time = Instant::now();
    let format = report_format(config, cli)?;

    let bar = if cli.quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] {prefix:>10} [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}",
            )
            .into_diagnostic()?
            .progress_chars("#>-"),
        );
        bar
    };

    let orchestrator = ScanOrchestrator::new(config.clone());
    let session = orchestrator
        .scan_with_progress(&cli.path, |progress| update_bar(&bar, progress))
        .into_diagnostic()
        .wrap_err_with(|| format!("scan of {} failed", cli.path.display()))?;

    let reporter = Reporter::new(format, cli.output.clone()).with_options(&config.report);
    reporter.report(&session)?;

    info!("Scan completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(session)
}

fn update_bar(bar: &ProgressBar, progress: &ScanProgress) {
    match progress.phase {
        ScanPhase::Done => bar.finish_and_clear(),
        ScanPhase::Failed => bar.abandon_with_message(progress.message.clone()),
        phase => {
            bar.set_prefix(phase.to_string());
            bar.set_length(progress.total as u64);
            bar.set_position(progress.completed as u64);
            bar.set_message(progress.message.clone());
        }
    }
}

fn run_delete(session: &ScanSession, cli: &Cli) -> Result<()> {
    if session.is_cancelled() {
        println!("{}", "Scan was cancelled; nothing will be deleted.".yellow());
        return Ok(());
    }

    let deleter = SafeDeleter::new(
        session.root(),
        cli.interactive,
        cli.dry_run,
        cli.backup_dir.clone(),
    );
    let outcomes = deleter.delete(&session.compute_unused()).into_diagnostic()?;
    let removed = outcomes.iter().filter(|o| o.is_removed()).count();
    info!("Removed {} of {} files", removed, outcomes.len());
    Ok(())
}

fn run_watch_mode(config: &Config, cli: &Cli) -> Result<()> {
    let watcher = FileWatcher::new(&cli.path, config).into_diagnostic()?;

    let config = config.clone();
    let cli = cli.clone();

    watcher
        .watch(move || {
            match run_scan(&config, &cli) {
                Ok(_) => {
                    println!();
                    println!("{}", "✓ Scan complete. Waiting for changes...".green());
                }
                Err(e) => {
                    eprintln!("{}: {:?}", "Scan error".red(), e);
                }
            }
            // Keep watching
            true
        })
        .into_diagnostic()
        .wrap_err("watch mode failed")?;

    Ok(())
}
