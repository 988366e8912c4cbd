use clap::Parser;
use eyre::{Context, Result, eyre};
use flexi_logger::Logger;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use vcf_to_obsidian::config::{ConvertOptions, IdentifierValidation, load_file_config};
use vcf_to_obsidian::converter::Converter;
use vcf_to_obsidian::discover::collect_vcf_files;
use vcf_to_obsidian::parallel;

/// Convert VCF files to Markdown notes for the obsidian-vcf-contacts plugin.
///
/// --folder, --file and --ignore can be given multiple times.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Source directory containing VCF files.
    #[arg(long, value_name = "DIR")]
    folder: Vec<PathBuf>,

    /// Destination directory for Markdown files.
    /// Required unless set in config.
    #[arg(long, value_name = "DIR")]
    obsidian: Option<PathBuf>,

    /// Specific VCF file to process.
    #[arg(long, value_name = "FILE")]
    file: Vec<PathBuf>,

    /// Specific VCF file to skip.
    #[arg(long, value_name = "FILE")]
    ignore: Vec<PathBuf>,

    /// Number of files converted in parallel.
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// How to treat UIDs that are not UUIDs.
    #[arg(long, value_enum, value_name = "POLICY")]
    identifier_validation: Option<IdentifierValidation>,

    /// Write the NOTE text into the Notes section.
    #[arg(long)]
    include_notes: bool,

    /// Leave notes that are not older than their VCF file untouched.
    #[arg(long)]
    skip_unchanged: bool,

    /// Path to a specific configuration file.
    /// Defaults to $XDG_CONFIG_HOME/vcf-to-obsidian/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print each file converted, removed or skipped.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress the progress bar and warnings.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn init_logging(verbose: bool, quiet: bool) -> Result<flexi_logger::LoggerHandle> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    Logger::try_with_env_or_str(level)
        .and_then(|logger| logger.start())
        .map_err(|e| eyre!("Failed to initialize logging: {}", e))
}

fn make_bar(total: u64, hidden: bool) -> Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new(total);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)",
    )
    .map_err(|e| eyre!("Invalid progress template: {}", e))?
    .progress_chars("=>-");
    bar.set_style(style);
    Ok(bar)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logger = init_logging(cli.verbose, cli.quiet)?;

    // 1. Load config file (CLI path > default path)
    let file_cfg = load_file_config(cli.config.as_deref())?;

    // 2. Resolve destination (CLI > Config)
    let obsidian = cli.obsidian.or(file_cfg.obsidian).ok_or_else(|| {
        eyre!("Missing destination.\nUse --obsidian to specify it, or set obsidian in config.toml.")
    })?;

    // 3. Resolve sources (CLI > Config)
    let folders = if cli.folder.is_empty() {
        file_cfg.folders
    } else {
        cli.folder
    };
    let ignore = if cli.ignore.is_empty() {
        file_cfg.ignore
    } else {
        cli.ignore
    };
    if folders.is_empty() && cli.file.is_empty() {
        return Err(eyre!("Must specify at least one --folder or --file option."));
    }

    let inputs = collect_vcf_files(&folders, &cli.file, &ignore)?;
    if inputs.is_empty() {
        return Err(eyre!("No VCF files found to process."));
    }

    fs::create_dir_all(&obsidian).wrap_err_with(|| {
        format!(
            "Failed to create destination directory: {}",
            obsidian.display()
        )
    })?;
    log::debug!("Destination directory: '{}'", obsidian.display());

    // 4. Build the conversion options
    let options = ConvertOptions {
        identifier_validation: cli
            .identifier_validation
            .or(file_cfg.identifier_validation)
            .unwrap_or_default(),
        include_notes: cli.include_notes || file_cfg.include_notes.unwrap_or(false),
        skip_unchanged: cli.skip_unchanged || file_cfg.skip_unchanged.unwrap_or(false),
        workers: cli.workers.or(file_cfg.workers).unwrap_or(1).max(1),
    };

    // 5. Run the conversion
    let converter = Converter::new(options);
    let pb = make_bar(inputs.len() as u64, cli.quiet || cli.verbose)?;
    let summary = parallel::execute(&converter, &inputs, &obsidian, |_, _| pb.inc(1));
    pb.finish_and_clear();

    println!("Found {} VCF file(s) to process", inputs.len());
    if summary.skipped > 0 {
        println!("Skipped {} file(s) with invalid UIDs.", summary.skipped);
    }
    println!(
        "Successfully completed {}/{} conversions.",
        summary.succeeded(),
        summary.total
    );

    Ok(())
}
