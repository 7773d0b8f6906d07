//! cbz2epub command-line entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use cbz2epub::prelude::*;
use clap::Parser;

/// Convert all CBZ files in a folder to EPUB files.
#[derive(Parser, Debug)]
#[command(name = "cbz2epub")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the folder containing CBZ files.
    input_folder: PathBuf,

    /// Path to the folder where EPUB files will be saved.
    output_folder: PathBuf,

    /// Image compression quality (1-100).
    #[arg(long, default_value_t = NormalizeOptions::DEFAULT_QUALITY,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Maximum height for images, in pixels.
    #[arg(long, default_value_t = NormalizeOptions::DEFAULT_MAX_HEIGHT,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_height: u32,

    /// Stop at the first archive that fails instead of converting the rest.
    #[arg(long)]
    fail_fast: bool,

    /// Order pages by their full path inside the archive instead of folder by folder.
    #[arg(long)]
    global_sort: bool,

    /// Directory for temporary extraction (defaults to the system temp directory).
    #[arg(long)]
    scratch_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut builder = ConverterConfig::builder();
    if let Some(scratch_dir) = cli.scratch_dir {
        builder.scratch_path(scratch_dir);
    }
    let config = builder
        .input_path(cli.input_folder)
        .output_path(cli.output_folder)
        .quality(cli.quality)
        .max_height(cli.max_height)
        .failure_policy(if cli.fail_fast {
            FailurePolicy::FailFast
        } else {
            FailurePolicy::Isolate
        })
        .page_order(if cli.global_sort {
            PageOrder::Global
        } else {
            PageOrder::PerDirectory
        })
        .build()?;

    let report = config.convert_folder().await?;

    println!(
        "Converted {} archive(s), {} failed",
        report.converted.len(),
        report.failures.len()
    );
    for failure in &report.failures {
        eprintln!("  {}: {}", failure.archive.display(), failure.message);
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
