//! Command-line interface for merging zip archives.
//!
//! This CLI checks whether a set of zip archives can be merged into one
//! directory without name collisions, and performs the merge.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::{debug, info};
use zipmerge::inputs::resolve_archive_paths;
use zipmerge::{ConflictSet, MergeError, MergeOptions};

#[derive(Parser)]
#[command(name = "mzipext")]
#[command(version, about = "Merge zip archives into one directory without collisions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check if zip files are mergeable
    Mergeable {
        /// Archive files to check
        archives: Vec<PathBuf>,

        /// Also check every .zip file in this directory
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Treat files already in this directory as conflicting sources
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract zip files and merge them into one directory
    #[command(
        after_help = "Example: mzipext merge-extract --input-dir \"My Zips Folder\" --output-dir \"My Folder\" this.zip that.zip"
    )]
    MergeExtract {
        /// Archive files to merge
        archives: Vec<PathBuf>,

        /// Directory scanned for additional .zip files
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Output directory
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Show an archive's checksum and entries
    Inspect {
        /// Archive file to inspect
        archive: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// JSON body of `mergeable --json`.
#[derive(Serialize)]
struct MergeableReport<'a> {
    mergeable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    repeated: Option<&'a [PathBuf]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    conflicts: Option<&'a ConflictSet>,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Mergeable {
            archives,
            input_dir,
            output_dir,
            json,
        } => handle_mergeable(archives, input_dir, output_dir, json),
        Commands::MergeExtract {
            archives,
            input_dir,
            output_dir,
        } => handle_merge_extract(archives, input_dir, output_dir),
        Commands::Inspect { archive, json } => handle_inspect(archive, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn handle_mergeable(
    archives: Vec<PathBuf>,
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let paths = resolve_archive_paths(&archives, input_dir.as_deref())?;
    if paths.is_empty() {
        return Err(Box::new(MergeError::NoInputs));
    }

    debug!("Checking {} archives", paths.len());
    let result = zipmerge::check_mergeable(paths.as_slice(), output_dir.as_deref());

    if json {
        let report = match &result {
            Ok(()) => Some(MergeableReport {
                mergeable: true,
                repeated: None,
                conflicts: None,
            }),
            Err(MergeError::RepeatedArchives(repeated)) => Some(MergeableReport {
                mergeable: false,
                repeated: Some(repeated.as_slice()),
                conflicts: None,
            }),
            Err(MergeError::EntryConflicts(conflicts)) => Some(MergeableReport {
                mergeable: false,
                repeated: None,
                conflicts: Some(conflicts),
            }),
            Err(_) => None,
        };

        if let Some(report) = report {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    // A failed check still exits through `main`, after any JSON report
    result?;

    if !json {
        println!("Files can be merged");
    }
    Ok(())
}

fn handle_merge_extract(
    archives: Vec<PathBuf>,
    input_dir: Option<PathBuf>,
    output_dir: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    if archives.is_empty() && input_dir.is_none() {
        return Err(
            "input files are not provided: pass a directory of zip files with --input-dir, \
             or zip paths as arguments"
                .into(),
        );
    }

    let options = MergeOptions {
        input_dir,
        output_dir,
    };

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.enable_steady_tick(Duration::from_millis(120));

    let progress_for_cb = progress.clone();
    let progress_cb = move |entry: &str, bytes_written: u64, _size: Option<u64>| {
        progress_for_cb.set_message(format!("{} ({} bytes written)", entry, bytes_written));
    };

    let result = zipmerge::merge_extract(&archives, &options, &progress_cb);
    progress.finish_and_clear();
    let stats = result?;
    info!(
        "Merge into {} finished in {:?}",
        options.output_dir.display(),
        stats.duration
    );

    println!(
        "Merged {} archives into {}: {} files, {} directories, {} bytes in {}s",
        stats.archives_merged,
        options.output_dir.display(),
        stats.files_extracted,
        stats.directories_created,
        stats.bytes_written,
        stats.duration.as_secs()
    );
    Ok(())
}

fn handle_inspect(archive: PathBuf, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let summary = zipmerge::open(&archive)?.summary();
    debug!("Inspecting {} ({} entries)", summary.path.display(), summary.entries);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Archive:  {}", summary.path.display());
    println!("SHA-256:  {}", summary.checksum);
    println!(
        "Entries:  {} ({} bytes uncompressed)",
        summary.entries, summary.uncompressed_bytes
    );
    for entry in &summary.entry_list {
        let kind = if entry.is_directory { "dir " } else { "file" };
        println!("  {} {:>12}  {}", kind, entry.size, entry.name);
    }
    Ok(())
}
