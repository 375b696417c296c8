use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use imprint::{
    Calculator, Comparer, Exporter, FingerprintStore, ImportFormat, Importer, Verifier,
};

#[derive(Parser)]
#[command(name = "imprint", version, about = "File fingerprint store with rename detection and integrity verification")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ImportFormatArg {
    /// Detect the format from the file content
    Auto,
    /// Unix checksum list: `<digest>  <path>`
    List,
    /// File-manager listing: `filename;digest`
    Listing,
}

#[derive(Subcommand)]
enum Commands {
    /// Fingerprint a directory tree and persist the store
    Calculate {
        /// Directory to fingerprint
        #[arg(long = "indir")]
        input_directory: PathBuf,
        /// Output store file
        #[arg(long = "outchk")]
        output_store: PathBuf,
        /// Hash algorithm
        #[arg(long, default_value = "sha1")]
        algorithm: String,
        /// Path prefix stripped from recorded paths (defaults to the input directory)
        #[arg(long = "bp")]
        base_path: Option<PathBuf>,
        /// Only hash files absent from the existing output store
        #[arg(long)]
        missing_only: bool,
        /// Hash files in parallel
        #[arg(long)]
        parallel: bool,
    },
    /// Detect renames between a stored snapshot and a directory
    Compare {
        /// Directory holding the current file content
        #[arg(long = "indir")]
        input_directory: PathBuf,
        /// Previously persisted store (the old snapshot)
        #[arg(long = "inchk")]
        input_store: PathBuf,
        /// Output CSV of (old path, new path) pairs
        #[arg(long = "outnames")]
        output_names: PathBuf,
        /// Output store of genuinely new or changed files
        #[arg(long = "outchk")]
        output_store: PathBuf,
        /// Hash algorithm
        #[arg(long, default_value = "sha1")]
        algorithm: String,
        /// Path prefix stripped from recorded paths (defaults to the input directory)
        #[arg(long = "bp")]
        base_path: Option<PathBuf>,
        /// Hash files in parallel
        #[arg(long)]
        parallel: bool,
        /// Print the report as JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
    /// Import a foreign checksum file into the store format
    Import {
        /// Foreign checksum file
        #[arg(long = "in")]
        input_file: PathBuf,
        /// Output store file
        #[arg(long = "outchk")]
        output_store: PathBuf,
        /// Algorithm that produced the foreign digests
        #[arg(long, default_value = "sha1")]
        algorithm: String,
        /// Source format
        #[arg(long, value_enum, default_value_t = ImportFormatArg::Auto)]
        format: ImportFormatArg,
    },
    /// Export a store as per-directory checksum listings
    Export {
        /// Input store file
        #[arg(long = "inchk")]
        input_store: PathBuf,
        /// Directory receiving the listings
        #[arg(long = "outdir")]
        output_directory: PathBuf,
        /// File name filter (glob or substring; empty matches all)
        #[arg(long, default_value = "")]
        filter: String,
    },
    /// Re-hash every stored fingerprint and report mismatches
    Verify {
        /// Input store file
        #[arg(long = "inchk")]
        input_store: PathBuf,
        /// Directory the stored paths are relative to
        #[arg(long = "bp", default_value = ".")]
        base_path: PathBuf,
        /// Hash files in parallel
        #[arg(long)]
        parallel: bool,
        /// Print the report as JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Calculate {
            input_directory,
            output_store,
            algorithm,
            base_path,
            missing_only,
            parallel,
        } => {
            let base = base_path.unwrap_or_else(|| input_directory.clone());

            // Missing-only mode seeds the run with the existing store so
            // already-known paths are not re-hashed
            let mut store = if missing_only && output_store.exists() {
                FingerprintStore::load(&output_store)?
            } else {
                FingerprintStore::new()
            };

            let calculator = Calculator::with_parallel(parallel);
            let stats =
                calculator.calculate(&mut store, &input_directory, &algorithm, &base, missing_only)?;
            store.save(&output_store)?;
            stats.display();
            println!("Store written to: {}", output_store.display());
        }
        Commands::Compare {
            input_directory,
            input_store,
            output_names,
            output_store,
            algorithm,
            base_path,
            parallel,
            json,
        } => {
            let base = base_path.unwrap_or_else(|| input_directory.clone());
            let old_store = FingerprintStore::load(&input_store)?;

            let comparer = Comparer::with_parallel(parallel);
            let outcome =
                comparer.compare_and_match(&old_store, &input_directory, &algorithm, &base)?;

            outcome.save_renames(&output_names)?;
            outcome.residual.save(&output_store)?;

            if json {
                println!("{}", outcome.to_json()?);
            } else {
                outcome.display();
            }
        }
        Commands::Import {
            input_file,
            output_store,
            algorithm,
            format,
        } => {
            let importer = Importer::new();
            let (store, stats) = match format {
                ImportFormatArg::Auto => importer.import(&input_file, &algorithm)?,
                ImportFormatArg::List => {
                    importer.import_as(&input_file, &algorithm, ImportFormat::ChecksumList)?
                }
                ImportFormatArg::Listing => {
                    importer.import_as(&input_file, &algorithm, ImportFormat::CommanderListing)?
                }
            };
            store.save(&output_store)?;
            println!(
                "Imported {} records ({} malformed lines skipped) into {}",
                stats.imported,
                stats.skipped,
                output_store.display()
            );
        }
        Commands::Export {
            input_store,
            output_directory,
            filter,
        } => {
            let store = FingerprintStore::load(&input_store)?;
            let exporter = Exporter::new();
            let stats = exporter.export(&store, &output_directory, &filter)?;
            println!(
                "Exported {} records into {} listing file(s) under {}",
                stats.records_exported,
                stats.files_written,
                output_directory.display()
            );
        }
        Commands::Verify {
            input_store,
            base_path,
            parallel,
            json,
        } => {
            let store = FingerprintStore::load_checked(&input_store)?;
            let verifier = Verifier::with_parallel(parallel);
            let report = verifier.verify(&store, &base_path)?;

            if json {
                println!("{}", report.to_json()?);
            } else {
                report.display();
            }

            if !report.is_clean() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
