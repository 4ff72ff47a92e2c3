//! Shelfload CLI - spreadsheet transforms and batch availability uploads
//!
//! # Main Commands
//!
//! ```bash
//! shelfload serve                        # Start HTTP server (port 3000)
//! shelfload explode stock.xlsx -c stores # Explode a delimited column
//! shelfload split stock.xlsx -c region   # One workbook per region, zipped
//! shelfload submit day1.csv day2.csv     # Batch upload, one file at a time
//! ```
//!
//! # Utility Commands
//!
//! ```bash
//! shelfload sheets stock.xlsx            # List worksheet names
//! shelfload parse stock.csv              # Parse to JSON rows
//! shelfload convert upload.csv           # Validate an upload sheet
//! shelfload ean 4011                     # 13-digit scan code
//! shelfload cache list                   # Inspect the recent-file store
//! ```

use clap::{Parser, Subcommand};
use shelfload::{
    build_payload, parse_auto, parse_csv_str, run_batch, to_ean13, BatchOptions, PipelineOptions,
    RecentFileStore, SourceFile, UploadStatus,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "shelfload")]
#[command(about = "Spreadsheet transforms and batch availability uploads", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List worksheet names of a workbook
    Sheets {
        /// Input workbook
        input: PathBuf,
    },

    /// Parse a file and output JSON rows
    Parse {
        /// Input CSV or workbook file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Worksheet to read (workbooks only; first sheet if omitted)
        #[arg(long)]
        sheet: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Explode a delimited column into one row per value
    Explode {
        /// Input CSV or workbook file
        input: PathBuf,

        /// Column to explode
        #[arg(short, long)]
        column: String,

        /// Value delimiter inside the column
        #[arg(short, long, default_value = ",")]
        delimiter: String,

        /// Worksheet to read (workbooks only)
        #[arg(long)]
        sheet: Option<String>,

        /// Output file (.xlsx or .csv; default: exploded.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Split a file into a zip of workbooks, one per column value
    Split {
        /// Input CSV or workbook file
        input: PathBuf,

        /// Column to split by
        #[arg(short, long)]
        column: String,

        /// File name suffix for archive entries
        #[arg(short, long, default_value = "part")]
        suffix: String,

        /// Worksheet to read (workbooks only)
        #[arg(long)]
        sheet: Option<String>,

        /// Output zip file (default: split-by-<column>.zip)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the confirmation checkpoint for large fan-outs
        #[arg(long)]
        yes: bool,
    },

    /// Validate an availability upload sheet
    Convert {
        /// Input CSV or workbook file
        input: PathBuf,

        /// Worksheet to read (workbooks only)
        #[arg(long)]
        sheet: Option<String>,
    },

    /// Submit availability files to the catalog endpoint, one at a time
    Submit {
        /// Input files, submitted in order
        files: Vec<PathBuf>,

        /// Endpoint URL (default: SHELFLOAD_ENDPOINT)
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Delay between item starts, in seconds
        #[arg(long, default_value = "30")]
        delay_secs: u64,

        /// Convert and validate only; no network calls
        #[arg(long)]
        dry_run: bool,
    },

    /// Convert scan codes to 13-digit codes with check digit
    Ean {
        /// Scan codes (up to 12 digits each)
        codes: Vec<String>,
    },

    /// Manage the recent-file store
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List stored files
    List,

    /// Re-apply the size cap to the store
    Prune,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Sheets { input } => {
            let bytes = fs::read(&input)?;
            for name in shelfload::parser::xlsx::sheet_names(&bytes)? {
                println!("{}", name);
            }
            Ok(())
        }

        Commands::Parse { input, delimiter, sheet, output } => {
            let bytes = fs::read(&input)?;
            let table = match delimiter {
                Some(d) => {
                    let encoding = shelfload::detect_encoding(&bytes);
                    let content = shelfload::parser::decode_content(&bytes, &encoding)?;
                    parse_csv_str(&content, d)?
                }
                None => parse_auto(&file_name(&input), &bytes, sheet.as_deref())?.table,
            };

            let json = serde_json::to_string_pretty(&table.to_json_rows())?;
            write_output(output.as_deref(), json.as_bytes())?;
            Ok(())
        }

        Commands::Explode { input, column, delimiter, sheet, output } => {
            let bytes = fs::read(&input)?;
            let options = PipelineOptions { sheet, ..Default::default() };
            let output_name =
                output.as_deref().map(|p| p.to_string_lossy().into_owned()).unwrap_or_default();

            match shelfload::explode_file(
                &file_name(&input),
                &bytes,
                &column,
                &delimiter,
                &output_name,
                &options,
            )? {
                Some(out) => {
                    fs::write(&out.export.file_name, &out.export.bytes)?;
                    println!("Wrote {} ({} rows)", out.export.file_name, out.rows);
                }
                None => println!("No data to output after explode"),
            }
            Ok(())
        }

        Commands::Split { input, column, suffix, sheet, output, yes } => {
            let bytes = fs::read(&input)?;
            let options = PipelineOptions { sheet, ..Default::default() };

            let out = shelfload::split_file(
                &file_name(&input),
                &bytes,
                &column,
                &suffix,
                yes,
                &options,
            )
            .map_err(|e| {
                let needs_confirm = matches!(
                    e,
                    shelfload::PipelineError::Transform(
                        shelfload::TransformError::FanOutExceeded { .. }
                    )
                );
                let msg = if needs_confirm {
                    format!("{} (re-run with --yes to proceed)", e)
                } else {
                    e.to_string()
                };
                Box::<dyn std::error::Error>::from(msg)
            })?;

            let path = output
                .unwrap_or_else(|| PathBuf::from(&out.export.file_name));
            fs::write(&path, &out.export.bytes)?;
            println!("Wrote {} ({} files)", path.display(), out.entries);
            Ok(())
        }

        Commands::Convert { input, sheet } => {
            let bytes = fs::read(&input)?;
            let parsed = parse_auto(&file_name(&input), &bytes, sheet.as_deref())?;
            let report = shelfload::convert_table(&parsed.table)?;

            println!("Valid records:    {}", report.updates.len());
            println!("Rejected rows:    {}", report.rejected.len());
            for (row, reason) in &report.rejected {
                println!("   row {}: {}", row + 2, reason);
            }
            Ok(())
        }

        Commands::Submit { files, endpoint, delay_secs, dry_run } => {
            if files.is_empty() {
                return Err("No files to submit".into());
            }

            let mut sources = Vec::new();
            for path in &files {
                sources.push(SourceFile {
                    name: file_name(path),
                    bytes: fs::read(path)?,
                });
            }

            if dry_run {
                for source in &sources {
                    match build_payload(source) {
                        Ok(payload) => println!(
                            "{}: {} record(s) ready",
                            source.name,
                            payload.updates.len()
                        ),
                        Err(e) => println!("{}: {}", source.name, e),
                    }
                }
                return Ok(());
            }

            let url = endpoint
                .or_else(|| std::env::var("SHELFLOAD_ENDPOINT").ok())
                .ok_or("No endpoint: pass --endpoint or set SHELFLOAD_ENDPOINT")?;
            let endpoint = shelfload::HttpEndpoint::new(url)?;

            let options = BatchOptions {
                delay: Duration::from_secs(delay_secs),
                ..Default::default()
            };
            let items = run_batch(&sources, &endpoint, &options, None).await;

            println!();
            println!("Submission summary");
            let mut succeeded = 0;
            for item in &items {
                let status = match item.status {
                    UploadStatus::Succeeded => {
                        succeeded += 1;
                        "succeeded"
                    }
                    UploadStatus::PartiallyFailed => "partially-failed",
                    UploadStatus::Failed => "failed",
                    UploadStatus::Waiting => "not attempted",
                    UploadStatus::Submitting => "interrupted",
                };
                match &item.message {
                    Some(msg) => println!("   {} - {}: {}", item.file_name, status, msg),
                    None => println!("   {} - {}", item.file_name, status),
                }
            }
            println!("{}/{} files succeeded", succeeded, items.len());
            Ok(())
        }

        Commands::Ean { codes } => {
            for code in &codes {
                match to_ean13(code) {
                    Ok(ean) => println!("{} -> {}", code, ean),
                    Err(e) => println!("{} -> error: {}", code, e),
                }
            }
            Ok(())
        }

        Commands::Cache { action } => {
            let store = match std::env::var("SHELFLOAD_CACHE_DIR") {
                Ok(dir) => RecentFileStore::with_dir(dir),
                Err(_) => RecentFileStore::new(),
            };

            match action {
                CacheAction::List => {
                    let entries = store.load()?;
                    if entries.is_empty() {
                        println!("Recent-file store is empty");
                    }
                    for entry in entries {
                        println!(
                            "{}  {}  ({} bytes)",
                            entry.date,
                            entry.file_name,
                            entry.byte_len()
                        );
                    }
                }
                CacheAction::Prune => {
                    let kept = store.prune()?;
                    println!("{} entries kept", kept.len());
                }
            }
            Ok(())
        }

        Commands::Serve { port } => shelfload::server::start_server(port).await,
    }
}

/// File name component of a path, for format detection and display.
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Write to the output file, or stdout when none was given.
fn write_output(output: Option<&Path>, bytes: &[u8]) -> std::io::Result<()> {
    match output {
        Some(path) => fs::write(path, bytes),
        None => {
            println!("{}", String::from_utf8_lossy(bytes));
            Ok(())
        }
    }
}
