//! datapkg: fetch data packages.
//!
//! A data package is a bundle of metadata plus zero or more external data
//! resources. datapkg reads package metadata from a source, reconciles it
//! into one canonical schema, and retrieves the package's resources through
//! an ordered chain of downloader strategies.
//!
//! # Modules
//!
//! - [`metadata`]: Canonical package model and the normalization engine
//! - [`download`]: Download orchestration, filters, and downloader strategies
//! - [`source`]: Resolving a source specifier into a package
//! - [`error`]: Error types for datapkg operations

pub mod download;
pub mod error;
pub mod metadata;
pub mod source;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use download::{
    downloaders_from_names, package_destination, DownloadStatus, GlobFilter, JsonMetadataSink,
    PackageDownloader, UrlTransfer,
};
pub use error::DatapkgError;
use source::SourceFormat;

/// The datapkg CLI application.
#[derive(Parser)]
#[command(name = "datapkg")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Log progress (debug level); RUST_LOG overrides.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Download a package (metadata and resources).
    Download(DownloadArgs),
    /// Print a package's normalized metadata as JSON.
    Show(ShowArgs),
}

/// Arguments for the download subcommand.
#[derive(clap::Args)]
#[command(after_help = "\
Examples:
  datapkg download ./gdp out             download every resource
  datapkg download ./gdp out csv         only resources with format csv (or CSV)
  datapkg download ./gdp out 'xml/*'     only formats starting with xml/
  datapkg download ./gdp out '*' 'http://abc*'
                                         any format, url starting http://abc")]
struct DownloadArgs {
    /// Package source: a metadata file or a directory holding one.
    source: String,

    /// Directory to download into (the package lands in <path>/<name>).
    path: PathBuf,

    /// Glob matched against each resource's format.
    #[arg(default_value = "*")]
    format_pattern: String,

    /// Glob matched against each resource's url.
    #[arg(default_value = "*")]
    url_pattern: String,

    /// How to read the source.
    #[arg(long, value_enum, default_value_t = SourceFormatArg::Auto)]
    source_format: SourceFormatArg,

    /// Downloader strategies to try, in order.
    #[arg(
        long = "downloader",
        env = "DATAPKG_DOWNLOADERS",
        value_delimiter = ',',
        default_value = "simple"
    )]
    downloaders: Vec<String>,

    /// Overall timeout for each HTTP transfer, in seconds.
    #[arg(long, env = "DATAPKG_TIMEOUT")]
    timeout: Option<u64>,

    /// Fail if any selected resource failed or was not handled.
    #[arg(long)]
    strict: bool,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

/// Arguments for the show subcommand.
#[derive(clap::Args)]
struct ShowArgs {
    /// Package source: a metadata file or a directory holding one.
    source: String,

    /// How to read the source.
    #[arg(long, value_enum, default_value_t = SourceFormatArg::Auto)]
    source_format: SourceFormatArg,
}

/// CLI-facing source format names.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum SourceFormatArg {
    Auto,
    Json,
    #[value(alias = "pkginfo")]
    PkgInfo,
    DistJson,
}

impl From<SourceFormatArg> for SourceFormat {
    fn from(arg: SourceFormatArg) -> Self {
        match arg {
            SourceFormatArg::Auto => SourceFormat::Auto,
            SourceFormatArg::Json => SourceFormat::Json,
            SourceFormatArg::PkgInfo => SourceFormat::PkgInfo,
            SourceFormatArg::DistJson => SourceFormat::DistJson,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Run the datapkg CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), DatapkgError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Download(args)) => run_download(args),
        Some(Commands::Show(args)) => run_show(args),
        None => {
            println!("datapkg {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Fetch data packages: normalize metadata, download resources.");
            println!();
            println!("Run 'datapkg --help' for usage information.");
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

/// Execute the download subcommand.
fn run_download(args: DownloadArgs) -> Result<(), DatapkgError> {
    let filter = GlobFilter::new(&args.format_pattern, &args.url_pattern)?;
    let package = source::load_package(&args.source, args.source_format.into())?;

    let transfer = UrlTransfer::new().with_timeout(args.timeout.map(Duration::from_secs));

    let downloader = PackageDownloader::new(
        downloaders_from_names(&args.downloaders, &transfer)?,
        Box::new(JsonMetadataSink),
    );

    let destination = package_destination(&args.path, &package)?;
    let report = match downloader.download(&package, &destination, Some(&filter))? {
        DownloadStatus::NoResources => {
            println!("Warning: no resources to download for package '{}'", package.name);
            return Ok(());
        }
        DownloadStatus::Completed(report) => report,
    };

    match args.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).map_err(|source| {
                DatapkgError::MetadataJsonWrite {
                    path: PathBuf::from("<stdout>"),
                    source,
                }
            })?;
            println!("{json}");
        }
        OutputFormat::Text => print!("{report}"),
    }

    if args.strict && !report.is_complete() {
        Err(DatapkgError::DownloadIncomplete {
            failed: report.failed_count(),
            unhandled: report.unhandled_count(),
            report,
        })
    } else {
        Ok(())
    }
}

/// Execute the show subcommand.
fn run_show(args: ShowArgs) -> Result<(), DatapkgError> {
    let package = source::load_package(&args.source, args.source_format.into())?;
    let json = metadata::io_json::to_json_string(&package).map_err(|source| {
        DatapkgError::MetadataJsonWrite {
            path: PathBuf::from("<stdout>"),
            source,
        }
    })?;
    println!("{json}");
    Ok(())
}
