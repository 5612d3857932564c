mod config;
mod prompts;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use diigo_core::{
    export_bookmarks_blocking, ErrorKind, ExportError, ExportProgress, ExportResult,
    DEFAULT_EXPORT_FILENAME, DEFAULT_ROOT_FOLDER, FIELDNAMES, MAX_PAGE_SIZE, USERNAME_ENV,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Settings;

#[derive(Parser, Debug)]
#[command(author, version, about = "Export Diigo bookmarks to a Raindrop.io import CSV", long_about = None)]
pub struct Cli {
    /// Diigo username (prompted when omitted)
    #[arg(short = 'u', long = "username", env = USERNAME_ENV)]
    username: Option<String>,

    /// Output CSV path
    #[arg(short = 'o', long = "output", default_value = DEFAULT_EXPORT_FILENAME)]
    output: PathBuf,

    /// Output file encoding
    #[arg(short = 'e', long = "encoding", default_value = "utf-8")]
    encoding: String,

    /// Bookmarks per request (Diigo allows at most 100)
    #[arg(long = "page-size", default_value_t = MAX_PAGE_SIZE)]
    page_size: u32,

    /// Per-request timeout in seconds
    #[arg(long = "timeout", default_value_t = 30)]
    timeout: u64,

    /// Raindrop.io folder the bookmarks are filed under
    #[arg(long = "folder", default_value = DEFAULT_ROOT_FOLDER)]
    folder: String,

    /// Override the Diigo API base URL
    #[arg(long = "base-url", hide = true)]
    base_url: Option<String>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        eprintln!("{} {err:#}", style("error:").red().bold());
        process::exit(exit_code(&err));
    }
}

fn run(cli: &Cli) -> Result<()> {
    let settings = Settings::from_cli(cli).map_err(ExportError::from)?;
    let provider = settings.credential_provider();
    let mut options = settings
        .into_export_options(provider.as_ref())
        .map_err(ExportError::from)?;
    tracing::debug!(
        output = %options.csv_path.display(),
        page_size = options.page_size,
        user = %options.credentials.username,
        "starting export"
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message("Signing in to Diigo...");
    let reporter = spinner.clone();
    options.progress_callback = Some(Arc::new(move |progress: ExportProgress| {
        reporter.set_message(format!(
            "Fetched {} bookmarks ({} pages)...",
            progress.fetched, progress.pages
        ));
    }));

    let result = export_bookmarks_blocking(options);
    spinner.finish_and_clear();
    let result = result.context("Diigo export failed")?;
    print_summary(&result);
    Ok(())
}

fn print_summary(result: &ExportResult) {
    println!(
        "{} {} bookmarks from Diigo",
        style("Exported").green().bold(),
        result.bookmarks.len()
    );
    println!(
        "{} {}",
        style("Saved to").green(),
        result.csv_path.display()
    );
    println!("{} {}", style("Columns:").dim(), FIELDNAMES.join(", "));
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("diigo_core=debug,diigo_export=debug,info")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ExportError>().map(ExportError::kind) {
        Some(ErrorKind::Auth) => 2,
        Some(ErrorKind::Network) | Some(ErrorKind::Api) => 3,
        Some(ErrorKind::File) => 4,
        Some(ErrorKind::Other) | None => 1,
    }
}
