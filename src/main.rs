// src/main.rs
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use scraper::Html;
use table_scraper::extractors::table::count_tables;
use table_scraper::fetch::{self, FetchOptions};
use table_scraper::render::render_outline;
use table_scraper::storage::StorageManager;
use table_scraper::utils::{self, html_debug};
use table_scraper::{AppError, ExtractedTable, TableExtractor};

/// Program that finds tables on HTML pages, then prints them on the screen or writes them to CSV files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Page to read tables from. Prompted for when omitted
    url: Option<String>,

    /// Finds a table at the nth location on the page (zero based)
    #[arg(short, long, default_value_t = 0)]
    number: usize,

    /// Writes a CSV file for every table found
    #[arg(short, long)]
    csv: bool,

    /// Does not print tables or any other information to the command line
    #[arg(short, long)]
    silent: bool,

    /// Processes all tables on the page from the nth position onwards
    #[arg(short, long)]
    all: bool,

    /// Takes entire rows of the table, even if there is no <td> tag
    #[arg(short, long)]
    force: bool,

    /// Output directory for CSV and metadata files
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Also writes a JSON metadata file next to each table
    #[arg(long)]
    metadata: bool,

    /// Debug mode - save the raw page and a copy with numbered table markers
    #[arg(short, long)]
    debug: bool,

    /// User-Agent header sent with the page request
    #[arg(long, env = "TABLE_SCRAPER_USER_AGENT", default_value = fetch::client::DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Request timeout in seconds
    #[arg(long, env = "TABLE_SCRAPER_TIMEOUT_SECS", default_value_t = fetch::client::DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(args.silent);
    tracing::debug!("Starting with args: {:?}", args);

    // 3. Resolve the page URL
    let url = match &args.url {
        Some(url) => url.clone(),
        None => prompt_for_url(args.silent)?,
    };

    // 4. Download the page
    let options = FetchOptions {
        user_agent: args.user_agent.clone(),
        timeout: Duration::from_secs(args.timeout_secs),
    };
    let content = fetch::download_page(&url, &options).await?;
    tracing::info!("Successfully downloaded page ({} bytes)", content.len());

    if args.debug {
        let debug_dir = args.output_dir.join("debug");
        if let Err(e) = html_debug::create_debug_html(&content, &debug_dir) {
            tracing::warn!("Failed to create debug HTML: {}", e);
        }
    }

    // 5. Parse once, then extract each requested table
    let document = Html::parse_document(&content);
    tracing::info!("Page contains {} tables", count_tables(&document));

    let storage = if args.csv || args.metadata {
        Some(StorageManager::new(&args.output_dir)?)
    } else {
        None
    };

    let extractor = TableExtractor::new(args.force);
    let tables = extractor.extract_plan(&document, args.number, args.all)?;

    for table in &tables {
        output_table(&args, &url, storage.as_ref(), table)?;
    }

    tracing::info!("Processing finished. Tables processed: {}", tables.len());

    Ok(())
}

/// Asks for the page URL on stdin.
fn prompt_for_url(silent: bool) -> Result<String, AppError> {
    if !silent {
        println!("HTML table parser. Run \"table_scraper --help\" for help");
    }
    print!("Enter Url: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;

    let url = line.trim();
    if url.is_empty() {
        return Err(AppError::Config("No URL was provided".to_string()));
    }
    Ok(url.to_string())
}

/// Prints and/or saves one extracted table according to the CLI flags.
fn output_table(
    args: &Args,
    url: &str,
    storage: Option<&StorageManager>,
    table: &ExtractedTable,
) -> Result<(), AppError> {
    if !args.silent {
        if table.records.is_empty() {
            tracing::info!("Table #{} produced no rows", table.index);
        } else {
            print!("{}", render_outline(&table.records));
        }
    }

    if let Some(storage) = storage {
        if args.csv {
            storage.save_table_csv(table)?;
        }
        if args.metadata {
            storage.save_table_metadata(table, url)?;
        }
    }

    Ok(())
}
