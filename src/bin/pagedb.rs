//! pagedb REPL Binary
//!
//! Interactive shell over a single database file.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use pagedb::query::{format_row, ExecuteOutcome, QueryExecutor};
use pagedb::storage::{DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE, DEFAULT_TABLE_MAX_ROWS};
use pagedb::{Config, StorageEngine};
use tracing_subscriber::{fmt, EnvFilter};

const PROMPT: &str = "db > ";

const HELP_MESSAGE: &str = "\
Special commands:
  .help                - Display this help message
  .exit                - Exit the program
  .stats               - Display database statistics
  .info                - Display database information

SQL commands:
  insert <id> <username> <email>
    - Insert a new row with the specified values
  select [* | columns] [where id = <n>]
    - Display rows in the table
    - Example: select where id = 1";

/// pagedb shell
#[derive(Parser, Debug)]
#[command(name = "pagedb")]
#[command(about = "Single-table page-backed database shell")]
#[command(version)]
struct Args {
    /// Database file
    #[arg(default_value = "database.db")]
    file: PathBuf,

    /// Page size in bytes
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Maximum number of pages in the file
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    max_pages: u32,

    /// Maximum number of rows in the table
    #[arg(short = 'r', long, default_value_t = DEFAULT_TABLE_MAX_ROWS)]
    max_rows: usize,
}

/// Commands starting with '.'
enum MetaCommand {
    Exit,
    Help,
    Stats,
    Info,
}

impl MetaCommand {
    fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            ".exit" => Some(MetaCommand::Exit),
            ".help" => Some(MetaCommand::Help),
            ".stats" => Some(MetaCommand::Stats),
            ".info" => Some(MetaCommand::Info),
            _ => None,
        }
    }
}

fn main() {
    // Logs go to stderr so query output on stdout stays clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .page_size(args.page_size)
        .max_pages(args.max_pages)
        .table_max_rows(args.max_rows)
        .build();

    let engine = match StorageEngine::open(config, &args.file) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open database: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("pagedb v{}", pagedb::VERSION);
    println!("Enter \".help\" for usage hints.");
    println!("Connected to {}", args.file.display());

    let executor = QueryExecutor::new(Arc::clone(&engine));
    if let Err(e) = run_repl(&executor, &args.file) {
        tracing::error!("REPL error: {}", e);
    }

    if let Err(e) = engine.close() {
        tracing::error!("Failed to close database: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Read-eval-print loop; returns on `.exit` or end of input
fn run_repl(executor: &QueryExecutor, file: &Path) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        write!(stdout, "{}", PROMPT)?;
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            return Ok(());
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if input.starts_with('.') {
            match MetaCommand::parse(input) {
                Some(MetaCommand::Exit) => {
                    println!("Goodbye!");
                    return Ok(());
                }
                Some(MetaCommand::Help) => println!("{}", HELP_MESSAGE),
                Some(MetaCommand::Stats) => print_statistics(executor, file),
                Some(MetaCommand::Info) => print_info(executor, file),
                None => {
                    println!("Unrecognized command '{}'.", input);
                    println!("{}", HELP_MESSAGE);
                }
            }
            continue;
        }

        match executor.execute_query(input) {
            Ok(ExecuteOutcome::Inserted) => println!("Executed."),
            Ok(ExecuteOutcome::Rows { columns, rows }) => {
                for row in &rows {
                    println!("{}", format_row(&columns, row));
                }
                println!("Executed.");
            }
            Ok(ExecuteOutcome::TableFull) => println!("Error: Table full."),
            Ok(ExecuteOutcome::DuplicateKey) => println!("Error: Duplicate ID."),
            Err(e) => println!("Error: {}", e),
        }
    }
}

fn print_statistics(executor: &QueryExecutor, file: &Path) {
    let config = executor.engine().config();

    println!("Database Statistics:");
    println!("  File: {}", file.display());
    println!("  Page size: {} bytes", config.page_size);
    println!("  Row size: {} bytes", config.row_size());
    println!("  Max pages: {}", config.max_pages);
    println!("  Rows per page: {}", config.rows_per_page());
    println!("  Max rows: {}", executor.engine().get_max_rows());
    println!();
    println!("{}", executor.statistics());
    println!("{}", executor.engine().get_statistics());
}

fn print_info(executor: &QueryExecutor, file: &Path) {
    println!("Database Information:");
    println!("  Application: pagedb");
    println!("  Version: {}", pagedb::VERSION);
    println!("  Database file: {}", file.display());
    println!("  Configuration: {}", executor.engine().config());
}
