use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use litebrowse_adapters::seed;
use litebrowse_adapters::sqlite::SqliteStore;
use litebrowse_core::config::UiConfig;

#[derive(Debug, Parser)]
#[command(
    name = "litebrowse",
    about = "Interactive terminal browser for SQLite databases",
    version
)]
struct Cli {
    /// Path to the SQLite database file; created when absent.
    database: PathBuf,

    /// Recreate the demo tables before browsing. Asks for confirmation when
    /// the database already holds tables.
    #[arg(long)]
    seed: bool,

    /// TOML file overriding the UI defaults (page size, colors, title).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging()?;
    tracing::debug!(database = %cli.database.display(), seed = cli.seed, "starting");

    let config = match &cli.config {
        Some(path) => UiConfig::load_from_path(path)?,
        None => UiConfig::default(),
    };

    // Opening a path that does not exist yet creates the file, so remember
    // whether this run brought the database into existence.
    let fresh = !cli.database.exists();
    let store = SqliteStore::open(&cli.database)?;

    if cli.seed {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        if confirm_seed(&store, &mut input, &mut io::stderr())? {
            seed::seed_demo(&store)?;
        }
    } else if fresh {
        seed::insert_dummy(&store)?;
    }

    litebrowse_tui::run(store, config)?;
    Ok(())
}

/// Seeding drops and recreates tables, so a database that already holds
/// tables needs an explicit yes first. A fresh or empty database seeds
/// without asking.
fn confirm_seed(
    store: &SqliteStore,
    input: &mut impl BufRead,
    prompt: &mut impl Write,
) -> Result<bool, Box<dyn std::error::Error>> {
    let tables = store.list_tables()?;
    if tables.is_empty() {
        return Ok(true);
    }

    write!(
        prompt,
        "database already contains {} table(s); overwrite demo tables? [y/N] ",
        tables.len()
    )?;
    prompt.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y" | "yes" | "YES")
}

/// File logging is off unless DEBUG is set; the alternate screen owns
/// stdout and stderr while the browser runs.
fn init_logging() -> io::Result<()> {
    if std::env::var_os("DEBUG").is_none() {
        return Ok(());
    }

    let file = std::fs::File::create("litebrowse.log")?;
    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();
    Ok(())
}
