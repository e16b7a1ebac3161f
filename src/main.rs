use clap::Parser;
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

mod archive;
mod cache;
mod cell;
mod config;
mod detect;
mod error;
mod extract;
mod fetch;
mod link;
mod routes;
mod run;

use config::{Config, CACHE_DIR, OUTPUT_DIR, PAGE_URL};
use fetch::HttpFetcher;
use run::Outcome;

/// Exit status when upstream changed and CSVs were regenerated
const EXIT_UPDATED: u8 = 1;
const EXIT_FAILED: u8 = 2;

#[derive(Parser)]
#[command(name = "jma-code-dictionary")]
#[command(about = "Regenerate JMA XML code table CSVs when the published archive changes")]
#[command(
    after_help = "Exit status: 0 = nothing changed, 1 = CSVs regenerated, 2 = failure"
)]
// No options are needed; the hidden flags only override the fixed locations
struct Cli {
    /// Technical material page linking to the code table archive
    #[arg(long, default_value = PAGE_URL, hide = true)]
    page_url: String,
    /// Directory holding the Last-Modified cache files
    #[arg(long, default_value = CACHE_DIR, hide = true)]
    cache_dir: PathBuf,
    /// Directory the CSV files are written to
    #[arg(long, default_value = OUTPUT_DIR, hide = true)]
    output_dir: PathBuf,
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let config = Config {
        page_url: cli.page_url,
        cache_dir: cli.cache_dir,
        output_dir: cli.output_dir,
    };

    let result = HttpFetcher::new().and_then(|fetcher| run::run(&config, &fetcher));

    match result {
        Ok(Outcome::Unchanged) => ExitCode::SUCCESS,
        Ok(Outcome::Updated) => ExitCode::from(EXIT_UPDATED),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_FAILED)
        }
    }
}
