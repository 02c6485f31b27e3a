//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use kitchen_scraper::config::{
    DEFAULT_CATALOG_PATH, DEFAULT_IMAGES_PER_ENTRY, DEFAULT_SITE_ROOT, MAX_IMAGES_PER_ENTRY,
    MIN_IMAGES_PER_ENTRY,
};

/// Default retry budget on top of the initial attempt.
pub const DEFAULT_MAX_RETRIES: u8 = 4;

/// Harvest kitchen catalog pages into a described, illustrated archive.
///
/// Discovers the catalog of the target site, then downloads the description
/// and gallery of the selected kitchens into a zip archive with a CSV manifest.
#[derive(Parser, Debug)]
#[command(name = "kitchen-scraper")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Site hosting the catalog
    #[arg(long, default_value = DEFAULT_SITE_ROOT, global = true)]
    pub site_root: String,

    /// Path of the catalog listing page on the site
    #[arg(long, default_value = DEFAULT_CATALOG_PATH, global = true)]
    pub catalog_path: String,

    /// Maximum retry attempts for transient failures (0-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_RETRIES, value_parser = clap::value_parser!(u8).range(0..=10), global = true)]
    pub max_retries: u8,

    /// Override the User-Agent header sent with every request
    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover the catalog and print the kitchen names
    List(ListArgs),
    /// Scrape the selected kitchens and build the archive
    Run(RunArgs),
}

#[derive(ClapArgs, Debug)]
pub struct ListArgs {
    /// Print the catalog as a JSON array
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug)]
pub struct RunArgs {
    /// Kitchen to scrape, by display name (repeatable)
    #[arg(short, long = "select", value_name = "NAME")]
    pub select: Vec<String>,

    /// Scrape every kitchen in the catalog
    #[arg(long, conflicts_with = "select")]
    pub all: bool,

    /// Images to download per kitchen (1-12)
    #[arg(short, long, default_value_t = DEFAULT_IMAGES_PER_ENTRY as u8, value_parser = clap::value_parser!(u8).range(MIN_IMAGES_PER_ENTRY as i64..=MAX_IMAGES_PER_ENTRY as i64))]
    pub images: u8,

    /// Output tree (cleared at the start of the run)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Archive file to write
    #[arg(short, long)]
    pub archive: Option<PathBuf>,
}
