//! CLI entry point for the kitchen scraper.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use kitchen_scraper::config::validate_images_per_entry;
use kitchen_scraper::{
    Catalog, ClientSettings, HttpClient, Pipeline, RetryPolicy, ScraperConfig, SiteLayout, discover,
};
use tracing::{debug, info};

mod cli;

use cli::{Args, Command, ListArgs, RunArgs};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    init_tracing(default_level);

    debug!(?args, "CLI arguments parsed");

    let config = build_config(&args)?;
    let client = HttpClient::with_settings(config.client.clone())
        .context("failed to build HTTP client")?;

    match &args.command {
        Command::List(list_args) => run_list(&client, &config, list_args).await,
        Command::Run(run_args) => run_scrape(client, config, run_args).await,
    }
}

fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

fn build_config(args: &Args) -> Result<ScraperConfig> {
    let site = SiteLayout::new(&args.site_root, &args.catalog_path)?;
    let mut config = ScraperConfig::for_site(site);

    let mut client = ClientSettings {
        retry_policy: RetryPolicy::with_max_retries(u32::from(args.max_retries)),
        ..ClientSettings::default()
    };
    if let Some(user_agent) = &args.user_agent {
        client.user_agent.clone_from(user_agent);
    }
    config.client = client;

    if let Command::Run(run_args) = &args.command {
        if let Some(dir) = &run_args.output_dir {
            config.output_dir.clone_from(dir);
        }
        if let Some(archive) = &run_args.archive {
            config.archive_path.clone_from(archive);
        }
    }

    config.validate()?;
    Ok(config)
}

async fn run_list(client: &HttpClient, config: &ScraperConfig, list_args: &ListArgs) -> Result<()> {
    let entries = discover(client, &config.site, config.discovery_delay).await;
    if entries.is_empty() {
        info!("No kitchens found in the catalog");
    }

    let mut stdout = std::io::stdout().lock();
    if list_args.json {
        serde_json::to_writer_pretty(&mut stdout, &entries)?;
        writeln!(stdout)?;
    } else {
        for entry in &entries {
            writeln!(stdout, "{}", entry.display_name)?;
        }
    }
    Ok(())
}

async fn run_scrape(client: HttpClient, config: ScraperConfig, run_args: &RunArgs) -> Result<()> {
    // Nothing selected: skip discovery, the pipeline reports the validation message.
    let catalog = if run_args.all || !run_args.select.is_empty() {
        let entries = discover(&client, &config.site, config.discovery_delay).await;
        Catalog::new(entries)
    } else {
        Catalog::default()
    };

    let images_per_entry = validate_images_per_entry(usize::from(run_args.images))?;
    let pipeline = Pipeline::new(client, catalog, config);
    let selection: Vec<String> = if run_args.all {
        pipeline.catalog().names().map(str::to_string).collect()
    } else {
        run_args.select.clone()
    };

    let outcome = pipeline.run(&selection, images_per_entry).await?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", outcome.log)?;
    if let Some(archive) = &outcome.archive_path {
        writeln!(stdout, "{}", archive.display())?;
    }
    Ok(())
}
