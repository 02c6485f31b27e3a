//! Per-run orchestration over an injected catalog snapshot.
//!
//! A run moves through [`RunPhase`]s strictly in order. Entries and their
//! images are processed one at a time; any network failure inside an entry
//! is logged and the run moves on. Only local filesystem failures on the
//! output tree, manifest or archive end a run early.
//!
//! ```no_run
//! use kitchen_scraper::{Catalog, HttpClient, Pipeline, ScraperConfig};
//!
//! # async fn example(catalog: Catalog) -> Result<(), kitchen_scraper::PipelineError> {
//! let pipeline = Pipeline::new(HttpClient::new(), catalog, ScraperConfig::default());
//! let outcome = pipeline.run(&["Kali".to_string()], 3).await?;
//! println!("{}", outcome.log);
//! # Ok(())
//! # }
//! ```

mod log;
mod plan;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::catalog::Catalog;
use crate::config::{MAX_IMAGES_PER_ENTRY, MIN_IMAGES_PER_ENTRY, ScraperConfig};
use crate::download::{HttpClient, fetch_image};
use crate::output::{
    MANIFEST_FILE_NAME, ManifestRecord, OutputError, remove_file_if_exists, reset_dir,
    write_archive, write_description, write_manifest,
};

pub use log::RunLog;
pub use plan::{EntryPlan, ImageTarget, plan_entry};

/// Message returned when a run is started without any selected entry.
pub const EMPTY_SELECTION_MESSAGE: &str = "Select at least one entry.";

/// Errors that abort a run. Network failures never surface here.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Writing the output tree, manifest or archive failed.
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Phases of one run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Initializing,
    ProcessingEntry { index: usize, total: usize },
    Finalizing,
    Done,
}

/// Result of one run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Archive written by the run; `None` when nothing was produced.
    pub archive_path: Option<PathBuf>,
    /// Multi-line human-readable log.
    pub log: String,
    /// Manifest rows in processing order.
    pub manifest: Vec<ManifestRecord>,
}

/// Discovery-free scraper over a fixed catalog snapshot.
#[derive(Debug)]
pub struct Pipeline {
    client: HttpClient,
    catalog: Catalog,
    config: ScraperConfig,
}

enum EntryResult {
    Processed(ManifestRecord),
    Skipped,
}

impl Pipeline {
    #[must_use]
    pub fn new(client: HttpClient, catalog: Catalog, config: ScraperConfig) -> Self {
        Self {
            client,
            catalog,
            config,
        }
    }

    /// The catalog snapshot selections are resolved against.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Scrapes the selected entries and packages the output tree.
    ///
    /// Selection names are display names of the catalog; duplicates are
    /// dropped keeping the first occurrence, and entries are processed in
    /// selection order. `images_per_entry` is clamped to the accepted range.
    /// An empty selection returns the validation message without touching
    /// the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] only when the output tree, manifest or
    /// archive cannot be written.
    #[instrument(skip(self, selection), fields(selected = selection.len()))]
    pub async fn run(
        &self,
        selection: &[String],
        images_per_entry: usize,
    ) -> Result<RunOutcome, PipelineError> {
        let mut log = RunLog::new();
        let mut phase = RunPhase::Idle;

        let selection = dedup_selection(selection);
        if selection.is_empty() {
            log.push(EMPTY_SELECTION_MESSAGE);
            return Ok(RunOutcome {
                archive_path: None,
                log: log.into_text(),
                manifest: Vec::new(),
            });
        }
        let images_per_entry = images_per_entry.clamp(MIN_IMAGES_PER_ENTRY, MAX_IMAGES_PER_ENTRY);

        advance(&mut phase, RunPhase::Initializing);
        reset_dir(&self.config.output_dir)?;
        remove_file_if_exists(&self.config.archive_path)?;

        let total = selection.len();
        log.push(format!(
            "Start: {total} entries | {images_per_entry} images/entry"
        ));

        let mut manifest = Vec::new();
        let mut used_dirs = HashSet::new();
        for (offset, name) in selection.iter().enumerate() {
            let index = offset + 1;
            advance(&mut phase, RunPhase::ProcessingEntry { index, total });
            let prefix = format!("- {index}/{total}");

            let result = self
                .process_entry(name, images_per_entry, &prefix, &mut used_dirs, &mut log)
                .await?;
            if let EntryResult::Processed(record) = result {
                manifest.push(record);
                if index < total && !self.config.entry_delay.is_zero() {
                    tokio::time::sleep(self.config.entry_delay).await;
                }
            }
        }

        advance(&mut phase, RunPhase::Finalizing);
        write_manifest(&self.config.output_dir.join(MANIFEST_FILE_NAME), &manifest)?;
        write_archive(
            &self.config.output_dir,
            &self.config.archive_path,
            &self.config.archive_root,
        )?;
        log.push(format!(
            "archive ready: {}",
            self.config.archive_path.display()
        ));
        advance(&mut phase, RunPhase::Done);

        Ok(RunOutcome {
            archive_path: Some(self.config.archive_path.clone()),
            log: log.into_text(),
            manifest,
        })
    }

    async fn process_entry(
        &self,
        name: &str,
        image_cap: usize,
        prefix: &str,
        used_dirs: &mut HashSet<String>,
        log: &mut RunLog,
    ) -> Result<EntryResult, PipelineError> {
        let Some(url) = self.catalog.lookup(name) else {
            log.push(format!("{prefix} {name}: URL not found, skipping."));
            return Ok(EntryResult::Skipped);
        };

        let started = Instant::now();
        let body = match self.client.fetch_page(url.as_str()).await {
            Ok(body) => body,
            Err(e) => {
                warn!(entry = name, url = %url, error = %e, "detail page unavailable");
                log.push(format!("{prefix} {name}: page not loaded, skipping."));
                return Ok(EntryResult::Skipped);
            }
        };
        let plan = plan::plan_from_source(&body, url, name, image_cap);

        if !used_dirs.insert(plan.dir_name.clone()) {
            warn!(dir = %plan.dir_name, "output directory already used in this run");
            log.push(format!(
                "{prefix} {}: directory already used in this run, files may be overwritten",
                plan.dir_name
            ));
        }

        let entry_dir = self.config.output_dir.join(&plan.dir_name);
        write_description(&entry_dir, &plan.description)?;

        let saved = self.download_images(&plan, &entry_dir, started).await;

        log.push(format!(
            "{prefix} {}: found {}, saved {saved}",
            plan.dir_name,
            plan.images.len()
        ));
        Ok(EntryResult::Processed(ManifestRecord {
            kitchen_name: plan.dir_name.clone(),
            url: url.to_string(),
            description_chars: plan.description_chars(),
            images_saved: saved,
        }))
    }

    /// Downloads the planned images until done or the entry budget is spent.
    async fn download_images(&self, plan: &EntryPlan, entry_dir: &Path, started: Instant) -> usize {
        let mut saved = 0;
        for (position, target) in plan.images.iter().enumerate() {
            if started.elapsed() > self.config.entry_time_budget {
                debug!(
                    dir = %plan.dir_name,
                    remaining = plan.images.len() - position,
                    "entry time budget exhausted"
                );
                break;
            }
            if position > 0 && !self.config.image_delay.is_zero() {
                tokio::time::sleep(self.config.image_delay).await;
            }
            let dest = entry_dir.join(&target.file_name);
            let outcome =
                fetch_image(&self.client, &target.url, &dest, self.config.max_image_bytes).await;
            if outcome.success() {
                saved += 1;
            }
        }
        saved
    }
}

fn advance(phase: &mut RunPhase, next: RunPhase) {
    debug!(from = ?phase, to = ?next, "run phase");
    *phase = next;
}

/// Drops repeated names keeping first occurrences.
fn dedup_selection(selection: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    selection
        .iter()
        .map(String::as_str)
        .filter(|name| seen.insert(*name))
        .collect()
}
