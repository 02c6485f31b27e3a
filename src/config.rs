//! Site layout and run tunables.
//!
//! Every constant the pipeline depends on lives in [`ScraperConfig`] so a
//! run can be pointed at another host (a mock server in tests) and so the
//! CLI can override the defaults without any configuration file.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::download::{ClientSettings, MAX_IMAGE_BYTES};

/// Canonical site of the kitchen catalog.
pub const DEFAULT_SITE_ROOT: &str = "https://www.creokitchens.it";

/// Path of the catalog listing page; detail pages live one level below it.
pub const DEFAULT_CATALOG_PATH: &str = "/it/cucine";

/// Folder name used for the output tree and as the archive root.
pub const DEFAULT_ARCHIVE_ROOT: &str = "creo_cucine";

/// Default number of images fetched per entry.
pub const DEFAULT_IMAGES_PER_ENTRY: usize = 3;

/// Smallest accepted images-per-entry value.
pub const MIN_IMAGES_PER_ENTRY: usize = 1;

/// Largest accepted images-per-entry value.
pub const MAX_IMAGES_PER_ENTRY: usize = 12;

/// Pause between catalog entries.
pub const ENTRY_DELAY: Duration = Duration::from_millis(300);

/// Pause between image downloads of one entry.
pub const IMAGE_DELAY: Duration = Duration::from_millis(100);

/// Pause between detail-page fetches during discovery.
pub const DISCOVERY_DELAY: Duration = Duration::from_millis(20);

/// Wall-clock budget for the images of one entry.
pub const ENTRY_TIME_BUDGET: Duration = Duration::from_secs(120);

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The site root is not an absolute http(s) URL with a host.
    #[error("invalid site root {value}: expected an absolute http(s) URL")]
    InvalidSiteRoot {
        /// The rejected value.
        value: String,
    },

    /// The catalog path cannot be joined onto the site root.
    #[error("invalid catalog path {value}")]
    InvalidCatalogPath {
        /// The rejected value.
        value: String,
    },

    /// Images-per-entry outside the accepted range.
    #[error(
        "invalid images per entry {value}: must be between {MIN_IMAGES_PER_ENTRY} and {MAX_IMAGES_PER_ENTRY}"
    )]
    InvalidImagesPerEntry {
        /// The rejected value.
        value: usize,
    },

    /// The archive would be written inside the tree it packages.
    #[error("archive path {archive} must not be inside output directory {output_dir}")]
    ArchiveInsideOutput {
        /// Archive file path.
        archive: PathBuf,
        /// Output tree root.
        output_dir: PathBuf,
    },

    /// Clearing the output directory would delete a directory the user
    /// still needs.
    #[error("refusing to use {output_dir} as output directory: it is {reason}")]
    UnsafeOutputDir {
        /// Output tree root as given.
        output_dir: PathBuf,
        /// What the directory is.
        reason: &'static str,
    },

    /// A timeout of zero would fail every request.
    #[error("{field} must be greater than zero")]
    ZeroTimeout {
        /// Name of the offending setting.
        field: &'static str,
    },
}

/// Where the catalog lives on the target site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    site_root: Url,
    listing_url: Url,
    detail_prefix: String,
}

impl SiteLayout {
    /// Builds a layout from a site root and the catalog listing path.
    ///
    /// Detail pages are the paths directly under `catalog_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSiteRoot`] when `site_root` is not an
    /// absolute http(s) URL and [`ConfigError::InvalidCatalogPath`] when the
    /// path cannot be joined onto it.
    pub fn new(site_root: &str, catalog_path: &str) -> Result<Self, ConfigError> {
        let root = Url::parse(site_root).map_err(|_| ConfigError::InvalidSiteRoot {
            value: site_root.to_string(),
        })?;
        if !matches!(root.scheme(), "http" | "https") || root.host_str().is_none() {
            return Err(ConfigError::InvalidSiteRoot {
                value: site_root.to_string(),
            });
        }

        let trimmed = catalog_path.trim_end_matches('/');
        if !trimmed.starts_with('/') || trimmed.len() < 2 {
            return Err(ConfigError::InvalidCatalogPath {
                value: catalog_path.to_string(),
            });
        }
        let listing_url = root
            .join(trimmed)
            .map_err(|_| ConfigError::InvalidCatalogPath {
                value: catalog_path.to_string(),
            })?;

        Ok(Self {
            site_root: root,
            listing_url,
            detail_prefix: format!("{trimmed}/"),
        })
    }

    /// The canonical site root.
    #[must_use]
    pub fn site_root(&self) -> &Url {
        &self.site_root
    }

    /// The catalog listing page.
    #[must_use]
    pub fn listing_url(&self) -> &Url {
        &self.listing_url
    }

    /// Path prefix every detail page starts with (trailing slash included).
    #[must_use]
    pub fn detail_prefix(&self) -> &str {
        &self.detail_prefix
    }
}

impl Default for SiteLayout {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self::new(DEFAULT_SITE_ROOT, DEFAULT_CATALOG_PATH).expect("default site layout is valid")
    }
}

/// All tunables of a discovery + scrape run.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Target site layout.
    pub site: SiteLayout,
    /// HTTP client construction settings.
    pub client: ClientSettings,
    /// Root of the output tree (cleared at the start of each run).
    pub output_dir: PathBuf,
    /// Archive file written after the tree is populated.
    pub archive_path: PathBuf,
    /// Folder name every archive member is rooted under.
    pub archive_root: String,
    /// Maximum bytes per image.
    pub max_image_bytes: u64,
    /// Pause between entries.
    pub entry_delay: Duration,
    /// Pause between images of one entry.
    pub image_delay: Duration,
    /// Pause between detail-page fetches during discovery.
    pub discovery_delay: Duration,
    /// Wall-clock budget for the images of one entry.
    pub entry_time_budget: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        let tmp = std::env::temp_dir();
        Self {
            site: SiteLayout::default(),
            client: ClientSettings::default(),
            output_dir: tmp.join(DEFAULT_ARCHIVE_ROOT),
            archive_path: tmp.join(format!("{DEFAULT_ARCHIVE_ROOT}.zip")),
            archive_root: DEFAULT_ARCHIVE_ROOT.to_string(),
            max_image_bytes: MAX_IMAGE_BYTES,
            entry_delay: ENTRY_DELAY,
            image_delay: IMAGE_DELAY,
            discovery_delay: DISCOVERY_DELAY,
            entry_time_budget: ENTRY_TIME_BUDGET,
        }
    }
}

impl ScraperConfig {
    /// Default configuration aimed at another site layout.
    #[must_use]
    pub fn for_site(site: SiteLayout) -> Self {
        Self {
            site,
            ..Self::default()
        }
    }

    /// Validates cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroTimeout`] for a zero connect/read timeout,
    /// [`ConfigError::ArchiveInsideOutput`] when the archive would be
    /// written into the tree it packages, and [`ConfigError::UnsafeOutputDir`]
    /// when the output tree (cleared at the start of every run) is a
    /// filesystem root or contains the working or home directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client.connect_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout {
                field: "connect_timeout",
            });
        }
        if self.client.read_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout {
                field: "read_timeout",
            });
        }
        if let Some(reason) = unsafe_output_dir_reason(&self.output_dir) {
            return Err(ConfigError::UnsafeOutputDir {
                output_dir: self.output_dir.clone(),
                reason,
            });
        }
        if self.archive_path.starts_with(&self.output_dir) {
            return Err(ConfigError::ArchiveInsideOutput {
                archive: self.archive_path.clone(),
                output_dir: self.output_dir.clone(),
            });
        }
        Ok(())
    }
}

fn unsafe_output_dir_reason(output_dir: &Path) -> Option<&'static str> {
    let target = resolve_path(output_dir);
    if target.parent().is_none() {
        return Some("a filesystem root");
    }
    if let Ok(cwd) = std::env::current_dir()
        && resolve_path(&cwd).starts_with(&target)
    {
        return Some("the working directory or one of its parents");
    }
    if let Some(home) = env_var_non_empty_os("HOME")
        && resolve_path(Path::new(&home)).starts_with(&target)
    {
        return Some("the home directory or one of its parents");
    }
    None
}

/// Absolute form of `path`: symlinks resolved when it exists, otherwise
/// `.` and `..` folded lexically against the working directory.
fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    let mut resolved = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    resolved
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = std::env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Checks an images-per-entry value against the accepted range.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidImagesPerEntry`] outside 1..=12.
pub fn validate_images_per_entry(value: usize) -> Result<usize, ConfigError> {
    if (MIN_IMAGES_PER_ENTRY..=MAX_IMAGES_PER_ENTRY).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidImagesPerEntry { value })
    }
}
