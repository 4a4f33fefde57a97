//! Changelog mirror.
//!
//! The project changelog lives in the main repository. At build time it is
//! fetched once and written as a site page with front matter prepended:
//!
//! ```text
//! ---
//! id: changelog
//! title: Changelog
//! sidebar_label: Changelog
//! ---
//!
//! <upstream CHANGELOG.md, unchanged>
//! ```
//!
//! Unlike the avatar job there is no partial success: if the fetch fails, the
//! job fails and the existing page is left as it was.

use crate::config::ChangelogConfig;
use crate::fetch::{FetchError, Fetcher};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChangelogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to fetch changelog: {0}")]
    Fetch(#[from] FetchError),
}

/// Result of a successful mirror run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogReport {
    pub output: PathBuf,
    pub bytes: usize,
}

/// Front matter block written above the mirrored document.
pub fn front_matter(config: &ChangelogConfig) -> String {
    format!(
        "---\nid: {}\ntitle: {}\nsidebar_label: {}\n---\n\n",
        config.id, config.title, config.sidebar_label
    )
}

/// Fetch the upstream changelog and write it under `root`.
pub fn mirror(
    fetcher: &impl Fetcher,
    config: &ChangelogConfig,
    root: &Path,
) -> Result<ChangelogReport, ChangelogError> {
    tracing::info!(url = %config.url, "fetching changelog");
    let body = fetcher.get_text(&config.url)?;

    let page = format!("{}{}", front_matter(config), body);
    let output = root.join(&config.output);
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output, &page)?;
    tracing::info!(path = %output.display(), bytes = page.len(), "changelog written");

    Ok(ChangelogReport {
        output,
        bytes: page.len(),
    })
}
