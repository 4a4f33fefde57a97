//! Site tooling configuration.
//!
//! Handles loading, validating, and merging the `site.toml` file found in the
//! site root. Every value has a stock default; the file only needs the keys it
//! wants to override. Nothing here is process-wide state: the resolved
//! [`SiteConfig`] is passed explicitly into each job.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [snippets]
//! manifest_name = "snippets.toml"    # Snippet manifests discovered under the root
//! output_dir = "generated/snippets"  # Rendered markdown fragments
//! omitted_placeholder = "..."        # Marker line for skipped source lines
//! strip_mode = "dedent"              # preserve | trim-all | dedent
//! trailing_marker = false            # Marker after a selection that ends early
//!
//! [authors]
//! file = "blog/authors.yml"
//! output_dir = "static/img/authors"
//! public_path = "/img/authors"
//! api_url = "https://api.github.com/users"
//!
//! [changelog]
//! url = "https://raw.githubusercontent.com/Rust-GPU/rust-gpu/main/CHANGELOG.md"
//! output = "src/pages/changelog.md"
//! id = "changelog"
//! title = "Changelog"
//! sidebar_label = "Changelog"
//!
//! [fetch]
//! user_agent = "rust-gpu-site"
//!
//! [processing]
//! max_processes = 4                  # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::snippet::{RenderOptions, StripMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the configuration file in the site root.
pub const CONFIG_FILENAME: &str = "site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site tooling configuration loaded from `site.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Code snippet manifests and rendering.
    pub snippets: SnippetsConfig,
    /// Author avatar fetch job.
    pub authors: AuthorsConfig,
    /// Changelog mirror job.
    pub changelog: ChangelogConfig,
    /// Outbound HTTP settings shared by the fetch jobs.
    pub fetch: FetchConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.snippets.manifest_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "snippets.manifest_name must not be empty".into(),
            ));
        }
        if self.snippets.omitted_placeholder.contains('\n') {
            return Err(ConfigError::Validation(
                "snippets.omitted_placeholder must be a single line".into(),
            ));
        }
        if !is_http_url(&self.authors.api_url) {
            return Err(ConfigError::Validation(
                "authors.api_url must be an http(s) URL".into(),
            ));
        }
        if !self.authors.public_path.starts_with('/') {
            return Err(ConfigError::Validation(
                "authors.public_path must start with '/'".into(),
            ));
        }
        if !is_http_url(&self.changelog.url) {
            return Err(ConfigError::Validation(
                "changelog.url must be an http(s) URL".into(),
            ));
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "fetch.user_agent must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// Snippet manifest discovery and rendering defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnippetsConfig {
    /// File name of snippet manifests, searched for anywhere under the root.
    pub manifest_name: String,
    /// Directory (relative to the root) receiving rendered fragments.
    pub output_dir: String,
    /// Marker line inserted where source lines are skipped.
    pub omitted_placeholder: String,
    /// Whitespace policy applied to snippets with `strip_leading_spaces = true`.
    pub strip_mode: StripMode,
    /// Add a marker after a selection that stops before the end of the file.
    pub trailing_marker: bool,
}

impl Default for SnippetsConfig {
    fn default() -> Self {
        Self {
            manifest_name: "snippets.toml".to_string(),
            output_dir: "generated/snippets".to_string(),
            omitted_placeholder: crate::snippet::DEFAULT_PLACEHOLDER.to_string(),
            strip_mode: StripMode::Dedent,
            trailing_marker: false,
        }
    }
}

impl SnippetsConfig {
    /// Render options for one snippet, applying its per-snippet overrides.
    pub fn render_options(
        &self,
        strip_leading_spaces: bool,
        placeholder: Option<&str>,
    ) -> RenderOptions {
        RenderOptions {
            omitted_placeholder: placeholder
                .unwrap_or(&self.omitted_placeholder)
                .to_string(),
            strip: if strip_leading_spaces {
                self.strip_mode
            } else {
                StripMode::Preserve
            },
            trailing_marker: self.trailing_marker,
        }
    }
}

/// Author avatar fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorsConfig {
    /// Authors YAML file (relative to the root), rewritten with `image_url`s.
    pub file: String,
    /// Directory (relative to the root) where avatars are saved.
    pub output_dir: String,
    /// URL prefix under which the site serves `output_dir`.
    pub public_path: String,
    /// GitHub users API base; `{api_url}/{username}` must return `avatar_url`.
    pub api_url: String,
}

impl Default for AuthorsConfig {
    fn default() -> Self {
        Self {
            file: "blog/authors.yml".to_string(),
            output_dir: "static/img/authors".to_string(),
            public_path: "/img/authors".to_string(),
            api_url: "https://api.github.com/users".to_string(),
        }
    }
}

/// Changelog mirror settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChangelogConfig {
    /// Raw markdown URL of the upstream changelog.
    pub url: String,
    /// Output page (relative to the root).
    pub output: String,
    /// Front matter `id`.
    pub id: String,
    /// Front matter `title`.
    pub title: String,
    /// Front matter `sidebar_label`.
    pub sidebar_label: String,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            url: "https://raw.githubusercontent.com/Rust-GPU/rust-gpu/main/CHANGELOG.md"
                .to_string(),
            output: "src/pages/changelog.md".to_string(),
            id: "changelog".to_string(),
            title: "Changelog".to_string(),
            sidebar_label: "Changelog".to_string(),
        }
    }
}

/// Outbound HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// `User-Agent` header; the GitHub API rejects requests without one.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("rust-gpu-site/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel snippet-checking workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `site.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `site.toml`.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `site.toml` in the site root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `site.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Rust GPU site tooling configuration
# ===================================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Paths are relative to the site root
# (the directory holding this file). Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Code snippets
# ---------------------------------------------------------------------------
[snippets]
# Snippet manifests are discovered anywhere under the site root by this name.
manifest_name = "snippets.toml"

# Rendered markdown fragments land here, mirroring the manifest locations.
output_dir = "generated/snippets"

# Line inserted wherever a snippet skips source lines.
omitted_placeholder = "..."

# Whitespace policy for snippets that set strip_leading_spaces = true:
#   "dedent"   - shift the least-indented selected line to column 0
#   "trim-all" - remove all leading whitespace from every line
#   "preserve" - leave lines untouched
strip_mode = "dedent"

# Also add a marker after a selection that ends before the last source line.
trailing_marker = false

# ---------------------------------------------------------------------------
# Author avatars (fetch-avatars)
# ---------------------------------------------------------------------------
[authors]
# Authors file; entries with socials.github get an image_url.
file = "blog/authors.yml"

# Where downloaded avatars are written.
output_dir = "static/img/authors"

# URL prefix the site serves output_dir under.
public_path = "/img/authors"

# GitHub users API base URL.
api_url = "https://api.github.com/users"

# ---------------------------------------------------------------------------
# Changelog mirror (fetch-changelog)
# ---------------------------------------------------------------------------
[changelog]
url = "https://raw.githubusercontent.com/Rust-GPU/rust-gpu/main/CHANGELOG.md"
output = "src/pages/changelog.md"

# Front matter written above the mirrored document.
id = "changelog"
title = "Changelog"
sidebar_label = "Changelog"

# ---------------------------------------------------------------------------
# HTTP
# ---------------------------------------------------------------------------
[fetch]
# User-Agent sent with every request (defaults to rust-gpu-site/<version>).
# user_agent = "rust-gpu-site"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel snippet-checking workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
