//! Snippet manifests: discovery, checking, and fragment output.
//!
//! Each blog post (or any other directory of the site) declares the code
//! excerpts it shows in a `snippets.toml` next to the code it quotes:
//!
//! ```toml
//! [[snippet]]
//! name = "isomorphic-glam"
//! source = "code/crates/shared/isomorphic/src/lib.rs"   # relative to this file
//! language = "rust"
//! lines = "15-19"
//! hash = "a3dbf2f"
//! title = "Using glam on CPU and GPU"                    # optional
//! strip_leading_spaces = true                            # optional
//! omitted_placeholder = "// ..."                         # optional
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! discover   site root      →  manifest paths        (walkdir)
//! load       manifest path  →  SnippetManifest       (toml)
//! check      manifests      →  Vec<CheckOutcome>     (rayon, order preserved)
//! write      outcomes       →  <output_dir>/…/<name>.md
//! ```
//!
//! Writing is all-or-nothing: if any snippet fails its check, no fragment is
//! written and the caller sees [`ManifestError::Failed`].

use crate::config::SnippetsConfig;
use crate::snippet::{self, SnippetError};
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Directories never searched for manifests: dependencies, cargo output and
/// the site generator's `build/` output, which mirrors blog posts.
const SKIPPED_DIRS: &[&str] = &["node_modules", "target", "build"];

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Invalid snippet manifest {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid snippet name '{name}' in {path} (use letters, digits, '-' and '_')")]
    InvalidName { name: String, path: PathBuf },
    #[error("Duplicate snippet name '{name}' in {path}")]
    DuplicateName { name: String, path: PathBuf },
    #[error("{0} snippet(s) failed validation; nothing was written")]
    Failed(usize),
}

/// One `[[snippet]]` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnippetEntry {
    /// Identifier, also the output file stem.
    pub name: String,
    /// Source file, relative to the manifest's directory.
    pub source: String,
    /// Language tag for syntax highlighting.
    #[serde(default)]
    pub language: Option<String>,
    /// Line selector (`"1-5,7"`). Absent means the whole file.
    #[serde(default)]
    pub lines: Option<String>,
    /// Pinned short fingerprint of the source.
    #[serde(default)]
    pub hash: Option<String>,
    /// Title shown above the code block.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub strip_leading_spaces: bool,
    #[serde(default)]
    pub omitted_placeholder: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    #[serde(default)]
    snippet: Vec<SnippetEntry>,
}

/// A loaded manifest file.
#[derive(Debug, Clone)]
pub struct SnippetManifest {
    pub path: PathBuf,
    pub snippets: Vec<SnippetEntry>,
}

impl SnippetManifest {
    /// Parse and validate a manifest. Unknown keys, malformed names and
    /// duplicate names are rejected.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path)?;
        let file: ManifestFile = toml::from_str(&content).map_err(|source| ManifestError::Toml {
            path: path.to_path_buf(),
            source,
        })?;

        let mut seen = HashSet::new();
        for entry in &file.snippet {
            if !is_valid_name(&entry.name) {
                return Err(ManifestError::InvalidName {
                    name: entry.name.clone(),
                    path: path.to_path_buf(),
                });
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ManifestError::DuplicateName {
                    name: entry.name.clone(),
                    path: path.to_path_buf(),
                });
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            snippets: file.snippet,
        })
    }

    /// Directory that `source` paths are relative to.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Find every manifest named `manifest_name` under `root`, sorted by path.
///
/// Hidden directories and build/dependency directories are not descended into.
pub fn discover(root: &Path, manifest_name: &str) -> Result<Vec<PathBuf>, ManifestError> {
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e));

    let mut found = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && entry.file_name() == manifest_name {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&&*name)
}

/// Discover and load every manifest under `root`.
pub fn load_all(root: &Path, manifest_name: &str) -> Result<Vec<SnippetManifest>, ManifestError> {
    discover(root, manifest_name)?
        .iter()
        .map(|path| SnippetManifest::load(path))
        .collect()
}

/// Result of checking one snippet.
#[derive(Debug)]
pub struct CheckOutcome {
    pub manifest: PathBuf,
    pub entry: SnippetEntry,
    /// Rendered excerpt, or why it could not be produced.
    pub result: Result<String, SnippetError>,
}

impl CheckOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Validate and render every snippet of every manifest.
///
/// Snippets are independent, so they are checked in parallel; the returned
/// outcomes follow manifest order, then declaration order.
pub fn check(manifests: &[SnippetManifest], config: &SnippetsConfig) -> Vec<CheckOutcome> {
    let jobs: Vec<(&SnippetManifest, &SnippetEntry)> = manifests
        .iter()
        .flat_map(|m| m.snippets.iter().map(move |e| (m, e)))
        .collect();

    jobs.par_iter()
        .map(|(manifest, entry)| CheckOutcome {
            manifest: manifest.path.clone(),
            entry: (*entry).clone(),
            result: check_entry(manifest, entry, config),
        })
        .collect()
}

fn check_entry(
    manifest: &SnippetManifest,
    entry: &SnippetEntry,
    config: &SnippetsConfig,
) -> Result<String, SnippetError> {
    let source = manifest.dir().join(&entry.source);
    let content = snippet::load_source(&source)?;
    let options =
        config.render_options(entry.strip_leading_spaces, entry.omitted_placeholder.as_deref());
    let rendered = snippet::render(
        &content,
        entry.lines.as_deref(),
        entry.hash.as_deref(),
        &options,
    );
    if let Err(err) = &rendered {
        tracing::debug!(snippet = %entry.name, source = %source.display(), error = %err, "snippet check failed");
    }
    rendered
}

/// Wrap a rendered excerpt in a fenced code block carrying the language and
/// title, ready to be included by the site.
pub fn render_fragment(entry: &SnippetEntry, body: &str) -> String {
    let body = body.strip_suffix('\n').unwrap_or(body);
    let fence = "`".repeat(longest_backtick_run(body).max(2) + 1);

    let mut info = entry.language.clone().unwrap_or_default();
    if let Some(title) = &entry.title {
        if !info.is_empty() {
            info.push(' ');
        }
        info.push_str(&format!("title=\"{}\"", title.replace('"', "'")));
    }

    format!("{fence}{info}\n{body}\n{fence}\n")
}

fn longest_backtick_run(text: &str) -> usize {
    text.split(|c: char| c != '`').map(str::len).max().unwrap_or(0)
}

/// Output path of a fragment: the manifest's location relative to `root`,
/// mirrored under `output_dir`.
pub fn fragment_path(root: &Path, output_dir: &Path, outcome: &CheckOutcome) -> PathBuf {
    let manifest_dir = outcome.manifest.parent().unwrap_or(Path::new(""));
    let relative = manifest_dir.strip_prefix(root).unwrap_or(manifest_dir);
    output_dir
        .join(relative)
        .join(format!("{}.md", outcome.entry.name))
}

/// Write one fragment per snippet. Refuses to write anything if any outcome
/// failed.
pub fn write_fragments(
    root: &Path,
    output_dir: &Path,
    outcomes: &[CheckOutcome],
) -> Result<Vec<PathBuf>, ManifestError> {
    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 {
        return Err(ManifestError::Failed(failed));
    }

    let mut written = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        let Ok(body) = &outcome.result else {
            continue;
        };
        let path = fragment_path(root, output_dir, outcome);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, render_fragment(&outcome.entry, body))?;
        written.push(path);
    }
    Ok(written)
}
