//! Snippet extraction and validation.
//!
//! Blog posts show excerpts of real source files that live next to them. An
//! excerpt is the file text plus an optional [line selector](crate::selector)
//! and an optional [fingerprint pin](crate::fingerprint):
//!
//! ```text
//! source (lib.rs)            lines = "1,4-5", hash = "…"
//!   1  use glam::UVec3;        →   use glam::UVec3;
//!   2                              ...
//!   3  #[spirv(compute)]           pub fn main(
//!   4  pub fn main(                    id: UVec3,
//!   5      id: UVec3,
//!   6  ) {
//! ```
//!
//! ## Rules
//!
//! - No selector (or an empty one): the text is returned verbatim and the pin is
//!   not consulted.
//! - A selector: the pin is required and must match the whole source before
//!   anything is rendered. See [`crate::fingerprint::validate`].
//! - Selected lines are emitted in selector order. Wherever the next selected
//!   line is more than one past the previous, an omission marker line is
//!   inserted. There is never a leading marker; a trailing one is opt-in via
//!   [`RenderOptions::trailing_marker`].
//! - Lines past the end of the source (or line `0`) render as empty lines.
//! - Leading whitespace is handled by [`StripMode`].

use crate::fingerprint::{self, FingerprintError};
use crate::selector::{LineSelector, SelectorError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default omission marker.
pub const DEFAULT_PLACEHOLDER: &str = "...";

#[derive(Error, Debug)]
pub enum SnippetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Snippet source is not UTF-8 text: {0}")]
    InvalidInput(PathBuf),
    #[error("{0}")]
    Selector(#[from] SelectorError),
    #[error("{0}")]
    Fingerprint(#[from] FingerprintError),
}

/// How leading whitespace of selected lines is treated.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum StripMode {
    /// Lines are emitted exactly as in the source.
    Preserve,
    /// Every line loses all of its leading whitespace.
    TrimAll,
    /// The least-indented non-blank selected line ends up at column 0; every
    /// other non-blank line keeps its indentation relative to it.
    #[default]
    Dedent,
}

/// Rendering knobs for [`extract`] and [`render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub omitted_placeholder: String,
    pub strip: StripMode,
    /// Append a marker when the selection stops before the end of the source.
    pub trailing_marker: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            omitted_placeholder: DEFAULT_PLACEHOLDER.to_string(),
            strip: StripMode::Preserve,
            trailing_marker: false,
        }
    }
}

/// Read a snippet source file. Non-UTF-8 content is rejected.
pub fn load_source(path: &Path) -> Result<String, SnippetError> {
    let bytes = std::fs::read(path)?;
    String::from_utf8(bytes).map_err(|_| SnippetError::InvalidInput(path.to_path_buf()))
}

/// Parse, validate and extract in one go.
///
/// This is the fail-closed entry point: an excerpt is only produced when its
/// pin matches the source. Without a selector the content comes back
/// unchanged.
pub fn render(
    content: &str,
    selector: Option<&str>,
    fingerprint: Option<&str>,
    options: &RenderOptions,
) -> Result<String, SnippetError> {
    let selector = match selector {
        Some(spec) => LineSelector::parse(spec)?,
        None => LineSelector::default(),
    };
    if selector.is_empty() {
        return Ok(content.to_string());
    }
    fingerprint::validate(content, fingerprint)?;
    Ok(extract(content, &selector, options))
}

/// Filter `content` down to the selected lines. Does not check any pin.
pub fn extract(content: &str, selector: &LineSelector, options: &RenderOptions) -> String {
    if selector.is_empty() {
        return content.to_string();
    }

    let source_lines: Vec<&str> = content.split('\n').collect();
    let picked: Vec<&str> = selector
        .lines()
        .iter()
        .map(|&n| {
            n.checked_sub(1)
                .and_then(|i| source_lines.get(i))
                .copied()
                .unwrap_or("")
        })
        .collect();
    let stripped = strip_lines(&picked, options.strip);

    let mut out: Vec<&str> = Vec::with_capacity(stripped.len() * 2);
    let mut previous: Option<usize> = None;
    for (&number, line) in selector.lines().iter().zip(&stripped) {
        if let Some(prev) = previous
            && prev + 1 < number
        {
            out.push(options.omitted_placeholder.as_str());
        }
        out.push(*line);
        previous = Some(number);
    }

    if options.trailing_marker
        && let Some(last) = previous
        && last < line_count(content)
    {
        out.push(options.omitted_placeholder.as_str());
    }

    out.join("\n")
}

/// Number of lines in `content`, not counting the empty segment after a
/// final newline.
fn line_count(content: &str) -> usize {
    let segments = content.split('\n').count();
    if content.ends_with('\n') {
        segments - 1
    } else {
        segments
    }
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Drop the first `n` characters of `line`.
fn skip_chars(line: &str, n: usize) -> &str {
    match line.char_indices().nth(n) {
        Some((idx, _)) => &line[idx..],
        None => "",
    }
}

fn strip_lines<'a>(lines: &[&'a str], mode: StripMode) -> Vec<&'a str> {
    match mode {
        StripMode::Preserve => lines.to_vec(),
        StripMode::TrimAll => lines.iter().map(|&l| l.trim_start()).collect(),
        StripMode::Dedent => {
            let indent = lines
                .iter()
                .filter(|l| !is_blank(l))
                .map(|l| leading_whitespace(l))
                .min()
                .unwrap_or(0);
            lines
                .iter()
                .map(|&l| if is_blank(l) { l } else { skip_chars(l, indent) })
                .collect()
        }
    }
}
