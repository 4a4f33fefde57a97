//! Line range selectors.
//!
//! A selector names the 1-based source lines a snippet shows, written as
//! comma-separated tokens where each token is either a single line (`7`) or an
//! inclusive range (`10-12`):
//!
//! ```text
//! "1-5,7,10-12"  →  [1, 2, 3, 4, 5, 7, 10, 11, 12]
//! ```
//!
//! Token order is preserved. Nothing is sorted or de-duplicated: authors are
//! expected to write ranges in ascending order, and the snippet renderer only
//! inserts omission markers where consecutive numbers jump forward.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound on the lines a single selector may name, per range and in
/// total.
pub const MAX_SELECTED_LINES: usize = 100_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Invalid line selector token '{0}' (expected N or START-END)")]
    InvalidToken(String),
    #[error("Descending line range {start}-{end} (start must not exceed end)")]
    DescendingRange { start: usize, end: usize },
    #[error("Line range {start}-{end} spans more than {MAX_SELECTED_LINES} lines")]
    RangeTooLarge { start: usize, end: usize },
    #[error("Line selector names more than {MAX_SELECTED_LINES} lines")]
    TooManyLines,
}

/// Parsed line selector: an ordered list of 1-based line numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineSelector {
    lines: Vec<usize>,
}

impl LineSelector {
    /// Parse a selector string such as `"1-5,7"`.
    ///
    /// Empty or whitespace-only input yields an empty selector, which means
    /// "render everything".
    pub fn parse(spec: &str) -> Result<Self, SelectorError> {
        if spec.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut lines = Vec::new();
        for token in spec.split(',') {
            let token = token.trim();
            let mut bounds = token.split('-');
            let start = parse_line_number(bounds.next(), token)?;
            let end = match (bounds.next(), bounds.next()) {
                (None, _) => start,
                (Some(end), None) => parse_line_number(Some(end), token)?,
                (Some(_), Some(_)) => return Err(SelectorError::InvalidToken(token.to_string())),
            };
            if start > end {
                return Err(SelectorError::DescendingRange { start, end });
            }
            // Both bounds are checked before anything is allocated.
            let span = end - start;
            if span >= MAX_SELECTED_LINES {
                return Err(SelectorError::RangeTooLarge { start, end });
            }
            if lines.len() + span + 1 > MAX_SELECTED_LINES {
                return Err(SelectorError::TooManyLines);
            }
            lines.extend(start..=end);
        }
        Ok(Self { lines })
    }

    /// Selected line numbers in selector order.
    pub fn lines(&self) -> &[usize] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

fn parse_line_number(part: Option<&str>, token: &str) -> Result<usize, SelectorError> {
    part.map(str::trim)
        .filter(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|p| p.parse().ok())
        .ok_or_else(|| SelectorError::InvalidToken(token.to_string()))
}

impl FromStr for LineSelector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Compact form: consecutive runs collapse back into `start-end`.
impl fmt::Display for LineSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut runs: Vec<(usize, usize)> = Vec::new();
        for &line in &self.lines {
            match runs.last_mut() {
                Some((_, end)) if *end + 1 == line => *end = line,
                _ => runs.push((line, line)),
            }
        }
        let parts: Vec<String> = runs
            .iter()
            .map(|&(start, end)| {
                if start == end {
                    start.to_string()
                } else {
                    format!("{}-{}", start, end)
                }
            })
            .collect();
        write!(f, "{}", parts.join(","))
    }
}
