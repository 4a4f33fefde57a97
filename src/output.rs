//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Each snippet leads
//! with its positional index and name; the manifest it came from and the
//! file it was written to are secondary context on indented lines.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! blog/2024-07-04-shaders/snippets.toml
//!     001 compute-entry (lines 1-5,7) ok
//!     002 main-loop (whole file) FAILED
//!         Fingerprint mismatch: ...
//!
//! Checked 2 snippets, 1 failed
//! ```
//!
//! ## Render
//!
//! ```text
//! 001 compute-entry → generated/snippets/blog/2024-07-04-shaders/compute-entry.md
//!
//! Rendered 1 snippet
//! ```
//!
//! ## Avatars
//!
//! ```text
//! Avatars
//! 001 LegNeato (@LegNeato) → static/img/authors/LegNeato.png
//! Skipped
//!     someone (@ghost): GET https://... returned HTTP 404
//! Without GitHub
//!     anonymous
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::authors::AvatarReport;
use crate::changelog::ChangelogReport;
use crate::fingerprint::Fingerprint;
use crate::manifest::CheckOutcome;
use crate::selector::LineSelector;
use std::path::{Path, PathBuf};

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Display `path` relative to `root` when it lies under it.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

/// Snippet header: index, name and selection.
///
/// ```text
/// 001 compute-entry (lines 1-5,7)
/// 002 main-loop (whole file)
/// ```
///
/// Valid selections are shown in compact form; unparseable ones verbatim so
/// the failure below them can be matched to the manifest text.
fn snippet_header(index: usize, name: &str, lines: Option<&str>) -> String {
    let selection = match lines.map(|l| (l, l.parse::<LineSelector>())) {
        None => None,
        Some((_, Ok(selector))) if selector.is_empty() => None,
        Some((_, Ok(selector))) => Some(selector.to_string()),
        Some((raw, Err(_))) => Some(raw.trim().to_string()),
    };
    match selection {
        Some(l) => format!("{} {} (lines {})", format_index(index), name, l),
        None => format!("{} {} (whole file)", format_index(index), name),
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format check results grouped by manifest, followed by a summary line.
pub fn format_check_output(outcomes: &[CheckOutcome], root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<&PathBuf> = None;
    let mut index = 0;

    for outcome in outcomes {
        if current != Some(&outcome.manifest) {
            if current.is_some() {
                lines.push(String::new());
            }
            lines.push(display_path(&outcome.manifest, root));
            current = Some(&outcome.manifest);
            index = 0;
        }
        index += 1;

        let header = snippet_header(index, &outcome.entry.name, outcome.entry.lines.as_deref());
        match &outcome.result {
            Ok(_) => lines.push(format!("    {} ok", header)),
            Err(err) => {
                lines.push(format!("    {} FAILED", header));
                for reason in err.to_string().lines() {
                    lines.push(format!("        {}", reason));
                }
            }
        }
    }

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Checked {}, {} failed",
        plural(outcomes.len(), "snippet"),
        failed
    ));
    lines
}

pub fn print_check_output(outcomes: &[CheckOutcome], root: &Path) {
    for line in format_check_output(outcomes, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Render
// ============================================================================

/// Format the list of written fragments. `outcomes` and `written` are
/// parallel slices.
pub fn format_render_output(
    outcomes: &[CheckOutcome],
    written: &[PathBuf],
    root: &Path,
) -> Vec<String> {
    let mut lines: Vec<String> = outcomes
        .iter()
        .zip(written)
        .enumerate()
        .map(|(i, (outcome, path))| {
            format!(
                "{} {} → {}",
                format_index(i + 1),
                outcome.entry.name,
                display_path(path, root)
            )
        })
        .collect();

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!("Rendered {}", plural(written.len(), "snippet")));
    lines
}

pub fn print_render_output(outcomes: &[CheckOutcome], written: &[PathBuf], root: &Path) {
    for line in format_render_output(outcomes, written, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Fetch jobs
// ============================================================================

/// Format the avatar job result: downloads, skips and authors without a
/// GitHub handle.
pub fn format_avatar_report(report: &AvatarReport, root: &Path) -> Vec<String> {
    let mut lines = vec!["Avatars".to_string()];
    for (i, avatar) in report.downloaded.iter().enumerate() {
        lines.push(format!(
            "{} {} (@{}) → {}",
            format_index(i + 1),
            avatar.author,
            avatar.username,
            display_path(&avatar.path, root)
        ));
    }

    if !report.skipped.is_empty() {
        lines.push("Skipped".to_string());
        for skipped in &report.skipped {
            lines.push(format!(
                "    {} (@{}): {}",
                skipped.author, skipped.username, skipped.reason
            ));
        }
    }

    if !report.without_github.is_empty() {
        lines.push("Without GitHub".to_string());
        for author in &report.without_github {
            lines.push(format!("    {}", author));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Downloaded {}, {} skipped",
        plural(report.downloaded.len(), "avatar"),
        report.skipped.len()
    ));
    lines
}

pub fn print_avatar_report(report: &AvatarReport, root: &Path) {
    for line in format_avatar_report(report, root) {
        println!("{}", line);
    }
}

pub fn format_changelog_report(report: &ChangelogReport, root: &Path) -> Vec<String> {
    vec![format!(
        "Changelog → {} ({} bytes)",
        display_path(&report.output, root),
        report.bytes
    )]
}

pub fn print_changelog_report(report: &ChangelogReport, root: &Path) {
    for line in format_changelog_report(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Hash
// ============================================================================

/// Short fingerprint first so it can be pasted into a manifest, then the
/// full digest.
pub fn format_fingerprint(fingerprint: &Fingerprint, path: &Path) -> Vec<String> {
    vec![
        format!("hash = \"{}\"", fingerprint.short()),
        format!("    {}  {}", fingerprint.digest(), path.display()),
    ]
}

pub fn print_fingerprint(fingerprint: &Fingerprint, path: &Path) {
    for line in format_fingerprint(fingerprint, path) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authors::{Avatar, SkippedAuthor};
    use crate::fingerprint::FingerprintError;
    use crate::manifest::SnippetEntry;
    use crate::snippet::SnippetError;

    fn entry(name: &str, lines: Option<&str>) -> SnippetEntry {
        SnippetEntry {
            name: name.to_string(),
            source: "lib.rs".to_string(),
            language: Some("rust".to_string()),
            lines: lines.map(str::to_string),
            hash: None,
            title: None,
            strip_leading_spaces: false,
            omitted_placeholder: None,
        }
    }

    fn ok(manifest: &str, name: &str, lines: Option<&str>) -> CheckOutcome {
        CheckOutcome {
            manifest: PathBuf::from(manifest),
            entry: entry(name, lines),
            result: Ok("fn main() {}\n".to_string()),
        }
    }

    fn missing_hash(manifest: &str, name: &str) -> CheckOutcome {
        CheckOutcome {
            manifest: PathBuf::from(manifest),
            entry: entry(name, None),
            result: Err(SnippetError::Fingerprint(FingerprintError::Missing {
                suggested: "dbbc47f".to_string(),
            })),
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn display_path_strips_root() {
        assert_eq!(
            display_path(Path::new("/site/blog/a/snippets.toml"), Path::new("/site")),
            "blog/a/snippets.toml"
        );
        assert_eq!(
            display_path(Path::new("/elsewhere/x"), Path::new("/site")),
            "/elsewhere/x"
        );
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "snippet"), "1 snippet");
        assert_eq!(plural(0, "snippet"), "0 snippets");
        assert_eq!(plural(3, "avatar"), "3 avatars");
    }

    #[test]
    fn snippet_header_with_and_without_lines() {
        assert_eq!(
            snippet_header(1, "entry", Some("1-5,7")),
            "001 entry (lines 1-5,7)"
        );
        assert_eq!(snippet_header(2, "all", None), "002 all (whole file)");
        assert_eq!(snippet_header(3, "blank", Some("  ")), "003 blank (whole file)");
        assert_eq!(
            snippet_header(4, "runs", Some("1,2,3, 7")),
            "004 runs (lines 1-3,7)"
        );
        assert_eq!(snippet_header(5, "bad", Some(" x-1 ")), "005 bad (lines x-1)");
    }

    // =========================================================================
    // Check
    // =========================================================================

    #[test]
    fn check_groups_by_manifest_and_restarts_index() {
        let outcomes = vec![
            ok("/site/blog/a/snippets.toml", "one", Some("1-3")),
            ok("/site/blog/a/snippets.toml", "two", None),
            ok("/site/blog/b/snippets.toml", "three", Some("4")),
        ];
        let lines = format_check_output(&outcomes, Path::new("/site"));
        assert_eq!(
            lines,
            vec![
                "blog/a/snippets.toml",
                "    001 one (lines 1-3) ok",
                "    002 two (whole file) ok",
                "",
                "blog/b/snippets.toml",
                "    001 three (lines 4) ok",
                "",
                "Checked 3 snippets, 0 failed",
            ]
        );
    }

    #[test]
    fn check_failure_shows_reason() {
        let outcomes = vec![missing_hash("/site/blog/a/snippets.toml", "pinned")];
        let lines = format_check_output(&outcomes, Path::new("/site"));
        assert_eq!(lines[1], "    001 pinned (whole file) FAILED");
        assert!(lines[2].starts_with("        "));
        assert!(lines[2].contains("hash = \"dbbc47f\""));
        assert_eq!(lines.last().unwrap(), "Checked 1 snippet, 1 failed");
    }

    #[test]
    fn check_empty() {
        let lines = format_check_output(&[], Path::new("/site"));
        assert_eq!(lines, vec!["Checked 0 snippets, 0 failed"]);
    }

    // =========================================================================
    // Render
    // =========================================================================

    #[test]
    fn render_lists_written_paths() {
        let outcomes = vec![ok("/site/blog/a/snippets.toml", "one", None)];
        let written = vec![PathBuf::from("/site/generated/snippets/blog/a/one.md")];
        let lines = format_render_output(&outcomes, &written, Path::new("/site"));
        assert_eq!(
            lines,
            vec![
                "001 one → generated/snippets/blog/a/one.md",
                "",
                "Rendered 1 snippet",
            ]
        );
    }

    // =========================================================================
    // Fetch jobs
    // =========================================================================

    #[test]
    fn avatar_report_sections() {
        let report = AvatarReport {
            downloaded: vec![Avatar {
                author: "legneato".to_string(),
                username: "LegNeato".to_string(),
                path: PathBuf::from("/site/static/img/authors/LegNeato.png"),
                image_url: "/img/authors/LegNeato.png".to_string(),
            }],
            skipped: vec![SkippedAuthor {
                author: "ghost".to_string(),
                username: "nobody".to_string(),
                reason: "GET x returned HTTP 404".to_string(),
            }],
            without_github: vec!["anon".to_string()],
        };
        let lines = format_avatar_report(&report, Path::new("/site"));
        assert_eq!(
            lines,
            vec![
                "Avatars",
                "001 legneato (@LegNeato) → static/img/authors/LegNeato.png",
                "Skipped",
                "    ghost (@nobody): GET x returned HTTP 404",
                "Without GitHub",
                "    anon",
                "",
                "Downloaded 1 avatar, 1 skipped",
            ]
        );
    }

    #[test]
    fn avatar_report_empty_omits_sections() {
        let lines = format_avatar_report(&AvatarReport::default(), Path::new("/site"));
        assert_eq!(lines, vec!["Avatars", "", "Downloaded 0 avatars, 0 skipped"]);
    }

    #[test]
    fn changelog_report_line() {
        let report = ChangelogReport {
            output: PathBuf::from("/site/src/pages/changelog.md"),
            bytes: 120,
        };
        assert_eq!(
            format_changelog_report(&report, Path::new("/site")),
            vec!["Changelog → src/pages/changelog.md (120 bytes)"]
        );
    }

    #[test]
    fn fingerprint_lines() {
        let fp = Fingerprint::of("hello world");
        let lines = format_fingerprint(&fp, Path::new("src/lib.rs"));
        assert_eq!(lines[0], "hash = \"b94d27b\"");
        assert!(lines[1].ends_with("  src/lib.rs"));
        assert!(lines[1].contains(fp.digest()));
    }
}
