//! # rust-gpu-site
//!
//! Build tooling for the Rust GPU website. The site is static; this crate does
//! the parts that need a program: turning pinned excerpts of real source files
//! into code blocks for blog posts, and mirroring the bits of content that live
//! elsewhere (author avatars, the project changelog).
//!
//! # Architecture: Jobs Over a Site Root
//!
//! Every command operates on a site root directory holding an optional
//! `site.toml`. The jobs are independent and each one can be run on its own:
//!
//! ```text
//! fetch-avatars    blog/authors.yml  →  static/img/authors/*.png  (+ image_url fields)
//! fetch-changelog  upstream URL      →  src/pages/changelog.md
//! check            **/snippets.toml  →  pass/fail per snippet
//! render           **/snippets.toml  →  generated/snippets/**/<name>.md
//! ```
//!
//! `build` runs them in that order. `--offline` skips the two network jobs.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`selector`] | Parses `"1-5,7,10-12"` line selections |
//! | [`fingerprint`] | SHA-256 fingerprint of a source file and its 7-character pin |
//! | [`snippet`] | Extracts selected lines, inserts omission markers, strips indentation |
//! | [`manifest`] | Discovers `snippets.toml` files, checks them in parallel, writes fragments |
//! | [`fetch`] | The [`fetch::Fetcher`] seam and its `ureq` implementation |
//! | [`authors`] | Downloads GitHub avatars and updates the authors file |
//! | [`changelog`] | Mirrors the upstream changelog as a site page |
//! | [`config`] | `site.toml` loading, merging over stock defaults, and validation |
//! | [`output`] | CLI output formatting for every command |
//!
//! # Design Decisions
//!
//! ## Pinned Excerpts
//!
//! A blog post that quotes lines 10-20 of a file silently goes wrong when the
//! file changes underneath it. Every excerpt that selects lines therefore
//! carries a short fingerprint of the whole source file. When the file changes,
//! the check fails and names the new fingerprint, so the author re-reads the
//! selection before updating the pin. Whole-file excerpts need no pin: they
//! cannot point at the wrong lines.
//!
//! ## Validate Everything, Then Write
//!
//! `render` checks every snippet before writing any fragment. A half-written
//! output directory would leave the site mixing stale and fresh excerpts.
//!
//! ## Network Behind a Trait
//!
//! The fetch jobs only reach the network through [`fetch::Fetcher`]. Tests run
//! against a recorded mock; the binary uses a blocking `ureq` agent. There is
//! no retry or caching: a failed avatar is skipped and reported, a failed
//! changelog fails the job.

pub mod authors;
pub mod changelog;
pub mod config;
pub mod fetch;
pub mod fingerprint;
pub mod manifest;
pub mod output;
pub mod selector;
pub mod snippet;

#[cfg(test)]
pub(crate) mod test_helpers;
