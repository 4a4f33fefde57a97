//! Shared test utilities for the rust-gpu-site test suite.
//!
//! Provides a fixture site copied to a temp directory and lookup helpers over
//! check results.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let outcomes = check_fixtures(tmp.path());
//!
//! let entry = find_outcome(&outcomes, "entry-point");
//! assert!(entry.is_ok());
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::config::load_config;
use crate::manifest::{self, CheckOutcome};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Load the site config and check every manifest under `root`.
pub fn check_fixtures(root: &Path) -> Vec<CheckOutcome> {
    let config = load_config(root).unwrap();
    let manifests = manifest::load_all(root, &config.snippets.manifest_name).unwrap();
    manifest::check(&manifests, &config.snippets)
}

// =========================================================================
// Lookups (panic with a clear message on miss)
// =========================================================================

/// Find a check outcome by snippet name. Panics if not found.
pub fn find_outcome<'a>(outcomes: &'a [CheckOutcome], name: &str) -> &'a CheckOutcome {
    outcomes
        .iter()
        .find(|o| o.entry.name == name)
        .unwrap_or_else(|| {
            let names = snippet_names(outcomes);
            panic!("snippet '{name}' not found. Available: {names:?}")
        })
}

/// Rendered text of a snippet. Panics if it is missing or failed.
pub fn rendered<'a>(outcomes: &'a [CheckOutcome], name: &str) -> &'a str {
    match &find_outcome(outcomes, name).result {
        Ok(text) => text,
        Err(err) => panic!("snippet '{name}' failed: {err}"),
    }
}

/// All snippet names in check order.
pub fn snippet_names(outcomes: &[CheckOutcome]) -> Vec<&str> {
    outcomes.iter().map(|o| o.entry.name.as_str()).collect()
}
