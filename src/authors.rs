//! Author avatar fetch.
//!
//! Blog authors are listed in a YAML file keyed by author id. Authors with a
//! GitHub handle get their avatar downloaded at build time so the site never
//! hotlinks GitHub:
//!
//! ```yaml
//! LegNeato:
//!   name: Christian Legnitto
//!   socials:
//!     github: LegNeato
//!   image_url: /img/authors/LegNeato.png   # written by this job
//! ```
//!
//! For each such author the job asks the GitHub users API for `avatar_url`,
//! downloads the image in full, writes `<output_dir>/<username>.png`, and sets
//! `image_url` to the public path. A failure for one author is logged and that
//! author is skipped; the file is still rewritten for everyone else.
//!
//! The rewrite keeps author order and every other field, but not YAML
//! comments: the file gets a single header comment marking `image_url` as
//! managed.

use crate::config::AuthorsConfig;
use crate::fetch::{FetchError, Fetcher};
use serde::Deserialize;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Header written at the top of the rewritten authors file.
pub const MANAGED_HEADER: &str =
    "# image_url values are managed by `rust-gpu-site fetch-avatars`. Changes may be overwritten.";

#[derive(Error, Debug)]
pub enum AuthorsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Authors file must be a mapping of author id to author: {0}")]
    NotAMapping(PathBuf),
}

/// Why a single avatar could not be fetched.
#[derive(Error, Debug)]
pub enum AvatarError {
    #[error("{0}")]
    Fetch(#[from] FetchError),
    #[error("Unexpected GitHub API response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("GitHub API response has no avatar_url")]
    MissingAvatarUrl,
    #[error("Not a valid GitHub username")]
    InvalidUsername,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    avatar_url: Option<String>,
}

/// An avatar written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Avatar {
    pub author: String,
    pub username: String,
    pub path: PathBuf,
    pub image_url: String,
}

/// An author whose avatar could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAuthor {
    pub author: String,
    pub username: String,
    pub reason: String,
}

/// Outcome of one avatar run.
#[derive(Debug, Default)]
pub struct AvatarReport {
    pub downloaded: Vec<Avatar>,
    pub skipped: Vec<SkippedAuthor>,
    /// Authors without `socials.github`.
    pub without_github: Vec<String>,
}

/// Download avatars for every author with a GitHub handle and record their
/// `image_url` in the authors file.
pub fn fetch_avatars(
    fetcher: &impl Fetcher,
    config: &AuthorsConfig,
    root: &Path,
) -> Result<AvatarReport, AuthorsError> {
    let authors_path = root.join(&config.file);
    let content = fs::read_to_string(&authors_path)?;
    let mut doc: Value = serde_yaml::from_str(&content)?;
    let authors = doc
        .as_mapping_mut()
        .ok_or_else(|| AuthorsError::NotAMapping(authors_path.clone()))?;

    let output_dir = root.join(&config.output_dir);
    fs::create_dir_all(&output_dir)?;

    let mut report = AvatarReport::default();
    for (key, author) in authors.iter_mut() {
        let author_id = key
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{:?}", key));

        let Some(username) = github_username(author) else {
            report.without_github.push(author_id);
            continue;
        };

        match download_avatar(fetcher, config, &username, &output_dir) {
            Ok(path) => {
                let image_url = format!(
                    "{}/{}.png",
                    config.public_path.trim_end_matches('/'),
                    username
                );
                if let Some(fields) = author.as_mapping_mut() {
                    fields.insert(
                        Value::String("image_url".to_string()),
                        Value::String(image_url.clone()),
                    );
                }
                tracing::info!(author = %author_id, path = %path.display(), "avatar downloaded");
                report.downloaded.push(Avatar {
                    author: author_id,
                    username,
                    path,
                    image_url,
                });
            }
            Err(err) => {
                tracing::warn!(author = %author_id, username = %username, error = %err, "skipping avatar");
                report.skipped.push(SkippedAuthor {
                    author: author_id,
                    username,
                    reason: err.to_string(),
                });
            }
        }
    }

    let yaml = serde_yaml::to_string(&doc)?;
    fs::write(&authors_path, format!("{}\n{}", MANAGED_HEADER, yaml))?;
    Ok(report)
}

/// `socials.github` of an author entry, if present and non-empty.
fn github_username(author: &Value) -> Option<String> {
    author
        .get("socials")?
        .get("github")?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// GitHub usernames are ASCII alphanumerics and hyphens. Anything else could
/// escape the output directory once used as a file name.
fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

fn download_avatar(
    fetcher: &impl Fetcher,
    config: &AuthorsConfig,
    username: &str,
    output_dir: &Path,
) -> Result<PathBuf, AvatarError> {
    if !is_valid_username(username) {
        return Err(AvatarError::InvalidUsername);
    }

    let api_url = format!("{}/{}", config.api_url.trim_end_matches('/'), username);
    let user: GithubUser = serde_json::from_str(&fetcher.get_text(&api_url)?)?;
    let avatar_url = user.avatar_url.ok_or(AvatarError::MissingAvatarUrl)?;

    let bytes = fetcher.get_bytes(&avatar_url)?;
    let path = output_dir.join(format!("{}.png", username));
    fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::MockFetcher;
    use std::fs;
    use tempfile::TempDir;

    const AUTHORS_YML: &str = r#"LegNeato:
  name: Christian Legnitto
  title: Rust GPU maintainer
  socials:
    github: LegNeato
eddyb:
  name: Eduard-Mihai Burtescu
  socials:
    github: eddyb
guest:
  name: Guest Author
"#;

    const API: &str = "https://api.github.com/users";

    fn setup(yaml: &str) -> (TempDir, AuthorsConfig) {
        let tmp = TempDir::new().unwrap();
        let config = AuthorsConfig::default();
        let file = tmp.path().join(&config.file);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, yaml).unwrap();
        (tmp, config)
    }

    fn user_json(avatar: &str) -> String {
        format!(r#"{{"login": "x", "id": 1, "avatar_url": "{}"}}"#, avatar)
    }

    fn reload(tmp: &TempDir, config: &AuthorsConfig) -> Value {
        let content = fs::read_to_string(tmp.path().join(&config.file)).unwrap();
        serde_yaml::from_str(&content).unwrap()
    }

    #[test]
    fn downloads_avatars_and_records_image_url() {
        let (tmp, config) = setup(AUTHORS_YML);
        let fetcher = MockFetcher::new()
            .with(&format!("{API}/LegNeato"), user_json("https://avatars.example/1"))
            .with("https://avatars.example/1", vec![0x89, b'P', b'N', b'G'])
            .with(&format!("{API}/eddyb"), user_json("https://avatars.example/2"))
            .with("https://avatars.example/2", vec![1, 2, 3]);

        let report = fetch_avatars(&fetcher, &config, tmp.path()).unwrap();

        assert_eq!(report.downloaded.len(), 2);
        assert!(report.skipped.is_empty());
        assert_eq!(report.without_github, vec!["guest"]);

        let png = tmp.path().join("static/img/authors/LegNeato.png");
        assert_eq!(fs::read(&png).unwrap(), vec![0x89, b'P', b'N', b'G']);

        let doc = reload(&tmp, &config);
        assert_eq!(
            doc["LegNeato"]["image_url"].as_str(),
            Some("/img/authors/LegNeato.png")
        );
        assert_eq!(doc["eddyb"]["image_url"].as_str(), Some("/img/authors/eddyb.png"));
        assert!(doc["guest"].get("image_url").is_none());
    }

    #[test]
    fn rewrite_preserves_fields_and_order() {
        let (tmp, config) = setup(AUTHORS_YML);
        let fetcher = MockFetcher::new()
            .with(&format!("{API}/LegNeato"), user_json("https://avatars.example/1"))
            .with("https://avatars.example/1", "img");

        fetch_avatars(&fetcher, &config, tmp.path()).unwrap();

        let content = fs::read_to_string(tmp.path().join(&config.file)).unwrap();
        assert!(content.starts_with(MANAGED_HEADER));
        let doc: Value = serde_yaml::from_str(&content).unwrap();
        let keys: Vec<&str> = doc
            .as_mapping()
            .unwrap()
            .keys()
            .filter_map(|k| k.as_str())
            .collect();
        assert_eq!(keys, vec!["LegNeato", "eddyb", "guest"]);
        assert_eq!(doc["LegNeato"]["title"].as_str(), Some("Rust GPU maintainer"));
    }

    #[test]
    fn api_failure_skips_author() {
        let (tmp, config) = setup(AUTHORS_YML);
        let fetcher = MockFetcher::new()
            .with_status(&format!("{API}/LegNeato"), 404)
            .with(&format!("{API}/eddyb"), user_json("https://avatars.example/2"))
            .with("https://avatars.example/2", "img");

        let report = fetch_avatars(&fetcher, &config, tmp.path()).unwrap();

        assert_eq!(report.downloaded.len(), 1);
        assert_eq!(report.downloaded[0].username, "eddyb");
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].author, "LegNeato");
        assert!(report.skipped[0].reason.contains("404"));
        assert!(!tmp.path().join("static/img/authors/LegNeato.png").exists());

        let doc = reload(&tmp, &config);
        assert!(doc["LegNeato"].get("image_url").is_none());
    }

    #[test]
    fn image_download_failure_skips_author() {
        let (tmp, config) = setup(AUTHORS_YML);
        let fetcher = MockFetcher::new()
            .with(&format!("{API}/LegNeato"), user_json("https://avatars.example/1"))
            .with_status("https://avatars.example/1", 502)
            .with(&format!("{API}/eddyb"), user_json("https://avatars.example/2"))
            .with("https://avatars.example/2", "img");

        let report = fetch_avatars(&fetcher, &config, tmp.path()).unwrap();

        assert_eq!(report.skipped.len(), 1);
        assert!(!tmp.path().join("static/img/authors/LegNeato.png").exists());
    }

    #[test]
    fn missing_avatar_url_skips_author() {
        let (tmp, config) = setup("solo:\n  socials:\n    github: solo\n");
        let fetcher = MockFetcher::new().with(&format!("{API}/solo"), r#"{"login": "solo"}"#);

        let report = fetch_avatars(&fetcher, &config, tmp.path()).unwrap();

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, "GitHub API response has no avatar_url");
    }

    #[test]
    fn invalid_username_is_never_requested() {
        let (tmp, config) = setup("evil:\n  socials:\n    github: ../../etc\n");
        let fetcher = MockFetcher::new();

        let report = fetch_avatars(&fetcher, &config, tmp.path()).unwrap();

        assert_eq!(report.skipped.len(), 1);
        assert!(fetcher.requests().is_empty());
    }

    #[test]
    fn non_mapping_file_is_error() {
        let (tmp, config) = setup("- just\n- a list\n");
        let fetcher = MockFetcher::new();
        assert!(matches!(
            fetch_avatars(&fetcher, &config, tmp.path()),
            Err(AuthorsError::NotAMapping(_))
        ));
    }

    #[test]
    fn missing_authors_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let fetcher = MockFetcher::new();
        assert!(matches!(
            fetch_avatars(&fetcher, &AuthorsConfig::default(), tmp.path()),
            Err(AuthorsError::Io(_))
        ));
    }

    #[test]
    fn github_username_trims_and_ignores_empty() {
        let author: Value = serde_yaml::from_str("socials:\n  github: ' octo '\n").unwrap();
        assert_eq!(github_username(&author), Some("octo".to_string()));
        let author: Value = serde_yaml::from_str("socials:\n  github: ''\n").unwrap();
        assert_eq!(github_username(&author), None);
        let author: Value = serde_yaml::from_str("name: x\n").unwrap();
        assert_eq!(github_username(&author), None);
    }

    #[test]
    fn fixture_authors_file() {
        let tmp = crate::test_helpers::setup_fixtures();
        let config = AuthorsConfig::default();
        let fetcher = MockFetcher::new()
            .with(&format!("{API}/LegNeato"), user_json("https://avatars.example/1"))
            .with("https://avatars.example/1", vec![0x89, b'P', b'N', b'G']);

        let report = fetch_avatars(&fetcher, &config, tmp.path()).unwrap();

        assert_eq!(report.downloaded.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].author, "eddyb");
        assert_eq!(report.without_github, vec!["guest"]);
        assert!(tmp.path().join("static/img/authors/LegNeato.png").exists());
    }
}
