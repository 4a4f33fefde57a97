use clap::{Parser, Subcommand};
use rust_gpu_site::config::{self, SiteConfig};
use rust_gpu_site::fetch::HttpFetcher;
use rust_gpu_site::fingerprint::Fingerprint;
use rust_gpu_site::manifest::{self, CheckOutcome, ManifestError};
use rust_gpu_site::snippet::{self, StripMode};
use rust_gpu_site::{authors, changelog, output};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "rust-gpu-site")]
#[command(about = "Build tooling for the Rust GPU website")]
#[command(long_about = "\
Build tooling for the Rust GPU website

Code excerpts in blog posts are declared in snippets.toml files next to the
posts. Each excerpt names a source file, the lines to show and a short
fingerprint of the file, so an excerpt can never silently drift from the code
it quotes:

  blog/2024-07-04-shaders/
  ├── index.md
  ├── snippets.toml
  └── code/shader/src/lib.rs

  [[snippet]]
  name = \"compute-entry\"
  source = \"code/shader/src/lib.rs\"
  language = \"rust\"
  lines = \"1-5,12\"
  hash = \"dbbc47f\"          # rust-gpu-site hash <file>
  strip_leading_spaces = true

Skipped lines become a single '...' marker line. When the source file changes,
'check' fails and prints the new fingerprint to pin after re-reading the lines.

Run 'rust-gpu-site gen-config' to generate a documented site.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Site root (holds site.toml)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Log debug details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one excerpt of a source file to stdout
    Snippet(SnippetArgs),
    /// Print the fingerprint of a source file
    Hash {
        /// Source file
        file: PathBuf,
    },
    /// Validate every snippet manifest without writing anything
    Check,
    /// Validate every snippet manifest, then write markdown fragments
    Render,
    /// Download GitHub avatars for blog authors
    FetchAvatars,
    /// Mirror the upstream changelog as a site page
    FetchChangelog,
    /// Run everything: avatars → changelog → check → render
    Build {
        /// Skip the jobs that need network access
        #[arg(long)]
        offline: bool,
    },
    /// Print a stock site.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct SnippetArgs {
    /// Source file
    file: PathBuf,

    /// Lines to include, e.g. "1-5,7,10-12" (default: whole file)
    #[arg(long)]
    lines: Option<String>,

    /// Pinned short fingerprint of the file (required with --lines)
    #[arg(long)]
    hash: Option<String>,

    /// Marker line for skipped lines
    #[arg(long)]
    placeholder: Option<String>,

    /// Remove leading indentation from the excerpt
    #[arg(long)]
    strip_leading_spaces: bool,

    /// How --strip-leading-spaces removes indentation
    #[arg(long, value_enum, requires = "strip_leading_spaces")]
    strip_mode: Option<StripMode>,

    /// Add a marker when the excerpt stops before the end of the file
    #[arg(long)]
    trailing_marker: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Snippet(args) => {
            let config = config::load_config(&cli.root)?;
            let path = cli.root.join(&args.file);
            let content = snippet::load_source(&path)?;

            let mut options = config
                .snippets
                .render_options(args.strip_leading_spaces, args.placeholder.as_deref());
            if let Some(mode) = args.strip_mode {
                options.strip = mode;
            }
            options.trailing_marker |= args.trailing_marker;

            let rendered = snippet::render(
                &content,
                args.lines.as_deref(),
                args.hash.as_deref(),
                &options,
            )?;
            print!("{}", rendered);
        }
        Command::Hash { file } => {
            let path = cli.root.join(&file);
            let content = snippet::load_source(&path)?;
            output::print_fingerprint(&Fingerprint::of(&content), &file);
        }
        Command::Check => {
            let config = config::load_config(&cli.root)?;
            init_thread_pool(&config.processing);
            run_check(&cli.root, &config)?;
        }
        Command::Render => {
            let config = config::load_config(&cli.root)?;
            init_thread_pool(&config.processing);
            run_render(&cli.root, &config)?;
        }
        Command::FetchAvatars => {
            let config = config::load_config(&cli.root)?;
            run_avatars(&cli.root, &config)?;
        }
        Command::FetchChangelog => {
            let config = config::load_config(&cli.root)?;
            run_changelog(&cli.root, &config)?;
        }
        Command::Build { offline } => {
            let config = config::load_config(&cli.root)?;
            init_thread_pool(&config.processing);

            if offline {
                println!("==> Offline: skipping avatars and changelog");
            } else {
                println!("==> Fetching author avatars");
                run_avatars(&cli.root, &config)?;
                println!("==> Mirroring changelog");
                run_changelog(&cli.root, &config)?;
            }

            println!("==> Rendering snippets");
            run_render(&cli.root, &config)?;

            println!("==> Build complete");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Check all manifests and print the results. Fails if any snippet failed.
fn run_check(root: &Path, config: &SiteConfig) -> Result<Vec<CheckOutcome>, ManifestError> {
    let manifests = manifest::load_all(root, &config.snippets.manifest_name)?;
    tracing::debug!(count = manifests.len(), "snippet manifests discovered");
    let outcomes = manifest::check(&manifests, &config.snippets);
    output::print_check_output(&outcomes, root);

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 {
        return Err(ManifestError::Failed(failed));
    }
    Ok(outcomes)
}

fn run_render(root: &Path, config: &SiteConfig) -> Result<(), ManifestError> {
    let outcomes = run_check(root, config)?;
    let output_dir = root.join(&config.snippets.output_dir);
    let written = manifest::write_fragments(root, &output_dir, &outcomes)?;
    println!();
    output::print_render_output(&outcomes, &written, root);
    Ok(())
}

fn run_avatars(root: &Path, config: &SiteConfig) -> Result<(), authors::AuthorsError> {
    let fetcher = HttpFetcher::new(config.fetch.user_agent.as_str());
    let report = authors::fetch_avatars(&fetcher, &config.authors, root)?;
    output::print_avatar_report(&report, root);
    Ok(())
}

fn run_changelog(root: &Path, config: &SiteConfig) -> Result<(), changelog::ChangelogError> {
    let fetcher = HttpFetcher::new(config.fetch.user_agent.as_str());
    let report = changelog::mirror(&fetcher, &config.changelog, root)?;
    output::print_changelog_report(&report, root);
    Ok(())
}

/// Log to stderr so command output on stdout stays clean.
fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
