//! fmtgate: change-aware format/lint gate for Python and C++ sources.
//!
//! # Usage
//!
//! ```text
//! fmtgate [--check] [--all-files] [--baseline <REF>] [--cache-dir <DIR>] [-C <DIR>] [-v...]
//! ```
//!
//! Exit codes: 0 when nothing needed attention, 1 for a dirty working tree,
//! findings, or any fatal error.

mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

use fmtgate_cache::ArtifactCache;
use fmtgate_core::{config, Mode, Overrides, Router};
use fmtgate_repo::GitRepository;
use fmtgate_tools::{default_adapters, FileSelection, Pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "fmtgate",
    version,
    about = "Format and lint the files your branch touched with pinned ruff and clang-format",
    long_about = None,
)]
struct Cli {
    /// Don't apply any changes; exit 1 if anything would change.
    #[arg(long)]
    check: bool,

    /// Process every tracked file instead of the change-set since the baseline.
    #[arg(long)]
    all_files: bool,

    /// Baseline reference for the change-set [default: origin/main].
    #[arg(long, value_name = "REF")]
    baseline: Option<String>,

    /// Where pinned tool binaries are cached [default: ~/.cache/fmtgate].
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Run as if started in DIR.
    #[arg(short = 'C', long = "repo", value_name = "DIR")]
    repo: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn run(self) -> Result<ExitCode> {
        let start = match self.repo {
            Some(dir) => dir,
            None => std::env::current_dir().context("could not determine current directory")?,
        };
        let repo = GitRepository::discover(&start)
            .with_context(|| format!("{} is not inside a git repository", start.display()))?;

        let config = config::resolve(
            repo.root(),
            Overrides {
                baseline: self.baseline,
                cache_dir: self.cache_dir,
            },
        )
        .context("failed to load configuration")?;

        let selection = if self.all_files {
            FileSelection::All
        } else {
            FileSelection::ChangedSince(config.baseline.clone())
        };
        let mode = Mode::from_check_flag(self.check);
        tracing::info!(
            "repository {}, mode {mode}, cache {}",
            repo.root().display(),
            config.cache_dir.display()
        );

        let cache = ArtifactCache::new(&config.cache_dir);
        let pipeline = Pipeline::new(
            &repo,
            Router::new(config.ignore.iter().cloned()),
            default_adapters(&cache, repo.root()),
        );
        let outcome = pipeline
            .run(&selection, mode)
            .context("formatting run failed")?;

        report::print(&outcome)
    }
}

fn init_tracing(verbosity: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    cli.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_parse() {
        let cli = Cli::parse_from([
            "fmtgate",
            "--check",
            "--all-files",
            "--baseline",
            "upstream/develop",
            "-C",
            "/work/repo",
            "-vv",
        ]);
        assert!(cli.check);
        assert!(cli.all_files);
        assert_eq!(cli.baseline.as_deref(), Some("upstream/develop"));
        assert_eq!(cli.repo, Some(PathBuf::from("/work/repo")));
        assert_eq!(cli.cache_dir, None);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn defaults_are_fix_mode_on_the_change_set() {
        let cli = Cli::parse_from(["fmtgate"]);
        assert!(!cli.check);
        assert!(!cli.all_files);
        assert_eq!(cli.verbose, 0);
    }
}
