//! Turning a pipeline outcome into user-facing text and an exit code.

use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;

use fmtgate_core::{Mode, RunOutcome};
use fmtgate_tools::PipelineOutcome;

pub const DIRTY_TREE: &str = "git index contains uncommitted changes, add and commit your changes before attempting formatting.";

const CHECK_HEADER: &str = "The following files need formatting and/or contain problems:";
const FIX_HEADER: &str = "The following files were formatted and/or contain problems:";

/// Print the report for `outcome` on stdout and return the process exit code.
pub fn print(outcome: &PipelineOutcome) -> Result<ExitCode> {
    let mut stdout = std::io::stdout().lock();
    match outcome {
        PipelineOutcome::DirtyTree => {
            writeln!(stdout, "{}", DIRTY_TREE.red()).context("failed to write report")?;
        }
        PipelineOutcome::Completed(run) => match render(run) {
            Some(text) => write!(stdout, "{text}").context("failed to write report")?,
            None => eprintln!("{}", "All selected files are formatted and lint-free.".green()),
        },
    }
    Ok(ExitCode::from(exit_status(outcome)))
}

/// 0 only for a completed run that flagged nothing; 1 otherwise.
pub fn exit_status(outcome: &PipelineOutcome) -> u8 {
    match outcome {
        PipelineOutcome::Completed(run) if run.is_success() => 0,
        _ => 1,
    }
}

/// Header plus one path per line, or `None` when there were no findings.
pub fn render(run: &RunOutcome) -> Option<String> {
    if run.is_success() {
        return None;
    }
    let header = match run.mode {
        Mode::Check => CHECK_HEADER,
        Mode::Fix => FIX_HEADER,
    };
    let mut text = format!("{}\n", header.bold());
    // `files` is a BTreeSet: already sorted and de-duplicated.
    for path in &run.files {
        text.push_str(path);
        text.push('\n');
    }
    Some(text)
}
